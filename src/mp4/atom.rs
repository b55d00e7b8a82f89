// MP4 atom tree
//
// Atoms are stored in an arena; each node records its parent and children
// by index so the rebuild and the chunk-offset visitor never have to
// re-derive offsets from the raw bytes.

use log::{debug, trace};

use crate::error::{MuxError, Result};
use crate::utils::encoding::key_from_fourcc;
use crate::utils::{ByteCursor, Endian};

pub type FourCC = [u8; 4];

pub const MOOV: FourCC = *b"moov";
pub const MDAT: FourCC = *b"mdat";
pub const TRAK: FourCC = *b"trak";
pub const MDIA: FourCC = *b"mdia";
pub const MINF: FourCC = *b"minf";
pub const STBL: FourCC = *b"stbl";
pub const STCO: FourCC = *b"stco";
pub const CO64: FourCC = *b"co64";
pub const UDTA: FourCC = *b"udta";
pub const META: FourCC = *b"meta";
pub const HDLR: FourCC = *b"hdlr";
pub const ILST: FourCC = *b"ilst";
pub const DATA: FourCC = *b"data";

/// Atoms whose payload is a sequence of child atoms
const CONTAINERS: [FourCC; 8] = [MOOV, TRAK, MDIA, MINF, STBL, UDTA, META, ILST];

/// Containers that only hold tags
const METADATA_CONTAINERS: [FourCC; 3] = [UDTA, META, ILST];

/// Nesting deeper than this is treated as corrupt input
const MAX_DEPTH: usize = 16;

/// Index of an atom inside its tree
pub type AtomId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub kind: FourCC,
    /// Absolute offset of the size field
    pub offset: usize,
    /// Total size including the header
    pub size: usize,
    /// 8, or 16 when a 64-bit size follows the type
    pub header_len: usize,
    /// Bytes between the header and the first child (4 for a versioned `meta`)
    pub child_skip: usize,
    pub parent: Option<AtomId>,
    pub children: Vec<AtomId>,
}

impl Atom {
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    pub fn payload_offset(&self) -> usize {
        self.offset + self.header_len
    }

    pub fn payload_len(&self) -> usize {
        self.size - self.header_len
    }

    pub fn name(&self) -> String {
        key_from_fourcc(&self.kind)
    }

    pub fn is_container(&self) -> bool {
        CONTAINERS.contains(&self.kind)
    }
}

/// Parsed atom hierarchy of one byte range
#[derive(Debug, Clone, Default)]
pub struct AtomTree {
    nodes: Vec<Atom>,
    roots: Vec<AtomId>,
}

impl AtomTree {
    /// Parse every atom of a whole file
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_range(data, 0, data.len())
    }

    /// Parse the atoms laid out back to back in `data[start..end]`,
    /// descending into container atoms.
    pub fn parse_range(data: &[u8], start: usize, end: usize) -> Result<Self> {
        if start > end || end > data.len() {
            return Err(MuxError::OutOfBounds {
                offset: start,
                len: end.saturating_sub(start),
                available: data.len(),
            });
        }
        let mut tree = AtomTree::default();
        let cursor = ByteCursor::new(data);
        tree.roots = tree.parse_level(&cursor, start, end, None, 0)?;
        Ok(tree)
    }

    fn parse_level(
        &mut self,
        cursor: &ByteCursor<&[u8]>,
        start: usize,
        end: usize,
        parent: Option<AtomId>,
        depth: usize,
    ) -> Result<Vec<AtomId>> {
        if depth > MAX_DEPTH {
            return Err(MuxError::MalformedAtom {
                offset: start,
                reason: "atoms nested too deeply",
            });
        }

        let mut ids = Vec::new();
        let mut pos = start;
        while pos < end {
            if end - pos < 8 {
                return Err(MuxError::MalformedAtom {
                    offset: pos,
                    reason: "truncated atom header",
                });
            }
            let size32 = cursor.read_u32(pos, Endian::Big)?;
            let kind = cursor.read_fourcc(pos + 4)?;

            let (size, header_len) = match size32 {
                0 => (end - pos, 8),
                1 => {
                    let extended = cursor.read_u64(pos + 8, Endian::Big)?;
                    if extended >> 32 != 0 {
                        return Err(MuxError::UnsupportedLargeAtom {
                            kind: key_from_fourcc(&kind),
                            offset: pos,
                        });
                    }
                    (extended as usize, 16)
                }
                n => (n as usize, 8),
            };

            if size < header_len {
                return Err(MuxError::MalformedAtom {
                    offset: pos,
                    reason: "atom size smaller than its header",
                });
            }
            if size > end - pos {
                return Err(MuxError::MalformedAtom {
                    offset: pos,
                    reason: "atom extends past its parent",
                });
            }

            let id = self.nodes.len();
            self.nodes.push(Atom {
                kind,
                offset: pos,
                size,
                header_len,
                child_skip: 0,
                parent,
                children: Vec::new(),
            });
            trace!("atom '{}' at {} ({} bytes, depth {})", key_from_fourcc(&kind), pos, size, depth);

            if self.nodes[id].is_container() {
                let payload = pos + header_len;
                let skip = if kind == META && Self::is_full_meta(cursor, payload, pos + size)? {
                    4
                } else {
                    0
                };
                self.nodes[id].child_skip = skip;
                match self.parse_level(cursor, payload + skip, pos + size, Some(id), depth + 1) {
                    Ok(children) => self.nodes[id].children = children,
                    // Old tag trees are discarded on rebuild, so damage inside
                    // them must not block the file
                    Err(err) if METADATA_CONTAINERS.contains(&kind) => {
                        debug!("ignoring unreadable '{}' children at {}: {}", key_from_fourcc(&kind), pos, err);
                        self.nodes.truncate(id + 1);
                    }
                    Err(err) => return Err(err),
                }
            }

            ids.push(id);
            pos += size;
        }
        Ok(ids)
    }

    /// iTunes `meta` carries version/flags before its children, QuickTime's
    /// does not. A zero word where a child size would be means the former.
    fn is_full_meta(cursor: &ByteCursor<&[u8]>, payload: usize, end: usize) -> Result<bool> {
        if end - payload < 4 {
            return Ok(false);
        }
        Ok(cursor.read_u32(payload, Endian::Big)? == 0)
    }

    pub fn atom(&self, id: AtomId) -> &Atom {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level atoms in file order
    pub fn roots(&self) -> impl Iterator<Item = &Atom> {
        self.roots.iter().map(move |&id| &self.nodes[id])
    }

    pub fn children(&self, id: AtomId) -> impl Iterator<Item = &Atom> {
        self.nodes[id].children.iter().map(move |&c| &self.nodes[c])
    }

    /// First top-level atom of the given type
    pub fn find_root(&self, kind: FourCC) -> Option<AtomId> {
        self.roots.iter().copied().find(|&id| self.nodes[id].kind == kind)
    }

    /// First direct child of `id` with the given type
    pub fn find_child(&self, id: AtomId, kind: FourCC) -> Option<AtomId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].kind == kind)
    }

    /// Follow a path of atom types from the top level down
    pub fn find_path(&self, path: &[FourCC]) -> Option<AtomId> {
        let (first, rest) = path.split_first()?;
        let mut id = self.find_root(*first)?;
        for kind in rest {
            id = self.find_child(id, *kind)?;
        }
        Some(id)
    }

    /// Depth-first, pre-order walk over every atom
    pub fn walk<F: FnMut(AtomId, &Atom, usize)>(&self, mut visit: F) {
        let mut stack: Vec<(AtomId, usize)> = self.roots.iter().rev().map(|&id| (id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let atom = &self.nodes[id];
            visit(id, atom, depth);
            stack.extend(atom.children.iter().rev().map(|&c| (c, depth + 1)));
        }
    }

    /// "moov/trak/mdia" style path of an atom
    pub fn path_of(&self, id: AtomId) -> String {
        let mut names = vec![self.nodes[id].name()];
        let mut current = self.nodes[id].parent;
        while let Some(p) = current {
            names.push(self.nodes[p].name());
            current = self.nodes[p].parent;
        }
        names.reverse();
        names.join("/")
    }
}
