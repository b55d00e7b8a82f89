// Error types shared by the FLAC and MP4 codecs

use thiserror::Error;

/// Errors raised while parsing or rebuilding a container.
///
/// Every variant except [`MuxError::MissingAudioOffset`] is a soft failure:
/// the muxer logs it and hands the original bytes back untouched.
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("access of {len} bytes at offset {offset} exceeds buffer of {available} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },

    #[error("missing fLaC signature")]
    InvalidSignature,

    #[error("FLAC block at offset {offset} declares {size} bytes but only {available} remain")]
    InvalidBlockSize {
        offset: usize,
        size: usize,
        available: usize,
    },

    #[error("FLAC block chain has no terminal block; audio offset is unknown")]
    MissingAudioOffset,

    #[error("{kind} block of {size} bytes does not fit a 24-bit length")]
    BlockTooLarge { kind: &'static str, size: usize },

    #[error("atom '{kind}' at offset {offset} needs a 64-bit size above 4 GiB")]
    UnsupportedLargeAtom { kind: String, offset: usize },

    #[error("malformed atom at offset {offset}: {reason}")]
    MalformedAtom { offset: usize, reason: &'static str },

    #[error("no moov atom found")]
    MissingMoov,

    #[error("chunk offset table entry at {offset} would overflow after shifting")]
    OffsetOverflow { offset: usize },
}

impl MuxError {
    /// Hard failures leave the file unusable for any consumer and must be
    /// surfaced instead of masked.
    pub fn is_hard(&self) -> bool {
        matches!(self, MuxError::MissingAudioOffset)
    }
}

pub type Result<T> = std::result::Result<T, MuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes() {
        assert!(MuxError::MissingAudioOffset.is_hard());
        assert!(!MuxError::InvalidSignature.is_hard());
        assert!(!MuxError::MissingMoov.is_hard());
        assert!(!MuxError::UnsupportedLargeAtom {
            kind: "mdat".to_string(),
            offset: 0
        }
        .is_hard());
    }

    #[test]
    fn test_display_includes_context() {
        let err = MuxError::InvalidBlockSize {
            offset: 42,
            size: 1000,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "FLAC block at offset 42 declares 1000 bytes but only 10 remain"
        );
    }
}
