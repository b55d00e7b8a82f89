// CLI command implementations
use anyhow::{bail, Context, Result};
use glob::glob;
use log::{debug, warn};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use muxtag::{build_track_filename, flac, mp4, Container, ContainerMuxer, CoverArt, ImageFormat, TrackMetadata};

use super::config::Commands;
use super::output::OutputFormatter;

/// Run one parsed subcommand
pub fn run(command: Commands, formatter: &OutputFormatter) -> Result<()> {
    match command {
        Commands::Tag {
            file,
            metadata,
            quality,
            cover,
            cover_mime,
            no_cover,
            output,
        } => command_tag(
            TagRequest {
                file,
                metadata,
                quality,
                cover,
                cover_mime,
                no_cover,
                output,
            },
            formatter,
        ),
        Commands::Inspect { patterns } => command_inspect(&patterns, formatter),
        Commands::Detect { patterns } => command_detect(&patterns, formatter),
    }
}

/// Arguments of the `tag` subcommand
pub struct TagRequest {
    pub file: String,
    pub metadata: String,
    pub quality: String,
    pub cover: Option<String>,
    pub cover_mime: Option<String>,
    pub no_cover: bool,
    pub output: Option<String>,
}

/// Tag one file and write the result
pub fn command_tag(request: TagRequest, formatter: &OutputFormatter) -> Result<()> {
    let audio = fs::read(&request.file).with_context(|| format!("Failed to read {}", request.file))?;
    let track = load_track(&request.metadata)?;

    let cover = match &request.cover {
        Some(path) if !request.no_cover => Some(load_cover(path, request.cover_mime.as_deref())?),
        _ => None,
    };

    let muxer = ContainerMuxer::new().embed_cover(!request.no_cover);
    let tagged = muxer
        .mux(&audio, &request.quality, &track, cover.as_ref())
        .with_context(|| format!("Failed to tag {}", request.file))?;
    if tagged == audio {
        warn!("{}: written without new metadata", request.file);
    }

    let target = match request.output {
        Some(path) => PathBuf::from(path),
        None => default_output_path(Path::new(&request.file), &track, &request.quality),
    };
    fs::write(&target, &tagged).with_context(|| format!("Failed to write {}", target.display()))?;
    formatter.print_success(&format!("{} -> {}", request.file, target.display()));
    Ok(())
}

/// Read a track record from a JSON file, or parse the argument itself as JSON
fn load_track(source: &str) -> Result<TrackMetadata> {
    let json = if source.trim_start().starts_with('{') {
        source.to_string()
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read metadata file {}", source))?
    };
    serde_json::from_str(&json).context("Invalid track JSON")
}

fn load_cover(path: &str, mime_type: Option<&str>) -> Result<CoverArt> {
    let data = fs::read(path).with_context(|| format!("Failed to read cover {}", path))?;
    let mime_type = mime_type
        .map(str::to_string)
        .or_else(|| ImageFormat::sniff(&data).mime_type().map(str::to_string));
    debug!("cover {}: {} bytes, {:?}", path, data.len(), mime_type);
    Ok(match mime_type {
        Some(mime) => CoverArt::with_mime_type(data, mime),
        None => CoverArt::new(data),
    })
}

/// "Artist - Album - NN Title.ext" in the directory of `input`
pub fn default_output_path(input: &Path, track: &TrackMetadata, quality: &str) -> PathBuf {
    let name = build_track_filename(track, quality);
    match input.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Expand glob patterns into existing files, keeping literal paths as given
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        for entry in glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
            match entry {
                Ok(path) if path.is_file() => {
                    files.push(path);
                    matched = true;
                }
                Ok(_) => {}
                Err(e) => warn!("{}: {}", pattern, e),
            }
        }
        if !matched {
            warn!("no files match {}", pattern);
        }
    }
    if files.is_empty() {
        bail!("No files specified");
    }
    Ok(files)
}

#[derive(Serialize)]
#[serde(tag = "container", rename_all = "lowercase")]
enum Summary {
    Flac(flac::FlacSummary),
    Mp4(mp4::Mp4Summary),
}

#[derive(Serialize)]
struct InspectReport {
    file: String,
    #[serde(flatten)]
    summary: Summary,
}

/// Print the structure of each matching file
pub fn command_inspect(patterns: &[String], formatter: &OutputFormatter) -> Result<()> {
    let mut stdout = io::stdout();
    for path in expand_patterns(patterns)? {
        let file = path.display().to_string();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file, e));
                continue;
            }
        };

        let summary = match Container::sniff(&data) {
            Some(Container::Flac) => flac::inspect(&data).map(Summary::Flac),
            Some(Container::Mp4) => mp4::inspect(&data).map(Summary::Mp4),
            None => {
                formatter.print_error(&format!("{}: unknown format", file));
                continue;
            }
        };
        match summary {
            Ok(summary) => formatter.output(&InspectReport { file, summary }, &mut stdout)?,
            Err(e) => formatter.print_error(&format!("{}: {}", file, e)),
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct DetectReport {
    file: String,
    container: Option<String>,
    extension: Option<&'static str>,
}

/// Print the sniffed container of each matching file
pub fn command_detect(patterns: &[String], formatter: &OutputFormatter) -> Result<()> {
    let mut stdout = io::stdout();
    for path in expand_patterns(patterns)? {
        let file = path.display().to_string();
        let data = match read_head(&path) {
            Ok(data) => data,
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file, e));
                continue;
            }
        };
        let container = Container::sniff(&data);
        let report = DetectReport {
            file,
            container: container.map(|c| c.to_string()),
            extension: container.map(|c| c.extension()),
        };
        formatter.output(&report, &mut stdout)?;
    }
    Ok(())
}

/// First bytes of a file, enough to sniff the container
fn read_head(path: &Path) -> io::Result<Vec<u8>> {
    use std::io::Read;

    let mut head = Vec::with_capacity(12);
    fs::File::open(path)?.take(12).read_to_end(&mut head)?;
    Ok(head)
}
