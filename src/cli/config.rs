// CLI configuration
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

/// muxtag - tag FLAC and MP4 audio in place of a re-encode
#[derive(Parser, Debug)]
#[command(name = "muxtag")]
#[command(about = "Inject tags and cover art into FLAC and M4A files", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Key-value pairs
    KeyValue,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write tags and cover art into an audio file
    Tag {
        /// Audio file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Track JSON as returned by the catalogue API
        #[arg(short, long)]
        metadata: String,

        /// Streaming quality the file was downloaded in
        #[arg(long, default_value = "LOSSLESS")]
        quality: String,

        /// Cover image file
        #[arg(short, long)]
        cover: Option<String>,

        /// Cover MIME type (defaults to the sniffed image type)
        #[arg(long)]
        cover_mime: Option<String>,

        /// Do not embed cover art
        #[arg(long)]
        no_cover: bool,

        /// Output path (defaults to "Artist - Album - NN Title.ext" next to the input)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show the container structure and tags of file(s)
    Inspect {
        /// Audio file path(s) or glob pattern(s)
        #[arg(value_name = "PATTERN", required = true)]
        patterns: Vec<String>,
    },

    /// Detect the container of file(s)
    Detect {
        /// Audio file path(s) or glob pattern(s)
        #[arg(value_name = "PATTERN", required = true)]
        patterns: Vec<String>,
    },
}

impl Config {
    /// Log filter selected by `--quiet` / `--verbose`
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }
}
