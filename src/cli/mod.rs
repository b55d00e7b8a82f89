// CLI module for muxtag
//
// Argument parsing, subcommands and output formatting for the muxtag binary.
// The library itself performs no I/O; reading and writing files happens here.

pub mod commands;
pub mod config;
pub mod output;

pub use commands::run;
pub use config::Config;
pub use output::OutputFormatter;
