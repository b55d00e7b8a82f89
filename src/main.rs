// CLI binary entry point for muxtag

mod cli;

use clap::Parser;
use std::process;

use cli::{Config, OutputFormatter};

fn main() {
    let config = Config::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level().as_str())).init();

    let formatter = OutputFormatter::new(config.format, config.quiet);
    if let Err(e) = cli::run(config.command, &formatter) {
        formatter.print_error(&format!("{:#}", e));
        process::exit(1);
    }
}
