// CLI binary entry point for opusmux
//
// This is the main entry point for the opusmux command-line tool.

mod cli;

use clap::Parser;
use std::process;

use cli::commands;
use cli::config::{Commands, Config};
use cli::output::OutputFormatter;

fn main() {
    env_logger::init();

    let config = Config::parse();
    let formatter = OutputFormatter::new(config.format.clone(), config.quiet);

    let result = match config.command {
        Commands::Info { files } => commands::command_info(&files, &formatter),
        Commands::Pages { file } => commands::command_pages(&file, &formatter),
        Commands::Verify {
            files,
            directory,
            pattern,
        } => commands::command_verify(&files, directory.as_deref(), &pattern, &formatter),
        Commands::Remux {
            input,
            output,
            sample_rate,
            channels,
            pre_skip,
        } => commands::command_remux(&input, &output, sample_rate, channels, pre_skip, &formatter),
    };

    if let Err(e) = result {
        formatter.print_error(&format!("{:#}", e));
        process::exit(1);
    }
}
