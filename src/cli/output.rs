// Output formatting for CLI

use anyhow::Result;
use serde::Serialize;

use crate::cli::config::OutputFormat;

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// True when reports should be machine-readable
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Output a serializable report as JSON
    pub fn output_report<T: Serialize>(&self, value: &T) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        }
        Ok(())
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            println!("✓ {}", message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
}
