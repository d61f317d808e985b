use std::path::PathBuf;

use curator::{Database, Finding};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Validate {
    /// Suppress all output except the summary line
    #[arg(long, short)]
    quiet: bool,

    /// Leave not_applicable conflicts out of the report
    #[arg(long)]
    ignore_conflicts: bool,
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let database = Database::open(root)?;
        let findings: Vec<Finding> = database
            .catalog()
            .audit()
            .into_iter()
            .filter(|f| !(self.ignore_conflicts && matches!(f, Finding::NotApplicableConflict(_))))
            .collect();

        if findings.is_empty() {
            println!("{}", "✅ No inconsistencies found.".success());
            return Ok(());
        }

        println!(
            "{}",
            format!("❌ {} inconsistencies found", findings.len()).error()
        );
        if !self.quiet {
            println!();
            for (i, finding) in findings.iter().enumerate() {
                println!("{}. {finding}", i + 1);
            }
        }

        std::process::exit(2);
    }
}
