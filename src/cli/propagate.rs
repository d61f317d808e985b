use std::path::PathBuf;

use curator::Database;
use tracing::instrument;

use crate::cli::{flush, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Propagate {
    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl Propagate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut database = Database::open(root)?;
        let propagation = database.catalog_mut().apply_not_applicable_rules();

        for (doculect, feature) in &propagation.switched {
            println!("  {doculect}: {feature} → not_applicable");
        }

        if !propagation.conflicts.is_empty() {
            println!(
                "\n{}",
                format!(
                    "⚠️  {} rows left untouched; they should be not_applicable:",
                    propagation.conflicts.len()
                )
                .warning()
            );
            for conflict in &propagation.conflicts {
                println!(
                    "  {}: {} is {} ({} selects {})",
                    conflict.doculect,
                    conflict.dependent,
                    conflict.value_type,
                    conflict.controlling,
                    conflict.trigger
                );
            }
        }

        if propagation.switched.is_empty() {
            println!("{}", "✅ Nothing to switch.".success());
            return Ok(());
        }

        if self.dry_run {
            println!(
                "\n{}",
                format!("{} rows would switch (dry run)", propagation.switched.len()).dim()
            );
            return Ok(());
        }

        flush(&mut database)?;
        println!(
            "{}",
            format!("✅ Switched {} rows to not_applicable", propagation.switched.len()).success()
        );
        Ok(())
    }
}
