use std::path::PathBuf;

use curator::{Database, ValueId};
use tracing::instrument;

use crate::cli::{confirm, flush, parse_id, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct MoveValue {
    /// The listed value to move, e.g. `A-3-4`
    #[clap(value_parser = parse_id::<ValueId>)]
    id: ValueId,

    /// The index it should take within its feature
    index: usize,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl MoveValue {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut database = Database::open(root)?;

        if !self.yes {
            let Some(value) = database.catalog().value(self.id) else {
                anyhow::bail!("Listed value {} not found", self.id);
            };
            println!(
                "Moving {} '{}' to index {}",
                self.id, value.en, self.index
            );
            println!(
                "{}",
                "  values in between are renumbered in every profile".dim()
            );
            if !confirm("Proceed?")? {
                println!("Cancelled");
                std::process::exit(130);
            }
        }

        let moved = database.catalog_mut().move_value(self.id, self.index)?;
        flush(&mut database)?;

        println!("{}", format!("✅ Moved {} → {moved}", self.id).success());
        Ok(())
    }
}
