use std::path::PathBuf;

use curator::{Database, ValueId};
use tracing::instrument;

use crate::cli::{flush, parse_id, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct MarkListed {
    /// The doculect whose answer to canonicalize
    doculect: String,

    /// The listed value that the custom answer stands for, e.g. `A-3-2`
    #[clap(value_parser = parse_id::<ValueId>)]
    value: ValueId,
}

impl MarkListed {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut database = Database::open(root)?;
        database
            .catalog_mut()
            .mark_custom_as_listed(&self.doculect, self.value)?;
        flush(&mut database)?;

        println!(
            "{}",
            format!(
                "✅ {} now answers {} with {}",
                self.doculect,
                self.value.feature(),
                self.value
            )
            .success()
        );
        Ok(())
    }
}
