use std::path::PathBuf;

use curator::{Database, FeatureId, ValueId};
use tracing::instrument;

use crate::cli::{Lang, flush, parse_id, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct RenameFeature {
    /// The feature to rename, e.g. `A-3`
    #[clap(value_parser = parse_id::<FeatureId>)]
    id: FeatureId,

    /// Which name to replace
    #[arg(value_enum)]
    language: Lang,

    /// The new name
    name: String,
}

impl RenameFeature {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut database = Database::open(root)?;
        database
            .catalog_mut()
            .rename_feature(self.id, self.language.into(), &self.name)?;
        flush(&mut database)?;

        println!(
            "{}",
            format!("✅ Renamed feature {} to '{}'", self.id, self.name.trim()).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct RenameValue {
    /// The listed value to rename, e.g. `A-3-2`
    #[clap(value_parser = parse_id::<ValueId>)]
    id: ValueId,

    /// Which name to replace
    #[arg(value_enum)]
    language: Lang,

    /// The new name
    name: String,
}

impl RenameValue {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut database = Database::open(root)?;
        database
            .catalog_mut()
            .rename_value(self.id, self.language.into(), &self.name)?;
        flush(&mut database)?;

        println!(
            "{}",
            format!("✅ Renamed listed value {} to '{}'", self.id, self.name.trim()).success()
        );
        Ok(())
    }
}
