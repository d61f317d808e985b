use std::path::PathBuf;

use curator::{Database, FeatureId, ValueId, domain::ValueType};
use tracing::instrument;

use crate::cli::{confirm, flush, parse_id, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct RemoveFeature {
    /// The feature to remove, e.g. `A-3`
    #[clap(value_parser = parse_id::<FeatureId>)]
    id: FeatureId,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl RemoveFeature {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut database = Database::open(root)?;
        let catalog = database.catalog();

        let Some(feature) = catalog.feature(self.id) else {
            anyhow::bail!("Feature {} not found", self.id);
        };

        if !self.yes {
            let values = catalog.values_of(self.id).count();
            let answered = catalog
                .profiles()
                .iter()
                .filter_map(|p| p.entry(self.id))
                .filter(|e| e.value_type != ValueType::NotStated)
                .count();
            println!("Removing {} '{}' / '{}'", self.id, feature.en, feature.ru);
            println!(
                "{}",
                format!("  {values} listed values, answered in {answered} profiles").dim()
            );
            println!(
                "{}",
                format!("  later features of category {} shift down", self.id.category()).dim()
            );
            if let Some(rule) = catalog.rules().get(self.id) {
                let dependents: Vec<String> = rule
                    .features_to_get_not_applicable
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                println!(
                    "{}",
                    format!(
                        "⚠️  drops the rule making {} not applicable when {} is selected",
                        dependents.join(", "),
                        rule.trigger
                    )
                    .warning()
                );
            }
            if !confirm("Proceed?")? {
                println!("Cancelled");
                std::process::exit(130);
            }
        }

        database.catalog_mut().remove_feature(self.id)?;
        flush(&mut database)?;

        println!("{}", format!("✅ Removed feature {}", self.id).success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct RemoveValue {
    /// The listed value to remove, e.g. `A-3-2`
    #[clap(value_parser = parse_id::<ValueId>)]
    id: ValueId,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl RemoveValue {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut database = Database::open(root)?;
        let catalog = database.catalog();

        let Some(value) = catalog.value(self.id) else {
            anyhow::bail!("Listed value {} not found", self.id);
        };

        let selecting: Vec<String> = catalog
            .profiles()
            .iter()
            .filter(|p| {
                p.entry(self.id.feature()).is_some_and(|e| {
                    e.value_type == ValueType::Listed && e.value_id.contains(self.id)
                })
            })
            .map(|p| p.doculect.clone())
            .collect();

        if !self.yes {
            println!("Removing {} '{}' / '{}'", self.id, value.en, value.ru);
            if !selecting.is_empty() {
                println!(
                    "\n{} in {} profiles:",
                    "Answers become custom".warning(),
                    selecting.len()
                );
                for doculect in &selecting {
                    println!("  • {doculect}");
                }
            }
            if !confirm("Proceed?")? {
                println!("Cancelled");
                std::process::exit(130);
            }
        }

        database.catalog_mut().remove_value(self.id)?;
        flush(&mut database)?;

        println!("{}", format!("✅ Removed listed value {}", self.id).success());
        if !selecting.is_empty() {
            println!(
                "{}",
                format!("   {} answers are now custom", selecting.len()).dim()
            );
        }
        Ok(())
    }
}
