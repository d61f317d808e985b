use std::path::PathBuf;

use curator::{CategoryId, Database, FeatureDraft, FeatureId, ValueDraft};
use tracing::instrument;

use crate::cli::{flush, parse_id, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct AddFeature {
    /// The category to add the feature to, e.g. `A`
    #[clap(value_parser = parse_id::<CategoryId>)]
    category: CategoryId,

    /// English name
    en: String,

    /// Russian name
    ru: String,

    /// Index to assign; features at or above it shift up (default: append)
    #[arg(long, short)]
    index: Option<usize>,

    /// A listed value, as its English and Russian names (repeatable)
    #[arg(long = "value", num_args = 2, value_names = ["EN", "RU"])]
    values: Vec<String>,

    /// Allow several values to be selected at once
    #[arg(long)]
    multiselect: bool,

    /// Formatted English description
    #[arg(long, default_value = "")]
    description_en: String,

    /// Formatted Russian description
    #[arg(long, default_value = "")]
    description_ru: String,

    /// Note on when the feature is not applicable
    #[arg(long, default_value = "")]
    not_applicable_if: String,

    /// Schema section metadata
    #[arg(long, default_value = "")]
    schema_sections: String,
}

impl AddFeature {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut database = Database::open(root)?;

        let draft = FeatureDraft {
            description_formatted_en: self.description_en,
            description_formatted_ru: self.description_ru,
            is_multiselect: self.multiselect,
            not_applicable_if: self.not_applicable_if,
            schema_sections: self.schema_sections,
            ..FeatureDraft::new(self.en, self.ru)
        }
        .with_values(
            self.values
                .chunks_exact(2)
                .map(|pair| ValueDraft::new(pair[0].clone(), pair[1].clone()))
                .collect(),
        );
        let values = draft.listed_values.len();

        let id = database
            .catalog_mut()
            .add_feature(self.category, draft, self.index)?;
        flush(&mut database)?;

        println!(
            "{}",
            format!("✅ Added feature {id} with {values} listed values").success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct AddValue {
    /// The feature to add the value to, e.g. `A-3`
    #[clap(value_parser = parse_id::<FeatureId>)]
    feature: FeatureId,

    /// English name
    en: String,

    /// Russian name
    ru: String,

    /// Index to assign; values at or above it shift up (default: append)
    #[arg(long, short)]
    index: Option<usize>,

    /// Formatted English description
    #[arg(long, default_value = "")]
    description_en: String,

    /// Formatted Russian description
    #[arg(long, default_value = "")]
    description_ru: String,

    /// Custom answers to promote to the new value (repeatable)
    ///
    /// Matching ignores case, punctuation and spacing.
    #[arg(long = "rename-custom", value_name = "TEXT")]
    custom_values_to_rename: Vec<String>,
}

impl AddValue {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut database = Database::open(root)?;

        let draft = ValueDraft {
            description_formatted_en: self.description_en,
            description_formatted_ru: self.description_ru,
            ..ValueDraft::new(self.en, self.ru)
        };
        let id = database.catalog_mut().add_value(
            self.feature,
            draft,
            self.index,
            &self.custom_values_to_rename,
        )?;
        flush(&mut database)?;

        println!("{}", format!("✅ Added listed value {id}").success());
        Ok(())
    }
}
