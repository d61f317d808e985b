use std::num::NonZeroUsize;

use tracing::{info, instrument};

use super::{Catalog, Language, required};
use crate::domain::{
    error::{Entity, Error},
    id::{CategoryId, FeatureId, ValueId},
    record::{FeatureRecord, ListedValueRecord},
    renumber::{max_index, resolve_pivot},
    text::same_name,
};

/// A listed value to be created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueDraft {
    /// English name.
    pub en: String,
    /// Russian name.
    pub ru: String,
    /// Formatted English description.
    pub description_formatted_en: String,
    /// Formatted Russian description.
    pub description_formatted_ru: String,
}

impl ValueDraft {
    /// A value with names and no descriptions.
    #[must_use]
    pub fn new(en: impl Into<String>, ru: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ru: ru.into(),
            ..Self::default()
        }
    }

    pub(super) fn into_record(
        self,
        id: ValueId,
        en: String,
        ru: String,
    ) -> ListedValueRecord {
        ListedValueRecord {
            id,
            feature_id: id.feature(),
            en,
            ru,
            description_formatted_en: self.description_formatted_en,
            description_formatted_ru: self.description_formatted_ru,
        }
    }
}

/// A feature to be created, with its initial listed values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureDraft {
    /// English name.
    pub en: String,
    /// Russian name.
    pub ru: String,
    /// Formatted English description.
    pub description_formatted_en: String,
    /// Formatted Russian description.
    pub description_formatted_ru: String,
    /// Whether several values may be selected at once.
    pub is_multiselect: bool,
    /// Note on when the feature is not applicable.
    pub not_applicable_if: String,
    /// Schema section metadata.
    pub schema_sections: String,
    /// Listed values, numbered from 1 in this order.
    pub listed_values: Vec<ValueDraft>,
}

impl FeatureDraft {
    /// A feature with names only.
    #[must_use]
    pub fn new(en: impl Into<String>, ru: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ru: ru.into(),
            ..Self::default()
        }
    }

    /// Sets the initial listed values.
    #[must_use]
    pub fn with_values(mut self, values: Vec<ValueDraft>) -> Self {
        self.listed_values = values;
        self
    }
}

impl Catalog {
    /// Adds a feature to a category.
    ///
    /// The feature takes `index_to_assign` (or the next free index when
    /// omitted); features at or above that index shift up by one everywhere.
    /// Every profile gains a `not_stated` row for the new feature.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for an empty name or an empty value name
    /// - [`Error::NotFound`] if the category does not exist
    /// - [`Error::Conflict`] if a name is used by another feature, or two
    ///   drafted values share a name
    /// - [`Error::InvalidIndex`] if the index is outside `[1, N + 1]`
    #[instrument(skip(self, draft), fields(en = %draft.en))]
    pub fn add_feature(
        &mut self,
        category: CategoryId,
        draft: FeatureDraft,
        index_to_assign: Option<usize>,
    ) -> Result<FeatureId, Error> {
        let en = required("feature en", &draft.en)?;
        let ru = required("feature ru", &draft.ru)?;

        if !self.category_exists(category) {
            return Err(Error::not_found(Entity::Category, category));
        }
        self.check_feature_names_free(en.as_str(), ru.as_str(), None)?;

        let mut value_names: Vec<(String, String)> = Vec::with_capacity(draft.listed_values.len());
        for (i, value) in draft.listed_values.iter().enumerate() {
            let value_en = required(&format!("listed value #{} en", i + 1), &value.en)?;
            let value_ru = required(&format!("listed value #{} ru", i + 1), &value.ru)?;
            if let Some((other_en, other_ru)) = value_names.iter().find(|(other_en, other_ru)| {
                same_name(other_en, value_en.as_str()) || same_name(other_ru, value_ru.as_str())
            }) {
                return Err(Error::Conflict(format!(
                    "listed value '{value_en}' / '{value_ru}' duplicates '{other_en}' / \
                     '{other_ru}'"
                )));
            }
            value_names.push((value_en.to_string(), value_ru.to_string()));
        }

        let pivot = resolve_pivot(
            index_to_assign,
            max_index(&self.features, category),
            category,
        )?;
        let id = FeatureId::new(category, pivot);

        let values: Vec<ListedValueRecord> = draft
            .listed_values
            .into_iter()
            .zip(value_names)
            .enumerate()
            .map(|(i, (value, (value_en, value_ru)))| {
                value.into_record(
                    ValueId::new(id, NonZeroUsize::MIN.saturating_add(i)),
                    value_en,
                    value_ru,
                )
            })
            .collect();
        let value_count = values.len();

        let record = FeatureRecord {
            id,
            en: en.to_string(),
            ru: ru.to_string(),
            description_formatted_en: draft.description_formatted_en,
            description_formatted_ru: draft.description_formatted_ru,
            is_multiselect: draft.is_multiselect,
            not_applicable_if: draft.not_applicable_if,
            schema_sections: draft.schema_sections,
        };

        self.insert_feature_rows(record, values);

        info!(%id, values = value_count, "added feature");
        Ok(id)
    }

    /// Removes a feature, its listed values and its row in every profile.
    ///
    /// Features above it in the category shift down by one everywhere.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the feature does not exist.
    #[instrument(skip(self))]
    pub fn remove_feature(&mut self, id: FeatureId) -> Result<FeatureRecord, Error> {
        let (record, values) = self
            .remove_feature_rows(id)
            .ok_or_else(|| Error::not_found(Entity::Feature, id))?;

        info!(%id, values = values.len(), "removed feature");
        Ok(record)
    }

    /// Replaces one of a feature's names.
    ///
    /// A Russian rename is mirrored into the denormalized feature name of every
    /// profile.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for an empty name
    /// - [`Error::NotFound`] if the feature does not exist
    /// - [`Error::Conflict`] if the name is unchanged or used by another
    ///   feature
    #[instrument(skip(self))]
    pub fn rename_feature(
        &mut self,
        id: FeatureId,
        language: Language,
        name: &str,
    ) -> Result<(), Error> {
        let name = required("feature name", name)?;
        let current = self.require_feature(id)?;
        let current_name = match language {
            Language::En => &current.en,
            Language::Ru => &current.ru,
        };
        if current_name == name.as_str() {
            return Err(Error::Conflict(format!(
                "{id} is already named '{name}'"
            )));
        }
        match language {
            Language::En => self.check_feature_names_free(name.as_str(), "", Some(id))?,
            Language::Ru => self.check_feature_names_free("", name.as_str(), Some(id))?,
        }

        let name = name.to_string();
        if let Some(record) = self.features.iter_mut().find(|f| f.id == id) {
            match language {
                Language::En => record.en.clone_from(&name),
                Language::Ru => record.ru.clone_from(&name),
            }
        }
        self.touched.features = true;

        if language == Language::Ru {
            for profile in &mut self.profiles {
                if let Some(entry) = profile.entry_mut(id) {
                    entry.feature_name_ru.clone_from(&name);
                }
            }
            self.touched.profiles = true;
        }

        info!(%id, ?language, %name, "renamed feature");
        Ok(())
    }

    /// Feature names are unique across the whole inventory. Empty names are
    /// not checked.
    fn check_feature_names_free(
        &self,
        en: &str,
        ru: &str,
        except: Option<FeatureId>,
    ) -> Result<(), Error> {
        for feature in self.features.iter().filter(|f| Some(f.id) != except) {
            if !en.is_empty() && same_name(&feature.en, en) {
                return Err(Error::Conflict(format!(
                    "feature name '{en}' is already used by {}",
                    feature.id
                )));
            }
            if !ru.is_empty() && same_name(&feature.ru, ru) {
                return Err(Error::Conflict(format!(
                    "feature name '{ru}' is already used by {}",
                    feature.id
                )));
            }
        }
        Ok(())
    }
}
