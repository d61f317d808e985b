//! In-memory model of a feature database.
//!
//! The [`Catalog`] holds every linked store (feature inventory, listed-value
//! inventory, doculect profiles and the not-applicable rules) and knows
//! nothing about the filesystem. Mutation operations validate their arguments
//! against the whole catalog before changing anything, so a failed operation
//! leaves every store exactly as it was.

use std::collections::BTreeSet;

use non_empty_string::NonEmptyString;

use crate::domain::{
    error::{Entity, Error},
    id::{CategoryId, FeatureId, ValueId},
    record::{FeatureRecord, ListedValueRecord, Profile},
    rules::NotApplicableRules,
};

mod audit;
mod features;
mod not_applicable;
mod propagate;
mod values;

#[cfg(test)]
pub(crate) mod fixtures;

pub use audit::Finding;
pub use features::{FeatureDraft, ValueDraft};
pub use not_applicable::{NotApplicableConflict, Propagation};

/// Which name of a feature or value an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// The `en` column.
    En,
    /// The `ru` column. Profiles carry this name denormalized.
    Ru,
}

/// Which stores have been changed since they were last written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Touched {
    /// The feature inventory.
    pub features: bool,
    /// The listed-value inventory.
    pub values: bool,
    /// The doculect profiles.
    pub profiles: bool,
    /// The not-applicable rules.
    pub rules: bool,
}

impl Touched {
    /// Whether any store was touched.
    #[must_use]
    pub const fn any(self) -> bool {
        self.features || self.values || self.profiles || self.rules
    }
}

/// An in-memory representation of every linked store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    features: Vec<FeatureRecord>,
    values: Vec<ListedValueRecord>,
    profiles: Vec<Profile>,
    rules: NotApplicableRules,

    /// Categories that exist without any feature.
    declared_categories: BTreeSet<CategoryId>,

    touched: Touched,
}

impl Catalog {
    /// Assembles a catalog from loaded stores. Row order is preserved.
    #[must_use]
    pub fn new(
        features: Vec<FeatureRecord>,
        values: Vec<ListedValueRecord>,
        profiles: Vec<Profile>,
        rules: NotApplicableRules,
    ) -> Self {
        Self {
            features,
            values,
            profiles,
            rules,
            declared_categories: BTreeSet::new(),
            touched: Touched::default(),
        }
    }

    /// Declares categories that exist even without features.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = CategoryId>) -> Self {
        self.declared_categories.extend(categories);
        self
    }

    /// The feature inventory, in file order.
    #[must_use]
    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    /// The listed-value inventory, in file order.
    #[must_use]
    pub fn values(&self) -> &[ListedValueRecord] {
        &self.values
    }

    /// The doculect profiles.
    #[must_use]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// The not-applicable rules.
    #[must_use]
    pub const fn rules(&self) -> &NotApplicableRules {
        &self.rules
    }

    /// Looks up a feature.
    #[must_use]
    pub fn feature(&self, id: FeatureId) -> Option<&FeatureRecord> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Looks up a listed value.
    #[must_use]
    pub fn value(&self, id: ValueId) -> Option<&ListedValueRecord> {
        self.values.iter().find(|v| v.id == id)
    }

    /// The listed values of a feature, in file order.
    pub fn values_of(&self, feature: FeatureId) -> impl Iterator<Item = &ListedValueRecord> {
        self.values.iter().filter(move |v| v.feature_id == feature)
    }

    /// Looks up a doculect profile.
    #[must_use]
    pub fn profile(&self, doculect: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.doculect == doculect)
    }

    /// Every category that exists: declared ones plus those with features.
    #[must_use]
    pub fn categories(&self) -> BTreeSet<CategoryId> {
        self.features
            .iter()
            .map(|f| f.id.category())
            .chain(self.declared_categories.iter().copied())
            .collect()
    }

    /// Whether a category exists.
    #[must_use]
    pub fn category_exists(&self, category: CategoryId) -> bool {
        self.declared_categories.contains(&category)
            || self.features.iter().any(|f| f.id.category() == category)
    }

    /// The stores changed since the last call to [`Catalog::take_touched`].
    #[must_use]
    pub const fn touched(&self) -> Touched {
        self.touched
    }

    /// Returns and clears the record of changed stores.
    pub fn take_touched(&mut self) -> Touched {
        std::mem::take(&mut self.touched)
    }

    fn require_feature(&self, id: FeatureId) -> Result<&FeatureRecord, Error> {
        self.feature(id)
            .ok_or_else(|| Error::not_found(Entity::Feature, id))
    }

    fn require_value(&self, id: ValueId) -> Result<&ListedValueRecord, Error> {
        self.value(id)
            .ok_or_else(|| Error::not_found(Entity::Value, id))
    }
}

/// A trimmed, non-empty required argument.
fn required(field: &str, value: &str) -> Result<NonEmptyString, Error> {
    NonEmptyString::new(value.trim().to_string())
        .map_err(|_| Error::Validation(format!("{field} must not be empty")))
}
