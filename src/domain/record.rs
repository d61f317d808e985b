//! Rows of the three linked stores.
//!
//! Field order of each struct is the column order of its file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::id::{ATOMIC_SEPARATOR, FeatureId, ValueId, ValueIds, join_atoms, split_atoms};

/// One row of the feature inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// The feature id.
    pub id: FeatureId,
    /// English name, unique across the inventory.
    pub en: String,
    /// Russian name, unique across the inventory.
    pub ru: String,
    /// Formatted English description.
    pub description_formatted_en: String,
    /// Formatted Russian description.
    pub description_formatted_ru: String,
    /// Whether a profile may select several listed values at once.
    #[serde(with = "flag")]
    pub is_multiselect: bool,
    /// Human-readable note on when the feature is not applicable.
    pub not_applicable_if: String,
    /// Schema section metadata.
    pub schema_sections: String,
}

/// One row of the listed-value inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedValueRecord {
    /// The value id.
    pub id: ValueId,
    /// The owning feature; always equal to `id.feature()` in a consistent
    /// store.
    pub feature_id: FeatureId,
    /// English name, unique within the owning feature.
    pub en: String,
    /// Russian name, unique within the owning feature.
    pub ru: String,
    /// Formatted English description.
    pub description_formatted_en: String,
    /// Formatted Russian description.
    pub description_formatted_ru: String,
}

/// How a profile entry answers its feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// One (or, for multiselect features, several) listed values.
    Listed,
    /// A free-text answer not yet in the listed-value inventory.
    Custom,
    /// No information recorded yet.
    NotStated,
    /// The sources were checked and say nothing.
    ExplicitGap,
    /// The feature does not apply to this doculect.
    NotApplicable,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Listed => "listed",
            Self::Custom => "custom",
            Self::NotStated => "not_stated",
            Self::ExplicitGap => "explicit_gap",
            Self::NotApplicable => "not_applicable",
        };
        f.write_str(name)
    }
}

/// One row of a doculect profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// The feature this row answers.
    pub feature_id: FeatureId,
    /// Denormalized Russian feature name.
    pub feature_name_ru: String,
    /// How the feature is answered.
    pub value_type: ValueType,
    /// Atomic value ids; empty unless `value_type` is listed.
    pub value_id: ValueIds,
    /// Value text; `&`-joined names for multiselect entries.
    pub value_ru: String,
    /// Russian comment.
    pub comment_ru: String,
    /// English comment.
    pub comment_en: String,
    /// Source page numbers.
    pub page_numbers: String,
}

impl ProfileEntry {
    /// A fresh `not_stated` row for a feature.
    #[must_use]
    pub fn not_stated(feature_id: FeatureId, feature_name_ru: &str) -> Self {
        Self {
            feature_id,
            feature_name_ru: feature_name_ru.to_string(),
            value_type: ValueType::NotStated,
            value_id: ValueIds::default(),
            value_ru: String::new(),
            comment_ru: String::new(),
            comment_en: String::new(),
            page_numbers: String::new(),
        }
    }

    /// The value names paired by position with `value_id`.
    #[must_use]
    pub fn value_names(&self) -> Vec<&str> {
        if self.value_ru.is_empty() {
            Vec::new()
        } else {
            split_atoms(&self.value_ru).collect()
        }
    }

    /// Replaces the name paired with the atom at `position`.
    ///
    /// Returns `false`, leaving the row untouched, when names and atoms do not
    /// pair up one-to-one.
    ///
    /// Sibling names keep their exact spelling, including the spacing around
    /// the separator.
    pub fn replace_value_name(&mut self, position: usize, name: &str) -> bool {
        if self.value_names().len() != self.value_id.len() || position >= self.value_id.len() {
            return false;
        }
        let mut atoms: Vec<String> = self
            .value_ru
            .split(ATOMIC_SEPARATOR)
            .map(str::to_string)
            .collect();
        let atom = &atoms[position];
        let leading = &atom[..atom.len() - atom.trim_start().len()];
        let trailing = &atom[atom.trim_end().len()..];
        atoms[position] = format!("{leading}{name}{trailing}");
        self.value_ru = join_atoms(&atoms);
        true
    }

    /// Marks the row as answered by the single listed value `id`.
    pub fn set_listed(&mut self, id: ValueId, name: &str) {
        self.value_type = ValueType::Listed;
        self.value_id = ValueIds::single(id);
        self.value_ru = name.to_string();
    }
}

/// The profile of one doculect: one row per feature, in inventory order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Doculect id, the profile's file stem.
    pub doculect: String,
    /// The rows.
    pub entries: Vec<ProfileEntry>,
}

impl Profile {
    /// The row answering `feature`, if any.
    #[must_use]
    pub fn entry(&self, feature: FeatureId) -> Option<&ProfileEntry> {
        self.entries.iter().find(|e| e.feature_id == feature)
    }

    /// Mutable access to the row answering `feature`, if any.
    pub fn entry_mut(&mut self, feature: FeatureId) -> Option<&mut ProfileEntry> {
        self.entries.iter_mut().find(|e| e.feature_id == feature)
    }
}

/// Boolean columns, stored as `1` or `0`.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "1" } else { "0" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(D::Error::custom(format!("expected 1 or 0, got '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value_id: &str, value_ru: &str) -> ProfileEntry {
        ProfileEntry {
            value_type: ValueType::Listed,
            value_id: value_id.parse().unwrap(),
            value_ru: value_ru.to_string(),
            ..ProfileEntry::not_stated("A-1".parse().unwrap(), "признак")
        }
    }

    #[test]
    fn replace_value_name_touches_only_its_position() {
        let mut row = entry("A-1-1&A-1-3&A-1-4", "один&три&четыре");
        assert!(row.replace_value_name(1, "ТРИ"));
        assert_eq!(row.value_ru, "один&ТРИ&четыре");
    }

    #[test]
    fn replace_value_name_keeps_sibling_spelling() {
        let mut row = entry("A-1-1&A-1-3", "один & три");
        assert!(row.replace_value_name(1, "ТРИ"));
        assert_eq!(row.value_ru, "один & ТРИ");

        assert!(row.replace_value_name(0, "ОДИН"));
        assert_eq!(row.value_ru, "ОДИН & ТРИ");
    }

    #[test]
    fn replace_value_name_refuses_unpaired_rows() {
        let mut row = entry("A-1-1&A-1-3", "один");
        assert!(!row.replace_value_name(0, "x"));
        assert_eq!(row.value_ru, "один");
    }

    #[test]
    fn value_type_displays_as_stored() {
        assert_eq!(ValueType::NotApplicable.to_string(), "not_applicable");
        assert_eq!(ValueType::ExplicitGap.to_string(), "explicit_gap");
    }
}
