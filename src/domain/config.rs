use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::id::CategoryId;

/// Configuration for a feature database.
///
/// All paths are relative to the database root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Versions")]
pub struct Config {
    /// The feature inventory file.
    features_file: PathBuf,

    /// The listed-value inventory file.
    listed_values_file: PathBuf,

    /// The directory holding one profile file per doculect.
    profiles_dir: PathBuf,

    /// The YAML side-file of not-applicable rules.
    not_applicable_rules_file: PathBuf,

    /// Categories that exist even when no feature belongs to them yet.
    ///
    /// A category is otherwise known only through its features.
    categories: Vec<CategoryId>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            features_file: default_features_file(),
            listed_values_file: default_listed_values_file(),
            profiles_dir: default_profiles_dir(),
            not_applicable_rules_file: default_not_applicable_rules_file(),
            categories: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// The feature inventory path, relative to the root.
    #[must_use]
    pub fn features_file(&self) -> &Path {
        &self.features_file
    }

    /// The listed-value inventory path, relative to the root.
    #[must_use]
    pub fn listed_values_file(&self) -> &Path {
        &self.listed_values_file
    }

    /// The profile directory, relative to the root.
    #[must_use]
    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    /// The rules side-file path, relative to the root.
    #[must_use]
    pub fn not_applicable_rules_file(&self) -> &Path {
        &self.not_applicable_rules_file
    }

    /// Categories declared to exist.
    #[must_use]
    pub fn categories(&self) -> &[CategoryId] {
        &self.categories
    }
}

fn default_features_file() -> PathBuf {
    PathBuf::from("features/features.csv")
}

fn default_listed_values_file() -> PathBuf {
    PathBuf::from("features/features_listed_values.csv")
}

fn default_profiles_dir() -> PathBuf {
    PathBuf::from("feature_profiles")
}

fn default_not_applicable_rules_file() -> PathBuf {
    PathBuf::from("features/not_applicable_trigger_values.yaml")
}

/// The serialized versions of the configuration.
#[derive(Debug, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_features_file")]
        features_file: PathBuf,

        #[serde(default = "default_listed_values_file")]
        listed_values_file: PathBuf,

        #[serde(default = "default_profiles_dir")]
        profiles_dir: PathBuf,

        #[serde(default = "default_not_applicable_rules_file")]
        not_applicable_rules_file: PathBuf,

        #[serde(default)]
        categories: Vec<CategoryId>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                features_file,
                listed_values_file,
                profiles_dir,
                not_applicable_rules_file,
                categories,
            } => Self {
                features_file,
                listed_values_file,
                profiles_dir,
                not_applicable_rules_file,
                categories,
            },
        }
    }
}
