//! A filesystem backed feature database
//!
//! The [`Database`] loads every linked store into a [`Catalog`] once and
//! writes the touched stores back once. It is a thin wrapper around the
//! filesystem agnostic catalog.

use std::{
    collections::BTreeMap,
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use nonempty::NonEmpty;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::{
    domain::{Catalog, Config, NotApplicableRules, Profile},
    storage::flat_file::{Row, decode_rows, encode_rows, glob_profiles},
};

/// The configuration file, relative to the database root.
pub const CONFIG_FILE: &str = "curator.toml";

/// A feature database rooted at a directory.
#[derive(Debug)]
pub struct Database {
    root: PathBuf,
    config: Config,
    catalog: Catalog,

    /// Where each doculect's profile was loaded from.
    profile_paths: BTreeMap<String, PathBuf>,

    /// The content of each flat file as last read or written.
    on_disk: BTreeMap<PathBuf, Vec<u8>>,

    /// The rules as last read or written.
    rules_on_disk: NotApplicableRules,
}

impl Database {
    /// Loads every store of the database rooted at `root`.
    ///
    /// A missing config file means the default layout. A missing rules
    /// side-file or profile directory is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a store exists but cannot be read or parsed.
    #[instrument]
    pub fn open(root: PathBuf) -> Result<Self, LoadError> {
        let config = load_config(&root)?;
        let mut on_disk = BTreeMap::new();

        let features = load_store(root.join(config.features_file()), &mut on_disk)?;
        let values = load_store(root.join(config.listed_values_file()), &mut on_disk)?;

        let mut profiles = Vec::new();
        let mut profile_paths = BTreeMap::new();
        for path in glob_profiles(&root.join(config.profiles_dir()))? {
            let Some(doculect) = path.file_stem().and_then(|s| s.to_str()) else {
                return Err(LoadError::ProfileName(path));
            };
            let doculect = doculect.to_string();
            let entries = load_store(path.clone(), &mut on_disk)?;
            profiles.push(Profile {
                doculect: doculect.clone(),
                entries,
            });
            profile_paths.insert(doculect, path);
        }

        let rules = load_rules(&root.join(config.not_applicable_rules_file()))?;

        let catalog = Catalog::new(features, values, profiles, rules.clone())
            .with_categories(config.categories().iter().copied());

        info!(
            features = catalog.features().len(),
            values = catalog.values().len(),
            profiles = catalog.profiles().len(),
            "loaded database"
        );

        Ok(Self {
            root,
            config,
            catalog,
            profile_paths,
            on_disk,
            rules_on_disk: rules,
        })
    }

    /// The database root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The loaded stores.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The loaded stores, for mutation. Changes reach the disk on
    /// [`Database::flush`].
    pub const fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Writes every changed store back to disk and returns the written paths.
    ///
    /// A touched store whose content comes out the same as on disk is left
    /// alone, so a net no-op never rewrites a file. All other stores are
    /// encoded and written to temporary files next to their targets first.
    /// Only once every temporary file is in place are they renamed over the
    /// targets, listed values first, then profiles, features and rules.
    ///
    /// # Errors
    ///
    /// If staging fails, nothing is replaced. If a rename fails, the remaining
    /// renames are still attempted and every failed path is reported.
    #[instrument(skip(self))]
    pub fn flush(&mut self) -> Result<Vec<PathBuf>, FlushError> {
        let touched = self.catalog.touched();
        if !touched.any() {
            debug!("nothing to flush");
            return Ok(Vec::new());
        }

        let mut encoded: Vec<(PathBuf, io::Result<Vec<u8>>)> = Vec::new();
        if touched.values {
            encoded.push((
                self.root.join(self.config.listed_values_file()),
                encode_rows(self.catalog.values()).map_err(io::Error::from),
            ));
        }
        if touched.profiles {
            for profile in self.catalog.profiles() {
                encoded.push((
                    self.profile_path(&profile.doculect),
                    encode_rows(&profile.entries).map_err(io::Error::from),
                ));
            }
        }
        if touched.features {
            encoded.push((
                self.root.join(self.config.features_file()),
                encode_rows(self.catalog.features()).map_err(io::Error::from),
            ));
        }
        let rules_changed = touched.rules && self.catalog.rules() != &self.rules_on_disk;
        if rules_changed {
            encoded.push((
                self.root.join(self.config.not_applicable_rules_file()),
                self.catalog
                    .rules()
                    .to_yaml()
                    .map(String::into_bytes)
                    .map_err(io::Error::other),
            ));
        }
        encoded.retain(|(path, bytes)| match bytes {
            Ok(bytes) if self.on_disk.get(path) == Some(bytes) => {
                debug!(path = %path.display(), "store unchanged");
                false
            }
            _ => true,
        });

        let mut staged = Vec::with_capacity(encoded.len());
        let mut failures = Vec::new();
        for (path, bytes) in encoded {
            match bytes.and_then(|bytes| stage(&path, &bytes).map(|file| (file, bytes))) {
                Ok((file, bytes)) => staged.push((path, file, bytes)),
                Err(e) => failures.push((path, e)),
            }
        }
        if let Some(failures) = NonEmpty::from_vec(failures) {
            return Err(FlushError {
                phase: FlushPhase::Stage,
                failures,
            });
        }

        let mut written = Vec::with_capacity(staged.len());
        let mut failures = Vec::new();
        for (path, file, bytes) in staged {
            match file.persist(&path) {
                Ok(_) => {
                    debug!(path = %path.display(), "replaced store");
                    self.on_disk.insert(path.clone(), bytes);
                    written.push(path);
                }
                Err(e) => failures.push((path, e.error)),
            }
        }
        if let Some(failures) = NonEmpty::from_vec(failures) {
            return Err(FlushError {
                phase: FlushPhase::Replace,
                failures,
            });
        }

        if rules_changed {
            self.rules_on_disk = self.catalog.rules().clone();
        }
        self.catalog.take_touched();
        info!(files = written.len(), "flushed database");
        Ok(written)
    }

    fn profile_path(&self, doculect: &str) -> PathBuf {
        self.profile_paths.get(doculect).cloned().unwrap_or_else(|| {
            self.root
                .join(self.config.profiles_dir())
                .join(format!("{doculect}.csv"))
        })
    }
}

fn load_config(root: &Path) -> Result<Config, LoadError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(Config::default());
    }
    Config::load(&path).map_err(|message| LoadError::Config { path, message })
}

/// Reads one flat file, remembering its content.
fn load_store<R: Row>(
    path: PathBuf,
    on_disk: &mut BTreeMap<PathBuf, Vec<u8>>,
) -> Result<Vec<R>, LoadError> {
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(source) => return Err(LoadError::Io { path, source }),
    };
    let rows = match decode_rows(&bytes) {
        Ok(rows) => rows,
        Err(source) => return Err(LoadError::Csv { path, source }),
    };
    on_disk.insert(path, bytes);
    Ok(rows)
}

fn load_rules(path: &Path) -> Result<NotApplicableRules, LoadError> {
    if !path.exists() {
        debug!(path = %path.display(), "no rules file");
        return Ok(NotApplicableRules::default());
    }
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    NotApplicableRules::from_yaml(&content).map_err(|source| LoadError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `bytes` to a temporary file in the target's directory.
fn stage(target: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}

/// Errors raised while loading a database.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A store could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The store.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A flat file could not be read or a row does not parse.
    #[error("failed to load {}: {source}", .path.display())]
    Csv {
        /// The store.
        path: PathBuf,
        /// The underlying error.
        source: csv::Error,
    },

    /// The rules side-file does not parse.
    #[error("failed to parse rules in {}: {source}", .path.display())]
    Yaml {
        /// The side-file.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// The config file could not be loaded.
    #[error("failed to load config {}: {message}", .path.display())]
    Config {
        /// The config file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// A profile file name is not valid UTF-8.
    #[error("cannot take a doculect name from {}", .0.display())]
    ProfileName(PathBuf),

    /// The profile directory could not be listed.
    #[error("failed to list profiles: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Which step of a flush failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPhase {
    /// Encoding or writing temporary files. No store was replaced.
    Stage,
    /// Renaming temporary files over their targets. Stores not listed as
    /// failures were replaced.
    Replace,
}

/// Failure to write some of the touched stores.
#[derive(Debug, thiserror::Error)]
pub struct FlushError {
    phase: FlushPhase,
    failures: NonEmpty<(PathBuf, io::Error)>,
}

impl FlushError {
    /// The step that failed.
    #[must_use]
    pub const fn phase(&self) -> FlushPhase {
        self.phase
    }

    /// Every path that could not be written, with its error.
    #[must_use]
    pub const fn failures(&self) -> &NonEmpty<(PathBuf, io::Error)> {
        &self.failures
    }
}

impl fmt::Display for FlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        match self.phase {
            FlushPhase::Stage => write!(f, "failed to stage stores, nothing written: ")?,
            FlushPhase::Replace => write!(f, "failed to replace stores: ")?,
        }

        let total = self.failures.len();

        let displayed_paths: Vec<String> = self
            .failures
            .iter()
            .take(MAX_DISPLAY)
            .map(|(p, _e)| p.display().to_string())
            .collect();

        let msg = displayed_paths.join(", ");

        if total <= MAX_DISPLAY {
            write!(f, "{msg}")
        } else {
            write!(f, "{msg}... (and {} more)", total - MAX_DISPLAY)
        }
    }
}
