//! Hierarchical-ID consistency engine for a linguistic feature database
//!
//! A feature database is a set of linked flat files: a feature inventory, a
//! listed-value inventory, one profile per doculect and a side-file of
//! not-applicable rules. Identifiers are positional (`A-12-3` is the third
//! value of the twelfth feature in category `A`), so every insertion,
//! removal or move has to renumber all of them at once.

pub mod domain;
pub use domain::{
    Catalog, CategoryId, Config, Error, FeatureDraft, FeatureId, Finding, Language, ValueDraft,
    ValueId,
};

/// Flat-file storage and the filesystem-backed database.
pub mod storage;
pub use storage::{Database, FlushError, LoadError};
