//! Domain models for a linguistic feature database.
//!
//! This module contains the filesystem-agnostic core: hierarchical
//! identifiers, the rows of each linked store, the renumbering engine and the
//! [`Catalog`] that keeps every store consistent across mutations.

/// Hierarchical identifiers (`A`, `A-12`, `A-12-3`) and their parsing.
pub mod id;
pub use id::{CategoryId, FeatureId, Id, MalformedIdError, ValueId, ValueIds};

pub mod record;
pub use record::{FeatureRecord, ListedValueRecord, Profile, ProfileEntry, ValueType};

/// Index shifting within a category or feature.
pub mod renumber;

pub mod catalog;
pub use catalog::{
    Catalog, FeatureDraft, Finding, Language, NotApplicableConflict, Propagation, Touched,
    ValueDraft,
};

pub mod rules;
pub use rules::{NotApplicableRules, Rule, RuleProblem};

pub mod text;

/// Errors raised by catalog operations.
pub mod error;
pub use error::{Entity, Error};

mod config;
pub use config::Config;
