use std::fmt;

use crate::domain::id::{MalformedIdError, ValueId};

/// The kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A category letter.
    Category,
    /// A feature in the feature inventory.
    Feature,
    /// A listed value in the listed-value inventory.
    Value,
    /// A doculect profile.
    Doculect,
    /// A feature row inside a doculect profile.
    ProfileEntry,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Category => "category",
            Self::Feature => "feature",
            Self::Value => "listed value",
            Self::Doculect => "doculect",
            Self::ProfileEntry => "profile entry",
        };
        f.write_str(name)
    }
}

/// Errors raised by mutation operations.
///
/// Every variant is raised during validation, before any store is touched.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A required argument is missing or empty, or a value description is
    /// malformed.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// A referenced id does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// What was looked up.
        entity: Entity,
        /// The id that was looked up.
        id: String,
    },

    /// A name is already in use, or a rename would not change anything.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A requested index lies outside the closed acceptable range.
    #[error("index {index} in {scope} is outside the acceptable range 1..={max}")]
    InvalidIndex {
        /// The category or feature the index applies to.
        scope: String,
        /// The rejected index.
        index: usize,
        /// The largest acceptable index.
        max: usize,
    },

    /// An identifier does not parse.
    #[error(transparent)]
    MalformedId(#[from] MalformedIdError),

    /// A move whose source and target index coincide.
    #[error("{id} already sits at index {index}")]
    NoOpMove {
        /// The value that was to be moved.
        id: ValueId,
        /// Its current (and requested) index.
        index: usize,
    },
}

impl Error {
    pub(crate) fn not_found(entity: Entity, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
