use std::{fmt, num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

/// Joins the segments of a hierarchical identifier.
pub const SEGMENT_SEPARATOR: char = '-';

/// Joins atomic value ids (and their paired names) inside a multiselect value.
pub const ATOMIC_SEPARATOR: char = '&';

/// A category identifier: a single uppercase ASCII letter, e.g. `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryId(char);

impl CategoryId {
    /// Creates a category id from a character.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedIdError`] unless `c` is an uppercase ASCII letter.
    pub fn new(c: char) -> Result<Self, MalformedIdError> {
        if c.is_ascii_uppercase() {
            Ok(Self(c))
        } else {
            Err(MalformedIdError::new(
                c.to_string(),
                "category must be a single uppercase letter",
            ))
        }
    }

    /// Returns the category letter.
    #[must_use]
    pub const fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = MalformedIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Ok(Self(c)),
            _ => Err(MalformedIdError::new(
                s,
                "category must be a single uppercase letter",
            )),
        }
    }
}

impl TryFrom<String> for CategoryId {
    type Error = MalformedIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryId> for String {
    fn from(id: CategoryId) -> Self {
        id.to_string()
    }
}

/// A feature identifier, `Category-FeatureIndex` (e.g. `A-12`).
///
/// Ordering is by category, then by numeric index, so `A-2` sorts before
/// `A-10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureId {
    category: CategoryId,
    index: NonZeroUsize,
}

impl FeatureId {
    /// Composes a feature id from its parts.
    #[must_use]
    pub const fn new(category: CategoryId, index: NonZeroUsize) -> Self {
        Self { category, index }
    }

    /// The owning category.
    #[must_use]
    pub const fn category(self) -> CategoryId {
        self.category
    }

    /// The index of the feature within its category.
    #[must_use]
    pub const fn index(self) -> NonZeroUsize {
        self.index
    }

    /// Returns the same feature id with a different index.
    #[must_use]
    pub const fn with_index(self, index: NonZeroUsize) -> Self {
        Self::new(self.category, index)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{SEGMENT_SEPARATOR}{}", self.category, self.index)
    }
}

impl FromStr for FeatureId {
    type Err = MalformedIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match split(s)? {
            Id::Feature(id) => Ok(id),
            _ => Err(MalformedIdError::new(
                s,
                "expected a feature id of the form Category-Index",
            )),
        }
    }
}

impl TryFrom<String> for FeatureId {
    type Error = MalformedIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeatureId> for String {
    fn from(id: FeatureId) -> Self {
        id.to_string()
    }
}

/// A listed value identifier, `Category-FeatureIndex-ValueIndex` (e.g.
/// `A-12-3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValueId {
    feature: FeatureId,
    index: NonZeroUsize,
}

impl ValueId {
    /// Composes a value id from its owning feature and index.
    #[must_use]
    pub const fn new(feature: FeatureId, index: NonZeroUsize) -> Self {
        Self { feature, index }
    }

    /// The owning feature.
    #[must_use]
    pub const fn feature(self) -> FeatureId {
        self.feature
    }

    /// The index of the value within its feature.
    #[must_use]
    pub const fn index(self) -> NonZeroUsize {
        self.index
    }

    /// Returns the same value id with a different value index.
    #[must_use]
    pub const fn with_index(self, index: NonZeroUsize) -> Self {
        Self::new(self.feature, index)
    }

    /// Returns the same value index re-homed under a different feature.
    #[must_use]
    pub const fn with_feature(self, feature: FeatureId) -> Self {
        Self::new(feature, self.index)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{SEGMENT_SEPARATOR}{}", self.feature, self.index)
    }
}

impl FromStr for ValueId {
    type Err = MalformedIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match split(s)? {
            Id::Value(id) => Ok(id),
            _ => Err(MalformedIdError::new(
                s,
                "expected a value id of the form Category-Index-Index",
            )),
        }
    }
}

impl TryFrom<String> for ValueId {
    type Error = MalformedIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueId> for String {
    fn from(id: ValueId) -> Self {
        id.to_string()
    }
}

/// Any identifier in the hierarchy, as returned by [`split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Id {
    /// A bare category, e.g. `A`.
    Category(CategoryId),
    /// A feature, e.g. `A-12`.
    Feature(FeatureId),
    /// A listed value, e.g. `A-12-3`.
    Value(ValueId),
}

/// The `&`-joined list of atomic value ids held by a profile entry.
///
/// Single-select entries hold at most one atom; the empty list serializes to
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValueIds(Vec<ValueId>);

impl ValueIds {
    /// Wraps a list of atoms.
    #[must_use]
    pub const fn new(ids: Vec<ValueId>) -> Self {
        Self(ids)
    }

    /// A list holding exactly one atom.
    #[must_use]
    pub fn single(id: ValueId) -> Self {
        Self(vec![id])
    }

    /// Whether the list holds no atoms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of atoms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list contains `id`.
    #[must_use]
    pub fn contains(&self, id: ValueId) -> bool {
        self.0.contains(&id)
    }

    /// The ordinal position of `id` in the list.
    #[must_use]
    pub fn position(&self, id: ValueId) -> Option<usize> {
        self.0.iter().position(|atom| *atom == id)
    }

    /// Iterates over the atoms in order.
    pub fn iter(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.0.iter().copied()
    }

    /// Rewrites every atom in place.
    pub fn map_in_place(&mut self, mut f: impl FnMut(ValueId) -> ValueId) {
        for atom in &mut self.0 {
            *atom = f(*atom);
        }
    }

    /// Drops every atom.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for ValueIds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{ATOMIC_SEPARATOR}")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

impl FromStr for ValueIds {
    type Err = MalformedIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        split_atoms(s)
            .map(|atom| atom.parse::<ValueId>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl TryFrom<String> for ValueIds {
    type Error = MalformedIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueIds> for String {
    fn from(ids: ValueIds) -> Self {
        ids.to_string()
    }
}

/// Error returned when an identifier does not parse.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("malformed id '{id}': {reason}")]
pub struct MalformedIdError {
    id: String,
    reason: &'static str,
}

impl MalformedIdError {
    fn new(id: impl Into<String>, reason: &'static str) -> Self {
        Self {
            id: id.into(),
            reason,
        }
    }

    /// The offending input.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Parses any identifier in the hierarchy by its segment count.
///
/// Index segments are parsed as positive integers. Leading zeros are rejected
/// so that every id has exactly one spelling.
///
/// # Errors
///
/// Returns [`MalformedIdError`] for a bad category letter, a non-numeric,
/// zero or zero-padded index, or a segment count other than one to three.
pub fn split(id: &str) -> Result<Id, MalformedIdError> {
    let parts: Vec<&str> = id.split(SEGMENT_SEPARATOR).collect();
    let category = parts[0]
        .parse::<CategoryId>()
        .map_err(|_| MalformedIdError::new(id, "category must be a single uppercase letter"))?;

    match parts.as_slice() {
        [_] => Ok(Id::Category(category)),
        [_, feature] => Ok(Id::Feature(FeatureId::new(
            category,
            parse_index(id, feature)?,
        ))),
        [_, feature, value] => Ok(Id::Value(ValueId::new(
            FeatureId::new(category, parse_index(id, feature)?),
            parse_index(id, value)?,
        ))),
        _ => Err(MalformedIdError::new(id, "too many segments")),
    }
}

fn parse_index(id: &str, segment: &str) -> Result<NonZeroUsize, MalformedIdError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedIdError::new(id, "index must be a positive integer"));
    }
    if segment.starts_with('0') {
        return Err(MalformedIdError::new(
            id,
            "index must be a positive integer without leading zeros",
        ));
    }
    segment
        .parse::<NonZeroUsize>()
        .map_err(|_| MalformedIdError::new(id, "index must be a positive integer"))
}

/// The category of a feature or value id.
///
/// # Errors
///
/// Returns [`MalformedIdError`] if `id` does not parse.
pub fn category_of(id: &str) -> Result<CategoryId, MalformedIdError> {
    Ok(match split(id)? {
        Id::Category(category) => category,
        Id::Feature(feature) => feature.category(),
        Id::Value(value) => value.feature().category(),
    })
}

/// The feature index of a feature or value id.
///
/// # Errors
///
/// Returns [`MalformedIdError`] if `id` does not parse or is a bare category.
pub fn feature_index_of(id: &str) -> Result<NonZeroUsize, MalformedIdError> {
    match split(id)? {
        Id::Feature(feature) => Ok(feature.index()),
        Id::Value(value) => Ok(value.feature().index()),
        Id::Category(_) => Err(MalformedIdError::new(id, "a category has no feature index")),
    }
}

/// The value index of a value id.
///
/// # Errors
///
/// Returns [`MalformedIdError`] unless `id` is a value id.
pub fn value_index_of(id: &str) -> Result<NonZeroUsize, MalformedIdError> {
    id.parse::<ValueId>().map(ValueId::index)
}

/// The owning feature of a value id.
///
/// # Errors
///
/// Returns [`MalformedIdError`] unless `id` is a value id.
pub fn feature_id_of(value_id: &str) -> Result<FeatureId, MalformedIdError> {
    value_id.parse::<ValueId>().map(ValueId::feature)
}

/// Composes `Category-Index`.
#[must_use]
pub fn compose_feature_id(category: CategoryId, index: NonZeroUsize) -> String {
    FeatureId::new(category, index).to_string()
}

/// Composes `FeatureId-Index`.
#[must_use]
pub fn compose_value_id(feature: FeatureId, index: NonZeroUsize) -> String {
    ValueId::new(feature, index).to_string()
}

/// Splits a multiselect value (ids or names) into its trimmed atoms.
pub fn split_atoms(s: &str) -> impl Iterator<Item = &str> {
    s.split(ATOMIC_SEPARATOR).map(str::trim)
}

/// Joins atoms back into a multiselect value.
#[must_use]
pub fn join_atoms<S: AsRef<str>>(atoms: &[S]) -> String {
    atoms
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(&ATOMIC_SEPARATOR.to_string())
}
