//! Index shifting inside a category or feature scope.
//!
//! Indices within a scope always form the contiguous run `1..=N`. Inserting at
//! a pivot shifts every in-scope index `>= pivot` up by one; deleting at a
//! pivot shifts every in-scope index `> pivot` down by one. Records outside
//! the scope are never touched.

use std::{fmt, num::NonZeroUsize};

use crate::domain::{
    error::Error,
    id::{CategoryId, FeatureId, ValueId},
    record::{FeatureRecord, ListedValueRecord, ProfileEntry},
};

/// The direction of a renumbering around a pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// Make room at the pivot: indices `>= pivot` increment.
    Insert(NonZeroUsize),
    /// Close the gap left at the pivot: indices `> pivot` decrement.
    Delete(NonZeroUsize),
}

impl Shift {
    /// The new value of `index` under this shift.
    ///
    /// Under [`Shift::Delete`] the pivot itself maps to itself; the caller is
    /// expected to have removed that record already.
    #[must_use]
    pub fn apply(self, index: NonZeroUsize) -> NonZeroUsize {
        match self {
            Self::Insert(pivot) if index >= pivot => index.saturating_add(1),
            Self::Delete(pivot) if index > pivot => {
                NonZeroUsize::new(index.get() - 1).unwrap_or(NonZeroUsize::MIN)
            }
            _ => index,
        }
    }
}

/// A renumbering of one scope, tagged by the level of the index it shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renumbering {
    /// Shift feature indices within a category. Value ids embed the feature
    /// index, so they move with their feature.
    Feature {
        /// The category being renumbered.
        category: CategoryId,
        /// The shift to apply.
        shift: Shift,
    },
    /// Shift value indices within a feature.
    Value {
        /// The feature being renumbered.
        feature: FeatureId,
        /// The shift to apply.
        shift: Shift,
    },
}

impl Renumbering {
    /// The new id of a feature.
    #[must_use]
    pub fn feature_id(&self, id: FeatureId) -> FeatureId {
        match *self {
            Self::Feature { category, shift } if id.category() == category => {
                id.with_index(shift.apply(id.index()))
            }
            _ => id,
        }
    }

    /// The new id of a listed value.
    #[must_use]
    pub fn value_id(&self, id: ValueId) -> ValueId {
        match *self {
            Self::Feature { .. } => id.with_feature(self.feature_id(id.feature())),
            Self::Value { feature, shift } if id.feature() == feature => {
                id.with_index(shift.apply(id.index()))
            }
            Self::Value { .. } => id,
        }
    }
}

impl fmt::Display for Renumbering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (scope, shift) = match self {
            Self::Feature { category, shift } => (category.to_string(), shift),
            Self::Value { feature, shift } => (feature.to_string(), shift),
        };
        match shift {
            Shift::Insert(pivot) => write!(f, "insert at {pivot} in {scope}"),
            Shift::Delete(pivot) => write!(f, "delete at {pivot} in {scope}"),
        }
    }
}

/// Records that embed ids affected by a renumbering.
pub trait Renumber {
    /// Rewrites every embedded id in place.
    fn renumber(&mut self, renumbering: &Renumbering);
}

impl Renumber for FeatureRecord {
    fn renumber(&mut self, renumbering: &Renumbering) {
        self.id = renumbering.feature_id(self.id);
    }
}

impl Renumber for ListedValueRecord {
    fn renumber(&mut self, renumbering: &Renumbering) {
        self.id = renumbering.value_id(self.id);
        self.feature_id = renumbering.feature_id(self.feature_id);
    }
}

impl Renumber for ProfileEntry {
    fn renumber(&mut self, renumbering: &Renumbering) {
        self.feature_id = renumbering.feature_id(self.feature_id);
        self.value_id.map_in_place(|atom| renumbering.value_id(atom));
    }
}

/// Applies a renumbering to every record, in place.
pub fn renumber_all<R: Renumber>(records: &mut [R], renumbering: &Renumbering) {
    for record in records {
        record.renumber(renumbering);
    }
}

/// Returns a renumbered copy of `records`, leaving the input untouched.
#[must_use]
pub fn renumbered<R: Renumber + Clone>(records: &[R], renumbering: &Renumbering) -> Vec<R> {
    let mut out = records.to_vec();
    renumber_all(&mut out, renumbering);
    out
}

/// Records with a physical position in a file ordered by `(scope, index)`.
///
/// A record type may be positioned in more than one kind of scope; listed
/// values sit both in a feature (by value index) and in a category (by
/// feature index).
pub trait Positioned<S> {
    /// The scope this record belongs to and its index within it.
    fn position_key(&self) -> (S, NonZeroUsize);
}

impl Positioned<CategoryId> for FeatureRecord {
    fn position_key(&self) -> (CategoryId, NonZeroUsize) {
        (self.id.category(), self.id.index())
    }
}

impl Positioned<CategoryId> for ListedValueRecord {
    fn position_key(&self) -> (CategoryId, NonZeroUsize) {
        (self.feature_id.category(), self.feature_id.index())
    }
}

impl Positioned<FeatureId> for ListedValueRecord {
    fn position_key(&self) -> (FeatureId, NonZeroUsize) {
        (self.id.feature(), self.id.index())
    }
}

impl Positioned<CategoryId> for ProfileEntry {
    fn position_key(&self) -> (CategoryId, NonZeroUsize) {
        (self.feature_id.category(), self.feature_id.index())
    }
}

/// Where a new record for `(scope, pivot)` physically goes.
///
/// The position is immediately after the last in-scope record with an index
/// below the pivot. Failing that, it is the position of the first in-scope
/// record at or above the pivot, which is shifted right rather than
/// overwritten. An empty scope goes after the last record of any preceding
/// scope, or at the very start.
pub fn insertion_point<S, R>(records: &[R], scope: S, pivot: NonZeroUsize) -> usize
where
    S: Ord,
    R: Positioned<S>,
{
    let mut after_lower = None;
    let mut first_at_or_above = None;
    let mut after_preceding_scope = None;

    for (position, record) in records.iter().enumerate() {
        let (record_scope, index) = record.position_key();
        if record_scope == scope {
            if index < pivot {
                after_lower = Some(position + 1);
            } else if first_at_or_above.is_none() {
                first_at_or_above = Some(position);
            }
        } else if record_scope < scope {
            after_preceding_scope = Some(position + 1);
        }
    }

    after_lower
        .or(first_at_or_above)
        .or(after_preceding_scope)
        .unwrap_or(0)
}

/// The largest index used in `scope`, or zero if the scope is empty.
pub fn max_index<S, R>(records: &[R], scope: S) -> usize
where
    S: PartialEq,
    R: Positioned<S>,
{
    records
        .iter()
        .map(Positioned::position_key)
        .filter(|(record_scope, _)| *record_scope == scope)
        .map(|(_, index)| index.get())
        .max()
        .unwrap_or(0)
}

/// Resolves the pivot for an insertion into a scope whose largest index is
/// `max`.
///
/// The acceptable range is the closed `[1, max + 1]`; omitting the index
/// appends at `max + 1`.
///
/// # Errors
///
/// Returns [`Error::InvalidIndex`] for a requested index outside the range.
pub fn resolve_pivot(
    requested: Option<usize>,
    max: usize,
    scope: impl fmt::Display,
) -> Result<NonZeroUsize, Error> {
    let append = max.saturating_add(1);
    check_index(requested.unwrap_or(append), append, scope)
}

/// Checks that `requested` lies in the closed range `[1, max]`.
///
/// # Errors
///
/// Returns [`Error::InvalidIndex`] otherwise.
pub fn check_index(
    requested: usize,
    max: usize,
    scope: impl fmt::Display,
) -> Result<NonZeroUsize, Error> {
    NonZeroUsize::new(requested)
        .filter(|index| index.get() <= max)
        .ok_or_else(|| Error::InvalidIndex {
            scope: scope.to_string(),
            index: requested,
            max,
        })
}
