//! Cross-store propagation.
//!
//! Each helper applies one logical row insertion or removal to every store it
//! reaches, with a single pivot shared by all of them. Stores are visited in a
//! fixed order: listed values, then profiles, then features, then rules.

use std::{mem, num::NonZeroUsize};

use tracing::{debug, warn};

use super::Catalog;
use crate::domain::{
    id::{CategoryId, FeatureId, ValueId},
    record::{FeatureRecord, ListedValueRecord, ProfileEntry, ValueType},
    renumber::{Renumbering, Shift, insertion_point, renumber_all},
};

impl Catalog {
    /// Applies one renumbering to every store.
    pub(super) fn propagate(&mut self, renumbering: &Renumbering) {
        renumber_all(&mut self.values, renumbering);
        self.touched.values = true;

        for profile in &mut self.profiles {
            renumber_all(&mut profile.entries, renumbering);
        }
        self.touched.profiles = true;

        if matches!(renumbering, Renumbering::Feature { .. }) {
            renumber_all(&mut self.features, renumbering);
            self.touched.features = true;
        }

        if self.rules.renumber(renumbering) {
            self.touched.rules = true;
        }

        debug!(%renumbering, profiles = self.profiles.len(), "renumbered stores");
    }

    /// Inserts a new feature with its listed values, making room at its index
    /// in every store and fanning a `not_stated` row out to every profile.
    pub(super) fn insert_feature_rows(
        &mut self,
        record: FeatureRecord,
        values: Vec<ListedValueRecord>,
    ) {
        let id = record.id;
        let (category, pivot) = (id.category(), id.index());

        self.propagate(&Renumbering::Feature {
            category,
            shift: Shift::Insert(pivot),
        });

        let at = insertion_point::<CategoryId, _>(&self.values, category, pivot);
        self.values.splice(at..at, values);

        for profile in &mut self.profiles {
            let at = insertion_point(&profile.entries, category, pivot);
            profile
                .entries
                .insert(at, ProfileEntry::not_stated(id, &record.ru));
        }

        let at = insertion_point(&self.features, category, pivot);
        self.features.insert(at, record);
    }

    /// Removes a feature, its listed values and its profile rows, then closes
    /// the gap in every store.
    pub(super) fn remove_feature_rows(
        &mut self,
        id: FeatureId,
    ) -> Option<(FeatureRecord, Vec<ListedValueRecord>)> {
        let position = self.features.iter().position(|f| f.id == id)?;

        let (removed_values, kept): (Vec<_>, Vec<_>) = mem::take(&mut self.values)
            .into_iter()
            .partition(|v| v.feature_id == id);
        self.values = kept;

        for profile in &mut self.profiles {
            profile.entries.retain(|e| e.feature_id != id);
        }

        let record = self.features.remove(position);

        if self.rules.forget_feature(id) {
            warn!(%id, "dropped not-applicable rules referencing removed feature");
            self.touched.rules = true;
        }

        self.propagate(&Renumbering::Feature {
            category: id.category(),
            shift: Shift::Delete(id.index()),
        });

        Some((record, removed_values))
    }

    /// Inserts a listed value at its index, making room in the value store and
    /// shifting profile atoms of the same feature.
    pub(super) fn insert_value_row(&mut self, record: ListedValueRecord) {
        let (feature, pivot) = (record.id.feature(), record.id.index());

        self.propagate(&Renumbering::Value {
            feature,
            shift: Shift::Insert(pivot),
        });

        let at = insertion_point::<FeatureId, _>(&self.values, feature, pivot);
        self.values.insert(at, record);
    }

    /// Removes a listed value and closes the gap.
    ///
    /// Profile rows that selected the value become `custom`, keeping their
    /// value text verbatim; the value id list is cleared.
    pub(super) fn remove_value_row(&mut self, id: ValueId) -> Option<ListedValueRecord> {
        let record = self.take_value_record(id)?;

        for profile in &mut self.profiles {
            let Some(entry) = profile.entry_mut(id.feature()) else {
                continue;
            };
            if entry.value_type == ValueType::Listed && entry.value_id.contains(id) {
                entry.value_type = ValueType::Custom;
                entry.value_id.clear();
                debug!(doculect = %profile.doculect, %id, "reverted profile entry to custom");
            }
        }

        if self.rules.forget_trigger(id) {
            warn!(%id, "dropped not-applicable rule triggered by removed value");
            self.touched.rules = true;
        }

        self.propagate(&Renumbering::Value {
            feature: id.feature(),
            shift: Shift::Delete(id.index()),
        });

        Some(record)
    }

    /// Relocates a listed value within its feature.
    ///
    /// The value store sees a removal at `source` followed by an insertion at
    /// `target`. Every other atom of the feature is renumbered by the same two
    /// shifts, and atoms of the moved value follow it to `target`.
    pub(super) fn relocate_value_row(
        &mut self,
        id: ValueId,
        target: NonZeroUsize,
    ) -> Option<ValueId> {
        let mut record = self.take_value_record(id)?;
        let feature = id.feature();
        let source = id.index();

        let removal = Renumbering::Value {
            feature,
            shift: Shift::Delete(source),
        };
        let insertion = Renumbering::Value {
            feature,
            shift: Shift::Insert(target),
        };
        renumber_all(&mut self.values, &removal);
        renumber_all(&mut self.values, &insertion);

        let moved = id.with_index(target);
        record.id = moved;
        let at = insertion_point::<FeatureId, _>(&self.values, feature, target);
        self.values.insert(at, record);
        self.touched.values = true;

        let remap = |atom: ValueId| {
            if atom == id {
                moved
            } else {
                insertion.value_id(removal.value_id(atom))
            }
        };

        for profile in &mut self.profiles {
            if let Some(entry) = profile.entry_mut(feature) {
                entry.value_id.map_in_place(remap);
            }
        }
        self.touched.profiles = true;

        if self.rules.map_triggers(remap) {
            self.touched.rules = true;
        }

        debug!(%id, %moved, "relocated listed value");
        Some(moved)
    }

    fn take_value_record(&mut self, id: ValueId) -> Option<ListedValueRecord> {
        let position = self.values.iter().position(|v| v.id == id)?;
        self.touched.values = true;
        Some(self.values.remove(position))
    }
}
