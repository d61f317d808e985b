use tracing::{debug, info, instrument, warn};

use super::{Catalog, Language, ValueDraft, required};
use crate::domain::{
    error::{Entity, Error},
    id::{FeatureId, ValueId},
    record::{ListedValueRecord, ValueType},
    renumber::{check_index, max_index, resolve_pivot},
    text::{loosely_equal, same_name},
};

impl Catalog {
    /// Adds a listed value to a feature.
    ///
    /// The value takes `index_to_assign` (or the next free index when
    /// omitted); values at or above that index shift up by one, in the
    /// inventory and in every profile atom. Profiles answering the feature with
    /// a `custom` text loosely equal to one of `custom_values_to_rename` are
    /// promoted to `listed` with the new value.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for an empty name
    /// - [`Error::NotFound`] if the feature does not exist
    /// - [`Error::Conflict`] if a name is used by another value of the feature
    /// - [`Error::InvalidIndex`] if the index is outside `[1, N + 1]`
    #[instrument(skip(self, draft), fields(en = %draft.en))]
    pub fn add_value(
        &mut self,
        feature: FeatureId,
        draft: ValueDraft,
        index_to_assign: Option<usize>,
        custom_values_to_rename: &[String],
    ) -> Result<ValueId, Error> {
        let en = required("value en", &draft.en)?;
        let ru = required("value ru", &draft.ru)?;
        self.require_feature(feature)?;
        self.check_value_names_free(feature, en.as_str(), ru.as_str(), None)?;

        let pivot = resolve_pivot(
            index_to_assign,
            max_index::<FeatureId, _>(&self.values, feature),
            feature,
        )?;
        let id = ValueId::new(feature, pivot);
        let ru = ru.to_string();

        self.insert_value_row(draft.into_record(id, en.to_string(), ru.clone()));
        let promoted = self.promote_custom_entries(id, &ru, custom_values_to_rename);

        info!(%id, promoted, "added listed value");
        Ok(id)
    }

    /// Removes a listed value.
    ///
    /// Values above it shift down by one. Profile rows that selected it become
    /// `custom` with their value text kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the value does not exist.
    #[instrument(skip(self))]
    pub fn remove_value(&mut self, id: ValueId) -> Result<ListedValueRecord, Error> {
        let record = self
            .remove_value_row(id)
            .ok_or_else(|| Error::not_found(Entity::Value, id))?;

        info!(%id, "removed listed value");
        Ok(record)
    }

    /// Moves a listed value to another index within its feature.
    ///
    /// Equivalent to removing the value and adding it back at
    /// `index_to_assign` with its own Russian name as a custom value to
    /// rename: names and descriptions are kept verbatim, and profile atoms
    /// follow the value to its new index.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the value does not exist
    /// - [`Error::InvalidIndex`] if the index is outside `[1, N]`
    /// - [`Error::NoOpMove`] if the value already sits at that index
    #[instrument(skip(self))]
    pub fn move_value(&mut self, id: ValueId, index_to_assign: usize) -> Result<ValueId, Error> {
        let record = self.require_value(id)?;
        let name = record.ru.clone();
        let feature = id.feature();

        let target = check_index(
            index_to_assign,
            max_index::<FeatureId, _>(&self.values, feature),
            feature,
        )?;
        if target == id.index() {
            return Err(Error::NoOpMove {
                id,
                index: index_to_assign,
            });
        }

        let moved = self
            .relocate_value_row(id, target)
            .ok_or_else(|| Error::not_found(Entity::Value, id))?;
        let promoted = self.promote_custom_entries(moved, &name, &[name.clone()]);

        info!(from = %id, to = %moved, promoted, "moved listed value");
        Ok(moved)
    }

    /// Replaces one of a listed value's names.
    ///
    /// A Russian rename also rewrites the paired name in every profile that
    /// selected the value. In multiselect rows only the name at the value's
    /// own position changes. Rows still holding the name as `custom` text are
    /// left alone.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for an empty name
    /// - [`Error::NotFound`] if the value does not exist
    /// - [`Error::Conflict`] if the name is unchanged or used by a sibling
    ///   value
    #[instrument(skip(self))]
    pub fn rename_value(
        &mut self,
        id: ValueId,
        language: Language,
        name: &str,
    ) -> Result<(), Error> {
        let name = required("value name", name)?;
        let current = self.require_value(id)?;
        let current_name = match language {
            Language::En => &current.en,
            Language::Ru => &current.ru,
        };
        if current_name == name.as_str() {
            return Err(Error::Conflict(format!("{id} is already named '{name}'")));
        }
        match language {
            Language::En => {
                self.check_value_names_free(id.feature(), name.as_str(), "", Some(id))?;
            }
            Language::Ru => {
                self.check_value_names_free(id.feature(), "", name.as_str(), Some(id))?;
            }
        }

        let name = name.to_string();
        if let Some(record) = self.values.iter_mut().find(|v| v.id == id) {
            match language {
                Language::En => record.en.clone_from(&name),
                Language::Ru => record.ru.clone_from(&name),
            }
        }
        self.touched.values = true;

        if language == Language::Ru {
            for profile in &mut self.profiles {
                let Some(entry) = profile.entry_mut(id.feature()) else {
                    continue;
                };
                if entry.value_type != ValueType::Listed {
                    continue;
                }
                let Some(position) = entry.value_id.position(id) else {
                    continue;
                };
                if !entry.replace_value_name(position, &name) {
                    warn!(
                        doculect = %profile.doculect,
                        %id,
                        "value ids and names do not pair up; profile entry left untouched"
                    );
                }
            }
            self.touched.profiles = true;
        }

        info!(%id, ?language, %name, "renamed listed value");
        Ok(())
    }

    /// Canonicalizes one doculect's `custom` answer as the listed value `id`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the value, the doculect, or its row for the
    ///   value's feature does not exist
    /// - [`Error::Validation`] if the row is not `custom`
    #[instrument(skip(self))]
    pub fn mark_custom_as_listed(&mut self, doculect: &str, id: ValueId) -> Result<(), Error> {
        let name = self.require_value(id)?.ru.clone();
        let feature = id.feature();

        let profile = self
            .profiles
            .iter_mut()
            .find(|p| p.doculect == doculect)
            .ok_or_else(|| Error::not_found(Entity::Doculect, doculect))?;
        let entry = profile.entry_mut(feature).ok_or_else(|| {
            Error::not_found(Entity::ProfileEntry, format!("{doculect}/{feature}"))
        })?;
        if entry.value_type != ValueType::Custom {
            return Err(Error::Validation(format!(
                "{doculect} answers {feature} as {}, not custom",
                entry.value_type
            )));
        }

        entry.set_listed(id, &name);
        self.touched.profiles = true;

        info!(%doculect, %id, "marked custom value as listed");
        Ok(())
    }

    /// Promotes `custom` rows of the value's feature whose text matches a
    /// candidate. Returns how many rows changed.
    fn promote_custom_entries(&mut self, id: ValueId, name: &str, candidates: &[String]) -> usize {
        if candidates.is_empty() {
            return 0;
        }
        let mut promoted = 0;
        for profile in &mut self.profiles {
            let Some(entry) = profile.entry_mut(id.feature()) else {
                continue;
            };
            if entry.value_type == ValueType::Custom
                && candidates.iter().any(|c| loosely_equal(c, &entry.value_ru))
            {
                entry.set_listed(id, name);
                promoted += 1;
                debug!(doculect = %profile.doculect, %id, "promoted custom value to listed");
            }
        }
        if promoted > 0 {
            self.touched.profiles = true;
        }
        promoted
    }

    /// Value names are unique within their feature. Empty names are not
    /// checked.
    fn check_value_names_free(
        &self,
        feature: FeatureId,
        en: &str,
        ru: &str,
        except: Option<ValueId>,
    ) -> Result<(), Error> {
        for value in self.values_of(feature).filter(|v| Some(v.id) != except) {
            if (!en.is_empty() && same_name(&value.en, en))
                || (!ru.is_empty() && same_name(&value.ru, ru))
            {
                return Err(Error::Conflict(format!(
                    "{feature} already has a value named '{}' / '{}' ({})",
                    value.en, value.ru, value.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::fixtures::{sample, value_ids};

    fn vid(id: &str) -> ValueId {
        id.parse().unwrap()
    }

    fn fid(id: &str) -> FeatureId {
        id.parse().unwrap()
    }

    #[test]
    fn add_value_shifts_siblings_and_profile_atoms() {
        let mut catalog = sample();
        let id = catalog
            .add_value(fid("A-3"), ValueDraft::new("zero", "ноль"), Some(2), &[])
            .unwrap();

        assert_eq!(id, vid("A-3-2"));
        assert_eq!(
            value_ids(&catalog, "A-3"),
            vec!["A-3-1", "A-3-2", "A-3-3", "A-3-4", "A-3-5"]
        );
        assert_eq!(catalog.value(vid("A-3-3")).unwrap().en, "two");

        let x = catalog.profile("X").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(x.value_id.to_string(), "A-3-1&A-3-4");
        assert_eq!(x.value_ru, "один&три");
        let y = catalog.profile("Y").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(y.value_id.to_string(), "A-3-5");
        // other features untouched
        let x_a2 = catalog.profile("X").unwrap().entry(fid("A-2")).unwrap();
        assert_eq!(x_a2.value_id.to_string(), "A-2-1");
    }

    #[test]
    fn add_value_promotes_matching_custom_answers() {
        let mut catalog = sample();
        let id = catalog
            .add_value(
                fid("A-2"),
                ValueDraft::new("five", "пять"),
                None,
                &["Пять.".to_string()],
            )
            .unwrap();

        assert_eq!(id, vid("A-2-4"));
        let y = catalog.profile("Y").unwrap().entry(fid("A-2")).unwrap();
        assert_eq!(y.value_type, ValueType::Listed);
        assert_eq!(y.value_id.to_string(), "A-2-4");
        assert_eq!(y.value_ru, "пять");
        // not_stated answers are not candidates
        let z = catalog.profile("Z").unwrap().entry(fid("A-2")).unwrap();
        assert_eq!(z.value_type, ValueType::NotStated);
    }

    #[test]
    fn add_value_without_candidates_leaves_custom_answers() {
        let mut catalog = sample();
        catalog
            .add_value(fid("A-2"), ValueDraft::new("five", "пять"), Some(1), &[])
            .unwrap();
        let y = catalog.profile("Y").unwrap().entry(fid("A-2")).unwrap();
        assert_eq!(y.value_type, ValueType::Custom);
        let x = catalog.profile("X").unwrap().entry(fid("A-2")).unwrap();
        assert_eq!(x.value_id.to_string(), "A-2-2");
    }

    #[test]
    fn add_value_validates_before_touching_anything() {
        let mut catalog = sample();
        let before = catalog.clone();

        let taken = catalog.add_value(fid("A-3"), ValueDraft::new("One", "x"), None, &[]);
        assert!(matches!(taken, Err(Error::Conflict(_))));

        let missing = catalog.add_value(fid("A-9"), ValueDraft::new("a", "b"), None, &[]);
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        let empty = catalog.add_value(fid("A-3"), ValueDraft::new("", "b"), None, &[]);
        assert!(matches!(empty, Err(Error::Validation(_))));

        let index = catalog.add_value(fid("A-3"), ValueDraft::new("a", "b"), Some(6), &[]);
        assert!(matches!(index, Err(Error::InvalidIndex { max: 5, .. })));

        assert_eq!(catalog, before);
    }

    #[test]
    fn name_uniqueness_is_per_feature() {
        let mut catalog = sample();
        // "two" exists in A-3 but not in A-1
        catalog
            .add_value(fid("A-1"), ValueDraft::new("two", "две"), None, &[])
            .unwrap();
    }

    #[test]
    fn remove_value_reverts_selecting_rows_to_custom() {
        let mut catalog = sample();
        let removed = catalog.remove_value(vid("A-3-3")).unwrap();
        assert_eq!(removed.en, "three");

        assert_eq!(value_ids(&catalog, "A-3"), vec!["A-3-1", "A-3-2", "A-3-3"]);
        assert_eq!(catalog.value(vid("A-3-3")).unwrap().en, "four");

        let x = catalog.profile("X").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(x.value_type, ValueType::Custom);
        assert!(x.value_id.is_empty());
        assert_eq!(x.value_ru, "один&три");

        let y = catalog.profile("Y").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(y.value_type, ValueType::Listed);
        assert_eq!(y.value_id.to_string(), "A-3-3");
    }

    #[test]
    fn remove_value_drops_rule_it_triggers() {
        let mut catalog = sample();
        catalog.remove_value(vid("A-1-2")).unwrap();
        assert!(catalog.rules().is_empty());
        assert!(catalog.touched().rules);
    }

    #[test]
    fn remove_missing_value_fails_the_same_way_twice() {
        let mut catalog = sample();
        let before = catalog.clone();
        for _ in 0..2 {
            let err = catalog.remove_value(vid("A-3-9")).unwrap_err();
            assert_eq!(
                err,
                Error::NotFound {
                    entity: Entity::Value,
                    id: "A-3-9".to_string()
                }
            );
        }
        assert_eq!(catalog, before);
    }

    #[test]
    fn move_value_up_preserves_content() {
        let mut catalog = sample();
        let original = catalog.value(vid("A-3-4")).unwrap().clone();
        let moved = catalog.move_value(vid("A-3-4"), 2).unwrap();

        assert_eq!(moved, vid("A-3-2"));
        let names: Vec<&str> = catalog
            .values_of(fid("A-3"))
            .map(|v| v.en.as_str())
            .collect();
        assert_eq!(names, vec!["one", "four", "two", "three"]);
        assert_eq!(value_ids(&catalog, "A-3"), vec!["A-3-1", "A-3-2", "A-3-3", "A-3-4"]);

        let relocated = catalog.value(moved).unwrap();
        assert_eq!(relocated.en, original.en);
        assert_eq!(relocated.ru, original.ru);
        assert_eq!(
            relocated.description_formatted_en,
            original.description_formatted_en
        );
        assert_eq!(
            relocated.description_formatted_ru,
            original.description_formatted_ru
        );

        let x = catalog.profile("X").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(x.value_id.to_string(), "A-3-1&A-3-4");
        assert_eq!(x.value_ru, "один&три");
        let y = catalog.profile("Y").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(y.value_id.to_string(), "A-3-2");
        assert_eq!(y.value_type, ValueType::Listed);
    }

    #[test]
    fn move_value_down() {
        let mut catalog = sample();
        catalog.move_value(vid("A-3-1"), 3).unwrap();
        let names: Vec<&str> = catalog
            .values_of(fid("A-3"))
            .map(|v| v.en.as_str())
            .collect();
        assert_eq!(names, vec!["two", "three", "one", "four"]);

        let x = catalog.profile("X").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(x.value_id.to_string(), "A-3-3&A-3-2");
    }

    #[test]
    fn move_value_reattaches_custom_text() {
        let mut catalog = sample();
        catalog.profiles[2].entries[2].value_type = ValueType::Custom;
        catalog.profiles[2].entries[2].value_ru = "Четыре".to_string();

        catalog.move_value(vid("A-3-4"), 1).unwrap();

        let z = catalog.profile("Z").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(z.value_type, ValueType::Listed);
        assert_eq!(z.value_id.to_string(), "A-3-1");
        assert_eq!(z.value_ru, "четыре");
    }

    #[test]
    fn move_value_rejects_noop_and_bad_index() {
        let mut catalog = sample();
        let before = catalog.clone();
        assert_eq!(
            catalog.move_value(vid("A-3-2"), 2).unwrap_err(),
            Error::NoOpMove {
                id: vid("A-3-2"),
                index: 2
            }
        );
        assert!(matches!(
            catalog.move_value(vid("A-3-2"), 5),
            Err(Error::InvalidIndex { max: 4, .. })
        ));
        assert!(matches!(
            catalog.move_value(vid("A-3-2"), 0),
            Err(Error::InvalidIndex { .. })
        ));
        assert_eq!(catalog, before);
    }

    #[test]
    fn move_value_carries_rule_trigger() {
        let mut catalog = sample();
        catalog.move_value(vid("A-1-2"), 1).unwrap();
        let rule = catalog.rules().get(fid("A-1")).unwrap();
        assert_eq!(rule.trigger, vid("A-1-1"));
        let x = catalog.profile("X").unwrap().entry(fid("A-1")).unwrap();
        assert_eq!(x.value_id.to_string(), "A-1-1");
        let y = catalog.profile("Y").unwrap().entry(fid("A-1")).unwrap();
        assert_eq!(y.value_id.to_string(), "A-1-2");
    }

    #[test]
    fn rename_value_ru_touches_only_its_atom() {
        let mut catalog = sample();
        catalog
            .rename_value(vid("A-3-3"), Language::Ru, "три (3)")
            .unwrap();

        assert_eq!(catalog.value(vid("A-3-3")).unwrap().ru, "три (3)");
        let x = catalog.profile("X").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(x.value_ru, "один&три (3)");
        // A-2-2 is also named "три" but is a different value
        assert_eq!(catalog.value(vid("A-2-2")).unwrap().ru, "три");
    }

    #[test]
    fn rename_value_en_leaves_profiles() {
        let mut catalog = sample();
        catalog
            .rename_value(vid("A-3-3"), Language::En, "3")
            .unwrap();
        assert_eq!(catalog.value(vid("A-3-3")).unwrap().en, "3");
        let x = catalog.profile("X").unwrap().entry(fid("A-3")).unwrap();
        assert_eq!(x.value_ru, "один&три");
        assert!(!catalog.touched().profiles);
    }

    #[test]
    fn rename_value_skips_custom_rows() {
        let mut catalog = sample();
        catalog
            .rename_value(vid("A-2-1"), Language::Ru, "пять")
            .unwrap();
        let y = catalog.profile("Y").unwrap().entry(fid("A-2")).unwrap();
        assert_eq!(y.value_type, ValueType::Custom);
        assert_eq!(y.value_ru, "пять");
        let x = catalog.profile("X").unwrap().entry(fid("A-2")).unwrap();
        assert_eq!(x.value_ru, "пять");
    }

    #[test]
    fn rename_value_conflicts() {
        let mut catalog = sample();
        assert!(matches!(
            catalog.rename_value(vid("A-3-3"), Language::Ru, "три"),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            catalog.rename_value(vid("A-3-3"), Language::En, "Four"),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            catalog.rename_value(vid("A-3-9"), Language::En, "nine"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn mark_custom_as_listed_canonicalizes_one_doculect() {
        let mut catalog = sample();
        catalog
            .mark_custom_as_listed("Y", vid("A-2-3"))
            .unwrap();
        let y = catalog.profile("Y").unwrap().entry(fid("A-2")).unwrap();
        assert_eq!(y.value_type, ValueType::Listed);
        assert_eq!(y.value_id.to_string(), "A-2-3");
        assert_eq!(y.value_ru, "четыре и больше");

        assert!(matches!(
            catalog.mark_custom_as_listed("X", vid("A-2-3")),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            catalog.mark_custom_as_listed("Q", vid("A-2-3")),
            Err(Error::NotFound {
                entity: Entity::Doculect,
                ..
            })
        ));
    }
}
