//! Dependency propagation: switching features to `not_applicable` when a
//! controlling feature's trigger value is selected.

use tracing::{debug, info, instrument, warn};

use super::Catalog;
use crate::domain::{
    id::{FeatureId, ValueId},
    record::{Profile, ValueType},
    rules::NotApplicableRules,
};

/// A dependent feature that should be `not_applicable` but holds some other
/// answer. Left untouched by propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotApplicableConflict {
    /// The doculect whose profile holds the conflicting row.
    pub doculect: String,
    /// The feature whose answer triggers the rule.
    pub controlling: FeatureId,
    /// The selected trigger value.
    pub trigger: ValueId,
    /// The feature that should be `not_applicable`.
    pub dependent: FeatureId,
    /// What the dependent row actually holds.
    pub value_type: ValueType,
}

/// The outcome of [`Catalog::apply_not_applicable_rules`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Propagation {
    /// `(doculect, feature)` rows switched from `not_stated` to
    /// `not_applicable`.
    pub switched: Vec<(String, FeatureId)>,
    /// Rows that were left alone because they hold a different answer.
    pub conflicts: Vec<NotApplicableConflict>,
}

/// One rule firing in one profile.
pub(super) struct Triggered {
    pub controlling: FeatureId,
    pub trigger: ValueId,
    pub dependent: FeatureId,
}

/// Every `(controlling, trigger, dependent)` triple whose trigger is selected
/// in `profile`.
///
/// A trigger is selected when the controlling row is `listed` and its value id
/// list contains the trigger.
pub(super) fn triggered_in(profile: &Profile, rules: &NotApplicableRules) -> Vec<Triggered> {
    rules
        .iter()
        .filter(|(controlling, rule)| {
            profile.entry(*controlling).is_some_and(|entry| {
                entry.value_type == ValueType::Listed && entry.value_id.contains(rule.trigger)
            })
        })
        .flat_map(|(controlling, rule)| {
            rule.features_to_get_not_applicable
                .iter()
                .map(move |&dependent| Triggered {
                    controlling,
                    trigger: rule.trigger,
                    dependent,
                })
        })
        .collect()
}

impl Catalog {
    /// Applies every not-applicable rule to every profile.
    ///
    /// The only transition performed is `not_stated → not_applicable`.
    /// Dependent rows holding any other answer are reported as conflicts and
    /// never overwritten.
    #[instrument(skip(self))]
    pub fn apply_not_applicable_rules(&mut self) -> Propagation {
        let mut propagation = Propagation::default();
        if self.rules.is_empty() {
            debug!("no not-applicable rules");
            return propagation;
        }

        for profile in &mut self.profiles {
            for fired in triggered_in(profile, &self.rules) {
                let doculect = profile.doculect.clone();
                let Some(entry) = profile.entry_mut(fired.dependent) else {
                    debug!(
                        %doculect,
                        dependent = %fired.dependent,
                        "dependent feature has no profile row"
                    );
                    continue;
                };
                match entry.value_type {
                    ValueType::NotStated => {
                        entry.value_type = ValueType::NotApplicable;
                        debug!(
                            %doculect,
                            dependent = %fired.dependent,
                            "switched to not_applicable"
                        );
                        propagation.switched.push((doculect, fired.dependent));
                    }
                    ValueType::NotApplicable => {}
                    value_type => {
                        warn!(
                            %doculect,
                            controlling = %fired.controlling,
                            dependent = %fired.dependent,
                            %value_type,
                            "dependent feature should be not_applicable; left untouched"
                        );
                        propagation.conflicts.push(NotApplicableConflict {
                            doculect,
                            controlling: fired.controlling,
                            trigger: fired.trigger,
                            dependent: fired.dependent,
                            value_type,
                        });
                    }
                }
            }
        }

        if !propagation.switched.is_empty() {
            self.touched.profiles = true;
        }

        info!(
            switched = propagation.switched.len(),
            conflicts = propagation.conflicts.len(),
            "applied not-applicable rules"
        );
        propagation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::fixtures::sample;

    fn fid(id: &str) -> FeatureId {
        id.parse().unwrap()
    }

    fn value_type(catalog: &Catalog, doculect: &str, feature: &str) -> ValueType {
        catalog
            .profile(doculect)
            .unwrap()
            .entry(fid(feature))
            .unwrap()
            .value_type
    }

    #[test]
    fn switches_only_not_stated_dependents_of_selected_triggers() {
        let mut catalog = sample();
        let propagation = catalog.apply_not_applicable_rules();

        assert_eq!(
            propagation.switched,
            vec![("X".to_string(), fid("B-1")), ("Z".to_string(), fid("A-3"))]
        );
        assert_eq!(value_type(&catalog, "X", "B-1"), ValueType::NotApplicable);
        assert_eq!(value_type(&catalog, "Z", "A-3"), ValueType::NotApplicable);

        // Y selected the other value of A-1
        assert_eq!(value_type(&catalog, "Y", "B-1"), ValueType::NotStated);
        assert!(catalog.touched().profiles);
    }

    #[test]
    fn conflicting_answers_are_reported_not_overwritten() {
        let mut catalog = sample();
        let propagation = catalog.apply_not_applicable_rules();

        let conflicts: Vec<(&str, String, ValueType)> = propagation
            .conflicts
            .iter()
            .map(|c| (c.doculect.as_str(), c.dependent.to_string(), c.value_type))
            .collect();
        assert_eq!(
            conflicts,
            vec![
                ("X", "A-3".to_string(), ValueType::Listed),
                ("Z", "B-1".to_string(), ValueType::ExplicitGap),
            ]
        );
        assert_eq!(value_type(&catalog, "X", "A-3"), ValueType::Listed);
        assert_eq!(value_type(&catalog, "Z", "B-1"), ValueType::ExplicitGap);
    }

    #[test]
    fn second_run_changes_nothing() {
        let mut catalog = sample();
        catalog.apply_not_applicable_rules();
        catalog.take_touched();
        let before = catalog.clone();

        let propagation = catalog.apply_not_applicable_rules();
        assert!(propagation.switched.is_empty());
        assert_eq!(propagation.conflicts.len(), 2);
        assert_eq!(catalog, before);
        assert!(!catalog.touched().any());
    }

    #[test]
    fn custom_controlling_answer_does_not_trigger() {
        let mut catalog = sample();
        catalog.profiles[0].entries[0].value_type = ValueType::Custom;
        let propagation = catalog.apply_not_applicable_rules();
        assert!(propagation.switched.iter().all(|(d, _)| d != "X"));
        assert_eq!(value_type(&catalog, "X", "B-1"), ValueType::NotStated);
    }

    #[test]
    fn without_rules_nothing_switches() {
        let mut catalog = sample();
        catalog.rules = NotApplicableRules::default();
        let propagation = catalog.apply_not_applicable_rules();
        assert!(propagation.switched.is_empty());
        assert!(propagation.conflicts.is_empty());
        assert!(!catalog.touched().profiles);
    }
}
