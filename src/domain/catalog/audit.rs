//! Read-only consistency checks across every store.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    num::NonZeroUsize,
};

use tracing::{debug, instrument};

use super::{Catalog, NotApplicableConflict, not_applicable::triggered_in};
use crate::domain::{
    id::{CategoryId, FeatureId, ValueId},
    record::{Profile, ValueType},
    rules::RuleProblem,
    text::same_name,
};

/// One inconsistency found by [`Catalog::audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A category whose feature indices skip a number.
    FeatureIndexGap {
        /// The category.
        category: CategoryId,
        /// An index missing from `1..=N`.
        missing: usize,
    },
    /// A feature id used by more than one row.
    DuplicateFeatureId(FeatureId),
    /// A feature whose value indices skip a number.
    ValueIndexGap {
        /// The feature.
        feature: FeatureId,
        /// An index missing from `1..=N`.
        missing: usize,
    },
    /// A value id used by more than one row.
    DuplicateValueId(ValueId),
    /// A value row whose id disagrees with its `feature_id` column.
    ValueFeatureMismatch {
        /// The value id.
        value: ValueId,
        /// The `feature_id` column.
        feature_id: FeatureId,
    },
    /// A value of a feature that is not in the inventory.
    OrphanValue(ValueId),
    /// Two features sharing a name.
    DuplicateFeatureName {
        /// The earlier feature.
        first: FeatureId,
        /// The later feature.
        second: FeatureId,
        /// The shared name.
        name: String,
    },
    /// Two values of one feature sharing a name.
    DuplicateValueName {
        /// The earlier value.
        first: ValueId,
        /// The later value.
        second: ValueId,
        /// The shared name.
        name: String,
    },
    /// A profile with no row for an inventory feature.
    MissingEntry {
        /// The doculect.
        doculect: String,
        /// The feature without a row.
        feature: FeatureId,
    },
    /// A profile with several rows for one feature.
    DuplicateEntry {
        /// The doculect.
        doculect: String,
        /// The repeated feature.
        feature: FeatureId,
    },
    /// A profile row for a feature that is not in the inventory.
    UnknownEntry {
        /// The doculect.
        doculect: String,
        /// The unknown feature.
        feature: FeatureId,
    },
    /// A `listed` row with no value id.
    ListedWithoutValue {
        /// The doculect.
        doculect: String,
        /// The feature.
        feature: FeatureId,
    },
    /// A `listed` row naming a value that is not in the inventory.
    UnknownValue {
        /// The doculect.
        doculect: String,
        /// The unknown value.
        value: ValueId,
    },
    /// A `listed` row naming a value of some other feature.
    ForeignValue {
        /// The doculect.
        doculect: String,
        /// The feature of the row.
        feature: FeatureId,
        /// The foreign value.
        value: ValueId,
    },
    /// A row carrying value ids although it is not `listed`.
    ValueOnNonListed {
        /// The doculect.
        doculect: String,
        /// The feature.
        feature: FeatureId,
        /// The row's value type.
        value_type: ValueType,
    },
    /// A row of a single-select feature naming several values.
    TooManyValues {
        /// The doculect.
        doculect: String,
        /// The feature.
        feature: FeatureId,
        /// How many values it names.
        count: usize,
    },
    /// A multiselect row whose value ids and names do not pair up.
    UnpairedNames {
        /// The doculect.
        doculect: String,
        /// The feature.
        feature: FeatureId,
        /// Number of value ids.
        ids: usize,
        /// Number of value names.
        names: usize,
    },
    /// A row whose `feature_name_ru` differs from the inventory.
    StaleFeatureName {
        /// The doculect.
        doculect: String,
        /// The feature.
        feature: FeatureId,
        /// The name held by the profile.
        found: String,
    },
    /// A selected trigger whose dependent holds a real answer.
    NotApplicableConflict(NotApplicableConflict),
    /// A defect in the not-applicable rules.
    Rule(RuleProblem),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeatureIndexGap { category, missing } => {
                write!(f, "category {category} has no feature with index {missing}")
            }
            Self::DuplicateFeatureId(id) => write!(f, "feature id {id} is used more than once"),
            Self::ValueIndexGap { feature, missing } => {
                write!(f, "feature {feature} has no value with index {missing}")
            }
            Self::DuplicateValueId(id) => write!(f, "value id {id} is used more than once"),
            Self::ValueFeatureMismatch { value, feature_id } => {
                write!(f, "value {value} is filed under feature {feature_id}")
            }
            Self::OrphanValue(id) => write!(f, "value {id} belongs to no known feature"),
            Self::DuplicateFeatureName {
                first,
                second,
                name,
            } => write!(f, "features {first} and {second} are both named '{name}'"),
            Self::DuplicateValueName {
                first,
                second,
                name,
            } => write!(f, "values {first} and {second} are both named '{name}'"),
            Self::MissingEntry { doculect, feature } => {
                write!(f, "{doculect}: no row for feature {feature}")
            }
            Self::DuplicateEntry { doculect, feature } => {
                write!(f, "{doculect}: several rows for feature {feature}")
            }
            Self::UnknownEntry { doculect, feature } => {
                write!(f, "{doculect}: row for unknown feature {feature}")
            }
            Self::ListedWithoutValue { doculect, feature } => {
                write!(f, "{doculect}: {feature} is listed but has no value id")
            }
            Self::UnknownValue { doculect, value } => {
                write!(f, "{doculect}: unknown listed value {value}")
            }
            Self::ForeignValue {
                doculect,
                feature,
                value,
            } => write!(f, "{doculect}: {feature} answered with {value} of another feature"),
            Self::ValueOnNonListed {
                doculect,
                feature,
                value_type,
            } => write!(f, "{doculect}: {feature} is {value_type} but carries value ids"),
            Self::TooManyValues {
                doculect,
                feature,
                count,
            } => write!(
                f,
                "{doculect}: {feature} is not multiselect but names {count} values"
            ),
            Self::UnpairedNames {
                doculect,
                feature,
                ids,
                names,
            } => write!(
                f,
                "{doculect}: {feature} has {ids} value ids but {names} value names"
            ),
            Self::StaleFeatureName {
                doculect,
                feature,
                found,
            } => write!(f, "{doculect}: {feature} is named '{found}' in the profile"),
            Self::NotApplicableConflict(conflict) => write!(
                f,
                "{}: {} selects {}, so {} should be not_applicable but is {}",
                conflict.doculect,
                conflict.controlling,
                conflict.trigger,
                conflict.dependent,
                conflict.value_type
            ),
            Self::Rule(problem) => write!(f, "{problem}"),
        }
    }
}

impl Catalog {
    /// Checks every store for inconsistencies without changing anything.
    #[instrument(skip(self))]
    #[must_use]
    pub fn audit(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        self.audit_features(&mut findings);
        self.audit_values(&mut findings);
        for profile in &self.profiles {
            self.audit_profile(profile, &mut findings);
        }
        findings.extend(
            self.rules
                .problems(|id| self.feature(id).is_some(), |id| self.value(id).is_some())
                .into_iter()
                .map(Finding::Rule),
        );

        debug!(findings = findings.len(), "audited catalog");
        findings
    }

    fn audit_features(&self, findings: &mut Vec<Finding>) {
        let mut indices: BTreeMap<CategoryId, Vec<NonZeroUsize>> = BTreeMap::new();
        for feature in &self.features {
            indices
                .entry(feature.id.category())
                .or_default()
                .push(feature.id.index());
        }
        for (category, indices) in indices {
            findings.extend(index_problems(indices).into_iter().map(|problem| match problem {
                IndexProblem::Gap(missing) => Finding::FeatureIndexGap { category, missing },
                IndexProblem::Duplicate(index) => {
                    Finding::DuplicateFeatureId(FeatureId::new(category, index))
                }
            }));
        }

        for (position, later) in self.features.iter().enumerate() {
            for earlier in &self.features[..position] {
                for (a, b) in [(&earlier.en, &later.en), (&earlier.ru, &later.ru)] {
                    if same_name(a, b) {
                        findings.push(Finding::DuplicateFeatureName {
                            first: earlier.id,
                            second: later.id,
                            name: b.clone(),
                        });
                    }
                }
            }
        }
    }

    fn audit_values(&self, findings: &mut Vec<Finding>) {
        let mut indices: BTreeMap<FeatureId, Vec<NonZeroUsize>> = BTreeMap::new();
        for value in &self.values {
            if value.id.feature() != value.feature_id {
                findings.push(Finding::ValueFeatureMismatch {
                    value: value.id,
                    feature_id: value.feature_id,
                });
            }
            if self.feature(value.id.feature()).is_none() {
                findings.push(Finding::OrphanValue(value.id));
            }
            indices
                .entry(value.id.feature())
                .or_default()
                .push(value.id.index());
        }
        for (feature, indices) in indices {
            findings.extend(index_problems(indices).into_iter().map(|problem| match problem {
                IndexProblem::Gap(missing) => Finding::ValueIndexGap { feature, missing },
                IndexProblem::Duplicate(index) => {
                    Finding::DuplicateValueId(ValueId::new(feature, index))
                }
            }));
        }

        for (position, later) in self.values.iter().enumerate() {
            for earlier in self.values[..position]
                .iter()
                .filter(|v| v.id.feature() == later.id.feature())
            {
                for (a, b) in [(&earlier.en, &later.en), (&earlier.ru, &later.ru)] {
                    if same_name(a, b) {
                        findings.push(Finding::DuplicateValueName {
                            first: earlier.id,
                            second: later.id,
                            name: b.clone(),
                        });
                    }
                }
            }
        }
    }

    fn audit_profile(&self, profile: &Profile, findings: &mut Vec<Finding>) {
        let doculect = || profile.doculect.clone();

        let mut seen = BTreeSet::new();
        for entry in &profile.entries {
            let feature = entry.feature_id;
            if !seen.insert(feature) {
                findings.push(Finding::DuplicateEntry {
                    doculect: doculect(),
                    feature,
                });
            }
            let Some(record) = self.feature(feature) else {
                findings.push(Finding::UnknownEntry {
                    doculect: doculect(),
                    feature,
                });
                continue;
            };

            if entry.feature_name_ru != record.ru {
                findings.push(Finding::StaleFeatureName {
                    doculect: doculect(),
                    feature,
                    found: entry.feature_name_ru.clone(),
                });
            }

            if entry.value_type != ValueType::Listed {
                if !entry.value_id.is_empty() {
                    findings.push(Finding::ValueOnNonListed {
                        doculect: doculect(),
                        feature,
                        value_type: entry.value_type,
                    });
                }
                continue;
            }

            if entry.value_id.is_empty() {
                findings.push(Finding::ListedWithoutValue {
                    doculect: doculect(),
                    feature,
                });
                continue;
            }
            for value in entry.value_id.iter() {
                if value.feature() != feature {
                    findings.push(Finding::ForeignValue {
                        doculect: doculect(),
                        feature,
                        value,
                    });
                } else if self.value(value).is_none() {
                    findings.push(Finding::UnknownValue {
                        doculect: doculect(),
                        value,
                    });
                }
            }

            let ids = entry.value_id.len();
            if record.is_multiselect {
                let names = entry.value_names().len();
                if names != ids {
                    findings.push(Finding::UnpairedNames {
                        doculect: doculect(),
                        feature,
                        ids,
                        names,
                    });
                }
            } else if ids > 1 {
                findings.push(Finding::TooManyValues {
                    doculect: doculect(),
                    feature,
                    count: ids,
                });
            }
        }

        for record in &self.features {
            if !seen.contains(&record.id) {
                findings.push(Finding::MissingEntry {
                    doculect: doculect(),
                    feature: record.id,
                });
            }
        }

        for fired in triggered_in(profile, &self.rules) {
            let Some(entry) = profile.entry(fired.dependent) else {
                continue;
            };
            if !matches!(
                entry.value_type,
                ValueType::NotStated | ValueType::NotApplicable
            ) {
                findings.push(Finding::NotApplicableConflict(NotApplicableConflict {
                    doculect: doculect(),
                    controlling: fired.controlling,
                    trigger: fired.trigger,
                    dependent: fired.dependent,
                    value_type: entry.value_type,
                }));
            }
        }
    }
}

enum IndexProblem {
    Gap(usize),
    Duplicate(NonZeroUsize),
}

/// Gaps in and repeats of `1..=max` among `indices`.
fn index_problems(mut indices: Vec<NonZeroUsize>) -> Vec<IndexProblem> {
    indices.sort_unstable();
    let mut problems = Vec::new();
    let mut expected = 1;
    let mut previous = None;
    for index in indices {
        if previous == Some(index) {
            problems.push(IndexProblem::Duplicate(index));
            continue;
        }
        problems.extend((expected..index.get()).map(IndexProblem::Gap));
        expected = index.get() + 1;
        previous = Some(index);
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::fixtures::{entry, sample};

    fn fid(id: &str) -> FeatureId {
        id.parse().unwrap()
    }

    fn vid(id: &str) -> ValueId {
        id.parse().unwrap()
    }

    fn without_conflicts(findings: Vec<Finding>) -> Vec<Finding> {
        findings
            .into_iter()
            .filter(|f| !matches!(f, Finding::NotApplicableConflict(_)))
            .collect()
    }

    #[test]
    fn sample_only_has_not_applicable_conflicts() {
        let findings = sample().audit();
        let dependents: Vec<(String, FeatureId)> = findings
            .iter()
            .map(|f| match f {
                Finding::NotApplicableConflict(c) => (c.doculect.clone(), c.dependent),
                other => panic!("unexpected finding: {other}"),
            })
            .collect();
        assert_eq!(
            dependents,
            vec![("X".to_string(), fid("A-3")), ("Z".to_string(), fid("B-1"))]
        );
    }

    #[test]
    fn mutations_keep_the_catalog_clean() {
        let mut catalog = sample();
        catalog.remove_feature(fid("A-2")).unwrap();
        catalog.move_value(vid("A-2-4"), 1).unwrap();
        catalog.remove_value(vid("A-2-2")).unwrap();
        assert!(without_conflicts(catalog.audit()).is_empty());
    }

    #[test]
    fn index_gaps_and_duplicates() {
        let mut catalog = sample();
        catalog.features[1].id = fid("A-3");
        catalog.values[1].id = vid("A-1-3");
        catalog.values[2].id = vid("A-2-2");

        let findings = catalog.audit();
        assert!(findings.contains(&Finding::FeatureIndexGap {
            category: CategoryId::new('A').unwrap(),
            missing: 2
        }));
        assert!(findings.contains(&Finding::DuplicateFeatureId(fid("A-3"))));
        assert!(findings.contains(&Finding::ValueIndexGap {
            feature: fid("A-1"),
            missing: 2
        }));
        assert!(findings.contains(&Finding::DuplicateValueId(vid("A-2-2"))));
        assert!(findings.contains(&Finding::ValueIndexGap {
            feature: fid("A-2"),
            missing: 1
        }));
    }

    #[test]
    fn profile_rows_are_checked_against_inventories() {
        use ValueType::{Custom, Listed};

        let mut catalog = sample();
        catalog.profiles[1].entries = vec![
            entry("A-1", "место ударения", Listed, "A-1-9", "?"),
            entry("A-2", "число гласных (old)", Custom, "A-2-1", "две"),
            entry("A-3", "качества гласных", Listed, "A-3-1&A-3-2", "один"),
            entry("A-3", "качества гласных", Listed, "", ""),
            entry("C-1", "?", Listed, "B-1-1", "SOV"),
        ];

        let findings = catalog.audit();
        let y = || "Y".to_string();
        for expected in [
            Finding::UnknownValue {
                doculect: y(),
                value: vid("A-1-9"),
            },
            Finding::StaleFeatureName {
                doculect: y(),
                feature: fid("A-2"),
                found: "число гласных (old)".to_string(),
            },
            Finding::ValueOnNonListed {
                doculect: y(),
                feature: fid("A-2"),
                value_type: Custom,
            },
            Finding::UnpairedNames {
                doculect: y(),
                feature: fid("A-3"),
                ids: 2,
                names: 1,
            },
            Finding::DuplicateEntry {
                doculect: y(),
                feature: fid("A-3"),
            },
            Finding::ListedWithoutValue {
                doculect: y(),
                feature: fid("A-3"),
            },
            Finding::UnknownEntry {
                doculect: y(),
                feature: fid("C-1"),
            },
            Finding::MissingEntry {
                doculect: y(),
                feature: fid("B-1"),
            },
        ] {
            assert!(findings.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn single_select_rows_name_one_value() {
        let mut catalog = sample();
        catalog.profiles[0].entries[1] = entry(
            "A-2",
            "число гласных",
            ValueType::Listed,
            "A-2-1&A-1-1",
            "две&фиксированное",
        );
        let findings = without_conflicts(catalog.audit());
        assert_eq!(
            findings,
            vec![
                Finding::ForeignValue {
                    doculect: "X".to_string(),
                    feature: fid("A-2"),
                    value: vid("A-1-1"),
                },
                Finding::TooManyValues {
                    doculect: "X".to_string(),
                    feature: fid("A-2"),
                    count: 2,
                },
            ]
        );
    }

    #[test]
    fn duplicate_names_are_case_insensitive() {
        let mut catalog = sample();
        catalog.features[3].en = "Stress Position".to_string();
        catalog.values[1].ru = "Фиксированное".to_string();

        let findings = without_conflicts(catalog.audit());
        assert_eq!(
            findings,
            vec![
                Finding::DuplicateFeatureName {
                    first: fid("A-1"),
                    second: fid("B-1"),
                    name: "Stress Position".to_string(),
                },
                Finding::DuplicateValueName {
                    first: vid("A-1-1"),
                    second: vid("A-1-2"),
                    name: "Фиксированное".to_string(),
                },
            ]
        );
    }

    #[test]
    fn rule_problems_are_reported() {
        let mut catalog = sample();
        catalog.remove_value(vid("A-1-2")).unwrap();
        catalog.rules = crate::domain::rules::NotApplicableRules::from_yaml(
            "A-2:\n  trigger: A-1-1\n  features_to_get_not_applicable: [A-9]\n",
        )
        .unwrap();
        let findings = without_conflicts(catalog.audit());
        assert!(findings.contains(&Finding::Rule(RuleProblem::ForeignTrigger {
            controlling: fid("A-2"),
            trigger: vid("A-1-1"),
        })));
        assert!(findings.contains(&Finding::Rule(RuleProblem::UnknownFeature(fid("A-9")))));
    }
}
