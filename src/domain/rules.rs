//! Not-applicable dependency rules.
//!
//! The side-file maps each controlling feature to a trigger value and the
//! features that become `not_applicable` once that trigger is selected:
//!
//! ```yaml
//! A-9:
//!   trigger: A-9-2
//!   features_to_get_not_applicable:
//!     - A-6
//!     - A-7
//! ```

use std::{collections::BTreeMap, fmt};

use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graphmap::DiGraphMap,
};
use serde::{Deserialize, Serialize};

use crate::domain::{
    id::{FeatureId, ValueId},
    renumber::Renumbering,
};

/// The rule attached to one controlling feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// The value of the controlling feature that triggers the rule.
    pub trigger: ValueId,
    /// Features switched from `not_stated` to `not_applicable`.
    pub features_to_get_not_applicable: Vec<FeatureId>,
}

/// All rules, keyed by controlling feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotApplicableRules(BTreeMap<FeatureId, Rule>);

impl NotApplicableRules {
    /// Parses the YAML side-file. Blank input yields no rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or holds malformed ids.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Serializes the rules back to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// The rule controlled by `feature`, if any.
    #[must_use]
    pub fn get(&self, feature: FeatureId) -> Option<&Rule> {
        self.0.get(&feature)
    }

    /// Iterates over `(controlling feature, rule)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &Rule)> {
        self.0.iter().map(|(id, rule)| (*id, rule))
    }

    /// Whether there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rewrites every id under a renumbering. Returns whether anything changed.
    pub(crate) fn renumber(&mut self, renumbering: &Renumbering) -> bool {
        let renumbered: BTreeMap<FeatureId, Rule> = self
            .0
            .iter()
            .map(|(controlling, rule)| {
                let rule = Rule {
                    trigger: renumbering.value_id(rule.trigger),
                    features_to_get_not_applicable: rule
                        .features_to_get_not_applicable
                        .iter()
                        .map(|id| renumbering.feature_id(*id))
                        .collect(),
                };
                (renumbering.feature_id(*controlling), rule)
            })
            .collect();
        let changed = renumbered != self.0;
        self.0 = renumbered;
        changed
    }

    /// Drops every reference to a removed feature. Returns whether anything
    /// changed.
    pub(crate) fn forget_feature(&mut self, feature: FeatureId) -> bool {
        let before = self.0.clone();
        self.0.remove(&feature);
        for rule in self.0.values_mut() {
            rule.features_to_get_not_applicable.retain(|id| *id != feature);
        }
        self.0
            .retain(|_, rule| !rule.features_to_get_not_applicable.is_empty());
        before != self.0
    }

    /// Drops every rule triggered by a removed value. Returns whether anything
    /// changed.
    pub(crate) fn forget_trigger(&mut self, value: ValueId) -> bool {
        let before = self.0.len();
        self.0.retain(|_, rule| rule.trigger != value);
        before != self.0.len()
    }

    /// Rewrites trigger ids with `f`. Returns whether anything changed.
    pub(crate) fn map_triggers(&mut self, mut f: impl FnMut(ValueId) -> ValueId) -> bool {
        let mut changed = false;
        for rule in self.0.values_mut() {
            let mapped = f(rule.trigger);
            changed |= mapped != rule.trigger;
            rule.trigger = mapped;
        }
        changed
    }

    /// Checks the rules against the inventories.
    pub fn problems(
        &self,
        feature_exists: impl Fn(FeatureId) -> bool,
        value_exists: impl Fn(ValueId) -> bool,
    ) -> Vec<RuleProblem> {
        let mut problems = Vec::new();
        let mut graph = DiGraphMap::<FeatureId, ()>::new();

        for (controlling, rule) in self.iter() {
            if !feature_exists(controlling) {
                problems.push(RuleProblem::UnknownFeature(controlling));
            }
            if rule.trigger.feature() != controlling {
                problems.push(RuleProblem::ForeignTrigger {
                    controlling,
                    trigger: rule.trigger,
                });
            } else if !value_exists(rule.trigger) {
                problems.push(RuleProblem::UnknownTrigger(rule.trigger));
            }

            graph.add_node(controlling);
            for dependent in &rule.features_to_get_not_applicable {
                if *dependent == controlling {
                    problems.push(RuleProblem::SelfDependent(controlling));
                    continue;
                }
                if !feature_exists(*dependent) {
                    problems.push(RuleProblem::UnknownFeature(*dependent));
                }
                graph.add_edge(controlling, *dependent, ());
            }
        }

        if is_cyclic_directed(&graph) {
            problems.extend(
                tarjan_scc(&graph)
                    .into_iter()
                    .filter(|component| component.len() > 1)
                    .map(|mut component| {
                        component.sort_unstable();
                        RuleProblem::Cycle(component)
                    }),
            );
        }

        problems
    }
}

/// A defect in the rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleProblem {
    /// A rule names a feature that is not in the inventory.
    UnknownFeature(FeatureId),
    /// A trigger that is not in the listed-value inventory.
    UnknownTrigger(ValueId),
    /// A trigger that does not belong to its controlling feature.
    ForeignTrigger {
        /// The controlling feature.
        controlling: FeatureId,
        /// The offending trigger.
        trigger: ValueId,
    },
    /// A feature listed as its own dependent.
    SelfDependent(FeatureId),
    /// Features that can each make the other not applicable.
    Cycle(Vec<FeatureId>),
}

impl fmt::Display for RuleProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFeature(id) => write!(f, "rule references unknown feature {id}"),
            Self::UnknownTrigger(id) => write!(f, "rule trigger {id} is not a listed value"),
            Self::ForeignTrigger {
                controlling,
                trigger,
            } => write!(f, "trigger {trigger} does not belong to {controlling}"),
            Self::SelfDependent(id) => write!(f, "{id} is listed as its own dependent"),
            Self::Cycle(ids) => {
                let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                write!(f, "rules form a cycle through {}", ids.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::domain::renumber::Shift;

    fn feature(id: &str) -> FeatureId {
        id.parse().unwrap()
    }

    fn rules(yaml: &str) -> NotApplicableRules {
        NotApplicableRules::from_yaml(yaml).unwrap()
    }

    const SAMPLE: &str = "\
A-9:
  trigger: A-9-2
  features_to_get_not_applicable:
  - A-6
  - A-7
";

    #[test]
    fn parses_side_file() {
        let rules = rules(SAMPLE);
        let rule = rules.get(feature("A-9")).unwrap();
        assert_eq!(rule.trigger.to_string(), "A-9-2");
        assert_eq!(
            rule.features_to_get_not_applicable,
            vec![feature("A-6"), feature("A-7")]
        );
    }

    #[test]
    fn blank_file_has_no_rules() {
        assert!(rules("  \n").is_empty());
    }

    #[test]
    fn written_rules_read_back() {
        let parsed = rules(SAMPLE);
        assert_eq!(rules(&parsed.to_yaml().unwrap()), parsed);
    }

    #[test]
    fn renumber_rewrites_keys_triggers_and_dependents() {
        let mut rules = rules(SAMPLE);
        let changed = rules.renumber(&Renumbering::Feature {
            category: feature("A-1").category(),
            shift: Shift::Insert(NonZeroUsize::new(7).unwrap()),
        });
        assert!(changed);
        let rule = rules.get(feature("A-10")).unwrap();
        assert_eq!(rule.trigger.to_string(), "A-10-2");
        assert_eq!(
            rule.features_to_get_not_applicable,
            vec![feature("A-6"), feature("A-8")]
        );
    }

    #[test]
    fn forgetting_a_dependent_keeps_the_rule() {
        let mut rules = rules(SAMPLE);
        assert!(rules.forget_feature(feature("A-6")));
        assert_eq!(
            rules
                .get(feature("A-9"))
                .unwrap()
                .features_to_get_not_applicable,
            vec![feature("A-7")]
        );
        assert!(!rules.forget_feature(feature("B-1")));
    }

    #[test]
    fn forgetting_a_trigger_drops_the_rule() {
        let mut rules = rules(SAMPLE);
        assert!(rules.forget_trigger("A-9-2".parse().unwrap()));
        assert!(rules.is_empty());
    }

    #[test]
    fn problems_detect_cycles_and_foreign_triggers() {
        let rules = rules(
            "\
A-1:
  trigger: A-1-1
  features_to_get_not_applicable: [A-2]
A-2:
  trigger: A-3-1
  features_to_get_not_applicable: [A-1]
",
        );
        let problems = rules.problems(|_| true, |_| true);
        assert!(problems.contains(&RuleProblem::ForeignTrigger {
            controlling: feature("A-2"),
            trigger: "A-3-1".parse().unwrap(),
        }));
        assert!(problems.contains(&RuleProblem::Cycle(vec![feature("A-1"), feature("A-2")])));
    }

    #[test]
    fn consistent_rules_have_no_problems() {
        assert!(rules(SAMPLE).problems(|_| true, |_| true).is_empty());
    }
}
