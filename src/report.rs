//! Report Model: the immutable structured output of one `validate` call. See
//! spec §3 / §4.F.

use crate::ruletree::Severity;

/// One Rule's recorded outcome within a RuleSet report. Per the
/// completeness property, every non-pruned Rule in the tree contributes
/// exactly one of these to its RuleSet's `rule_outcomes`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub passed: bool,
    /// Present only when `passed` is `false`.
    pub failure: Option<RuleFailureDetail>,
}

/// `(ruleset_id, rule_id, target_attr_name, observed_value, expected_description)`
/// plus the operator name and the severity this particular failure carries.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleFailureDetail {
    pub ruleset_id: String,
    pub rule_id: String,
    pub target_attr_name: String,
    pub observed_value: String,
    pub expected_description: String,
    pub operator_name: String,
    pub severity: Severity,
}

/// One RuleSet's recorded outcome.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleSetReport {
    pub ruleset_id: String,
    pub description: String,
    pub passed: bool,
    pub severity: Severity,
    pub error_message: Option<String>,
    pub rule_outcomes: Vec<RuleOutcome>,
    /// `true` if this RuleSet's own `on_failure` was `HaltSiblings`.
    pub halted_siblings: bool,
}

/// Overall severity rolled up across every recorded failure (spec §4.E
/// "Severity" / §8 "Severity monotonicity").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum OverallSeverity {
    Clean,
    Warning,
    Severe,
}

/// Aggregate counters accumulated over the whole tree walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReportCounters {
    pub rules_evaluated: usize,
    pub rules_failed: usize,
    pub rulesets_evaluated: usize,
    pub rulesets_failed: usize,
}

/// The full, immutable result of one `validate` call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleTreeReport {
    pub overall_severity: OverallSeverity,
    /// RuleSet reports in the exact pre-order DFS traversal order used during
    /// the walk (spec §11: determinism without a separate sort step).
    pub ruleset_reports: Vec<RuleSetReport>,
    pub counters: ReportCounters,
}

impl RuleTreeReport {
    pub fn verdict(&self) -> bool {
        self.ruleset_reports.first().map_or(true, |root| root.passed)
    }

    /// Every failed rule across every RuleSet, in traversal order.
    pub fn failures(&self) -> Vec<&RuleFailureDetail> {
        self.ruleset_reports
            .iter()
            .flat_map(|rs| rs.rule_outcomes.iter())
            .filter_map(|outcome| outcome.failure.as_ref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_reflects_root_ruleset() {
        let report = RuleTreeReport {
            overall_severity: OverallSeverity::Clean,
            ruleset_reports: vec![RuleSetReport {
                ruleset_id: "root".into(),
                description: "root".into(),
                passed: true,
                severity: Severity::Warning,
                error_message: None,
                rule_outcomes: vec![],
                halted_siblings: false,
            }],
            counters: ReportCounters::default(),
        };
        assert!(report.verdict());
    }

    #[test]
    fn failures_collects_across_rulesets() {
        let failure = RuleFailureDetail {
            ruleset_id: "root".into(),
            rule_id: "r1".into(),
            target_attr_name: "Name".into(),
            observed_value: "".into(),
            expected_description: "populated".into(),
            operator_name: "Populated".into(),
            severity: Severity::Warning,
        };
        let report = RuleTreeReport {
            overall_severity: OverallSeverity::Warning,
            ruleset_reports: vec![RuleSetReport {
                ruleset_id: "root".into(),
                description: "root".into(),
                passed: false,
                severity: Severity::Warning,
                error_message: None,
                rule_outcomes: vec![RuleOutcome {
                    rule_id: "r1".into(),
                    passed: false,
                    failure: Some(failure.clone()),
                }],
                halted_siblings: false,
            }],
            counters: ReportCounters { rules_evaluated: 1, rules_failed: 1, rulesets_evaluated: 1, rulesets_failed: 1 },
        };
        assert_eq!(report.failures(), vec![&failure]);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = RuleTreeReport {
            overall_severity: OverallSeverity::Clean,
            ruleset_reports: vec![],
            counters: ReportCounters::default(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"overall_severity\""));
    }
}
