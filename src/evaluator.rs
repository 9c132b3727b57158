//! The Evaluator (Mediator): ties the Attribute Catalog, Product, Source
//! Registry, RuleTree, and Transaction-State Gate together into one
//! `validate` call, producing a [`RuleTreeReport`]. See spec §4.E.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, info, trace, warn};

use crate::attribute::{AttributeCatalog, AttributeKind};
use crate::error::EngineError;
use crate::gate::TransactionGate;
use crate::product::Product;
use crate::report::{OverallSeverity, ReportCounters, RuleFailureDetail, RuleOutcome, RuleSetReport, RuleTreeReport};
use crate::ruletree::operator::{ArithExpr, ArithOp, CompareOp, Operand, Operator, TargetRecord};
use crate::ruletree::{OnFailureAction, RuleMode, RuleSetId, RuleTree, Severity};
use crate::source::SourceRegistry;

/// Caller-supplied contract for obtaining the "current" record keyed by a
/// RuleTree's key attributes. See spec §4.E "Obtain current record".
pub trait RecordRetrieval: std::fmt::Debug {
    fn retrieve(&self, keys: &HashMap<String, String>) -> Result<Product, EngineError>;
}

/// Runs one RuleTree against Products. Not `Sync` by design — the
/// Transaction-State Gate it may own is per-evaluator mutable state and must
/// not be shared across threads without external synchronization (spec §5).
pub struct Evaluator {
    tree: RuleTree,
    catalog: AttributeCatalog,
    sources: SourceRegistry,
    gate: Option<TransactionGate>,
    retrieval: Option<Box<dyn RecordRetrieval>>,
}

impl Evaluator {
    /// Wires up a RuleTree with the catalog and sources it needs.
    ///
    /// Fails with [`EngineError::Metadata`] if any attribute or custom
    /// operator the tree references does not resolve.
    pub fn new(
        tree: RuleTree,
        catalog: AttributeCatalog,
        sources: SourceRegistry,
        gate: Option<TransactionGate>,
        retrieval: Option<Box<dyn RecordRetrieval>>,
    ) -> Result<Self, EngineError> {
        for name in tree.referenced_attribute_names() {
            catalog.get_by_name(&name)?;
        }
        for name in tree.referenced_custom_operator_names() {
            if !sources.has_operator(&name) {
                return Err(EngineError::metadata(format!(
                    "custom operator '{name}' referenced by the tree but not bound in the Source Registry"
                )));
            }
        }
        Ok(Evaluator { tree, catalog, sources, gate, retrieval })
    }

    /// Evaluate `incoming` against the wired RuleTree, producing a report.
    ///
    /// The Transaction-State Gate, if present, is always cleared (every
    /// owner's confirmation reset) before this returns — on success, on a
    /// rule failure, and on a fatal [`EngineError`] alike (spec §8 "Gate
    /// clear").
    pub fn validate(&mut self, incoming: Product) -> Result<RuleTreeReport, EngineError> {
        let result = self.validate_inner(incoming);
        if let Some(gate) = &mut self.gate {
            gate.revoke_all();
        }
        result
    }

    fn validate_inner(&mut self, mut new: Product) -> Result<RuleTreeReport, EngineError> {
        info!("validate: starting");

        let mut keys = HashMap::new();
        for key_attr in self.catalog.keys() {
            let value = new
                .get_attr(key_attr)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    EngineError::input(format!(
                        "missing required key attribute '{}'",
                        key_attr.attr_name
                    ))
                })?;
            keys.insert(key_attr.attr_name.clone(), value.to_string());
        }

        if let Some(gate) = &self.gate {
            if !gate.is_confirmed() {
                warn!("validate: Transaction-State Gate not confirmed");
                return Err(EngineError::permission(
                    "Transaction-State Gate is not confirmed",
                ));
            }
        }

        let current = self.obtain_current(&keys)?;

        let mut reports = Vec::new();
        let mut counters = ReportCounters::default();
        self.evaluate_ruleset(self.tree.root(), &mut new, &current, &mut reports, &mut counters)?;

        let overall_severity = reports.iter().fold(OverallSeverity::Clean, |acc, rs| {
            let ruleset_level = if rs.passed {
                OverallSeverity::Clean
            } else {
                match rs.severity {
                    Severity::Warning => OverallSeverity::Warning,
                    Severity::Severe => OverallSeverity::Severe,
                }
            };
            // A rule-level failure can carry a severity harsher than its own
            // RuleSet's declared severity (e.g. `force_severe` on a parse
            // error), so the rollup has to look past the RuleSet's verdict.
            let rule_level = rs.rule_outcomes.iter().filter_map(|o| o.failure.as_ref()).map(|f| match f.severity {
                Severity::Warning => OverallSeverity::Warning,
                Severity::Severe => OverallSeverity::Severe,
            });
            rule_level.fold(acc.max(ruleset_level), |acc, s| acc.max(s))
        });

        info!(overall_severity = ?overall_severity, "validate: finished");
        Ok(RuleTreeReport { overall_severity, ruleset_reports: reports, counters })
    }

    fn obtain_current(&self, keys: &HashMap<String, String>) -> Result<Product, EngineError> {
        if let Some(retrieval) = &self.retrieval {
            return retrieval.retrieve(keys);
        }
        let mut current = Product::new();
        let orchestration_mode = self
            .tree
            .referenced_attribute_names()
            .iter()
            .any(|name| self.sources.has_attribute_source(name));
        if orchestration_mode {
            self.sources.assemble_current(&mut current, |name| {
                self.catalog
                    .get_by_name(name)
                    .ok()
                    .map(|attr| (attr.group_id.clone(), attr.attr_id.clone()))
            })?;
        }
        Ok(current)
    }

    /// Depth-first, pre-order walk: a RuleSet's own report entry is pushed
    /// before any of its children's, which is what makes traversal order
    /// double as the report's ordering (spec §11 "Report ordering").
    ///
    /// Returns `(passed, halt_siblings)`: the latter tells the caller (this
    /// RuleSet's parent) whether to stop visiting this RuleSet's remaining
    /// siblings.
    fn evaluate_ruleset(
        &self,
        id: RuleSetId,
        new: &mut Product,
        current: &Product,
        reports: &mut Vec<RuleSetReport>,
        counters: &mut ReportCounters,
    ) -> Result<(bool, bool), EngineError> {
        let ruleset = self.tree.ruleset(id);
        debug!(ruleset = %ruleset.id, mode = ?ruleset.mode, "evaluating ruleset");

        let mut rule_outcomes = Vec::with_capacity(ruleset.rules.len());
        for rule in &ruleset.rules {
            let outcome = self.evaluate_rule(rule, &ruleset.id, ruleset.severity, new, current)?;
            rule_outcomes.push(outcome);
        }
        counters.rules_evaluated += rule_outcomes.len();
        counters.rules_failed += rule_outcomes.iter().filter(|o| !o.passed).count();

        let rules_passed = match ruleset.mode {
            RuleMode::And => rule_outcomes.iter().all(|o| o.passed),
            // Spec §9(b): an empty rule list under OR fails (there is no rule
            // to satisfy the "at least one" requirement), unlike AND where an
            // empty list vacuously passes.
            RuleMode::Or => !rule_outcomes.is_empty() && rule_outcomes.iter().any(|o| o.passed),
        };

        let self_idx = reports.len();
        reports.push(RuleSetReport {
            ruleset_id: ruleset.id.clone(),
            description: ruleset.description.clone(),
            passed: false,
            severity: ruleset.severity,
            error_message: None,
            rule_outcomes,
            halted_siblings: false,
        });

        let mut children_passed = true;
        for &child_id in self.tree.children(id) {
            let (child_passed, child_halts) =
                self.evaluate_ruleset(child_id, new, current, reports, counters)?;
            if !child_passed {
                children_passed = false;
            }
            if child_halts {
                break;
            }
        }

        let passed = rules_passed && children_passed;
        let mut halted_siblings = false;
        if !passed {
            reports[self_idx].error_message = ruleset.error_message.clone();
            if let Some(action) = &ruleset.on_failure {
                halted_siblings = self.perform_on_failure(action, new, current)?;
            }
            match ruleset.severity {
                Severity::Warning => warn!(ruleset = %ruleset.id, "ruleset failed (warning)"),
                Severity::Severe => warn!(ruleset = %ruleset.id, "ruleset failed (severe)"),
            }
        }
        reports[self_idx].passed = passed;
        reports[self_idx].halted_siblings = halted_siblings;

        counters.rulesets_evaluated += 1;
        if !passed {
            counters.rulesets_failed += 1;
        }

        Ok((passed, halted_siblings))
    }

    /// Runs a failed RuleSet's prescribed remediation. Returns whether the
    /// action was `HaltSiblings`.
    fn perform_on_failure(
        &self,
        action: &OnFailureAction,
        new: &mut Product,
        current: &Product,
    ) -> Result<bool, EngineError> {
        match action {
            OnFailureAction::EmitMessage => Ok(false),
            OnFailureAction::Assign { target_attr, value } => {
                let attr = self.catalog.get_by_name(target_attr)?;
                let resolved = self.resolve_operand(value, new)?;
                new.set(attr, resolved);
                Ok(false)
            }
            OnFailureAction::CustomOperator { name, operands } => {
                let resolved: Vec<String> = operands
                    .iter()
                    .map(|op| self.resolve_operand(op, new))
                    .collect::<Result<_, _>>()?;
                self.sources.invoke_operator(name, &resolved)?;
                Ok(false)
            }
            OnFailureAction::HaltSiblings => Ok(true),
        }
    }

    /// Evaluates a single Rule against the record its `target_record`
    /// selects. Operand resolution and the rule's own observed value both
    /// read from that same record; mutating operators (`Arith`, `Assign`)
    /// always write into `new`, independent of which record was read.
    fn evaluate_rule(
        &self,
        rule: &crate::ruletree::Rule,
        ruleset_id: &str,
        ruleset_severity: Severity,
        new: &mut Product,
        current: &Product,
    ) -> Result<RuleOutcome, EngineError> {
        trace!(rule = %rule.id, attr = %rule.target_attr, "resolving rule");
        let attr = self.catalog.get_by_name(&rule.target_attr)?;
        let observed = {
            let record: &Product = match rule.target_record {
                TargetRecord::New => new,
                TargetRecord::Current => current,
            };
            record.get_attr(attr).unwrap_or("").to_string()
        };

        let outcome = match &rule.operator {
            Operator::Populated => {
                let verdict = rule.polarity.apply(!observed.trim().is_empty());
                self.decide(rule, ruleset_id, ruleset_severity, verdict, observed, "populated".into(), "Populated")
            }
            Operator::Compare { op, rhs } => {
                let record = self.record_for(rule, new, current);
                let rhs_value = self.resolve_operand(rhs, record)?;
                match compare_values(attr.kind, &observed, &rhs_value, *op) {
                    Some(result) => {
                        let verdict = rule.polarity.apply(result);
                        self.decide(
                            rule,
                            ruleset_id,
                            ruleset_severity,
                            verdict,
                            observed,
                            format!("{op:?} {rhs_value}"),
                            "Compare",
                        )
                    }
                    None => self.force_severe(
                        rule,
                        ruleset_id,
                        observed,
                        format!("a value comparable to '{rhs_value}'"),
                        "Compare",
                    ),
                }
            }
            Operator::InSet { values } => {
                let verdict = rule.polarity.apply(values.iter().any(|v| v == &observed));
                self.decide(
                    rule,
                    ruleset_id,
                    ruleset_severity,
                    verdict,
                    observed,
                    format!("one of [{}]", values.join(", ")),
                    "InSet",
                )
            }
            Operator::Range { lo, hi } => {
                let record = self.record_for(rule, new, current);
                let lo_value = self.resolve_operand(lo, record)?;
                let hi_value = self.resolve_operand(hi, record)?;
                match (observed.parse::<f64>(), lo_value.parse::<f64>(), hi_value.parse::<f64>()) {
                    (Ok(v), Ok(lo_n), Ok(hi_n)) => {
                        let verdict = rule.polarity.apply(lo_n <= hi_n && v >= lo_n && v <= hi_n);
                        self.decide(
                            rule,
                            ruleset_id,
                            ruleset_severity,
                            verdict,
                            observed,
                            format!("between {lo_value} and {hi_value}"),
                            "Range",
                        )
                    }
                    _ => self.force_severe(
                        rule,
                        ruleset_id,
                        observed,
                        format!("a number between {lo_value} and {hi_value}"),
                        "Range",
                    ),
                }
            }
            Operator::Arith { expr } => {
                let record = self.record_for(rule, new, current);
                match self.evaluate_arith(expr, record)? {
                    Some(result) => {
                        new.set(attr, result.clone());
                        self.decide(rule, ruleset_id, ruleset_severity, true, observed, result, "Arith")
                    }
                    None => self.force_severe(
                        rule,
                        ruleset_id,
                        observed,
                        "a well-formed arithmetic expression".into(),
                        "Arith",
                    ),
                }
            }
            Operator::Assign { value } => {
                let record = self.record_for(rule, new, current);
                let resolved = self.resolve_operand(value, record)?;
                new.set(attr, resolved.clone());
                self.decide(rule, ruleset_id, ruleset_severity, true, observed, resolved, "Assign")
            }
            Operator::Custom { name, operands } => {
                let record = self.record_for(rule, new, current);
                let resolved: Vec<String> = operands
                    .iter()
                    .map(|op| self.resolve_operand(op, record))
                    .collect::<Result<_, _>>()?;
                let result = self.sources.invoke_operator(name, &resolved)?;
                match result.as_str() {
                    "1" | "true" => self.decide(
                        rule,
                        ruleset_id,
                        ruleset_severity,
                        rule.polarity.apply(true),
                        observed,
                        "true".into(),
                        name,
                    ),
                    "0" | "false" => self.decide(
                        rule,
                        ruleset_id,
                        ruleset_severity,
                        rule.polarity.apply(false),
                        observed,
                        "false".into(),
                        name,
                    ),
                    other => self.force_severe(
                        rule,
                        ruleset_id,
                        observed,
                        format!("a boolean result, got '{other}'"),
                        name,
                    ),
                }
            }
        };

        Ok(outcome)
    }

    fn record_for<'a>(&self, rule: &crate::ruletree::Rule, new: &'a Product, current: &'a Product) -> &'a Product {
        match rule.target_record {
            TargetRecord::New => new,
            TargetRecord::Current => current,
        }
    }

    fn decide(
        &self,
        rule: &crate::ruletree::Rule,
        ruleset_id: &str,
        severity: Severity,
        passed: bool,
        observed: String,
        expected_description: String,
        operator_name: &str,
    ) -> RuleOutcome {
        if passed {
            return RuleOutcome { rule_id: rule.id.clone(), passed: true, failure: None };
        }
        RuleOutcome {
            rule_id: rule.id.clone(),
            passed: false,
            failure: Some(RuleFailureDetail {
                ruleset_id: ruleset_id.to_string(),
                rule_id: rule.id.clone(),
                target_attr_name: rule.target_attr.clone(),
                observed_value: observed,
                expected_description,
                operator_name: operator_name.to_string(),
                severity,
            }),
        }
    }

    /// A rule failure that is always severe regardless of its RuleSet's
    /// severity: a parse/comparability breakdown is a different class of
    /// problem than an ordinary predicate miss.
    fn force_severe(
        &self,
        rule: &crate::ruletree::Rule,
        ruleset_id: &str,
        observed: String,
        expected_description: String,
        operator_name: &str,
    ) -> RuleOutcome {
        self.decide(rule, ruleset_id, Severity::Severe, false, observed, expected_description, operator_name)
    }

    fn resolve_operand(&self, operand: &Operand, record: &Product) -> Result<String, EngineError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::AttributeRef(name) => {
                let attr = self.catalog.get_by_name(name)?;
                Ok(record.get_attr(attr).unwrap_or("").to_string())
            }
            Operand::SourceCallout(name) => self.sources.retrieve_attribute(name),
        }
    }

    /// `None` on a parse failure or division by zero — a severe rule
    /// failure, not a fatal error. `Some` wraps the formatted decimal
    /// result.
    fn evaluate_arith(&self, expr: &ArithExpr, record: &Product) -> Result<Option<String>, EngineError> {
        let first = self.resolve_operand(&expr.first, record)?;
        let Ok(mut acc) = first.parse::<f64>() else {
            return Ok(None);
        };
        for (op, operand) in &expr.rest {
            let resolved = self.resolve_operand(operand, record)?;
            let Ok(value) = resolved.parse::<f64>() else {
                return Ok(None);
            };
            acc = match op {
                ArithOp::Add => acc + value,
                ArithOp::Sub => acc - value,
                ArithOp::Mul => acc * value,
                ArithOp::Div => {
                    if value == 0.0 {
                        return Ok(None);
                    }
                    acc / value
                }
            };
        }
        Ok(Some(format_decimal(acc)))
    }
}

/// Numeric (Integer/Decimal) or lexical (String/Date/Enum) ordering per
/// attribute kind. Dates are expected in a lexically-ordered format
/// (e.g. `YYYYMMDD`), so lexical comparison is chronologically correct.
fn compare_values(kind: AttributeKind, lhs: &str, rhs: &str, op: CompareOp) -> Option<bool> {
    let ordering = match kind {
        AttributeKind::Integer | AttributeKind::Decimal => {
            let l: f64 = lhs.parse().ok()?;
            let r: f64 = rhs.parse().ok()?;
            l.partial_cmp(&r)?
        }
        AttributeKind::String | AttributeKind::Date | AttributeKind::Enum => lhs.cmp(rhs),
    };
    Some(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    })
}

fn format_decimal(value: f64) -> String {
    let mut formatted = format!("{value:.6}");
    if formatted.contains('.') {
        while formatted.ends_with('0') {
            formatted.pop();
        }
        if formatted.ends_with('.') {
            formatted.pop();
        }
    }
    formatted
}
