//! RuleTree Model: an arena of RuleSets with a distinguished root, built by an
//! external parser and handed to the [`crate::evaluator::Evaluator`] fully
//! constructed. See spec §3 / §4.D.
//!
//! Per Design Note 9, the tree is a downward-only arena: children are stored
//! as indices into the arena and traversal threads the parent through the
//! call stack rather than via parent pointers. An arena index can only
//! reference a RuleSet created earlier in the same builder session, which
//! rules out cycles by construction.

pub mod operator;

use std::collections::HashMap;

use crate::error::EngineError;
use crate::source::Source;
use operator::{Operand, Operator, Polarity, TargetRecord};

/// Index into a [`RuleTree`]'s arena. The inner `usize` is private: the only
/// way to obtain a `RuleSetId` from outside this module is as the return
/// value of [`RuleTreeBuilder::add_ruleset`], which always mints one for a
/// RuleSet already pushed into the arena. That, in turn, is what makes the
/// "a child id always refers to an earlier arena slot" invariant hold — a
/// caller can never forge a `RuleSetId` for a RuleSet that does not exist
/// yet, so a child reference can never point forward into a not-yet-built
/// node and close a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RuleSetId(usize);

/// How a RuleSet's child verdicts (rules, then child RuleSets) combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RuleMode {
    /// All rules must pass.
    And,
    /// At least one rule must pass.
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Warning,
    Severe,
}

/// What a failed RuleSet prescribes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum OnFailureAction {
    /// Emit the RuleSet's error message only.
    EmitMessage,
    /// Assign `value` to `target_attr` of `NEW`.
    Assign { target_attr: String, value: Operand },
    /// Invoke a named custom operator (its return value is not consulted;
    /// the action is fire-and-forget remediation).
    CustomOperator { name: String, operands: Vec<Operand> },
    /// Skip the parent's remaining unvisited children. Not propagated above
    /// the parent unless the parent's own `on_failure` also halts.
    HaltSiblings,
}

/// A single predicate or mutation over an attribute of `NEW` or `CURRENT`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Rule {
    pub id: String,
    pub target_attr: String,
    pub target_record: TargetRecord,
    pub polarity: Polarity,
    pub operator: Operator,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        target_attr: impl Into<String>,
        target_record: TargetRecord,
        polarity: Polarity,
        operator: Operator,
    ) -> Self {
        Rule {
            id: id.into(),
            target_attr: target_attr.into(),
            target_record,
            polarity,
            operator,
        }
    }

    /// Every custom-operator name this rule touches — from its own operator
    /// or, transitively, none (on-failure custom ops live on the RuleSet).
    fn custom_operator_names(&self) -> Vec<&str> {
        match &self.operator {
            Operator::Custom { name, .. } => vec![name.as_str()],
            _ => Vec::new(),
        }
    }

    /// Every attribute name this rule references: its own target plus any
    /// `AttributeRef`/`SourceCallout` operands.
    fn referenced_attribute_names(&self) -> Vec<&str> {
        let mut names = vec![self.target_attr.as_str()];
        let operand_names = |operand: &Operand| -> Option<&str> {
            match operand {
                Operand::AttributeRef(name) | Operand::SourceCallout(name) => Some(name.as_str()),
                Operand::Literal(_) => None,
            }
        };
        match &self.operator {
            Operator::Populated | Operator::InSet { .. } => {}
            Operator::Compare { rhs, .. } => names.extend(operand_names(rhs)),
            Operator::Range { lo, hi } => {
                names.extend(operand_names(lo));
                names.extend(operand_names(hi));
            }
            Operator::Arith { expr } => {
                names.extend(operand_names(&expr.first));
                for (_, operand) in &expr.rest {
                    names.extend(operand_names(operand));
                }
            }
            Operator::Assign { value } => names.extend(operand_names(value)),
            Operator::Custom { operands, .. } => {
                for operand in operands {
                    names.extend(operand_names(operand));
                }
            }
        }
        names
    }
}

/// A node combining Rules and child RuleSets by `mode`, with an on-failure
/// action and severity.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RuleSet {
    pub id: String,
    pub description: String,
    pub children: Vec<RuleSetId>,
    pub rules: Vec<Rule>,
    pub mode: RuleMode,
    pub severity: Severity,
    pub error_message: Option<String>,
    pub on_failure: Option<OnFailureAction>,
}

impl RuleSet {
    pub fn new(id: impl Into<String>, description: impl Into<String>, mode: RuleMode, severity: Severity) -> Self {
        RuleSet {
            id: id.into(),
            description: description.into(),
            children: Vec::new(),
            rules: Vec::new(),
            mode,
            severity,
            error_message: None,
            on_failure: None,
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_child(mut self, child: RuleSetId) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_on_failure(mut self, action: OnFailureAction) -> Self {
        self.on_failure = Some(action);
        self
    }
}

/// An immutable RuleSet arena with a distinguished root. Read-only traversal
/// only — construction happens through [`RuleTreeBuilder`].
#[derive(Debug, Clone)]
pub struct RuleTree {
    arena: Vec<RuleSet>,
    root: RuleSetId,
}

impl RuleTree {
    pub fn root(&self) -> RuleSetId {
        self.root
    }

    pub fn ruleset(&self, id: RuleSetId) -> &RuleSet {
        &self.arena[id.0]
    }

    pub fn children(&self, id: RuleSetId) -> &[RuleSetId] {
        &self.ruleset(id).children
    }

    pub fn rules(&self, id: RuleSetId) -> &[Rule] {
        &self.ruleset(id).rules
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Every attribute name referenced anywhere in the tree, deduplicated.
    pub fn referenced_attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .arena
            .iter()
            .flat_map(|rs| rs.rules.iter().flat_map(Rule::referenced_attribute_names))
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Every custom-operator name referenced anywhere in the tree
    /// (Rule-level `Custom` operators and RuleSet-level `on_failure`
    /// custom-operator actions), deduplicated.
    pub fn referenced_custom_operator_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for ruleset in &self.arena {
            for rule in &ruleset.rules {
                names.extend(rule.custom_operator_names().into_iter().map(str::to_string));
            }
            if let Some(OnFailureAction::CustomOperator { name, .. }) = &ruleset.on_failure {
                names.push(name.clone());
            }
        }
        names.sort();
        names.dedup();
        names
    }
}

/// The single mutation surface the parser uses to build a [`RuleTree`], per
/// spec §4.D. Also owns the custom-operator half of the Source Registry,
/// since binding a custom-operator name is the one other mutation the parser
/// performs while constructing a tree.
#[derive(Default)]
pub struct RuleTreeBuilder {
    arena: Vec<RuleSet>,
    root: Option<RuleSetId>,
    operators: HashMap<String, Box<dyn Source>>,
}

impl RuleTreeBuilder {
    pub fn new() -> Self {
        RuleTreeBuilder::default()
    }

    /// Add a RuleSet to the arena and return its id. Any `children` it
    /// references must already exist (a strictly lower arena index) since
    /// `RuleSetId`'s inner index is private and the only way to mint one is
    /// as this method's return value — a cycle is structurally impossible.
    pub fn add_ruleset(&mut self, ruleset: RuleSet) -> RuleSetId {
        let id = RuleSetId(self.arena.len());
        self.arena.push(ruleset);
        id
    }

    pub fn set_root(&mut self, root: RuleSetId) {
        self.root = Some(root);
    }

    /// The one mutation point the parser uses to bind a custom-operator name
    /// to a Source.
    pub fn register_custom_operator(&mut self, name: impl Into<String>, source: Box<dyn Source>) {
        self.operators.insert(name.into(), source);
    }

    /// Freeze the builder into an immutable [`RuleTree`] plus the
    /// custom-operator bindings collected along the way. Fails with
    /// [`EngineError::Metadata`] if no root was set, if a child id is out of
    /// range, or if a rule references a custom operator that was never
    /// bound.
    pub fn finish(self) -> Result<(RuleTree, HashMap<String, Box<dyn Source>>), EngineError> {
        let root = self
            .root
            .ok_or_else(|| EngineError::metadata("RuleTree has no root RuleSet"))?;
        if root.0 >= self.arena.len() {
            return Err(EngineError::metadata("root RuleSet id out of range"));
        }
        for ruleset in &self.arena {
            for child in &ruleset.children {
                if child.0 >= self.arena.len() {
                    return Err(EngineError::metadata(format!(
                        "RuleSet '{}' references out-of-range child id {}",
                        ruleset.id, child.0
                    )));
                }
            }
        }

        let tree = RuleTree { arena: self.arena, root };
        for name in tree.referenced_custom_operator_names() {
            if !self.operators.contains_key(&name) {
                return Err(EngineError::metadata(format!(
                    "custom operator '{name}' used but never bound via register_custom_operator"
                )));
            }
        }
        Ok((tree, self.operators))
    }
}
