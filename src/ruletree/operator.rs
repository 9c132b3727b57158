//! Operators and operands. A tagged variant per rule kind (spec Design Note
//! 9), dispatched in one place by the evaluator — no virtual dispatch on the
//! hot path.

/// Which record a Rule reads from / writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TargetRecord {
    New,
    Current,
}

/// Whether a Rule's boolean verdict is inverted after the operator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Polarity {
    Normal,
    Negated,
}

impl Polarity {
    pub fn apply(self, verdict: bool) -> bool {
        match self {
            Polarity::Normal => verdict,
            Polarity::Negated => !verdict,
        }
    }
}

/// A value to be resolved before an operator runs: a literal, a reference to
/// another attribute, or a Source callout.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Operand {
    Literal(String),
    /// Resolved by reading row 0 of the named attribute's group from the
    /// Rule's target record (`NEW` or `CURRENT`).
    AttributeRef(String),
    /// Resolved by invoking the named attribute's Source in the Source
    /// Registry's attribute map.
    SourceCallout(String),
}

/// Comparison operators. Numeric or lexical per the target attribute's kind
/// (spec §4.E "Operator semantics").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// One step of a left-to-right arithmetic expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// `first (op operand)*`, evaluated strictly left-to-right with no operator
/// precedence (spec §4.E: "left-to-right evaluation of + - * /").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArithExpr {
    pub first: Operand,
    pub rest: Vec<(ArithOp, Operand)>,
}

impl ArithExpr {
    pub fn new(first: Operand) -> Self {
        ArithExpr { first, rest: Vec::new() }
    }

    pub fn then(mut self, op: ArithOp, operand: Operand) -> Self {
        self.rest.push((op, operand));
        self
    }
}

/// The operator carried by a Rule, tagged with exactly the operands it needs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Operator {
    /// True iff the resolved target attribute's string is non-empty after
    /// trimming.
    Populated,
    Compare { op: CompareOp, rhs: Operand },
    /// Exact, case-sensitive string equality against each literal.
    InSet { values: Vec<String> },
    /// Numeric inclusive `[lo, hi]`; false if `lo > hi`.
    Range { lo: Operand, hi: Operand },
    /// Arithmetic-assignment: evaluate `expr` and write the result into the
    /// Rule's target attribute of `NEW`. Always "passes".
    Arith { expr: ArithExpr },
    /// Assignment: set the Rule's target attribute of `NEW` to a resolved
    /// value. Always "passes".
    Assign { value: Operand },
    /// Dispatch by name to a named Source, passing up to four stringified
    /// operands.
    Custom { name: String, operands: Vec<Operand> },
}

impl Operator {
    /// Arithmetic-assignment and assignment always "pass"; their effect is a
    /// mutation rather than a predicate (spec §4.E step 1).
    pub fn is_mutation(&self) -> bool {
        matches!(self, Operator::Arith { .. } | Operator::Assign { .. })
    }
}
