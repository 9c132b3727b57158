//! Property-based tests (spec.md §8): determinism for fixed inputs, and
//! severity monotonicity (any severe rule outcome forces overall severity
//! to `Severe`).

use std::collections::HashMap;

use proptest::prelude::*;

use ruletree_engine::ruletree::operator::{CompareOp, Operator, Polarity, TargetRecord};
use ruletree_engine::ruletree::Rule;
use ruletree_engine::source::SourceRegistry;
use ruletree_engine::{
    Attribute, AttributeCatalog, AttributeKind, Evaluator, Operand, OverallSeverity, Product, RuleMode, RuleSet,
    RuleTreeBuilder, Severity,
};

fn attr(name: &str, kind: AttributeKind) -> Attribute {
    Attribute::new(name, name, "g", kind)
}

fn catalog() -> AttributeCatalog {
    AttributeCatalog::from_attributes(vec![
        attr("Name", AttributeKind::String),
        attr("Age", AttributeKind::Integer),
    ])
    .unwrap()
}

fn build_tree(severity: Severity, threshold: &str) -> (ruletree_engine::RuleTree, HashMap<String, Box<dyn ruletree_engine::Source>>) {
    let mut builder = RuleTreeBuilder::new();
    let root = builder.add_ruleset(
        RuleSet::new("root", "root", RuleMode::And, severity)
            .with_rule(Rule::new("name", "Name", TargetRecord::New, Polarity::Normal, Operator::Populated))
            .with_rule(Rule::new(
                "age",
                "Age",
                TargetRecord::New,
                Polarity::Normal,
                Operator::Compare { op: CompareOp::Ge, rhs: Operand::Literal(threshold.to_string()) },
            )),
    );
    builder.set_root(root);
    builder.finish().unwrap()
}

fn make_product(name: &str, age: &str) -> Product {
    let mut product = Product::new();
    product.set(&attr("Name", AttributeKind::String), name);
    product.set(&attr("Age", AttributeKind::Integer), age);
    product
}

proptest! {
    /// Determinism: two `validate` calls against the identical
    /// `(tree, incoming)` pair, with no Sources involved, yield Reports
    /// equal under `==` — same verdict, same counters, same failure list.
    #[test]
    fn determinism_for_fixed_inputs(name in "[A-Za-z]{0,8}", age in 0i64..120, threshold in 0i64..120) {
        let (tree, ops) = build_tree(Severity::Warning, &threshold.to_string());
        let mut sources = SourceRegistry::new();
        sources.bind_operators(ops);
        let mut evaluator = Evaluator::new(tree, catalog(), sources, None, None).unwrap();

        let product = make_product(&name, &age.to_string());
        let first = evaluator.validate(product.clone()).unwrap();
        let second = evaluator.validate(product).unwrap();

        prop_assert_eq!(first, second);
    }

    /// Severity monotonicity: whenever the RuleSet's declared severity is
    /// `Severe` and at least one rule fails, the overall Report severity is
    /// `Severe` — never silently downgraded to `Warning`.
    #[test]
    fn severity_monotonicity_holds(name in "[A-Za-z]{0,8}", age in 0i64..17, threshold in 18i64..120) {
        let (tree, ops) = build_tree(Severity::Severe, &threshold.to_string());
        let mut sources = SourceRegistry::new();
        sources.bind_operators(ops);
        let mut evaluator = Evaluator::new(tree, catalog(), sources, None, None).unwrap();

        // Age is always below threshold here, so the `age` rule always fails.
        let product = make_product(&name, &age.to_string());
        let report = evaluator.validate(product).unwrap();

        prop_assert!(!report.verdict());
        prop_assert_eq!(report.overall_severity, OverallSeverity::Severe);
    }

    /// A numeric-parse failure is always reported `Severe` regardless of the
    /// RuleSet's own declared severity.
    #[test]
    fn parse_failure_forces_severe_regardless_of_ruleset_severity(garbage in "[!@#$%^&*]{1,6}") {
        let (tree, ops) = build_tree(Severity::Warning, "18");
        let mut sources = SourceRegistry::new();
        sources.bind_operators(ops);
        let mut evaluator = Evaluator::new(tree, catalog(), sources, None, None).unwrap();

        let product = make_product("Ada", &garbage);
        let report = evaluator.validate(product).unwrap();

        prop_assert_eq!(report.overall_severity, OverallSeverity::Severe);
    }
}
