//! Evaluator hot-path benchmarks: scales the RuleTree's rule count and
//! nesting depth to see how `validate` costs grow. Benchmarking the
//! evaluation path is an ambient concern carried from the teacher's
//! `benches/query_benchmarks.rs`, independent of this engine not scheduling
//! or parallelizing work itself.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use ruletree_engine::ruletree::operator::{CompareOp, Operator, Polarity, TargetRecord};
use ruletree_engine::ruletree::Rule;
use ruletree_engine::source::SourceRegistry;
use ruletree_engine::{Attribute, AttributeCatalog, AttributeKind, Evaluator, Operand, Product, RuleMode, RuleSet, RuleTreeBuilder, Severity};

fn attr(name: &str) -> Attribute {
    Attribute::new(name, name, "g", AttributeKind::Integer)
}

/// A single flat RuleSet with `n` independent comparison rules, all `AND`.
fn flat_evaluator(n: usize) -> (Evaluator, Product) {
    let attrs: Vec<Attribute> = (0..n).map(|i| attr(&format!("Field{i}"))).collect();
    let catalog = AttributeCatalog::from_attributes(attrs.clone()).unwrap();

    let mut builder = RuleTreeBuilder::new();
    let mut root = RuleSet::new("root", "root", RuleMode::And, Severity::Warning);
    for i in 0..n {
        root = root.with_rule(Rule::new(
            format!("r{i}"),
            format!("Field{i}"),
            TargetRecord::New,
            Polarity::Normal,
            Operator::Compare { op: CompareOp::Ge, rhs: Operand::Literal("0".into()) },
        ));
    }
    let root_id = builder.add_ruleset(root);
    builder.set_root(root_id);
    let (tree, ops) = builder.finish().unwrap();

    let mut sources = SourceRegistry::new();
    sources.bind_operators(ops);
    let evaluator = Evaluator::new(tree, catalog, sources, None, None).unwrap();

    let mut product = Product::new();
    for a in &attrs {
        product.set(a, "42");
    }
    (evaluator, product)
}

/// A chain of `depth` nested single-rule RuleSets, exercising the recursive
/// depth-first walk rather than rule-count fan-out.
fn nested_evaluator(depth: usize) -> (Evaluator, Product) {
    let catalog = AttributeCatalog::from_attributes(vec![attr("Value")]).unwrap();

    let mut builder = RuleTreeBuilder::new();
    let mut current = builder.add_ruleset(
        RuleSet::new("leaf", "leaf", RuleMode::And, Severity::Warning).with_rule(Rule::new(
            "r",
            "Value",
            TargetRecord::New,
            Polarity::Normal,
            Operator::Compare { op: CompareOp::Ge, rhs: Operand::Literal("0".into()) },
        )),
    );
    for i in 0..depth {
        current = builder.add_ruleset(
            RuleSet::new(format!("level{i}"), "level", RuleMode::And, Severity::Warning).with_child(current),
        );
    }
    builder.set_root(current);
    let (tree, ops) = builder.finish().unwrap();

    let mut sources = SourceRegistry::new();
    sources.bind_operators(ops);
    let evaluator = Evaluator::new(tree, catalog, sources, None, None).unwrap();

    let mut product = Product::new();
    product.set(&attr("Value"), "42");
    (evaluator, product)
}

fn bench_flat_ruleset(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_ruleset");
    for size in [10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let (mut evaluator, product) = flat_evaluator(size);
            b.iter(|| evaluator.validate(product.clone()).unwrap());
        });
    }
    group.finish();
}

fn bench_nested_rulesets(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_rulesets");
    for depth in [10usize, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let (mut evaluator, product) = nested_evaluator(depth);
            b.iter(|| evaluator.validate(product.clone()).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flat_ruleset, bench_nested_rulesets);
criterion_main!(benches);
