//! # RuleTree Engine
//!
//! A declarative business rules engine: evaluates a hierarchy of rules (a
//! `RuleTree`) against a structured record (a `Product`), producing a
//! structured report of what passed, what failed, and why.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Caller-supplied metadata
//!     ↓
//! [Attribute Catalog]             → attribute metadata, key attributes
//!     ↓
//! [RuleTreeBuilder]                → RuleTree (arena of RuleSets)
//!     ↓
//! [Evaluator::new]                 → wired Evaluator (tree + catalog + sources + gate)
//!     ↓
//! Evaluator::validate(Product)
//!     ├── extract keys via Catalog
//!     ├── check Transaction-State Gate
//!     ├── obtain CURRENT record (retrieval contract or Source Registry)
//!     ├── depth-first walk of the RuleTree, mutating NEW as rules run
//!     └── clear the Gate (always, even on error)
//!     ↓
//! RuleTreeReport
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ruletree_engine::attribute::{Attribute, AttributeCatalog, AttributeKind};
//! use ruletree_engine::evaluator::Evaluator;
//! use ruletree_engine::product::Product;
//! use ruletree_engine::ruletree::operator::{Operator, Polarity, TargetRecord};
//! use ruletree_engine::ruletree::{Rule, RuleMode, RuleSet, RuleTreeBuilder, Severity};
//! use ruletree_engine::source::SourceRegistry;
//!
//! let catalog = AttributeCatalog::from_attributes(vec![
//!     Attribute::new("a1", "Name", "g1", AttributeKind::String).with_key(true),
//! ])?;
//!
//! let mut builder = RuleTreeBuilder::new();
//! let root = builder.add_ruleset(
//!     RuleSet::new("root", "Name must be present", RuleMode::And, Severity::Severe)
//!         .with_rule(Rule::new("r1", "Name", TargetRecord::New, Polarity::Normal, Operator::Populated)),
//! );
//! builder.set_root(root);
//! let (tree, operator_sources) = builder.finish()?;
//!
//! let mut sources = SourceRegistry::new();
//! sources.bind_operators(operator_sources);
//!
//! let mut evaluator = Evaluator::new(tree, catalog, sources, None, None)?;
//! let mut product = Product::new();
//! product.set(&Attribute::new("a1", "Name", "g1", AttributeKind::String), "Ada");
//! let report = evaluator.validate(product)?;
//! assert!(report.verdict());
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `error` | The flat `EngineError` enum shared across the crate |
//! | `attribute` | Attribute Catalog: metadata for every attribute a RuleTree can reference |
//! | `product` | The mutable `Product` record (`NEW`/`CURRENT`) rules read and write |
//! | `source` | Source Registry: caller-supplied value producers and custom operators |
//! | `ruletree` | The RuleTree model (RuleSets, Rules, operators) and its builder |
//! | `evaluator` | The Evaluator: runs `validate`, the depth-first tree walk |
//! | `report` | The immutable `RuleTreeReport` produced by `validate` |
//! | `gate` | The Transaction-State Gate, a weighted-owner confirmation predicate |
//! | `grove` | Rule Grove: pure-data composition of multiple RuleTree descriptors |
//! | `config` | Layered `EngineConfig` (truncation policy, gate rounding, logging) |

pub mod attribute;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod gate;
pub mod grove;
pub mod product;
pub mod report;
pub mod ruletree;
pub mod source;

pub use attribute::{Attribute, AttributeCatalog, AttributeKind, MetadataSource};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use evaluator::{Evaluator, RecordRetrieval};
pub use gate::TransactionGate;
pub use grove::{RuleGrove, RuleTreeDescriptor};
pub use product::Product;
pub use report::{OverallSeverity, ReportCounters, RuleFailureDetail, RuleOutcome, RuleSetReport, RuleTreeReport};
pub use ruletree::operator::{ArithExpr, ArithOp, CompareOp, Operand, Operator, Polarity, TargetRecord};
pub use ruletree::{OnFailureAction, Rule, RuleMode, RuleSet, RuleSetId, RuleTree, RuleTreeBuilder, Severity};
pub use source::{Source, SourceRegistry};
