//! Rule Grove: an ordered, pure-data composition of RuleTree descriptors.
//! Not executed by the core — see spec §4.H.

use std::collections::BTreeSet;

/// A lightweight descriptor of a RuleTree, as composed into a [`RuleGrove`].
/// This is metadata about a tree, not the tree itself — the Grove never
/// touches a [`crate::ruletree::RuleTree`] or runs an [`crate::evaluator::Evaluator`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleTreeDescriptor {
    pub name: String,
    pub min_cost: u64,
    pub max_cost: u64,
    pub required_attributes: BTreeSet<String>,
}

impl RuleTreeDescriptor {
    pub fn new(name: impl Into<String>, min_cost: u64, max_cost: u64) -> Self {
        RuleTreeDescriptor {
            name: name.into(),
            min_cost,
            max_cost,
            required_attributes: BTreeSet::new(),
        }
    }

    pub fn with_required_attributes(mut self, attrs: impl IntoIterator<Item = String>) -> Self {
        self.required_attributes.extend(attrs);
        self
    }
}

/// An ordered list of [`RuleTreeDescriptor`]s with aggregated cost and
/// attribute metadata.
#[derive(Debug, Clone, Default)]
pub struct RuleGrove {
    trees: Vec<RuleTreeDescriptor>,
}

impl RuleGrove {
    pub fn new() -> Self {
        RuleGrove::default()
    }

    pub fn add(&mut self, descriptor: RuleTreeDescriptor) {
        self.trees.push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn total_min_cost(&self) -> u64 {
        self.trees.iter().map(|t| t.min_cost).sum()
    }

    pub fn total_max_cost(&self) -> u64 {
        self.trees.iter().map(|t| t.max_cost).sum()
    }

    /// Union, over every descriptor, of required attribute names.
    pub fn required_attributes(&self) -> BTreeSet<String> {
        self.trees
            .iter()
            .flat_map(|t| t.required_attributes.iter().cloned())
            .collect()
    }

    /// The descriptor with the highest `max_cost`, if the grove is non-empty.
    pub fn heaviest_tree(&self) -> Option<&RuleTreeDescriptor> {
        self.trees.iter().max_by_key(|t| t.max_cost)
    }

    /// The descriptor with the lowest `min_cost`, if the grove is non-empty.
    pub fn lightest_tree(&self) -> Option<&RuleTreeDescriptor> {
        self.trees.iter().min_by_key(|t| t.min_cost)
    }
}
