//! Source Registry: caller-supplied value producers used to assemble the
//! "current" record and to implement custom operators. See spec §4.C / §6.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::product::Product;

/// A caller-supplied value producer. Carries opaque configuration the caller
/// owns (endpoint, credentials, ...) plus a retrieval operation.
///
/// Kept as a typed capability (a trait object) rather than an erased
/// `Fn` closure, per Design Note 9: the two call shapes (attribute
/// retrieval, custom-operator invocation) are different enough that a single
/// generic closure type would obscure which one is in play.
pub trait Source: std::fmt::Debug {
    /// Retrieve a single attribute's value for "current record" assembly.
    ///
    /// `attr_name` is the attribute this source is bound to in the
    /// [`SourceRegistry`]'s attribute map.
    fn retrieve_attribute(&self, attr_name: &str) -> Result<String, EngineError>;

    /// Invoke this source as a named custom operator with up to four
    /// stringified operands. Returns the raw result string; the evaluator
    /// interprets `"1"`/`"true"` as pass, `"0"`/`"false"` as fail, anything
    /// else as a severe rule failure.
    fn invoke_operator(&self, operands: &[String]) -> Result<String, EngineError>;
}

/// Two registries kept separately, per spec §4.C: attribute name → Source,
/// and custom-operator name → Source.
#[derive(Default)]
pub struct SourceRegistry {
    attributes: HashMap<String, Box<dyn Source>>,
    operators: HashMap<String, Box<dyn Source>>,
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field("operators", &self.operators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SourceRegistry {
    pub fn new() -> Self {
        SourceRegistry::default()
    }

    /// Bind a Source to an attribute name for "current record" assembly.
    pub fn bind_attribute(&mut self, attr_name: impl Into<String>, source: Box<dyn Source>) {
        self.attributes.insert(attr_name.into(), source);
    }

    /// Bind a Source to a custom-operator name.
    pub fn bind_operator(&mut self, op_name: impl Into<String>, source: Box<dyn Source>) {
        self.operators.insert(op_name.into(), source);
    }

    pub fn has_operator(&self, op_name: &str) -> bool {
        self.operators.contains_key(op_name)
    }

    /// Merge in custom-operator bindings collected by a
    /// [`crate::ruletree::RuleTreeBuilder`] while it parsed a tree.
    pub fn bind_operators(&mut self, ops: HashMap<String, Box<dyn Source>>) {
        self.operators.extend(ops);
    }

    pub fn has_attribute_source(&self, attr_name: &str) -> bool {
        self.attributes.contains_key(attr_name)
    }

    /// Resolve a single attribute's value via its bound Source. Used to
    /// resolve `Operand::SourceCallout` during rule evaluation.
    pub fn retrieve_attribute(&self, attr_name: &str) -> Result<String, EngineError> {
        let source = self.attributes.get(attr_name).ok_or_else(|| {
            EngineError::source(format!("no Source bound for attribute '{attr_name}'"))
        })?;
        source.retrieve_attribute(attr_name)
    }

    /// Invoke the named custom operator with up to four operand strings.
    pub fn invoke_operator(&self, op_name: &str, operands: &[String]) -> Result<String, EngineError> {
        let source = self
            .operators
            .get(op_name)
            .ok_or_else(|| EngineError::metadata(format!("unbound custom operator '{op_name}'")))?;
        source.invoke_operator(operands)
    }

    /// Assemble the "current" record: invoke every bound attribute Source and
    /// write its result into `product`. Ordering is unspecified; retrievals
    /// must be independent. Aborts on the first failure.
    pub fn assemble_current(&self, into: &mut Product, group_of: impl Fn(&str) -> Option<(String, String)>) -> Result<(), EngineError> {
        for (attr_name, source) in &self.attributes {
            let value = source.retrieve_attribute(attr_name)?;
            if let Some((group_id, attr_id)) = group_of(attr_name) {
                into.set_row(&group_id, 0, &attr_id, value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct StubSource {
        value: String,
    }

    impl Source for StubSource {
        fn retrieve_attribute(&self, _attr_name: &str) -> Result<String, EngineError> {
            Ok(self.value.clone())
        }

        fn invoke_operator(&self, _operands: &[String]) -> Result<String, EngineError> {
            Ok(self.value.clone())
        }
    }

    #[test]
    fn unbound_operator_is_metadata_error() {
        let registry = SourceRegistry::new();
        let err = registry.invoke_operator("LookupActive", &[]).unwrap_err();
        assert!(matches!(err, EngineError::Metadata(_)));
    }

    #[test]
    fn bound_operator_invokes_source() {
        let mut registry = SourceRegistry::new();
        registry.bind_operator(
            "LookupActive",
            Box::new(StubSource { value: "true".into() }),
        );

        let result = registry.invoke_operator("LookupActive", &["42".into()]).unwrap();
        assert_eq!(result, "true");
    }

    #[test]
    fn assemble_current_writes_attribute_values() {
        let mut registry = SourceRegistry::new();
        registry.bind_attribute("Status", Box::new(StubSource { value: "active".into() }));

        let mut product = Product::new();
        registry
            .assemble_current(&mut product, |name| {
                (name == "Status").then(|| ("g1".to_string(), "attr_status".to_string()))
            })
            .unwrap();

        assert_eq!(product.get("g1", 0, "attr_status"), Some("active"));
    }
}
