//! Attribute Catalog: metadata for every attribute a RuleTree can reference.
//!
//! Process-lifetime, read-only once built. An [`AttributeCatalog`] may be
//! shared across evaluators (see spec §5) since it never mutates after
//! construction finishes.

use std::collections::HashMap;

use crate::error::EngineError;

/// Logical kind of an attribute's value. Drives comparison semantics in
/// [`crate::ruletree::operator::Operator::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Integer,
    Decimal,
    Date,
    Enum,
}

/// Immutable metadata for one attribute.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    pub attr_id: String,
    pub attr_name: String,
    pub group_id: String,
    pub kind: AttributeKind,
    pub max_length: Option<usize>,
    pub nullable: bool,
    pub is_key: bool,
}

impl Attribute {
    pub fn new(
        attr_id: impl Into<String>,
        attr_name: impl Into<String>,
        group_id: impl Into<String>,
        kind: AttributeKind,
    ) -> Self {
        Attribute {
            attr_id: attr_id.into(),
            attr_name: attr_name.into(),
            group_id: group_id.into(),
            kind,
            max_length: None,
            nullable: true,
            is_key: false,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_key(mut self, is_key: bool) -> Self {
        self.is_key = is_key;
        self
    }
}

/// A single record produced by the caller-supplied metadata contract: the
/// full attribute list plus the subset that are keys. See spec §6.1.
pub trait MetadataSource {
    /// Produce every attribute known to the system.
    fn attributes(&self) -> Vec<Attribute>;
}

/// name/id → [`Attribute`] lookup, plus the ordered list of key attributes.
#[derive(Debug, Clone, Default)]
pub struct AttributeCatalog {
    by_name: HashMap<String, Attribute>,
    by_id: HashMap<String, Attribute>,
    keys: Vec<Attribute>,
}

impl AttributeCatalog {
    /// Build a catalog from a caller-supplied metadata contract.
    ///
    /// Fails with [`EngineError::Metadata`] if two attributes share a name or
    /// id.
    pub fn build(source: &dyn MetadataSource) -> Result<Self, EngineError> {
        let mut catalog = AttributeCatalog::default();
        for attr in source.attributes() {
            catalog.insert(attr)?;
        }
        Ok(catalog)
    }

    /// Build a catalog directly from an attribute list (used by tests and by
    /// callers who already have the list in hand).
    pub fn from_attributes(attrs: impl IntoIterator<Item = Attribute>) -> Result<Self, EngineError> {
        let mut catalog = AttributeCatalog::default();
        for attr in attrs {
            catalog.insert(attr)?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, attr: Attribute) -> Result<(), EngineError> {
        if self.by_name.contains_key(&attr.attr_name) {
            return Err(EngineError::metadata(format!(
                "duplicate attribute name '{}'",
                attr.attr_name
            )));
        }
        if self.by_id.contains_key(&attr.attr_id) {
            return Err(EngineError::metadata(format!(
                "duplicate attribute id '{}'",
                attr.attr_id
            )));
        }
        if attr.is_key {
            self.keys.push(attr.clone());
        }
        self.by_name.insert(attr.attr_name.clone(), attr.clone());
        self.by_id.insert(attr.attr_id.clone(), attr);
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Attribute, EngineError> {
        self.by_name
            .get(name)
            .ok_or_else(|| EngineError::metadata(format!("unknown attribute name '{name}'")))
    }

    pub fn get_by_id(&self, id: &str) -> Result<&Attribute, EngineError> {
        self.by_id
            .get(id)
            .ok_or_else(|| EngineError::metadata(format!("unknown attribute id '{id}'")))
    }

    /// Key attributes, in the order they were registered.
    pub fn keys(&self) -> &[Attribute] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
