//! Product / Record Store: a mutable tabular value bag keyed by
//! `(group_id, row_index, attr_id)`. See spec §3 / §4.B.

use std::collections::HashMap;

use crate::attribute::Attribute;

/// One row: `attr_id → string value`.
pub type Row = HashMap<String, String>;

/// A mapping `group_id → ordered list of rows`. All values are carried as
/// strings; numeric/date semantics live in Rules that consume them.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Product {
    groups: HashMap<String, Vec<Row>>,
}

impl Product {
    pub fn new() -> Self {
        Product::default()
    }

    /// Write `value` into row 0 of `attr`'s group, creating the group and row
    /// 0 on demand. Truncates at `attr.max_length` when present; truncation
    /// is silent here — callers enforce stricter policy via Rules (see
    /// `EngineConfig` for a logged variant).
    pub fn set(&mut self, attr: &Attribute, value: impl Into<String>) {
        let mut value = value.into();
        if let Some(max_len) = attr.max_length {
            if value.len() > max_len {
                value.truncate(max_len);
            }
        }
        let rows = self.groups.entry(attr.group_id.clone()).or_default();
        if rows.is_empty() {
            rows.push(Row::new());
        }
        rows[0].insert(attr.attr_id.clone(), value);
    }

    /// Write `value` into a specific row, creating the group and any rows up
    /// to and including `row` on demand.
    pub fn set_row(&mut self, group_id: &str, row: usize, attr_id: &str, value: impl Into<String>) {
        let rows = self.groups.entry(group_id.to_string()).or_default();
        while rows.len() <= row {
            rows.push(Row::new());
        }
        rows[row].insert(attr_id.to_string(), value.into());
    }

    /// Read `group`, `row`, `attr` — `None` if any component is absent.
    pub fn get(&self, group_id: &str, row: usize, attr_id: &str) -> Option<&str> {
        self.groups
            .get(group_id)?
            .get(row)?
            .get(attr_id)
            .map(String::as_str)
    }

    /// Convenience: read row 0's value for an attribute.
    pub fn get_attr(&self, attr: &Attribute) -> Option<&str> {
        self.get(&attr.group_id, 0, &attr.attr_id)
    }

    /// All rows for a group, or an empty slice if the group does not exist.
    pub fn group(&self, group_id: &str) -> &[Row] {
        self.groups.get(group_id).map_or(&[], |rows| rows.as_slice())
    }

    pub fn row_count(&self, group_id: &str) -> usize {
        self.groups.get(group_id).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKind;

    fn attr(id: &str, group: &str) -> Attribute {
        Attribute::new(id, id, group, AttributeKind::String)
    }

    #[test]
    fn set_creates_group_and_row_zero() {
        let mut product = Product::new();
        let name = attr("Name", "g1");
        product.set(&name, "Ada");

        assert_eq!(product.get("g1", 0, "Name"), Some("Ada"));
        assert_eq!(product.row_count("g1"), 1);
    }

    #[test]
    fn set_overwrites_duplicate_writes() {
        let mut product = Product::new();
        let name = attr("Name", "g1");
        product.set(&name, "Ada");
        product.set(&name, "Grace");

        assert_eq!(product.get("g1", 0, "Name"), Some("Grace"));
    }

    #[test]
    fn set_truncates_at_max_length() {
        let mut product = Product::new();
        let name = attr("Name", "g1").with_max_length(3);
        product.set(&name, "Abcdef");

        assert_eq!(product.get("g1", 0, "Name"), Some("Abc"));
    }

    #[test]
    fn missing_group_or_row_is_none() {
        let product = Product::new();
        assert_eq!(product.get("missing", 0, "x"), None);
        assert_eq!(product.row_count("missing"), 0);
        assert!(product.group("missing").is_empty());
    }

    #[test]
    fn set_row_extends_rows_on_demand() {
        let mut product = Product::new();
        product.set_row("g1", 2, "attr", "value");

        assert_eq!(product.row_count("g1"), 3);
        assert_eq!(product.get("g1", 2, "attr"), Some("value"));
        assert_eq!(product.get("g1", 0, "attr"), None);
    }
}
