//! Structural validation overlay.
//!
//! Issues produced here are merged additively, keyed by page, into the same
//! result structure ordinary field validation writes to. End users cannot
//! tell a structural `minCount` error from a business rule; developer-facing
//! defects (claim conflicts, dangling references) never land here, they stay
//! in the structural problem list.

pub mod group;
pub mod visibility;

use std::collections::BTreeMap;

/// Shape of a field as described by the data model schema, with array
/// indices abstracted away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    ArrayOfObjects,
    ArrayOfScalars,
    Object,
    Scalar,
}

/// Host-supplied schema knowledge: field shapes per data type. Keys are
/// index-free field paths (`Orders.items`, not `Orders.items[2]`).
#[derive(Debug, Clone, Default)]
pub struct DataModelSchema {
    fields: BTreeMap<String, SchemaType>,
}

impl DataModelSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, data_type: &str, field: &str, shape: SchemaType) {
        self.fields.insert(format!("{data_type}.{field}"), shape);
    }

    /// Shape of `field` in `data_type`; indices in the path are stripped
    /// before lookup. `None` when the schema does not cover the field.
    pub fn type_of(&self, data_type: &str, field: &str) -> Option<SchemaType> {
        let stripped = strip_indices(field);
        self.fields.get(&format!("{data_type}.{stripped}")).copied()
    }
}

fn strip_indices(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut in_index = false;
    for c in field.chars() {
        match c {
            '[' => in_index = true,
            ']' => in_index = false,
            _ if !in_index => out.push(c),
            _ => {}
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCategory {
    /// Behaves like a missing required field: hidden until the user has
    /// interacted with the form.
    RequiredLike,
    /// Layout misconfiguration, surfaced through the normal message channel.
    Structural,
    /// Derived from the data model schema by field validation.
    Schema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub component_id: String,
    /// `"dataType.field"` the issue is about, when it concerns a binding.
    pub binding: Option<String>,
    pub category: IssueCategory,
    pub code: String,
    pub message: String,
}

/// Validation results keyed by page. Merging is additive; nothing here ever
/// removes issues another producer wrote, with the single documented
/// exception of `minItems` suppression (see [`group`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutput {
    pub by_page: BTreeMap<String, Vec<ValidationIssue>>,
}

impl ValidationOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, page: &str, issue: ValidationIssue) {
        self.by_page.entry(page.to_owned()).or_default().push(issue);
    }

    pub fn merge(&mut self, other: ValidationOutput) {
        for (page, issues) in other.by_page {
            self.by_page.entry(page).or_default().extend(issues);
        }
    }

    pub fn page(&self, page: &str) -> &[ValidationIssue] {
        self.by_page.get(page).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lookup_ignores_indices() {
        let mut schema = DataModelSchema::new();
        schema.insert("Model", "Teams.members", SchemaType::ArrayOfObjects);
        assert_eq!(
            schema.type_of("Model", "Teams[0].members"),
            Some(SchemaType::ArrayOfObjects)
        );
        assert_eq!(schema.type_of("Model", "Teams[0].other"), None);
    }

    #[test]
    fn merge_is_additive_per_page() {
        let issue = |code: &str| ValidationIssue {
            component_id: "g".into(),
            binding: None,
            category: IssueCategory::Schema,
            code: code.into(),
            message: String::new(),
        };
        let mut a = ValidationOutput::new();
        a.add("form", issue("one"));
        let mut b = ValidationOutput::new();
        b.add("form", issue("two"));
        b.add("other", issue("three"));

        a.merge(b);
        assert_eq!(a.page("form").len(), 2);
        assert_eq!(a.page("other").len(), 1);
    }
}
