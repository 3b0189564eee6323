//! Repeating-group constraints.
//!
//! Two checks per repeating group: the `group` binding must be an
//! array-of-objects according to the schema, and a configured `minCount`
//! must be met by the visible (non-hidden) rows. A `minCount` shortfall also
//! suppresses the schema's generic `minItems` issue for the same binding, so
//! the user is not told twice.

use crate::hierarchy::node::{NodeChildren, ResolvedPages};
use crate::validation::{
    DataModelSchema, IssueCategory, SchemaType, ValidationIssue, ValidationOutput,
};

pub const CODE_INVALID_GROUP_BINDING: &str = "invalidGroupBinding";
pub const CODE_MIN_COUNT: &str = "minCount";
pub const CODE_MIN_ITEMS: &str = "minItems";

/// Validates every repeating group in the resolved tree, appending issues to
/// `out` (which may already hold schema/field validation results).
pub fn validate_repeating_groups(
    pages: &ResolvedPages,
    schema: &DataModelSchema,
    out: &mut ValidationOutput,
) {
    for (page_key, page) in &pages.pages {
        for top in &page.top {
            top.visit(&mut |node| {
                let NodeChildren::Rows(rows) = &node.children else {
                    return;
                };
                let Some(binding) = node.item.group_binding() else {
                    return;
                };
                let binding_key = format!("{}.{}", binding.data_type, binding.field);

                match schema.type_of(&binding.data_type, &binding.field) {
                    None | Some(SchemaType::ArrayOfObjects) => {}
                    Some(_) => {
                        out.add(page_key, ValidationIssue {
                            component_id: node.item.id.clone(),
                            binding: Some(binding_key.clone()),
                            category: IssueCategory::Structural,
                            code: CODE_INVALID_GROUP_BINDING.to_owned(),
                            message: format!(
                                "the group binding '{binding_key}' must point to an array of objects"
                            ),
                        });
                    }
                }

                let Some(min_count) = node.item.min_count else {
                    return;
                };
                let visible = rows
                    .iter()
                    .filter(|row| {
                        !row.group_expressions
                            .as_ref()
                            .is_some_and(|gx| gx.hidden_row)
                    })
                    .count();
                if visible < min_count as usize {
                    out.add(page_key, ValidationIssue {
                        component_id: node.item.id.clone(),
                        binding: Some(binding_key.clone()),
                        category: IssueCategory::RequiredLike,
                        code: CODE_MIN_COUNT.to_owned(),
                        message: format!("a minimum of {min_count} rows is required"),
                    });
                    suppress_min_items(out, page_key, &binding_key);
                }
            });
        }
    }
}

/// Drops the schema-derived `minItems` issue for one binding on one page.
/// Only called when a `minCount` issue covers the same shortfall.
fn suppress_min_items(out: &mut ValidationOutput, page_key: &str, binding_key: &str) {
    if let Some(issues) = out.by_page.get_mut(page_key) {
        issues.retain(|issue| {
            !(issue.category == IssueCategory::Schema
                && issue.code == CODE_MIN_ITEMS
                && issue.binding.as_deref() == Some(binding_key))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::model::LayoutSetDef;
    use crate::layout::registry::ComponentRegistry;
    use crate::resolve::pipeline::resolve_layout_set;
    use crate::resolve::sources::{DataSources, FormData};
    use serde_json::json;

    fn resolved(min_count: u32, rows: serde_json::Value) -> ResolvedPages {
        let layouts: LayoutSetDef = serde_json::from_value(json!({ "pages": { "form": [
            { "id": "people", "type": "Group", "maxCount": 5, "minCount": min_count,
              "dataModelBindings": { "group": { "dataType": "Model", "field": "Persons" } },
              "hiddenRow": ["equals", ["dataModel", "Persons.role"], "hidden"],
              "children": ["who"] },
            { "id": "who", "type": "Input",
              "dataModelBindings": {
                  "simpleBinding": { "dataType": "Model", "field": "Persons.name" } } },
        ]}}))
        .unwrap();
        let registry = ComponentRegistry::standard();
        let mut fd = FormData::new();
        fd.insert_model("Model", json!({ "Persons": rows }));
        fd.ensure_row_ids();
        let sources = DataSources::new(&fd, &fd, "Model");
        resolve_layout_set(&layouts, "form", &registry, &sources, None)
            .unwrap()
            .pages
    }

    fn schema() -> DataModelSchema {
        let mut schema = DataModelSchema::new();
        schema.insert("Model", "Persons", SchemaType::ArrayOfObjects);
        schema
    }

    #[test]
    fn min_count_shortfall_counts_only_visible_rows() {
        let pages = resolved(
            2,
            json!([{ "name": "Ada" }, { "name": "Brendan", "role": "hidden" }]),
        );

        let mut out = ValidationOutput::new();
        validate_repeating_groups(&pages, &schema(), &mut out);

        let issues = out.page("form");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, CODE_MIN_COUNT);
        assert_eq!(issues[0].category, IssueCategory::RequiredLike);
    }

    #[test]
    fn min_count_satisfied_produces_nothing() {
        let pages = resolved(2, json!([{ "name": "Ada" }, { "name": "Brendan" }]));
        let mut out = ValidationOutput::new();
        validate_repeating_groups(&pages, &schema(), &mut out);
        assert!(out.page("form").is_empty());
    }

    #[test]
    fn schema_min_items_is_suppressed_by_min_count() {
        let pages = resolved(2, json!([{ "name": "Ada" }]));

        let mut out = ValidationOutput::new();
        out.add("form", ValidationIssue {
            component_id: "people".into(),
            binding: Some("Model.Persons".into()),
            category: IssueCategory::Schema,
            code: CODE_MIN_ITEMS.into(),
            message: "too few items".into(),
        });
        out.add("form", ValidationIssue {
            component_id: "who".into(),
            binding: Some("Model.Persons.name".into()),
            category: IssueCategory::Schema,
            code: "required".into(),
            message: "field required".into(),
        });

        validate_repeating_groups(&pages, &schema(), &mut out);

        let codes: Vec<&str> = out.page("form").iter().map(|i| i.code.as_str()).collect();
        assert!(codes.contains(&CODE_MIN_COUNT));
        assert!(!codes.contains(&CODE_MIN_ITEMS));
        // Unrelated issues survive.
        assert!(codes.contains(&"required"));
    }

    #[test]
    fn non_array_group_binding_is_structural() {
        let pages = resolved(0, json!([]));
        let mut schema = DataModelSchema::new();
        schema.insert("Model", "Persons", SchemaType::Scalar);

        let mut out = ValidationOutput::new();
        validate_repeating_groups(&pages, &schema, &mut out);

        let issues = out.page("form");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, CODE_INVALID_GROUP_BINDING);
        assert_eq!(issues[0].category, IssueCategory::Structural);
    }
}
