//! Visibility overlay for descendants of repeating groups.
//!
//! A pure predicate composed with whatever other visibility policies the
//! host applies. Besides the explicit `hidden`/`hiddenRow` flags, certain
//! table/edit-mode column configurations imply invisibility without any
//! hidden flag being set. That implication predates this implementation and
//! is kept exactly as-is for compatibility; see [`implicitly_hidden_by_table`].

use crate::hierarchy::node::{LayoutNode, Row};
use crate::layout::model::{ComponentDef, EditModeDef};

/// Whether `child` (a direct or nested descendant in `row` of `group`) is
/// hidden. `hidden_by_policy` is the verdict of every other policy (the
/// node's own resolved `hidden`, ancestor visibility, the host's oracle).
pub fn hidden_in_row(
    group: &ComponentDef,
    row: &Row,
    child: &LayoutNode,
    hidden_by_policy: bool,
) -> bool {
    if hidden_by_policy {
        return true;
    }
    if row
        .group_expressions
        .as_ref()
        .is_some_and(|gx| gx.hidden_row)
    {
        return true;
    }
    let base_id = child.base_component_id.as_deref().unwrap_or(&child.item.id);
    implicitly_hidden_by_table(group, base_id)
}

/// The table/edit-mode invisibility quirk.
///
/// A child of a repeating group is treated as hidden, with no explicit
/// hidden flag, when:
/// - the group's edit mode is `onlyTable` and the child has no table column
///   configuration (no edit view ever opens, so the child can never render), or
/// - the group shows no table (`hideTable`) and the child's column
///   configuration sets `showInExpandedEdit: false` (excluded from the only
///   surface left).
pub fn implicitly_hidden_by_table(group: &ComponentDef, child_base_id: &str) -> bool {
    let Some(edit) = &group.edit else {
        return false;
    };
    match edit.mode {
        Some(EditModeDef::OnlyTable) => !group.table_columns.contains_key(child_base_id),
        Some(EditModeDef::HideTable) => group
            .table_columns
            .get(child_base_id)
            .is_some_and(|col| col.show_in_expanded_edit == Some(false)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::node::NodeChildren;
    use crate::layout::lookups::ParentRef;
    use serde_json::json;

    fn group(raw: serde_json::Value) -> ComponentDef {
        serde_json::from_value(raw).unwrap()
    }

    fn child(id: &str, base: &str) -> LayoutNode {
        LayoutNode {
            item: serde_json::from_value(json!({ "id": id, "type": "Input" })).unwrap(),
            parent: ParentRef::Node { id: "g".into() },
            base_component_id: Some(base.to_owned()),
            row_index: Some(0),
            multi_page_index: None,
            children: NodeChildren::Leaf,
        }
    }

    fn row(hidden: bool) -> Row {
        Row {
            uuid: "u".into(),
            index: 0,
            items: vec![],
            group_expressions: Some(crate::hierarchy::node::GroupExpressions {
                hidden_row: hidden,
                edit_button: true,
                delete_button: true,
                save_button: true,
                save_and_next_button: false,
                alert_on_delete: false,
                text_resource_bindings: Default::default(),
            }),
        }
    }

    #[test]
    fn hidden_row_hides_every_descendant() {
        let g = group(json!({ "id": "g", "type": "Group" }));
        let c = child("who-0", "who");
        assert!(hidden_in_row(&g, &row(true), &c, false));
        assert!(!hidden_in_row(&g, &row(false), &c, false));
        assert!(hidden_in_row(&g, &row(false), &c, true));
    }

    #[test]
    fn only_table_mode_hides_children_without_a_column() {
        let g = group(json!({
            "id": "g", "type": "Group",
            "edit": { "mode": "onlyTable" },
            "tableColumns": { "who": {} },
        }));
        assert!(!implicitly_hidden_by_table(&g, "who"));
        assert!(implicitly_hidden_by_table(&g, "other"));
    }

    #[test]
    fn hide_table_mode_respects_show_in_expanded_edit() {
        let g = group(json!({
            "id": "g", "type": "Group",
            "edit": { "mode": "hideTable" },
            "tableColumns": {
                "who": { "showInExpandedEdit": false },
                "age": { "showInExpandedEdit": true },
            },
        }));
        assert!(implicitly_hidden_by_table(&g, "who"));
        assert!(!implicitly_hidden_by_table(&g, "age"));
        assert!(!implicitly_hidden_by_table(&g, "unconfigured"));
    }

    #[test]
    fn other_modes_never_imply_hidden() {
        let g = group(json!({
            "id": "g", "type": "Group",
            "edit": { "mode": "showTable" },
        }));
        assert!(!implicitly_hidden_by_table(&g, "who"));
    }
}
