//! Whole-layout-set resolution.
//!
//! One call takes raw layout definitions plus settled data sources and
//! produces the resolved node tree for every page, along with the rows that
//! disappeared since the previous resolution (hosts run teardown for those)
//! and any structural problems found on the way.

use std::collections::BTreeMap;

use tracing::instrument;

use crate::foundation::error::{FormworkError, FormworkResult};
use crate::hierarchy::generate::generate_unresolved;
use crate::hierarchy::merge::{merge_resolved, share_top_level};
use crate::hierarchy::node::{NodeChildren, PageTree, ResolvedPages};
use crate::layout::lookups::{StructuralProblem, build_lookups};
use crate::layout::model::LayoutSetDef;
use crate::layout::registry::ComponentRegistry;
use crate::resolve::resolver::resolve_expressions;
use crate::resolve::sources::DataSources;

/// A repeating row present in the previous resolution but not in this one.
/// Hosts tear down per-row state (attachments, validations) keyed on the row
/// identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    /// Generated id of the owning group (row-suffixed when nested).
    pub group_id: String,
    /// Declared id of the owning group.
    pub base_group_id: String,
    pub row_uuid: String,
    /// Index the row had when last seen.
    pub row_index: usize,
}

#[derive(Debug)]
pub struct ResolveOutput {
    pub pages: ResolvedPages,
    pub dropped_rows: Vec<DroppedRow>,
    pub problems: Vec<StructuralProblem>,
}

/// Resolves a full layout set against settled data sources.
///
/// `previous` is the output of the last resolution, if any; unchanged
/// top-level leaf nodes are carried over from it with their reference
/// identity intact, and rows missing from the new tree are reported as
/// dropped.
#[instrument(skip_all, fields(page = current_page))]
pub fn resolve_layout_set(
    layouts: &LayoutSetDef,
    current_page: &str,
    registry: &ComponentRegistry,
    sources: &DataSources<'_>,
    previous: Option<&ResolvedPages>,
) -> FormworkResult<ResolveOutput> {
    if !layouts.pages.contains_key(current_page) {
        return Err(FormworkError::lookup(format!(
            "no page with key '{current_page}' in layout set"
        )));
    }

    let lookups = build_lookups(layouts, registry);
    let problems = lookups.problems.clone();

    let mut generated = generate_unresolved(&lookups, registry, current_page, sources);
    resolve_expressions(&mut generated, sources);

    let mut pages = BTreeMap::new();
    for (page_key, top) in generated.pages {
        pages.insert(page_key.clone(), PageTree {
            page_key,
            top: share_top_level(top),
        });
    }
    let resolved = ResolvedPages {
        current_page: generated.current_page,
        pages,
    };

    let merged = merge_resolved(previous, resolved);
    let dropped_rows = previous
        .map(|prev| diff_rows(prev, &merged))
        .unwrap_or_default();

    Ok(ResolveOutput {
        pages: merged,
        dropped_rows,
        problems,
    })
}

/// Rows present in `previous` whose identity no longer appears anywhere in
/// `next`. Identities are compared globally, so a row that merely shifted
/// index is not dropped.
fn diff_rows(previous: &ResolvedPages, next: &ResolvedPages) -> Vec<DroppedRow> {
    let mut surviving = std::collections::BTreeSet::new();
    next.visit(&mut |node| {
        if let NodeChildren::Rows(rows) = &node.children {
            for row in rows {
                surviving.insert(row.uuid.clone());
            }
        }
    });

    let mut dropped = Vec::new();
    previous.visit(&mut |node| {
        if let NodeChildren::Rows(rows) = &node.children {
            for row in rows {
                if !surviving.contains(&row.uuid) {
                    dropped.push(DroppedRow {
                        group_id: node.item.id.clone(),
                        base_group_id: node
                            .base_component_id
                            .clone()
                            .unwrap_or_else(|| node.item.id.clone()),
                        row_uuid: row.uuid.clone(),
                        row_index: row.index,
                    });
                }
            }
        }
    });
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::sources::FormData;
    use serde_json::json;

    fn people_layout() -> LayoutSetDef {
        serde_json::from_value(json!({ "pages": { "form": [
            { "id": "people", "type": "Group", "maxCount": 5,
              "dataModelBindings": { "group": { "dataType": "Model", "field": "Persons" } },
              "children": ["who"] },
            { "id": "who", "type": "Input",
              "dataModelBindings": {
                  "simpleBinding": { "dataType": "Model", "field": "Persons.name" } } },
        ]}}))
        .unwrap()
    }

    fn data(rows: serde_json::Value) -> FormData {
        let mut fd = FormData::new();
        fd.insert_model("Model", json!({ "Persons": rows }));
        fd.ensure_row_ids();
        fd
    }

    #[test]
    fn unknown_current_page_is_an_error() {
        let layouts = people_layout();
        let fd = data(json!([]));
        let sources = DataSources::new(&fd, &fd, "Model");
        let registry = ComponentRegistry::standard();

        let err = resolve_layout_set(&layouts, "nope", &registry, &sources, None);
        assert!(matches!(err, Err(FormworkError::LookupNotFound(_))));
    }

    #[test]
    fn removed_rows_are_reported_with_their_identity() {
        let layouts = people_layout();
        let registry = ComponentRegistry::standard();

        let mut fd = data(json!([{ "name": "Ada" }, { "name": "Brendan" }]));
        let sources = DataSources::new(&fd, &fd, "Model");
        let first = resolve_layout_set(&layouts, "form", &registry, &sources, None).unwrap();
        assert!(first.dropped_rows.is_empty());

        let removed_uuid = fd.row_uuid("Model", "Persons", 0).unwrap();
        let mut model = fd.model("Model").unwrap().clone();
        model["Persons"].as_array_mut().unwrap().remove(0);
        fd.insert_model("Model", model);

        let sources = DataSources::new(&fd, &fd, "Model");
        let second =
            resolve_layout_set(&layouts, "form", &registry, &sources, Some(&first.pages)).unwrap();

        assert_eq!(second.dropped_rows, vec![DroppedRow {
            group_id: "people".into(),
            base_group_id: "people".into(),
            row_uuid: removed_uuid,
            row_index: 0,
        }]);
    }

    #[test]
    fn structural_problems_surface_in_the_output() {
        let layouts: LayoutSetDef = serde_json::from_value(json!({ "pages": { "form": [
            { "id": "g", "type": "Group", "maxCount": 2, "children": ["ghost"] },
        ]}}))
        .unwrap();
        let fd = data(json!([]));
        let sources = DataSources::new(&fd, &fd, "Model");
        let registry = ComponentRegistry::standard();

        let out = resolve_layout_set(&layouts, "form", &registry, &sources, None).unwrap();
        assert_eq!(out.problems, vec![StructuralProblem::DanglingReference {
            parent: "g".into(),
            child: "ghost".into(),
        }]);
    }
}
