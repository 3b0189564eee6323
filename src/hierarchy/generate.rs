//! Unresolved tree generation.
//!
//! Walks the lookup tables top-down and produces one [`LayoutNode`] per
//! component instance. Repeating containers expand into one row per element
//! of their bound array, read from the fresh data channel; every component
//! cloned into a row gets its id suffixed with the row index and its bindings
//! and mapping references rewritten to that row.

use std::collections::BTreeMap;

use tracing::warn;

use crate::foundation::binding::{rewrite_for_row, substitute_depth_placeholder};
use crate::hierarchy::node::{LayoutNode, NodeChildren, Row};
use crate::layout::lookups::{LookupTables, ParentRef};
use crate::layout::model::{BindingDef, ComponentDef, parse_child_ref};
use crate::layout::registry::ComponentRegistry;
use crate::resolve::sources::DataSources;

/// The tree before expression resolution.
#[derive(Debug)]
pub struct GeneratedPages {
    pub current_page: String,
    /// Page key → top-level nodes in declared order.
    pub pages: BTreeMap<String, Vec<LayoutNode>>,
}

/// One enclosing repeating row: the group's array field with every ancestor
/// index already applied, plus the index of this row in it. Binding rewrites
/// compose by applying scopes outermost first, each against the path form the
/// previous scopes produced.
#[derive(Debug, Clone)]
struct Rewrite {
    data_type: String,
    prefix: String,
    row_index: usize,
    /// Count of enclosing repeating scopes; selects which `[{n}]` mapping
    /// placeholder this scope substitutes.
    depth: usize,
}

#[derive(Debug, Clone, Default)]
struct RowScope {
    suffix: String,
    rewrites: Vec<Rewrite>,
}

impl RowScope {
    fn enter(&self, data_type: &str, prefix: &str, row_index: usize) -> Self {
        let mut next = self.clone();
        next.suffix.push_str(&format!("-{row_index}"));
        next.rewrites.push(Rewrite {
            data_type: data_type.to_owned(),
            prefix: prefix.to_owned(),
            row_index,
            depth: self.rewrites.len(),
        });
        next
    }

    fn row_index(&self) -> Option<usize> {
        self.rewrites.last().map(|r| r.row_index)
    }

    /// Rewrites a cloned definition into this scope: suffixes the id and
    /// applies every enclosing row to bindings and mapping references.
    fn apply(&self, item: &mut ComponentDef) {
        if self.suffix.is_empty() {
            return;
        }
        item.id.push_str(&self.suffix);

        for binding in item.data_model_bindings.values_mut() {
            for rw in &self.rewrites {
                if binding.data_type == rw.data_type {
                    binding.field =
                        rewrite_for_row(&binding.field, &rw.prefix, &rw.prefix, rw.row_index);
                }
                binding.field =
                    substitute_depth_placeholder(&binding.field, rw.depth, rw.row_index);
            }
        }

        if !item.mapping.is_empty() {
            let mut rewritten = BTreeMap::new();
            for (path, target) in std::mem::take(&mut item.mapping) {
                let (mut path, mut target) = (path, target);
                for rw in &self.rewrites {
                    path = substitute_depth_placeholder(&path, rw.depth, rw.row_index);
                    target = substitute_depth_placeholder(&target, rw.depth, rw.row_index);
                }
                rewritten.insert(path, target);
            }
            item.mapping = rewritten;
        }
    }
}

/// Generates the unresolved tree for every page of the layout set.
pub fn generate_unresolved(
    lookups: &LookupTables,
    registry: &ComponentRegistry,
    current_page: &str,
    sources: &DataSources<'_>,
) -> GeneratedPages {
    let generator = Generator {
        lookups,
        registry,
        sources,
    };

    let mut pages = BTreeMap::new();
    for (page_key, top_ids) in &lookups.top_level_components {
        let parent = ParentRef::Page {
            page_key: page_key.clone(),
        };
        let top = top_ids
            .iter()
            .filter_map(|id| generator.node(id, parent.clone(), &RowScope::default()))
            .collect();
        pages.insert(page_key.clone(), top);
    }

    GeneratedPages {
        current_page: current_page.to_owned(),
        pages,
    }
}

struct Generator<'a> {
    lookups: &'a LookupTables,
    registry: &'a ComponentRegistry,
    sources: &'a DataSources<'a>,
}

impl Generator<'_> {
    fn node(&self, base_id: &str, parent: ParentRef, scope: &RowScope) -> Option<LayoutNode> {
        let Some(def) = self.lookups.all_components.get(base_id) else {
            warn!(id = base_id, "skipping unknown component during generation");
            return None;
        };
        let mut item = def.clone();
        scope.apply(&mut item);

        let base_component_id = (!scope.suffix.is_empty()).then(|| base_id.to_owned());
        let children = self.children(base_id, &item, scope);

        Some(LayoutNode {
            item,
            parent,
            base_component_id,
            row_index: scope.row_index(),
            multi_page_index: None,
            children,
        })
    }

    fn children(&self, base_id: &str, item: &ComponentDef, scope: &RowScope) -> NodeChildren {
        let def = &self.lookups.all_components[base_id];
        if !self.registry.is_container(def) {
            return NodeChildren::Leaf;
        }

        if self.registry.is_repeating(def) {
            match item.group_binding() {
                Some(binding) => {
                    return NodeChildren::Rows(self.rows(base_id, item, binding, scope));
                }
                None => {
                    warn!(
                        id = item.id,
                        "repeating container has no group binding, treating as plain container"
                    );
                }
            }
        }

        NodeChildren::Group(self.child_items(base_id, item, scope))
    }

    fn rows(
        &self,
        base_id: &str,
        item: &ComponentDef,
        binding: &BindingDef,
        scope: &RowScope,
    ) -> Vec<Row> {
        let count = self
            .sources
            .fresh_data
            .row_count(&binding.data_type, &binding.field);

        (0..count)
            .map(|row_index| {
                let uuid = self
                    .sources
                    .fresh_data
                    .row_uuid(&binding.data_type, &binding.field, row_index)
                    .unwrap_or_else(|| {
                        warn!(
                            group = item.id,
                            row_index, "row has no identity, falling back to index-derived key"
                        );
                        format!("missing-row-id-{row_index}")
                    });
                let row_scope = scope.enter(&binding.data_type, &binding.field, row_index);
                Row {
                    uuid,
                    index: row_index,
                    items: self.child_items(base_id, item, &row_scope),
                    group_expressions: None,
                }
            })
            .collect()
    }

    fn child_items(&self, base_id: &str, item: &ComponentDef, scope: &RowScope) -> Vec<LayoutNode> {
        // Sub-page indices come from the declared child references, which the
        // claim phase stripped.
        let mut sub_pages = BTreeMap::new();
        if self.registry.supports_multi_page(&self.lookups.all_components[base_id]) {
            for raw in &self.lookups.all_components[base_id].children {
                let (page_index, child_id) = parse_child_ref(raw, true);
                if let Some(page_index) = page_index {
                    sub_pages.insert(child_id.to_owned(), page_index);
                }
            }
        }

        let parent = ParentRef::Node {
            id: item.id.clone(),
        };
        self.lookups
            .component_to_children
            .get(base_id)
            .into_iter()
            .flatten()
            .filter_map(|child_id| {
                let mut node = self.node(child_id, parent.clone(), scope)?;
                node.multi_page_index = sub_pages.get(child_id.as_str()).copied();
                Some(node)
            })
            .collect()
    }
}
