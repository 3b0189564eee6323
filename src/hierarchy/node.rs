//! Generated node tree.
//!
//! A node owns a fully rewritten copy of its component definition: inside
//! repeating rows the id carries a row suffix and every binding and mapping
//! reference has concrete row indices applied. Parents are referred to by id,
//! never by pointer, so subtrees can be cloned and compared freely.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::layout::lookups::ParentRef;
use crate::layout::model::{BindingDef, ComponentDef};

/// Row-scoped group properties, resolved once per row with that row's first
/// child as evaluation context.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupExpressions {
    pub hidden_row: bool,
    pub edit_button: bool,
    pub delete_button: bool,
    pub save_button: bool,
    pub save_and_next_button: bool,
    pub alert_on_delete: bool,
    pub text_resource_bindings: BTreeMap<String, String>,
}

/// One expanded repeating row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Stable row identity from the data layer; survives reordering.
    pub uuid: String,
    pub index: usize,
    pub items: Vec<LayoutNode>,
    /// `None` until the row-scoped resolution pass has run.
    pub group_expressions: Option<GroupExpressions>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeChildren {
    Leaf,
    /// Non-repeating container children.
    Group(Vec<LayoutNode>),
    /// Repeating container rows.
    Rows(Vec<Row>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    /// Rewritten definition: suffixed id, per-row bindings and mappings.
    pub item: ComponentDef,
    pub parent: ParentRef,
    /// The declared id before row suffixing; `None` outside repeating rows.
    pub base_component_id: Option<String>,
    /// Index of the closest enclosing row, if any.
    pub row_index: Option<usize>,
    /// Sub-page index assigned by a multi-page container.
    pub multi_page_index: Option<usize>,
    pub children: NodeChildren,
}

impl LayoutNode {
    /// The row suffix of this node's id (`"-0-1"`), empty outside rows.
    pub fn row_suffix(&self) -> &str {
        match &self.base_component_id {
            Some(base) => &self.item.id[base.len()..],
            None => "",
        }
    }

    /// The binding used as evaluation context: `simpleBinding` when present,
    /// otherwise the first binding in key order.
    pub fn context_binding(&self) -> Option<&BindingDef> {
        self.item
            .data_model_bindings
            .get("simpleBinding")
            .or_else(|| self.item.data_model_bindings.values().next())
    }

    /// Depth-first walk over this node and every descendant, rows included.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a LayoutNode)) {
        f(self);
        match &self.children {
            NodeChildren::Leaf => {}
            NodeChildren::Group(items) => {
                for child in items {
                    child.visit(f);
                }
            }
            NodeChildren::Rows(rows) => {
                for row in rows {
                    for child in &row.items {
                        child.visit(f);
                    }
                }
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<&LayoutNode> {
        if self.item.id == id {
            return Some(self);
        }
        match &self.children {
            NodeChildren::Leaf => None,
            NodeChildren::Group(items) => items.iter().find_map(|c| c.find(id)),
            NodeChildren::Rows(rows) => rows
                .iter()
                .flat_map(|r| &r.items)
                .find_map(|c| c.find(id)),
        }
    }
}

/// One resolved page. Top-level nodes are reference counted so an unchanged
/// node can be carried over between resolutions with its identity intact.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTree {
    pub page_key: String,
    pub top: Vec<Rc<LayoutNode>>,
}

impl PageTree {
    pub fn find(&self, id: &str) -> Option<&LayoutNode> {
        self.top.iter().find_map(|n| n.find(id))
    }
}

/// Every page of a layout set, resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPages {
    pub current_page: String,
    pub pages: BTreeMap<String, PageTree>,
}

impl ResolvedPages {
    pub fn page(&self, page_key: &str) -> Option<&PageTree> {
        self.pages.get(page_key)
    }

    /// Finds a node by generated id, searching the current page first.
    pub fn find_by_id(&self, id: &str) -> Option<&LayoutNode> {
        if let Some(page) = self.pages.get(&self.current_page) {
            if let Some(node) = page.find(id) {
                return Some(node);
            }
        }
        self.pages
            .iter()
            .filter(|(key, _)| **key != self.current_page)
            .find_map(|(_, page)| page.find(id))
    }

    /// Depth-first walk over every node on every page.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a LayoutNode)) {
        for page in self.pages.values() {
            for node in &page.top {
                node.visit(f);
            }
        }
    }
}
