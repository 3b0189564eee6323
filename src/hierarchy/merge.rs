//! Resolution-to-resolution stability.
//!
//! Resolving is wholesale: a new tree is built every time. Hosts memoize per
//! node keyed on reference identity, so [`merge_resolved`] splices unchanged
//! top-level leaf nodes from the previous resolution into the new one.
//! Containers are never spliced; their subtrees change shape with the data
//! and a stale row would be worse than a cold cache.

use std::rc::Rc;

use crate::hierarchy::node::{LayoutNode, NodeChildren, ResolvedPages};

/// Splices unchanged nodes from `previous` into `next` and returns the
/// result. A top-level node is carried over when it is a leaf and the old and
/// new nodes compare equal; the caller observes this through `Rc::ptr_eq`.
pub fn merge_resolved(previous: Option<&ResolvedPages>, mut next: ResolvedPages) -> ResolvedPages {
    let Some(previous) = previous else {
        return next;
    };

    for (page_key, page) in &mut next.pages {
        let Some(old_page) = previous.pages.get(page_key) else {
            continue;
        };
        for slot in &mut page.top {
            if !matches!(slot.children, NodeChildren::Leaf) {
                continue;
            }
            let reusable = old_page
                .top
                .iter()
                .find(|old| old.item.id == slot.item.id)
                .filter(|old| ***old == **slot);
            if let Some(old) = reusable {
                *slot = Rc::clone(old);
            }
        }
    }
    next
}

/// Convenience used by the pipeline to lift a freshly generated page's nodes
/// into shared ownership.
pub fn share_top_level(nodes: Vec<LayoutNode>) -> Vec<Rc<LayoutNode>> {
    nodes.into_iter().map(Rc::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::lookups::ParentRef;
    use crate::layout::model::ComponentDef;
    use std::collections::BTreeMap;

    fn leaf(id: &str, kind: &str) -> LayoutNode {
        let item: ComponentDef = serde_json::from_value(serde_json::json!({
            "id": id,
            "type": kind,
        }))
        .unwrap();
        LayoutNode {
            item,
            parent: ParentRef::Page {
                page_key: "form".into(),
            },
            base_component_id: None,
            row_index: None,
            multi_page_index: None,
            children: NodeChildren::Leaf,
        }
    }

    fn pages(top: Vec<LayoutNode>) -> ResolvedPages {
        let mut map = BTreeMap::new();
        map.insert("form".to_owned(), crate::hierarchy::node::PageTree {
            page_key: "form".to_owned(),
            top: share_top_level(top),
        });
        ResolvedPages {
            current_page: "form".to_owned(),
            pages: map,
        }
    }

    #[test]
    fn unchanged_leaves_keep_their_identity() {
        let old = pages(vec![leaf("a", "Input"), leaf("b", "Header")]);
        let new = pages(vec![leaf("a", "Input"), leaf("b", "Paragraph")]);

        let merged = merge_resolved(Some(&old), new);
        let merged_page = &merged.pages["form"];
        let old_page = &old.pages["form"];

        assert!(Rc::ptr_eq(&merged_page.top[0], &old_page.top[0]));
        assert!(!Rc::ptr_eq(&merged_page.top[1], &old_page.top[1]));
        assert_eq!(merged_page.top[1].item.kind, "Paragraph");
    }

    #[test]
    fn containers_are_always_rebuilt() {
        let container = |rows: NodeChildren| {
            let mut node = leaf("g", "Group");
            node.children = rows;
            node
        };
        let old = pages(vec![container(NodeChildren::Group(vec![]))]);
        let new = pages(vec![container(NodeChildren::Group(vec![]))]);

        let merged = merge_resolved(Some(&old), new);
        assert!(!Rc::ptr_eq(&merged.pages["form"].top[0], &old.pages["form"].top[0]));
    }

    #[test]
    fn first_resolution_passes_through() {
        let new = pages(vec![leaf("a", "Input")]);
        let merged = merge_resolved(None, new);
        assert_eq!(merged.pages["form"].top.len(), 1);
    }
}
