//! Flat lookup tables over a layout set.
//!
//! Built once per layout set, before any tree exists. Parent/child
//! relationships come from an explicit claim protocol: containers claim their
//! declared children up front, claims are validated afterwards, and the first
//! valid claimant wins in declared order. Structural mistakes never abort the
//! build; they are logged and recorded so a host can surface them.

use std::collections::BTreeMap;

use tracing::warn;

use crate::foundation::error::{FormworkError, FormworkResult};
use crate::layout::model::{ComponentDef, LayoutSetDef};
use crate::layout::registry::{ComponentProto, ComponentRegistry};

/// Where a node hangs: directly on a page, or under another component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    Page { page_key: String },
    Node { id: String },
}

/// A structural defect found while building the tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralProblem {
    DuplicateId {
        id: String,
        first_page: String,
        duplicate_page: String,
    },
    DanglingReference {
        parent: String,
        child: String,
    },
    CrossPageClaim {
        parent: String,
        child: String,
    },
    ClaimConflict {
        child: String,
        winner: String,
        loser: String,
    },
}

/// One container's wish to own a child, recorded during the claim phase and
/// validated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub parent: String,
    pub child: String,
}

/// Handed to a container's claim procedure. Claims are requests, not
/// assignments; validation happens after every container has spoken.
pub struct ClaimContext<'a> {
    parent_id: &'a str,
    components: &'a BTreeMap<String, ComponentDef>,
    registry: &'a ComponentRegistry,
    requests: &'a mut Vec<ClaimRequest>,
}

impl ClaimContext<'_> {
    pub fn claim(&mut self, child_id: &str) {
        self.requests.push(ClaimRequest {
            parent: self.parent_id.to_owned(),
            child: child_id.to_owned(),
        });
    }

    /// Capability peek at another component, claimed or not.
    pub fn proto(&self, id: &str) -> Option<ComponentProto> {
        self.components.get(id).map(|def| self.registry.proto(def))
    }
}

/// The flat tables every later phase works from.
#[derive(Debug, Default)]
pub struct LookupTables {
    /// Every component by id (first definition wins on duplicates).
    pub all_components: BTreeMap<String, ComponentDef>,
    /// Page key → component ids in declared order.
    pub all_per_page: BTreeMap<String, Vec<String>>,
    pub component_to_page: BTreeMap<String, String>,
    /// `"dataType.field"` → ids of components bound to it.
    pub data_model_to_components: BTreeMap<String, Vec<String>>,
    /// Child id → winning parent id.
    pub component_to_parent: BTreeMap<String, String>,
    /// Parent id → claimed child ids, in claim order.
    pub component_to_children: BTreeMap<String, Vec<String>>,
    /// Page key → unclaimed component ids in declared order.
    pub top_level_components: BTreeMap<String, Vec<String>>,
    pub problems: Vec<StructuralProblem>,
}

impl LookupTables {
    pub fn get_component(&self, id: &str) -> FormworkResult<&ComponentDef> {
        self.all_components
            .get(id)
            .ok_or_else(|| FormworkError::lookup(format!("no component with id '{id}'")))
    }

    /// Typed fetch; a present component of the wrong type is a distinct
    /// failure from a missing one.
    pub fn get_component_of(&self, id: &str, expected: &str) -> FormworkResult<&ComponentDef> {
        let def = self.get_component(id)?;
        if def.kind != expected {
            return Err(FormworkError::TypeMismatch {
                id: id.to_owned(),
                expected: expected.to_owned(),
                actual: def.kind.clone(),
            });
        }
        Ok(def)
    }

    pub fn parent_of(&self, id: &str) -> Option<ParentRef> {
        if let Some(parent) = self.component_to_parent.get(id) {
            return Some(ParentRef::Node { id: parent.clone() });
        }
        self.component_to_page.get(id).map(|page| ParentRef::Page {
            page_key: page.clone(),
        })
    }
}

/// Builds the lookup tables for a layout set.
pub fn build_lookups(layouts: &LayoutSetDef, registry: &ComponentRegistry) -> LookupTables {
    let mut tables = LookupTables::default();

    // Index every component. Later definitions of a duplicated id are
    // dropped so references resolve deterministically.
    for (page_key, components) in &layouts.pages {
        let ids = tables.all_per_page.entry(page_key.clone()).or_default();
        for def in components {
            if let Some(first_page) = tables.component_to_page.get(&def.id) {
                warn!(
                    id = def.id,
                    first_page = first_page.as_str(),
                    duplicate_page = page_key.as_str(),
                    "duplicate component id, keeping first definition"
                );
                tables.problems.push(StructuralProblem::DuplicateId {
                    id: def.id.clone(),
                    first_page: first_page.clone(),
                    duplicate_page: page_key.clone(),
                });
                continue;
            }
            ids.push(def.id.clone());
            tables
                .component_to_page
                .insert(def.id.clone(), page_key.clone());
            for binding in def.data_model_bindings.values() {
                tables
                    .data_model_to_components
                    .entry(format!("{}.{}", binding.data_type, binding.field))
                    .or_default()
                    .push(def.id.clone());
            }
            tables.all_components.insert(def.id.clone(), def.clone());
        }
    }

    // Claim phase: every container states its wishes, in page and declared
    // order, against the complete component index.
    let mut requests = Vec::new();
    for ids in tables.all_per_page.values() {
        for id in ids {
            let def = &tables.all_components[id];
            let Some(claim) = registry.spec(&def.kind).and_then(|s| s.claim) else {
                continue;
            };
            let mut ctx = ClaimContext {
                parent_id: id,
                components: &tables.all_components,
                registry,
                requests: &mut requests,
            };
            claim(def, &mut ctx);
        }
    }

    // Validation phase: requests settle in order, first valid claimant wins.
    for request in requests {
        if !tables.all_components.contains_key(&request.child) {
            warn!(
                parent = request.parent,
                child = request.child,
                "claimed child does not exist"
            );
            tables.problems.push(StructuralProblem::DanglingReference {
                parent: request.parent,
                child: request.child,
            });
            continue;
        }
        if tables.component_to_page.get(&request.child)
            != tables.component_to_page.get(&request.parent)
        {
            warn!(
                parent = request.parent,
                child = request.child,
                "claimed child lives on another page"
            );
            tables.problems.push(StructuralProblem::CrossPageClaim {
                parent: request.parent,
                child: request.child,
            });
            continue;
        }
        if let Some(winner) = tables.component_to_parent.get(&request.child) {
            warn!(
                child = request.child,
                winner = winner.as_str(),
                loser = request.parent,
                "child already claimed"
            );
            tables.problems.push(StructuralProblem::ClaimConflict {
                child: request.child,
                winner: winner.clone(),
                loser: request.parent,
            });
            continue;
        }
        tables
            .component_to_parent
            .insert(request.child.clone(), request.parent.clone());
        tables
            .component_to_children
            .entry(request.parent)
            .or_default()
            .push(request.child);
    }

    for (page_key, ids) in &tables.all_per_page {
        let top: Vec<String> = ids
            .iter()
            .filter(|id| !tables.component_to_parent.contains_key(*id))
            .cloned()
            .collect();
        tables.top_level_components.insert(page_key.clone(), top);
    }

    tables
}
