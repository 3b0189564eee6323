//! Component capability registry.
//!
//! Resolves a component `type` string to its capability set and claiming
//! behavior without dragging in any rendering concern, so headless tooling
//! can reuse the lookups. The registry is explicit and immutable once built;
//! it is passed by reference into the lookup builder and the resolver.

use std::collections::BTreeMap;

use tracing::debug;

use crate::layout::lookups::ClaimContext;
use crate::layout::model::{ComponentDef, parse_child_ref};

/// When a container expands into one subtree per data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatKind {
    Never,
    /// Legacy groups repeat only with `maxCount > 1`.
    WhenMaxCountExceedsOne,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerCaps {
    /// Whether the container may split its children over internal sub-pages
    /// (page-qualified child references).
    pub multi_page: bool,
    pub repeating: RepeatKind,
}

/// The claiming procedure a container runs during lookup construction.
pub type ClaimFn = fn(&ComponentDef, &mut ClaimContext<'_>);

pub struct ComponentSpec {
    pub container: Option<ContainerCaps>,
    pub claim: Option<ClaimFn>,
}

/// Narrow capability descriptor handed to claiming containers, so they can
/// make type-dependent decisions without the full definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentProto {
    pub kind: String,
    pub container: bool,
    pub multi_page: bool,
}

pub struct ComponentRegistry {
    specs: BTreeMap<String, ComponentSpec>,
}

impl ComponentRegistry {
    pub fn empty() -> Self {
        Self {
            specs: BTreeMap::new(),
        }
    }

    /// The standard component set. Hosts with custom components register
    /// their own specs on top.
    pub fn standard() -> Self {
        let mut reg = Self::empty();
        for leaf in [
            "Input",
            "TextArea",
            "Checkboxes",
            "RadioButtons",
            "Dropdown",
            "Datepicker",
            "Header",
            "Paragraph",
            "Image",
            "FileUpload",
            "Button",
            "NavigationButtons",
        ] {
            reg.register(leaf, ComponentSpec {
                container: None,
                claim: None,
            });
        }

        reg.register("Group", ComponentSpec {
            container: Some(ContainerCaps {
                multi_page: true,
                repeating: RepeatKind::WhenMaxCountExceedsOne,
            }),
            claim: Some(claim_declared_children),
        });
        reg.register("RepeatingGroup", ComponentSpec {
            container: Some(ContainerCaps {
                multi_page: true,
                repeating: RepeatKind::Always,
            }),
            claim: Some(claim_declared_children),
        });
        reg.register("ButtonGroup", ComponentSpec {
            container: Some(ContainerCaps {
                multi_page: false,
                repeating: RepeatKind::Never,
            }),
            claim: Some(claim_non_container_children),
        });
        reg
    }

    pub fn register(&mut self, kind: impl Into<String>, spec: ComponentSpec) {
        self.specs.insert(kind.into(), spec);
    }

    pub fn spec(&self, kind: &str) -> Option<&ComponentSpec> {
        self.specs.get(kind)
    }

    pub fn is_container(&self, def: &ComponentDef) -> bool {
        self.spec(&def.kind).is_some_and(|s| s.container.is_some())
    }

    pub fn is_repeating(&self, def: &ComponentDef) -> bool {
        let Some(caps) = self.spec(&def.kind).and_then(|s| s.container) else {
            return false;
        };
        match caps.repeating {
            RepeatKind::Never => false,
            RepeatKind::Always => true,
            RepeatKind::WhenMaxCountExceedsOne => def.max_count.is_some_and(|m| m > 1),
        }
    }

    pub fn supports_multi_page(&self, def: &ComponentDef) -> bool {
        self.spec(&def.kind)
            .and_then(|s| s.container)
            .is_some_and(|c| c.multi_page)
            && def.multi_page()
    }

    pub fn proto(&self, def: &ComponentDef) -> ComponentProto {
        let caps = self.spec(&def.kind).and_then(|s| s.container);
        ComponentProto {
            kind: def.kind.clone(),
            container: caps.is_some(),
            multi_page: caps.is_some_and(|c| c.multi_page),
        }
    }
}

/// Claims every declared child, stripping page prefixes for multi-page
/// containers.
fn claim_declared_children(def: &ComponentDef, ctx: &mut ClaimContext<'_>) {
    let multi_page = def.multi_page();
    for raw in &def.children {
        let (_, id) = parse_child_ref(raw, multi_page);
        ctx.claim(id);
    }
}

/// Claims only non-container children; a container inside a button group is
/// a configuration mistake, refused quietly (a dangling reference is still
/// claimed and reported by the resolution phase).
fn claim_non_container_children(def: &ComponentDef, ctx: &mut ClaimContext<'_>) {
    for id in &def.children {
        match ctx.proto(id) {
            Some(proto) if proto.container => {
                debug!(
                    parent = def.id,
                    child = id.as_str(),
                    "button group refused container child"
                );
            }
            _ => ctx.claim(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(kind: &str, max_count: Option<u32>) -> ComponentDef {
        serde_json::from_value(serde_json::json!({
            "id": "x",
            "type": kind,
            "maxCount": max_count,
        }))
        .unwrap()
    }

    #[test]
    fn legacy_groups_repeat_only_with_max_count() {
        let reg = ComponentRegistry::standard();
        assert!(!reg.is_repeating(&def("Group", None)));
        assert!(!reg.is_repeating(&def("Group", Some(1))));
        assert!(reg.is_repeating(&def("Group", Some(3))));
        assert!(reg.is_repeating(&def("RepeatingGroup", None)));
        assert!(!reg.is_repeating(&def("Input", Some(3))));
    }

    #[test]
    fn proto_reports_container_capability() {
        let reg = ComponentRegistry::standard();
        assert!(reg.proto(&def("Group", None)).container);
        assert!(!reg.proto(&def("Input", None)).container);
        // Unknown types degrade to leaf capability.
        assert!(!reg.proto(&def("CustomWidget", None)).container);
    }
}
