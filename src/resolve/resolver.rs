//! Two-pass expression resolution over a generated tree.
//!
//! Pass one walks every node and resolves its expression-capable properties
//! in place, so after it no non-row [`ExprVal`] is left unresolved. Pass two
//! walks repeating containers and resolves the row-scoped group properties
//! once per row, with that row's first child as evaluation context; results
//! land on the row, not on the item, because each row sees different data.
//!
//! A failing expression never aborts resolution. The failure is logged and
//! the property keeps its default, matching how a form must keep working when
//! one layout expression is broken.

use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::warn;

use crate::expression::config::{PropertyKey, rules_for};
use crate::expression::eval::{
    ComponentBindingInfo, EvalContext, as_bool, as_string, evaluate,
};
use crate::foundation::binding::DataBinding;
use crate::hierarchy::generate::GeneratedPages;
use crate::hierarchy::node::{GroupExpressions, LayoutNode, NodeChildren};
use crate::layout::model::ExprVal;
use crate::resolve::sources::DataSources;

/// Resolves every expression in the generated tree, in place.
pub fn resolve_expressions(pages: &mut GeneratedPages, sources: &DataSources<'_>) {
    let resolver = Resolver {
        sources,
        components: collect_bindings(pages),
    };
    for top in pages.pages.values_mut() {
        for node in top.iter_mut() {
            resolver.pass_one(node);
        }
    }
    for top in pages.pages.values_mut() {
        for node in top.iter_mut() {
            resolver.pass_two(node);
        }
    }
}

/// Flat `simpleBinding` index over the generated tree, for `["component", ..]`
/// lookups. Binding targets are fixed at generation time, so the index stays
/// valid while items are mutated.
fn collect_bindings(pages: &GeneratedPages) -> BTreeMap<String, ComponentBindingInfo> {
    let mut out = BTreeMap::new();
    for top in pages.pages.values() {
        for node in top {
            node.visit(&mut |n| {
                if let Some(binding) = n.item.data_model_bindings.get("simpleBinding") {
                    out.insert(n.item.id.clone(), ComponentBindingInfo {
                        data_type: binding.data_type.clone(),
                        field: binding.field.clone(),
                    });
                }
            });
        }
    }
    out
}

struct Resolver<'a> {
    sources: &'a DataSources<'a>,
    components: BTreeMap<String, ComponentBindingInfo>,
}

impl Resolver<'_> {
    fn ctx_for(&self, node: &LayoutNode) -> EvalContext<'_> {
        EvalContext {
            sources: self.sources,
            context_binding: node.context_binding().and_then(|b| {
                DataBinding::from_str(&b.field)
                    .ok()
                    .map(|parsed| (b.data_type.clone(), parsed))
            }),
            row_suffix: node.row_suffix().to_owned(),
            components: &self.components,
        }
    }

    fn pass_one(&self, node: &mut LayoutNode) {
        let is_repeating = matches!(node.children, NodeChildren::Rows(_));
        // A key that is row-scoped on this node is pass two's business even
        // when the default rules also name it.
        let row_scoped: Vec<PropertyKey> = rules_for(is_repeating)
            .filter(|r| r.per_row)
            .map(|r| r.key)
            .collect();

        let ctx = self.ctx_for(node);
        for rule in rules_for(is_repeating).filter(|r| !r.per_row) {
            if row_scoped.contains(&rule.key) {
                continue;
            }
            match rule.key {
                PropertyKey::Hidden => {
                    self.resolve_bool("hidden", &mut node.item.hidden, &ctx, false);
                }
                PropertyKey::Required => {
                    self.resolve_bool("required", &mut node.item.required, &ctx, false);
                }
                PropertyKey::ReadOnly => {
                    self.resolve_bool("readOnly", &mut node.item.read_only, &ctx, false);
                }
                PropertyKey::TextResourceBindings => {
                    for slot in node.item.text_resource_bindings.values_mut() {
                        self.resolve_string("textResourceBindings", slot, &ctx);
                    }
                }
                _ => {}
            }
        }

        match &mut node.children {
            NodeChildren::Leaf => {}
            NodeChildren::Group(items) => {
                for child in items {
                    self.pass_one(child);
                }
            }
            NodeChildren::Rows(rows) => {
                for row in rows {
                    for child in &mut row.items {
                        self.pass_one(child);
                    }
                }
            }
        }
    }

    fn pass_two(&self, node: &mut LayoutNode) {
        let node_suffix = node.row_suffix().to_owned();
        let edit = node.item.edit.clone().unwrap_or_default();
        let hidden_row = node.item.hidden_row.clone();
        let bindings = node.item.text_resource_bindings.clone();

        match &mut node.children {
            NodeChildren::Leaf => {}
            NodeChildren::Group(items) => {
                for child in items {
                    self.pass_two(child);
                }
            }
            NodeChildren::Rows(rows) => {
                for row in rows {
                    let ctx = match row.items.first() {
                        Some(first) => self.ctx_for(first),
                        // Empty rows still resolve, against the group scope.
                        None => EvalContext {
                            sources: self.sources,
                            context_binding: None,
                            row_suffix: format!("{node_suffix}-{}", row.index),
                            components: &self.components,
                        },
                    };

                    row.group_expressions = Some(GroupExpressions {
                        hidden_row: self.bool_value("hiddenRow", &hidden_row, &ctx, false),
                        edit_button: self.bool_value("editButton", &edit.edit_button, &ctx, true),
                        delete_button: self.bool_value(
                            "deleteButton",
                            &edit.delete_button,
                            &ctx,
                            true,
                        ),
                        save_button: self.bool_value("saveButton", &edit.save_button, &ctx, true),
                        save_and_next_button: self.bool_value(
                            "saveAndNextButton",
                            &edit.save_and_next_button,
                            &ctx,
                            false,
                        ),
                        alert_on_delete: self.bool_value(
                            "alertOnDelete",
                            &edit.alert_on_delete,
                            &ctx,
                            false,
                        ),
                        text_resource_bindings: bindings
                            .iter()
                            .map(|(key, slot)| {
                                (
                                    key.clone(),
                                    self.string_value("textResourceBindings", slot, &ctx),
                                )
                            })
                            .collect(),
                    });

                    for child in &mut row.items {
                        self.pass_two(child);
                    }
                }
            }
        }
    }

    fn bool_value(
        &self,
        label: &'static str,
        slot: &ExprVal<bool>,
        ctx: &EvalContext<'_>,
        default: bool,
    ) -> bool {
        match slot {
            ExprVal::Value(v) => *v,
            ExprVal::Expr(expr) => {
                match evaluate(expr, ctx).and_then(|v| as_bool(label, &v)) {
                    Ok(v) => v,
                    Err(error) => {
                        warn!(property = label, %error, "expression failed, using default");
                        default
                    }
                }
            }
        }
    }

    fn resolve_bool(
        &self,
        label: &'static str,
        slot: &mut ExprVal<bool>,
        ctx: &EvalContext<'_>,
        default: bool,
    ) {
        *slot = ExprVal::Value(self.bool_value(label, slot, ctx, default));
    }

    fn string_value(
        &self,
        label: &'static str,
        slot: &ExprVal<String>,
        ctx: &EvalContext<'_>,
    ) -> String {
        match slot {
            ExprVal::Value(v) => v.clone(),
            ExprVal::Expr(expr) => {
                match evaluate(expr, ctx).and_then(|v| as_string(label, &v)) {
                    Ok(v) => v,
                    Err(error) => {
                        warn!(property = label, %error, "expression failed, using default");
                        String::new()
                    }
                }
            }
        }
    }

    fn resolve_string(
        &self,
        label: &'static str,
        slot: &mut ExprVal<String>,
        ctx: &EvalContext<'_>,
    ) {
        *slot = ExprVal::Value(self.string_value(label, slot, ctx));
    }
}
