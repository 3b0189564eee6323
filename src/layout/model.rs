//! Boundary model for raw layout definitions.
//!
//! These types mirror the declarative JSON layout files. Expression-capable
//! properties are [`ExprVal`]s: a concrete value, or an expression resolved
//! against live data during the resolution pass.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::expression::ast::Expr;

/// A property that is either a concrete value or an unresolved expression.
///
/// JSON arrays deserialize as expressions; everything else as the value type.
/// After resolution every `ExprVal` on a node's item is `Value(..)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExprVal<T> {
    Value(T),
    Expr(Expr),
}

impl<T> ExprVal<T> {
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Expr(_) => None,
        }
    }

    pub fn is_expr(&self) -> bool {
        matches!(self, Self::Expr(_))
    }
}

impl ExprVal<bool> {
    /// The resolved value, or `default` when still unresolved.
    pub fn value_or(&self, default: bool) -> bool {
        match self {
            Self::Value(v) => *v,
            Self::Expr(_) => default,
        }
    }
}

impl<T: Default> Default for ExprVal<T> {
    fn default() -> Self {
        Self::Value(T::default())
    }
}

impl<'de, T: serde::de::DeserializeOwned> Deserialize<'de> for ExprVal<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        if raw.is_array() {
            Expr::from_value(&raw).map(Self::Expr).map_err(D::Error::custom)
        } else {
            T::deserialize(raw).map(Self::Value).map_err(D::Error::custom)
        }
    }
}

/// A reference from a component property into a named data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingDef {
    pub data_type: String,
    pub field: String,
}

/// Responsive column widths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xs: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xl: Option<u8>,
}

/// Group edit configuration, including the per-row button flags that are
/// resolved once per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEditDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<EditModeDef>,
    #[serde(default)]
    pub multi_page: bool,
    #[serde(default = "expr_true")]
    pub edit_button: ExprVal<bool>,
    #[serde(default = "expr_true")]
    pub delete_button: ExprVal<bool>,
    #[serde(default = "expr_true")]
    pub save_button: ExprVal<bool>,
    #[serde(default)]
    pub save_and_next_button: ExprVal<bool>,
    #[serde(default)]
    pub alert_on_delete: ExprVal<bool>,
}

impl Default for GroupEditDef {
    fn default() -> Self {
        Self {
            mode: None,
            multi_page: false,
            edit_button: expr_true(),
            delete_button: expr_true(),
            save_button: expr_true(),
            save_and_next_button: ExprVal::default(),
            alert_on_delete: ExprVal::default(),
        }
    }
}

fn expr_true() -> ExprVal<bool> {
    ExprVal::Value(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditModeDef {
    ShowTable,
    OnlyTable,
    HideTable,
    ShowAll,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumnDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_expanded_edit: Option<bool>,
}

/// A raw, declarative component definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_model_bindings: BTreeMap<String, BindingDef>,

    /// Child ids for containers; `"{pageIndex}:{childId}"` entries for
    /// multi-page containers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,

    #[serde(default)]
    pub hidden: ExprVal<bool>,
    #[serde(default)]
    pub required: ExprVal<bool>,
    #[serde(default)]
    pub read_only: ExprVal<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub text_resource_bindings: BTreeMap<String, ExprVal<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridDef>,

    /// Query-parameter style mapping; keys and values may carry depth-relative
    /// index placeholders (`someField.[{0}].other`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mapping: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<GroupEditDef>,

    /// Row-scoped: whether a specific row is hidden.
    #[serde(default)]
    pub hidden_row: ExprVal<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub table_columns: BTreeMap<String, TableColumnDef>,
}

impl ComponentDef {
    /// The group's own array binding, by convention named `group`.
    pub fn group_binding(&self) -> Option<&BindingDef> {
        self.data_model_bindings.get("group")
    }

    pub fn multi_page(&self) -> bool {
        self.edit.as_ref().is_some_and(|e| e.multi_page)
    }
}

/// A full layout set: page key → ordered component list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSetDef {
    pub pages: BTreeMap<String, Vec<ComponentDef>>,
}

impl LayoutSetDef {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Splits a declared child reference into its optional multi-page index and
/// the child id. `"1:address"` → `(Some(1), "address")` when the container
/// supports sub-paging; otherwise the reference is taken verbatim.
pub fn parse_child_ref(raw: &str, multi_page: bool) -> (Option<usize>, &str) {
    if multi_page {
        if let Some((prefix, id)) = raw.split_once(':') {
            if let Ok(page_index) = prefix.parse::<usize>() {
                return (Some(page_index), id);
            }
        }
    }
    (None, raw)
}
