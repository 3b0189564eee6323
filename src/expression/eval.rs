//! Tree-walking expression interpreter.
//!
//! The resolver hands each expression to [`evaluate`] together with an
//! [`EvalContext`] describing where in the tree the expression lives. The
//! interpreter is deliberately independent of the hierarchy types: the context
//! carries only the evaluation node's first data-model binding (for
//! transposing lookups into the right repeating row), its row suffix (for
//! relative `["component", ...]` lookups) and a flat binding index over the
//! generated tree.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::expression::ast::{CompareOp, Expr};
use crate::foundation::binding::DataBinding;
use crate::resolve::sources::DataSources;

#[derive(thiserror::Error, Debug)]
pub enum ExprError {
    #[error("'{func}' expected a {expected}, got {got}")]
    Type {
        func: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error("unknown instance context key '{0}'")]
    UnknownInstanceContextKey(String),

    #[error("unknown auth context key '{0}'")]
    UnknownAuthContextKey(String),
}

/// Where the `simpleBinding` of a generated node points, with row indices
/// already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentBindingInfo {
    pub data_type: String,
    pub field: String,
}

pub struct EvalContext<'a> {
    pub sources: &'a DataSources<'a>,
    /// The context node's first data-model binding (data type + parsed path,
    /// row indices applied). Lookups into the same data type are transposed
    /// through it.
    pub context_binding: Option<(String, DataBinding)>,
    /// Row suffix of the context node's id (e.g. `-0-1`), empty outside
    /// repeating rows. Used to prefer the sibling instance of a component.
    pub row_suffix: String,
    /// `simpleBinding` targets per generated node id.
    pub components: &'a BTreeMap<String, ComponentBindingInfo>,
}

pub fn evaluate(expr: &Expr, ctx: &EvalContext<'_>) -> Result<Value, ExprError> {
    match expr {
        Expr::Lit(v) => Ok(v.clone()),

        Expr::DataModel { path, data_type } => {
            let path = as_string("dataModel", &evaluate(path, ctx)?)?;
            let data_type = data_type
                .as_deref()
                .unwrap_or(ctx.sources.default_data_type);
            Ok(lookup_data(ctx, data_type, &path))
        }

        Expr::Component(id) => {
            let id = as_string("component", &evaluate(id, ctx)?)?;
            Ok(lookup_component(ctx, &id))
        }

        Expr::InstanceContext(key) => {
            let Some(instance) = ctx.sources.instance else {
                return Ok(Value::Null);
            };
            match key.as_str() {
                "instanceId" => Ok(Value::from(instance.instance_id.as_str())),
                "instanceOwnerPartyId" => {
                    Ok(Value::from(instance.instance_owner_party_id.as_str()))
                }
                "appId" => Ok(Value::from(instance.app_id.as_str())),
                other => Err(ExprError::UnknownInstanceContextKey(other.to_owned())),
            }
        }

        Expr::AuthContext(key) => {
            let Some(auth) = ctx.sources.auth else {
                return Ok(Value::Null);
            };
            match key.as_str() {
                "canRead" => Ok(Value::from(auth.can_read)),
                "canWrite" => Ok(Value::from(auth.can_write)),
                "canInstantiate" => Ok(Value::from(auth.can_instantiate)),
                other => Err(ExprError::UnknownAuthContextKey(other.to_owned())),
            }
        }

        Expr::Language => Ok(Value::from(ctx.sources.language)),

        Expr::If {
            cond,
            then,
            otherwise,
        } => {
            if as_bool("if", &evaluate(cond, ctx)?)? {
                evaluate(then, ctx)
            } else if let Some(e) = otherwise {
                evaluate(e, ctx)
            } else {
                Ok(Value::Null)
            }
        }

        Expr::Not(inner) => Ok(Value::from(!as_bool("not", &evaluate(inner, ctx)?)?)),

        Expr::And(items) => {
            for item in items {
                if !as_bool("and", &evaluate(item, ctx)?)? {
                    return Ok(Value::from(false));
                }
            }
            Ok(Value::from(true))
        }

        Expr::Or(items) => {
            for item in items {
                if as_bool("or", &evaluate(item, ctx)?)? {
                    return Ok(Value::from(true));
                }
            }
            Ok(Value::from(false))
        }

        Expr::Compare { op, left, right } => {
            let l = evaluate(left, ctx)?;
            let r = evaluate(right, ctx)?;
            compare(*op, &l, &r).map(Value::from)
        }

        Expr::Concat(items) => {
            let mut out = String::new();
            for item in items {
                out.push_str(&as_string("concat", &evaluate(item, ctx)?)?);
            }
            Ok(Value::from(out))
        }
    }
}

fn lookup_data(ctx: &EvalContext<'_>, data_type: &str, path: &str) -> Value {
    let path = match &ctx.context_binding {
        Some((ctx_type, binding)) if ctx_type == data_type => binding.transpose(path),
        _ => path.to_owned(),
    };
    ctx.sources
        .form_data
        .value_at(data_type, &path)
        .cloned()
        .unwrap_or(Value::Null)
}

fn lookup_component(ctx: &EvalContext<'_>, id: &str) -> Value {
    // Prefer the sibling instance inside the same repeating row.
    let sibling = format!("{id}{}", ctx.row_suffix);
    let (target_id, info) = if let Some(info) = ctx.components.get(&sibling) {
        (sibling, info)
    } else if let Some(info) = ctx.components.get(id) {
        (id.to_owned(), info)
    } else {
        debug!(component = id, "component lookup found no target, yielding null");
        return Value::Null;
    };

    // Hidden components never contribute values to expressions.
    if ctx.sources.is_hidden(&target_id) || ctx.sources.is_hidden(id) {
        return Value::Null;
    }

    ctx.sources
        .form_data
        .value_at(&info.data_type, &info.field)
        .cloned()
        .unwrap_or(Value::Null)
}

fn compare(op: CompareOp, l: &Value, r: &Value) -> Result<bool, ExprError> {
    match op {
        CompareOp::Equals => Ok(loose_eq(l, r)),
        CompareOp::NotEquals => Ok(!loose_eq(l, r)),
        ordering => {
            if l.is_null() || r.is_null() {
                return Ok(false);
            }
            let (Some(l), Some(r)) = (l.as_f64(), r.as_f64()) else {
                return Err(ExprError::Type {
                    func: ordering.as_str(),
                    expected: "number",
                    got: format!("{l} / {r}"),
                });
            };
            Ok(match ordering {
                CompareOp::GreaterThan => l > r,
                CompareOp::GreaterThanEq => l >= r,
                CompareOp::LessThan => l < r,
                CompareOp::LessThanEq => l <= r,
                CompareOp::Equals | CompareOp::NotEquals => unreachable!(),
            })
        }
    }
}

fn loose_eq(l: &Value, r: &Value) -> bool {
    match (l.as_f64(), r.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => l == r,
    }
}

/// Boolean coercion used by the interpreter and by the resolver when writing
/// evaluated values back onto boolean item properties.
pub fn as_bool(func: &'static str, v: &Value) -> Result<bool, ExprError> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(ExprError::Type {
            func,
            expected: "boolean",
            got: other.to_string(),
        }),
    }
}

/// String coercion; null becomes the empty string.
pub fn as_string(func: &'static str, v: &Value) -> Result<String, ExprError> {
    match v {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ExprError::Type {
            func,
            expected: "scalar",
            got: other.to_string(),
        }),
    }
}
