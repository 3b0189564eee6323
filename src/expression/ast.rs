//! Expression AST.
//!
//! Layout files carry expressions in a JSON array form where the first element
//! names the operation: `["equals", ["dataModel", "Model.Field"], "yes"]`.
//! They are parsed into a tagged variant tree at deserialization time and
//! evaluated by the tree-walking interpreter in [`super::eval`].

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Any non-array JSON value.
    Lit(Value),
    /// `["dataModel", path]` or `["dataModel", path, dataType]`.
    DataModel {
        path: Box<Expr>,
        data_type: Option<String>,
    },
    /// `["component", id]` — the value bound to another component's
    /// `simpleBinding`, or null when that component is hidden.
    Component(Box<Expr>),
    /// `["instanceContext", key]`
    InstanceContext(String),
    /// `["authContext", key]`
    AuthContext(String),
    /// `["language"]`
    Language,
    /// `["if", cond, then]` or `["if", cond, then, "else", otherwise]`.
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Concat(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanEq,
    LessThan,
    LessThanEq,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanEq => "greaterThanEq",
            Self::LessThan => "lessThan",
            Self::LessThanEq => "lessThanEq",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExprParseError {
    #[error("expression array is empty")]
    EmptyArray,

    #[error("expression operation must be a string, got {0}")]
    NonStringOp(String),

    #[error("unknown expression function '{0}'")]
    UnknownFunction(String),

    #[error("'{func}' expects {expected} argument(s), got {got}")]
    BadArity {
        func: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("'{func}' expects a string argument")]
    NonStringArg { func: &'static str },
}

impl Expr {
    pub fn from_value(v: &Value) -> Result<Self, ExprParseError> {
        let Value::Array(items) = v else {
            return Ok(Self::Lit(v.clone()));
        };
        let Some((op, args)) = items.split_first() else {
            return Err(ExprParseError::EmptyArray);
        };
        let Value::String(op) = op else {
            return Err(ExprParseError::NonStringOp(op.to_string()));
        };

        let sub = |v: &Value| Self::from_value(v).map(Box::new);
        let sub_all = |args: &[Value]| args.iter().map(Self::from_value).collect::<Result<Vec<_>, _>>();

        match op.as_str() {
            "dataModel" => match args {
                [path] => Ok(Self::DataModel {
                    path: sub(path)?,
                    data_type: None,
                }),
                [path, Value::String(dt)] => Ok(Self::DataModel {
                    path: sub(path)?,
                    data_type: Some(dt.clone()),
                }),
                _ => Err(ExprParseError::BadArity {
                    func: "dataModel",
                    expected: "1 or 2",
                    got: args.len(),
                }),
            },
            "component" => match args {
                [id] => Ok(Self::Component(sub(id)?)),
                _ => Err(ExprParseError::BadArity {
                    func: "component",
                    expected: "1",
                    got: args.len(),
                }),
            },
            "instanceContext" => match args {
                [Value::String(key)] => Ok(Self::InstanceContext(key.clone())),
                [_] => Err(ExprParseError::NonStringArg {
                    func: "instanceContext",
                }),
                _ => Err(ExprParseError::BadArity {
                    func: "instanceContext",
                    expected: "1",
                    got: args.len(),
                }),
            },
            "authContext" => match args {
                [Value::String(key)] => Ok(Self::AuthContext(key.clone())),
                [_] => Err(ExprParseError::NonStringArg { func: "authContext" }),
                _ => Err(ExprParseError::BadArity {
                    func: "authContext",
                    expected: "1",
                    got: args.len(),
                }),
            },
            "language" => {
                if args.is_empty() {
                    Ok(Self::Language)
                } else {
                    Err(ExprParseError::BadArity {
                        func: "language",
                        expected: "0",
                        got: args.len(),
                    })
                }
            }
            "if" => match args {
                [cond, then] => Ok(Self::If {
                    cond: sub(cond)?,
                    then: sub(then)?,
                    otherwise: None,
                }),
                [cond, then, Value::String(kw), otherwise] if kw == "else" => Ok(Self::If {
                    cond: sub(cond)?,
                    then: sub(then)?,
                    otherwise: Some(sub(otherwise)?),
                }),
                _ => Err(ExprParseError::BadArity {
                    func: "if",
                    expected: "2, or 4 with an 'else' keyword",
                    got: args.len(),
                }),
            },
            "not" => match args {
                [inner] => Ok(Self::Not(sub(inner)?)),
                _ => Err(ExprParseError::BadArity {
                    func: "not",
                    expected: "1",
                    got: args.len(),
                }),
            },
            "and" => Ok(Self::And(sub_all(args)?)),
            "or" => Ok(Self::Or(sub_all(args)?)),
            "concat" => Ok(Self::Concat(sub_all(args)?)),
            op @ ("equals" | "notEquals" | "greaterThan" | "greaterThanEq" | "lessThan"
            | "lessThanEq") => {
                let cmp = match op {
                    "equals" => CompareOp::Equals,
                    "notEquals" => CompareOp::NotEquals,
                    "greaterThan" => CompareOp::GreaterThan,
                    "greaterThanEq" => CompareOp::GreaterThanEq,
                    "lessThan" => CompareOp::LessThan,
                    _ => CompareOp::LessThanEq,
                };
                match args {
                    [left, right] => Ok(Self::Compare {
                        op: cmp,
                        left: sub(left)?,
                        right: sub(right)?,
                    }),
                    _ => Err(ExprParseError::BadArity {
                        func: cmp.as_str(),
                        expected: "2",
                        got: args.len(),
                    }),
                }
            }
            other => Err(ExprParseError::UnknownFunction(other.to_owned())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Lit(v) => v.clone(),
            Self::DataModel { path, data_type } => {
                let mut arr = vec![Value::from("dataModel"), path.to_value()];
                if let Some(dt) = data_type {
                    arr.push(Value::from(dt.as_str()));
                }
                Value::Array(arr)
            }
            Self::Component(id) => Value::Array(vec![Value::from("component"), id.to_value()]),
            Self::InstanceContext(key) => {
                Value::Array(vec![Value::from("instanceContext"), Value::from(key.as_str())])
            }
            Self::AuthContext(key) => {
                Value::Array(vec![Value::from("authContext"), Value::from(key.as_str())])
            }
            Self::Language => Value::Array(vec![Value::from("language")]),
            Self::If {
                cond,
                then,
                otherwise,
            } => {
                let mut arr = vec![Value::from("if"), cond.to_value(), then.to_value()];
                if let Some(e) = otherwise {
                    arr.push(Value::from("else"));
                    arr.push(e.to_value());
                }
                Value::Array(arr)
            }
            Self::Not(inner) => Value::Array(vec![Value::from("not"), inner.to_value()]),
            Self::And(items) => variadic_to_value("and", items),
            Self::Or(items) => variadic_to_value("or", items),
            Self::Concat(items) => variadic_to_value("concat", items),
            Self::Compare { op, left, right } => Value::Array(vec![
                Value::from(op.as_str()),
                left.to_value(),
                right.to_value(),
            ]),
        }
    }
}

fn variadic_to_value(op: &str, items: &[Expr]) -> Value {
    let mut arr = vec![Value::from(op)];
    arr.extend(items.iter().map(Expr::to_value));
    Value::Array(arr)
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        Self::from_value(&v).map_err(D::Error::custom)
    }
}

impl Serialize for Expr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}
