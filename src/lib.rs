//! Formwork materializes declarative form layouts into stable, fully
//! resolved node trees.
//!
//! The pipeline is a pure, synchronous computation the host invokes whenever
//! an input changes:
//!
//! - Build flat [`layout::lookups::LookupTables`] over the raw layout set,
//!   settling parent/child claims.
//! - Generate the unresolved tree, expanding repeating containers into one
//!   subtree per data row ([`hierarchy::generate`]).
//! - Resolve every expression-valued property against live data, whole tree
//!   first, then once per repeating row ([`resolve::resolver`]).
//! - Merge with the previous tree so unchanged top-level nodes keep their
//!   reference identity ([`hierarchy::merge`]).
//!
//! [`resolve_layout_set`] runs the whole pipeline; the stages are public for
//! hosts and tooling that only need part of it.
#![forbid(unsafe_code)]

pub mod expression;
pub mod foundation;
pub mod hierarchy;
pub mod layout;
pub mod resolve;
pub mod validation;

pub use crate::expression::ast::{CompareOp, Expr};
pub use crate::foundation::binding::DataBinding;
pub use crate::foundation::error::{FormworkError, FormworkResult};
pub use crate::hierarchy::merge::merge_resolved;
pub use crate::hierarchy::node::{
    GroupExpressions, LayoutNode, NodeChildren, PageTree, ResolvedPages, Row,
};
pub use crate::layout::lookups::{LookupTables, ParentRef, StructuralProblem, build_lookups};
pub use crate::layout::model::{ComponentDef, ExprVal, LayoutSetDef};
pub use crate::layout::registry::ComponentRegistry;
pub use crate::resolve::pipeline::{DroppedRow, ResolveOutput, resolve_layout_set};
pub use crate::resolve::sources::{DataSources, FormData};
pub use crate::validation::{DataModelSchema, SchemaType, ValidationIssue, ValidationOutput};
