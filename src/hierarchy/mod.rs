//! Node tree construction.
//!
//! [`generate`] turns the flat lookup tables into an unresolved node tree,
//! expanding repeating containers into one subtree per data row. [`merge`]
//! splices unchanged top-level nodes from a previous resolution into a new
//! one so downstream caches keyed on reference identity stay warm.

pub mod generate;
pub mod merge;
pub mod node;
