pub mod lookups;
pub mod model;
pub mod registry;
