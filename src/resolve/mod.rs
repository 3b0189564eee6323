pub mod pipeline;
pub mod resolver;
pub mod sources;
