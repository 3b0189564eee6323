pub mod binding;
pub mod error;
