//! Concrete [`Provider`](crate::registry::Provider) implementations.

pub mod default_provider;

pub use default_provider::DefaultProvider;
