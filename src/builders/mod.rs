//! Builders to construct producers from configuration.

pub mod producer_builder;

pub use producer_builder::ProducerBuilder;
