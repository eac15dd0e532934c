//! Dependency ordering and reference resolution.
//!
//! This module holds the machinery between a composed [`Stack`](crate::stack::Stack) and
//! its synthesized document:
//!
//! - [`DependencyGraph`] - edges from references and `dependsOn`, cycle detection,
//!   deterministic topological order and levels
//! - [`ResolvedAttributes`] - write-once cache of computed attributes
//! - [`ProducerRegistry`] / [`AttributeProducer`] - per-type attribute computation
//! - [`ReferenceResolver`] - turns a node's values into literals
//!
//! # Resolution Order
//!
//! ```text
//! key ──────┐
//!           ▼
//! bucket ◄── references key.arn
//!   ▲
//! policy ◄── references bucket.name, bucket.arn
//! ```
//!
//! The graph above yields levels `[key]`, `[bucket]`, `[policy]`. Nodes in one level
//! never reference each other, so they may be resolved concurrently as long as the
//! attributes of level `k` are committed before level `k + 1` starts.

pub mod attributes;
pub mod dependency_graph;
pub mod producers;
pub mod reference_resolver;

pub use attributes::ResolvedAttributes;
pub use dependency_graph::DependencyGraph;
pub use producers::{AttributeProducer, ProducerInput, ProducerRegistry};
pub use reference_resolver::{ReferenceResolver, ResolvedNode};
