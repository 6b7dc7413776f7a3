//! Purpose: Extensibility and policy layer for JSON serialization of dynamic object graphs.
//! Exports: `api` (stable surface), `core` (decision layer), `engine` (reference orchestrator).
//! Role: Library backing the `jsoncontract` CLI and integration tests.
//! Invariants: Converters are consulted before contracts at every value boundary.
//! Invariants: Configuration is frozen once a `Serializer` is built.
pub mod api;
pub mod core;
pub mod engine;
pub(crate) mod json;
