//! Purpose: Internal JSON text decoding boundary used by the engine.
//! Exports: `parse` module with decode helpers and failure categories.
//! Role: Single seam for parser usage so callsites avoid ad hoc decode logic.
//! Invariants: Runtime JSON decoding goes through this module.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
