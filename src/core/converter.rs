//! Purpose: Pluggable converters and the ordered first-match lookup that selects one.
//! Exports: `Converter`, `WriteSession`, `ReadSession`, `ConverterHandle`, `ConverterRegistry`.
//! Role: Consulted before any contract-driven handling at every value boundary.
//! Invariants: Lookup is a linear scan in insertion order; the first claimant wins.
//! Invariants: A failing claim check propagates as `ConverterPredicate`; later converters are not asked.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::FormatPolicy;
use crate::core::node::Node;
use crate::core::type_key::TypeKey;

/// Write-side view of the running session handed to converters.
pub trait WriteSession {
    fn policy(&self) -> FormatPolicy;

    /// Writes a nested value through the full resolution chain.
    fn write_nested(&self, node: &Node) -> Result<Value, Error>;
}

/// Read-side view of the running session handed to converters.
pub trait ReadSession {
    fn policy(&self) -> FormatPolicy;

    /// Reads a nested value as `value_type` through the full resolution chain.
    fn read_nested(&self, value: &Value, value_type: TypeKey) -> Result<Node, Error>;
}

pub trait Converter: Send + Sync {
    fn name(&self) -> &str;

    /// Claim check. Any predicate is allowed, not only exact type identity.
    fn can_convert(&self, value_type: TypeKey) -> Result<bool, Error>;

    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    fn write(&self, node: &Node, session: &dyn WriteSession) -> Result<Value, Error>;

    fn read(&self, value: &Value, value_type: TypeKey, session: &dyn ReadSession)
    -> Result<Node, Error>;
}

/// The converter that claimed a type, with its position in the registry.
#[derive(Clone)]
pub struct ConverterHandle {
    index: usize,
    converter: Arc<dyn Converter>,
}

impl ConverterHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        self.converter.name()
    }

    pub fn converter(&self) -> &dyn Converter {
        self.converter.as_ref()
    }
}

impl fmt::Debug for ConverterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterHandle")
            .field("index", &self.index)
            .field("name", &self.name())
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: Vec<Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, converter: impl Converter + 'static) {
        self.converters.push(Arc::new(converter));
    }

    pub fn push_shared(&mut self, converter: Arc<dyn Converter>) {
        self.converters.push(converter);
    }

    /// Inserts at `index`, clamped to the end of the sequence.
    pub fn insert(&mut self, index: usize, converter: impl Converter + 'static) {
        let index = index.min(self.converters.len());
        self.converters.insert(index, Arc::new(converter));
    }

    /// Removes the first converter named `name`.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Converter>> {
        let index = self
            .converters
            .iter()
            .position(|converter| converter.name() == name)?;
        Some(self.converters.remove(index))
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Converter>> {
        self.converters.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|converter| converter.name()).collect()
    }

    pub fn resolve(&self, value_type: TypeKey) -> Result<Option<ConverterHandle>, Error> {
        for (index, converter) in self.converters.iter().enumerate() {
            let claimed = converter.can_convert(value_type).map_err(|err| {
                Error::new(ErrorKind::ConverterPredicate)
                    .with_message(format!("converter `{}` failed its claim check", converter.name()))
                    .with_type(value_type.name())
                    .with_source(err)
            })?;
            if claimed {
                trace!(converter = converter.name(), index, value_type = value_type.name(), "converter claimed type");
                return Ok(Some(ConverterHandle {
                    index,
                    converter: Arc::clone(converter),
                }));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
