//! Purpose: Reference orchestrator that drives the decision layer over a `Node` graph.
//! Exports: `Serializer`, `SerializerSettings`, `NullHandling`.
//! Role: Asks the converter registry first at every value boundary, then the type contract.
//! Invariants: Configuration is frozen when a `Serializer` is built; sessions only read it.
//! Invariants: Written text is produced into a rented buffer that is always released.
//! Notes: Token reading and emission are delegated to `serde_json`.

mod read;
mod resolver;
mod write;

use std::io::Write;
use std::sync::Arc;

use serde_json::Value;

use crate::core::buffer_pool::{ArrayPool, BucketPool};
use crate::core::catalog::{TypeCatalog, TypeDescriptor};
use crate::core::contract::{ConstructionPlan, OverrideTable, TypeContract, TypeContractOverride};
use crate::core::converter::{Converter, ConverterHandle, ConverterRegistry};
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{FormatPolicy, LayoutMode};
use crate::core::node::{Node, any_key};
use crate::core::type_key::TypeKey;
use crate::json::parse;

use resolver::ContractResolver;

pub const DEFAULT_MAX_DEPTH: usize = 64;
const INITIAL_TEXT_CAPACITY: usize = 256;

/// Whether null members are written (`Include`) or omitted (`Ignore`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NullHandling {
    #[default]
    Include,
    Ignore,
}

pub struct SerializerSettings {
    policy: FormatPolicy,
    converters: ConverterRegistry,
    catalog: TypeCatalog,
    overrides: OverrideTable,
    null_handling: NullHandling,
    max_depth: usize,
    detect_dates: bool,
    pool: Arc<dyn ArrayPool<u8>>,
}

impl Default for SerializerSettings {
    fn default() -> Self {
        Self {
            policy: FormatPolicy::default(),
            converters: ConverterRegistry::new(),
            catalog: TypeCatalog::new(),
            overrides: OverrideTable::new(),
            null_handling: NullHandling::Include,
            max_depth: DEFAULT_MAX_DEPTH,
            detect_dates: false,
            pool: Arc::new(BucketPool::<u8>::new()),
        }
    }
}

impl SerializerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: FormatPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Appends a converter; earlier converters take precedence.
    pub fn with_converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converters.push(converter);
        self
    }

    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    pub fn register_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.catalog.register(descriptor);
        self
    }

    pub fn override_type(mut self, key: TypeKey, entry: TypeContractOverride) -> Self {
        self.overrides.insert(key, entry);
        self
    }

    pub fn override_type_of<T: 'static>(self, entry: TypeContractOverride) -> Self {
        self.override_type(TypeKey::of::<T>(), entry)
    }

    pub fn with_null_handling(mut self, null_handling: NullHandling) -> Self {
        self.null_handling = null_handling;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Untyped strings in either date representation are read as instants.
    pub fn with_date_detection(mut self, enabled: bool) -> Self {
        self.detect_dates = enabled;
        self
    }

    pub fn with_pool(mut self, pool: Arc<dyn ArrayPool<u8>>) -> Self {
        self.pool = pool;
        self
    }
}

pub(crate) struct Shared {
    pub(crate) policy: FormatPolicy,
    pub(crate) converters: ConverterRegistry,
    pub(crate) resolver: ContractResolver,
    pub(crate) null_handling: NullHandling,
    pub(crate) max_depth: usize,
    pub(crate) detect_dates: bool,
    pool: Arc<dyn ArrayPool<u8>>,
}

/// Frozen configuration shared by any number of concurrent sessions.
#[derive(Clone)]
pub struct Serializer {
    shared: Arc<Shared>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(SerializerSettings::default())
    }
}

impl Serializer {
    pub fn new(settings: SerializerSettings) -> Self {
        let SerializerSettings {
            policy,
            converters,
            catalog,
            overrides,
            null_handling,
            max_depth,
            detect_dates,
            pool,
        } = settings;
        Self {
            shared: Arc::new(Shared {
                policy,
                converters,
                resolver: ContractResolver::new(catalog, overrides),
                null_handling,
                max_depth,
                detect_dates,
                pool,
            }),
        }
    }

    pub fn policy(&self) -> FormatPolicy {
        self.shared.policy
    }

    pub fn resolve_converter(&self, value_type: TypeKey) -> Result<Option<ConverterHandle>, Error> {
        self.shared.converters.resolve(value_type)
    }

    pub fn contract(&self, value_type: TypeKey) -> Result<Arc<TypeContract>, Error> {
        self.shared.resolver.contract(value_type)
    }

    pub fn construction_plan(&self, value_type: TypeKey) -> Result<ConstructionPlan, Error> {
        self.shared.resolver.construction_plan(value_type)
    }

    pub fn to_value(&self, node: &Node) -> Result<Value, Error> {
        write::write_node(&self.shared, node, 0)
    }

    pub fn to_string(&self, node: &Node) -> Result<String, Error> {
        let value = self.to_value(node)?;
        self.with_rendered(&value, |bytes| {
            std::str::from_utf8(bytes).map(str::to_owned).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("rendered JSON is not UTF-8")
                    .with_source(err)
            })
        })
    }

    pub fn write_to<W: Write>(&self, node: &Node, mut writer: W) -> Result<(), Error> {
        let value = self.to_value(node)?;
        self.with_rendered(&value, |bytes| {
            writer.write_all(bytes).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to write JSON output")
                    .with_source(err)
            })
        })
    }

    pub fn from_str(&self, text: &str, value_type: TypeKey) -> Result<Node, Error> {
        let value: Value = parse::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Syntax)
                .with_message("invalid JSON input")
                .with_hint(parse::hint_for_error(&err, "serializer input"))
                .with_source(err)
        })?;
        self.from_value(&value, value_type)
    }

    pub fn from_str_any(&self, text: &str) -> Result<Node, Error> {
        self.from_str(text, any_key())
    }

    pub fn from_value(&self, value: &Value, value_type: TypeKey) -> Result<Node, Error> {
        read::read_node(&self.shared, value, value_type, 0)
    }

    // Lays `value` out into a pooled buffer, hands the bytes to `sink`, then releases the buffer.
    fn with_rendered<R>(
        &self,
        value: &Value,
        sink: impl FnOnce(&[u8]) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let pool = &self.shared.pool;
        let mut buffer = pool.rent(INITIAL_TEXT_CAPACITY);
        buffer.clear();
        let rendered = match self.shared.policy.layout() {
            LayoutMode::Compact => serde_json::to_writer(&mut buffer, value),
            LayoutMode::Indented => serde_json::to_writer_pretty(&mut buffer, value),
        };
        let result = match rendered {
            Ok(()) => sink(&buffer),
            Err(err) => Err(Error::new(ErrorKind::Internal)
                .with_message("failed to lay out JSON text")
                .with_source(err)),
        };
        pool.release(buffer);
        result
    }
}
