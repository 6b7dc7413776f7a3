//! Purpose: Define the stable public Rust API boundary for jsoncontract.
//! Exports: Contract, converter, policy, pool and serializer types needed by callers and the CLI.
//! Role: Public, additive-only surface; hides the parse boundary and engine internals.
//! Invariants: This module is the only public path callers should depend on.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::buffer_pool::{ArrayPool, BucketPool, FreshPool, PoolStats};
pub use crate::core::catalog::{MemberDescriptor, TypeCatalog, TypeDescriptor};
pub use crate::core::contract::{
    BoundArgument, ConstructionPlan, ConstructorArgs, ConstructorDescriptor, ContainerShape,
    IMPLICIT_CONSTRUCTOR, OverrideTable, ParameterBinding, PlanSource, TypeContract,
    TypeContractOverride, default_constructor, resolve_construction,
};
pub use crate::core::converter::{
    Converter, ConverterHandle, ConverterRegistry, ReadSession, WriteSession,
};
pub use crate::core::decimal::ExactDecimal;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::format::{DateRepresentation, FloatParseTarget, FormatPolicy, LayoutMode};
pub use crate::core::leaf::{FloatValue, parse_date, parse_float_literal, render_date};
pub use crate::core::member::{Direction, Inclusion, MemberContract, MemberMode, MemberOverride};
pub use crate::core::node::{Entries, Node, ObjectNode, any_key, list_key, map_key};
pub use crate::core::type_key::TypeKey;
pub use crate::engine::{DEFAULT_MAX_DEPTH, NullHandling, Serializer, SerializerSettings};
