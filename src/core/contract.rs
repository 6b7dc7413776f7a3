//! Purpose: Per-type override descriptors and the decisions they drive (shape, members, construction).
//! Exports: `ContainerShape`, `TypeContractOverride`, `OverrideTable`, `TypeContract`,
//! `ConstructorDescriptor`, `ConstructorArgs`, `ConstructionPlan`, `resolve_construction`.
//! Role: Merges catalog metadata with explicit overrides into one `TypeContract` per type.
//! Invariants: A preferred constructor is used verbatim or resolution fails; no fallback.
//! Invariants: Container shape picks exactly one strategy per type (members or entries).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::core::catalog::TypeDescriptor;
use crate::core::error::{Error, ErrorKind};
use crate::core::member::{Direction, Inclusion, MemberContract, MemberMode, MemberOverride};
use crate::core::node::{Node, ObjectNode};
use crate::core::type_key::TypeKey;

pub const IMPLICIT_CONSTRUCTOR: &str = "default";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ContainerShape {
    /// Named members, written as a JSON object.
    #[default]
    Object,
    /// Key/value entries, written as a JSON object; members are ignored.
    DictionaryLike,
    /// Ordered elements, written as a JSON array; members are ignored.
    ListLike,
}

impl ContainerShape {
    pub fn enumerates_entries(self) -> bool {
        !matches!(self, ContainerShape::Object)
    }
}

#[derive(Clone, Debug)]
pub struct BoundArgument {
    pub parameter: String,
    pub member: String,
    pub value: Node,
}

/// Arguments handed to a constructor factory, in parameter order.
#[derive(Clone, Debug)]
pub struct ConstructorArgs {
    type_key: TypeKey,
    values: Vec<BoundArgument>,
}

impl ConstructorArgs {
    pub fn new(type_key: TypeKey, values: Vec<BoundArgument>) -> Self {
        Self { type_key, values }
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn get(&self, parameter: &str) -> Option<&Node> {
        self.values
            .iter()
            .find(|arg| arg.parameter == parameter)
            .map(|arg| &arg.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundArgument> {
        self.values.iter()
    }

    pub fn into_values(self) -> Vec<BoundArgument> {
        self.values
    }
}

pub type ConstructorFactory =
    Arc<dyn Fn(ConstructorArgs) -> Result<ObjectNode, Error> + Send + Sync>;

#[derive(Clone)]
pub struct ConstructorDescriptor {
    name: String,
    parameters: Vec<String>,
    factory: Option<ConstructorFactory>,
}

impl ConstructorDescriptor {
    pub fn new<I, S>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            factory: None,
        }
    }

    pub fn parameterless(name: impl Into<String>) -> Self {
        Self::new(name, Vec::<String>::new())
    }

    pub fn implicit_default() -> Self {
        Self::parameterless(IMPLICIT_CONSTRUCTOR)
    }

    /// Replaces the default factory, which assigns each argument to its bound member.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(ConstructorArgs) -> Result<ObjectNode, Error> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn is_parameterless(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn construct(&self, args: ConstructorArgs) -> Result<ObjectNode, Error> {
        let mut node = match &self.factory {
            Some(factory) => factory(args)?,
            None => {
                let mut node = ObjectNode::new(args.type_key());
                for arg in args.into_values() {
                    node.set_member(arg.member, arg.value);
                }
                node
            }
        };
        node.set_constructed_by(self.name.clone());
        Ok(node)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("custom_factory", &self.factory.is_some())
            .finish()
    }
}

/// Explicit per-type override, held in a side table keyed by `TypeKey`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TypeContractOverride {
    preferred_constructor: Option<String>,
    container_shape: Option<ContainerShape>,
    member_mode: MemberMode,
    members: BTreeMap<String, MemberOverride>,
}

impl TypeContractOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constructor(mut self, name: impl Into<String>) -> Self {
        self.preferred_constructor = Some(name.into());
        self
    }

    pub fn with_shape(mut self, shape: ContainerShape) -> Self {
        self.container_shape = Some(shape);
        self
    }

    pub fn opt_in(mut self) -> Self {
        self.member_mode = MemberMode::OptIn;
        self
    }

    pub fn ignore(mut self, member: impl Into<String>) -> Self {
        self.members.entry(member.into()).or_default().inclusion = Some(Inclusion::Ignore);
        self
    }

    pub fn include(mut self, member: impl Into<String>) -> Self {
        self.members.entry(member.into()).or_default().inclusion = Some(Inclusion::Include);
        self
    }

    pub fn rename(mut self, member: impl Into<String>, serialized_name: impl Into<String>) -> Self {
        self.members.entry(member.into()).or_default().rename = Some(serialized_name.into());
        self
    }

    pub fn preferred_constructor(&self) -> Option<&str> {
        self.preferred_constructor.as_deref()
    }

    pub fn container_shape(&self) -> Option<ContainerShape> {
        self.container_shape
    }

    pub fn member_mode(&self) -> MemberMode {
        self.member_mode
    }

    pub fn member(&self, name: &str) -> Option<&MemberOverride> {
        self.members.get(name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct OverrideTable {
    entries: HashMap<TypeKey, TypeContractOverride>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the override for `key`, replacing any earlier one.
    pub fn insert(&mut self, key: TypeKey, entry: TypeContractOverride) {
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &TypeKey) -> Option<&TypeContractOverride> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolved strategy for one type: shape, member contracts, and constructor candidates.
#[derive(Clone, Debug)]
pub struct TypeContract {
    key: TypeKey,
    shape: ContainerShape,
    members: Vec<MemberContract>,
    entry_type: TypeKey,
    constructors: Vec<ConstructorDescriptor>,
    preferred_constructor: Option<String>,
}

impl TypeContract {
    pub fn build(
        descriptor: &TypeDescriptor,
        type_override: Option<&TypeContractOverride>,
    ) -> Result<Self, Error> {
        let key = descriptor.key();
        if let Some(entry) = type_override {
            if let Some(unknown) = entry
                .members
                .keys()
                .find(|name| descriptor.member(name).is_none())
            {
                return Err(Error::new(ErrorKind::ContractViolation)
                    .with_message("override names a member the type does not declare")
                    .with_type(key.name())
                    .with_member(unknown.clone()));
            }
        }

        let mode = type_override.map(|entry| entry.member_mode()).unwrap_or_default();
        let members: Vec<MemberContract> = descriptor
            .members()
            .iter()
            .map(|member| {
                MemberContract::resolved(
                    member.name(),
                    member.value_type(),
                    mode,
                    type_override.and_then(|entry| entry.member(member.name())),
                )
            })
            .collect();

        let mut seen = HashMap::new();
        for member in members.iter().filter(|member| member.is_included()) {
            if let Some(previous) = seen.insert(member.serialized_name(), member.name()) {
                return Err(Error::new(ErrorKind::ContractViolation)
                    .with_message(format!(
                        "members `{previous}` and `{}` share the serialized name `{}`",
                        member.name(),
                        member.serialized_name()
                    ))
                    .with_type(key.name())
                    .with_member(member.name()));
            }
        }

        let shape = type_override
            .and_then(|entry| entry.container_shape())
            .unwrap_or(descriptor.natural_shape());

        Ok(Self {
            key,
            shape,
            members,
            entry_type: descriptor.entry_type(),
            constructors: descriptor.constructors().to_vec(),
            preferred_constructor: type_override
                .and_then(|entry| entry.preferred_constructor())
                .map(str::to_string),
        })
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn shape(&self) -> ContainerShape {
        self.shape
    }

    pub fn members(&self) -> &[MemberContract] {
        &self.members
    }

    pub fn included_members(&self, direction: Direction) -> impl Iterator<Item = &MemberContract> {
        self.members
            .iter()
            .filter(move |member| member.should_include(direction))
    }

    pub fn member(&self, name: &str) -> Option<&MemberContract> {
        self.members.iter().find(|member| member.name() == name)
    }

    /// Declared type of dictionary values or list elements.
    pub fn entry_type(&self) -> TypeKey {
        self.entry_type
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn preferred_constructor(&self) -> Option<&str> {
        self.preferred_constructor.as_deref()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanSource {
    Override,
    Heuristic,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParameterBinding {
    pub parameter: String,
    pub member: String,
}

#[derive(Clone, Debug)]
pub struct ConstructionPlan {
    constructor: ConstructorDescriptor,
    source: PlanSource,
    bindings: Vec<ParameterBinding>,
}

impl ConstructionPlan {
    pub fn constructor(&self) -> &ConstructorDescriptor {
        &self.constructor
    }

    pub fn source(&self) -> PlanSource {
        self.source
    }

    pub fn bindings(&self) -> &[ParameterBinding] {
        &self.bindings
    }

    pub fn binds_member(&self, member: &str) -> bool {
        self.bindings.iter().any(|binding| binding.member == member)
    }
}

/// Picks the constructor for `contract`; an explicit preference short-circuits the heuristic.
pub fn resolve_construction(contract: &TypeContract) -> Result<ConstructionPlan, Error> {
    let (constructor, source) = match contract.preferred_constructor() {
        Some(name) => {
            let constructor = contract
                .constructors()
                .iter()
                .find(|candidate| candidate.name() == name)
                .cloned()
                .ok_or_else(|| {
                    Error::new(ErrorKind::ContractViolation)
                        .with_message(format!(
                            "preferred constructor `{name}` is not among the type's constructors"
                        ))
                        .with_type(contract.key().name())
                })?;
            (constructor, PlanSource::Override)
        }
        None => (default_constructor(contract)?, PlanSource::Heuristic),
    };

    let bindings = bind_parameters(contract, &constructor)?;
    Ok(ConstructionPlan {
        constructor,
        source,
        bindings,
    })
}

/// Parameterless first, then a sole constructor, then the implicit default when none exist.
pub fn default_constructor(contract: &TypeContract) -> Result<ConstructorDescriptor, Error> {
    let constructors = contract.constructors();
    if let Some(parameterless) = constructors.iter().find(|ctor| ctor.is_parameterless()) {
        return Ok(parameterless.clone());
    }
    match constructors {
        [] => Ok(ConstructorDescriptor::implicit_default()),
        [only] => Ok(only.clone()),
        _ => Err(Error::new(ErrorKind::ContractViolation)
            .with_message(format!(
                "{} constructors and none is parameterless; mark a preferred constructor",
                constructors.len()
            ))
            .with_type(contract.key().name())),
    }
}

fn bind_parameters(
    contract: &TypeContract,
    constructor: &ConstructorDescriptor,
) -> Result<Vec<ParameterBinding>, Error> {
    constructor
        .parameters()
        .iter()
        .map(|parameter| {
            contract
                .included_members(Direction::Read)
                .find(|member| {
                    member.name().eq_ignore_ascii_case(parameter)
                        || member.serialized_name().eq_ignore_ascii_case(parameter)
                })
                .map(|member| ParameterBinding {
                    parameter: parameter.clone(),
                    member: member.name().to_string(),
                })
                .ok_or_else(|| {
                    Error::new(ErrorKind::ContractViolation)
                        .with_message(format!(
                            "constructor `{}` parameter `{parameter}` matches no included member",
                            constructor.name()
                        ))
                        .with_type(contract.key().name())
                        .with_member(parameter.clone())
                })
        })
        .collect()
}
