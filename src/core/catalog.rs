// Explicit type metadata registration (members, constructors, natural shape).
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::contract::{ConstructorDescriptor, ContainerShape};
use crate::core::node::any_key;
use crate::core::type_key::TypeKey;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberDescriptor {
    name: String,
    value_type: TypeKey,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, value_type: TypeKey) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> TypeKey {
        self.value_type
    }
}

/// What the engine knows about a type before any override is applied.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    key: TypeKey,
    members: Vec<MemberDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
    natural_shape: ContainerShape,
    entry_type: TypeKey,
}

impl TypeDescriptor {
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            members: Vec::new(),
            constructors: Vec::new(),
            natural_shape: ContainerShape::Object,
            entry_type: any_key(),
        }
    }

    pub fn of<T: 'static>() -> Self {
        Self::new(TypeKey::of::<T>())
    }

    pub fn with_member(mut self, name: impl Into<String>, value_type: TypeKey) -> Self {
        self.members.push(MemberDescriptor::new(name, value_type));
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_shape(mut self, shape: ContainerShape) -> Self {
        self.natural_shape = shape;
        self
    }

    pub fn with_entry_type(mut self, entry_type: TypeKey) -> Self {
        self.entry_type = entry_type;
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|member| member.name == name)
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn natural_shape(&self) -> ContainerShape {
        self.natural_shape
    }

    pub fn entry_type(&self) -> TypeKey {
        self.entry_type
    }
}

#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    types: HashMap<TypeKey, Arc<TypeDescriptor>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `descriptor`, replacing an earlier one for the same type.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.key(), Arc::new(descriptor));
    }

    pub fn get(&self, key: &TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.types.get(key).cloned()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.types.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{TypeCatalog, TypeDescriptor};
    use crate::core::contract::ContainerShape;
    use crate::core::type_key::TypeKey;

    struct Inventory;

    #[test]
    fn register_replaces_previous_descriptor() {
        let mut catalog = TypeCatalog::new();
        catalog.register(TypeDescriptor::of::<Inventory>().with_member("sku", TypeKey::of::<String>()));
        catalog.register(
            TypeDescriptor::of::<Inventory>()
                .with_shape(ContainerShape::DictionaryLike)
                .with_entry_type(TypeKey::of::<i64>()),
        );

        assert_eq!(catalog.len(), 1);
        let descriptor = catalog.get(&TypeKey::of::<Inventory>()).expect("descriptor");
        assert!(descriptor.members().is_empty());
        assert_eq!(descriptor.natural_shape(), ContainerShape::DictionaryLike);
        assert_eq!(descriptor.entry_type(), TypeKey::of::<i64>());
    }
}
