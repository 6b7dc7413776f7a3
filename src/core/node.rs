//! Purpose: Dynamic object graph walked by the engine on both paths.
//! Exports: `Node`, `ObjectNode`, `Entries`, builtin type keys.
//! Role: In-memory side of a session; JSON text never appears here.
//! Invariants: Every node reports a `TypeKey`; objects carry their declared type.
//! Invariants: `Entries` is the entry enumeration used by dictionary-like and list-like shapes.

use time::OffsetDateTime;

use crate::core::decimal::ExactDecimal;
use crate::core::type_key::TypeKey;

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(ExactDecimal),
    Str(String),
    Instant(OffsetDateTime),
    List(Vec<Node>),
    Map(Vec<(String, Node)>),
    Object(ObjectNode),
}

/// Key for positions that accept any JSON value.
pub fn any_key() -> TypeKey {
    TypeKey::of::<Node>()
}

pub fn list_key() -> TypeKey {
    TypeKey::of::<Vec<Node>>()
}

pub fn map_key() -> TypeKey {
    TypeKey::of::<Vec<(String, Node)>>()
}

impl Node {
    pub fn type_key(&self) -> TypeKey {
        match self {
            Node::Null => any_key(),
            Node::Bool(_) => TypeKey::of::<bool>(),
            Node::Int(_) => TypeKey::of::<i64>(),
            Node::Float(_) => TypeKey::of::<f64>(),
            Node::Decimal(_) => TypeKey::of::<ExactDecimal>(),
            Node::Str(_) => TypeKey::of::<String>(),
            Node::Instant(_) => TypeKey::of::<OffsetDateTime>(),
            Node::List(_) => list_key(),
            Node::Map(_) => map_key(),
            Node::Object(object) => object.type_key(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Node::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Int(value)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Float(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Str(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Str(value)
    }
}

impl From<ExactDecimal> for Node {
    fn from(value: ExactDecimal) -> Self {
        Node::Decimal(value)
    }
}

impl From<OffsetDateTime> for Node {
    fn from(value: OffsetDateTime) -> Self {
        Node::Instant(value)
    }
}

impl From<ObjectNode> for Node {
    fn from(value: ObjectNode) -> Self {
        Node::Object(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Entries {
    #[default]
    None,
    Keyed(Vec<(String, Node)>),
    Items(Vec<Node>),
}

/// Instance of a catalogued type. Members are keyed by declared name, not JSON key.
#[derive(Clone, Debug)]
pub struct ObjectNode {
    type_key: TypeKey,
    members: Vec<(String, Node)>,
    entries: Entries,
    constructed_by: Option<String>,
}

impl ObjectNode {
    pub fn new(type_key: TypeKey) -> Self {
        Self {
            type_key,
            members: Vec::new(),
            entries: Entries::None,
            constructed_by: None,
        }
    }

    pub fn of<T: 'static>() -> Self {
        Self::new(TypeKey::of::<T>())
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn with_member(mut self, name: impl Into<String>, value: impl Into<Node>) -> Self {
        self.set_member(name, value);
        self
    }

    /// Replaces an existing member of the same name, otherwise appends.
    pub fn set_member(&mut self, name: impl Into<String>, value: impl Into<Node>) {
        let name = name.into();
        let value = value.into();
        match self.members.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.members.push((name, value)),
        }
    }

    pub fn member(&self, name: &str) -> Option<&Node> {
        self.members
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn members(&self) -> &[(String, Node)] {
        &self.members
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        let pair = (key.into(), value.into());
        match &mut self.entries {
            Entries::Keyed(pairs) => pairs.push(pair),
            entries => *entries = Entries::Keyed(vec![pair]),
        }
        self
    }

    pub fn with_item(mut self, value: impl Into<Node>) -> Self {
        let value = value.into();
        match &mut self.entries {
            Entries::Items(items) => items.push(value),
            entries => *entries = Entries::Items(vec![value]),
        }
        self
    }

    pub fn with_entries(mut self, entries: Entries) -> Self {
        self.entries = entries;
        self
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    /// Name of the constructor that built this node on the read path.
    pub fn constructed_by(&self) -> Option<&str> {
        self.constructed_by.as_deref()
    }

    pub(crate) fn set_constructed_by(&mut self, constructor: impl Into<String>) {
        self.constructed_by = Some(constructor.into());
    }
}

// Provenance (`constructed_by`) is not part of a value's identity.
impl PartialEq for ObjectNode {
    fn eq(&self, other: &Self) -> bool {
        self.type_key == other.type_key
            && self.members == other.members
            && self.entries == other.entries
    }
}

/// Builtin leaf and container kinds the engine handles without a catalog entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Builtin {
    Any,
    Bool,
    Int,
    Float,
    Decimal,
    Str,
    Instant,
    List,
    Map,
}

impl Builtin {
    pub(crate) fn from_key(key: TypeKey) -> Option<Self> {
        let table = [
            (any_key(), Builtin::Any),
            (TypeKey::of::<bool>(), Builtin::Bool),
            (TypeKey::of::<i64>(), Builtin::Int),
            (TypeKey::of::<f64>(), Builtin::Float),
            (TypeKey::of::<ExactDecimal>(), Builtin::Decimal),
            (TypeKey::of::<String>(), Builtin::Str),
            (TypeKey::of::<OffsetDateTime>(), Builtin::Instant),
            (list_key(), Builtin::List),
            (map_key(), Builtin::Map),
        ];
        table
            .into_iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, builtin)| builtin)
    }
}

#[cfg(test)]
mod tests {
    use super::{Builtin, Entries, Node, ObjectNode, any_key};
    use crate::core::type_key::TypeKey;

    struct Ledger;

    #[test]
    fn set_member_replaces_in_place() {
        let mut node = ObjectNode::of::<Ledger>().with_member("a", 1i64).with_member("b", "x");
        node.set_member("a", 2i64);
        assert_eq!(node.members().len(), 2);
        assert_eq!(node.member("a"), Some(&Node::Int(2)));
    }

    #[test]
    fn entries_switch_enumeration_kind() {
        let keyed = ObjectNode::of::<Ledger>().with_entry("k", true).with_entry("j", false);
        assert_eq!(
            keyed.entries(),
            &Entries::Keyed(vec![
                ("k".to_string(), Node::Bool(true)),
                ("j".to_string(), Node::Bool(false))
            ])
        );
        let items = ObjectNode::of::<Ledger>().with_item(1i64).with_item(2i64);
        assert_eq!(items.entries(), &Entries::Items(vec![Node::Int(1), Node::Int(2)]));
    }

    #[test]
    fn provenance_is_ignored_by_equality() {
        let plain = ObjectNode::of::<Ledger>().with_member("a", 1i64);
        let mut built = plain.clone();
        built.set_constructed_by("new");
        assert_eq!(plain, built);
    }

    #[test]
    fn type_keys_resolve_to_builtins() {
        assert_eq!(Builtin::from_key(Node::Int(1).type_key()), Some(Builtin::Int));
        assert_eq!(Builtin::from_key(Node::Null.type_key()), Some(Builtin::Any));
        assert_eq!(Builtin::from_key(any_key()), Some(Builtin::Any));
        assert_eq!(Builtin::from_key(TypeKey::of::<Ledger>()), None);
    }
}
