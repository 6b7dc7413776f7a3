// Write walk: Node graph to serde_json::Value, converter first, then contract.
use serde_json::{Map, Value};

use crate::core::contract::ContainerShape;
use crate::core::converter::WriteSession;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::FormatPolicy;
use crate::core::leaf::{number_from_decimal, number_from_f64, render_date};
use crate::core::member::Direction;
use crate::core::node::{Entries, Node, ObjectNode};
use crate::engine::{NullHandling, Shared};

struct WriteContext<'a> {
    shared: &'a Shared,
    depth: usize,
}

impl WriteSession for WriteContext<'_> {
    fn policy(&self) -> FormatPolicy {
        self.shared.policy
    }

    fn write_nested(&self, node: &Node) -> Result<Value, Error> {
        write_node(self.shared, node, self.depth + 1)
    }
}

pub(crate) fn write_node(shared: &Shared, node: &Node, depth: usize) -> Result<Value, Error> {
    if depth > shared.max_depth {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("object graph nests deeper than {}", shared.max_depth))
            .with_type(node.type_key().name()));
    }
    // Nulls never reach converters.
    if node.is_null() {
        return Ok(Value::Null);
    }

    let value_type = node.type_key();
    if let Some(handle) = shared.converters.resolve(value_type)? {
        if handle.converter().can_write() {
            return handle
                .converter()
                .write(node, &WriteContext { shared, depth });
        }
    }

    match node {
        Node::Null => Ok(Value::Null),
        Node::Bool(flag) => Ok(Value::Bool(*flag)),
        Node::Int(number) => Ok(Value::from(*number)),
        Node::Float(number) => number_from_f64(*number).map(Value::Number),
        Node::Decimal(decimal) => number_from_decimal(decimal).map(Value::Number),
        Node::Str(text) => Ok(Value::String(text.clone())),
        Node::Instant(instant) => render_date(*instant, shared.policy.dates()).map(Value::String),
        Node::List(items) => write_items(shared, items, depth),
        Node::Map(pairs) => write_pairs(shared, pairs, depth),
        Node::Object(object) => write_object(shared, object, depth),
    }
}

fn write_object(shared: &Shared, object: &ObjectNode, depth: usize) -> Result<Value, Error> {
    let contract = shared.resolver.contract(object.type_key())?;
    let type_name = object.type_key().name();
    match (contract.shape(), object.entries()) {
        (ContainerShape::Object, _) => {
            let mut map = Map::new();
            for member in contract.included_members(Direction::Write) {
                let Some(value) = object.member(member.name()) else {
                    continue;
                };
                if value.is_null() && shared.null_handling == NullHandling::Ignore {
                    continue;
                }
                let written = write_node(shared, value, depth + 1)
                    .map_err(|err| within(err, type_name, member.name()))?;
                map.insert(member.serialized_name().to_string(), written);
            }
            Ok(Value::Object(map))
        }
        (ContainerShape::DictionaryLike, Entries::Keyed(pairs)) => write_pairs(shared, pairs, depth),
        (ContainerShape::DictionaryLike, Entries::None) => Ok(Value::Object(Map::new())),
        (ContainerShape::ListLike, Entries::Items(items)) => write_items(shared, items, depth),
        (ContainerShape::ListLike, Entries::None) => Ok(Value::Array(Vec::new())),
        (shape, _) => Err(Error::new(ErrorKind::ContractViolation)
            .with_message(format!("entries do not match the {shape:?} container shape"))
            .with_type(type_name)),
    }
}

fn write_items(shared: &Shared, items: &[Node], depth: usize) -> Result<Value, Error> {
    items
        .iter()
        .map(|item| write_node(shared, item, depth + 1))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn write_pairs(shared: &Shared, pairs: &[(String, Node)], depth: usize) -> Result<Value, Error> {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.insert(key.clone(), write_node(shared, value, depth + 1)?);
    }
    Ok(Value::Object(map))
}

// Innermost context wins; outer frames only fill what is missing.
pub(crate) fn within(err: Error, type_name: &str, member: &str) -> Error {
    let err = if err.member().is_none() {
        err.with_member(member)
    } else {
        err
    };
    if err.type_name().is_none() {
        err.with_type(type_name)
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use crate::core::catalog::TypeDescriptor;
    use crate::core::contract::{ContainerShape, TypeContractOverride};
    use crate::core::converter::{Converter, ReadSession, WriteSession};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::node::{Node, ObjectNode};
    use crate::core::type_key::TypeKey;
    use crate::engine::{Serializer, SerializerSettings};
    use serde_json::{Value, json};

    struct Tag;
    struct Bag;

    struct ReadOnly;

    impl Converter for ReadOnly {
        fn name(&self) -> &str {
            "read-only"
        }

        fn can_convert(&self, value_type: TypeKey) -> Result<bool, Error> {
            Ok(value_type == TypeKey::of::<Tag>())
        }

        fn can_write(&self) -> bool {
            false
        }

        fn write(&self, _node: &Node, _session: &dyn WriteSession) -> Result<Value, Error> {
            Ok(Value::String("converter".to_string()))
        }

        fn read(&self, _value: &Value, _ty: TypeKey, _session: &dyn ReadSession) -> Result<Node, Error> {
            Ok(Node::Null)
        }
    }

    #[test]
    fn claimant_that_cannot_write_defers_to_contract() {
        let serializer = Serializer::new(
            SerializerSettings::new()
                .with_converter(ReadOnly)
                .register_type(TypeDescriptor::of::<Tag>().with_member("label", TypeKey::of::<String>())),
        );
        let node = Node::from(ObjectNode::of::<Tag>().with_member("label", "x"));
        assert_eq!(serializer.to_value(&node).expect("value"), json!({"label": "x"}));
    }

    #[test]
    fn mismatched_entries_are_a_contract_violation() {
        let serializer = Serializer::new(
            SerializerSettings::new()
                .register_type(TypeDescriptor::of::<Bag>())
                .override_type_of::<Bag>(TypeContractOverride::new().with_shape(ContainerShape::DictionaryLike)),
        );
        let node = Node::from(ObjectNode::of::<Bag>().with_item(1i64));
        let err = serializer.to_value(&node).expect_err("violation");
        assert_eq!(err.kind(), ErrorKind::ContractViolation);

        let empty = Node::from(ObjectNode::of::<Bag>());
        assert_eq!(serializer.to_value(&empty).expect("value"), json!({}));
    }

    #[test]
    fn non_finite_float_member_names_its_location() {
        let serializer = Serializer::new(
            SerializerSettings::new()
                .register_type(TypeDescriptor::of::<Tag>().with_member("weight", TypeKey::of::<f64>())),
        );
        let node = Node::from(ObjectNode::of::<Tag>().with_member("weight", f64::NAN));
        let err = serializer.to_value(&node).expect_err("nan");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.member(), Some("weight"));
        assert_eq!(err.type_name(), Some("f64"));
    }

    #[test]
    fn unregistered_object_type_is_a_usage_error() {
        let node = Node::from(ObjectNode::of::<Bag>());
        let err = Serializer::default().to_value(&node).expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
