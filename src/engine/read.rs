// Read walk: serde_json::Value to Node graph under a declared TypeKey.
use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::core::contract::{BoundArgument, ConstructorArgs, ContainerShape, TypeContract};
use crate::core::converter::ReadSession;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{FloatParseTarget, FormatPolicy};
use crate::core::leaf::{FloatValue, is_tagged_date, parse_date, parse_float_literal};
use crate::core::member::{Direction, find_member};
use crate::core::node::{Builtin, Entries, Node, any_key};
use crate::core::type_key::TypeKey;
use crate::engine::Shared;
use crate::engine::write::within;

struct ReadContext<'a> {
    shared: &'a Shared,
    depth: usize,
}

impl ReadSession for ReadContext<'_> {
    fn policy(&self) -> FormatPolicy {
        self.shared.policy
    }

    fn read_nested(&self, value: &Value, value_type: TypeKey) -> Result<Node, Error> {
        read_node(self.shared, value, value_type, self.depth + 1)
    }
}

pub(crate) fn read_node(
    shared: &Shared,
    value: &Value,
    value_type: TypeKey,
    depth: usize,
) -> Result<Node, Error> {
    if depth > shared.max_depth {
        return Err(Error::new(ErrorKind::Syntax)
            .with_message(format!("input nests deeper than {}", shared.max_depth))
            .with_type(value_type.name())
            .with_hint("Raise max_depth if the document is trusted."));
    }
    // Nulls never reach converters.
    if value.is_null() {
        return Ok(Node::Null);
    }

    if let Some(handle) = shared.converters.resolve(value_type)? {
        if handle.converter().can_read() {
            return handle
                .converter()
                .read(value, value_type, &ReadContext { shared, depth });
        }
    }

    match Builtin::from_key(value_type) {
        Some(builtin) => read_builtin(shared, value, builtin, depth),
        None => read_object(shared, value, value_type, depth),
    }
}

fn read_builtin(shared: &Shared, value: &Value, builtin: Builtin, depth: usize) -> Result<Node, Error> {
    match (builtin, value) {
        (Builtin::Any, _) => read_any(shared, value, depth),
        (Builtin::Bool, Value::Bool(flag)) => Ok(Node::Bool(*flag)),
        (Builtin::Int, Value::Number(number)) => match read_number(shared, number)? {
            Node::Int(int) => Ok(Node::Int(int)),
            _ => Err(mismatch("an integer", value)),
        },
        (Builtin::Float, Value::Number(number)) => float_node(&number.to_string(), FloatParseTarget::Binary64),
        (Builtin::Decimal, Value::Number(number)) => {
            float_node(&number.to_string(), FloatParseTarget::DecimalExact)
        }
        (Builtin::Str, Value::String(text)) => Ok(Node::Str(text.clone())),
        (Builtin::Instant, Value::String(text)) => parse_date(text).map(Node::Instant),
        (Builtin::List, Value::Array(items)) => read_items(shared, items, any_key(), depth).map(Node::List),
        (Builtin::Map, Value::Object(map)) => read_pairs(shared, map, any_key(), depth).map(Node::Map),
        (Builtin::Bool, _) => Err(mismatch("a boolean", value)),
        (Builtin::Int | Builtin::Float | Builtin::Decimal, _) => Err(mismatch("a number", value)),
        (Builtin::Str | Builtin::Instant, _) => Err(mismatch("a string", value)),
        (Builtin::List, _) => Err(mismatch("an array", value)),
        (Builtin::Map, _) => Err(mismatch("an object", value)),
    }
}

fn read_any(shared: &Shared, value: &Value, depth: usize) -> Result<Node, Error> {
    match value {
        Value::Null => Ok(Node::Null),
        Value::Bool(flag) => Ok(Node::Bool(*flag)),
        Value::Number(number) => read_number(shared, number),
        Value::String(text) => Ok(detect_date(shared, text).unwrap_or_else(|| Node::Str(text.clone()))),
        Value::Array(items) => read_items(shared, items, any_key(), depth).map(Node::List),
        Value::Object(map) => read_pairs(shared, map, any_key(), depth).map(Node::Map),
    }
}

fn detect_date(shared: &Shared, text: &str) -> Option<Node> {
    if !shared.detect_dates || !(is_tagged_date(text) || looks_like_rfc3339(text)) {
        return None;
    }
    parse_date(text).ok().map(Node::Instant)
}

fn looks_like_rfc3339(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 20 && bytes[4] == b'-' && bytes[7] == b'-' && matches!(bytes[10], b'T' | b't')
}

// Untyped numerals: integral literals that fit i64 stay integers, the rest follow the policy target.
fn read_number(shared: &Shared, number: &Number) -> Result<Node, Error> {
    let raw = number.to_string();
    let integral = raw.bytes().all(|byte| byte.is_ascii_digit() || byte == b'-');
    if integral {
        if let Ok(int) = raw.parse::<i64>() {
            return Ok(Node::Int(int));
        }
    }
    float_node(&raw, shared.policy.floats())
}

fn float_node(raw: &str, target: FloatParseTarget) -> Result<Node, Error> {
    match parse_float_literal(raw, target)? {
        FloatValue::Binary64(float) => Ok(Node::Float(float)),
        FloatValue::Decimal(decimal) => Ok(Node::Decimal(decimal)),
    }
}

fn read_items(shared: &Shared, items: &[Value], item_type: TypeKey, depth: usize) -> Result<Vec<Node>, Error> {
    items
        .iter()
        .map(|item| read_node(shared, item, item_type, depth + 1))
        .collect()
}

fn read_pairs(
    shared: &Shared,
    map: &Map<String, Value>,
    value_type: TypeKey,
    depth: usize,
) -> Result<Vec<(String, Node)>, Error> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), read_node(shared, value, value_type, depth + 1)?)))
        .collect()
}

fn read_object(shared: &Shared, value: &Value, value_type: TypeKey, depth: usize) -> Result<Node, Error> {
    let contract = shared.resolver.contract(value_type)?;
    let (assigned, entries) = match (contract.shape(), value) {
        (ContainerShape::Object, Value::Object(map)) => (read_members(shared, &contract, map, depth)?, Entries::None),
        (ContainerShape::DictionaryLike, Value::Object(map)) => (
            Vec::new(),
            Entries::Keyed(read_pairs(shared, map, contract.entry_type(), depth)?),
        ),
        (ContainerShape::ListLike, Value::Array(items)) => (
            Vec::new(),
            Entries::Items(read_items(shared, items, contract.entry_type(), depth)?),
        ),
        (ContainerShape::ListLike, _) => return Err(mismatch("an array", value).with_type(value_type.name())),
        (_, _) => return Err(mismatch("an object", value).with_type(value_type.name())),
    };

    let plan = shared.resolver.construction_plan(value_type)?;
    let mut remaining = assigned;
    let arguments = plan
        .bindings()
        .iter()
        .map(|binding| {
            let value = remaining
                .iter()
                .position(|(member, _)| *member == binding.member)
                .map(|index| remaining.remove(index).1)
                .unwrap_or(Node::Null);
            BoundArgument {
                parameter: binding.parameter.clone(),
                member: binding.member.clone(),
                value,
            }
        })
        .collect();

    let mut object = plan
        .constructor()
        .construct(ConstructorArgs::new(value_type, arguments))
        .map_err(|err| {
            if err.type_name().is_none() {
                err.with_type(value_type.name())
            } else {
                err
            }
        })?;
    for (member, node) in remaining {
        object.set_member(member, node);
    }
    if !matches!(entries, Entries::None) {
        object = object.with_entries(entries);
    }
    Ok(Node::Object(object))
}

// Values keyed by declared member name, in input order; later duplicates replace earlier ones.
fn read_members(
    shared: &Shared,
    contract: &TypeContract,
    map: &Map<String, Value>,
    depth: usize,
) -> Result<Vec<(String, Node)>, Error> {
    let type_name = contract.key().name();
    let readable = contract
        .members()
        .iter()
        .filter(|member| member.should_include(Direction::Read));

    let mut assigned: Vec<(String, Node)> = Vec::with_capacity(map.len());
    for (key, raw) in map {
        let Some(member) = find_member(readable.clone(), key) else {
            let excluded = find_member(contract.members(), key).is_some();
            trace!(type_name, key = key.as_str(), excluded, "discarding input key");
            continue;
        };
        let node = read_node(shared, raw, member.value_type(), depth + 1)
            .map_err(|err| within(err, type_name, member.name()))?;
        match assigned.iter_mut().find(|(name, _)| name == member.name()) {
            Some(slot) => slot.1 = node,
            None => assigned.push((member.name().to_string(), node)),
        }
    }
    Ok(assigned)
}

fn mismatch(expected: &str, found: &Value) -> Error {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    Error::new(ErrorKind::Mismatch).with_message(format!("expected {expected}, found {found}"))
}
