//! Purpose: End-to-end coverage of converter precedence, type contracts, and format policy.
//! Exports: Integration tests only.
//! Role: Drive the public `api` surface the way an embedding application would.
//! Invariants: Assertions target produced JSON and rebuilt nodes, never engine internals.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jsoncontract::api::{
    ConstructorArgs, ConstructorDescriptor, ContainerShape, Converter, DateRepresentation,
    Direction, Entries, Error, ErrorKind, ExactDecimal, FloatParseTarget, FormatPolicy, Node,
    ObjectNode, PlanSource, ReadSession, Serializer, SerializerSettings, TypeContractOverride,
    TypeDescriptor, TypeKey, WriteSession, to_exit_code,
};
use serde_json::{Value, json};
use time::OffsetDateTime;

struct Money;
struct Envelope;
struct Order;
struct Account;
struct User;
struct Inventory;
struct Timeline;
struct Quote;

struct MoneyText;

impl Converter for MoneyText {
    fn name(&self) -> &str {
        "money-text"
    }

    fn can_convert(&self, value_type: TypeKey) -> Result<bool, Error> {
        Ok(value_type == TypeKey::of::<Money>())
    }

    fn write(&self, node: &Node, _session: &dyn WriteSession) -> Result<Value, Error> {
        let object = node
            .as_object()
            .ok_or_else(|| Error::new(ErrorKind::Mismatch).with_message("money must be an object"))?;
        let cents = object.member("cents").and_then(Node::as_i64).unwrap_or_default();
        let currency = object.member("currency").and_then(Node::as_str).unwrap_or("XXX");
        Ok(Value::String(format!("{cents} {currency}")))
    }

    fn read(&self, value: &Value, value_type: TypeKey, _session: &dyn ReadSession) -> Result<Node, Error> {
        let malformed = || Error::new(ErrorKind::Mismatch).with_message("expected `<cents> <currency>`");
        let text = value.as_str().ok_or_else(malformed)?;
        let (cents, currency) = text.split_once(' ').ok_or_else(malformed)?;
        let cents: i64 = cents.parse().map_err(|err| malformed().with_source(err))?;
        Ok(Node::Object(
            ObjectNode::new(value_type)
                .with_member("cents", cents)
                .with_member("currency", currency),
        ))
    }
}

struct Shout;

impl Converter for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn can_convert(&self, value_type: TypeKey) -> Result<bool, Error> {
        Ok(value_type == TypeKey::of::<Money>())
    }

    fn write(&self, _node: &Node, _session: &dyn WriteSession) -> Result<Value, Error> {
        Ok(Value::String("MONEY".to_string()))
    }

    fn read(&self, _value: &Value, value_type: TypeKey, _session: &dyn ReadSession) -> Result<Node, Error> {
        Ok(Node::Object(ObjectNode::new(value_type)))
    }
}

// Wraps its payload; the payload itself goes back through the full resolution chain.
struct EnvelopeConverter;

impl Converter for EnvelopeConverter {
    fn name(&self) -> &str {
        "envelope"
    }

    fn can_convert(&self, value_type: TypeKey) -> Result<bool, Error> {
        Ok(value_type == TypeKey::of::<Envelope>())
    }

    fn write(&self, node: &Node, session: &dyn WriteSession) -> Result<Value, Error> {
        let payload = node
            .as_object()
            .and_then(|object| object.member("payload"))
            .cloned()
            .unwrap_or(Node::Null);
        Ok(json!({"kind": "envelope", "payload": session.write_nested(&payload)?}))
    }

    fn read(&self, value: &Value, value_type: TypeKey, session: &dyn ReadSession) -> Result<Node, Error> {
        let payload = session.read_nested(&value["payload"], TypeKey::of::<Money>())?;
        Ok(Node::Object(ObjectNode::new(value_type).with_member("payload", payload)))
    }
}

struct CountingFailure {
    calls: Arc<AtomicUsize>,
}

impl Converter for CountingFailure {
    fn name(&self) -> &str {
        "counting-failure"
    }

    fn can_convert(&self, _value_type: TypeKey) -> Result<bool, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::new(ErrorKind::Internal).with_message("lookup table unavailable"))
    }

    fn write(&self, _node: &Node, _session: &dyn WriteSession) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn read(&self, _value: &Value, _ty: TypeKey, _session: &dyn ReadSession) -> Result<Node, Error> {
        Ok(Node::Null)
    }
}

fn instant() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_332_308_400).expect("instant")
}

fn order_descriptor() -> TypeDescriptor {
    TypeDescriptor::of::<Order>()
        .with_member("id", TypeKey::of::<i64>())
        .with_member("total", TypeKey::of::<Money>())
        .with_member("placed", TypeKey::of::<OffsetDateTime>())
}

fn money(cents: i64, currency: &str) -> Node {
    Node::Object(
        ObjectNode::of::<Money>()
            .with_member("cents", cents)
            .with_member("currency", currency),
    )
}

fn order() -> Node {
    Node::Object(
        ObjectNode::of::<Order>()
            .with_member("id", 7i64)
            .with_member("total", money(1250, "USD"))
            .with_member("placed", instant()),
    )
}

#[test]
fn converter_owns_claimed_member_and_round_trips() {
    let serializer = Serializer::new(
        SerializerSettings::new()
            .with_converter(MoneyText)
            .register_type(order_descriptor()),
    );

    let value = serializer.to_value(&order()).expect("write");
    assert_eq!(
        value,
        json!({"id": 7, "total": "1250 USD", "placed": "2012-03-21T05:40:00Z"})
    );

    let text = serializer.to_string(&order()).expect("text");
    let back = serializer.from_str(&text, TypeKey::of::<Order>()).expect("read");
    assert_eq!(back, order());
}

#[test]
fn first_registered_converter_wins_and_insert_reorders() {
    let serializer = Serializer::new(
        SerializerSettings::new()
            .with_converter(MoneyText)
            .with_converter(Shout),
    );
    assert_eq!(
        serializer.to_value(&money(5, "EUR")).expect("write"),
        json!("5 EUR")
    );
    let handle = serializer
        .resolve_converter(TypeKey::of::<Money>())
        .expect("resolve")
        .expect("claimed");
    assert_eq!(handle.name(), "money-text");
    assert_eq!(handle.index(), 0);

    let mut settings = SerializerSettings::new().with_converter(MoneyText);
    settings.converters_mut().insert(0, Shout);
    let reordered = Serializer::new(settings);
    assert_eq!(
        reordered.to_value(&money(5, "EUR")).expect("write"),
        json!("MONEY")
    );
}

#[test]
fn nested_values_inside_a_converter_are_resolved_again() {
    let serializer = Serializer::new(
        SerializerSettings::new()
            .with_converter(EnvelopeConverter)
            .with_converter(MoneyText),
    );
    let node = Node::Object(ObjectNode::of::<Envelope>().with_member("payload", money(99, "GBP")));

    let value = serializer.to_value(&node).expect("write");
    assert_eq!(value, json!({"kind": "envelope", "payload": "99 GBP"}));

    let back = serializer
        .from_value(&value, TypeKey::of::<Envelope>())
        .expect("read");
    assert_eq!(back, node);
}

#[test]
fn failing_claim_check_stops_resolution() {
    let calls = Arc::new(AtomicUsize::new(0));
    let serializer = Serializer::new(
        SerializerSettings::new()
            .with_converter(CountingFailure {
                calls: Arc::clone(&calls),
            })
            .with_converter(MoneyText),
    );

    let err = serializer.to_value(&money(1, "USD")).expect_err("predicate");
    assert_eq!(err.kind(), ErrorKind::ConverterPredicate);
    assert_eq!(to_exit_code(err.kind()), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn null_values_never_reach_converters() {
    let calls = Arc::new(AtomicUsize::new(0));
    let serializer = Serializer::new(SerializerSettings::new().with_converter(CountingFailure {
        calls: Arc::clone(&calls),
    }));

    let node = serializer.from_str("null", TypeKey::of::<Money>()).expect("null read");
    assert!(node.is_null());
    assert_eq!(serializer.to_string(&Node::Null).expect("null write"), "null");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

fn account_descriptor() -> TypeDescriptor {
    TypeDescriptor::of::<Account>()
        .with_member("id", TypeKey::of::<i64>())
        .with_member("owner", TypeKey::of::<String>())
        .with_member("balance", TypeKey::of::<f64>())
        .with_constructor(ConstructorDescriptor::parameterless("empty"))
        .with_constructor(
            ConstructorDescriptor::new("open", ["id", "owner"]).with_factory(|args: ConstructorArgs| {
                let owner = args.get("owner").and_then(Node::as_str).unwrap_or_default().to_uppercase();
                let id = args.get("id").cloned().unwrap_or(Node::Null);
                Ok(ObjectNode::new(args.type_key())
                    .with_member("id", id)
                    .with_member("owner", owner))
            }),
        )
}

#[test]
fn preferred_constructor_is_used_even_when_parameterless_exists() {
    let input = r#"{"id":3,"owner":"ada","balance":12.5}"#;

    let preferred = Serializer::new(
        SerializerSettings::new()
            .register_type(account_descriptor())
            .override_type_of::<Account>(TypeContractOverride::new().with_constructor("open")),
    );
    let plan = preferred
        .construction_plan(TypeKey::of::<Account>())
        .expect("plan");
    assert_eq!(plan.constructor().name(), "open");
    assert_eq!(plan.source(), PlanSource::Override);

    let node = preferred.from_str(input, TypeKey::of::<Account>()).expect("read");
    let account = node.as_object().expect("object");
    assert_eq!(account.constructed_by(), Some("open"));
    assert_eq!(account.member("owner"), Some(&Node::from("ADA")));
    assert_eq!(account.member("balance"), Some(&Node::Float(12.5)));

    let heuristic = Serializer::new(SerializerSettings::new().register_type(account_descriptor()));
    let node = heuristic.from_str(input, TypeKey::of::<Account>()).expect("read");
    let account = node.as_object().expect("object");
    assert_eq!(account.constructed_by(), Some("empty"));
    assert_eq!(account.member("owner"), Some(&Node::from("ada")));
}

#[test]
fn missing_preferred_constructor_fails_instead_of_falling_back() {
    let serializer = Serializer::new(
        SerializerSettings::new()
            .register_type(account_descriptor())
            .override_type_of::<Account>(TypeContractOverride::new().with_constructor("restore")),
    );
    let err = serializer
        .from_str(r#"{"id":1}"#, TypeKey::of::<Account>())
        .expect_err("violation");
    assert_eq!(err.kind(), ErrorKind::ContractViolation);
    assert_eq!(to_exit_code(err.kind()), 5);
}

fn user_serializer(entry: TypeContractOverride) -> Serializer {
    Serializer::new(
        SerializerSettings::new()
            .register_type(
                TypeDescriptor::of::<User>()
                    .with_member("name", TypeKey::of::<String>())
                    .with_member("password", TypeKey::of::<String>())
                    .with_member("age", TypeKey::of::<i64>()),
            )
            .override_type_of::<User>(entry),
    )
}

fn user() -> Node {
    Node::Object(
        ObjectNode::of::<User>()
            .with_member("name", "grace")
            .with_member("password", "hunter2")
            .with_member("age", 36i64),
    )
}

#[test]
fn excluded_member_is_neither_written_nor_assigned() {
    let serializer = user_serializer(TypeContractOverride::new().ignore("password"));
    let contract = serializer.contract(TypeKey::of::<User>()).expect("contract");
    let password = contract.member("password").expect("member");
    assert!(!password.should_include(Direction::Write));
    assert!(!password.should_include(Direction::Read));

    let text = serializer.to_string(&user()).expect("write");
    assert_eq!(text, r#"{"name":"grace","age":36}"#);

    let node = serializer
        .from_str(r#"{"name":"grace","password":"hunter2","age":36,"extra":true}"#, TypeKey::of::<User>())
        .expect("read");
    let object = node.as_object().expect("object");
    assert!(object.member("password").is_none());
    assert!(object.member("extra").is_none());
    assert_eq!(object.member("age"), Some(&Node::Int(36)));
}

#[test]
fn opt_in_and_rename_shape_the_written_object() {
    let serializer = user_serializer(
        TypeContractOverride::new()
            .opt_in()
            .include("name")
            .include("age")
            .rename("name", "display_name"),
    );
    let value = serializer.to_value(&user()).expect("write");
    assert_eq!(value, json!({"display_name": "grace", "age": 36}));

    let node = serializer.from_value(&value, TypeKey::of::<User>()).expect("read");
    let object = node.as_object().expect("object");
    assert_eq!(object.member("name"), Some(&Node::from("grace")));
    assert!(object.member("password").is_none());
}

#[test]
fn dictionary_like_type_round_trips_its_entries() {
    let serializer = Serializer::new(
        SerializerSettings::new().register_type(
            TypeDescriptor::of::<Inventory>()
                .with_member("warehouse", TypeKey::of::<String>())
                .with_shape(ContainerShape::DictionaryLike)
                .with_entry_type(TypeKey::of::<i64>()),
        ),
    );
    let node = Node::Object(
        ObjectNode::of::<Inventory>()
            .with_entry("apples", 3i64)
            .with_entry("pears", 5i64),
    );

    let value = serializer.to_value(&node).expect("write");
    assert_eq!(value, json!({"apples": 3, "pears": 5}));

    let back = serializer.from_value(&value, TypeKey::of::<Inventory>()).expect("read");
    assert_eq!(back, node);

    let err = serializer
        .from_str(r#"{"apples":"many"}"#, TypeKey::of::<Inventory>())
        .expect_err("entry type");
    assert_eq!(err.kind(), ErrorKind::Mismatch);
}

#[test]
fn list_like_override_enumerates_items_under_the_date_policy() {
    let serializer = Serializer::new(
        SerializerSettings::new()
            .with_policy(FormatPolicy::default().with_dates(DateRepresentation::EpochMillisTagged))
            .register_type(
                TypeDescriptor::of::<Timeline>()
                    .with_member("title", TypeKey::of::<String>())
                    .with_entry_type(TypeKey::of::<OffsetDateTime>()),
            )
            .override_type_of::<Timeline>(TypeContractOverride::new().with_shape(ContainerShape::ListLike)),
    );
    let node = Node::Object(
        ObjectNode::of::<Timeline>()
            .with_member("title", "ignored by the list shape")
            .with_item(instant()),
    );

    let text = serializer.to_string(&node).expect("write");
    assert_eq!(text, r#"["/Date(1332308400000)/"]"#);

    let back = serializer.from_str(&text, TypeKey::of::<Timeline>()).expect("read");
    let object = back.as_object().expect("object");
    assert_eq!(object.entries(), &Entries::Items(vec![Node::Instant(instant())]));
    assert!(object.member("title").is_none());
}

#[test]
fn dates_render_per_policy_and_read_in_either_form() {
    let node = Node::Instant(instant());
    let iso = Serializer::default();
    assert_eq!(iso.to_string(&node).expect("iso"), r#""2012-03-21T05:40:00Z""#);

    let tagged = Serializer::new(
        SerializerSettings::new()
            .with_policy(FormatPolicy::default().with_dates(DateRepresentation::EpochMillisTagged)),
    );
    assert_eq!(tagged.to_string(&node).expect("tagged"), r#""/Date(1332308400000)/""#);

    let key = TypeKey::of::<OffsetDateTime>();
    for serializer in [&iso, &tagged] {
        assert_eq!(serializer.from_str(r#""/Date(1332308400000)/""#, key).expect("tagged"), node);
        assert_eq!(serializer.from_str(r#""2012-03-21T05:40:00Z""#, key).expect("iso"), node);
    }

    let untyped = iso.from_str_any(r#""2012-03-21T05:40:00Z""#).expect("plain");
    assert_eq!(untyped, Node::from("2012-03-21T05:40:00Z"));
    let detecting = Serializer::new(SerializerSettings::new().with_date_detection(true));
    assert_eq!(detecting.from_str_any(r#""/Date(1332308400000)/""#).expect("detected"), node);
}

#[test]
fn over_range_numeral_overflows_only_under_decimal_target() {
    let literal = "99999999999999999999999999.9";

    let decimal = Serializer::new(
        SerializerSettings::new().with_policy(FormatPolicy::default().with_floats(FloatParseTarget::DecimalExact)),
    );
    let err = decimal.from_str_any(literal).expect_err("overflow");
    assert_eq!(err.kind(), ErrorKind::Overflow);
    assert_eq!(to_exit_code(err.kind()), 6);

    let binary = Serializer::default();
    match binary.from_str_any(literal).expect("rounded") {
        Node::Float(value) => assert_eq!(value, 1e26),
        other => panic!("expected a float, got {other:?}"),
    }
}

#[test]
fn declared_member_types_pick_their_own_numeric_representation() {
    let serializer = Serializer::new(
        SerializerSettings::new().register_type(
            TypeDescriptor::of::<Quote>()
                .with_member("price", TypeKey::of::<ExactDecimal>())
                .with_member("ratio", TypeKey::of::<f64>()),
        ),
    );
    let node = serializer
        .from_str(r#"{"price":19.990,"ratio":0.25}"#, TypeKey::of::<Quote>())
        .expect("read");
    let quote = node.as_object().expect("object");
    assert_eq!(
        quote.member("price"),
        Some(&Node::Decimal("19.99".parse().expect("decimal")))
    );
    assert_eq!(quote.member("ratio"), Some(&Node::Float(0.25)));
    assert_eq!(
        serializer.to_string(&node).expect("write"),
        r#"{"price":19.99,"ratio":0.25}"#
    );

    let err = serializer
        .from_str(r#"{"price":99999999999999999999999999.9}"#, TypeKey::of::<Quote>())
        .expect_err("overflow");
    assert_eq!(err.kind(), ErrorKind::Overflow);
    assert_eq!(err.member(), Some("price"));
}

#[test]
fn serializer_is_shared_across_threads() {
    let serializer = Serializer::new(
        SerializerSettings::new()
            .with_converter(MoneyText)
            .register_type(order_descriptor()),
    );
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let serializer = serializer.clone();
                scope.spawn(move || {
                    let text = serializer.to_string(&order()).expect("write");
                    serializer.from_str(&text, TypeKey::of::<Order>()).expect("read")
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("join"), order());
        }
    });
}
