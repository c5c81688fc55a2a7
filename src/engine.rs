//! Recursive schema evaluation.
//!
//! `evaluate` dispatches on the node kind, locates the candidate value with
//! [`crate::path`], coerces it, and either returns the result or a
//! [`ParseError`]. `Ok(None)` is "undefined": an optional node that found
//! nothing usable, or an `Any` over an absent address.
//!
//! Recovery rules:
//! - primitives fall back to their default before anything else
//! - an optional node turns any failure beneath it into `Ok(None)`
//! - a union swallows failing alternatives until one succeeds
//! - arrays drop `None` elements; objects omit `None` fields
//!
//! Recursion depth follows schema nesting. Schemas are trees built by value,
//! so there is no cycle to guard against.
pub mod coerce;

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{ExpectedType, ParseError};
use crate::path::{self, Segment};
use crate::schema::Schema;

pub type Outcome = Result<Option<Value>, ParseError>;

/// Evaluate `schema` against `input`, starting at the root.
pub fn evaluate(schema: &Schema, input: &Value) -> Outcome {
    evaluate_at(schema, input, &[])
}

/// `at` is the address accumulated by enclosing objects (empty at the top
/// level and for array elements). An explicit `path` on the node replaces it.
fn evaluate_at(schema: &Schema, input: &Value, at: &[Segment]) -> Outcome {
    let outcome = match schema {
        Schema::String { default, .. } => {
            let address = address_of(schema, at);
            primitive(
                input,
                &address,
                default.as_ref(),
                ExpectedType::String,
                coerce::to_string,
            )
        }
        Schema::Number { default, .. } => {
            let address = address_of(schema, at);
            primitive(
                input,
                &address,
                default.as_ref(),
                ExpectedType::Number,
                coerce::to_number,
            )
        }
        Schema::Boolean { default, strict, .. } => {
            let address = address_of(schema, at);
            primitive(
                input,
                &address,
                default.as_ref(),
                ExpectedType::Boolean,
                |v| coerce::to_boolean(v, *strict),
            )
        }
        Schema::Any { default, .. } => {
            let address = address_of(schema, at);
            let found = path::walk(input, &address);
            Ok(found.cloned().or_else(|| default.clone()))
        }
        Schema::Custom { transform, .. } => {
            let address = address_of(schema, at);
            let found = path::walk(input, &address);
            transform
                .apply(found)
                .map(Some)
                .map_err(|error| ParseError::transform(found, &path::render(&address), &error))
        }
        Schema::Array { element, .. } => evaluate_array(element, input, &address_of(schema, at)),
        Schema::Object { fields, .. } => {
            let base = address_of(schema, at);
            let found = path::walk(input, &base);
            if matches!(found, Some(Value::Object(_))) {
                let mut child = base.into_owned();
                let mut out = Map::with_capacity(fields.len());
                // All or nothing: the first failing field abandons the whole object.
                let complete: Result<(), ParseError> =
                    fields.iter().try_for_each(|(name, field)| {
                        child.push(Segment::Key(name.clone()));
                        let value = evaluate_at(field, input, &child);
                        child.pop();
                        if let Some(value) = value? {
                            out.insert(name.clone(), value);
                        }
                        Ok(())
                    });
                complete.map(|()| Some(Value::Object(out)))
            } else {
                Err(ParseError::shape(ExpectedType::Object, found, &path::render(&base)))
            }
        }
        Schema::Union { alternatives, .. } => evaluate_union(alternatives, input, at),
    };
    absorb(schema, outcome)
}

/// The node's own path when it has one, otherwise the inherited address.
fn address_of<'a>(schema: &Schema, at: &'a [Segment]) -> Cow<'a, [Segment]> {
    match schema.source_path() {
        Some(source) => Cow::Owned(path::parse(source)),
        None => Cow::Borrowed(at),
    }
}

fn absorb(schema: &Schema, outcome: Outcome) -> Outcome {
    match outcome {
        Err(error) if schema.is_optional() => {
            trace!(expected = %error.expected, %error, "optional node absorbed failure");
            Ok(None)
        }
        other => other,
    }
}

fn primitive(
    input: &Value,
    address: &[Segment],
    default: Option<&Value>,
    expected: ExpectedType,
    coerce: impl Fn(&Value) -> Option<Value>,
) -> Outcome {
    let found = path::walk(input, address);
    if let Some(value) = found.and_then(coerce) {
        return Ok(Some(value));
    }
    match default {
        Some(default) => Ok(Some(default.clone())),
        None => Err(ParseError::coercion(expected, found, &path::render(address))),
    }
}

fn evaluate_array(element: &Schema, input: &Value, address: &[Segment]) -> Outcome {
    let found = path::walk(input, address);
    let Some(Value::Array(items)) = found else {
        return Err(ParseError::shape(ExpectedType::Array, found, &path::render(address)));
    };
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        // Element addresses restart at the element itself.
        match evaluate_at(element, item, &[])? {
            Some(value) => out.push(value),
            None => trace!(index, "dropped undefined array element"),
        }
    }
    Ok(Some(Value::Array(out)))
}

fn evaluate_union(alternatives: &[Schema], input: &Value, at: &[Segment]) -> Outcome {
    let mut tried = Vec::with_capacity(alternatives.len());
    for (index, alternative) in alternatives.iter().enumerate() {
        match evaluate_at(alternative, input, at) {
            Ok(value) => return Ok(value),
            Err(error) => {
                trace!(alternative = index, %error, "union alternative rejected");
                tried.push(path::render(&address_of(alternative, at)));
            }
        }
    }
    let address = path::render(at);
    debug!(%address, alternatives = alternatives.len(), "no union alternative matched");
    Err(ParseError::no_alternative(path::walk(input, at), tried))
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Key, ValueType};
    use crate::types as t;
    use serde_json::json;

    fn run(schema: &Schema, input: &Value) -> Outcome {
        evaluate(schema, input)
    }

    #[test]
    fn primitives_at_paths() {
        let subject = json!({ "obj": { "n": 123.4, "s": "Hello world!", "b": false } });
        assert_eq!(
            run(&t::number().path("obj.n"), &subject),
            Ok(Some(json!(123.4)))
        );
        assert_eq!(
            run(&t::string().path("obj.s"), &subject),
            Ok(Some(json!("Hello world!")))
        );
        assert_eq!(
            run(&t::boolean().path("obj.b"), &subject),
            Ok(Some(json!(false)))
        );
        assert_eq!(
            run(&t::string().path("obj.n"), &subject),
            Ok(Some(json!("123.4")))
        );
        assert_eq!(
            run(&t::string().path("obj.b"), &subject),
            Ok(Some(json!("false")))
        );
    }

    #[test]
    fn number_coercion_failures() {
        let subject = json!({ "invalid": "invalid", "flag": true });
        let err = run(&t::number().path("invalid"), &subject).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnableToParse);
        assert_eq!(err.key, Some(Key::Path("invalid".into())));
        let err = run(&t::number().path("flag"), &subject).unwrap_err();
        assert_eq!(err.to_string(), "Unable to convert [boolean] to [number]");
        let err = run(&t::number().path("missing"), &subject).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "Unable to find a valid [number] value at [missing]"
        );
    }

    #[test]
    fn strict_and_loose_booleans() {
        let subject = json!({ "n": 123, "s": "" });
        let err = run(&t::boolean().path("n"), &subject).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnableToParse);
        assert!(run(&t::boolean().path("s"), &subject).is_err());
        assert_eq!(
            run(&t::boolean().strict(false).path("n"), &subject),
            Ok(Some(json!(true)))
        );
        assert_eq!(
            run(&t::boolean().strict(false).path("s"), &subject),
            Ok(Some(json!(false)))
        );
        // absence is never coerced, even when loose
        let err = run(&t::boolean().strict(false).path("x"), &subject).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn falsy_defaults_apply() {
        let empty = json!({});
        assert_eq!(
            run(&t::string().path("x").default_value(""), &empty),
            Ok(Some(json!("")))
        );
        assert_eq!(
            run(&t::number().path("x").default_value(0), &empty),
            Ok(Some(json!(0)))
        );
        assert_eq!(
            run(&t::boolean().path("x").default_value(false), &empty),
            Ok(Some(json!(false)))
        );
        // defaults also cover found-but-unparsable values
        let bad = json!({ "x": "abc" });
        assert_eq!(
            run(&t::number().path("x").default_value(7), &bad),
            Ok(Some(json!(7)))
        );
        // default wins over optional
        assert_eq!(
            run(&t::number().path("x").default_value(7).optional(), &bad),
            Ok(Some(json!(7)))
        );
    }

    #[test]
    fn optional_absorbs() {
        let empty = json!({});
        for schema in [
            t::string().path("x"),
            t::number().path("x"),
            t::boolean().path("x"),
            t::array(t::string()).path("x"),
            t::object([("x", t::string())]).path("x"),
            t::union([t::number().path("x")]),
            t::custom(|_| anyhow::bail!("nope")),
        ] {
            assert!(run(&schema, &empty).is_err(), "{schema:?} should fail");
            assert_eq!(run(&schema.optional(), &empty), Ok(None), "{schema:?}");
        }
    }

    #[test]
    fn any_passes_through_and_defaults() {
        let subject = json!({ "user": { "name": "JohnD" }, "nil": null });
        assert_eq!(
            run(&t::any().path("user"), &subject),
            Ok(Some(json!({ "name": "JohnD" })))
        );
        assert_eq!(
            run(&t::any().path("nil").default_value(1), &subject),
            Ok(Some(Value::Null))
        );
        assert_eq!(run(&t::any().path("missing"), &subject), Ok(None));
        assert_eq!(
            run(&t::any().path("missing").default_value("d"), &subject),
            Ok(Some(json!("d")))
        );
    }

    #[test]
    fn custom_transform() {
        let upper = t::custom(|v| {
            let s = v
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("expected text"))?;
            Ok(Value::String(s.to_uppercase()))
        });
        let subject = json!({ "name": "ada", "age": 36 });
        assert_eq!(
            run(&upper.clone().path("name"), &subject),
            Ok(Some(json!("ADA")))
        );
        let err = run(&upper.clone().path("age"), &subject).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnableToParse);
        assert_eq!(err.detail.as_deref(), Some("expected text"));
        assert_eq!(err.to_string(), "Custom transform failed: expected text");
        assert_eq!(run(&upper.path("age").optional(), &subject), Ok(None));
    }

    #[test]
    fn custom_sees_raw_value_including_absence() {
        let absent = t::custom(|v| Ok(json!(v.is_none()))).path("missing");
        assert_eq!(run(&absent, &json!({})), Ok(Some(json!(true))));
    }

    #[test]
    fn array_filters_undefined_elements() {
        let subject = json!({ "obj": { "array": ["123", "asd", "123.35", "-2.3"] } });
        let schema = t::array(t::number().optional()).path("obj.array");
        assert_eq!(run(&schema, &subject), Ok(Some(json!([123, 123.35, -2.3]))));

        let strict = t::array(t::number()).path("obj.array");
        assert_eq!(
            run(&strict, &subject).unwrap_err().kind,
            ErrorKind::UnableToParse
        );
        // an optional array absorbs a failing required element
        assert_eq!(run(&strict.optional(), &subject), Ok(None));
    }

    #[test]
    fn array_shape_errors() {
        let subject = json!({ "s": "text" });
        let err = run(&t::array(t::string()).path("s"), &subject).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);
        let missing = run(&t::array(t::string()).path("none"), &subject);
        assert_eq!(missing.unwrap_err().kind, ErrorKind::NotFound);
    }

    #[test]
    fn object_fields_chain_addresses() {
        let subject = json!({
            "id": "123456",
            "user": { "name": "JohnD" },
            "contactInfo": { "phoneNumbers": ["123", "345", "567"] }
        });
        let schema = t::object([
            ("id", t::number()),
            ("user", t::object([("name", t::string())])),
            ("phone", t::number().path("contactInfo.phoneNumbers.[-2]")),
        ]);
        assert_eq!(
            run(&schema, &subject),
            Ok(Some(json!({ "id": 123456, "user": { "name": "JohnD" }, "phone": 345 })))
        );
    }

    #[test]
    fn object_path_rebases_fields() {
        let subject = json!({ "user": { "public": { "name": "Kenneth", "phone": "8182381283" } } });
        let schema = t::object([("name", t::string()), ("phone", t::number())]);
        let schema = schema.path("user.public");
        assert_eq!(
            run(&schema, &subject),
            Ok(Some(json!({ "name": "Kenneth", "phone": 8182381283i64 })))
        );
    }

    #[test]
    fn optional_object_is_all_or_nothing() {
        let subject = json!({ "obj": { "a": "1", "b": "x" } });
        let inner = t::object([("a", t::number()), ("b", t::number())]);
        let schema = t::object([("obj", inner.optional())]);
        assert_eq!(run(&schema, &subject), Ok(Some(json!({}))));

        let required = t::object([("obj", inner)]);
        let err = run(&required, &subject).unwrap_err();
        assert_eq!(err.key, Some(Key::Path("obj.b".into())));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let schema = t::object([("obj", t::object([("value", t::string())]).optional())]);
        assert_eq!(run(&schema, &json!({})), Ok(Some(json!({}))));
    }

    #[test]
    fn object_requires_a_mapping() {
        let schema = t::object([("x", t::string())]);
        assert_eq!(
            run(&schema, &Value::Null).unwrap_err().kind,
            ErrorKind::InvalidType
        );
        assert_eq!(
            run(&schema, &json!([1])).unwrap_err().kind,
            ErrorKind::InvalidType
        );
        assert_eq!(run(&schema.optional(), &Value::Null), Ok(None));
    }

    #[test]
    fn union_first_match_wins() {
        let subject = json!({ "v2": "-123", "v3": "1" });
        let schema = t::union([t::number().path("v2"), t::string().path("v3")]);
        assert_eq!(run(&schema, &subject), Ok(Some(json!(-123))));
        let flipped = t::union([t::string().path("v3"), t::number().path("v2")]);
        assert_eq!(run(&flipped, &subject), Ok(Some(json!("1"))));
    }

    #[test]
    fn union_failure_lists_addresses() {
        let schema = t::union([t::number().path("a"), t::boolean().path("b")]);
        let err = run(&schema, &json!({ "a": "x", "b": 1 })).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);
        assert_eq!(err.expected, ExpectedType::Union);
        assert_eq!(err.key, Some(Key::Paths(vec!["a".into(), "b".into()])));
        assert_eq!(run(&schema.optional(), &json!({})), Ok(None));
    }

    #[test]
    fn union_accepts_an_undefined_success() {
        let schema = t::union([t::number().path("a").optional(), t::string().path("b")]);
        assert_eq!(run(&schema, &json!({ "b": "text" })), Ok(None));
    }

    #[test]
    fn union_over_absent_field_is_not_found() {
        let schema = t::object([("x", t::union([t::number(), t::string()]))]);
        let err = run(&schema, &json!({})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.expected, ExpectedType::Union);
        assert_eq!(err.found, ValueType::Undefined);
        assert_eq!(err.key, Some(Key::Paths(vec!["x".into(), "x".into()])));
    }

    #[test]
    fn field_names_are_literal_keys() {
        let subject = json!({
            "\\[0]": "escaped",
            "[0]": "bracketed",
            "a.b": "dotted",
            "a": { "b": "nested" }
        });
        let schema = t::object([
            ("\\[0]", t::string()),
            ("[0]", t::string()),
            ("a.b", t::string()),
        ]);
        assert_eq!(
            run(&schema, &subject),
            Ok(Some(json!({ "\\[0]": "escaped", "[0]": "bracketed", "a.b": "dotted" })))
        );

        let schema = t::object([("[0]", t::number())]);
        let err = run(&schema, &json!({})).unwrap_err();
        assert_eq!(err.key, Some(Key::Path("\\[0]".into())));
    }

    #[test]
    fn parsing_never_mutates_the_schema() {
        let schema = t::object([
            ("a", t::number()),
            ("b", t::array(t::string()).optional()),
        ]);
        let before = format!("{schema:?}");
        let input = json!({ "a": "1", "b": [1, 2] });
        let first = run(&schema, &input);
        let second = run(&schema, &input);
        assert_eq!(first, second);
        assert_eq!(format!("{schema:?}"), before);
    }
}
