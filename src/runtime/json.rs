//! JSON coercion for string literals.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde_json::Value as Json;

use crate::runtime::dict::Dict;
use crate::runtime::value::Value;

/// Returns the decoded value when `text` is a JSON document, otherwise the text itself.
pub fn coerce_literal(text: &str) -> Value {
    match text.trim() {
        "NaN" => return Value::Real(f64::NAN),
        "Infinity" => return Value::Real(f64::INFINITY),
        "-Infinity" => return Value::Real(f64::NEG_INFINITY),
        _ => {}
    }
    match serde_json::from_str::<Json>(text) {
        Ok(json) => Value::from(json),
        Err(_) => Value::Str(text.to_string()),
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::None,
            Json::Bool(value) => Value::Bool(value),
            Json::Number(number) => match number.as_i64() {
                Some(value) => Value::from(value),
                None => match number.as_str().parse::<BigInt>() {
                    Ok(value) => Value::Int(value),
                    Err(_) => Value::Real(number.as_f64().unwrap_or(f64::NAN)),
                },
            },
            Json::String(value) => Value::Str(value),
            Json::Array(values) => Value::List(values.into_iter().map(Value::from).collect()),
            Json::Object(entries) => {
                let mut dict = Dict::new();
                for (key, value) in entries {
                    dict.insert_str(key, Value::from(value));
                }
                Value::Dict(dict)
            }
        }
    }
}

impl From<&Value> for Json {
    fn from(value: &Value) -> Self {
        match value {
            Value::None => Json::Null,
            Value::Bool(value) => Json::Bool(*value),
            Value::Int(value) => match value.to_i64() {
                Some(value) => Json::from(value),
                None => value
                    .to_string()
                    .parse::<serde_json::Number>()
                    .map(Json::Number)
                    .unwrap_or(Json::Null),
            },
            Value::Real(value) => serde_json::Number::from_f64(*value)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(value) => Json::String(value.clone()),
            Value::List(values) => Json::Array(values.iter().map(Json::from).collect()),
            Value::Dict(dict) => Json::Object(
                dict.iter()
                    .map(|(key, value)| (key.to_output(), Json::from(value)))
                    .collect(),
            ),
        }
    }
}
