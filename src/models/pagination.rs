use crate::error::ApiResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

impl<T> Paginated<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

impl<T: DeserializeOwned> Paginated<T> {
    /// Normalize a list response into a page.
    ///
    /// Some endpoints return a bare array, others a
    /// `{count, next, previous, results}` envelope. Any other shape yields an
    /// empty page; items that fail to decode are an error.
    pub fn normalize(data: Value) -> ApiResult<Self> {
        match data {
            Value::Array(items) => {
                let results = decode_items(items)?;
                Ok(Self {
                    count: results.len() as u64,
                    next: None,
                    previous: None,
                    results,
                })
            }
            Value::Object(mut map) => {
                let items = match map.remove("results") {
                    Some(Value::Array(items)) => items,
                    _ => return Ok(Self::default()),
                };
                let results = decode_items(items)?;
                let count = map
                    .get("count")
                    .and_then(coerce_count)
                    .unwrap_or(results.len() as u64);
                Ok(Self {
                    count,
                    next: string_field(&map, "next"),
                    previous: string_field(&map, "previous"),
                    results,
                })
            }
            _ => Ok(Self::default()),
        }
    }
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> ApiResult<Vec<T>> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(Into::into))
        .collect()
}

/// Count as a non-negative whole number, accepting numeric strings and
/// integral floats
fn coerce_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| coerce_count(&Value::from(s.parse::<f64>().ok()?)))
        }
        _ => None,
    }
}

fn string_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}
