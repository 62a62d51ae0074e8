//! FILENAME: core/engine/src/cell.rs
//! PURPOSE: Defines the stored form of a single table cell.
//! CONTEXT: Every cell keeps two things: the typed `value` used for sorting
//! and aggregation, and the `title` shown to the user and matched by filters.
//! Raw cells arrive as loose JSON and are coerced by their column (see column.rs).

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::cmp::Ordering;

/// The typed content of a cell after coercion.
/// Serializes as `null`, a JSON number, or a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Ordering used by row sorting: empty first, then numbers, then text.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
            (CellValue::Empty, _) => Ordering::Less,
            (_, CellValue::Empty) => Ordering::Greater,
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Number(_), CellValue::Text(_)) => Ordering::Less,
            (CellValue::Text(_), CellValue::Number(_)) => Ordering::Greater,
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
        }
    }
}

/// The atomic unit of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub title: String,
}

impl Cell {
    pub fn new(value: CellValue, title: String) -> Self {
        Cell { value, title }
    }

    pub fn empty() -> Self {
        Cell {
            value: CellValue::Empty,
            title: String::new(),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

/// A cell exactly as supplied at initialization: `{ "value": .., "title": .. }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCell {
    pub value: Json,
    pub title: Option<Json>,
}

impl RawCell {
    pub fn new(value: impl Into<Json>) -> Self {
        RawCell {
            value: value.into(),
            title: None,
        }
    }

    pub fn titled(value: impl Into<Json>, title: impl Into<String>) -> Self {
        RawCell {
            value: value.into(),
            title: Some(Json::String(title.into())),
        }
    }

    /// Reads a raw cell from arbitrary JSON. A bare scalar is taken as the value.
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Object(map) => RawCell {
                value: map.get("value").cloned().unwrap_or(Json::Null),
                title: map.get("title").filter(|t| !t.is_null()).cloned(),
            },
            other => RawCell::new(other.clone()),
        }
    }

    /// The explicit title, stringified, if one was given.
    pub fn explicit_title(&self) -> Option<String> {
        self.title.as_ref().filter(|t| !t.is_null()).map(stringify)
    }
}

/// Formats a number without unnecessary decimal places.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Renders a JSON value the way it is shown in a cell title.
pub fn stringify(json: &Json) -> String {
    match json {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_serialize_as_plain_json() {
        assert_eq!(serde_json::to_value(CellValue::Empty).unwrap(), json!(null));
        assert_eq!(serde_json::to_value(CellValue::Number(2.5)).unwrap(), json!(2.5));
        assert_eq!(serde_json::to_value(CellValue::Text("a".into())).unwrap(), json!("a"));
    }

    #[test]
    fn empty_sorts_before_everything() {
        assert_eq!(CellValue::Empty.compare(&CellValue::Number(-1e9)), Ordering::Less);
        assert_eq!(CellValue::Text("a".into()).compare(&CellValue::Empty), Ordering::Greater);
        assert_eq!(CellValue::Number(2.0).compare(&CellValue::Number(10.0)), Ordering::Less);
        assert_eq!(
            CellValue::Text("10".into()).compare(&CellValue::Text("2".into())),
            Ordering::Less
        );
    }

    #[test]
    fn stringify_drops_integral_decimals() {
        assert_eq!(stringify(&json!(3)), "3");
        assert_eq!(stringify(&json!(3.0)), "3");
        assert_eq!(stringify(&json!(3.25)), "3.25");
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!(true)), "true");
    }

    #[test]
    fn raw_cell_accepts_bare_scalars() {
        assert_eq!(RawCell::from_json(&json!(7)), RawCell::new(7));
        let raw = RawCell::from_json(&json!({"value": 1, "title": "one"}));
        assert_eq!(raw.explicit_title().as_deref(), Some("one"));
        let untitled = RawCell::from_json(&json!({"value": 1, "title": null}));
        assert_eq!(untitled.explicit_title(), None);
    }
}
