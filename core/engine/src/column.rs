//! FILENAME: core/engine/src/column.rs
//! PURPOSE: Column definitions and the registry that owns them.
//! CONTEXT: Columns are declared once at initialization, in display order.
//! The position of a column in that order is also the position of its cell
//! in every row, and its id is `position + 1`.

use crate::cell::{stringify, Cell, CellValue, RawCell};
use crate::config::TypeMode;
use crate::error::{EngineError, Result};
use crate::id::ColumnId;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parser::{parse, Expression, ParseError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

// ============================================================================
// COLUMN TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Date,
    Enum,
}

impl ColumnType {
    /// Reads a declared type. Anything that does not start with
    /// `number`, `date` or `enum` is not a declaration.
    pub fn from_declared(declared: &str) -> Option<ColumnType> {
        let lower = declared.trim().to_ascii_lowercase();
        if lower.starts_with("number") {
            Some(ColumnType::Number)
        } else if lower.starts_with("date") {
            Some(ColumnType::Date)
        } else if lower.starts_with("enum") {
            Some(ColumnType::Enum)
        } else if lower.starts_with("string") {
            Some(ColumnType::String)
        } else {
            None
        }
    }

    /// Guesses a type from a sample value of the first row.
    pub fn infer(sample: &Json) -> ColumnType {
        match sample {
            Json::Number(_) => ColumnType::Number,
            Json::String(s) if parse_date_millis(s).is_some() => ColumnType::Date,
            _ => ColumnType::String,
        }
    }
}

// ============================================================================
// INPUT SPEC
// ============================================================================

/// A column exactly as supplied at initialization. Every field is optional
/// and accepts any JSON; `Column::define` coerces instead of rejecting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    /// Only a string is a declaration.
    #[serde(rename = "type")]
    pub kind: Option<Json>,
    /// Any truthy value makes the column virtual.
    #[serde(rename = "virtual")]
    pub is_virtual: Option<Json>,
    /// The three flags are on unless literally `false`.
    pub sortable: Option<Json>,
    pub countable: Option<Json>,
    pub filterable: Option<Json>,
    pub title: Option<Json>,
    pub css: Option<Json>,
    pub align: Option<Json>,
    pub valign: Option<Json>,
    pub width: Option<Json>,
    pub bgcolor: Option<Json>,
    pub formula: Option<Json>,
    /// Enum columns: comma-delimited label list.
    pub value: Option<Json>,
}

impl ColumnSpec {
    pub fn typed(kind: &str) -> Self {
        ColumnSpec {
            kind: Some(Json::String(kind.to_string())),
            ..Default::default()
        }
    }

    pub fn with_formula(mut self, formula: &str) -> Self {
        self.formula = Some(Json::String(formula.to_string()));
        self
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual.as_ref().map_or(false, is_truthy)
    }

    fn declared_type(&self) -> Option<ColumnType> {
        ColumnType::from_declared(&text_field(&self.kind))
    }
}

/// Unset or anything but `false` reads as on.
fn flag_on(field: &Option<Json>) -> bool {
    !matches!(field, Some(Json::Bool(false)))
}

/// Non-empty string fields pass through; everything else becomes "".
fn text_field(field: &Option<Json>) -> String {
    match field {
        Some(Json::String(s)) => s.clone(),
        _ => String::new(),
    }
}

// ============================================================================
// NORMALIZED COLUMN
// ============================================================================

/// A normalized column definition. Serializes as the `select cols` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub id: ColumnId,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    pub sortable: bool,
    pub countable: bool,
    pub filterable: bool,
    pub css: String,
    pub align: String,
    pub valign: String,
    pub title: String,
    pub width: String,
    pub bgcolor: String,
    pub formula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip)]
    labels: Vec<String>,
    #[serde(skip)]
    compiled: Option<std::result::Result<Expression, ParseError>>,
}

impl Column {
    fn define(spec: &ColumnSpec, position: usize, kind: ColumnType, mode: TypeMode) -> Column {
        let id = ColumnId::from_position(position);

        let title = match &spec.title {
            Some(t) if is_truthy(t) => stringify(t),
            _ => format!("#{}", id),
        };

        let is_virtual = spec.is_virtual();
        let mut formula = text_field(&spec.formula);
        if formula.is_empty() && mode == TypeMode::Inferred && !is_virtual {
            formula = match kind {
                ColumnType::Number => "{{ avg }}".to_string(),
                ColumnType::String => "{{ rows }}".to_string(),
                _ => String::new(),
            };
        }

        let compiled = if formula.trim().is_empty() || is_virtual {
            None
        } else {
            Some(parse(&formula))
        };

        let (value, labels) = match kind {
            ColumnType::Enum => {
                let list = text_field(&spec.value);
                let labels = list.split(',').map(str::to_string).collect();
                (Some(list), labels)
            }
            _ => (None, Vec::new()),
        };

        Column {
            id,
            kind,
            is_virtual,
            sortable: !is_virtual && flag_on(&spec.sortable),
            countable: flag_on(&spec.countable),
            filterable: flag_on(&spec.filterable),
            css: text_field(&spec.css),
            align: match &spec.align {
                Some(Json::String(s)) if s == "right" => s.clone(),
                _ => String::new(),
            },
            valign: text_field(&spec.valign),
            title,
            width: text_field(&spec.width),
            bgcolor: text_field(&spec.bgcolor),
            formula,
            value,
            labels,
            compiled,
        }
    }

    /// The parsed formula, if the column has one.
    pub fn compiled_formula(&self) -> Option<&std::result::Result<Expression, ParseError>> {
        self.compiled.as_ref()
    }

    /// Coerces a raw input cell according to this column's type.
    pub fn coerce(&self, raw: &RawCell) -> Cell {
        let title = raw.explicit_title();

        match self.kind {
            ColumnType::String => {
                let value = match &raw.value {
                    Json::Null => CellValue::Empty,
                    other => CellValue::Text(stringify(other)),
                };
                Cell::new(value, title.unwrap_or_else(|| stringify(&raw.value)))
            }
            ColumnType::Number => {
                let value = json_to_number(&raw.value).map_or(CellValue::Empty, CellValue::Number);
                Cell::new(value, title.unwrap_or_else(|| stringify(&raw.value)))
            }
            ColumnType::Date => {
                let value = json_to_millis(&raw.value).map_or(CellValue::Empty, CellValue::Number);
                Cell::new(value, title.unwrap_or_else(|| stringify(&raw.value)))
            }
            ColumnType::Enum => {
                let label = stringify(&raw.value);
                match self.labels.iter().position(|l| *l == label) {
                    Some(index) => Cell::new(CellValue::Number(index as f64), title.unwrap_or(label)),
                    // Unknown labels fall back to the first one, title included.
                    None => Cell::new(
                        CellValue::Number(0.0),
                        self.labels.first().cloned().unwrap_or_default(),
                    ),
                }
            }
        }
    }
}

fn is_truthy(json: &Json) -> bool {
    match json {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::String(s) => !s.is_empty(),
        Json::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        _ => true,
    }
}

fn json_to_number(json: &Json) -> Option<f64> {
    match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Json::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn json_to_millis(json: &Json) -> Option<f64> {
    match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => parse_date_millis(s),
        _ => None,
    }
}

/// Parses RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` and plain
/// `YYYY-MM-DD` dates (both as UTC) into epoch milliseconds.
pub fn parse_date_millis(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis() as f64);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Ordered set of columns, addressable by id or by position.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<Column>,
    by_key: FxHashMap<String, usize>,
}

impl ColumnRegistry {
    /// Normalizes raw specs into columns. `sample` is the first data row,
    /// consulted only in `TypeMode::Inferred`.
    pub fn define(specs: &[ColumnSpec], mode: TypeMode, sample: Option<&[RawCell]>) -> Result<Self> {
        if specs.is_empty() {
            return Err(EngineError::Config("No cols array given".to_string()));
        }

        let mut columns = Vec::with_capacity(specs.len());
        let mut by_key = FxHashMap::default();

        for (position, spec) in specs.iter().enumerate() {
            let declared = spec.declared_type();
            let kind = match (declared, mode) {
                (Some(kind), _) => kind,
                (None, TypeMode::Declared) => ColumnType::String,
                (None, TypeMode::Inferred) => sample
                    .and_then(|row| row.get(position))
                    .map_or(ColumnType::String, |cell| ColumnType::infer(&cell.value)),
            };

            let column = Column::define(spec, position, kind, mode);
            by_key.insert(column.id.to_string(), position);
            columns.push(column);
        }

        Ok(ColumnRegistry { columns, by_key })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.position()).filter(|c| c.id == id)
    }

    /// Looks a column up by its wire key ("3").
    pub fn lookup(&self, key: &str) -> Option<&Column> {
        self.by_key
            .get(key.trim())
            .and_then(|&pos| self.columns.get(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Columns that are emitted to the caller.
    pub fn visible(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_virtual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(json: Json) -> ColumnSpec {
        serde_json::from_value(json).unwrap()
    }

    fn registry(specs: Vec<ColumnSpec>) -> ColumnRegistry {
        ColumnRegistry::define(&specs, TypeMode::Declared, None).unwrap()
    }

    #[test]
    fn empty_spec_list_is_a_config_error() {
        let err = ColumnRegistry::define(&[], TypeMode::Declared, None).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn normalizes_metadata() {
        let reg = registry(vec![
            spec(json!({"type": "number", "align": "center", "css": 5, "title": "Price"})),
            spec(json!({"virtual": true, "sortable": true})),
            spec(json!({"type": "weird", "align": "right", "width": "40px"})),
        ]);

        let price = reg.get(ColumnId(1)).unwrap();
        assert_eq!(price.kind, ColumnType::Number);
        assert_eq!(price.align, "");
        assert_eq!(price.css, "");
        assert_eq!(price.title, "Price");
        assert!(price.sortable && price.countable && price.filterable);

        let hidden = reg.get(ColumnId(2)).unwrap();
        assert!(hidden.is_virtual);
        assert!(!hidden.sortable);
        assert_eq!(hidden.title, "#2");

        let other = reg.lookup("3").unwrap();
        assert_eq!(other.kind, ColumnType::String);
        assert_eq!(other.align, "right");
        assert_eq!(other.width, "40px");
        assert_eq!(reg.visible().count(), 2);
    }

    #[test]
    fn enum_unknown_label_falls_back_to_first() {
        let reg = registry(vec![spec(json!({"type": "enum", "value": "low,mid,high"}))]);
        let col = reg.get(ColumnId(1)).unwrap();

        let known = col.coerce(&RawCell::new("high"));
        assert_eq!(known.value, CellValue::Number(2.0));
        assert_eq!(known.title, "high");

        let unknown = col.coerce(&RawCell::titled("extreme", "Extreme!"));
        assert_eq!(unknown.value, CellValue::Number(0.0));
        assert_eq!(unknown.title, "low");
    }

    #[test]
    fn number_coercion() {
        let reg = registry(vec![ColumnSpec::typed("number")]);
        let col = reg.get(ColumnId(1)).unwrap();

        assert_eq!(col.coerce(&RawCell::new(4)).value, CellValue::Number(4.0));
        assert_eq!(col.coerce(&RawCell::new(" 2.5 ")).value, CellValue::Number(2.5));
        assert_eq!(col.coerce(&RawCell::new(true)).value, CellValue::Number(1.0));
        assert_eq!(col.coerce(&RawCell::new("n/a")).value, CellValue::Empty);
        assert_eq!(col.coerce(&RawCell::new(Json::Null)).value, CellValue::Empty);
        assert_eq!(col.coerce(&RawCell::new(4)).title, "4");
    }

    #[test]
    fn date_coercion_yields_epoch_millis() {
        let reg = registry(vec![ColumnSpec::typed("date")]);
        let col = reg.get(ColumnId(1)).unwrap();

        assert_eq!(
            col.coerce(&RawCell::new("1970-01-02")).value,
            CellValue::Number(86_400_000.0)
        );
        assert_eq!(
            col.coerce(&RawCell::new("1970-01-01T00:00:01Z")).value,
            CellValue::Number(1000.0)
        );
        assert_eq!(col.coerce(&RawCell::new(42)).value, CellValue::Number(42.0));
        assert_eq!(col.coerce(&RawCell::new("yesterday")).value, CellValue::Empty);
    }

    #[test]
    fn inferred_mode_reads_first_row_and_adds_default_formulas() {
        let specs = vec![
            ColumnSpec::default(),
            ColumnSpec::default(),
            ColumnSpec::default(),
            ColumnSpec::typed("string"),
        ];
        let sample = vec![
            RawCell::new(10),
            RawCell::new("2024-03-01"),
            RawCell::new("hello"),
            RawCell::new(7),
        ];
        let reg = ColumnRegistry::define(&specs, TypeMode::Inferred, Some(&sample)).unwrap();

        let kinds: Vec<ColumnType> = reg.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ColumnType::Number, ColumnType::Date, ColumnType::String, ColumnType::String]
        );
        assert_eq!(reg.get(ColumnId(1)).unwrap().formula, "{{ avg }}");
        assert_eq!(reg.get(ColumnId(2)).unwrap().formula, "");
        assert_eq!(reg.get(ColumnId(3)).unwrap().formula, "{{ rows }}");
    }

    #[test]
    fn formulas_are_compiled_once() {
        let reg = registry(vec![
            ColumnSpec::typed("number").with_formula("{{ sum }} * 2"),
            ColumnSpec::typed("number").with_formula("{{ sum"),
            ColumnSpec::typed("number"),
        ]);

        assert!(matches!(reg.get(ColumnId(1)).unwrap().compiled_formula(), Some(Ok(_))));
        assert!(matches!(reg.get(ColumnId(2)).unwrap().compiled_formula(), Some(Err(_))));
        assert!(reg.get(ColumnId(3)).unwrap().compiled_formula().is_none());
    }

    #[test]
    fn serializes_for_select_cols() {
        let reg = registry(vec![spec(json!({"type": "enum", "value": "a,b"}))]);
        let json = serde_json::to_value(reg.get(ColumnId(1)).unwrap()).unwrap();
        assert_eq!(json["id"], json!("1"));
        assert_eq!(json["type"], json!("enum"));
        assert_eq!(json["value"], json!("a,b"));
        assert!(json.get("labels").is_none());
    }
}
