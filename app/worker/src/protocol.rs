//! FILENAME: app/worker/src/protocol.rs
//! PURPOSE: Message envelopes exchanged between a caller and a worker.
//! CONTEXT: Every message carries the correlation token (`slug`) bound at
//! init. Requests and responses are named with the spaced names the view
//! layer uses ("init data", "order rows", ...) and carry their payload
//! under `source`:
//!
//!   { "slug": "...", "request":  { "name": "order rows", "source": { "col": "2", "order": "desc" } } }
//!   { "slug": "...", "response": { "name": "order rows" } }

use engine::{CellValue, ColumnId, ColumnInfo, EvalResult, FilterCriteria, InitData, RowId, WindowResult};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// CORRELATION TOKEN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(pub String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Self {
        Slug(value.into())
    }

    /// Mints a fresh random token.
    pub fn generate() -> Self {
        Slug(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// REQUESTS
// ============================================================================

/// Accepts a string, a number (stringified) or nothing (empty).
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Json>::deserialize(deserializer)? {
        None | Some(Json::Null) => String::new(),
        Some(Json::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderArgs {
    #[serde(deserialize_with = "lenient_string")]
    pub col: String,
    #[serde(deserialize_with = "lenient_string")]
    pub order: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterArgs {
    pub values: FilterCriteria,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowArgs {
    pub start: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellArgs {
    pub row: RowId,
    pub cell: ColumnId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", content = "source")]
pub enum Request {
    #[serde(rename = "init data")]
    InitData(InitData),
    #[serde(rename = "order rows")]
    OrderRows(OrderArgs),
    #[serde(rename = "filter rows")]
    FilterRows(FilterArgs),
    #[serde(rename = "select rows")]
    SelectRows(WindowArgs),
    #[serde(rename = "select cols")]
    SelectCols,
    #[serde(rename = "count cols")]
    CountCols,
    #[serde(rename = "select cell")]
    SelectCell(CellArgs),
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::InitData(_) => "init data",
            Request::OrderRows(_) => "order rows",
            Request::FilterRows(_) => "filter rows",
            Request::SelectRows(_) => "select rows",
            Request::SelectCols => "select cols",
            Request::CountCols => "count cols",
            Request::SelectCell(_) => "select cell",
        }
    }
}

const REQUEST_NAMES: &[&str] = &[
    "init data",
    "order rows",
    "filter rows",
    "select rows",
    "select cols",
    "count cols",
    "select cell",
];

#[derive(Deserialize)]
struct RawRequest {
    name: String,
    #[serde(default)]
    source: Json,
}

fn payload<T: DeserializeOwned, E: de::Error>(source: Json) -> Result<T, E> {
    serde_json::from_value(source).map_err(E::custom)
}

/// Callers are loose about `source`: it may be missing, `null` or `{}` for
/// requests without arguments, and partial for `select rows`. A missing
/// source reads as an empty object, so argument defaults apply.
impl<'de> Deserialize<'de> for Request {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let RawRequest { name, source } = RawRequest::deserialize(deserializer)?;
        let source = match source {
            Json::Null => Json::Object(Default::default()),
            other => other,
        };

        match name.as_str() {
            "init data" => payload(source).map(Request::InitData),
            "order rows" => payload(source).map(Request::OrderRows),
            "filter rows" => payload(source).map(Request::FilterRows),
            "select rows" => payload(source).map(Request::SelectRows),
            "select cols" => Ok(Request::SelectCols),
            "count cols" => Ok(Request::CountCols),
            "select cell" => payload(source).map(Request::SelectCell),
            other => Err(de::Error::unknown_variant(other, REQUEST_NAMES)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inbound {
    pub slug: Slug,
    pub request: Request,
}

impl Inbound {
    pub fn new(slug: &Slug, request: Request) -> Self {
        Inbound {
            slug: slug.clone(),
            request,
        }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", content = "source")]
pub enum Response {
    #[serde(rename = "init data")]
    InitData,
    #[serde(rename = "init failed")]
    InitFailed { message: String },
    /// Acknowledges both `order rows` and `filter rows`.
    #[serde(rename = "order rows")]
    OrderRows,
    #[serde(rename = "unlock view")]
    UnlockView,
    #[serde(rename = "select cols")]
    SelectCols(Vec<ColumnInfo>),
    #[serde(rename = "select rows")]
    SelectRows(WindowResult),
    #[serde(rename = "count cols")]
    CountCols(BTreeMap<ColumnId, EvalResult>),
    #[serde(rename = "select cell")]
    SelectCell(Option<CellValue>),
}

impl Response {
    pub fn name(&self) -> &'static str {
        match self {
            Response::InitData => "init data",
            Response::InitFailed { .. } => "init failed",
            Response::OrderRows => "order rows",
            Response::UnlockView => "unlock view",
            Response::SelectCols(_) => "select cols",
            Response::SelectRows(_) => "select rows",
            Response::CountCols(_) => "count cols",
            Response::SelectCell(_) => "select cell",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outbound {
    pub slug: Slug,
    pub response: Response,
}

impl Outbound {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
