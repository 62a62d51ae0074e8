//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for worker integration tests.

#![allow(dead_code)]

use engine::InitData;
use serde_json::{json, Value};
use worker::{Dispatcher, Inbound, Request, Response, Slug};

/// Test harness driving a dispatcher synchronously.
pub struct TestHarness {
    pub dispatcher: Dispatcher,
    pub slug: Slug,
}

impl TestHarness {
    /// Create a new test harness with no table yet.
    pub fn new() -> Self {
        TestHarness {
            dispatcher: Dispatcher::new(engine::EngineConfig::default()),
            slug: Slug::generate(),
        }
    }

    /// Create a harness initialized with the sample staff table.
    pub fn with_sample_data() -> Self {
        let mut harness = Self::new();
        let reply = harness.init(sample_cols(), sample_rows());
        assert_eq!(reply, Some(Response::InitData));
        harness
    }

    /// Create a harness with `rows` numbered rows in a single Number column.
    pub fn with_large_data(rows: usize) -> Self {
        let mut harness = Self::new();
        let data: Vec<Value> = (0..rows).map(|i| json!([{ "value": i }])).collect();
        let reply = harness.init(json!([{"type": "number", "formula": "{{ sum }}"}]), Value::Array(data));
        assert_eq!(reply, Some(Response::InitData));
        harness
    }

    pub fn init(&mut self, cols: Value, rows: Value) -> Option<Response> {
        self.send(Request::InitData(InitData { cols, rows }))
    }

    /// Send a request under the harness slug.
    pub fn send(&mut self, request: Request) -> Option<Response> {
        self.send_as(&self.slug.clone(), request)
    }

    /// Send a request under an arbitrary slug.
    pub fn send_as(&mut self, slug: &Slug, request: Request) -> Option<Response> {
        self.dispatcher
            .dispatch(Inbound::new(slug, request))
            .map(|out| {
                assert_eq!(&out.slug, slug, "responses carry the request slug");
                out.response
            })
    }

    /// Row ids of a `select rows` page.
    pub fn page_ids(&mut self, start: i64, limit: i64) -> Vec<String> {
        match self.send(Request::SelectRows(worker::WindowArgs {
            start: Some(start),
            limit: Some(limit),
        })) {
            Some(Response::SelectRows(window)) => window
                .list
                .unwrap_or_default()
                .iter()
                .map(|row| row.id.to_string())
                .collect(),
            other => panic!("Expected select rows, got {:?}", other),
        }
    }
}

/// Columns: Name, Age (avg), City, Salary (rounded mean), Status (enum),
/// and a virtual note column.
pub fn sample_cols() -> Value {
    json!([
        {"title": "Name"},
        {"title": "Age", "type": "number", "align": "right", "formula": "{{ avg }}"},
        {"title": "City", "filterable": false},
        {"title": "Salary", "type": "number", "formula": "ROUND({{ sum }} / {{ rows }}, 0)"},
        {"title": "Status", "type": "enum", "value": "active,inactive"},
        {"virtual": true, "title": "Note"}
    ])
}

pub fn sample_rows() -> Value {
    let data = [
        ("Alice", 30, "New York", 75000, "active"),
        ("Bob", 25, "Los Angeles", 65000, "active"),
        ("Charlie", 35, "Chicago", 85000, "inactive"),
        ("Diana", 28, "Houston", 70000, "active"),
        ("Eve", 32, "Phoenix", 80000, "active"),
        ("Frank", 45, "Philadelphia", 95000, "inactive"),
    ];
    Value::Array(
        data.iter()
            .map(|(name, age, city, salary, status)| {
                json!([
                    {"value": name},
                    {"value": age},
                    {"value": city},
                    {"value": salary, "title": format!("${}", salary)},
                    {"value": status},
                    {"value": format!("note for {}", name)}
                ])
            })
            .collect(),
    )
}
