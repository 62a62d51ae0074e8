//! FILENAME: core/engine/tests/table_properties.rs
//! PURPOSE: End-to-end behaviour of a table through its public API.

use engine::{
    Bounds, CellValue, ColumnId, ColumnSpec, EngineConfig, EvalResult, FilterCriteria, InitData,
    RawCell, RowId, SortOutcome, Table,
};
use serde_json::json;

fn number_table(values: &[i64], tags: &[&str]) -> Table {
    let specs = vec![
        ColumnSpec::typed("number").with_formula("{{ sum }}"),
        ColumnSpec::typed("string"),
    ];
    let rows: Vec<Vec<RawCell>> = values
        .iter()
        .zip(tags)
        .map(|(v, t)| vec![RawCell::new(*v), RawCell::new(*t)])
        .collect();
    Table::new(&EngineConfig::default(), &specs, &rows).unwrap()
}

fn ids(table: &Table) -> Vec<u32> {
    table.order().iter().map(|id| id.0).collect()
}

// ============================================================================
// ENUM COERCION
// ============================================================================

#[test]
fn enum_label_absent_from_list_maps_to_first_label() {
    let init: InitData = serde_json::from_value(json!({
        "cols": [{"type": "enum", "value": "new,open,closed"}],
        "rows": [[{"value": "closed"}], [{"value": "archived", "title": "Archived"}]]
    }))
    .unwrap();
    let table = Table::from_json(&EngineConfig::default(), &init).unwrap();

    assert_eq!(table.select_cell(RowId(1), ColumnId(1)), Some(CellValue::Number(2.0)));
    assert_eq!(table.select_cell(RowId(2), ColumnId(1)), Some(CellValue::Number(0.0)));

    let page = table.select_rows(None, None);
    let list = page.list.unwrap();
    assert_eq!(list[1].cells[0].title, "new");
}

// ============================================================================
// SORTING
// ============================================================================

#[test]
fn sort_ties_keep_insertion_order_both_ways() {
    let mut table = number_table(&[5, 3, 5, 3, 5], &["a", "b", "c", "d", "e"]);

    table.order_rows("1", "asc");
    assert_eq!(ids(&table), vec![2, 4, 1, 3, 5]);

    table.order_rows("1", "desc");
    assert_eq!(ids(&table), vec![1, 3, 5, 2, 4]);
}

#[test]
fn asc_desc_reset_restores_insertion_order() {
    let mut table = number_table(&[9, 2, 7, 4], &["w", "x", "y", "z"]);

    table.order_rows("1", "asc");
    table.order_rows("1", "desc");
    assert_eq!(table.order_rows("", ""), SortOutcome::Ordered);

    assert_eq!(table.order(), table.rows().store());
}

#[test]
fn empty_cells_sort_first() {
    let specs = vec![ColumnSpec::typed("number")];
    let rows = vec![
        vec![RawCell::new(2)],
        vec![RawCell::new(serde_json::Value::Null)],
        vec![RawCell::new(1)],
    ];
    let mut table = Table::new(&EngineConfig::default(), &specs, &rows).unwrap();

    table.order_rows("1", "asc");
    assert_eq!(ids(&table), vec![2, 3, 1]);
}

// ============================================================================
// FILTERING AND TOTALS
// ============================================================================

#[test]
fn totals_follow_the_filtered_view() {
    let mut table = number_table(&[3, 1, 4, 1, 5], &["big", "small", "big", "small", "big"]);

    let totals = table.totals().get(ColumnId(1)).unwrap();
    assert_eq!(totals.sum, 14.0);
    assert_eq!(totals.max, Some(5.0));
    assert_eq!(totals.min, Some(1.0));

    table.filter_rows(&FilterCriteria::new().with("2", "big")).unwrap();

    let totals = table.totals().get(ColumnId(1)).unwrap();
    assert_eq!(totals.sum, 12.0);
    assert_eq!(totals.max, Some(5.0));
    assert_eq!(totals.min, Some(3.0));
    assert_eq!(table.count_cols()[&ColumnId(1)], EvalResult::Number(12.0));
}

#[test]
fn filters_combine_with_and() {
    let mut table = number_table(&[10, 11, 20, 21], &["red", "blue", "red", "blue"]);

    table
        .filter_rows(&FilterCriteria::new().with("1", "2*").with("2", "RED"))
        .unwrap();
    assert_eq!(ids(&table), vec![3]);

    table
        .filter_rows(&FilterCriteria::new().with("1", "1*").with("2", "green"))
        .unwrap();
    assert!(table.order().is_empty());
    assert_eq!(table.totals().get(ColumnId(1)).unwrap().min, None);
    assert_eq!(table.select_rows(None, None).list, None);
}

#[test]
fn pattern_on_unknown_column_matches_nothing() {
    let mut table = number_table(&[1, 2], &["a", "b"]);
    table.filter_rows(&FilterCriteria::new().with("7", "a")).unwrap();
    assert!(table.order().is_empty());
}

#[test]
fn filter_keeps_remembered_sort() {
    let mut table = number_table(&[1, 2, 3, 4], &["keep", "drop", "keep", "keep"]);

    table.order_rows("1", "desc");
    table.filter_rows(&FilterCriteria::new().with("2", "keep")).unwrap();
    assert_eq!(ids(&table), vec![4, 3, 1]);

    table.filter_rows(&FilterCriteria::new()).unwrap();
    assert_eq!(ids(&table), vec![4, 3, 2, 1]);
}

// ============================================================================
// PAGING
// ============================================================================

#[test]
fn paging_over_120_rows() {
    let values: Vec<i64> = (0..120).collect();
    let tags = vec!["t"; 120];
    let table = number_table(&values, &tags);

    let first = table.select_rows(Some(0), Some(50));
    assert_eq!(first.now, Some(Bounds { from: 0, till: 50 }));
    assert_eq!(first.bwd, None);
    assert_eq!(first.fwd, Some(Bounds { from: 50, till: 100 }));
    assert_eq!(first.list.as_ref().map(Vec::len), Some(50));

    let last = table.select_rows(Some(100), Some(50));
    assert_eq!(last.now, Some(Bounds { from: 100, till: 120 }));
    assert_eq!(last.bwd, Some(Bounds { from: 50, till: 100 }));
    assert_eq!(last.fwd, None);
    assert_eq!(last.list.as_ref().map(Vec::len), Some(20));
}

#[test]
fn window_serializes_without_absent_ranges() {
    let table = number_table(&[1], &["x"]);
    let json = serde_json::to_value(table.select_rows(None, None)).unwrap();

    assert_eq!(json["now"], json!({"from": 0, "till": 1}));
    assert!(json.get("bwd").is_none());
    assert!(json.get("fwd").is_none());
    assert_eq!(json["list"][0]["id"], json!("1"));
    assert_eq!(json["list"][0]["cells"][0], json!({"value": 1.0, "title": "1"}));
}

// ============================================================================
// FORMULAS
// ============================================================================

#[test]
fn count_cols_is_idempotent() {
    let specs = vec![
        ColumnSpec::typed("number").with_formula("{{ sum }} / {{ rows }}"),
        ColumnSpec::typed("number").with_formula("{{ 1.max }} - {{ min }}"),
        ColumnSpec::typed("string").with_formula("{{ bogus"),
    ];
    let rows: Vec<Vec<RawCell>> = (1..=4)
        .map(|n| vec![RawCell::new(n), RawCell::new(n * 10), RawCell::new("x")])
        .collect();
    let table = Table::new(&EngineConfig::default(), &specs, &rows).unwrap();

    let first = table.count_cols();
    assert_eq!(first[&ColumnId(1)], EvalResult::Number(2.5));
    assert_eq!(first[&ColumnId(2)], EvalResult::Number(-6.0));
    assert_eq!(serde_json::to_value(&first[&ColumnId(3)]).unwrap(), json!("#PARSE!"));

    assert_eq!(table.count_cols(), first);
    assert_eq!(table.count_cols(), first);
}
