//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the table engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.
//! The engine is a pure library: it owns no threads and does no logging.

pub mod aggregate;
pub mod cell;
pub mod column;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod id;
pub mod sort;
pub mod store;
pub mod table;
pub mod window;

// Re-export commonly used types at the crate root
pub use aggregate::{AggregateAccumulator, Totals};
pub use cell::{Cell, CellValue, RawCell};
pub use column::{Column, ColumnRegistry, ColumnSpec, ColumnType};
pub use config::{EngineConfig, TypeMode};
pub use error::{EngineError, Result};
pub use evaluator::{EvalContext, EvalResult, Evaluator, FormulaError};
pub use filter::{wildcard_regex, CompiledFilter, FilterCriteria};
pub use id::{ColumnId, RowId};
pub use sort::{SortDirection, SortOutcome, SortState};
pub use store::{Row, RowStore};
pub use table::{ColumnInfo, InitData, Table};
pub use window::{Bounds, WindowPlan, WindowResult, WindowRow};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_builds_a_table_from_json() {
        let init: InitData = serde_json::from_value(json!({
            "cols": [{"type": "number"}],
            "rows": [[{"value": 1}], [{"value": 2}]]
        }))
        .unwrap();
        let table = Table::from_json(&EngineConfig::default(), &init).unwrap();

        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.columns().len(), 1);
    }

    #[test]
    fn integration_test_formula_follows_filter() {
        let specs = vec![
            ColumnSpec::typed("number").with_formula("ROUND({{ avg }}, 1) & ' avg of ' & {{ rows }}"),
            ColumnSpec::typed("string"),
        ];
        let rows: Vec<Vec<RawCell>> = [(4, "red"), (8, "blue"), (6, "red")]
            .iter()
            .map(|(n, s)| vec![RawCell::new(*n), RawCell::new(*s)])
            .collect();
        let mut table = Table::new(&EngineConfig::default(), &specs, &rows).unwrap();

        assert_eq!(
            table.count_cols()[&ColumnId(1)],
            EvalResult::Text("6 avg of 3".to_string())
        );

        table.filter_rows(&FilterCriteria::new().with("2", "r*")).unwrap();
        assert_eq!(
            table.count_cols()[&ColumnId(1)],
            EvalResult::Text("5 avg of 2".to_string())
        );

        table.filter_rows(&FilterCriteria::new()).unwrap();
        assert_eq!(table.order().len(), 3);
        assert_eq!(
            table.count_cols()[&ColumnId(1)],
            EvalResult::Text("6 avg of 3".to_string())
        );
    }

    #[test]
    fn integration_test_sort_survives_filter_and_paging() {
        let specs = vec![ColumnSpec::typed("number")];
        let rows: Vec<Vec<RawCell>> = (1..=10).map(|n| vec![RawCell::new(n)]).collect();
        let mut table = Table::new(&EngineConfig::default(), &specs, &rows).unwrap();

        table.order_rows("1", "desc");
        table.filter_rows(&FilterCriteria::new().with("1", "1*")).unwrap();
        // "*" needs at least one character, so a bare "1" does not match
        assert_eq!(table.order(), &[RowId(10)]);

        table.filter_rows(&FilterCriteria::new()).unwrap();
        let page = table.select_rows(Some(0), Some(3));
        let ids: Vec<RowId> = page.list.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RowId(10), RowId(9), RowId(8)]);
        assert_eq!(page.fwd, Some(Bounds { from: 3, till: 6 }));
    }
}
