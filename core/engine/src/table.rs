//! FILENAME: core/engine/src/table.rs
//! PURPOSE: The table instance: columns, rows, totals and the view state.
//! CONTEXT: A `Table` is built in one step from the caller's dataset and then
//! serves the read and view operations. Nothing transient is kept between
//! calls apart from the current order and the remembered sort.

use crate::aggregate::{AggregateAccumulator, Totals};
use crate::cell::{CellValue, RawCell};
use crate::column::{Column, ColumnRegistry, ColumnSpec};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::evaluator::{EvalContext, EvalResult, Evaluator};
use crate::filter::{CompiledFilter, FilterCriteria};
use crate::id::{ColumnId, RowId};
use crate::sort::{SortDirection, SortOutcome, SortState};
use crate::store::RowStore;
use crate::window::{WindowPlan, WindowResult, WindowRow};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// The `init data` payload. Both fields are validated by `Table::from_json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitData {
    #[serde(default)]
    pub cols: Json,
    #[serde(default)]
    pub rows: Json,
}

/// Column metadata as reported by `select cols`, with the current totals
/// of numeric columns folded in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    #[serde(flatten)]
    pub column: Column,
    #[serde(flatten)]
    pub totals: Option<AggregateAccumulator>,
}

#[derive(Debug, Clone)]
pub struct Table {
    config: EngineConfig,
    columns: ColumnRegistry,
    rows: RowStore,
    totals: Totals,
    sort: Option<SortState>,
}

impl Table {
    /// Builds a table from typed specs and rows. The first aggregate pass
    /// happens here.
    pub fn new(config: &EngineConfig, specs: &[ColumnSpec], raw_rows: &[Vec<RawCell>]) -> Result<Self> {
        let sample = raw_rows.first().map(Vec::as_slice);
        let columns = ColumnRegistry::define(specs, config.type_mode, sample)?;
        let mut totals = Totals::for_columns(&columns);
        let rows = RowStore::load(&columns, raw_rows, &mut totals);

        Ok(Table {
            config: config.clone(),
            columns,
            rows,
            totals,
            sort: None,
        })
    }

    /// Builds a table from the loose JSON of an `init data` request.
    pub fn from_json(config: &EngineConfig, data: &InitData) -> Result<Self> {
        let specs = match &data.cols {
            Json::Array(cols) if !cols.is_empty() => cols
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    serde_json::from_value::<ColumnSpec>(col.clone())
                        .map_err(|e| EngineError::Config(format!("Column {} is malformed: {}", i + 1, e)))
                })
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(EngineError::Config("No cols array given".to_string())),
        };

        let raw_rows = match &data.rows {
            Json::Array(rows) => rows
                .iter()
                .enumerate()
                .map(|(i, row)| match row {
                    Json::Array(cells) => Ok(cells.iter().map(RawCell::from_json).collect()),
                    _ => Err(EngineError::Config(format!("Row {} is not a sequence", i + 1))),
                })
                .collect::<Result<Vec<Vec<RawCell>>>>()?,
            _ => return Err(EngineError::Config("No rows array given".to_string())),
        };

        Self::new(config, &specs, &raw_rows)
    }

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Current view as row ids.
    pub fn order(&self) -> &[RowId] {
        self.rows.order()
    }

    // ========================================================================
    // ORDERING
    // ========================================================================

    /// Sorts the current view by column `col`.
    ///
    /// Empty `col` and `direction` reset the view to insertion order and
    /// forget the remembered sort. An unknown or non-sortable column leaves
    /// everything untouched and returns `SortOutcome::Unlocked`.
    pub fn order_rows(&mut self, col: &str, direction: &str) -> SortOutcome {
        self.apply_order(col, direction, false)
    }

    fn apply_order(&mut self, col: &str, direction: &str, after_filter: bool) -> SortOutcome {
        if col.is_empty() && direction.is_empty() {
            if !after_filter {
                self.rows.reset_order();
            }
            self.sort = None;
            return SortOutcome::Ordered;
        }

        let Some(column) = self.columns.lookup(col).filter(|c| c.sortable) else {
            return SortOutcome::Unlocked;
        };

        let state = SortState {
            column: column.id,
            direction: SortDirection::parse(direction),
        };
        self.rows.sort_order(state.column.position(), state.direction);
        self.sort = Some(state);
        SortOutcome::Ordered
    }

    // ========================================================================
    // FILTERING
    // ========================================================================

    /// Rebuilds the view from all rows, keeping those that match every
    /// pattern, then recomputes totals over the survivors and re-applies
    /// the remembered sort. Empty criteria select every row.
    pub fn filter_rows(&mut self, criteria: &FilterCriteria) -> Result<SortOutcome> {
        let filter = CompiledFilter::compile(criteria, &self.columns)?;

        self.totals.clear();
        self.rows.reset_order();

        let totals = &mut self.totals;
        self.rows.retain_order(|row| {
            let keep = filter.is_empty() || filter.matches(row);
            if keep {
                totals.observe_row(&row.cells);
            }
            keep
        });

        Ok(match self.sort {
            Some(state) => {
                let key = state.column.to_string();
                let direction = match state.direction {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                };
                self.apply_order(&key, direction, true)
            }
            None => SortOutcome::Ordered,
        })
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// A page of the current view. See `WindowPlan::compute` for the rules.
    pub fn select_rows(&self, start: Option<i64>, limit: Option<i64>) -> WindowResult {
        let order = self.rows.order();
        let plan = WindowPlan::compute(order.len(), start, limit, self.config.default_limit);

        let list = (!plan.is_empty()).then(|| {
            order[plan.start..plan.end]
                .iter()
                .filter_map(|id| self.rows.row(*id))
                .map(|row| WindowRow {
                    id: row.id,
                    cells: row
                        .cells
                        .iter()
                        .zip(self.columns.iter())
                        .filter(|(_, column)| !column.is_virtual)
                        .map(|(cell, _)| cell.clone())
                        .collect(),
                })
                .collect()
        });

        WindowResult {
            now: plan.now,
            bwd: plan.bwd,
            fwd: plan.fwd,
            list,
        }
    }

    /// Metadata of every non-virtual column, in declaration order.
    pub fn select_cols(&self) -> Vec<ColumnInfo> {
        self.columns
            .visible()
            .map(|column| ColumnInfo {
                column: column.clone(),
                totals: self.totals.get(column.id).cloned(),
            })
            .collect()
    }

    /// Formula result of every non-virtual column. Columns without a formula
    /// and non-countable columns report an empty string.
    pub fn count_cols(&self) -> BTreeMap<ColumnId, EvalResult> {
        let ctx = EvalContext {
            columns: &self.columns,
            rows: &self.rows,
            totals: &self.totals,
        };

        self.columns
            .visible()
            .map(|column| {
                let result = if column.countable {
                    Evaluator::evaluate_column(ctx, column)
                } else {
                    EvalResult::Text(String::new())
                };
                (column.id, result)
            })
            .collect()
    }

    /// Typed value of a single cell.
    pub fn select_cell(&self, row: RowId, column: ColumnId) -> Option<CellValue> {
        self.columns.get(column)?;
        self.rows.cell(row, column).map(|cell| cell.value.clone())
    }
}
