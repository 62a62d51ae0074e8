//! FILENAME: core/engine/src/store.rs
//! PURPOSE: Row storage plus the canonical and working row orders.
//! CONTEXT: `store` lists every row id in insertion order and never changes
//! after load. `order` is the current view: it is sorted in place, and
//! filtering rebuilds it from `store`.

use crate::aggregate::Totals;
use crate::cell::{Cell, CellValue, RawCell};
use crate::column::ColumnRegistry;
use crate::id::{ColumnId, RowId};
use crate::sort::SortDirection;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: RowId,
    /// One cell per column position, virtual columns included.
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn cell(&self, column: ColumnId) -> Option<&Cell> {
        self.cells.get(column.position())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowStore {
    rows: Vec<Row>,
    store: Vec<RowId>,
    order: Vec<RowId>,
}

impl RowStore {
    /// Coerces raw rows through their columns and feeds every cell to `totals`.
    /// Extra cells are dropped; short rows are padded with empty cells.
    pub fn load(columns: &ColumnRegistry, raw_rows: &[Vec<RawCell>], totals: &mut Totals) -> Self {
        let mut rows = Vec::with_capacity(raw_rows.len());
        let mut store = Vec::with_capacity(raw_rows.len());

        for (position, raw) in raw_rows.iter().enumerate() {
            let id = RowId::from_position(position);
            let cells: Vec<Cell> = columns
                .iter()
                .enumerate()
                .map(|(pos, column)| raw.get(pos).map_or_else(Cell::empty, |c| column.coerce(c)))
                .collect();

            totals.observe_row(&cells);
            rows.push(Row { id, cells });
            store.push(id);
        }

        RowStore {
            rows,
            order: store.clone(),
            store,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.get(id.position()).filter(|r| r.id == id)
    }

    pub fn cell(&self, row: RowId, column: ColumnId) -> Option<&Cell> {
        self.row(row).and_then(|r| r.cell(column))
    }

    pub fn store(&self) -> &[RowId] {
        &self.store
    }

    pub fn order(&self) -> &[RowId] {
        &self.order
    }

    pub fn reset_order(&mut self) {
        self.order.clear();
        self.order.extend_from_slice(&self.store);
    }

    /// Keeps the rows of `order` for which `keep` returns true.
    pub fn retain_order<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Row) -> bool,
    {
        let rows = &self.rows;
        self.order
            .retain(|id| rows.get(id.position()).map_or(false, |row| keep(row)));
    }

    /// Sorts `order` by the typed values at column `position`.
    ///
    /// Empty cells come first in ascending order. Equal values always keep
    /// insertion order, in both directions.
    pub fn sort_order(&mut self, position: usize, direction: SortDirection) {
        let rows = &self.rows;
        self.order.sort_by(|a, b| {
            let by_value = sort_value(rows, *a, position).compare(sort_value(rows, *b, position));
            let by_value = match direction {
                SortDirection::Asc => by_value,
                SortDirection::Desc => by_value.reverse(),
            };
            by_value.then_with(|| a.cmp(b))
        });
    }
}

static EMPTY_VALUE: CellValue = CellValue::Empty;

fn sort_value(rows: &[Row], id: RowId, position: usize) -> &CellValue {
    rows.get(id.position())
        .and_then(|r| r.cells.get(position))
        .map_or(&EMPTY_VALUE, |c| &c.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnSpec;
    use crate::config::TypeMode;

    fn load(values: &[i64]) -> (ColumnRegistry, RowStore, Totals) {
        let specs = vec![ColumnSpec::typed("number"), ColumnSpec::default()];
        let columns = ColumnRegistry::define(&specs, TypeMode::Declared, None).unwrap();
        let mut totals = Totals::for_columns(&columns);
        let raw: Vec<Vec<RawCell>> = values.iter().map(|v| vec![RawCell::new(*v)]).collect();
        let store = RowStore::load(&columns, &raw, &mut totals);
        (columns, store, totals)
    }

    fn ids(order: &[RowId]) -> Vec<u32> {
        order.iter().map(|id| id.0).collect()
    }

    #[test]
    fn load_assigns_ids_and_pads_rows() {
        let (_, store, totals) = load(&[3, 1, 4]);

        assert_eq!(ids(store.store()), vec![1, 2, 3]);
        assert_eq!(store.order(), store.store());
        assert_eq!(store.row(RowId(2)).unwrap().cells.len(), 2);
        assert_eq!(store.cell(RowId(2), ColumnId(2)).unwrap().value, CellValue::Empty);
        assert_eq!(totals.get(ColumnId(1)).unwrap().sum, 8.0);
    }

    #[test]
    fn sort_keeps_insertion_order_for_ties() {
        let (_, mut store, _) = load(&[2, 1, 2, 1]);

        store.sort_order(0, SortDirection::Asc);
        assert_eq!(ids(store.order()), vec![2, 4, 1, 3]);

        store.sort_order(0, SortDirection::Desc);
        assert_eq!(ids(store.order()), vec![1, 3, 2, 4]);
    }

    #[test]
    fn retain_then_reset() {
        let (_, mut store, _) = load(&[5, 6, 7]);

        store.retain_order(|row| row.id != RowId(2));
        assert_eq!(ids(store.order()), vec![1, 3]);

        store.reset_order();
        assert_eq!(ids(store.order()), vec![1, 2, 3]);
    }
}
