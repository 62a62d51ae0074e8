//! FILENAME: core/engine/src/aggregate.rs
//! PURPOSE: Running totals for numeric columns.
//! CONTEXT: Totals are fed once per row during load, and again per surviving
//! row after every filter. Formulas read them through placeholders such as
//! `{{ sum }}` or `{{ 3.avg }}`.

use crate::cell::{Cell, CellValue};
use crate::column::{ColumnRegistry, ColumnType};
use crate::id::ColumnId;
use parser::Statistic;
use serde::Serialize;

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Accumulator for a single numeric column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub avg: f64,
    /// `None` until the first observation after a clear.
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(skip)]
    pub count: u64,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a numeric value to the accumulator.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.avg = self.sum / (self.count as f64);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Back to the neutral state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Value of a statistic as seen by formulas. Unset min/max read as 0.
    pub fn compute(&self, stat: Statistic) -> f64 {
        match stat {
            Statistic::Sum => self.sum,
            Statistic::Avg => self.avg,
            Statistic::Min => self.min.unwrap_or(0.0),
            Statistic::Max => self.max.unwrap_or(0.0),
        }
    }
}

// ============================================================================
// TOTALS
// ============================================================================

/// One accumulator slot per column position; every Number column owns a
/// slot, countable or not, so other columns' formulas can read it.
#[derive(Debug, Clone, Default)]
pub struct Totals {
    slots: Vec<Option<AggregateAccumulator>>,
}

impl Totals {
    pub fn for_columns(columns: &ColumnRegistry) -> Self {
        let slots = columns
            .iter()
            .map(|c| (c.kind == ColumnType::Number).then(AggregateAccumulator::new))
            .collect();
        Totals { slots }
    }

    /// Resets every accumulator to the neutral state.
    pub fn clear(&mut self) {
        for acc in self.slots.iter_mut().flatten() {
            acc.clear();
        }
    }

    /// Observes one cell at column `position`. Non-numeric values are ignored.
    pub fn observe(&mut self, position: usize, value: &CellValue) {
        if let (Some(Some(acc)), Some(n)) = (self.slots.get_mut(position), value.as_number()) {
            acc.add_number(n);
        }
    }

    /// Observes every cell of a row.
    pub fn observe_row(&mut self, cells: &[Cell]) {
        for (position, cell) in cells.iter().enumerate() {
            self.observe(position, &cell.value);
        }
    }

    pub fn get(&self, id: ColumnId) -> Option<&AggregateAccumulator> {
        self.slots.get(id.position()).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnSpec;
    use crate::config::TypeMode;

    #[test]
    fn accumulates_sum_avg_min_max() {
        let mut acc = AggregateAccumulator::new();
        for v in [3.0, 1.0, 4.0, 1.0, 5.0] {
            acc.add_number(v);
        }
        assert_eq!(acc.sum, 14.0);
        assert_eq!(acc.avg, 2.8);
        assert_eq!(acc.min, Some(1.0));
        assert_eq!(acc.max, Some(5.0));
    }

    #[test]
    fn negative_first_value_seeds_max() {
        let mut acc = AggregateAccumulator::new();
        acc.add_number(-7.0);
        assert_eq!(acc.max, Some(-7.0));
        assert_eq!(acc.min, Some(-7.0));
    }

    #[test]
    fn clear_distinguishes_unset_from_zero() {
        let mut acc = AggregateAccumulator::new();
        acc.add_number(0.0);
        assert_eq!(acc.min, Some(0.0));

        acc.clear();
        assert_eq!(acc.min, None);
        assert_eq!(acc.max, None);
        assert_eq!(acc.compute(Statistic::Max), 0.0);
        assert_eq!(acc.compute(Statistic::Sum), 0.0);
    }

    #[test]
    fn every_number_column_gets_a_slot() {
        let specs = vec![
            ColumnSpec::typed("number"),
            ColumnSpec::typed("string"),
            ColumnSpec {
                countable: Some(serde_json::Value::Bool(false)),
                ..ColumnSpec::typed("number")
            },
        ];
        let reg = ColumnRegistry::define(&specs, TypeMode::Declared, None).unwrap();
        let mut totals = Totals::for_columns(&reg);

        totals.observe_row(&[
            Cell::new(CellValue::Number(2.0), "2".into()),
            Cell::new(CellValue::Text("x".into()), "x".into()),
            Cell::new(CellValue::Number(9.0), "9".into()),
        ]);
        totals.observe(0, &CellValue::Empty);

        assert_eq!(totals.get(ColumnId(1)).map(|a| a.sum), Some(2.0));
        assert!(totals.get(ColumnId(2)).is_none());
        assert_eq!(totals.get(ColumnId(3)).map(|a| a.max), Some(Some(9.0)));
    }
}
