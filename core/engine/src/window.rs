//! FILENAME: core/engine/src/window.rs
//! PURPOSE: Paging over the current row order.
//! CONTEXT: A window request names a start offset and a page size. The
//! response carries the current range plus the neighbouring ranges so the
//! caller can page backward and forward without doing arithmetic itself.

use crate::cell::Cell;
use crate::id::RowId;
use serde::Serialize;

/// Half-open range `[from, till)` of positions in the current order.
///
/// Both ends are always valid positions: the backward range starts at
/// `start - limit` clamped to 0, so callers can use it as-is and never see
/// a negative offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub from: usize,
    pub till: usize,
}

/// One emitted row: its id and its non-virtual cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRow {
    pub id: RowId,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bwd: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fwd: Option<Bounds>,
    /// `None` (serialized as `null`) is the explicit "nothing to show" marker.
    pub list: Option<Vec<WindowRow>>,
}

/// The ranges of a window, before any rows are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub start: usize,
    pub end: usize,
    pub now: Option<Bounds>,
    pub bwd: Option<Bounds>,
    pub fwd: Option<Bounds>,
}

impl WindowPlan {
    /// Computes the window for a view of `len` rows.
    ///
    /// A missing or negative `start` means 0, a missing or negative `limit`
    /// means `default_limit`. `start` is clamped to `len`.
    pub fn compute(len: usize, start: Option<i64>, limit: Option<i64>, default_limit: usize) -> Self {
        let start = start
            .filter(|s| *s >= 0)
            .map_or(0, |s| usize::try_from(s).unwrap_or(usize::MAX))
            .min(len);
        let limit = limit
            .filter(|l| *l >= 0)
            .map_or(default_limit, |l| usize::try_from(l).unwrap_or(usize::MAX));
        let end = start.saturating_add(limit).min(len);

        let now = (end > 0).then_some(Bounds { from: start, till: end });
        let bwd = (start > 0).then(|| Bounds {
            from: start.saturating_sub(limit),
            till: start,
        });
        let fwd = (end < len).then(|| Bounds {
            from: end,
            till: end.saturating_add(limit).min(len),
        });

        WindowPlan { start, end, now, bwd, fwd }
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }
}
