//! FILENAME: core/engine/src/sort.rs
//! PURPOSE: Sort requests and the remembered sort state.

use crate::id::ColumnId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` (any case) sorts descending; every other word sorts ascending.
    pub fn parse(word: &str) -> SortDirection {
        if word.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// The last sort applied, re-applied after every filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub column: ColumnId,
    pub direction: SortDirection,
}

/// What an order request did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOutcome {
    /// The order changed (or was reset). Answered with `order rows`.
    Ordered,
    /// The column cannot be sorted; the view is left alone and the caller
    /// is told to unlock it.
    Unlocked,
}
