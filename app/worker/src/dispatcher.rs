//! FILENAME: app/worker/src/dispatcher.rs
//! PURPOSE: Routes inbound requests to the owned table and builds responses.
//! CONTEXT: The dispatcher is the protocol state machine. Before a successful
//! init it only listens for `init data`; afterwards it only answers messages
//! carrying the bound slug. A failed init poisons it for good.

use crate::logging::{log_debug, log_enter, log_error, log_exit, log_info, log_warn};
use crate::protocol::{Inbound, Outbound, Request, Response, Slug};
use engine::{EngineConfig, InitData, SortOutcome, Table};

enum State {
    /// Waiting for the first `init data`.
    Idle,
    Ready { slug: Slug, table: Box<Table> },
    /// Init failed; every later message is ignored.
    Failed { slug: Slug },
}

enum Route {
    Drop(&'static str),
    Init,
    Handle,
}

pub struct Dispatcher {
    config: EngineConfig,
    state: State,
}

impl Dispatcher {
    pub fn new(config: EngineConfig) -> Self {
        Dispatcher {
            config,
            state: State::Idle,
        }
    }

    /// The slug bound by init, if any.
    pub fn slug(&self) -> Option<&Slug> {
        match &self.state {
            State::Idle => None,
            State::Ready { slug, .. } | State::Failed { slug } => Some(slug),
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match &self.state {
            State::Ready { table, .. } => Some(table.as_ref()),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed { .. })
    }

    /// Handles one message. Returns the response to emit, or `None` when the
    /// message is dropped.
    pub fn dispatch(&mut self, msg: Inbound) -> Option<Outbound> {
        let Inbound { slug, request } = msg;
        log_enter!("DISPATCH", request.name(), "slug={}", slug);

        let route = match (&self.state, &request) {
            (State::Failed { .. }, _) => Route::Drop("init failed earlier"),
            (State::Idle, Request::InitData(_)) => Route::Init,
            (State::Idle, _) => Route::Drop("not initialized"),
            (State::Ready { slug: bound, .. }, _) if *bound != slug => Route::Drop("foreign slug"),
            (State::Ready { .. }, Request::InitData(_)) => Route::Init,
            (State::Ready { .. }, _) => Route::Handle,
        };

        let response = match (route, request) {
            (Route::Drop(reason), request) => {
                log_warn!("DISPATCH", "dropped {} from {}: {}", request.name(), slug, reason);
                None
            }
            (Route::Init, Request::InitData(data)) => {
                if self.table().is_some() {
                    log_info!("DISPATCH", "re-init requested, rebuilding table");
                }
                Some(self.init(slug.clone(), &data))
            }
            (_, request) => match &mut self.state {
                State::Ready { table, .. } => Some(handle(table, request)),
                _ => None,
            },
        };

        log_exit!(
            "DISPATCH",
            "dispatch",
            "{}",
            response.as_ref().map_or("dropped", |r| r.name())
        );
        response.map(|response| Outbound { slug, response })
    }

    fn init(&mut self, slug: Slug, data: &InitData) -> Response {
        match Table::from_json(&self.config, data) {
            Ok(table) => {
                log_info!(
                    "DISPATCH",
                    "table ready: {} cols, {} rows",
                    table.columns().len(),
                    table.rows().len()
                );
                self.state = State::Ready {
                    slug,
                    table: Box::new(table),
                };
                Response::InitData
            }
            Err(e) => {
                log_error!("DISPATCH", "init failed: {}", e);
                self.state = State::Failed { slug };
                Response::InitFailed {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Runs a request against an initialized table.
fn handle(table: &mut Table, request: Request) -> Response {
    match request {
        // Handled by the dispatcher state machine.
        Request::InitData(_) => Response::InitData,
        Request::OrderRows(args) => match table.order_rows(&args.col, &args.order) {
            SortOutcome::Ordered => Response::OrderRows,
            SortOutcome::Unlocked => {
                log_debug!("DISPATCH", "column {:?} is not sortable", args.col);
                Response::UnlockView
            }
        },
        Request::FilterRows(args) => match table.filter_rows(&args.values) {
            Ok(SortOutcome::Ordered) => Response::OrderRows,
            Ok(SortOutcome::Unlocked) => Response::UnlockView,
            Err(e) => {
                // Patterns are escaped, so this only trips on regex size limits.
                log_error!("DISPATCH", "filter rejected: {}", e);
                Response::UnlockView
            }
        },
        Request::SelectRows(args) => Response::SelectRows(table.select_rows(args.start, args.limit)),
        Request::SelectCols => Response::SelectCols(table.select_cols()),
        Request::CountCols => Response::CountCols(table.count_cols()),
        Request::SelectCell(args) => Response::SelectCell(table.select_cell(args.row, args.cell)),
    }
}
