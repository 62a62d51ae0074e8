//! FILENAME: app/worker/src/lib.rs
// PURPOSE: Main library entry point for the table worker.
// CONTEXT: A worker owns exactly one table and talks to its caller only
// through messages. `spawn` runs it on a tokio task; `Dispatcher` is the
// synchronous core and can be driven directly.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod mailbox;
pub mod protocol;

pub use config::WorkerConfig;
pub use dispatcher::Dispatcher;
pub use error::WorkerError;
pub use logging::{close_log_file, get_log_path, init_log_file, next_seq, sort_log_file, write_log};
pub use mailbox::{spawn, WorkerHandle};
pub use protocol::{
    CellArgs, FilterArgs, Inbound, OrderArgs, Outbound, Request, Response, Slug, WindowArgs,
};
