//! FILENAME: app/worker/src/mailbox.rs
//! PURPOSE: Runs a dispatcher on its own tokio task.
//! CONTEXT: The caller talks to the task through two unbounded channels.
//! Messages are handled strictly one at a time in arrival order. Dropping
//! the sending side (see `WorkerHandle::shutdown`) ends the task once the
//! queue is drained.

use crate::config::WorkerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::WorkerError;
use crate::logging::{init_log_file, log_info, log_warn};
use crate::protocol::{Inbound, Outbound};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct WorkerHandle {
    inbox: mpsc::UnboundedSender<Inbound>,
    outbox: mpsc::UnboundedReceiver<Outbound>,
    task: JoinHandle<()>,
}

/// Spawns a worker on the current tokio runtime.
/// Must be called from within a runtime.
pub fn spawn(config: WorkerConfig) -> Result<WorkerHandle, WorkerError> {
    if let Some(path) = &config.log_file {
        init_log_file(path).map_err(WorkerError::Log)?;
    }

    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(config.engine);

    log_info!("WORKER", "spawning worker task");
    let task = tokio::spawn(run(dispatcher, inbox_rx, outbox_tx));

    Ok(WorkerHandle {
        inbox: inbox_tx,
        outbox: outbox_rx,
        task,
    })
}

async fn run(
    mut dispatcher: Dispatcher,
    mut inbox: mpsc::UnboundedReceiver<Inbound>,
    outbox: mpsc::UnboundedSender<Outbound>,
) {
    while let Some(msg) = inbox.recv().await {
        if let Some(reply) = dispatcher.dispatch(msg) {
            if outbox.send(reply).is_err() {
                log_warn!("WORKER", "receiver gone, stopping");
                break;
            }
        }
    }
    log_info!("WORKER", "worker task finished");
}

impl WorkerHandle {
    /// Queues a message for the worker.
    pub fn send(&self, msg: Inbound) -> Result<(), WorkerError> {
        self.inbox.send(msg).map_err(|_| WorkerError::Closed)
    }

    /// Decodes a JSON message and queues it.
    pub fn send_json(&self, raw: &str) -> Result<(), WorkerError> {
        let msg = Inbound::from_json(raw)?;
        self.send(msg)
    }

    /// Waits for the next response. `None` once the worker has stopped and
    /// every response was received.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.outbox.recv().await
    }

    /// Returns a response if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Outbound> {
        self.outbox.try_recv().ok()
    }

    /// Closes the inbox, lets the worker drain it and waits for the task.
    /// Responses still queued are returned in order.
    pub async fn shutdown(self) -> Result<Vec<Outbound>, WorkerError> {
        let WorkerHandle {
            inbox,
            mut outbox,
            task,
        } = self;
        drop(inbox);
        task.await?;

        let mut rest = Vec::new();
        while let Some(reply) = outbox.recv().await {
            rest.push(reply);
        }
        Ok(rest)
    }
}
