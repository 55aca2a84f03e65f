//! Background worker thread. All provider calls run here.
//!
//! Communication with the UI thread is via `mpsc` channels. Commands are
//! handled one at a time in arrival order; the session decides afterwards
//! whether a response is still current.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use breadthview_core::data::{DataError, RangeProvider, StockEntry};
use breadthview_core::domain::{FetchedRange, Symbol};
use breadthview_core::session::FetchRequest;

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    FetchRange { request: FetchRequest },
    FetchAboveMa50 { index: Symbol, date: NaiveDate },
    SubmitEmail { email: String },
    Shutdown,
}

/// Responses sent from the worker back to the UI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    RangeFetched {
        request: FetchRequest,
        result: Result<FetchedRange, DataError>,
    },
    AboveMa50 {
        index: Symbol,
        date: NaiveDate,
        result: Result<Vec<StockEntry>, DataError>,
    },
    EmailSubmitted(Result<(), DataError>),
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    provider: Arc<dyn RangeProvider>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("breadthview-worker".into())
        .spawn(move || worker_loop(rx, tx, provider))
}

fn worker_loop(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>, provider: Arc<dyn RangeProvider>) {
    info!(provider = provider.name(), "worker started");
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => {
                let resp = handle_command(cmd, provider.as_ref());
                if let Some(resp) = resp {
                    if tx.send(resp).is_err() {
                        break;
                    }
                }
            }
        }
    }
    debug!("worker stopped");
}

fn handle_command(cmd: WorkerCommand, provider: &dyn RangeProvider) -> Option<WorkerResponse> {
    match cmd {
        WorkerCommand::FetchRange { request } => {
            debug!(index = %request.index, range = %request.key, kind = ?request.kind, "fetching range");
            let result = provider.fetch_range(&request.index, request.key);
            if let Err(e) = &result {
                warn!(index = %request.index, range = %request.key, error = %e, "range fetch failed");
            }
            Some(WorkerResponse::RangeFetched { request, result })
        }
        WorkerCommand::FetchAboveMa50 { index, date } => {
            let result = provider.above_ma50(&index, date);
            Some(WorkerResponse::AboveMa50 { index, date, result })
        }
        WorkerCommand::SubmitEmail { email } => {
            let result = provider.submit_email(&email);
            Some(WorkerResponse::EmailSubmitted(result))
        }
        WorkerCommand::Shutdown => None,
    }
}
