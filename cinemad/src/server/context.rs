// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single `Arc<ServerContext>` shared by every listener and worker
//! thread: the storage engine, cached venue geometry, the global DB
//! reader/writer lock, the per-request timeout and the joiner's channel
//! handle, owned together instead of scattered across process globals.

use cinemadb::Engine;
use parking_lot::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub struct ServerContext {
	pub engine: Engine,
	pub rows: u64,
	pub columns: u64,
	/// Global DB lock: writers for `book`/`unbook`/raw `SET`/`ADD`, readers
	/// for `status`/raw `GET`.
	pub db_lock: RwLock<()>,
	pub request_timeout: Duration,
	pub joiner: Sender<JoinHandle<()>>,
	/// Held as its own `Arc`, not folded into a clone of the whole context,
	/// so a long-lived holder of just this flag (a `ctrlc` handler, which
	/// is never dropped) cannot keep `ServerContext` itself from reaching a
	/// zero refcount at shutdown.
	pub shutdown: Arc<AtomicBool>,
}

impl ServerContext {
	pub fn new(engine: Engine, rows: u64, columns: u64, request_timeout: Duration, joiner: Sender<JoinHandle<()>>) -> Self {
		ServerContext { engine, rows, columns, db_lock: RwLock::new(()), request_timeout, joiner, shutdown: Arc::new(AtomicBool::new(false)) }
	}
}
