// SPDX-License-Identifier: MIT OR Apache-2.0

use cinemad::config::Args;
use cinemad::server::context::ServerContext;
use cinemad::server::listener::ListenerKind;
use cinemad::{bootstrap, daemon, server};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn main() {
	let args = Args::parse();
	daemon::maybe_daemonize(&args);
	env_logger::init();

	let bootstrapped = match bootstrap::run(&args) {
		Ok(b) => b,
		Err(e) => {
			log::error!(target: "cinemad", "fatal: startup failed: {}", e);
			std::process::exit(1);
		}
	};

	let (tx, rx) = std::sync::mpsc::channel();
	let ctx = Arc::new(ServerContext::new(
		bootstrapped.engine,
		bootstrapped.rows,
		bootstrapped.columns,
		Duration::from_millis(args.request_timeout_ms),
		tx,
	));

	let joiner_handle = std::thread::spawn(move || server::joiner::run(rx));

	let tcp_handle = {
		let ctx = ctx.clone();
		let ip = bootstrapped.bind_ip.clone();
		let port = bootstrapped.bind_port;
		std::thread::spawn(move || server::listener::run(ListenerKind::Tcp(ip, port), ctx))
	};
	let unix_handle = {
		let ctx = ctx.clone();
		let socket_path: PathBuf = args.unix_socket_path();
		std::thread::spawn(move || server::listener::run(ListenerKind::Unix(socket_path), ctx))
	};

	{
		// Only the shutdown flag, not a clone of `ctx`, goes into the handler:
		// `ctrlc` keeps whatever closure it's given for the life of the
		// process, so an `Arc<ServerContext>` clone here would never drop and
		// the joiner below would wait on a channel that can never close.
		let shutdown = ctx.shutdown.clone();
		if let Err(e) = ctrlc::set_handler(move || {
			log::info!(target: "cinemad", "shutdown signal received");
			shutdown.store(true, Ordering::SeqCst);
		}) {
			log::warn!(target: "cinemad", "failed to install signal handler: {}", e);
		}
	}

	log::info!(target: "cinemad", "Service started");

	tcp_handle.join().ok();
	unix_handle.join().ok();
	// Drop the main thread's own reference last so the `ServerContext` (and
	// the joiner `Sender` it owns) is only freed once every listener thread
	// has exited -- that drop is what lets the joiner's channel close.
	drop(ctx);
	joiner_handle.join().ok();

	log::info!(target: "cinemad", "Service stopped");
}
