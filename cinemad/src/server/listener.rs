// SPDX-License-Identifier: MIT OR Apache-2.0

//! The two listeners (TCP and Unix-domain socket). Each runs an accept loop
//! on its own thread, spawning one worker thread per connection and handing
//! its `JoinHandle` to the joiner.
//!
//! Neither `std::net::TcpListener` nor `std::os::unix::net::UnixListener`
//! has an interruptible `accept`, so both are set non-blocking and polled
//! against the shared shutdown flag instead.

use crate::server::context::ServerContext;
use crate::server::worker;
use std::net::TcpListener;
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub enum ListenerKind {
	Tcp(String, u16),
	Unix(PathBuf),
}

pub fn run(kind: ListenerKind, ctx: Arc<ServerContext>) {
	match kind {
		ListenerKind::Tcp(ip, port) => run_tcp(&ip, port, ctx),
		ListenerKind::Unix(path) => run_unix(&path, ctx),
	}
}

fn run_tcp(ip: &str, port: u16, ctx: Arc<ServerContext>) {
	let listener = match TcpListener::bind((ip, port)) {
		Ok(l) => l,
		Err(e) => {
			log::error!(target: "cinemad::listener", "fatal: cannot bind tcp {}:{}: {}", ip, port, e);
			std::process::exit(1);
		}
	};
	if let Err(e) = listener.set_nonblocking(true) {
		log::error!(target: "cinemad::listener", "fatal: cannot set tcp listener non-blocking: {}", e);
		std::process::exit(1);
	}
	log::info!(target: "cinemad::listener", "tcp listener bound on {}:{}", ip, port);
	while !ctx.shutdown.load(Ordering::SeqCst) {
		match listener.accept() {
			Ok((mut stream, _addr)) => {
				let ctx = ctx.clone();
				if let Err(e) = stream.set_read_timeout(Some(ctx.request_timeout)) {
					log::warn!(target: "cinemad::listener", "failed to set read timeout: {}", e);
				}
				spawn_worker(&ctx, move || {
					if let Err(e) = worker::serve_one(&ctx, &mut stream) {
						log::warn!(target: "cinemad::worker", "tcp request failed: {}", e);
					}
				});
			}
			Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
				std::thread::sleep(ACCEPT_POLL_INTERVAL);
			}
			Err(e) => {
				log::warn!(target: "cinemad::listener", "tcp accept fault: {}", e);
			}
		}
	}
	log::info!(target: "cinemad::listener", "tcp listener shutting down");
}

fn run_unix(path: &PathBuf, ctx: Arc<ServerContext>) {
	let _ = std::fs::remove_file(path);
	let listener = match UnixListener::bind(path) {
		Ok(l) => l,
		Err(e) => {
			log::error!(target: "cinemad::listener", "fatal: cannot bind unix socket {}: {}", path.display(), e);
			std::process::exit(1);
		}
	};
	if let Err(e) = listener.set_nonblocking(true) {
		log::error!(target: "cinemad::listener", "fatal: cannot set unix listener non-blocking: {}", e);
		std::process::exit(1);
	}
	log::info!(target: "cinemad::listener", "unix listener bound on {}", path.display());
	while !ctx.shutdown.load(Ordering::SeqCst) {
		match listener.accept() {
			Ok((mut stream, _addr)) => {
				let ctx = ctx.clone();
				if let Err(e) = stream.set_read_timeout(Some(ctx.request_timeout)) {
					log::warn!(target: "cinemad::listener", "failed to set read timeout: {}", e);
				}
				spawn_worker(&ctx, move || {
					if let Err(e) = worker::serve_one(&ctx, &mut stream) {
						log::warn!(target: "cinemad::worker", "unix request failed: {}", e);
					}
				});
			}
			Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
				std::thread::sleep(ACCEPT_POLL_INTERVAL);
			}
			Err(e) => {
				log::warn!(target: "cinemad::listener", "unix accept fault: {}", e);
			}
		}
	}
	log::info!(target: "cinemad::listener", "unix listener shutting down");
	let _ = std::fs::remove_file(path);
}

fn spawn_worker(ctx: &Arc<ServerContext>, body: impl FnOnce() + Send + 'static) {
	let handle = std::thread::spawn(body);
	if ctx.joiner.send(handle).is_err() {
		log::warn!(target: "cinemad::listener", "joiner channel closed; worker will not be reclaimed promptly");
	}
}
