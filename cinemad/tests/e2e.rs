// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spins up a real request server -- both listeners -- against a temp data
//! file and drives it exactly the way a client over the wire would.

use cinemad::config::Args;
use cinemad::server::context::ServerContext;
use cinemad::server::listener::ListenerKind;
use cinemad::{bootstrap, server};
use cinemadb::framing;
use std::net::TcpStream;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn start_server(port: u16, data_dir: &tempfile::TempDir) -> Arc<ServerContext> {
	let args = Args {
		data_file: Some(data_dir.path().join("data.dat")),
		bind_ip: Some("127.0.0.1".to_string()),
		bind_port: Some(port),
		unix_socket: Some(data_dir.path().join("socket")),
		force_network_config: false,
		request_timeout_ms: 2000,
		foreground: true,
	};
	let bootstrapped = bootstrap::run(&args).expect("bootstrap should succeed against a fresh temp dir");
	let (tx, rx) = std::sync::mpsc::channel();
	let ctx = Arc::new(ServerContext::new(
		bootstrapped.engine,
		bootstrapped.rows,
		bootstrapped.columns,
		Duration::from_millis(args.request_timeout_ms),
		tx,
	));
	std::thread::spawn(move || server::joiner::run(rx));
	{
		let ctx = ctx.clone();
		let ip = bootstrapped.bind_ip.clone();
		let port = bootstrapped.bind_port;
		std::thread::spawn(move || server::listener::run(ListenerKind::Tcp(ip, port), ctx));
	}
	{
		let ctx = ctx.clone();
		let socket_path = args.unix_socket_path();
		std::thread::spawn(move || server::listener::run(ListenerKind::Unix(socket_path), ctx));
	}
	std::thread::sleep(Duration::from_millis(150));
	ctx
}

fn tcp_roundtrip(port: u16, request: &str) -> String {
	let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
	framing::write_message(&mut stream, request).unwrap();
	framing::read_message(&mut stream).unwrap()
}

fn unix_roundtrip(path: &PathBuf, request: &str) -> String {
	let mut stream = UnixStream::connect(path).expect("connect");
	framing::write_message(&mut stream, request).unwrap();
	framing::read_message(&mut stream).unwrap()
}

#[test]
fn scenarios_over_tcp_match_the_documented_table() {
	let data_dir = tempfile::tempdir().unwrap();
	let _ctx = start_server(18475, &data_dir);

	// Seats are addressed directly by index and need no prior reconciliation
	// to a particular venue geometry -- `status` is the only operation that
	// cares about rows*columns, and this scenario only exercises book/unbook.
	assert_eq!(tcp_roundtrip(18475, "#0 0 1"), "1");
	assert_eq!(tcp_roundtrip(18475, "#0 2"), "2");
	assert_eq!(tcp_roundtrip(18475, "#0 1 3"), "FAILURE");
	assert_eq!(tcp_roundtrip(18475, "@1 0 1"), "SUCCESS");
	assert_eq!(tcp_roundtrip(18475, "@1 2"), "FAILURE");
}

#[test]
fn unix_socket_listener_serves_requests_too() {
	let data_dir = tempfile::tempdir().unwrap();
	let socket_path = data_dir.path().join("socket");
	let _ctx = start_server(18476, &data_dir);
	assert_eq!(unix_roundtrip(&socket_path, "GET ROWS FROM CFG"), "1");
}

#[test]
fn malformed_and_empty_requests_are_errors() {
	let data_dir = tempfile::tempdir().unwrap();
	let _ctx = start_server(18477, &data_dir);
	assert_eq!(tcp_roundtrip(18477, ""), "ERROR");
	assert_eq!(tcp_roundtrip(18477, "#0"), "ERROR");
	assert_eq!(tcp_roundtrip(18477, "FROB THING"), "ERROR");
}
