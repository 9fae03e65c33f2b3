// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory tree creation, first-run seeding and the per-startup
//! reconciliation pass that runs before the daemon starts accepting
//! connections.

use crate::config::Args;
use cinemadb::schema;
use cinemadb::{Engine, Error};

pub struct Bootstrapped {
	pub engine: Engine,
	pub rows: u64,
	pub columns: u64,
	pub bind_ip: String,
	pub bind_port: u16,
}

pub fn run(args: &Args) -> Result<Bootstrapped, Error> {
	std::fs::create_dir_all(args.etc_dir())?;
	std::fs::create_dir_all(args.tmp_dir())?;

	let data_path = args.data_file_path();
	let is_new = !data_path.exists();
	let engine = if is_new { Engine::create(&data_path)? } else { Engine::open(&data_path)? };

	if is_new {
		let ip = args.bind_ip.clone().unwrap_or_else(|| "127.0.0.1".to_string());
		let port = args.bind_port.unwrap_or(55555);
		schema::seed_fresh_file(&engine, &ip, port)?;
		log::info!(target: "cinemad::bootstrap", "data file created and seeded at {}", data_path.display());
	} else if args.force_network_config {
		let (current_ip, current_port) = schema::read_network_config(&engine)?;
		let ip = args.bind_ip.clone().unwrap_or(current_ip);
		let port = args.bind_port.unwrap_or(current_port);
		schema::set_network_config(&engine, &ip, port)?;
		log::info!(target: "cinemad::bootstrap", "network config overridden to {}:{}", ip, port);
	}

	let pid = std::process::id();
	let unix_timestamp = std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0);
	schema::register_runtime_identity(&engine, pid, unix_timestamp)?;
	log::debug!(target: "cinemad::bootstrap", "registered pid={} timestamp={}", pid, unix_timestamp);

	let (rows, columns) = schema::read_geometry(&engine)?;
	if schema::reconcile_seats(&engine, rows, columns)? {
		log::info!(target: "cinemad::bootstrap", "seat geometry grew; running clean_data over {} seats", rows * columns);
		schema::clean_data(&engine, rows, columns)?;
	}

	let (bind_ip, bind_port) = schema::read_network_config(&engine)?;
	Ok(Bootstrapped { engine, rows, columns, bind_ip, bind_port })
}
