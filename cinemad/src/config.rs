// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line configuration, parsed with `clap`'s derive API.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cinemad", about = "Cinema seat-reservation request daemon")]
pub struct Args {
	/// Path to the data file. Created and seeded on first run.
	#[arg(long, value_name = "PATH")]
	pub data_file: Option<PathBuf>,

	/// Override the persisted bind IP for the TCP listener (first run only,
	/// unless --force-network-config is also given).
	#[arg(long, value_name = "IP")]
	pub bind_ip: Option<String>,

	/// Override the persisted bind port for the TCP listener (first run
	/// only, unless --force-network-config is also given).
	#[arg(long, value_name = "PORT")]
	pub bind_port: Option<u16>,

	/// Path to the Unix-domain socket the second listener binds.
	#[arg(long, value_name = "PATH")]
	pub unix_socket: Option<PathBuf>,

	/// Apply --bind-ip/--bind-port even if the data file already has
	/// persisted network config.
	#[arg(long)]
	pub force_network_config: bool,

	/// Per-request receive deadline, in milliseconds.
	#[arg(long, default_value_t = 5000)]
	pub request_timeout_ms: u64,

	/// Run in the foreground instead of daemonizing. Implied on non-Unix
	/// targets, where daemonization is unavailable.
	#[arg(long)]
	pub foreground: bool,
}

impl Args {
	fn cinema_home(&self) -> PathBuf {
		let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
		home.join(".cinema")
	}

	pub fn etc_dir(&self) -> PathBuf {
		self.cinema_home().join("etc")
	}

	pub fn tmp_dir(&self) -> PathBuf {
		self.cinema_home().join("tmp")
	}

	pub fn data_file_path(&self) -> PathBuf {
		self.data_file.clone().unwrap_or_else(|| self.etc_dir().join("data.dat"))
	}

	pub fn unix_socket_path(&self) -> PathBuf {
		self.unix_socket.clone().unwrap_or_else(|| self.tmp_dir().join("socket"))
	}
}
