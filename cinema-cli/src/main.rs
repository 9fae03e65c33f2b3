// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin client: build one textual request from a subcommand, open one
//! connection, send it, print the one framed reply, exit.

use cinemadb::framing;
use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cinema-cli", about = "Thin client for the cinema seat-reservation daemon")]
struct Cli {
	/// TCP host to connect to. Ignored if --unix-socket is given.
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	/// TCP port to connect to. Ignored if --unix-socket is given.
	#[arg(long, default_value_t = 55555)]
	port: u16,

	/// Connect over a Unix-domain socket instead of TCP.
	#[arg(long, value_name = "PATH")]
	unix_socket: Option<PathBuf>,

	/// Raise connection-level log verbosity. Repeatable.
	#[arg(short = 'v', action = clap::ArgAction::Count)]
	verbose: u8,

	/// Lower connection-level log verbosity (suppress warnings too).
	#[arg(short = 'q', long)]
	quiet: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// GET key, or GET key FROM table.
	Get {
		key: String,
		#[arg(long)]
		from: Option<String>,
	},
	/// SET key AS value, or SET key FROM table AS value.
	Set {
		key: String,
		value: String,
		#[arg(long)]
		from: Option<String>,
	},
	/// ADD key, or ADD key FROM table.
	Add {
		key: String,
		#[arg(long)]
		from: Option<String>,
	},
	/// Reserve seats under an id (0 mints a fresh one).
	Book {
		#[arg(long, default_value_t = 0)]
		id: u64,
		seats: Vec<u64>,
	},
	/// Release seats currently held by id.
	Unbook { id: u64, seats: Vec<u64> },
	/// Report the board state, optionally highlighting one viewer's seats.
	Status { id: Option<u64> },
	/// Send a pre-built request string verbatim.
	Raw { request: String },
}

fn build_request(command: &Command) -> String {
	match command {
		Command::Get { key, from: None } => format!("GET {}", key),
		Command::Get { key, from: Some(table) } => format!("GET {} FROM {}", key, table),
		Command::Set { key, value, from: None } => format!("SET {} AS {}", key, value),
		Command::Set { key, value, from: Some(table) } => format!("SET {} FROM {} AS {}", key, table, value),
		Command::Add { key, from: None } => format!("ADD {}", key),
		Command::Add { key, from: Some(table) } => format!("ADD {} FROM {}", key, table),
		Command::Book { id, seats } => {
			let seats: Vec<String> = seats.iter().map(u64::to_string).collect();
			format!("#{} {}", id, seats.join(" "))
		}
		Command::Unbook { id, seats } => {
			let seats: Vec<String> = seats.iter().map(u64::to_string).collect();
			format!("@{} {}", id, seats.join(" "))
		}
		Command::Status { id: None } => "~".to_string(),
		Command::Status { id: Some(id) } => format!("~{}", id),
		Command::Raw { request } => request.clone(),
	}
}

fn send_request(cli: &Cli, request: &str) -> std::io::Result<String> {
	if let Some(path) = &cli.unix_socket {
		let mut stream = UnixStream::connect(path)?;
		roundtrip(&mut stream, request)
	} else {
		let mut stream = TcpStream::connect((cli.host.as_str(), cli.port))?;
		roundtrip(&mut stream, request)
	}
}

fn roundtrip(stream: &mut (impl Read + Write), request: &str) -> std::io::Result<String> {
	framing::write_message(stream, request).map_err(framing_to_io)?;
	framing::read_message(stream).map_err(framing_to_io)
}

fn framing_to_io(e: cinemadb::Error) -> std::io::Error {
	match e {
		cinemadb::Error::Io(io) => io,
		other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
	}
}

fn main() {
	let cli = Cli::parse();
	let default_level = if cli.quiet {
		"error"
	} else {
		match cli.verbose {
			0 => "warn",
			1 => "info",
			_ => "debug",
		}
	};
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
	let request = build_request(&cli.command);
	log::debug!(target: "cinema_cli", "sending request: {}", request);
	match send_request(&cli, &request) {
		Ok(reply) => println!("{}", reply),
		Err(e) => {
			eprintln!("cinema-cli: {}", e);
			std::process::exit(1);
		}
	}
}
