// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request dispatch: framing, the `#`/`@`/`~` dispatch byte, and the
//! global DB lock discipline.

use crate::server::context::ServerContext;
use cinemadb::{framing, BookOutcome, UnbookOutcome};
use std::io::{Read, Write};

/// Read exactly one framed request, dispatch it, and write exactly one
/// framed reply. Any I/O fault (including a read timing out) is returned to
/// the caller, which drops the connection without a reply.
pub fn serve_one(ctx: &ServerContext, stream: &mut (impl Read + Write)) -> std::io::Result<()> {
	let request = framing::read_message(stream).map_err(to_io_error)?;
	let reply = dispatch(ctx, &request);
	framing::write_message(stream, &reply).map_err(to_io_error)
}

fn to_io_error(e: cinemadb::Error) -> std::io::Error {
	match e {
		cinemadb::Error::Io(io) => io,
		other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
	}
}

fn dispatch(ctx: &ServerContext, request: &str) -> String {
	if request.is_empty() {
		return "ERROR".to_string();
	}
	let (head, rest) = request.split_at(1);
	match head {
		"#" => {
			let _guard = ctx.db_lock.write();
			book_reply(ctx, rest)
		}
		"@" => {
			let _guard = ctx.db_lock.write();
			unbook_reply(ctx, rest)
		}
		"~" => {
			let _guard = ctx.db_lock.read();
			status_reply(ctx, rest)
		}
		_ => {
			let _guard = ctx.db_lock.read();
			cinemadb::execute(&ctx.engine, request).to_wire()
		}
	}
}

fn parse_u64_tokens(payload: &str) -> Option<Vec<u64>> {
	payload.split_whitespace().map(|t| t.parse::<u64>().ok()).collect()
}

fn book_reply(ctx: &ServerContext, payload: &str) -> String {
	let tokens = match parse_u64_tokens(payload) {
		Some(tokens) if tokens.len() >= 2 => tokens,
		_ => return "ERROR".to_string(),
	};
	let id = if tokens[0] == 0 { None } else { Some(tokens[0]) };
	match cinemadb::book(&ctx.engine, id, &tokens[1..]) {
		Ok(BookOutcome::Booked(id)) => id.to_string(),
		Ok(BookOutcome::Failure) => "FAILURE".to_string(),
		Err(e) => {
			log::warn!(target: "cinemad::worker", "book failed: {}", e);
			"ERROR".to_string()
		}
	}
}

fn unbook_reply(ctx: &ServerContext, payload: &str) -> String {
	let tokens = match parse_u64_tokens(payload) {
		Some(tokens) if tokens.len() >= 2 => tokens,
		_ => return "ERROR".to_string(),
	};
	match cinemadb::unbook(&ctx.engine, tokens[0], &tokens[1..]) {
		Ok(UnbookOutcome::Success) => "SUCCESS".to_string(),
		Ok(UnbookOutcome::Failure) => "FAILURE".to_string(),
		Err(e) => {
			log::warn!(target: "cinemad::worker", "unbook failed: {}", e);
			"ERROR".to_string()
		}
	}
}

fn status_reply(ctx: &ServerContext, payload: &str) -> String {
	let trimmed = payload.trim();
	let viewer = if trimmed.is_empty() { None } else { Some(trimmed.parse::<u64>().unwrap_or(0)) };
	match cinemadb::status(&ctx.engine, viewer, ctx.rows, ctx.columns) {
		Ok(s) => s,
		Err(e) => {
			log::warn!(target: "cinemad::worker", "status failed: {}", e);
			"ERROR".to_string()
		}
	}
}
