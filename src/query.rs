// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of Parity.

// Parity is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Parity is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Parity.  If not, see <http://www.gnu.org/licenses/>.

//! The tiny textual query language: `GET`/`SET`/`ADD`, flat or `FIELD FROM
//! TABLE` structured.

use crate::storage::Engine;
use crate::word::{join_field, Word};

/// One parsed request.
enum Command {
	Get(Word),
	Set(Word, Word),
	Add(Word),
}

/// A single reply word: `SUCCESS`, `FAILURE`, `ERROR`, or a raw value word
/// for `GET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
	Success,
	Failure,
	Error,
	Value(String),
}

impl Reply {
	pub fn to_wire(&self) -> String {
		match self {
			Reply::Success => "SUCCESS".to_string(),
			Reply::Failure => "FAILURE".to_string(),
			Reply::Error => "ERROR".to_string(),
			Reply::Value(s) => s.clone(),
		}
	}
}

/// Parse and execute a single request string against `engine`.
pub fn execute(engine: &Engine, request: &str) -> Reply {
	match parse(request) {
		Err(_) => Reply::Error,
		Ok(Command::Get(key)) => match engine.get(&key) {
			Ok(Some(value)) => Reply::Value(value.trim().to_string()),
			Ok(None) => Reply::Failure,
			Err(_) => Reply::Error,
		},
		Ok(Command::Set(key, value)) => match engine.set(&key, &value) {
			Ok(()) => Reply::Success,
			Err(_) => Reply::Error,
		},
		Ok(Command::Add(key)) => match engine.add(&key) {
			Ok(()) => Reply::Success,
			Err(_) => Reply::Error,
		},
	}
}

fn parse(request: &str) -> Result<Command, ()> {
	let tokens: Vec<&str> = request.split(' ').collect();
	let (op, rest) = tokens.split_first().ok_or(())?;
	match (*op, rest.len()) {
		("GET", 1) => Ok(Command::Get(Word::parse(rest[0]).map_err(|_| ())?)),
		("ADD", 1) => Ok(Command::Add(Word::parse(rest[0]).map_err(|_| ())?)),
		("SET", 3) if rest[1] == "AS" => {
			Ok(Command::Set(Word::parse(rest[0]).map_err(|_| ())?, Word::parse(rest[2]).map_err(|_| ())?))
		}
		("GET", 3) if rest[1] == "FROM" => {
			Ok(Command::Get(join_field(rest[2], rest[0]).map_err(|_| ())?))
		}
		("ADD", 3) if rest[1] == "FROM" => {
			Ok(Command::Add(join_field(rest[2], rest[0]).map_err(|_| ())?))
		}
		("SET", 5) if rest[1] == "FROM" && rest[3] == "AS" => {
			Ok(Command::Set(join_field(rest[2], rest[0]).map_err(|_| ())?, Word::parse(rest[4]).map_err(|_| ())?))
		}
		_ => Err(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::NamedTempFile;

	fn engine() -> (Engine, NamedTempFile) {
		let tmp = NamedTempFile::new().unwrap();
		(Engine::open(tmp.path()).unwrap(), tmp)
	}

	#[test]
	fn get_on_absent_key_is_failure() {
		let (e, _tmp) = engine();
		assert_eq!(execute(&e, "GET NOPE"), Reply::Failure);
	}

	#[test]
	fn set_then_get_flat_form() {
		let (e, _tmp) = engine();
		assert_eq!(execute(&e, "SET PORT AS 55555"), Reply::Success);
		assert_eq!(execute(&e, "GET PORT"), Reply::Value("55555".to_string()));
	}

	#[test]
	fn structured_from_form_round_trips() {
		let (e, _tmp) = engine();
		assert_eq!(execute(&e, "ADD PORT FROM NETWORK"), Reply::Success);
		assert_eq!(execute(&e, "SET PORT FROM NETWORK AS 55555"), Reply::Success);
		assert_eq!(execute(&e, "GET PORT FROM NETWORK"), Reply::Value("55555".to_string()));
	}

	#[test]
	fn add_is_idempotent_and_does_not_clobber() {
		let (e, _tmp) = engine();
		assert_eq!(execute(&e, "SET ID_COUNTER AS 3"), Reply::Success);
		assert_eq!(execute(&e, "ADD ID_COUNTER"), Reply::Success);
		assert_eq!(execute(&e, "GET ID_COUNTER"), Reply::Value("3".to_string()));
	}

	#[test]
	fn malformed_requests_are_errors() {
		let (e, _tmp) = engine();
		assert_eq!(execute(&e, ""), Reply::Error);
		assert_eq!(execute(&e, "SET KEY"), Reply::Error);
		assert_eq!(execute(&e, "SET KEY NOTAS VALUE"), Reply::Error);
		assert_eq!(execute(&e, "FROB KEY"), Reply::Error);
		assert_eq!(execute(&e, "GET 01234567890123456"), Reply::Error);
	}
}
