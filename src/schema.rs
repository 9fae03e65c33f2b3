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

//! The logical schema layered on top of the opaque key/value store: network
//! config, process identity, venue geometry and per-seat state.
//!
//! Table names here are abbreviated (`NET`, `CFG`, `DATA`) purely to leave
//! room for their longest field (`ID_COUNTER`) inside a 16-byte word -- the
//! `FIELD FROM TABLE` join only needs to be injective and fit in `WORD_LEN`
//! bytes, so any abbreviation scheme that does so is conformant.

use crate::error::Result;
use crate::storage::Engine;
use crate::word::{join_field, Word};

fn net(field: &str) -> Word {
	join_field("NET", field).expect("network field names fit in a word")
}

fn cfg(field: &str) -> Word {
	join_field("CFG", field).expect("config field names fit in a word")
}

fn seat(index: u64) -> Word {
	join_field("DATA", &index.to_string()).expect("seat index fits in a word")
}

/// Seed the nine configuration records and the first seat, for a data file
/// being created for the very first time. Never called on an
/// already-populated file.
pub fn seed_fresh_file(engine: &Engine, bind_ip: &str, bind_port: u16) -> Result<()> {
	engine.add(&net("IP"))?;
	engine.set(&net("IP"), &Word::parse(bind_ip)?)?;
	engine.add(&net("PORT"))?;
	engine.set(&net("PORT"), &Word::from_u64(bind_port as u64))?;
	engine.add(&cfg("PID"))?;
	engine.set(&cfg("PID"), &Word::from_u64(0))?;
	engine.add(&cfg("TIMESTAMP"))?;
	engine.set(&cfg("TIMESTAMP"), &Word::from_u64(0))?;
	engine.add(&cfg("ROWS"))?;
	engine.set(&cfg("ROWS"), &Word::from_u64(1))?;
	engine.add(&cfg("COLUMNS"))?;
	engine.set(&cfg("COLUMNS"), &Word::from_u64(1))?;
	engine.add(&cfg("FILM"))?;
	engine.add(&cfg("SHOWTIME"))?;
	engine.set(&cfg("SHOWTIME"), &Word::parse("00:00")?)?;
	engine.add(&cfg("ID_COUNTER"))?;
	engine.set(&cfg("ID_COUNTER"), &Word::from_u64(0))?;
	engine.add(&seat(0))?;
	engine.set(&seat(0), &Word::from_u64(0))?;
	Ok(())
}

/// Record the owning process's PID and the current Unix timestamp. Run on
/// every startup, not only at creation.
pub fn register_runtime_identity(engine: &Engine, pid: u32, unix_timestamp: u64) -> Result<()> {
	engine.set(&cfg("PID"), &Word::from_u64(pid as u64))?;
	engine.set(&cfg("TIMESTAMP"), &Word::from_u64(unix_timestamp))?;
	Ok(())
}

pub fn read_geometry(engine: &Engine) -> Result<(u64, u64)> {
	let rows = engine.get(&cfg("ROWS"))?.map(|w| w.as_decimal()).unwrap_or(0);
	let columns = engine.get(&cfg("COLUMNS"))?.map(|w| w.as_decimal()).unwrap_or(0);
	Ok((rows, columns))
}

/// Overwrite the persisted network config, for `--force-network-config`.
pub fn set_network_config(engine: &Engine, ip: &str, port: u16) -> Result<()> {
	engine.set(&net("IP"), &Word::parse(ip)?)?;
	engine.set(&net("PORT"), &Word::from_u64(port as u64))?;
	Ok(())
}

pub fn read_network_config(engine: &Engine) -> Result<(String, u16)> {
	let ip = engine.get(&net("IP"))?.map(|w| w.trim().to_string()).unwrap_or_else(|| "127.0.0.1".to_string());
	let port = engine.get(&net("PORT"))?.map(|w| w.as_decimal() as u16).unwrap_or(55555);
	Ok((ip, port))
}

/// On-startup reconciliation: ensure every seat in `{0..rows*columns-1}` has
/// an index entry, returning whether any were newly added so the caller can
/// run [`clean_data`].
pub fn reconcile_seats(engine: &Engine, rows: u64, columns: u64) -> Result<bool> {
	let mut added_any = false;
	for i in 0..rows.saturating_mul(columns) {
		let key = seat(i);
		if engine.get(&key)?.is_none() {
			engine.add(&key)?;
			engine.set(&key, &Word::from_u64(0))?;
			added_any = true;
		}
	}
	Ok(added_any)
}

/// Reset every seat to free and `ID_COUNTER` back to zero. This is the only
/// path allowed to move the counter backwards.
pub fn clean_data(engine: &Engine, rows: u64, columns: u64) -> Result<()> {
	for i in 0..rows.saturating_mul(columns) {
		engine.set(&seat(i), &Word::from_u64(0))?;
	}
	engine.set(&cfg("ID_COUNTER"), &Word::from_u64(0))?;
	Ok(())
}

/// The seat key for index `i` in `{0..rows*columns}`. Exposed for the
/// booking layer, which only ever addresses seats through this namespace.
pub fn seat_key(index: u64) -> Word {
	seat(index)
}

pub fn id_counter_key() -> Word {
	cfg("ID_COUNTER")
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
	fn seed_then_read_back_geometry_and_network() {
		let (e, _tmp) = engine();
		seed_fresh_file(&e, "127.0.0.1", 55555).unwrap();
		assert_eq!(read_geometry(&e).unwrap(), (1, 1));
		assert_eq!(read_network_config(&e).unwrap(), ("127.0.0.1".to_string(), 55555));
	}

	#[test]
	fn reconcile_adds_missing_seats_and_reports_it() {
		let (e, _tmp) = engine();
		seed_fresh_file(&e, "127.0.0.1", 55555).unwrap();
		e.set(&cfg("ROWS"), &Word::from_u64(2)).unwrap();
		e.set(&cfg("COLUMNS"), &Word::from_u64(3)).unwrap();
		let added = reconcile_seats(&e, 2, 3).unwrap();
		assert!(added);
		for i in 0..6 {
			assert_eq!(e.get(&seat_key(i)).unwrap().unwrap().as_decimal(), 0);
		}
		// second pass is a no-op
		assert!(!reconcile_seats(&e, 2, 3).unwrap());
	}

	#[test]
	fn clean_data_resets_seats_and_counter() {
		let (e, _tmp) = engine();
		seed_fresh_file(&e, "127.0.0.1", 55555).unwrap();
		reconcile_seats(&e, 1, 1).unwrap();
		e.set(&seat_key(0), &Word::from_u64(7)).unwrap();
		e.set(&id_counter_key(), &Word::from_u64(9)).unwrap();
		clean_data(&e, 1, 1).unwrap();
		assert_eq!(e.get(&seat_key(0)).unwrap().unwrap().as_decimal(), 0);
		assert_eq!(e.get(&id_counter_key()).unwrap().unwrap().as_decimal(), 0);
	}
}
