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

//! The booking layer: the `#`/`@`/`~` seat operations, expressed on top of
//! the plain `GET`/`SET` query layer. A seat word holds `0` when free or the
//! decimal reservation id that owns it.

use crate::error::Result;
use crate::schema::{id_counter_key, seat_key};
use crate::storage::Engine;
use crate::word::Word;

/// Outcome of [`book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookOutcome {
	/// All requested seats were free and are now held under this id.
	Booked(u64),
	/// At least one requested seat was already taken; nothing was changed.
	Failure,
}

/// Outcome of [`unbook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnbookOutcome {
	/// Every requested seat belonged to `id` and is now free.
	Success,
	/// At least one seat was free or belonged to a different id; nothing was changed.
	Failure,
}

/// Remove duplicate seat indices, keeping first-occurrence order. Booking a
/// seat twice in one request must not make the booking layer take the same
/// per-key lock twice from one caller (the index table's lock is not
/// reentrant).
fn dedup_seats(seats: &[u64]) -> Vec<u64> {
	let mut seen = std::collections::HashSet::new();
	seats.iter().copied().filter(|s| seen.insert(*s)).collect()
}

fn mint_id(engine: &Engine) -> Result<u64> {
	let current = engine.get(&id_counter_key())?.map(|w| w.as_decimal()).unwrap_or(0);
	let next = current + 1;
	engine.set(&id_counter_key(), &Word::from_u64(next))?;
	Ok(next)
}

/// `book`: reserve `seats` under `id`, or under a freshly minted id if `id`
/// is `None` or zero. Every seat is checked free before any is written, so
/// no partial booking is ever observable -- but the id mint, when one is
/// needed, happens first: a zero-id request that goes on to fail the
/// seat-availability check still burns the `ID_COUNTER` value it minted.
pub fn book(engine: &Engine, id: Option<u64>, seats: &[u64]) -> Result<BookOutcome> {
	let seats = dedup_seats(seats);
	if seats.is_empty() {
		return Ok(BookOutcome::Failure);
	}
	let id = match id {
		Some(id) if id != 0 => id,
		_ => mint_id(engine)?,
	};
	for &seat in &seats {
		match engine.get(&seat_key(seat))? {
			Some(value) if !value.is_zero() => return Ok(BookOutcome::Failure),
			_ => {}
		}
	}
	for &seat in &seats {
		engine.set(&seat_key(seat), &Word::from_u64(id))?;
	}
	Ok(BookOutcome::Booked(id))
}

/// `unbook`: free `seats`, but only if every one of them currently belongs
/// to `id`. A request touching someone else's seat, or an already-free
/// seat, changes nothing.
pub fn unbook(engine: &Engine, id: u64, seats: &[u64]) -> Result<UnbookOutcome> {
	let seats = dedup_seats(seats);
	if seats.is_empty() {
		return Ok(UnbookOutcome::Failure);
	}
	for &seat in &seats {
		let owner = engine.get(&seat_key(seat))?.map(|w| w.as_decimal()).unwrap_or(0);
		if owner != id {
			return Ok(UnbookOutcome::Failure);
		}
	}
	for &seat in &seats {
		engine.set(&seat_key(seat), &Word::from_u64(0))?;
	}
	Ok(UnbookOutcome::Success)
}

/// `status`: one token per seat in row-major order over `rows * columns`
/// seats -- `0` free, `1` held by `viewer` (if given), `2` held by anyone
/// else -- space-joined into a single reply line.
pub fn status(engine: &Engine, viewer: Option<u64>, rows: u64, columns: u64) -> Result<String> {
	let mut tokens = Vec::new();
	for i in 0..rows.saturating_mul(columns) {
		let owner = engine.get(&seat_key(i))?.map(|w| w.as_decimal()).unwrap_or(0);
		let token = if owner == 0 {
			0
		} else if Some(owner) == viewer {
			1
		} else {
			2
		};
		tokens.push(token.to_string());
	}
	Ok(tokens.join(" "))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::seed_fresh_file;
	use tempfile::NamedTempFile;

	fn engine_with_seats(rows: u64, columns: u64) -> (Engine, NamedTempFile) {
		let tmp = NamedTempFile::new().unwrap();
		let engine = Engine::open(tmp.path()).unwrap();
		seed_fresh_file(&engine, "127.0.0.1", 55555).unwrap();
		for i in 0..rows * columns {
			engine.add(&seat_key(i)).unwrap();
		}
		(engine, tmp)
	}

	#[test]
	fn book_mints_an_id_when_none_given() {
		let (e, _tmp) = engine_with_seats(2, 2);
		match book(&e, None, &[0, 1]).unwrap() {
			BookOutcome::Booked(id) => assert!(id > 0),
			BookOutcome::Failure => panic!("expected success"),
		}
	}

	#[test]
	fn book_rejects_already_taken_seat_and_changes_nothing() {
		let (e, _tmp) = engine_with_seats(2, 2);
		assert_eq!(book(&e, Some(1), &[0]).unwrap(), BookOutcome::Booked(1));
		assert_eq!(book(&e, Some(2), &[0, 1]).unwrap(), BookOutcome::Failure);
		// seat 1 must remain untouched by the failed request
		assert_eq!(status(&e, None, 2, 2).unwrap(), "2 0 0 0");
	}

	#[test]
	fn book_deduplicates_repeated_seats_in_one_request() {
		let (e, _tmp) = engine_with_seats(1, 3);
		assert_eq!(book(&e, Some(5), &[0, 0, 0]).unwrap(), BookOutcome::Booked(5));
		assert_eq!(status(&e, None, 1, 3).unwrap(), "2 0 0");
	}

	#[test]
	fn unbook_requires_matching_owner() {
		let (e, _tmp) = engine_with_seats(1, 2);
		book(&e, Some(9), &[0, 1]).unwrap();
		assert_eq!(unbook(&e, 1, &[0]).unwrap(), UnbookOutcome::Failure);
		assert_eq!(unbook(&e, 9, &[0, 1]).unwrap(), UnbookOutcome::Success);
		assert_eq!(status(&e, None, 1, 2).unwrap(), "0 0");
	}

	#[test]
	fn status_distinguishes_viewer_from_other_bookings() {
		let (e, _tmp) = engine_with_seats(1, 3);
		book(&e, Some(1), &[0]).unwrap();
		book(&e, Some(2), &[1]).unwrap();
		assert_eq!(status(&e, Some(1), 1, 3).unwrap(), "1 2 0");
	}

	#[test]
	fn status_over_empty_geometry_is_empty_string() {
		let (e, _tmp) = engine_with_seats(0, 0);
		assert_eq!(status(&e, None, 0, 0).unwrap(), "");
	}
}
