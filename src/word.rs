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

//! Fixed-width byte strings used as every key and value on disk.

use crate::error::{Error, Result};
use std::fmt;

/// Width, in bytes, of every key and value word. All records are `2 * WORD_LEN` bytes.
pub const WORD_LEN: usize = 16;

/// A fixed-width, zero-padded byte string. Keys and values are always exactly
/// `WORD_LEN` bytes on disk; shorter logical strings are right-padded with `0x00`.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Word([u8; WORD_LEN]);

impl Word {
	pub const ZERO: Word = Word([0u8; WORD_LEN]);

	/// Pad `s` into a word. Fails if `s` does not fit in `WORD_LEN` bytes.
	pub fn parse(s: &str) -> Result<Word> {
		let bytes = s.as_bytes();
		if bytes.len() > WORD_LEN {
			return Err(Error::WordTooLong { word: s.to_string(), max: WORD_LEN });
		}
		let mut buf = [0u8; WORD_LEN];
		buf[..bytes.len()].copy_from_slice(bytes);
		Ok(Word(buf))
	}

	pub fn from_u64(n: u64) -> Word {
		// Decimal formatting always fits WORD_LEN for any u64.
		Word::parse(&n.to_string()).expect("u64 decimal string fits in a word")
	}

	pub fn as_bytes(&self) -> &[u8; WORD_LEN] {
		&self.0
	}

	pub fn from_bytes(buf: [u8; WORD_LEN]) -> Word {
		Word(buf)
	}

	/// The logical string this word encodes: bytes up to the first `0x00`.
	pub fn trim(&self) -> &str {
		let end = self.0.iter().position(|&b| b == 0).unwrap_or(WORD_LEN);
		std::str::from_utf8(&self.0[..end]).unwrap_or("")
	}

	/// Parse the logical string as a decimal integer, treating a malformed or
	/// empty word as `0` the way the booking layer expects an absent seat to
	/// read as free.
	pub fn as_decimal(&self) -> u64 {
		self.trim().parse().unwrap_or(0)
	}

	pub fn is_zero(&self) -> bool {
		self.0.iter().all(|&b| b == 0)
	}
}

impl fmt::Debug for Word {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Word({:?})", self.trim())
	}
}

impl fmt::Display for Word {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.trim())
	}
}

/// Join a table name and field name into one opaque word, per the structured
/// query form `FIELD FROM TABLE`. The file-separator byte cannot appear in
/// either operand (the parser rejects tokens containing it), so the join is
/// injective.
pub fn join_field(table: &str, field: &str) -> Result<Word> {
	const SEP: u8 = 0x1c;
	if table.as_bytes().contains(&SEP) || field.as_bytes().contains(&SEP) {
		return Err(Error::MalformedRequest(format!("reserved byte in {}/{}", table, field)));
	}
	let mut joined = Vec::with_capacity(table.len() + 1 + field.len());
	joined.extend_from_slice(table.as_bytes());
	joined.push(SEP);
	joined.extend_from_slice(field.as_bytes());
	if joined.len() > WORD_LEN {
		return Err(Error::WordTooLong { word: format!("{} FROM {}", field, table), max: WORD_LEN });
	}
	let mut buf = [0u8; WORD_LEN];
	buf[..joined.len()].copy_from_slice(&joined);
	Ok(Word(buf))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_pads_with_zero() {
		let w = Word::parse("55555").unwrap();
		assert_eq!(w.trim(), "55555");
		assert_eq!(w.as_bytes()[5], 0);
	}

	#[test]
	fn parse_rejects_oversized() {
		assert!(Word::parse("01234567890123456").is_err());
	}

	#[test]
	fn ordering_is_lexicographic_with_zero_low() {
		let a = Word::parse("1").unwrap();
		let b = Word::parse("10").unwrap();
		assert!(a < b);
	}

	#[test]
	fn join_field_is_injective_for_disjoint_inputs() {
		let a = join_field("DATA", "1").unwrap();
		let b = join_field("DATA1", "").unwrap();
		assert_ne!(a.as_bytes(), b.as_bytes());
	}

	#[test]
	fn decimal_of_absent_or_garbage_is_zero() {
		assert_eq!(Word::ZERO.as_decimal(), 0);
		assert_eq!(Word::parse("FAILURE").unwrap().as_decimal(), 0);
	}
}
