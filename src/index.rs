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

//! In-memory index: key-word -> (value offset on disk, per-key lock).
//!
//! The index is guarded by one table-level lock; each entry additionally
//! carries its own lock so two distinct keys never block each other on
//! value I/O.

use crate::error::Result;
use crate::tree::{AvlTree, Inserted};
use crate::word::{Word, WORD_LEN};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::io::Read;
use std::sync::Arc;

pub struct IndexEntry {
	value_offset: u64,
	lock: Arc<RwLock<()>>,
}

impl IndexEntry {
	fn new(value_offset: u64) -> IndexEntry {
		IndexEntry { value_offset, lock: Arc::new(RwLock::new(())) }
	}
}

/// Table-level reader/writer lock plus the ordered map it guards.
pub struct IndexTable {
	inner: RwLock<AvlTree<Word, IndexEntry>>,
}

/// A held table reader lock. Multiple readers may be held concurrently by
/// distinct callers; each is free to look up as many keys as it needs before
/// releasing, so the index cannot shift under a multi-step read sequence.
pub struct IndexRead<'a> {
	guard: RwLockReadGuard<'a, AvlTree<Word, IndexEntry>>,
}

/// A held table writer lock, used only across an append + rescan burst.
pub struct IndexWrite<'a> {
	guard: RwLockWriteGuard<'a, AvlTree<Word, IndexEntry>>,
}

impl Default for IndexTable {
	fn default() -> Self {
		IndexTable { inner: RwLock::new(AvlTree::new()) }
	}
}

impl IndexTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn read(&self) -> IndexRead<'_> {
		IndexRead { guard: self.inner.read() }
	}

	pub fn write(&self) -> IndexWrite<'_> {
		IndexWrite { guard: self.inner.write() }
	}

	/// Rescan `stream` for whole `2*WORD_LEN`-byte records starting at
	/// `from_offset` (0 for a full initial scan) and ensure every key found
	/// has an index entry. Existing entries are left untouched -- their
	/// per-key lock must stay the same `Arc` for as long as any caller might
	/// be holding a clone of it. Idempotent: rescanning a range that was
	/// already indexed adds nothing new.
	pub fn rebuild_from_stream(&self, write: &mut IndexWrite<'_>, stream: &mut impl Read, from_offset: u64) -> Result<()> {
		let mut key_buf = [0u8; WORD_LEN];
		let mut offset = from_offset;
		loop {
			match read_exact_or_eof(stream, &mut key_buf)? {
				false => break,
				true => {}
			}
			let key = Word::from_bytes(key_buf);
			let value_offset = offset + WORD_LEN as u64;
			// skip the value word without interpreting it
			let mut value_buf = [0u8; WORD_LEN];
			if !read_exact_or_eof(stream, &mut value_buf)? {
				return Err(crate::error::Error::Corrupt(format!(
					"truncated record for key {:?} at offset {}",
					key, offset
				)));
			}
			if !write.guard.contains(&key) {
				write.guard.insert(key, IndexEntry::new(value_offset));
			}
			offset = value_offset + WORD_LEN as u64;
		}
		Ok(())
	}
}

fn read_exact_or_eof(stream: &mut impl Read, buf: &mut [u8]) -> Result<bool> {
	let mut read = 0;
	while read < buf.len() {
		let n = stream.read(&mut buf[read..])?;
		if n == 0 {
			if read == 0 {
				return Ok(false);
			}
			return Err(crate::error::Error::Corrupt("short read mid-record".to_string()));
		}
		read += n;
	}
	Ok(true)
}

impl<'a> IndexRead<'a> {
	pub fn len(&self) -> usize {
		self.guard.len()
	}

	pub fn key_offset(&self, key: &Word) -> Option<u64> {
		self.guard.search(key).map(|e| e.value_offset)
	}

	pub fn key_lock(&self, key: &Word) -> Option<Arc<RwLock<()>>> {
		self.guard.search(key).map(|e| e.lock.clone())
	}
}

impl<'a> IndexWrite<'a> {
	pub fn key_offset(&self, key: &Word) -> Option<u64> {
		self.guard.search(key).map(|e| e.value_offset)
	}

	pub fn key_lock(&self, key: &Word) -> Option<Arc<RwLock<()>>> {
		self.guard.search(key).map(|e| e.lock.clone())
	}

	/// Directly record a freshly appended key's offset, bypassing a file
	/// rescan when the caller already knows it deterministically (the
	/// storage engine's write path: it just appended exactly this record).
	pub fn insert_known(&mut self, key: Word, value_offset: u64) -> Arc<RwLock<()>> {
		let entry = IndexEntry::new(value_offset);
		let lock = entry.lock.clone();
		match self.guard.insert(key, entry) {
			Inserted::New => {}
			Inserted::Replaced(_) => unreachable!("caller must have checked absence under this write lock"),
		}
		lock
	}
}

/// Either a reader or writer hold on the table lock, for code paths (the
/// storage engine's `set`) that start with a reader lock and only escalate
/// to a writer lock when the key turns out to be new.
pub enum TableGuard<'a> {
	Read(IndexRead<'a>),
	Write(IndexWrite<'a>),
}

impl<'a> TableGuard<'a> {
	pub fn key_offset(&self, key: &Word) -> Option<u64> {
		match self {
			TableGuard::Read(g) => g.key_offset(key),
			TableGuard::Write(g) => g.key_offset(key),
		}
	}

	pub fn key_lock(&self, key: &Word) -> Option<Arc<RwLock<()>>> {
		match self {
			TableGuard::Read(g) => g.key_lock(key),
			TableGuard::Write(g) => g.key_lock(key),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	fn record(key: &str, value: &str) -> Vec<u8> {
		let mut buf = Word::parse(key).unwrap().as_bytes().to_vec();
		buf.extend_from_slice(Word::parse(value).unwrap().as_bytes());
		buf
	}

	#[test]
	fn rebuild_indexes_every_record_once() {
		let table = IndexTable::new();
		let mut data = Vec::new();
		data.extend(record("IP", "127.0.0.1"));
		data.extend(record("PORT", "55555"));
		let mut cursor = Cursor::new(data);
		let mut w = table.write();
		table.rebuild_from_stream(&mut w, &mut cursor, 0).unwrap();
		assert_eq!(w.key_offset(&Word::parse("IP").unwrap()), Some(WORD_LEN as u64));
		assert_eq!(w.key_offset(&Word::parse("PORT").unwrap()), Some(3 * WORD_LEN as u64));
	}

	#[test]
	fn rebuild_is_idempotent_and_preserves_lock_identity() {
		let table = IndexTable::new();
		let mut data = Vec::new();
		data.extend(record("IP", "127.0.0.1"));
		let mut cursor = Cursor::new(data.clone());
		let lock_before = {
			let mut w = table.write();
			table.rebuild_from_stream(&mut w, &mut cursor, 0).unwrap();
			w.key_lock(&Word::parse("IP").unwrap()).unwrap()
		};
		let mut cursor2 = Cursor::new(data);
		let lock_after = {
			let mut w = table.write();
			table.rebuild_from_stream(&mut w, &mut cursor2, 0).unwrap();
			w.key_lock(&Word::parse("IP").unwrap()).unwrap()
		};
		assert!(Arc::ptr_eq(&lock_before, &lock_after));
	}

	#[test]
	fn absent_key_has_no_offset() {
		let table = IndexTable::new();
		let r = table.read();
		assert_eq!(r.key_offset(&Word::parse("NOPE").unwrap()), None);
	}
}
