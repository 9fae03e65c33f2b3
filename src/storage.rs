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

//! The append-only, fixed-width key/value store.
//!
//! Records are `2 * WORD_LEN` bytes: a key word immediately followed by its
//! value word. The file is opened under a whole-file, non-blocking advisory
//! exclusive lock (`fs2`) so a second instance on the same data file fails
//! to open rather than silently corrupting it: at most one process holds
//! the file at a time.

use crate::error::{Error, Result};
use crate::index::{IndexTable, TableGuard};
use crate::word::{Word, WORD_LEN};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const RECORD_LEN: u64 = 2 * WORD_LEN as u64;

pub struct Engine {
	file: File,
	index: IndexTable,
	path: PathBuf,
}

impl Engine {
	/// Open (but do not create) the data file at `path`, taking the
	/// whole-file exclusive lock and building the index with one pass over
	/// the existing records.
	pub fn open(path: impl AsRef<Path>) -> Result<Engine> {
		let path = path.as_ref().to_path_buf();
		let file = OpenOptions::new().read(true).write(true).open(&path)?;
		if file.try_lock_exclusive().is_err() {
			log::warn!(target: "cinemadb::storage", "{}: another process already holds the data file", path.display());
			return Err(Error::AlreadyLocked);
		}
		let index = IndexTable::new();
		let engine = Engine { file, index, path };
		{
			let mut w = engine.index.write();
			let mut cursor = PositionalReader { file: &engine.file, pos: 0 };
			engine.index.rebuild_from_stream(&mut w, &mut cursor, 0)?;
		}
		log::debug!(target: "cinemadb::storage", "opened {} with {} records", engine.path.display(), engine.index.read().len());
		Ok(engine)
	}

	/// Create a brand-new, empty data file at `path` and open it. Fails if
	/// the file already exists.
	pub fn create(path: impl AsRef<Path>) -> Result<Engine> {
		let path = path.as_ref().to_path_buf();
		OpenOptions::new().write(true).create_new(true).open(&path)?;
		log::info!(target: "cinemadb::storage", "created new data file at {}", path.display());
		Engine::open(path)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	#[cfg(unix)]
	fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
		use std::os::unix::fs::FileExt as _;
		Ok(self.file.read_exact_at(buf, offset)?)
	}

	#[cfg(windows)]
	fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
		use std::os::windows::fs::FileExt as _;
		let mut read = 0usize;
		while read < buf.len() {
			let n = self.file.seek_read(&mut buf[read..], offset + read as u64)?;
			if n == 0 {
				return Err(Error::Corrupt(format!("short read at offset {}", offset)));
			}
			read += n;
		}
		Ok(())
	}

	#[cfg(unix)]
	fn write_at(&self, buf: &[u8], offset: u64) -> Result<()> {
		use std::os::unix::fs::FileExt as _;
		Ok(self.file.write_all_at(buf, offset)?)
	}

	#[cfg(windows)]
	fn write_at(&self, buf: &[u8], offset: u64) -> Result<()> {
		use std::os::windows::fs::FileExt as _;
		let mut written = 0usize;
		while written < buf.len() {
			let n = self.file.seek_write(&buf[written..], offset + written as u64)?;
			written += n;
		}
		Ok(())
	}

	/// Read path: `GET key`. Returns `None` if the key has never been set.
	pub fn get(&self, key: &Word) -> Result<Option<Word>> {
		let table = self.index.read();
		let offset = match table.key_offset(key) {
			Some(offset) => offset,
			None => return Ok(None),
		};
		let key_lock = table.key_lock(key).expect("offset present implies a per-key lock exists");
		let _key_guard = key_lock.read();
		let mut buf = [0u8; WORD_LEN];
		self.read_at(&mut buf, offset)?;
		drop(_key_guard);
		drop(table);
		Ok(Some(Word::from_bytes(buf)))
	}

	/// Write path: `SET key value`. Creates the record if the key is new,
	/// otherwise overwrites the existing value word in place.
	pub fn set(&self, key: &Word, value: &Word) -> Result<()> {
		let mut table = TableGuard::Read(self.index.read());
		if table.key_offset(key).is_none() {
			// Double-checked insert: escalate to the writer lock and recheck,
			// since another thread may have inserted this key meanwhile.
			drop(table);
			let mut w = self.index.write();
			if w.key_offset(key).is_none() {
				let end = self.file.metadata()?.len();
				self.write_at(key.as_bytes(), end)?;
				self.write_at(value.as_bytes(), end + WORD_LEN as u64)?;
				w.insert_known(*key, end + WORD_LEN as u64);
				log::trace!(target: "cinemadb::storage", "{}: appended new record for {:?} at offset {}", self.path.display(), key, end);
			}
			table = TableGuard::Write(w);
		}
		let offset = table.key_offset(key).expect("just inserted or already present");
		let key_lock = table.key_lock(key).expect("offset present implies a per-key lock exists");
		let _key_guard = key_lock.write();
		self.write_at(value.as_bytes(), offset)?;
		drop(_key_guard);
		drop(table);
		Ok(())
	}

	/// `ADD key`: allocate the key with an empty (all-zero) value if it does
	/// not already exist. Idempotent -- calling `add` on an existing key
	/// leaves its current value untouched, so startup reconciliation can
	/// re-run the seed sequence safely.
	pub fn add(&self, key: &Word) -> Result<()> {
		let table = self.index.read();
		if table.key_offset(key).is_some() {
			return Ok(());
		}
		drop(table);
		let mut w = self.index.write();
		if w.key_offset(key).is_none() {
			let end = self.file.metadata()?.len();
			self.write_at(key.as_bytes(), end)?;
			self.write_at(Word::ZERO.as_bytes(), end + WORD_LEN as u64)?;
			w.insert_known(*key, end + WORD_LEN as u64);
		}
		Ok(())
	}
}

struct PositionalReader<'a> {
	file: &'a File,
	pos: u64,
}

impl<'a> std::io::Read for PositionalReader<'a> {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		#[cfg(unix)]
		let n = {
			use std::os::unix::fs::FileExt as _;
			self.file.read_at(buf, self.pos)?
		};
		#[cfg(windows)]
		let n = {
			use std::os::windows::fs::FileExt as _;
			self.file.seek_read(buf, self.pos)?
		};
		self.pos += n as u64;
		Ok(n)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::NamedTempFile;

	fn new_engine() -> (Engine, NamedTempFile) {
		env_logger::try_init().ok();
		let tmp = NamedTempFile::new().unwrap();
		let engine = Engine::open(tmp.path()).unwrap();
		(engine, tmp)
	}

	#[test]
	fn get_on_absent_key_is_none() {
		let (engine, _tmp) = new_engine();
		assert_eq!(engine.get(&Word::parse("NOPE").unwrap()).unwrap(), None);
	}

	#[test]
	fn set_then_get_round_trips() {
		let (engine, _tmp) = new_engine();
		let key = Word::parse("ROWS").unwrap();
		engine.set(&key, &Word::parse("4").unwrap()).unwrap();
		assert_eq!(engine.get(&key).unwrap().unwrap().trim(), "4");
	}

	#[test]
	fn set_twice_overwrites_in_place() {
		let (engine, tmp) = new_engine();
		let key = Word::parse("COLUMNS").unwrap();
		engine.set(&key, &Word::parse("1").unwrap()).unwrap();
		let len_after_first = std::fs::metadata(tmp.path()).unwrap().len();
		engine.set(&key, &Word::parse("9").unwrap()).unwrap();
		let len_after_second = std::fs::metadata(tmp.path()).unwrap().len();
		assert_eq!(len_after_first, len_after_second, "overwrite must not append a new record");
		assert_eq!(engine.get(&key).unwrap().unwrap().trim(), "9");
	}

	#[test]
	fn reopening_recovers_state() {
		let tmp = NamedTempFile::new().unwrap();
		{
			let engine = Engine::open(tmp.path()).unwrap();
			engine.set(&Word::parse("PID").unwrap(), &Word::parse("1234").unwrap()).unwrap();
		}
		let engine = Engine::open(tmp.path()).unwrap();
		assert_eq!(engine.get(&Word::parse("PID").unwrap()).unwrap().unwrap().trim(), "1234");
	}

	#[test]
	fn second_open_on_same_file_fails() {
		let tmp = NamedTempFile::new().unwrap();
		let _engine = Engine::open(tmp.path()).unwrap();
		let second = Engine::open(tmp.path());
		assert!(matches!(second, Err(Error::AlreadyLocked)));
	}

	#[test]
	fn many_keys_are_each_independently_addressable() {
		let (engine, _tmp) = new_engine();
		for i in 0..64u64 {
			engine.set(&Word::from_u64(i), &Word::from_u64(i * 7)).unwrap();
		}
		for i in 0..64u64 {
			assert_eq!(engine.get(&Word::from_u64(i)).unwrap().unwrap().as_decimal(), i * 7);
		}
	}
}
