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

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug)]
pub enum Error {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("another process already holds the data file lock")]
	AlreadyLocked,
	#[error("word '{word}' exceeds the {max}-byte limit")]
	WordTooLong { word: String, max: usize },
	#[error("malformed request: {0}")]
	MalformedRequest(String),
	#[error("storage invariant violated: {0}")]
	Corrupt(String),
	#[error("framed message of {len} bytes exceeds the {max}-byte limit")]
	MessageTooLarge { len: u32, max: u32 },
}

impl Error {
	/// Classify the error the way the wire protocol does: a fault the client
	/// sees as `ERROR` versus one that the server treats as fatal at startup.
	pub fn is_malformed(&self) -> bool {
		matches!(self, Error::MalformedRequest(_) | Error::WordTooLong { .. })
	}
}
