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

//! Length-prefixed textual message framing, shared by the request server's
//! worker threads and the CLI client. One frame is a 4-byte big-endian
//! length followed by that many bytes of UTF-8 text; one request, one reply,
//! then the connection closes.
//!
//! ```text
//! +----------------+-------------------+
//! | Length (4B BE) | UTF-8 text        |
//! +----------------+-------------------+
//! ```

use crate::error::{Error, Result};
use std::io::{Read, Write};

/// No single request or reply is expected to carry more than a handful of
/// seat numbers; this bound only exists to keep a malformed or hostile
/// length header from causing an unbounded allocation.
pub const MAX_MESSAGE_LEN: u32 = 64 * 1024;

/// Read one framed message from `stream` and return it as a `String`.
pub fn read_message(stream: &mut impl Read) -> Result<String> {
	let mut len_buf = [0u8; 4];
	stream.read_exact(&mut len_buf)?;
	let len = u32::from_be_bytes(len_buf);
	if len > MAX_MESSAGE_LEN {
		return Err(Error::MessageTooLarge { len, max: MAX_MESSAGE_LEN });
	}
	let mut body = vec![0u8; len as usize];
	stream.read_exact(&mut body)?;
	String::from_utf8(body).map_err(|e| Error::MalformedRequest(format!("non-utf8 message: {}", e)))
}

/// Write `message` to `stream` as one framed message.
pub fn write_message(stream: &mut impl Write, message: &str) -> Result<()> {
	let bytes = message.as_bytes();
	if bytes.len() > MAX_MESSAGE_LEN as usize {
		return Err(Error::MessageTooLarge { len: bytes.len() as u32, max: MAX_MESSAGE_LEN });
	}
	stream.write_all(&(bytes.len() as u32).to_be_bytes())?;
	stream.write_all(bytes)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn round_trips_a_message() {
		let mut buf = Vec::new();
		write_message(&mut buf, "GET ROWS").unwrap();
		let mut cursor = Cursor::new(buf);
		assert_eq!(read_message(&mut cursor).unwrap(), "GET ROWS");
	}

	#[test]
	fn empty_message_round_trips() {
		let mut buf = Vec::new();
		write_message(&mut buf, "").unwrap();
		let mut cursor = Cursor::new(buf);
		assert_eq!(read_message(&mut cursor).unwrap(), "");
	}

	#[test]
	fn oversized_length_header_is_rejected_before_allocating() {
		let mut buf = Vec::new();
		buf.extend_from_slice(&(MAX_MESSAGE_LEN + 1).to_be_bytes());
		let mut cursor = Cursor::new(buf);
		assert!(matches!(read_message(&mut cursor), Err(Error::MessageTooLarge { .. })));
	}
}
