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

//! `cinemadb` is the fixed-width key/value store, query language and
//! booking layer behind the cinema seat-reservation daemon. It has no
//! network code of its own -- `cinemad` links this crate and adds the two
//! listeners, worker pool and daemonization around it; `cinema-cli` links
//! it only for the wire-framing and word helpers a thin client needs.

pub mod booking;
pub mod error;
pub mod framing;
pub mod index;
pub mod query;
pub mod schema;
pub mod storage;
pub mod tree;
pub mod word;

pub use booking::{book, unbook, status, BookOutcome, UnbookOutcome};
pub use error::{Error, Result};
pub use query::{execute, Reply};
pub use storage::Engine;
pub use word::{Word, WORD_LEN};
