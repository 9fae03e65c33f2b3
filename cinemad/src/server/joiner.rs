// SPDX-License-Identifier: MIT OR Apache-2.0

//! The joiner thread: reclaims finished worker threads so they never
//! accumulate as zombies. Draining the channel to completion falls out
//! naturally from `mpsc`'s closed-channel semantics -- the receiver's
//! iterator ends only once every `Sender` (held by `ServerContext`, which
//! both listener threads and `main` share an `Arc` of) has been dropped.

use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

pub fn run(rx: Receiver<JoinHandle<()>>) {
	for handle in rx.iter() {
		if handle.join().is_err() {
			log::warn!(target: "cinemad::joiner", "a worker thread panicked");
		}
	}
	log::debug!(target: "cinemad::joiner", "joiner thread exiting, queue drained");
}
