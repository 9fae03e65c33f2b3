// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot "enter background mode" step, consumed through the `daemonize`
//! crate rather than hand-rolled `fork`/`setsid` FFI.

use crate::config::Args;

#[cfg(unix)]
pub fn maybe_daemonize(args: &Args) {
	if args.foreground {
		return;
	}
	use daemonize::Daemonize;
	let home = std::env::var_os("HOME").map(std::path::PathBuf::from).unwrap_or_else(|| std::path::PathBuf::from("."));
	let daemonize = Daemonize::new().working_directory(home).umask(0o027);
	if let Err(e) = daemonize.start() {
		eprintln!("fatal: failed to daemonize: {}", e);
		std::process::exit(1);
	}
}

#[cfg(not(unix))]
pub fn maybe_daemonize(args: &Args) {
	if !args.foreground {
		eprintln!("warning: daemonization is only supported on unix; continuing in the foreground");
	}
}
