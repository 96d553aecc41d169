/*!
# Merma: Settings
*/

use crate::MermaError;
use dactyl::traits::BytesToUnsigned;
use std::{
	ffi::OsStr,
	num::NonZeroUsize,
	path::{
		Path,
		PathBuf,
	},
};



/// # Default Thread Count.
const DEFAULT_THREADS: NonZeroUsize = match NonZeroUsize::new(2) {
	Some(n) => n,
	None => unreachable!(),
};

/// # Default Dissimilarity Threshold.
const DEFAULT_THRESHOLD: f64 = 1.0;



#[derive(Debug, Clone)]
/// # Runtime Settings.
///
/// Parsed once up front, read-only everywhere else.
pub(super) struct Settings {
	/// # Root Directory.
	root: PathBuf,

	/// # Worker Count.
	threads: NonZeroUsize,

	/// # Maximum Acceptable Dissimilarity.
	///
	/// A candidate has to score strictly below this (and be strictly smaller
	/// than the original) to win.
	threshold: f64,

	/// # Descend Into Subdirectories?
	recursive: bool,

	/// # Try a Lossless Encode When Lossy Fails?
	lossless: bool,

	/// # Mirror the Root Before Starting?
	backup: bool,

	/// # Skip Files With Leftover Working Artifacts?
	skip_leftovers: bool,
}

impl Settings {
	/// # New Instance.
	///
	/// ## Errors
	///
	/// An error is returned if the path is missing or not a directory.
	pub(super) fn new(raw: &OsStr) -> Result<Self, MermaError> {
		let root = std::fs::canonicalize(raw)
			.ok()
			.filter(|p| p.is_dir())
			.ok_or(MermaError::RootDirectory)?;

		Ok(Self {
			root,
			threads: DEFAULT_THREADS,
			threshold: DEFAULT_THRESHOLD,
			recursive: false,
			lossless: false,
			backup: true,
			skip_leftovers: false,
		})
	}

	/// # Set Thread Count.
	///
	/// Update the worker count from raw bytes (passed via CLI).
	///
	/// ## Errors
	///
	/// An error is returned if the value is not a positive integer.
	pub(super) fn set_threads_raw(&mut self, raw: &[u8])
	-> Result<(), MermaError> {
		self.threads = usize::btou(raw.trim_ascii())
			.and_then(NonZeroUsize::new)
			.ok_or(MermaError::Threads)?;

		Ok(())
	}

	/// # Set Dissimilarity Threshold.
	///
	/// Update the threshold from raw bytes (passed via CLI).
	///
	/// ## Errors
	///
	/// An error is returned unless the value parses to a finite float
	/// greater than zero.
	pub(super) fn set_threshold_raw(&mut self, raw: &[u8])
	-> Result<(), MermaError> {
		self.threshold = std::str::from_utf8(raw)
			.ok()
			.and_then(|s| s.trim().parse::<f64>().ok())
			.filter(|t| t.is_finite() && 0.0 < *t)
			.ok_or(MermaError::Threshold)?;

		Ok(())
	}

	/// # Enable Recursion.
	pub(super) const fn set_recursive(&mut self) { self.recursive = true; }

	/// # Enable the Lossless Fallback.
	pub(super) const fn set_lossless(&mut self) { self.lossless = true; }

	/// # Disable the Backup Copy.
	pub(super) const fn set_no_backup(&mut self) { self.backup = false; }

	/// # Skip Dirty Files.
	pub(super) const fn set_skip_leftovers(&mut self) {
		self.skip_leftovers = true;
	}
}

impl Settings {
	#[must_use]
	/// # Root Directory.
	pub(super) fn root(&self) -> &Path { &self.root }

	#[must_use]
	/// # Worker Count.
	pub(super) const fn threads(&self) -> NonZeroUsize { self.threads }

	#[must_use]
	/// # Dissimilarity Threshold.
	pub(super) const fn threshold(&self) -> f64 { self.threshold }

	#[must_use]
	/// # Recursive?
	pub(super) const fn recursive(&self) -> bool { self.recursive }

	#[must_use]
	/// # Lossless Fallback?
	pub(super) const fn lossless(&self) -> bool { self.lossless }

	#[must_use]
	/// # Backup First?
	pub(super) const fn backup(&self) -> bool { self.backup }

	#[must_use]
	/// # Skip Dirty Files?
	pub(super) const fn skip_leftovers(&self) -> bool { self.skip_leftovers }
}



#[cfg(test)]
mod tests {
	use super::*;

	/// # Settings For Testing.
	fn test_settings() -> Settings {
		Settings::new(std::env::temp_dir().as_os_str())
			.expect("Temp dir should be usable.")
	}

	#[test]
	fn t_root() {
		assert!(Settings::new(OsStr::new("/definitely/not/a/real/path")).is_err());

		let s = test_settings();
		assert!(s.root().is_dir());
		assert_eq!(s.threads(), DEFAULT_THREADS);
		assert!((s.threshold() - DEFAULT_THRESHOLD).abs() < f64::EPSILON);
		assert!(! s.recursive());
		assert!(! s.lossless());
		assert!(s.backup());
		assert!(! s.skip_leftovers());
	}

	#[test]
	fn t_threads() {
		let mut s = test_settings();

		for (raw, expected) in [
			(&b"1"[..], Some(1)),
			(b"4", Some(4)),
			(b" 16 ", Some(16)),
			(b"0", None),
			(b"-2", None),
			(b"two", None),
			(b"", None),
		] {
			let res = s.set_threads_raw(raw);
			match expected {
				Some(n) => {
					assert!(res.is_ok(), "Threads {raw:?} should parse.");
					assert_eq!(s.threads().get(), n);
				},
				None => assert!(
					matches!(res, Err(MermaError::Threads)),
					"Threads {raw:?} should not parse.",
				),
			}
		}
	}

	#[test]
	fn t_threshold() {
		let mut s = test_settings();

		for (raw, expected) in [
			(&b"1"[..], Some(1.0)),
			(b"0.5", Some(0.5)),
			(b" 2.25 ", Some(2.25)),
			(b"0.0001", Some(0.000_1)),
			(b"0", None),
			(b"0.0", None),
			(b"-1", None),
			(b"inf", None),
			(b"NaN", None),
			(b"picky", None),
			(b"", None),
		] {
			let res = s.set_threshold_raw(raw);
			match expected {
				Some(t) => {
					assert!(res.is_ok(), "Threshold {raw:?} should parse.");
					assert!((s.threshold() - t).abs() < f64::EPSILON);
				},
				None => assert!(
					matches!(res, Err(MermaError::Threshold)),
					"Threshold {raw:?} should not parse.",
				),
			}
		}
	}
}
