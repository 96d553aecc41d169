/*!
# Merma: Per-Image Pipeline
*/

use crate::{
	DerivedPaths,
	Gateway,
	ImageKind,
	OracleResult,
	SearchOutcome,
	Settings,
	TaskError,
	oracle,
	search,
};
use std::path::Path;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # How a Task Ended.
pub(super) enum Finish {
	/// # Original Replaced by a Smaller Candidate.
	Replaced {
		/// # Original Size.
		before: u64,

		/// # Replacement Size.
		after: u64,
	},

	/// # Nothing Beat the Original.
	Unimproved {
		/// # Original Size.
		before: u64,
	},

	/// # Left Alone.
	Skipped,
}



/// # Process One Image.
///
/// Search for the lowest acceptable lossy quality, fall back to a single
/// lossless attempt if allowed, and either retire the original in favor of
/// the winner or put everything back the way it was.
///
/// Whatever happens, no derived artifact outlives the call; only a
/// replacement (at its proper destination) sticks around.
///
/// ## Errors
///
/// Returns an error if the original cannot be read or a finalizing
/// rename/removal fails. Probe-level failures are absorbed into the search
/// as rejections rather than raised.
pub(super) fn process<G: Gateway>(gw: &G, src: &Path, settings: &Settings)
-> Result<Finish, TaskError> {
	let Some(kind) = ImageKind::try_from_path(src) else {
		return Ok(Finish::Skipped);
	};
	let paths = DerivedPaths::new(src, kind);

	// Leftover artifacts mean a previous run died mid-file; steer clear if
	// asked to.
	if settings.skip_leftovers() && paths.has_leftovers() {
		return Ok(Finish::Skipped);
	}

	let out = compress(gw, &paths, kind, settings);

	// A replacement has already moved everything worth keeping into place;
	// any other ending leaves only junk behind.
	if ! matches!(out, Ok(Finish::Replaced { .. })) { paths.scrub(); }

	out
}

/// # Search, Fall Back, Finalize.
fn compress<G: Gateway>(
	gw: &G,
	paths: &DerivedPaths,
	kind: ImageKind,
	settings: &Settings,
) -> Result<Finish, TaskError> {
	let before = std::fs::metadata(paths.src())
		.map_err(|_| TaskError::Filesystem)?
		.len();
	let threshold = settings.threshold();

	let outcome = search::minimal_quality(threshold, before, |quality|
		match oracle::probe(gw, paths, kind, quality, false) {
			Ok(res) => {
				// Park passing bytes out of reach so later (losing) probes
				// can't clobber them; a parking failure demotes the probe
				// rather than risking a mismatched artifact.
				if
					res.accepts(threshold, before) &&
					std::fs::rename(paths.candidate(), paths.best()).is_err()
				{
					OracleResult::REJECT
				}
				else { res }
			},
			// Fail closed: an unknowable quality must never win.
			Err(_) => OracleResult::REJECT,
		}
	);

	if let SearchOutcome::Found { size, .. } = outcome {
		// The winner is sitting in the parking spot.
		if std::fs::rename(paths.best(), paths.candidate()).is_err() {
			return Err(TaskError::Filesystem);
		}
		replace(paths)?;
		return Ok(Finish::Replaced { before, after: size });
	}

	// No lossy quality made the cut; maybe lossless will. (Probe errors
	// here read as "not acceptable" rather than task failure.)
	if settings.lossless() {
		if let Ok(res) = oracle::probe(gw, paths, kind, 100, true) {
			if res.accepts(threshold, before) {
				if std::fs::rename(paths.lossless(), paths.candidate()).is_err() {
					return Err(TaskError::Filesystem);
				}
				replace(paths)?;
				return Ok(Finish::Replaced {
					before,
					after: res.candidate_size,
				});
			}
		}
	}

	Ok(Finish::Unimproved { before })
}

/// # Retire the Original.
///
/// The candidate must already be durably written; the original is the last
/// thing to go, so a crash anywhere in here leaves at least one valid copy.
fn replace(paths: &DerivedPaths) -> Result<(), TaskError> {
	if paths.in_place() {
		std::fs::rename(paths.candidate(), paths.src())
			.map_err(|_| TaskError::Filesystem)
	}
	else {
		std::fs::remove_file(paths.src())
			.map_err(|_| TaskError::Filesystem)
	}
}
