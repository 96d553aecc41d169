/*!
# Merma: Quality Search
*/

use crate::OracleResult;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Search Outcome.
pub(super) enum SearchOutcome {
	/// # Lowest Acceptable Lossy Quality.
	Found {
		/// # Quality.
		quality: u8,

		/// # Candidate Size at That Quality.
		size: u64,
	},

	/// # No Lossy Quality Passed Review.
	NotFound,
}



/// # Find the Minimal Acceptable Quality.
///
/// Binary-search integer quality in `0..=100`, asking `probe` about each
/// midpoint. A quality is acceptable when its observation clears both
/// constraints (dissimilarity strictly under `threshold`, size strictly
/// under `original_size`); acceptance pulls the upper bound down, anything
/// else pushes the lower bound up.
///
/// The quality axis is assumed roughly monotonic but not trusted to be:
/// a bound that would land on its own current value is nudged past it
/// instead, so plateaus and the occasional inversion cannot stall the
/// loop, and observations are remembered so no quality is probed twice.
/// Convergence therefore costs at most seven probes.
///
/// The answer is the lowest quality observed to pass, or [`SearchOutcome::NotFound`]
/// when nothing did.
pub(super) fn minimal_quality<F>(
	threshold: f64,
	original_size: u64,
	mut probe: F,
) -> SearchOutcome
where F: FnMut(u8) -> OracleResult {
	let mut seen: [Option<OracleResult>; 101] = [None; 101];
	let mut best: Option<(u8, u64)> = None;

	let mut min: u8 = 0;
	let mut max: u8 = 100;
	while min != max {
		let quality = midpoint(min, max);
		let res = match seen[usize::from(quality)] {
			Some(res) => res,
			None => {
				let res = probe(quality);
				seen[usize::from(quality)] = Some(res);
				res
			},
		};

		if res.accepts(threshold, original_size) {
			// The image tolerates at least this much compression; try for
			// more.
			best = Some((quality, res.candidate_size));
			max = if max == quality { quality - 1 } else { quality };
		}
		else {
			// Too mangled (or too big); scale the compression back a bit.
			min = if min == quality { quality + 1 } else { quality };
		}
	}

	match best {
		Some((quality, size)) => SearchOutcome::Found { quality, size },
		None => SearchOutcome::NotFound,
	}
}

/// # Half-Up Midpoint.
///
/// Bounds never exceed one hundred so the sum cannot overflow.
const fn midpoint(min: u8, max: u8) -> u8 { (min + max + 1) / 2 }
