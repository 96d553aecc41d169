/*!
# Merma: Dissimilarity Oracle
*/

use crate::{
	DerivedPaths,
	Gateway,
	ImageKind,
	TaskError,
	ToolKind,
	tools,
};
use dactyl::NiceU8;
use std::{
	ffi::OsStr,
	path::Path,
};



/// # Comparator Floor.
///
/// Butteraugli refuses images with either dimension below this.
const MIN_ANALYZABLE: u32 = 32;



#[derive(Debug, Clone, Copy)]
/// # One Probe's Observation.
pub(super) struct OracleResult {
	/// # Perceptual Dissimilarity.
	pub(super) dissimilarity: f64,

	/// # Candidate Size in Bytes.
	pub(super) candidate_size: u64,
}

impl OracleResult {
	/// # Worst Possible Observation.
	///
	/// Probe failures substitute this so an unknown quality can never win.
	pub(super) const REJECT: Self = Self {
		dissimilarity: f64::INFINITY,
		candidate_size: u64::MAX,
	};

	#[must_use]
	/// # Acceptable?
	///
	/// Both constraints are strict: visually close enough AND actually
	/// smaller.
	pub(super) fn accepts(self, threshold: f64, original_size: u64) -> bool {
		self.dissimilarity < threshold && self.candidate_size < original_size
	}
}



/// # Run One Probe.
///
/// Encode the source at `quality`, decode the result back to PNG, then ask
/// the comparator how different the round trip looks from the original.
///
/// The target artifact (lossy or lossless candidate) is left in place for
/// the caller; the two comparison copies are always removed before
/// returning, success or failure.
///
/// ## Errors
///
/// Tool failures, unusable tool output, and filesystem hiccups bubble up as
/// the corresponding [`TaskError`]; callers treat any of them as a rejecting
/// observation.
pub(super) fn probe<G: Gateway>(
	gw: &G,
	paths: &DerivedPaths,
	kind: ImageKind,
	quality: u8,
	lossless: bool,
) -> Result<OracleResult, TaskError> {
	let target = paths.probe_target(lossless);
	encode(gw, paths.src(), target, quality, lossless)?;
	let candidate_size = std::fs::metadata(target)
		.map_err(|_| TaskError::Filesystem)?
		.len();

	// The comparison copies last only as long as this call.
	let decoded = paths.decoded(lossless);
	let reference = paths.reference();
	let _cleanup = TempGuard([&decoded, reference]);

	// Decode the candidate back to something the comparator can read.
	gw.run(ToolKind::Decoder, &[
		target.as_os_str(),
		OsStr::new("-o"),
		decoded.as_os_str(),
	])?;

	// Build the reference. WebP sources need the same decoding treatment;
	// everything else is a byte copy.
	if matches!(kind, ImageKind::Webp) {
		gw.run(ToolKind::Decoder, &[
			paths.src().as_os_str(),
			OsStr::new("-o"),
			reference.as_os_str(),
		])?;
	}
	else if std::fs::copy(paths.src(), reference).is_err() {
		return Err(TaskError::Filesystem);
	}

	// PNG pairs disagree about alpha unless told otherwise.
	if matches!(kind, ImageKind::Png) {
		alpha_on(gw, &decoded)?;
		alpha_on(gw, reference)?;
	}

	// Tiny images trip the comparator; upscale the copies (and only the
	// copies) until they clear the floor.
	let line = gw.run(ToolKind::Inspector, &[
		OsStr::new("-format"),
		OsStr::new("%w %h"),
		reference.as_os_str(),
	])?;
	let (width, height) = tools::parse_dimensions(line.as_deref())?;
	if let Some(bound) = upscale_bound(width, height) {
		resize(gw, &decoded, bound)?;
		resize(gw, reference, bound)?;
	}

	// Score it.
	let line = gw.run(ToolKind::Comparator, &[
		decoded.as_os_str(),
		reference.as_os_str(),
	])?;
	let dissimilarity = tools::parse_score(line.as_deref())?;

	Ok(OracleResult { dissimilarity, candidate_size })
}



/// # Encode to WebP.
fn encode<G: Gateway>(
	gw: &G,
	src: &Path,
	target: &Path,
	quality: u8,
	lossless: bool,
) -> Result<(), TaskError> {
	let quality = NiceU8::from(quality);
	let mut args: Vec<&OsStr> = Vec::with_capacity(8);
	if lossless { args.push(OsStr::new("-lossless")); }
	args.extend([
		OsStr::new("-af"),
		OsStr::new("-mt"),
		OsStr::new("-q"),
		OsStr::new(quality.as_str()),
		src.as_os_str(),
		OsStr::new("-o"),
		target.as_os_str(),
	]);

	gw.run(ToolKind::Encoder, &args).map(|_| ())
}

/// # Force an Alpha Channel.
fn alpha_on<G: Gateway>(gw: &G, target: &Path) -> Result<(), TaskError> {
	gw.run(ToolKind::Converter, &[
		target.as_os_str(),
		OsStr::new("-alpha"),
		OsStr::new("on"),
		target.as_os_str(),
	]).map(|_| ())
}

/// # Resize In Place.
///
/// The geometry bounds the longer side, so aspect is preserved.
fn resize<G: Gateway>(gw: &G, target: &Path, bound: u32) -> Result<(), TaskError> {
	let geometry = format!("{bound}x{bound}");
	gw.run(ToolKind::Converter, &[
		target.as_os_str(),
		OsStr::new("-resize"),
		OsStr::new(&geometry),
		target.as_os_str(),
	]).map(|_| ())
}

/// # Upscale Bound.
///
/// `None` when both dimensions already clear the comparator floor;
/// otherwise the longer-side bound that lifts the shorter side to exactly
/// the floor (rounded up).
const fn upscale_bound(width: u32, height: u32) -> Option<u32> {
	let (short, long) =
		if width < height { (width, height) }
		else { (height, width) };

	if short == 0 || MIN_ANALYZABLE <= short { None }
	else {
		let scaled =
			(MIN_ANALYZABLE as u64 * long as u64).div_ceil(short as u64);
		Some(scaled as u32)
	}
}



/// # Comparison-Copy Cleanup.
///
/// Drops remove both working copies no matter how the probe exits.
struct TempGuard<'a>([&'a Path; 2]);

impl Drop for TempGuard<'_> {
	fn drop(&mut self) {
		for p in self.0 { crate::paths::remove_if(p); }
	}
}
