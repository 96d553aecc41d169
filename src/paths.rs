/*!
# Merma: Derived Paths
*/

use crate::ImageKind;
use std::{
	ffi::OsString,
	os::unix::ffi::{
		OsStrExt,
		OsStringExt,
	},
	path::{
		Path,
		PathBuf,
	},
};



#[derive(Debug, Clone)]
/// # Derived Working Paths.
///
/// Every path a task might write is derived from the source exactly once,
/// here, so the oracle, the search, and the finalizer all agree on where
/// things live.
///
/// For `X.jpg`:
/// * candidate:  `X.webp`
/// * lossless:   `X.webp.lossless`
/// * decoded:    `X.webp.png` (or `X.webp.lossless.png`)
/// * reference:  `X.jpg.temp`
/// * best:       `X.webp.best`
///
/// WebP sources would collide with their own candidate, so those get an
/// `.out` working suffix instead and finish with a rename over the source.
pub(super) struct DerivedPaths {
	/// # Source Path.
	src: PathBuf,
	/// # Lossy Candidate.
	candidate: PathBuf,
	/// # Lossless Candidate.
	lossless: PathBuf,
	/// # Comparison Reference.
	reference: PathBuf,
	/// # Candidate Must Be Renamed Over the Source?
	in_place: bool,
}

impl DerivedPaths {
	#[must_use]
	/// # New.
	pub(super) fn new(src: &Path, kind: ImageKind) -> Self {
		let in_place = matches!(kind, ImageKind::Webp);
		let candidate =
			if in_place { suffixed(src, b".out") }
			else { src.with_extension("webp") };
		let lossless = suffixed(&candidate, b".lossless");
		let reference = suffixed(src, b".temp");

		Self {
			src: src.to_path_buf(),
			candidate,
			lossless,
			reference,
			in_place,
		}
	}

	#[must_use]
	/// # Source.
	pub(super) fn src(&self) -> &Path { &self.src }

	#[must_use]
	/// # Lossy Candidate.
	pub(super) fn candidate(&self) -> &Path { &self.candidate }

	#[must_use]
	/// # Lossless Candidate.
	pub(super) fn lossless(&self) -> &Path { &self.lossless }

	#[must_use]
	/// # Comparison Reference.
	pub(super) fn reference(&self) -> &Path { &self.reference }

	#[must_use]
	/// # Probe Target.
	///
	/// The path the encoder writes to: the lossy candidate normally, its
	/// lossless sibling for the one lossless probe.
	pub(super) fn probe_target(&self, lossless: bool) -> &Path {
		if lossless { &self.lossless }
		else { &self.candidate }
	}

	#[must_use]
	/// # Decoded Comparison Copy.
	///
	/// PNG re-render of the probe target, compared against the reference.
	pub(super) fn decoded(&self, lossless: bool) -> PathBuf {
		suffixed(self.probe_target(lossless), b".png")
	}

	#[must_use]
	/// # Best-So-Far Candidate.
	///
	/// Each accepted probe parks its artifact here so later (rejected)
	/// probes can't clobber the bytes that actually passed review.
	pub(super) fn best(&self) -> PathBuf {
		suffixed(&self.candidate, b".best")
	}

	#[must_use]
	/// # In Place?
	pub(super) const fn in_place(&self) -> bool { self.in_place }

	#[must_use]
	/// # Any Leftover Working Files?
	///
	/// True when some prior (interrupted) run left artifacts behind at any
	/// of the derived locations.
	pub(super) fn has_leftovers(&self) -> bool {
		self.candidate.exists() ||
		self.lossless.exists() ||
		self.reference.exists() ||
		self.best().exists() ||
		self.decoded(false).exists() ||
		self.decoded(true).exists()
	}

	/// # Remove All Working Files.
	///
	/// Best-effort cleanup of everything but the source itself.
	pub(super) fn scrub(&self) {
		remove_if(&self.decoded(false));
		remove_if(&self.decoded(true));
		remove_if(&self.reference);
		remove_if(&self.best());
		remove_if(&self.lossless);
		remove_if(&self.candidate);
	}
}



/// # Remove If It Exists.
///
/// We can't do anything if deletion fails, but at least we can say we tried.
pub(super) fn remove_if(path: &Path) {
	if path.exists() {
		let _res = std::fs::remove_file(path);
	}
}

/// # Append a Byte Suffix.
fn suffixed(path: &Path, suffix: &[u8]) -> PathBuf {
	let mut raw = path.as_os_str().as_bytes().to_vec();
	raw.extend_from_slice(suffix);
	PathBuf::from(OsString::from_vec(raw))
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_derived() {
		let raw: &[(&str, ImageKind, &str, &str, &str, &str, bool)] = &[
			(
				"/a/photo.jpg", ImageKind::Jpeg,
				"/a/photo.webp", "/a/photo.webp.lossless",
				"/a/photo.webp.png", "/a/photo.jpg.temp",
				false,
			),
			(
				"/a/photo.jpeg", ImageKind::Jpeg,
				"/a/photo.webp", "/a/photo.webp.lossless",
				"/a/photo.webp.png", "/a/photo.jpeg.temp",
				false,
			),
			(
				"/a/b/icon.png", ImageKind::Png,
				"/a/b/icon.webp", "/a/b/icon.webp.lossless",
				"/a/b/icon.webp.png", "/a/b/icon.png.temp",
				false,
			),
			(
				"/a/banner.webp", ImageKind::Webp,
				"/a/banner.webp.out", "/a/banner.webp.out.lossless",
				"/a/banner.webp.out.png", "/a/banner.webp.temp",
				true,
			),
		];

		for (src, kind, candidate, lossless, decoded, reference, in_place) in raw {
			let paths = DerivedPaths::new(Path::new(src), *kind);
			assert_eq!(paths.src(), Path::new(src));
			assert_eq!(paths.candidate(), Path::new(candidate), "Candidate for {src}.");
			assert_eq!(paths.lossless(), Path::new(lossless), "Lossless for {src}.");
			assert_eq!(paths.decoded(false), Path::new(decoded), "Decoded for {src}.");
			assert_eq!(paths.reference(), Path::new(reference), "Reference for {src}.");
			assert_eq!(paths.in_place(), *in_place, "In-place for {src}.");
		}
	}

	#[test]
	fn t_probe_target() {
		let paths = DerivedPaths::new(Path::new("/a/photo.jpg"), ImageKind::Jpeg);
		assert_eq!(paths.probe_target(false), paths.candidate());
		assert_eq!(paths.probe_target(true), paths.lossless());
		assert_eq!(
			paths.decoded(true),
			Path::new("/a/photo.webp.lossless.png"),
		);
		assert_eq!(paths.best(), Path::new("/a/photo.webp.best"));
	}

	#[test]
	fn t_scrub() {
		let dir = tempfile::tempdir().expect("Missing tempdir.");
		let src = dir.path().join("pic.jpg");
		std::fs::write(&src, b"jpegish").expect("Write failed.");

		let paths = DerivedPaths::new(&src, ImageKind::Jpeg);
		assert!(! paths.has_leftovers());

		std::fs::write(paths.candidate(), b"webpish").expect("Write failed.");
		std::fs::write(paths.reference(), b"copy").expect("Write failed.");
		assert!(paths.has_leftovers());

		paths.scrub();
		assert!(! paths.has_leftovers());
		assert!(src.exists(), "Scrub ate the source!");
	}
}
