/*!
# Merma: Image Kind
*/

use crate::{
	E_JPEG,
	E_JPG,
	E_PNG,
	E_WEBP,
};
use dowser::Extension;
use std::{
	os::unix::ffi::OsStrExt,
	path::Path,
};



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Image Kind.
///
/// The kind decides more than the crawl filter: PNG sources need their alpha
/// channels normalized before scoring, and WebP sources need decoding first
/// because the comparator can't read them directly.
pub(super) enum ImageKind {
	/// # Jpeg.
	Jpeg,
	/// # Png.
	Png,
	/// # Webp.
	Webp,
}

impl ImageKind {
	#[must_use]
	/// # From Path.
	///
	/// Match a file path against the supported extensions, case-insensitively.
	/// Android 9-patch files look like PNGs but aren't squeezable ones, so
	/// `*.9.png` comes back `None`.
	pub(super) fn try_from_path(src: &Path) -> Option<Self> {
		if let Some(e) = Extension::try_from3(src) {
			if e == E_JPG { return Some(Self::Jpeg); }
			if e == E_PNG {
				if is_nine_patch(src) { return None; }
				return Some(Self::Png);
			}
		}
		else if let Some(e) = Extension::try_from4(src) {
			if e == E_JPEG { return Some(Self::Jpeg); }
			if e == E_WEBP { return Some(Self::Webp); }
		}

		None
	}

	#[must_use]
	/// # As Str.
	pub(super) const fn as_str(self) -> &'static str {
		match self {
			Self::Jpeg => "JPEG",
			Self::Png => "PNG",
			Self::Webp => "WebP",
		}
	}
}



/// # Is 9-Patch?
///
/// `foo.9.png` et al.
fn is_nine_patch(src: &Path) -> bool {
	src.file_name().is_some_and(|n| {
		let n = n.as_bytes();
		6 < n.len() && n[n.len() - 6..].eq_ignore_ascii_case(b".9.png")
	})
}
