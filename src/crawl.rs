/*!
# Merma: Crawl
*/

use crate::{
	ImageKind,
	MermaError,
};
use fyi_msg::Msg;
use std::path::{
	Path,
	PathBuf,
};



/// # Walk a Directory.
///
/// Hand every qualifying image under `dir` to `sink` — files before
/// subdirectories, each batch in name order — recursing only when asked
/// to. Unreadable directories are passed over without comment, as are
/// symlinks.
///
/// The sink returns `false` to cut the walk short; the return value
/// reports whether enumeration ran to completion.
pub(super) fn walk<F>(dir: &Path, recursive: bool, sink: &mut F) -> bool
where F: FnMut(PathBuf) -> bool {
	let Ok(rd) = std::fs::read_dir(dir) else { return true; };

	let mut files = Vec::new();
	let mut dirs = Vec::new();
	for e in rd.flatten() {
		let Ok(ft) = e.file_type() else { continue; };
		if ft.is_dir() {
			if recursive { dirs.push(e.path()); }
		}
		else if ft.is_file() {
			let path = e.path();
			if ImageKind::try_from_path(&path).is_some() { files.push(path); }
		}
	}

	files.sort();
	dirs.sort();

	for f in files { if ! sink(f) { return false; } }
	for d in dirs { if ! walk(&d, recursive, sink) { return false; } }

	true
}



/// # Mirror the Root.
///
/// Copy `root` in full to a sibling directory bearing an `_old` suffix —
/// a crude safety net for unattended runs, never read back by anything.
///
/// An existing destination is left alone (with a warning) rather than
/// merged or clobbered. Symlinks are not mirrored.
///
/// ## Errors
///
/// Returns an error if the destination cannot be derived or the copy
/// fails partway.
pub(super) fn mirror(root: &Path) -> Result<Option<PathBuf>, MermaError> {
	let Some(name) = root.file_name() else {
		return Err(MermaError::Backup);
	};
	let mut name = name.to_owned();
	name.push("_old");
	let dst = root.with_file_name(name);

	if dst.exists() {
		Msg::warning(format!(
			"{} already exists; skipping the backup.",
			dst.to_string_lossy(),
		)).eprint();
		return Ok(None);
	}

	if copy_dir(root, &dst).is_err() { Err(MermaError::Backup) }
	else { Ok(Some(dst)) }
}

/// # Copy a Directory Tree.
fn copy_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
	std::fs::create_dir(dst)?;
	for e in std::fs::read_dir(src)? {
		let e = e?;
		let ft = e.file_type()?;
		let to = dst.join(e.file_name());
		if ft.is_dir() { copy_dir(&e.path(), &to)?; }
		else if ft.is_file() { std::fs::copy(e.path(), &to)?; }
	}
	Ok(())
}
