/*!
# Merma: Errors
*/

use argyle::ArgyleError;
use crate::ToolKind;
use fyi_msg::ProglessError;
use std::{
	error::Error,
	fmt,
};



#[derive(Debug, Copy, Clone)]
/// # (Fatal) Error Type.
///
/// These all surface before any image gets touched, except `Killed`, which
/// surfaces after an early CTRL+C shutdown.
pub(super) enum MermaError {
	/// # Argyle Passthrough.
	Argue(ArgyleError),
	/// # Backup Copy Failed.
	Backup,
	/// # Killed Early.
	Killed,
	/// # Missing External Tool(s).
	MissingTools,
	/// # No Images.
	NoImages,
	/// # Progress Passthrough.
	Progress(ProglessError),
	/// # Bad Root Directory.
	RootDirectory,
	/// # Invalid Thread Count.
	Threads,
	/// # Invalid Dissimilarity Threshold.
	Threshold,
}

impl AsRef<str> for MermaError {
	#[inline]
	fn as_ref(&self) -> &str { self.as_str() }
}

impl Error for MermaError {}

impl fmt::Display for MermaError {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<ArgyleError> for MermaError {
	#[inline]
	fn from(err: ArgyleError) -> Self { Self::Argue(err) }
}

impl From<ProglessError> for MermaError {
	#[inline]
	fn from(err: ProglessError) -> Self { Self::Progress(err) }
}

impl MermaError {
	#[must_use]
	/// # As Str.
	pub(super) const fn as_str(self) -> &'static str {
		match self {
			Self::Argue(e) => e.as_str(),
			Self::Backup => "The backup copy could not be created.",
			Self::Killed => "The process was aborted early.",
			Self::MissingTools => "One or more required tools are missing.",
			Self::NoImages => "No images were found.",
			Self::Progress(e) => e.as_str(),
			Self::RootDirectory => "The root must be an existing directory.",
			Self::Threads => "Threads (-n) must be at least one.",
			Self::Threshold => "The threshold (-q) must be greater than zero.",
		}
	}
}



#[derive(Debug, Copy, Clone, Eq, PartialEq)]
/// # (Per-File) Task Error.
///
/// Unlike [`MermaError`], these never kill the run. Inside a probe they
/// downgrade to a rejecting score; during finalization they fail the one
/// file and move on.
pub(super) enum TaskError {
	/// # Filesystem Problem.
	Filesystem,
	/// # Unusable Tool Output.
	Metric,
	/// # Tool Spawn/Exit Failure.
	Tool(ToolKind),
}

impl AsRef<str> for TaskError {
	#[inline]
	fn as_ref(&self) -> &str { self.as_str() }
}

impl Error for TaskError {}

impl fmt::Display for TaskError {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl TaskError {
	#[must_use]
	/// # As Str.
	pub(super) const fn as_str(self) -> &'static str {
		match self {
			Self::Filesystem => "the filesystem misbehaved",
			Self::Metric => "unreadable tool output",
			Self::Tool(ToolKind::Comparator) => "butteraugli failed",
			Self::Tool(ToolKind::Converter) => "convert failed",
			Self::Tool(ToolKind::Decoder) => "dwebp failed",
			Self::Tool(ToolKind::Encoder) => "cwebp failed",
			Self::Tool(ToolKind::Inspector) => "identify failed",
		}
	}
}
