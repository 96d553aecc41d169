/*!
# Merma: External Tools
*/

use crate::{
	MermaError,
	TaskError,
};
use dactyl::traits::BytesToUnsigned;
use fyi_msg::Msg;
use std::{
	ffi::OsStr,
	os::unix::fs::PermissionsExt,
	path::{
		Path,
		PathBuf,
	},
	process::{
		Command,
		Stdio,
	},
};



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Tool Kind.
///
/// Of course, every binary is different, but as far as the pipeline is
/// concerned they all work the same way: arguments in, exit status and
/// (maybe) a first line of stdout back out.
pub(super) enum ToolKind {
	/// # Butteraugli (Perceptual Scoring).
	Comparator,
	/// # ImageMagick Convert (Alpha Normalization and Resizing).
	Converter,
	/// # `dwebp` (WebP to PNG).
	Decoder,
	/// # `cwebp` (Anything to WebP).
	Encoder,
	/// # ImageMagick Identify (Dimensions).
	Inspector,
}

impl ToolKind {
	/// # All Kinds.
	pub(super) const ALL: [Self; 5] = [
		Self::Comparator,
		Self::Converter,
		Self::Decoder,
		Self::Encoder,
		Self::Inspector,
	];

	#[must_use]
	/// # Binary Name.
	pub(super) const fn bin(self) -> &'static str {
		match self {
			Self::Comparator => "butteraugli",
			Self::Converter => "convert",
			Self::Decoder => "dwebp",
			Self::Encoder => "cwebp",
			Self::Inspector => "identify",
		}
	}
}



/// # Subprocess Gateway.
///
/// The one seam between the pipeline and the outside world. The production
/// implementation is [`Tools`]; tests swap in scripted fakes.
pub(super) trait Gateway {
	/// # Run a Tool to Completion.
	///
	/// Returns the first (trimmed) line of stdout, if any, on clean exit.
	///
	/// ## Errors
	///
	/// A spawn failure or non-zero exit returns the tool's
	/// [`TaskError::Tool`].
	fn run(&self, kind: ToolKind, args: &[&OsStr])
	-> Result<Option<String>, TaskError>;
}



#[derive(Debug, Clone)]
/// # Resolved Tool Paths.
///
/// Each binary is located once, up front, so a half-configured machine fails
/// before any image gets touched rather than mid-run.
pub(super) struct Tools {
	/// # Butteraugli.
	comparator: PathBuf,
	/// # Convert.
	converter: PathBuf,
	/// # Dwebp.
	decoder: PathBuf,
	/// # Cwebp.
	encoder: PathBuf,
	/// # Identify.
	inspector: PathBuf,
}

impl Tools {
	/// # Find the Tools.
	///
	/// Walk `$PATH` looking for each required binary, complaining about each
	/// one that can't be found.
	///
	/// ## Errors
	///
	/// An error is returned if anything is missing.
	pub(super) fn find() -> Result<Self, MermaError> {
		let mut found: [Option<PathBuf>; 5] = [None, None, None, None, None];
		for (idx, kind) in ToolKind::ALL.iter().enumerate() {
			found[idx] = find_bin(kind.bin());
			if found[idx].is_none() {
				Msg::error(format!("Missing required tool: {}.", kind.bin()))
					.eprint();
			}
		}

		match found {
			[Some(comparator), Some(converter), Some(decoder), Some(encoder), Some(inspector)] =>
				Ok(Self { comparator, converter, decoder, encoder, inspector }),
			_ => Err(MermaError::MissingTools),
		}
	}

	#[must_use]
	/// # Path For.
	fn path_for(&self, kind: ToolKind) -> &Path {
		match kind {
			ToolKind::Comparator => &self.comparator,
			ToolKind::Converter => &self.converter,
			ToolKind::Decoder => &self.decoder,
			ToolKind::Encoder => &self.encoder,
			ToolKind::Inspector => &self.inspector,
		}
	}
}

impl Gateway for Tools {
	fn run(&self, kind: ToolKind, args: &[&OsStr])
	-> Result<Option<String>, TaskError> {
		let out = Command::new(self.path_for(kind))
			.args(args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::null())
			.output()
			.map_err(|_| TaskError::Tool(kind))?;

		if out.status.success() { Ok(first_line(&out.stdout)) }
		else { Err(TaskError::Tool(kind)) }
	}
}



/// # Parse a Dissimilarity Score.
///
/// The comparator's first stdout line, as a non-negative float. Anything
/// else and the metric is unusable.
///
/// ## Errors
///
/// Returns [`TaskError::Metric`] if the line is missing or unparsable.
pub(super) fn parse_score(line: Option<&str>) -> Result<f64, TaskError> {
	line.and_then(|l| l.trim().parse::<f64>().ok())
		.filter(|s| ! s.is_nan() && 0.0 <= *s)
		.ok_or(TaskError::Metric)
}

/// # Parse Image Dimensions.
///
/// The inspector prints `%w %h`; both have to be positive integers.
///
/// ## Errors
///
/// Returns [`TaskError::Metric`] if the line is missing or unparsable.
pub(super) fn parse_dimensions(line: Option<&str>)
-> Result<(u32, u32), TaskError> {
	let line = line.ok_or(TaskError::Metric)?;
	let mut split = line.split_ascii_whitespace();
	let width = split.next().and_then(|n| u32::btou(n.as_bytes()));
	let height = split.next().and_then(|n| u32::btou(n.as_bytes()));

	match (width, height, split.next()) {
		(Some(w), Some(h), None) if w != 0 && h != 0 => Ok((w, h)),
		_ => Err(TaskError::Metric),
	}
}



/// # First Line of Output.
fn first_line(raw: &[u8]) -> Option<String> {
	let line = raw.split(|b| *b == b'\n').next()?;
	let line = String::from_utf8_lossy(line).trim().to_owned();
	if line.is_empty() { None }
	else { Some(line) }
}

/// # Find a Binary on $PATH.
fn find_bin(name: &str) -> Option<PathBuf> {
	let path = std::env::var_os("PATH")?;
	std::env::split_paths(&path)
		.map(|p| p.join(name))
		.find(|p| is_executable(p))
}

/// # Executable File?
fn is_executable(path: &Path) -> bool {
	path.metadata().map_or(
		false,
		|m| m.is_file() && 0 != (m.permissions().mode() & 0o111)
	)
}



#[cfg(test)]
pub(super) mod testing {
	//! # Scripted Tools for Tests.

	use super::*;
	use std::cell::RefCell;

	/// # Scripted Gateway.
	///
	/// Every call is answered by the supplied script and logged so tests
	/// can assert which tools ran, in what order, with what arguments.
	pub(crate) struct FakeGateway<'a> {
		/// # The Script.
		script: Box<dyn Fn(ToolKind, &[&OsStr]) -> Result<Option<String>, TaskError> + 'a>,

		/// # Call Log.
		log: RefCell<Vec<(ToolKind, Vec<String>)>>,
	}

	impl<'a> FakeGateway<'a> {
		/// # New Instance.
		pub(crate) fn new<F>(script: F) -> Self
		where F: Fn(ToolKind, &[&OsStr]) -> Result<Option<String>, TaskError> + 'a {
			Self { script: Box::new(script), log: RefCell::new(Vec::new()) }
		}

		/// # Tools Called, in Order.
		pub(crate) fn kinds(&self) -> Vec<ToolKind> {
			self.log.borrow().iter().map(|(k, _)| *k).collect()
		}

		/// # Argument Spotted?
		///
		/// `true` if any logged call to `kind` carried `arg` verbatim.
		pub(crate) fn saw_arg(&self, kind: ToolKind, arg: &str) -> bool {
			self.log.borrow().iter().any(|(k, args)|
				*k == kind && args.iter().any(|a| a == arg)
			)
		}

		/// # Honor an `-o` Request.
		///
		/// Scripts standing in for the encoder or decoder call this to
		/// drop `len` bytes wherever the arguments said output should go.
		pub(crate) fn write_output(args: &[&OsStr], len: usize) {
			let target = args.iter()
				.position(|a| *a == OsStr::new("-o"))
				.and_then(|pos| args.get(pos + 1))
				.expect("Missing output argument.");
			std::fs::write(target, vec![b'0'; len])
				.expect("Unable to write fake output.");
		}
	}

	impl Gateway for FakeGateway<'_> {
		fn run(&self, kind: ToolKind, args: &[&OsStr])
		-> Result<Option<String>, TaskError> {
			self.log.borrow_mut().push((
				kind,
				args.iter()
					.map(|a| a.to_string_lossy().into_owned())
					.collect(),
			));
			(self.script)(kind, args)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_bins() {
		for kind in ToolKind::ALL {
			assert!(! kind.bin().is_empty());
		}
	}

	#[test]
	fn t_parse_score() {
		let raw: &[(Option<&str>, Option<f64>)] = &[
			(Some("2.3381"), Some(2.338_1)),
			(Some("0"), Some(0.0)),
			(Some("  1.5  "), Some(1.5)),
			(Some("inf"), Some(f64::INFINITY)),
			(Some("-0.1"), None),
			(Some("NaN"), None),
			(Some("1.5 garbage"), None),
			(Some("garbage"), None),
			(Some(""), None),
			(None, None),
		];

		for (line, expected) in raw {
			match expected {
				Some(s) => {
					let parsed = parse_score(*line)
						.expect("Score should parse.");
					assert!(
						if s.is_infinite() { parsed.is_infinite() }
						else { (parsed - s).abs() < f64::EPSILON },
						"Wrong score for {line:?}.",
					);
				},
				None => assert_eq!(
					parse_score(*line),
					Err(TaskError::Metric),
					"Score {line:?} should not parse.",
				),
			}
		}
	}

	#[test]
	fn t_parse_dimensions() {
		let raw: &[(Option<&str>, Option<(u32, u32)>)] = &[
			(Some("512 512"), Some((512, 512))),
			(Some("16 64"), Some((16, 64))),
			(Some("  800   600  "), Some((800, 600))),
			(Some("0 600"), None),
			(Some("800 0"), None),
			(Some("800"), None),
			(Some("800 600 32"), None),
			(Some("eight hundred"), None),
			(Some(""), None),
			(None, None),
		];

		for (line, expected) in raw {
			assert_eq!(
				parse_dimensions(*line).ok(),
				*expected,
				"Wrong dimensions for {line:?}.",
			);
		}
	}
}
