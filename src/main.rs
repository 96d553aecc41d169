/*!
# Merma

Merma is a CLI tool for re-encoding whole directories of JPEG, PNG, and WebP
images as lossy WebP, keeping each conversion only when it still looks right
and actually weighs less.

"Looks right" is judged by [Butteraugli](https://github.com/google/butteraugli):
for every image, Merma binary-searches the quality axis for the lowest
setting whose perceptual distance from the original stays under the
configured threshold. If no lossy quality passes — and you've asked for it —
a single lossless attempt gets the same review. Originals are only ever
removed after a smaller, passing replacement has been written beside them.



## Features

 * Recursive (opt-in) directory crunching with a bounded worker pool;
 * Per-image quality search instead of a one-size-fits-all setting;
 * Strict acceptance: visually close enough AND smaller, or no deal;
 * A full backup copy of the target directory before anything is touched
   (skippable with `--no-backup`);
 * Per-file reporting and a final savings summary, with an optional progress
   bar for big runs.



## Installation

This application is written in [Rust](https://www.rust-lang.org/) and can be
installed using [Cargo](https://github.com/rust-lang/cargo).

The heavy lifting is delegated to external programs, which must be present
in the `$PATH` at runtime:

 * `cwebp` and `dwebp` from [libwebp](https://developers.google.com/speed/webp/download);
 * `butteraugli` from [butteraugli](https://github.com/google/butteraugli);
 * `convert` and `identify` from [ImageMagick](https://imagemagick.org/).



## Usage

It's easy. Just run `merma <DIRECTORY> [FLAGS] [OPTIONS]`.

The following flags and options are available:
```bash
-h, --help             Print help information and exit.
-l, --lossless         Try a lossless encode when no lossy quality passes.
-n, --threads <NUM>    Worker threads. [default: 2]
    --no-backup        Skip the <DIRECTORY>_old safety copy.
-p, --progress         Show progress bar while crunching.
-q, --threshold <NUM>  Maximum tolerated Butteraugli distance for a
                       replacement. [default: 1.0]
-r, --recursive        Also crunch images in subdirectories.
    --skip-leftovers   Leave images with stale working artifacts alone.
-V, --version          Print version information and exit.
```
*/

#![forbid(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(clippy::redundant_pub_crate)] // Preference.



mod crawl;
mod error;
mod image;
mod jobs;
mod kind;
mod opts;
mod oracle;
mod paths;
mod search;
mod tools;

use argyle::{
	Argue,
	ArgyleError,
	FLAG_HELP,
	FLAG_REQUIRED,
	FLAG_VERSION,
};
use dowser::Extension;
use error::{
	MermaError,
	TaskError,
};
use fyi_msg::Msg;
use image::Finish;
use kind::ImageKind;
use opts::Settings;
use oracle::OracleResult;
use paths::DerivedPaths;
use search::SearchOutcome;
use tools::{
	Gateway,
	ToolKind,
	Tools,
};



/// # Extension: JPEG.
const E_JPEG: Extension = Extension::new4(*b"jpeg");

/// # Extension: JPG.
const E_JPG: Extension = Extension::new3(*b"jpg");

/// # Extension: PNG.
const E_PNG: Extension = Extension::new3(*b"png");

/// # Extension: WebP.
const E_WEBP: Extension = Extension::new4(*b"webp");



/// # Main.
fn main() {
	match _main() {
		Ok(()) => {},
		Err(MermaError::Argue(ArgyleError::WantsVersion)) => {
			println!(concat!("Merma v", env!("CARGO_PKG_VERSION")));
		},
		Err(MermaError::Argue(ArgyleError::WantsHelp)) => { helper(); },
		Err(e) => { Msg::error(e.as_str()).die(1); },
	}
}

#[inline]
/// # Actual Main.
fn _main() -> Result<(), MermaError> {
	// Parse CLI arguments.
	let args = Argue::new(FLAG_HELP | FLAG_REQUIRED | FLAG_VERSION)?;

	// The one required argument: where to point the thing.
	let root = args.args_os().next().ok_or(MermaError::RootDirectory)?;
	let mut settings = Settings::new(root)?;

	if let Some(raw) = args.option2(b"-n", b"--threads") {
		settings.set_threads_raw(raw)?;
	}
	if let Some(raw) = args.option2(b"-q", b"--threshold") {
		settings.set_threshold_raw(raw)?;
	}
	if args.switch2(b"-r", b"--recursive") { settings.set_recursive(); }
	if args.switch2(b"-l", b"--lossless") { settings.set_lossless(); }
	if args.switch(b"--no-backup") { settings.set_no_backup(); }
	if args.switch(b"--skip-leftovers") { settings.set_skip_leftovers(); }

	// Everything downstream leans on external helpers; make sure they're
	// all reachable before touching a single file.
	let tools = Tools::find()?;

	// Mirror the tree before messing with it.
	if settings.backup() {
		let _res = crawl::mirror(settings.root())?;
	}

	// Crunch!
	if args.switch2(b"-p", b"--progress") {
		jobs::exec_pretty(&settings, &tools)
	}
	else { jobs::exec(&settings, &tools) }
}

#[cold]
/// # Print Help.
fn helper() {
	println!(concat!(
		r"
         .
        ':'
      ___:____     |`\/'|
    ,'        `.    \  /
    |  O        \___/  |   ", "\x1b[38;5;45mMerma\x1b[0;38;5;199m v", env!("CARGO_PKG_VERSION"), "\x1b[0m", r"
  ~^~^~^~^~^~^~^~^~^~^~^~  Shrink whole directories of images
                           into just-good-enough WebP.

USAGE:
    merma <DIRECTORY> [FLAGS] [OPTIONS]

FLAGS:
    -h, --help        Print help information and exit.
    -l, --lossless    Try a lossless encode when no lossy quality passes.
        --no-backup   Skip the <DIRECTORY>_old safety copy.
    -p, --progress    Show progress bar while crunching.
    -r, --recursive   Also crunch images in subdirectories.
        --skip-leftovers
                      Leave images with stale working artifacts (from an
                      interrupted previous run) alone.
    -V, --version     Print version information and exit.

OPTIONS:
    -n, --threads <NUM>     Worker threads. [default: 2]
    -q, --threshold <NUM>   Maximum tolerated Butteraugli distance for a
                            replacement; must be greater than zero.
                            [default: 1.0]

ARGS:
    <DIRECTORY>    Directory of JPEG/PNG/WebP images to convert.

---

Note: the following programs must be installed and in the PATH:

    butteraugli; convert (ImageMagick); cwebp; dwebp; identify (ImageMagick)
"
	));
}
