/*!
# Merma Job Server
*/

use crate::{
	Finish,
	MermaError,
	Settings,
	TaskError,
	Tools,
	crawl,
};
use crossbeam_channel::Receiver;
use dactyl::{
	NiceElapsed,
	NiceU64,
	traits::NiceInflection,
};
use fyi_msg::{
	BeforeAfter,
	Msg,
	MsgKind,
	Progless,
};
use std::{
	num::NonZeroUsize,
	path::{
		Path,
		PathBuf,
	},
	sync::{
		Arc,
		atomic::{
			AtomicBool,
			AtomicU64,
			Ordering::{
				Acquire,
				Relaxed,
				SeqCst,
			},
		},
	},
	thread,
};



/// # Progress Counters.
static BEFORE: AtomicU64 = AtomicU64::new(0);
static AFTER: AtomicU64 = AtomicU64::new(0);
static REPLACED: AtomicU64 = AtomicU64::new(0);
static DISCARDED: AtomicU64 = AtomicU64::new(0);
static SKIPPED: AtomicU64 = AtomicU64::new(0);
static FAILED: AtomicU64 = AtomicU64::new(0);



#[inline(never)]
/// # Crunch Everything!
///
/// This walks the tree and processes each discovered image in parallel
/// using up to `threads` threads. Discovery streams straight into the work
/// queue; a full queue simply holds the walk up until a worker comes free.
pub(super) fn exec(settings: &Settings, tools: &Tools)
-> Result<(), MermaError> {
	let threads = settings.threads();

	// Set up the killswitch.
	let killed = Arc::new(AtomicBool::new(false));
	sigint(Arc::clone(&killed), None);

	// Thread business!
	let mut found = 0_usize;
	let (tx, rx) = crossbeam_channel::bounded::<PathBuf>(threads.get());
	thread::scope(#[inline(always)] |s| {
		// Set up the worker threads.
		let mut workers = Vec::with_capacity(threads.get());
		for _ in 0..threads.get() {
			workers.push(s.spawn(#[inline(always)] ||
				while let Ok(p) = rx.recv() {
					let res = crate::image::process(tools, &p, settings);
					record(&res);
					line(&p, &res).eprint();
				}
			));
		}

		// Feed discoveries to the workers, then drop the sender to
		// disconnect.
		crawl::walk(settings.root(), settings.recursive(), &mut |p| {
			found += 1;
			! killed.load(Acquire) && tx.send(p).is_ok()
		});
		drop(tx);

		// Wait for the threads to finish!
		for worker in workers { let _res = worker.join(); }
	});
	drop(rx);

	if found == 0 { return Err(MermaError::NoImages); }
	summary();

	// Early abort?
	if killed.load(Acquire) { Err(MermaError::Killed) }
	else { Ok(()) }
}

#[inline(never)]
/// # Crunch Everything (with Progress)!
///
/// This is the same as `exec`, but includes a progress bar and summary.
/// The walk happens up front here so the bar knows its total.
pub(super) fn exec_pretty(settings: &Settings, tools: &Tools)
-> Result<(), MermaError> {
	#[inline(never)]
	/// # Worker Business.
	///
	/// This is the worker callback; it listens for image paths, processing
	/// them as they come in.
	fn work(
		rx: &Receiver::<&Path>,
		progress: &Progless,
		settings: &Settings,
		tools: &Tools,
	) {
		while let Ok(p) = rx.recv() {
			let name = p.to_string_lossy();
			progress.add(&name);

			let res = crate::image::process(tools, p, settings);
			record(&res);
			if let Err(e) = res { fail_warn(p, e, progress); }

			progress.remove(&name);
		}
	}

	// Round up the images first.
	let mut files = Vec::new();
	crawl::walk(settings.root(), settings.recursive(), &mut |p| {
		files.push(p);
		true
	});
	let total = NonZeroUsize::new(files.len()).ok_or(MermaError::NoImages)?;
	let mut threads = settings.threads();
	if total < threads { threads = total; }

	// Boot up a progress bar.
	let progress = Progless::try_from(total.get())?
		.with_reticulating_splines("Merma");

	// Set up the killswitch.
	let killed = Arc::new(AtomicBool::new(false));
	sigint(Arc::clone(&killed), Some(progress.clone()));

	// Thread business!
	let (tx, rx) = crossbeam_channel::bounded::<&Path>(threads.get());
	thread::scope(#[inline(always)] |s| {
		// Set up the worker threads.
		let mut workers = Vec::with_capacity(threads.get());
		for _ in 0..threads.get() {
			workers.push(s.spawn(#[inline(always)] ||
				work(&rx, &progress, settings, tools)
			));
		}

		// Push all the files to it, then drop the sender to disconnect.
		for file in &files {
			if killed.load(Acquire) || tx.send(file).is_err() { break; }
		}
		drop(tx);

		// Wait for the threads to finish!
		for worker in workers { let _res = worker.join(); }
	});
	drop(rx);

	// Summarize!
	let elapsed = progress.finish();
	let missed = SKIPPED.load(Acquire) + FAILED.load(Acquire);
	if missed == 0 {
		progress.summary(MsgKind::Crunched, "image", "images")
	}
	else {
		// And summarize what we did do.
		Msg::crunched(format!(
			"{}\x1b[2m/\x1b[0m{} in {}.",
			NiceU64::from(total.get() as u64 - missed),
			total.nice_inflect("image", "images"),
			NiceElapsed::from(elapsed),
		))
	}
		.with_bytes_saved(BeforeAfter::from((
			BEFORE.load(Acquire),
			AFTER.load(Acquire),
		)))
		.eprint();

	// Early abort?
	if killed.load(Acquire) { Err(MermaError::Killed) }
	else { Ok(()) }
}



/// # Record One Ending.
///
/// Fold a task's ending into the global tallies. Skips and failures
/// contribute nothing to the byte totals so they can't distort the
/// savings math.
fn record(res: &Result<Finish, TaskError>) {
	match *res {
		Ok(Finish::Replaced { before, after }) => {
			REPLACED.fetch_add(1, Relaxed);
			BEFORE.fetch_add(before, Relaxed);
			AFTER.fetch_add(after, Relaxed);
		},
		Ok(Finish::Unimproved { before }) => {
			DISCARDED.fetch_add(1, Relaxed);
			BEFORE.fetch_add(before, Relaxed);
			AFTER.fetch_add(before, Relaxed);
		},
		Ok(Finish::Skipped) => { SKIPPED.fetch_add(1, Relaxed); },
		Err(_) => { FAILED.fetch_add(1, Relaxed); },
	}
}

/// # Describe One Ending.
fn line(file: &Path, res: &Result<Finish, TaskError>) -> Msg {
	let name = file.to_string_lossy();
	match *res {
		Ok(Finish::Replaced { before, after }) =>
			Msg::custom("Replaced", 10, &name)
				.with_bytes_saved(BeforeAfter::from((before, after))),
		Ok(Finish::Unimproved { .. }) =>
			Msg::custom("Unchanged", 11, &format!(
				"{name} \x1b[2m(couldn't be improved)\x1b[0m"
			)),
		Ok(Finish::Skipped) =>
			Msg::custom("Skipped", 11, &format!(
				"{name} \x1b[2m(leftovers from a previous run)\x1b[0m"
			)),
		Err(e) => Msg::warning(format!(
			"{name} \x1b[2m({})\x1b[0m",
			e.as_str(),
		)),
	}
}

/// # Plain-Mode Summary.
fn summary() {
	let done = REPLACED.load(Acquire) + DISCARDED.load(Acquire);
	Msg::crunched(format!("{}.", done.nice_inflect("image", "images")))
		.with_bytes_saved(BeforeAfter::from((
			BEFORE.load(Acquire),
			AFTER.load(Acquire),
		)))
		.eprint();

	let failed = FAILED.load(Acquire);
	if failed != 0 {
		Msg::warning(format!(
			"{} could not be processed.",
			failed.nice_inflect("image", "images"),
		)).eprint();
	}
}

#[inline(never)]
/// # Hook Up CTRL+C.
///
/// Once stops processing new items, twice forces immediate shutdown.
fn sigint(killed: Arc<AtomicBool>, progress: Option<Progless>) {
	let _res = ctrlc::set_handler(move ||
		if killed.compare_exchange(false, true, SeqCst, Relaxed).is_ok() {
			if let Some(p) = &progress { p.sigint(); }
		}
		else { std::process::exit(1); }
	);
}

#[cold]
#[inline(never)]
/// # Warn About a Failed File.
fn fail_warn(file: &Path, err: TaskError, progress: &Progless) {
	progress.push_msg(Msg::warning(format!(
		"{} \x1b[2m({})\x1b[0m",
		file.to_string_lossy(),
		err.as_str(),
	)), true);
}
