//! File system watcher for incremental dev rebuilds.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  mpsc   ┌──────────────┐  batch  ┌──────────────────────┐
//! │  notify  │ ──────▶ │  Debouncer   │ ──────▶ │   handle_changes()   │
//! │ (root/)  │         │ (quiet 50ms) │         │  assets ─▶ sync      │
//! └──────────┘         └──────────────┘         │  pages  ─▶ partial   │
//!                                               └──────────────────────┘
//! ```
//!
//! Only modify events count; create, remove and rename are ignored. Events
//! under the output directory are dropped before debouncing, so writes from
//! a rebuild never trigger another one.

use crate::{
    assets::{is_asset_path, sync_assets},
    build::{BuildOptions, build_site},
    config::SiteConfig,
    log,
    page::PageResolver,
};
use anyhow::{Context, Result};
use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind,
};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

/// Idle wait between checks when nothing is pending.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Debounce State
// =============================================================================

/// Collects changed paths until the event stream has been quiet for `window`.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            window,
        }
    }

    fn add(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.pending.extend(paths);
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.window)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        match self.last_event {
            Some(t) if !self.pending.is_empty() => self.window.saturating_sub(t.elapsed()),
            _ => IDLE_TIMEOUT,
        }
    }
}

// =============================================================================
// Event Loop
// =============================================================================

/// Modify events only, excluding renames.
pub const fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_))
        && !matches!(event.kind, EventKind::Modify(ModifyKind::Name(_)))
}

/// Drain `rx`, calling `on_batch` once per quiet period with the changed
/// paths that pass `keep`.
///
/// Returns when the sender side is dropped, after flushing what is pending.
pub fn run_event_loop(
    rx: &Receiver<notify::Result<Event>>,
    window: Duration,
    keep: impl Fn(&Path) -> bool,
    mut on_batch: impl FnMut(Vec<PathBuf>),
) {
    let mut debouncer = Debouncer::new(window);

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => {
                let paths: Vec<_> = event.paths.into_iter().filter(|p| keep(p)).collect();
                if !paths.is_empty() {
                    debouncer.add(paths);
                }
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => on_batch(debouncer.take()),
            Err(RecvTimeoutError::Disconnected) => {
                if !debouncer.pending.is_empty() {
                    on_batch(debouncer.take());
                }
                break;
            }
            // Irrelevant events, or a timeout with nothing ready
            _ => {}
        }
    }
}

// =============================================================================
// Rebuild
// =============================================================================

/// React to one debounced batch of changed paths.
///
/// Asset changes re-sync assets; page changes trigger a partial build of
/// exactly those pages. Failures are logged; the watcher keeps running.
pub fn handle_changes(paths: &[PathBuf], config: &SiteConfig, resolver: &dyn PageResolver) {
    let root = config.get_root();
    let (pages, others): (Vec<_>, Vec<_>) = paths
        .iter()
        .cloned()
        .partition(|path| config.build.is_source_file(path));

    if others.iter().any(|path| is_asset_path(path, config)) {
        let count = sync_assets(config);
        log!("watch"; "assets changed, synced {count} files");
    }

    if pages.is_empty() {
        return;
    }

    let names: Vec<_> = pages
        .iter()
        .map(|p| p.strip_prefix(root).unwrap_or(p).display().to_string())
        .collect();
    log!("watch"; "{} changed, rebuilding", names.join(", "));

    let options = BuildOptions {
        files: &pages,
        generate_sitemap: false,
        dev_mode: true,
    };
    if let Err(err) = build_site(config, resolver, &options) {
        log!("error"; "rebuild failed: {err:#}");
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the project root and rebuild on change, on a background thread.
///
/// The returned watcher must be kept alive; dropping it ends the loop.
pub fn start_watcher(
    config: &'static SiteConfig,
    resolver: &'static dyn PageResolver,
) -> Result<RecommendedWatcher> {
    let root = config.get_root();
    let (tx, rx) = std::sync::mpsc::channel();

    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    thread::Builder::new()
        .name("watch".into())
        .spawn(move || {
            run_event_loop(
                &rx,
                config.serve.debounce(),
                |path| !config.build.is_in_output(path),
                |paths| handle_changes(&paths, config, resolver),
            );
        })
        .context("Failed to spawn watcher thread")?;

    log!("watch"; "watching {}", root.display());
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::FilePageResolver;
    use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};
    use std::{fs, sync::mpsc};
    use tempfile::TempDir;

    const WINDOW: Duration = Duration::from_millis(50);

    fn modify(path: &str) -> notify::Result<Event> {
        Ok(Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path.into()))
    }

    fn collect(rx: &Receiver<notify::Result<Event>>, keep: impl Fn(&Path) -> bool) -> Vec<Vec<PathBuf>> {
        let mut batches = Vec::new();
        run_event_loop(rx, WINDOW, keep, |batch| batches.push(batch));
        batches
    }

    #[test]
    fn test_burst_of_events_yields_one_batch() {
        let (tx, rx) = mpsc::channel();
        let sender = thread::spawn(move || {
            for _ in 0..5 {
                tx.send(modify("/site/a.page")).unwrap();
                thread::sleep(Duration::from_millis(5));
            }
            thread::sleep(WINDOW * 4);
        });

        let batches = collect(&rx, |_| true);
        sender.join().unwrap();
        assert_eq!(batches, vec![vec![PathBuf::from("/site/a.page")]]);
    }

    #[test]
    fn test_spaced_events_yield_separate_batches() {
        let (tx, rx) = mpsc::channel();
        let sender = thread::spawn(move || {
            tx.send(modify("/site/a.page")).unwrap();
            thread::sleep(WINDOW * 4);
            tx.send(modify("/site/a.page")).unwrap();
            thread::sleep(WINDOW * 4);
        });

        let batches = collect(&rx, |_| true);
        sender.join().unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_distinct_files_coalesce() {
        let (tx, rx) = mpsc::channel();
        tx.send(modify("/site/b.page")).unwrap();
        tx.send(modify("/site/a.page")).unwrap();
        tx.send(modify("/site/b.page")).unwrap();
        drop(tx);

        let batches = collect(&rx, |_| true);
        assert_eq!(
            batches,
            vec![vec![PathBuf::from("/site/a.page"), PathBuf::from("/site/b.page")]]
        );
    }

    #[test]
    fn test_non_modify_events_ignored() {
        let (tx, rx) = mpsc::channel();
        for kind in [
            EventKind::Create(CreateKind::File),
            EventKind::Remove(RemoveKind::File),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            EventKind::Access(notify::event::AccessKind::Any),
        ] {
            tx.send(Ok(Event::new(kind).add_path("/site/a.page".into()))).unwrap();
        }
        drop(tx);

        assert!(collect(&rx, |_| true).is_empty());
    }

    #[test]
    fn test_filtered_paths_ignored() {
        let (tx, rx) = mpsc::channel();
        tx.send(modify("/site/_build/a.html")).unwrap();
        drop(tx);

        let batches = collect(&rx, |p| !p.starts_with("/site/_build"));
        assert!(batches.is_empty());
    }

    #[test]
    fn test_is_relevant() {
        let modify = Event::new(EventKind::Modify(ModifyKind::Any));
        let rename = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)));
        let create = Event::new(EventKind::Create(CreateKind::Any));
        assert!(is_relevant(&modify));
        assert!(!is_relevant(&rename));
        assert!(!is_relevant(&create));
    }

    #[test]
    fn test_handle_changes_rebuilds_page_and_syncs_assets() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.resolve_paths(dir.path());
        let root = config.get_root().to_path_buf();

        fs::write(root.join("index.page"), "+++\ntitle = \"Home\"\n+++\n<p>v2</p>").unwrap();
        fs::write(root.join("other.page"), "+++\ntitle = \"Other\"\n+++\n<p>o</p>").unwrap();
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::write(root.join("assets/site.css"), "body{}").unwrap();

        let resolver = FilePageResolver::new(&config);
        handle_changes(
            &[root.join("index.page"), root.join("assets/site.css")],
            &config,
            &resolver,
        );

        let out = &config.build.output;
        let html = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(html.contains("<p>v2</p>"));
        assert!(html.contains("location.reload()"));
        assert!(out.join("assets/site.css").is_file());
        // Partial: untouched pages are not rebuilt
        assert!(!out.join("other.html").exists());
    }
}
