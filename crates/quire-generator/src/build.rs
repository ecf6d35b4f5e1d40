//! Build orchestration.
//!
//! A build moves through fixed phases, each entered at most once:
//!
//! ```text
//! Idle -> Discovering -> Ordering -> Rendering -> Copying -> Done
//!                                                     \-> Failed (from any phase)
//! ```
//!
//! Items are independent of each other: each one reads its own source, gets
//! its own context, and writes its own output path. That is what allows
//! rendering on a worker pool when `render.jobs > 1`.

use std::{
    fs, io,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use quire_core::{Config, ContentItem, FailurePolicy, static_output_dir};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    assets::AssetCopier,
    context::ContextBuilder,
    discover::Discoverer,
    error::{BuildError, ErrorKind, Result},
    order::sort_items,
    output::{clean_dir, write_output},
    template::{CompiledTemplate, TemplateEngine},
};

/// Cooperative cancellation shared between a build and its caller.
///
/// Checked between items; an item already rendering finishes first.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Phase of a build run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildPhase {
    Idle,
    Discovering,
    Ordering,
    Rendering,
    Copying,
    Done,
    Failed,
}

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of source files found.
    pub discovered: usize,

    /// Number of output files written.
    pub pages: usize,

    /// Number of static assets copied.
    pub assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of one build.
#[derive(Debug)]
pub struct BuildReport {
    /// Output paths written, in processing order.
    pub rendered: Vec<PathBuf>,

    /// Failures in processing order. Under fail-stop this holds at most the
    /// failures of items already in flight when the first one happened.
    pub failures: Vec<BuildError>,

    /// Counters.
    pub stats: BuildStats,

    /// Terminal phase, `Done` or `Failed`.
    pub phase: BuildPhase,

    /// Phase in which the first failure happened.
    pub failed_in: Option<BuildPhase>,
}

impl BuildReport {
    /// Whether the build finished without failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// First failure in processing order.
    #[must_use]
    pub fn first_failure(&self) -> Option<&BuildError> {
        self.failures.first()
    }

    /// Convert into a `Result` carrying the first failure.
    pub fn into_result(self) -> Result<BuildStats> {
        match self.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.stats),
        }
    }
}

/// Outcome of compiling every template without writing.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Number of templates compiled.
    pub checked: usize,

    /// Every failure, in processing order.
    pub failures: Vec<BuildError>,
}

/// Mutable bookkeeping for a single run.
struct Run {
    started: Instant,
    phase: BuildPhase,
    report: BuildReport,
}

impl Run {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            phase: BuildPhase::Idle,
            report: BuildReport {
                rendered: Vec::new(),
                failures: Vec::new(),
                stats: BuildStats::default(),
                phase: BuildPhase::Idle,
                failed_in: None,
            },
        }
    }

    fn enter(&mut self, phase: BuildPhase) {
        debug_assert!(phase > self.phase, "phase {phase:?} entered after {:?}", self.phase);
        debug!(from = ?self.phase, to = ?phase, "build phase");
        self.phase = phase;
    }

    fn record(&mut self, err: BuildError) {
        if self.report.failed_in.is_none() {
            self.report.failed_in = Some(self.phase);
        }
        self.report.failures.push(err);
    }

    fn has_failed(&self) -> bool {
        !self.report.failures.is_empty()
    }

    fn finish(mut self) -> BuildReport {
        let terminal = if self.has_failed() {
            BuildPhase::Failed
        } else {
            BuildPhase::Done
        };
        self.enter(terminal);
        self.report.phase = terminal;
        self.report.stats.pages = self.report.rendered.len();
        self.report.stats.duration_ms = millis(self.started.elapsed());
        self.report
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Site builder that runs the render pipeline.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    engine: TemplateEngine,
    cancel: CancelFlag,
    deadline: Option<Duration>,
}

impl Builder {
    /// Create a builder around an explicitly constructed engine.
    #[must_use]
    pub fn new(config: Config, engine: TemplateEngine) -> Self {
        Self {
            config,
            engine,
            cancel: CancelFlag::new(),
            deadline: None,
        }
    }

    /// Create a builder with an engine configured from `config.render`.
    ///
    /// Templates resolve `include` and `extends` against the content root.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let engine = TemplateEngine::new(config.render.undefined)
            .with_autoescape(config.render.autoescape)
            .with_template_root(config.content_dir());
        Self::new(config, engine)
    }

    /// Observe `cancel` between items.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stop between items once `deadline` has elapsed since the build began.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Configuration this builder runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover and order every content item.
    pub fn discover(&self) -> Result<Vec<ContentItem>> {
        let mut items =
            Discoverer::new(self.config.content_dir(), self.config.output_dir()).discover()?;
        sort_items(&mut items, self.config.render.order);
        Ok(items)
    }

    /// Compile every template without rendering or writing anything.
    pub fn check(&self) -> CheckReport {
        let items = match self.discover() {
            Ok(items) => items,
            Err(err) => {
                return CheckReport {
                    checked: 0,
                    failures: vec![err],
                };
            }
        };

        let mut report = CheckReport::default();
        for item in &items {
            report.checked += 1;
            if let Err(err) = self.compile_item(item) {
                report.failures.push(err);
            }
        }

        info!(
            checked = report.checked,
            failures = report.failures.len(),
            "check complete"
        );
        report
    }

    /// Execute the full build once.
    pub fn build(&self) -> BuildReport {
        let mut run = Run::new();

        info!(
            content = %self.config.directory.content,
            output = %self.config.directory.output,
            jobs = self.config.render.jobs,
            "starting build"
        );

        // 1. Discover content
        run.enter(BuildPhase::Discovering);
        let mut items =
            match Discoverer::new(self.config.content_dir(), self.config.output_dir()).discover()
            {
                Ok(items) => items,
                Err(err) => {
                    run.record(err);
                    return run.finish();
                }
            };
        run.report.stats.discovered = items.len();

        // 2. Order
        run.enter(BuildPhase::Ordering);
        sort_items(&mut items, self.config.render.order);

        // 3. Render and write
        run.enter(BuildPhase::Rendering);
        if self.config.render.clean
            && let Err(err) = self.clean_output()
        {
            run.record(err);
            return run.finish();
        }

        let contexts = ContextBuilder::new(&self.config.environment);
        let outcomes = if self.config.render.jobs > 1 {
            self.render_parallel(&items, &contexts, run.started)
        } else {
            self.render_sequential(&items, &contexts, run.started)
        };

        let mut interrupted = false;
        for outcome in outcomes {
            match outcome {
                Ok(path) => run.report.rendered.push(path),
                Err(err) => {
                    interrupted |= err.kind() == ErrorKind::Interrupted;
                    warn!(error = %err, "item failed");
                    run.record(err);
                }
            }
        }

        if interrupted || (run.has_failed() && self.fail_stop()) {
            return run.finish();
        }

        // 4. Copy static assets
        if let Some(static_dir) = self.config.static_dir() {
            run.enter(BuildPhase::Copying);
            let copied = self.check_interrupt(run.started).and_then(|()| {
                let dest = static_output_dir(&self.config.output_dir(), &static_dir);
                AssetCopier::new(&static_dir, dest).copy()
            });
            match copied {
                Ok(count) => run.report.stats.assets = count,
                Err(err) => run.record(err),
            }
        }

        let report = run.finish();
        if report.is_success() {
            info!(
                pages = report.stats.pages,
                assets = report.stats.assets,
                duration_ms = report.stats.duration_ms,
                "build complete"
            );
        }
        report
    }

    fn fail_stop(&self) -> bool {
        self.config.render.failure == FailurePolicy::FailStop
    }

    fn check_interrupt(&self, started: Instant) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            let elapsed = started.elapsed();
            if elapsed >= deadline {
                return Err(BuildError::DeadlineExceeded { elapsed });
            }
        }
        Ok(())
    }

    /// Remove the output root, refusing when it contains the content or
    /// static root.
    fn clean_output(&self) -> Result<()> {
        let output = self.config.output_dir();
        let protected = std::iter::once(self.config.content_dir()).chain(self.config.static_dir());
        for root in protected {
            if root.starts_with(&output) {
                return Err(BuildError::OutputWrite {
                    path: output,
                    source: io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("refusing to clean, it contains {}", root.display()),
                    ),
                });
            }
        }
        clean_dir(&output)
    }

    fn render_sequential(
        &self,
        items: &[ContentItem],
        contexts: &ContextBuilder,
        started: Instant,
    ) -> Vec<Result<PathBuf>> {
        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            if let Err(err) = self.check_interrupt(started) {
                outcomes.push(Err(err));
                break;
            }
            let outcome = self.render_item(item, contexts);
            let failed = outcome.is_err();
            outcomes.push(outcome);
            if failed && self.fail_stop() {
                break;
            }
        }
        outcomes
    }

    fn render_parallel(
        &self,
        items: &[ContentItem],
        contexts: &ContextBuilder,
        started: Instant,
    ) -> Vec<Result<PathBuf>> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.render.jobs)
            .thread_name(|i| format!("quire-render-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(err) => {
                warn!(error = %err, "failed to start render workers, rendering sequentially");
                return self.render_sequential(items, contexts, started);
            }
        };

        // Lowest index that failed under fail-stop. Items after it are skipped,
        // items before it still render.
        let stop_at = AtomicUsize::new(usize::MAX);
        let interrupted = AtomicBool::new(false);
        let outcomes: Vec<Option<Result<PathBuf>>> = pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(index, item)| {
                    if interrupted.load(Ordering::Relaxed) || index > stop_at.load(Ordering::Relaxed)
                    {
                        return None;
                    }
                    if let Err(err) = self.check_interrupt(started) {
                        // Only the first worker to notice reports it.
                        return (!interrupted.swap(true, Ordering::Relaxed)).then_some(Err(err));
                    }
                    let outcome = self.render_item(item, contexts);
                    if outcome.is_err() && self.fail_stop() {
                        stop_at.fetch_min(index, Ordering::Relaxed);
                    }
                    Some(outcome)
                })
                .collect()
        });

        outcomes.into_iter().flatten().collect()
    }

    fn compile_item(&self, item: &ContentItem) -> Result<CompiledTemplate> {
        let source =
            fs::read_to_string(item.source_path()).map_err(|source| BuildError::SourceRead {
                path: item.source_path().to_path_buf(),
                source,
            })?;
        self.engine
            .compile(&item.normalized_path(), source)
            .map_err(|err| BuildError::compile(item.source_path(), err))
    }

    /// Compile, render and write one item.
    fn render_item(&self, item: &ContentItem, contexts: &ContextBuilder) -> Result<PathBuf> {
        info!(path = %item.normalized_path(), "rendering");

        let template = self.compile_item(item)?;
        let context = contexts.build(item);
        let bytes = self
            .engine
            .render(&template, &context)
            .map_err(|err| BuildError::render(item.source_path(), err))?;

        write_output(item.output_path(), &bytes)?;

        debug!(path = %item.output_path().display(), bytes = bytes.len(), "wrote output");
        Ok(item.output_path().to_path_buf())
    }
}
