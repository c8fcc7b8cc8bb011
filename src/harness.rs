//! Concurrency stress harness for the publish idiom.
//!
//! Every iteration generates a random exemplar payload, spawns a random number of OS
//! threads, picks one of them at random as the creator and lets all others read. The
//! creator builds a `GuardedAggregate` from the exemplar and publishes it; readers poll
//! for it, retry while it is unpublished, and compare everything they read with the
//! exemplar. Anything unexpected is recorded as an `Observation`, never a failure of the
//! harness itself.
//!
//! 发布模式的并发压力测试框架。
//!
//! 每次迭代生成一个随机样本载荷，启动随机数量的操作系统线程，随机选择其中一个作为创建者，其余线程读取。
//! 创建者根据样本构建 `GuardedAggregate` 并发布；读者轮询等待它出现，在未发布时重试，
//! 并将读取到的所有内容与样本比较。任何意外情况都被记录为 `Observation`，而不会导致框架本身失败。

use crate::aggregate::GuardedAggregate;
use crate::config::HarnessConfig;
use crate::error::{Error, Result, Violation};
use crate::flag::{PublishPolicy, ReleaseAcquire, Synchronizing};
use crate::random::TextMaker;
use crate::slot::PublishSlot;
use crate::snapshot::{Mismatch, Probes, Snapshot};
use crate::sync::Mutex;
use crate::text::TextInfo;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The part a harness thread plays in an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Creator,
    Reader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Creator => "creator",
            Role::Reader => "reader",
        })
    }
}

/// Something a role saw that a correct run would not produce.
///
/// 一个角色观察到的、正确运行时不应出现的情况。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// A statistic read from the aggregate differed from the exemplar.
    Mismatch(Mismatch),
    /// The aggregate never appeared in the slot.
    SlotTimeout { waited: Duration },
    /// The aggregate appeared but was not published in time.
    PublishTimeout { waited: Duration, retries: usize },
    /// The creator hit an error after adding `chunks_added` chunks.
    CreatorFailed { chunks_added: usize, error: Error },
    /// A reader hit an error other than a call context violation.
    ReaderFailed { error: Error },
    /// The role's thread panicked.
    Panicked { message: String },
    /// The role's thread could not be started.
    SpawnFailed { message: String },
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Mismatch(mismatch) => write!(f, "{mismatch}"),
            Observation::SlotTimeout { waited } => {
                write!(f, "pointer to data was not set within {waited:?}")
            }
            Observation::PublishTimeout { waited, retries } => write!(
                f,
                "data was not published within {waited:?} ({retries} reads refused)"
            ),
            Observation::CreatorFailed {
                chunks_added,
                error,
            } => write!(f, "after {chunks_added} text chunks added: {error}"),
            Observation::ReaderFailed { error } => write!(f, "read failed: {error}"),
            Observation::Panicked { message } => write!(f, "thread panicked: {message}"),
            Observation::SpawnFailed { message } => {
                write!(f, "thread could not be spawned: {message}")
            }
        }
    }
}

/// An observation together with the thread that made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleObservation {
    pub thread: usize,
    pub role: Role,
    pub observation: Observation,
}

/// Outcome of one harness iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationReport {
    pub index: usize,
    pub threads: usize,
    pub creator: usize,
    pub chunks: usize,
    /// Reads refused with a call context violation and retried.
    pub retries: usize,
    pub observations: Vec<RoleObservation>,
}

impl IterationReport {
    /// Whether nothing unexpected was observed.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Totals over a whole run.
///
/// 整个运行过程的汇总。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub policy: String,
    pub iterations: usize,
    pub clean_iterations: usize,
    pub retries: usize,
    pub mismatches: usize,
    pub slot_timeouts: usize,
    pub publish_timeouts: usize,
    pub creator_failures: usize,
    pub reader_failures: usize,
    pub panics: usize,
    pub spawn_failures: usize,
}

impl RunSummary {
    pub fn new(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            ..Self::default()
        }
    }

    /// Fold one iteration into the totals.
    pub fn record(&mut self, report: &IterationReport) {
        self.iterations += 1;
        self.retries += report.retries;
        if report.is_clean() {
            self.clean_iterations += 1;
        }
        for entry in &report.observations {
            let counter = match entry.observation {
                Observation::Mismatch(_) => &mut self.mismatches,
                Observation::SlotTimeout { .. } => &mut self.slot_timeouts,
                Observation::PublishTimeout { .. } => &mut self.publish_timeouts,
                Observation::CreatorFailed { .. } => &mut self.creator_failures,
                Observation::ReaderFailed { .. } => &mut self.reader_failures,
                Observation::Panicked { .. } => &mut self.panics,
                Observation::SpawnFailed { .. } => &mut self.spawn_failures,
            };
            *counter += 1;
        }
    }

    /// Whether every iteration was clean.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.clean_iterations == self.iterations
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "policy {}: {}/{} iterations clean, {} refused reads retried, {} mismatches, \
             {} slot timeouts, {} publish timeouts, {} creator failures, {} reader failures, \
             {} panics, {} spawn failures",
            self.policy,
            self.clean_iterations,
            self.iterations,
            self.retries,
            self.mismatches,
            self.slot_timeouts,
            self.publish_timeouts,
            self.creator_failures,
            self.reader_failures,
            self.panics,
            self.spawn_failures,
        )
    }
}

/// Observations of one iteration, shared by all of its threads.
pub(crate) struct ObservationLog {
    iteration: usize,
    entries: Mutex<Vec<RoleObservation>>,
}

impl ObservationLog {
    pub(crate) fn new(iteration: usize) -> Self {
        Self {
            iteration,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn record(&self, thread: usize, role: Role, observation: Observation) {
        warn!(
            iteration = self.iteration,
            thread,
            role = %role,
            "{observation}"
        );
        self.entries.lock().push(RoleObservation {
            thread,
            role,
            observation,
        });
    }

    pub(crate) fn take(&self) -> Vec<RoleObservation> {
        std::mem::take(&mut *self.entries.lock())
    }
}

/// The aggregate as stored in the shared slot.
///
/// `GuardedAggregate<P>` is `Sync` only for `Synchronizing` policies. `Shared` lets the
/// harness place aggregates of any policy in the slot: `new` is safe where the aggregate
/// is already `Sync`, `assume_shared` is the opt-in for racy policies.
pub(crate) struct Shared<P: PublishPolicy>(GuardedAggregate<P>);

// SAFETY: constructed either from a `Synchronizing` aggregate, which is `Sync` itself, or
// through `assume_shared`, whose caller accepts the data race.
unsafe impl<P: PublishPolicy> Sync for Shared<P> {}

impl<P: Synchronizing> Shared<P> {
    pub(crate) fn new(aggregate: GuardedAggregate<P>) -> Self {
        Self(aggregate)
    }
}

impl<P: PublishPolicy> Shared<P> {
    /// # Safety
    /// Readers on other threads may read the aggregate's payload without a
    /// happens-before relation to the creator's writes. The caller accepts that race.
    pub(crate) unsafe fn assume_shared(aggregate: GuardedAggregate<P>) -> Self {
        Self(aggregate)
    }
}

impl<P: PublishPolicy> Deref for Shared<P> {
    type Target = GuardedAggregate<P>;

    fn deref(&self) -> &GuardedAggregate<P> {
        &self.0
    }
}

/// Wraps a freshly created aggregate for the slot.
pub(crate) type ShareFn<P> = fn(GuardedAggregate<P>) -> Shared<P>;

/// What every role of an iteration borrows.
pub(crate) struct RoleContext<'a, P: PublishPolicy> {
    pub(crate) exemplar: &'a TextInfo,
    pub(crate) expected: &'a Snapshot,
    pub(crate) probes: &'a Probes,
    pub(crate) slot: &'a PublishSlot<Shared<P>>,
    pub(crate) log: &'a ObservationLog,
    pub(crate) reader_timeout: Duration,
    pub(crate) creator_pause: Duration,
}

impl<P: PublishPolicy> RoleContext<'_, P> {
    /// Read everything from `registry` and record each field that differs from the
    /// exemplar.
    fn read_and_compare(&self, thread_index: usize, role: Role, registry: &GuardedAggregate<P>) -> Result<()> {
        let snapshot = Snapshot::capture(registry, self.probes)?;
        for mismatch in snapshot.diff(self.expected) {
            self.log.record(thread_index, role, Observation::Mismatch(mismatch));
        }
        Ok(())
    }

    fn create(&self, thread_index: usize, share: ShareFn<P>, added: &mut usize) -> Result<()> {
        let registry = self.slot.publish(Box::new(share(GuardedAggregate::new())))?;
        if !self.creator_pause.is_zero() {
            thread::sleep(self.creator_pause);
        }
        for index in 0..self.exemplar.number_of_chunks() {
            registry.add(self.exemplar.chunk_text(index)?)?;
            *added += 1;
        }
        registry.setup_complete()?;
        // The creator must see its own writes.
        self.read_and_compare(thread_index, Role::Creator, registry)
    }
}

/// Creator role: build, publish, then verify. Returns the number of retried reads (0).
pub(crate) fn creator_role<P: PublishPolicy>(
    ctx: &RoleContext<'_, P>,
    thread_index: usize,
    share: ShareFn<P>,
) -> usize {
    let mut added = 0;
    if let Err(error) = ctx.create(thread_index, share, &mut added) {
        ctx.log.record(
            thread_index,
            Role::Creator,
            Observation::CreatorFailed {
                chunks_added: added,
                error,
            },
        );
    }
    0
}

/// Reader role: wait for the aggregate, then read until published. Returns the number of
/// reads refused with a call context violation.
pub(crate) fn reader_role<P: PublishPolicy>(ctx: &RoleContext<'_, P>, thread_index: usize) -> usize {
    let started = Instant::now();

    let registry = loop {
        if let Some(registry) = ctx.slot.load() {
            break registry;
        }
        if started.elapsed() > ctx.reader_timeout {
            ctx.log.record(
                thread_index,
                Role::Reader,
                Observation::SlotTimeout {
                    waited: started.elapsed(),
                },
            );
            return 0;
        }
        thread::yield_now();
    };

    let mut retries = 0;
    loop {
        match ctx.read_and_compare(thread_index, Role::Reader, registry) {
            Ok(()) => return retries,
            Err(error) if is_refused_read(&error) => {
                retries += 1;
                if started.elapsed() > ctx.reader_timeout {
                    ctx.log.record(
                        thread_index,
                        Role::Reader,
                        Observation::PublishTimeout {
                            waited: started.elapsed(),
                            retries,
                        },
                    );
                    return retries;
                }
                thread::yield_now();
            }
            Err(error) => {
                ctx.log
                    .record(thread_index, Role::Reader, Observation::ReaderFailed { error });
                return retries;
            }
        }
    }
}

/// A read refused because the aggregate is not published yet. Only this is retried.
#[inline]
pub(crate) fn is_refused_read(error: &Error) -> bool {
    error.violation() == Some(Violation::ConcurrentRead)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic of unknown type".to_owned()
    }
}

/// Stress harness for `GuardedAggregate<P>`.
///
/// **Typical Usage**:
/// ```no_run
/// use sies::{HarnessConfig, ReleaseAcquire, StressHarness};
///
/// let config = HarnessConfig::builder().iterations(10).build().unwrap();
/// let summary = StressHarness::<ReleaseAcquire>::new(config).run();
/// assert!(summary.is_clean());
/// ```
///
/// `GuardedAggregate<P>` 的压力测试框架。
pub struct StressHarness<P: PublishPolicy = ReleaseAcquire> {
    config: HarnessConfig,
    maker: TextMaker,
    rng: StdRng,
    _policy: PhantomData<fn() -> P>,
}

impl<P: PublishPolicy> StressHarness<P> {
    /// Create a harness. The random generator is seeded from the configuration's seed if
    /// set, otherwise from entropy.
    pub fn new(config: HarnessConfig) -> Self {
        let maker = TextMaker::new(
            config.chunks(),
            config.words_per_chunk(),
            config.chars_per_word(),
        );
        let rng = match config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            maker,
            rng,
            _policy: PhantomData,
        }
    }

    #[inline]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run one iteration: draw the exemplar and the thread layout, spawn and join.
    fn iterate(&mut self, index: usize, share: ShareFn<P>) -> IterationReport {
        let exemplar = self.maker.make(&mut self.rng);
        let threads = self.rng.gen_range(self.config.threads());
        let creator = self.rng.gen_range(0..threads);
        let chunks = exemplar.number_of_chunks();
        debug!(iteration = index, threads, creator, chunks, "starting iteration");

        let probes = Probes::new(self.config.probe_char(), self.config.probe_word());
        let expected = Snapshot::of(&exemplar, &probes);
        let slot = PublishSlot::new();
        let log = ObservationLog::new(index);
        let ctx = RoleContext {
            exemplar: &exemplar,
            expected: &expected,
            probes: &probes,
            slot: &slot,
            log: &log,
            reader_timeout: self.config.reader_timeout(),
            creator_pause: self.config.creator_pause(),
        };

        let mut retries = 0;
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(threads);
            for thread_index in 0..threads {
                let role = if thread_index == creator {
                    Role::Creator
                } else {
                    Role::Reader
                };
                let ctx = &ctx;
                let spawned = thread::Builder::new()
                    .name(format!("{role}-{thread_index}"))
                    .spawn_scoped(scope, move || match role {
                        Role::Creator => creator_role(ctx, thread_index, share),
                        Role::Reader => reader_role(ctx, thread_index),
                    });
                match spawned {
                    Ok(handle) => handles.push((thread_index, role, handle)),
                    Err(err) => log.record(
                        thread_index,
                        role,
                        Observation::SpawnFailed {
                            message: err.to_string(),
                        },
                    ),
                }
            }

            for (thread_index, role, handle) in handles {
                match handle.join() {
                    Ok(refused) => retries += refused,
                    Err(payload) => log.record(
                        thread_index,
                        role,
                        Observation::Panicked {
                            message: panic_message(&*payload),
                        },
                    ),
                }
            }
        });

        IterationReport {
            index,
            threads,
            creator,
            chunks,
            retries,
            observations: log.take(),
        }
    }

    fn run_with(&mut self, share: ShareFn<P>) -> RunSummary {
        info!(
            policy = %P::name(),
            iterations = self.config.iterations(),
            "starting stress run"
        );
        let mut summary = RunSummary::new(P::name());
        for index in 0..self.config.iterations() {
            let report = self.iterate(index, share);
            summary.record(&report);
        }
        info!("{summary}");
        summary
    }

    /// Run all iterations with a policy that may not synchronize.
    ///
    /// # Safety
    /// With a policy that is not `Synchronizing`, reader threads may read the aggregate's
    /// payload concurrently with, or without visibility of, the creator's writes: a data
    /// race. This entry point exists to observe that race; its results are informational.
    ///
    /// 使用可能不同步的策略运行全部迭代。读者线程可能在没有可见性保证的情况下读取载荷，即数据竞争。
    pub unsafe fn run_unsynchronized(&mut self) -> RunSummary {
        self.run_with(|aggregate| unsafe { Shared::assume_shared(aggregate) })
    }

    /// Run one iteration with a policy that may not synchronize.
    ///
    /// # Safety
    /// See [`StressHarness::run_unsynchronized`].
    pub unsafe fn run_iteration_unsynchronized(&mut self, index: usize) -> IterationReport {
        self.iterate(index, |aggregate| unsafe { Shared::assume_shared(aggregate) })
    }
}

impl<P: Synchronizing> StressHarness<P> {
    /// Run all configured iterations.
    pub fn run(&mut self) -> RunSummary {
        self.run_with(Shared::new)
    }

    /// Run a single iteration.
    pub fn run_iteration(&mut self, index: usize) -> IterationReport {
        self.iterate(index, Shared::new)
    }
}
