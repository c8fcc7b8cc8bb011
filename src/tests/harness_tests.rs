/// 压力测试框架测试模块
/// 测试角色函数、观察记录与完整的迭代
use crate::harness::{
    ObservationLog, RoleContext, Shared, creator_role, is_refused_read, reader_role,
};
use crate::{
    Error, GuardedAggregate, HarnessConfig, IterationReport, Mismatch, Observation, Probes,
    PublishSlot, ReleaseAcquire, Role, RoleObservation, RunSummary, SequentiallyConsistent,
    Snapshot, StressHarness, TextInfo, Unsynchronized, Violation,
};
use std::thread;
use std::time::Duration;

fn small_config(seed: u64) -> HarnessConfig {
    HarnessConfig::builder()
        .iterations(3)
        .chunks(1..=4)
        .words_per_chunk(5..=30)
        .chars_per_word(2..=5)
        .threads(2..=6)
        .reader_timeout(Duration::from_secs(10))
        .seed(seed)
        .build()
        .unwrap()
}

fn exemplar(chunks: &[&str]) -> TextInfo {
    let mut info = TextInfo::new();
    for chunk in chunks {
        info.add_text_chunk(*chunk);
    }
    info
}

/// 测试1: release/acquire 策略下的运行是干净的
#[test]
fn test_release_acquire_run_is_clean() {
    let mut harness = StressHarness::<ReleaseAcquire>::new(small_config(1));
    let summary = harness.run();

    assert_eq!(summary.policy, "release/acquire");
    assert_eq!(summary.iterations, 3);
    assert!(summary.is_clean(), "{summary}");
    assert_eq!(summary.mismatches, 0);
}

/// 测试2: 顺序一致策略下的运行是干净的
#[test]
fn test_seq_cst_run_is_clean() {
    let mut harness = StressHarness::<SequentiallyConsistent>::new(small_config(2));
    let summary = harness.run();

    assert_eq!(summary.policy, "seq_cst/seq_cst");
    assert!(summary.is_clean(), "{summary}");
}

/// 测试3: 单次迭代的报告
#[test]
fn test_single_iteration_report() {
    let mut harness = StressHarness::<ReleaseAcquire>::new(small_config(3));
    let report = harness.run_iteration(7);

    assert_eq!(report.index, 7);
    assert!((2..=6).contains(&report.threads));
    assert!(report.creator < report.threads);
    assert!((1..=4).contains(&report.chunks));
    assert!(report.is_clean(), "{:?}", report.observations);
}

/// 测试4: 只有创建者时，非同步策略也不会竞争
#[test]
fn test_unsynchronized_creator_only_iteration() {
    let config = HarnessConfig::builder()
        .iterations(2)
        .chunks(1..=2)
        .words_per_chunk(1..=5)
        .threads(1..=1)
        .seed(4)
        .build()
        .unwrap();
    let mut harness = StressHarness::<Unsynchronized>::new(config);

    // SAFETY: a single thread, the creator, touches the aggregate.
    let summary = unsafe { harness.run_unsynchronized() };
    assert_eq!(summary.policy, "relaxed/relaxed");
    assert_eq!(summary.iterations, 2);
    assert!(summary.is_clean(), "{summary}");

    let report = unsafe { harness.run_iteration_unsynchronized(2) };
    assert_eq!(report.threads, 1);
    assert_eq!(report.creator, 0);
}

/// 测试5: 相同种子产生相同的迭代形状
#[test]
fn test_seeded_runs_repeat() {
    let mut first = StressHarness::<ReleaseAcquire>::new(small_config(11));
    let mut second = StressHarness::<ReleaseAcquire>::new(small_config(11));

    for index in 0..2 {
        let a = first.run_iteration(index);
        let b = second.run_iteration(index);
        assert_eq!((a.threads, a.creator, a.chunks), (b.threads, b.creator, b.chunks));
    }
    assert_eq!(first.config(), second.config());
}

/// 测试6: 槽一直为空时读者超时
#[test]
fn test_reader_slot_timeout() {
    let text = exemplar(&["ee"]);
    let probes = Probes::new('z', "ee");
    let expected = Snapshot::of(&text, &probes);
    let slot = PublishSlot::<Shared<ReleaseAcquire>>::new();
    let log = ObservationLog::new(0);
    let ctx = RoleContext {
        exemplar: &text,
        expected: &expected,
        probes: &probes,
        slot: &slot,
        log: &log,
        reader_timeout: Duration::from_millis(20),
        creator_pause: Duration::ZERO,
    };

    assert_eq!(reader_role(&ctx, 1), 0);

    let entries = log.take();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].thread, 1);
    assert_eq!(entries[0].role, Role::Reader);
    assert!(matches!(entries[0].observation, Observation::SlotTimeout { .. }));
}

/// 测试7: 聚合对象从未发布时读者超时并计数重试
#[test]
fn test_reader_publish_timeout() {
    let text = exemplar(&["ee"]);
    let probes = Probes::new('z', "ee");
    let expected = Snapshot::of(&text, &probes);
    let slot = PublishSlot::new();
    slot.publish(Box::new(Shared::<ReleaseAcquire>::new(GuardedAggregate::new())))
        .unwrap();
    let log = ObservationLog::new(0);
    let ctx = RoleContext {
        exemplar: &text,
        expected: &expected,
        probes: &probes,
        slot: &slot,
        log: &log,
        reader_timeout: Duration::from_millis(20),
        creator_pause: Duration::ZERO,
    };

    let retries = thread::scope(|s| s.spawn(|| reader_role(&ctx, 2)).join().unwrap());
    assert!(retries >= 1);

    let entries = log.take();
    assert_eq!(entries.len(), 1);
    match &entries[0].observation {
        Observation::PublishTimeout { retries: logged, .. } => assert_eq!(*logged, retries),
        other => panic!("unexpected observation: {other}"),
    }
}

/// 测试8: 创建者构建并发布，随后的读者没有观察
#[test]
fn test_creator_then_reader() {
    let text = exemplar(&["ee zebra ", "fizz ee ee "]);
    let probes = Probes::new('z', "ee");
    let expected = Snapshot::of(&text, &probes);
    let slot = PublishSlot::new();
    let log = ObservationLog::new(0);
    let ctx = RoleContext {
        exemplar: &text,
        expected: &expected,
        probes: &probes,
        slot: &slot,
        log: &log,
        reader_timeout: Duration::from_secs(10),
        creator_pause: Duration::ZERO,
    };

    assert_eq!(creator_role::<ReleaseAcquire>(&ctx, 0, Shared::new), 0);
    let registry = slot.load().unwrap();
    assert!(registry.is_published());
    assert_eq!(registry.word_occurrence("ee").unwrap(), 3);

    let retries = thread::scope(|s| s.spawn(|| reader_role(&ctx, 1)).join().unwrap());
    assert_eq!(retries, 0);
    assert!(log.take().is_empty());
}

/// 测试9: 槽已被占用时创建者失败
#[test]
fn test_creator_slot_occupied() {
    let text = exemplar(&["one"]);
    let probes = Probes::new('z', "ee");
    let expected = Snapshot::of(&text, &probes);
    let slot = PublishSlot::new();
    slot.publish(Box::new(Shared::<ReleaseAcquire>::new(GuardedAggregate::new())))
        .unwrap();
    let log = ObservationLog::new(0);
    let ctx = RoleContext {
        exemplar: &text,
        expected: &expected,
        probes: &probes,
        slot: &slot,
        log: &log,
        reader_timeout: Duration::from_secs(1),
        creator_pause: Duration::ZERO,
    };

    creator_role(&ctx, 3, Shared::new);

    let entries = log.take();
    assert_eq!(
        entries,
        vec![RoleObservation {
            thread: 3,
            role: Role::Creator,
            observation: Observation::CreatorFailed {
                chunks_added: 0,
                error: Error::SlotOccupied,
            },
        }]
    );
}

/// 测试10: 与样本不同的内容被记录为不匹配
#[test]
fn test_reader_reports_mismatches() {
    let text = exemplar(&["ee ee "]);
    let other = exemplar(&["ee "]);
    let probes = Probes::new('z', "ee");
    let expected = Snapshot::of(&other, &probes);
    let slot = PublishSlot::new();
    let log = ObservationLog::new(0);
    let ctx = RoleContext {
        exemplar: &text,
        expected: &expected,
        probes: &probes,
        slot: &slot,
        log: &log,
        reader_timeout: Duration::from_secs(10),
        creator_pause: Duration::ZERO,
    };

    creator_role::<ReleaseAcquire>(&ctx, 0, Shared::new);

    let entries = log.take();
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| matches!(e.observation, Observation::Mismatch(_))));
    assert!(entries.iter().any(|e| matches!(
        &e.observation,
        Observation::Mismatch(Mismatch { field, .. }) if field == "word_occurrence"
    )));
}

/// 测试11: 汇总按类别计数
#[test]
fn test_run_summary_counts() {
    let mut summary = RunSummary::new("test");
    summary.record(&IterationReport {
        index: 0,
        threads: 4,
        creator: 1,
        chunks: 2,
        retries: 5,
        observations: Vec::new(),
    });
    summary.record(&IterationReport {
        index: 1,
        threads: 4,
        creator: 0,
        chunks: 2,
        retries: 1,
        observations: vec![
            RoleObservation {
                thread: 2,
                role: Role::Reader,
                observation: Observation::Mismatch(Mismatch {
                    field: "text".to_owned(),
                    read: "a".to_owned(),
                    expected: "b".to_owned(),
                }),
            },
            RoleObservation {
                thread: 3,
                role: Role::Reader,
                observation: Observation::Panicked {
                    message: "boom".to_owned(),
                },
            },
        ],
    });

    assert_eq!(summary.iterations, 2);
    assert_eq!(summary.clean_iterations, 1);
    assert_eq!(summary.retries, 6);
    assert_eq!(summary.mismatches, 1);
    assert_eq!(summary.panics, 1);
    assert!(!summary.is_clean());
    assert!(summary.to_string().starts_with("policy test: 1/2 iterations clean"));
}

/// 测试12: 观察的显示文本
#[test]
fn test_observation_display() {
    let mismatch = Observation::Mismatch(Mismatch {
        field: "char_count".to_owned(),
        read: "3".to_owned(),
        expected: "4".to_owned(),
    });
    assert_eq!(mismatch.to_string(), "read 3 of char_count, expected 4");

    let failed = Observation::CreatorFailed {
        chunks_added: 2,
        error: Error::SlotOccupied,
    };
    assert_eq!(
        failed.to_string(),
        "after 2 text chunks added: publish slot already occupied"
    );
    assert_eq!(Role::Creator.to_string(), "creator");
}

/// 测试13: 只有未发布时的读取拒绝会重试，其它违规被记录
#[test]
fn test_only_refused_reads_are_retried() {
    assert!(is_refused_read(&Error::from(Violation::ConcurrentRead)));
    assert!(!is_refused_read(&Error::from(Violation::ConcurrentMutation)));
    assert!(!is_refused_read(&Error::OutOfRange { index: 0, len: 0 }));
    assert!(!is_refused_read(&Error::SlotOccupied));
}
