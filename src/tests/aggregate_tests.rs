/// 聚合对象测试模块
/// 测试 GuardedAggregate 在构建、发布和跨线程读取时的行为
use crate::{
    GuardedAggregate, ReleaseAcquire, SequentiallyConsistent, Probes, Snapshot, TextInfo,
    TextStats, Violation,
};
use std::thread;

/// 测试1: 单个块的统计
#[test]
fn test_single_chunk_statistics() {
    let registry: GuardedAggregate = GuardedAggregate::new();
    registry.add("Hello!").unwrap();
    registry.setup_complete().unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            assert_eq!(registry.char_count().unwrap(), 6);
            assert_eq!(registry.word_occurrence("hello").unwrap(), 1);
        });
    });
    assert_eq!(registry.number_of_chunks().unwrap(), 1);
    assert_eq!(registry.char_count().unwrap(), 6);
    assert_eq!(registry.word_count().unwrap(), 1);
    assert_eq!(registry.word_occurrence("hello").unwrap(), 1);
    assert_eq!(registry.char_occurrence('l').unwrap(), 2);
    assert_eq!(registry.chunk_text(0).unwrap(), "Hello!");
}

/// 测试2: 空聚合对象发布后全部为零
#[test]
fn test_empty_aggregate() {
    let registry: GuardedAggregate = GuardedAggregate::new();
    assert_eq!(registry.number_of_chunks().unwrap(), 0);
    assert!(registry.chunk_text(0).unwrap_err().is_out_of_range());
    registry.setup_complete().unwrap();

    assert_eq!(registry.number_of_chunks().unwrap(), 0);
    assert_eq!(registry.text().unwrap(), "");
    assert_eq!(registry.char_count().unwrap(), 0);
    assert_eq!(registry.word_count().unwrap(), 0);
    assert!(registry.chunk_text(0).unwrap_err().is_out_of_range());
}

/// 测试3: 单词统计不区分大小写
#[test]
fn test_case_insensitive_words() {
    let registry: GuardedAggregate = GuardedAggregate::new();
    registry.add("Hello!").unwrap();
    registry.add("hELLO.").unwrap();
    registry.setup_complete().unwrap();

    assert_eq!(registry.word_occurrence("HeLLo").unwrap(), 2);
    assert_eq!(registry.chunk_word_occurrence(1, "hello").unwrap(), 1);
    assert_eq!(registry.text().unwrap(), "Hello!hELLO.");
    assert_eq!(registry.word_count().unwrap(), 2);
    assert_eq!(registry.char_occurrence('!').unwrap(), 1);
}

/// 测试4: 创建者在发布前可读取部分结果
#[test]
fn test_creator_reads_before_publish() {
    let registry: GuardedAggregate = GuardedAggregate::new();
    registry.add("one two").unwrap();

    assert!(!registry.is_published());
    assert_eq!(registry.word_count().unwrap(), 2);
    assert_eq!(registry.char_count().unwrap(), 7);

    registry.add("three").unwrap();
    assert_eq!(registry.word_count().unwrap(), 3);
}

/// 测试5: 发布后不可再添加
#[test]
fn test_add_after_publish_fails() {
    let registry: GuardedAggregate = GuardedAggregate::new();
    registry.add("one").unwrap();
    registry.setup_complete().unwrap();

    let err = registry.add("two").unwrap_err();
    assert_eq!(err.violation(), Some(Violation::ConcurrentMutation));
    assert_eq!(registry.number_of_chunks().unwrap(), 1);
}

/// 测试6: 第二次 setup_complete 失败且不改变缓存值
#[test]
fn test_second_setup_complete_fails() {
    let registry: GuardedAggregate = GuardedAggregate::new();
    registry.add("a b c").unwrap();
    registry.setup_complete().unwrap();

    let err = registry.setup_complete().unwrap_err();
    assert!(err.is_call_context_violation());
    assert_eq!(registry.word_count().unwrap(), 3);
    assert_eq!(registry.char_count().unwrap(), 5);
}

/// 测试7: 非创建者在发布前的调用全部被拒绝
#[test]
fn test_other_thread_refused_before_publish() {
    let registry: GuardedAggregate = GuardedAggregate::new();
    registry.add("secret").unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            let read = registry.number_of_chunks().unwrap_err();
            assert_eq!(read.violation(), Some(Violation::ConcurrentRead));
            assert!(registry.char_count().is_err());
            assert!(registry.word_count().is_err());
            assert!(registry.text().is_err());
            assert!(registry.chunk_text(0).is_err());

            let add = registry.add("more").unwrap_err();
            assert_eq!(add.violation(), Some(Violation::ConcurrentMutation));
            let setup = registry.setup_complete().unwrap_err();
            assert_eq!(setup.violation(), Some(Violation::ConcurrentMutation));
        });
    });

    // 被拒绝的调用没有任何效果
    assert!(!registry.is_published());
    assert_eq!(registry.number_of_chunks().unwrap(), 1);
    registry.setup_complete().unwrap();
}

/// 测试8: 发布后所有线程读取到相同结果
#[test]
fn test_readers_after_publish_see_everything() {
    let registry: GuardedAggregate<SequentiallyConsistent> = GuardedAggregate::new();
    registry.add("ee zz").unwrap();
    registry.add("EE ee z").unwrap();
    registry.setup_complete().unwrap();

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                assert_eq!(registry.number_of_chunks().unwrap(), 2);
                assert_eq!(registry.word_occurrence("ee").unwrap(), 3);
                assert_eq!(registry.char_occurrence('z').unwrap(), 3);
                assert_eq!(registry.chunk_word_count(1).unwrap(), 3);
                assert!(registry.add("x").is_err());
            });
        }
    });
}

/// 测试9: 缓存的汇总值与逐块统计一致
#[test]
fn test_cached_totals_match_chunks() {
    let registry: GuardedAggregate<ReleaseAcquire> = GuardedAggregate::new();
    for text in ["alpha beta", "gamma", "", "delta epsilon zeta!"] {
        registry.add(text).unwrap();
    }
    registry.setup_complete().unwrap();

    let chunks = registry.number_of_chunks().unwrap();
    let chars: usize = (0..chunks).map(|i| registry.chunk_char_count(i).unwrap()).sum();
    let words: usize = (0..chunks).map(|i| registry.chunk_word_count(i).unwrap()).sum();

    assert_eq!(registry.char_count().unwrap(), chars);
    assert_eq!(registry.word_count().unwrap(), words);
    assert_eq!(words, 6);
}

/// 测试10: 读取到的快照与普通载荷相同
#[test]
fn test_snapshot_matches_plain_payload() {
    let mut exemplar = TextInfo::new();
    exemplar.add_text_chunk("ee bee zebra ");
    exemplar.add_text_chunk("fizz ee ");

    let registry: GuardedAggregate = GuardedAggregate::new();
    for index in 0..exemplar.number_of_chunks() {
        registry.add(exemplar.chunk_text(index).unwrap()).unwrap();
    }
    registry.setup_complete().unwrap();

    let probes = Probes::new('z', "ee");
    let expected = Snapshot::of(&exemplar, &probes);
    thread::scope(|s| {
        s.spawn(|| {
            let read = Snapshot::capture(&registry, &probes).unwrap();
            assert!(read.diff(&expected).is_empty());
            assert_eq!(read, expected);
        });
    });
}

/// 测试11: 通过 TextStats trait 对象访问
#[test]
fn test_aggregate_as_text_stats() {
    let registry: GuardedAggregate = GuardedAggregate::new();
    registry.add("x y").unwrap();
    registry.setup_complete().unwrap();

    let stats: &dyn TextStats = &registry;
    assert_eq!(stats.word_count().unwrap(), 2);
    assert_eq!(stats.text().unwrap(), "x y");
}

/// 测试12: 只有 setup_complete 能发布，发布时缓存的汇总值与载荷一致
#[test]
fn test_publish_only_through_setup_complete() {
    let registry: GuardedAggregate = GuardedAggregate::new();
    registry.add("Hello!").unwrap();
    registry.add("two words").unwrap();

    // 读取不会发布
    assert_eq!(registry.text().unwrap(), "Hello!two words");
    assert!(!registry.is_published());

    registry.setup_complete().unwrap();
    assert!(registry.is_published());

    thread::scope(|s| {
        s.spawn(|| {
            assert_eq!(registry.char_count().unwrap(), 15);
            assert_eq!(registry.word_count().unwrap(), 3);
            assert_eq!(registry.text().unwrap(), "Hello!two words");
        });
    });
}
