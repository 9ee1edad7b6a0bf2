//! Integration tests for a full measurement run.
//!
//! These tests drive `execute` end to end: file on disk -> read -> encode
//! under measurement -> report -> sink (or fallback), and check the record
//! against values worked out by hand.

use bitpack_bench_core::{
    execute,
    sampler::FixedSampler,
    sink::{FailingSink, ReportFormat},
    ConsoleSink, Error, FileSource, ProcessSampler, RunConfig, RunMode,
};

/// Read a real file, display the text report.
#[test]
fn test_file_to_console() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("texto.txt"), "aabbbcc").unwrap();

    let source = FileSource::with_base_dir(dir.path());
    let mut sink = ConsoleSink::new(Vec::new(), ReportFormat::Text);

    let outcome = execute(
        &RunConfig::default(),
        "texto.txt",
        &source,
        &FixedSampler::default(),
        &mut sink,
        &mut std::io::sink(),
    )
    .expect("run failed");

    let record = &outcome.report.record;
    assert_eq!(record.original_size, 7);
    assert_eq!(record.final_size, 2);
    assert_eq!(record.bits_per_char, 2);
    assert_eq!(record.padding_bits, 2);
    assert_eq!(record.distinct_chars, 3);

    let shown = String::from_utf8(sink.into_inner()).unwrap();
    assert!(shown.contains("TEST: BIT_PACKING | texto.txt"));
}

/// Multi-byte characters: sizes are UTF-8 bytes, packing is per character.
#[test]
fn test_multibyte_text() {
    let dir = tempfile::tempdir().unwrap();
    let text = "ação ação ação";
    std::fs::write(dir.path().join("pt.txt"), text).unwrap();

    let outcome = execute(
        &RunConfig::default(),
        "pt.txt",
        &FileSource::with_base_dir(dir.path()),
        &FixedSampler::default(),
        &mut ConsoleSink::new(std::io::sink(), ReportFormat::Text),
        &mut std::io::sink(),
    )
    .unwrap();

    let record = &outcome.report.record;
    // 'a','ç','ã','o',' ' -> 5 symbols -> 3 bits; 14 chars -> 42 bits -> 6 bytes
    assert_eq!(record.original_size, text.len() as u64);
    assert_eq!(record.distinct_chars, 5);
    assert_eq!(record.bits_per_char, 3);
    assert_eq!(record.final_size, 6);
    assert_eq!(record.padding_bits, 6);
    assert!(record.compression_ratio < 1.0);
    assert_eq!(outcome.report.info.char_count, 14);
}

#[test]
fn test_missing_file_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut fallback = Vec::new();

    let err = execute(
        &RunConfig::default(),
        "texto_teste_1.txt",
        &FileSource::with_base_dir(dir.path()),
        &ProcessSampler::new(),
        &mut ConsoleSink::new(std::io::sink(), ReportFormat::Text),
        &mut fallback,
    )
    .unwrap_err();

    assert!(matches!(err, Error::InputUnavailable { .. }));
    assert!(fallback.is_empty());
}

#[test]
fn test_empty_file_aborts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("empty.txt"), "").unwrap();

    let err = execute(
        &RunConfig::default(),
        "empty.txt",
        &FileSource::with_base_dir(dir.path()),
        &ProcessSampler::new(),
        &mut ConsoleSink::new(std::io::sink(), ReportFormat::Text),
        &mut std::io::sink(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::EmptyInput { .. }));
}

/// A sink that cannot store still leaves a full report on the fallback.
#[test]
fn test_sink_failure_keeps_metrics() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("in.txt"), "zzzz").unwrap();
    let mut fallback = Vec::new();
    let config = RunConfig {
        mode: RunMode::Persist,
        ..Default::default()
    };

    let outcome = execute(
        &config,
        "in.txt",
        &FileSource::with_base_dir(dir.path()),
        &ProcessSampler::new(),
        &mut FailingSink,
        &mut fallback,
    )
    .unwrap();

    assert!(outcome.fell_back);
    assert_eq!(outcome.report.record.final_size, 1);
    let shown = String::from_utf8(fallback).unwrap();
    assert!(shown.contains("4 bytes -> 1 bytes"));
    assert!(shown.contains("Performance:"));
}

/// Persist mode end to end through the SQLite store.
#[cfg(feature = "sqlite")]
#[test]
fn test_persist_to_sqlite() {
    use bitpack_bench_core::select_sink;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("in.txt"), "hello hello hello").unwrap();
    let db = dir.path().join("results.db");
    let config = RunConfig {
        mode: RunMode::Persist,
        ..Default::default()
    };
    let mut sink = select_sink(
        config.mode,
        &db,
        Box::new(std::io::sink()),
        ReportFormat::Text,
    );

    let source = FileSource::with_base_dir(dir.path());
    let mut fallback = Vec::new();
    for expected_id in 1..=2 {
        let outcome = execute(
            &config,
            "in.txt",
            &source,
            &ProcessSampler::new(),
            sink.as_mut(),
            &mut fallback,
        )
        .unwrap();
        assert_eq!(outcome.stored_id, Some(expected_id));
        assert!(!outcome.fell_back);
    }
    assert!(fallback.is_empty());
    assert!(db.exists());
}

/// A store that cannot be opened falls back instead of failing the run.
#[cfg(feature = "sqlite")]
#[test]
fn test_unreachable_store_falls_back() {
    use bitpack_bench_core::store::SqliteSink;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("in.txt"), "abc").unwrap();
    let mut sink = SqliteSink::new(dir.path().join("no_such_dir").join("results.db"));
    let mut fallback = Vec::new();

    let outcome = execute(
        &RunConfig {
            mode: RunMode::Persist,
            ..Default::default()
        },
        "in.txt",
        &FileSource::with_base_dir(dir.path()),
        &ProcessSampler::new(),
        &mut sink,
        &mut fallback,
    )
    .unwrap();

    assert!(outcome.fell_back);
    assert!(!fallback.is_empty());
}
