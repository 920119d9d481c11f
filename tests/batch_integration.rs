//! Integration tests for mzquant
//!
//! These tests run whole batches over synthetic mzXML folders.

mod common;

use std::fs::{self, File};
use std::path::Path;

use common::{alignment_run, baseline, write_block, write_mzxml, ScanFixture};
use mzquant::analyte::{AnalyteSpec, MzWindowCoefficients};
use mzquant::batch::{
    BatchConfig, BatchEvent, BatchJob, BatchRunner, BatchState, CallbackSink, Severity,
};
use mzquant::blocks::{Block, BlockSet};
use mzquant::chromatography::AlignmentFeature;
use mzquant::mzxml::MzXmlRun;
use mzquant::quantitation::read_rows;
use tempfile::tempdir;

const STAMP: &str = "19-10-2026_1200";
const FEATURE_MZ: [f64; 5] = [500.0, 600.0, 700.0, 800.0, 900.0];
const OBSERVED: [f64; 5] = [20.0, 40.0, 60.0, 80.0, 100.0];
const PROTON_DIMER_MZ: f64 = 3.0218294;

fn features() -> Vec<AlignmentFeature> {
    FEATURE_MZ
        .iter()
        .zip(OBSERVED)
        .map(|(&mz, observed)| AlignmentFeature {
            mz,
            time: 2.0 * observed + 5.0,
            mz_window: 0.1,
            time_window: 150.0,
            sn_cutoff: 9.0,
            required: false,
        })
        .collect()
}

fn proton_blocks() -> BlockSet {
    [Block::new("proton", 1.00727646677).with_charge(1)]
        .into_iter()
        .collect()
}

fn proton_dimer() -> AnalyteSpec {
    AnalyteSpec {
        name: "proton2".to_string(),
        charge_min: 1,
        charge_max: 1,
        mz_window: MzWindowCoefficients::constant(0.05),
        time: Some(100.0),
        time_window: Some(10.0),
        calibrant: false,
        min_isotopic_fraction: 0.0,
        charge_carrier: "proton".to_string(),
    }
}

/// Scans from 85 s to 115 s with a Gaussian peak at the proton dimer m/z
fn proton_dimer_run() -> Vec<ScanFixture> {
    (85..=115)
        .map(|t| {
            let mz: Vec<f64> = (0..=1400).map(|k| 1.0 + k as f64 * 0.01).collect();
            let intensity = mz
                .iter()
                .enumerate()
                .map(|(j, &m)| {
                    let z = (m - PROTON_DIMER_MZ) / 0.01;
                    baseline(t, j) + 5000.0 * (-0.5 * z * z).exp()
                })
                .collect();
            ScanFixture {
                retention_time: t as f64,
                mz,
                intensity,
            }
        })
        .collect()
}

fn stamped(dir: &Path, suffix: &str) -> std::path::PathBuf {
    dir.join(format!("{}_{}", STAMP, suffix))
}

#[test]
fn test_alignment_recovers_affine_shift() {
    let dir = tempdir().unwrap();
    write_mzxml(
        &dir.path().join("run1.mzXML"),
        &alignment_run(&FEATURE_MZ, &OBSERVED, 200),
    );

    let job = BatchJob::new(BatchConfig::default(), BlockSet::new())
        .with_alignment_features(features())
        .with_directory(dir.path())
        .with_stamp(STAMP);
    let mut events = Vec::new();
    let outcome = BatchRunner::new(job).run(&mut events);

    assert_eq!(outcome.state, BatchState::Done);
    assert_eq!(outcome.aligned, vec![dir.path().join("aligned_run1.mzXML")]);
    assert!(events.contains(&BatchEvent::AlignmentProgress { percent: 100 }));
    assert!(events.contains(&BatchEvent::Finished { success: true }));

    // Every scan time is rewritten through the fitted 2t + 5 transform
    let aligned = MzXmlRun::from_path(&outcome.aligned[0]).unwrap();
    assert_eq!(aligned.scans.len(), 200);
    for &observed in &OBSERVED {
        let time = aligned.scans[observed as usize].retention_time;
        assert!((time - (2.0 * observed + 5.0)).abs() < 0.5, "{} -> {}", observed, time);
    }

    let figures: serde_json::Value =
        serde_json::from_reader(File::open(stamped(dir.path(), "alignment.json")).unwrap()).unwrap();
    assert_eq!(figures["pages"].as_array().unwrap().len(), 1);
    assert!(stamped(dir.path(), "alignment_features.csv").exists());
    assert!(stamped(dir.path(), "settings.csv").exists());

    // A second batch over the same folder ignores the aligned output
    let job = BatchJob::new(BatchConfig::default(), BlockSet::new())
        .with_alignment_features(features())
        .with_directory(dir.path())
        .with_stamp(STAMP);
    let outcome = BatchRunner::new(job).run(Vec::<BatchEvent>::new());
    assert_eq!(outcome.aligned.len(), 1);
}

#[test]
fn test_alignment_failure_leaves_marker() {
    let dir = tempdir().unwrap();
    // Only two features peak; the other three stay at baseline
    write_mzxml(
        &dir.path().join("run1.mzXML"),
        &alignment_run(&FEATURE_MZ[..2], &OBSERVED[..2], 200),
    );

    let job = BatchJob::new(BatchConfig::default(), BlockSet::new())
        .with_alignment_features(features())
        .with_directory(dir.path())
        .with_stamp(STAMP);
    let outcome = BatchRunner::new(job).run(Vec::<BatchEvent>::new());

    assert_eq!(outcome.state, BatchState::Done);
    let marker = dir.path().join("unaligned_run1.mzXML");
    assert_eq!(outcome.aligned, vec![marker.clone()]);
    assert_eq!(fs::metadata(&marker).unwrap().len(), 0);
}

#[test]
fn test_empty_run_gets_marker_and_progress() {
    let dir = tempdir().unwrap();
    write_mzxml(
        &dir.path().join("run1.mzXML"),
        &alignment_run(&FEATURE_MZ, &OBSERVED, 200),
    );
    write_mzxml(&dir.path().join("run2.mzXML"), &[]);

    let job = BatchJob::new(BatchConfig::default(), BlockSet::new())
        .with_alignment_features(features())
        .with_directory(dir.path())
        .with_stamp(STAMP);
    let mut events = Vec::new();
    let outcome = BatchRunner::new(job).run(&mut events);

    assert_eq!(outcome.state, BatchState::Done);
    let marker = dir.path().join("unaligned_run2.mzXML");
    assert_eq!(
        outcome.aligned,
        vec![dir.path().join("aligned_run1.mzXML"), marker.clone()]
    );
    assert_eq!(fs::metadata(&marker).unwrap().len(), 0);
    assert!(events.contains(&BatchEvent::AlignmentProgress { percent: 50 }));
    assert!(events.contains(&BatchEvent::AlignmentProgress { percent: 100 }));
}

#[test]
fn test_cancel_after_second_file() {
    let dir = tempdir().unwrap();
    for i in 1..=5 {
        write_mzxml(
            &dir.path().join(format!("run{}.mzXML", i)),
            &alignment_run(&FEATURE_MZ, &OBSERVED, 200),
        );
    }

    let job = BatchJob::new(BatchConfig::default(), proton_blocks())
        .with_analytes(vec![proton_dimer()])
        .with_alignment_features(features())
        .with_directory(dir.path())
        .with_stamp(STAMP);
    let mut runner = BatchRunner::new(job);
    let token = runner.cancellation_token();

    let mut events = Vec::new();
    let outcome = runner.run(CallbackSink::new(|event: &BatchEvent| {
        if *event == (BatchEvent::AlignmentProgress { percent: 40 }) {
            token.cancel();
        }
        events.push(event.clone());
    }));

    assert_eq!(outcome.state, BatchState::Cancelled);
    assert_eq!(outcome.aligned.len(), 2);
    assert!(outcome.exported.is_empty());
    assert!(outcome.figures.is_empty());
    assert!(events.contains(&BatchEvent::Aborted));
    assert!(!events.contains(&BatchEvent::AlignmentProgress { percent: 60 }));
    assert_eq!(
        events.last(),
        Some(&BatchEvent::StateChanged {
            state: BatchState::Cancelled
        })
    );

    // The reference was written before alignment started; nothing after it
    assert!(stamped(dir.path(), "analytes_ref.csv").exists());
    assert!(!stamped(dir.path(), "results.csv").exists());
    assert!(!stamped(dir.path(), "settings.csv").exists());
    assert!(!dir.path().join("aligned_run3.mzXML").exists());
}

#[test]
fn test_proton_dimer_end_to_end() {
    let dir = tempdir().unwrap();
    let blocks = tempdir().unwrap();
    write_block(blocks.path(), "proton", "mass: 1.00727646677\ncharge: 1\n");

    let list = dir.path().join("analytes.csv");
    fs::write(
        &list,
        "analyte,charge_min,charge_max,calibrant,time,time_window\nproton2,1,1,,100,10\n",
    )
    .unwrap();
    let runs = dir.path().join("runs");
    fs::create_dir(&runs).unwrap();
    write_mzxml(&runs.join("a.mzXML"), &proton_dimer_run());
    write_mzxml(&runs.join("b.mzXML"), &proton_dimer_run());

    let config = BatchConfig {
        min_isotopic_fraction: 0.0,
        ..BatchConfig::default()
    };
    let analytes = config.analyte_defaults().read_file(&list).unwrap();
    let job = BatchJob::new(config, BlockSet::from_dir(blocks.path()).unwrap())
        .with_analytes(analytes)
        .with_directory(&runs)
        .with_stamp(STAMP);

    let handle = BatchRunner::new(job).spawn().unwrap();
    let events: Vec<BatchEvent> = handle.events.iter().collect();
    let outcome = handle.join().unwrap();
    assert_eq!(outcome.state, BatchState::Done, "{:?}", events);

    let states: Vec<BatchState> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::StateChanged { state } => Some(*state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            BatchState::GeneratingReference,
            BatchState::Quantitating,
            BatchState::Exporting,
            BatchState::Done
        ]
    );
    assert!(events.contains(&BatchEvent::ReferenceProgress { percent: 100 }));
    assert!(events.contains(&BatchEvent::QuantitationProgress { percent: 50 }));

    // Reference: one row at (2·proton + proton) / 1
    let mut reader = csv::Reader::from_path(stamped(&runs, "analytes_ref.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    let mz_column = headers.iter().position(|h| h == "mz").unwrap();
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    let mz: f64 = records[0][mz_column].parse().unwrap();
    assert!((mz - PROTON_DIMER_MZ).abs() < 1e-6);

    let rows = read_rows(File::open(stamped(&runs, "results.csv")).unwrap()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].file, "a");
    assert_eq!(rows[1].file, "b");
    for row in &rows {
        assert_eq!(row.analyte, "proton2");
        assert_eq!(row.charge, 1);
        assert!((row.mz_exact.unwrap() - PROTON_DIMER_MZ).abs() < 1e-6);
        assert!((row.isotopic_fraction.unwrap() - 1.0).abs() < 1e-9);
        assert!(row.total_area_background_subtracted.unwrap() > 0.0);
        assert!(row.signal_to_noise.unwrap() > 10.0);
        assert!(row.isotopic_pattern_quality.is_some());
    }

    let settings = fs::read_to_string(stamped(&runs, "sum_spectrum_settings.csv")).unwrap();
    assert!(settings.contains("N/A"), "{}", settings);
    assert!(stamped(&runs, "calibration.json").exists());

    // The spill file is gone once results are exported
    let leftovers: Vec<_> = fs::read_dir(&runs)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_aligned_only_without_aligned_files() {
    let dir = tempdir().unwrap();
    write_mzxml(&dir.path().join("a.mzXML"), &proton_dimer_run());

    let config = BatchConfig {
        quantitate_aligned_only: true,
        ..BatchConfig::default()
    };
    let job = BatchJob::new(config, proton_blocks())
        .with_analytes(vec![proton_dimer()])
        .with_directory(dir.path())
        .with_stamp(STAMP);
    let mut events = Vec::new();
    let outcome = BatchRunner::new(job).run(&mut events);

    assert_eq!(outcome.state, BatchState::Errored);
    let notification = events
        .iter()
        .find_map(|e| match e {
            BatchEvent::Error { notification } => Some(notification),
            _ => None,
        })
        .unwrap();
    assert_eq!(notification.title, "No aligned files");
    assert_eq!(notification.severity, Severity::Warning);
}

#[test]
fn test_corrupt_run_is_critical() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("broken.mzXML"),
        "<mzXML><msRun><scan num=\"1\" retentionTime=\"PT1S\"><peaks precision=\"64\">",
    )
    .unwrap();

    let job = BatchJob::new(BatchConfig::default(), BlockSet::new())
        .with_alignment_features(features())
        .with_directory(dir.path())
        .with_stamp(STAMP);
    let mut events = Vec::new();
    let outcome = BatchRunner::new(job).run(&mut events);

    assert_eq!(outcome.state, BatchState::Errored);
    let notification = events
        .iter()
        .find_map(|e| match e {
            BatchEvent::Error { notification } => Some(notification),
            _ => None,
        })
        .unwrap();
    assert_eq!(notification.title, "Processing error");
    assert_eq!(notification.message, "Unexpected error during alignment:");
    assert_eq!(notification.severity, Severity::Critical);
}
