use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracesync::batch::{BatchOptions, run_batch};
use tracesync::metrics::BinaryStatus;
use tracesync::{Config, Error, MismatchKind};

const ADDI_GOLDEN: &str = r#"[{"pc": 0, "instr": 5244307, "target_reg": 11, "reg_val": 5,
    "mem_addr": null, "mem_val": null}]"#;

fn addi_dut(value: u32) -> String {
    format!(r#"{{"fetches": [[0, 5244307]], "regfile_commits": [[11, {value}]], "memory_accesses": []}}"#)
}

struct Dirs {
    _root: tempfile::TempDir,
    golden: std::path::PathBuf,
    dut: std::path::PathBuf,
    out: std::path::PathBuf,
}

fn dirs() -> Dirs {
    let root = tempfile::tempdir().unwrap();
    let golden = root.path().join("spike");
    let dut = root.path().join("dut");
    let out = root.path().join("out");
    fs::create_dir(&golden).unwrap();
    fs::create_dir(&dut).unwrap();
    Dirs {
        _root: root,
        golden,
        dut,
        out,
    }
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_missing_counterpart_is_skipped() {
    let d = dirs();
    write(&d.golden, "add.spike.json", ADDI_GOLDEN);
    write(&d.golden, "foo.spike.json", ADDI_GOLDEN);
    write(&d.dut, "add.fragmented.json", &addi_dut(5));

    let options = BatchOptions {
        out_dir: Some(d.out.clone()),
        jobs: 2,
    };
    let report = run_batch(&d.golden, &d.dut, &options, &Config::default(), |_| {}).unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].name, "add");
    assert_eq!(report.passed(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "foo");

    assert!(d.out.join("add.final.json").is_file());
    assert!(d.out.join("add.mismatches.json").is_file());
    assert!(!d.out.join("foo.final.json").exists());
}

#[test]
fn test_malformed_input_does_not_stop_batch() {
    let d = dirs();
    write(&d.golden, "add.spike.json", ADDI_GOLDEN);
    write(&d.golden, "bad.spike.json", ADDI_GOLDEN);
    write(&d.golden, "sub.spike.json", ADDI_GOLDEN);
    write(&d.dut, "add.fragmented.json", &addi_dut(5));
    write(&d.dut, "bad.fragmented.json", "{\"fetches\": [[0,");
    write(&d.dut, "sub.fragmented.json", &addi_dut(7));

    let report = run_batch(
        &d.golden,
        &d.dut,
        &BatchOptions::default(),
        &Config::default(),
        |_| {},
    )
    .unwrap();

    let statuses: Vec<(&str, BinaryStatus)> = report
        .entries
        .iter()
        .map(|e| (e.name.as_str(), e.status()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("add", BinaryStatus::Pass),
            ("bad", BinaryStatus::Error),
            ("sub", BinaryStatus::Fail),
        ]
    );
    assert!(matches!(
        report.entries[1].result,
        Err(Error::MalformedTrace { .. })
    ));

    let sub = report.entries[2].result.as_ref().unwrap();
    assert_eq!(sub.mismatches.len(), 1);
    assert_eq!(sub.mismatches[0].kind, MismatchKind::RegValue);
    assert!(sub.files.is_none());
}

#[test]
fn test_out_of_range_register_errors_one_binary() {
    let d = dirs();
    write(
        &d.golden,
        "bad.spike.json",
        r#"[{"pc": 0, "instr": 5244307, "target_reg": 40, "reg_val": 5,
            "mem_addr": null, "mem_val": null}]"#,
    );
    write(&d.golden, "good.spike.json", ADDI_GOLDEN);
    write(&d.dut, "bad.fragmented.json", &addi_dut(5));
    write(&d.dut, "good.fragmented.json", &addi_dut(5));

    let options = BatchOptions {
        out_dir: None,
        jobs: 1,
    };
    let report = run_batch(&d.golden, &d.dut, &options, &Config::default(), |_| {}).unwrap();

    assert_eq!(report.errored(), 1);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.entries[0].name, "bad");
    assert!(matches!(
        report.entries[0].result,
        Err(Error::MalformedTrace { .. })
    ));
}

#[test]
fn test_empty_golden_directory_is_fatal() {
    let d = dirs();
    write(&d.dut, "add.fragmented.json", &addi_dut(5));
    let result = run_batch(
        &d.golden,
        &d.dut,
        &BatchOptions::default(),
        &Config::default(),
        |_| {},
    );
    assert!(matches!(result, Err(Error::NoGoldenTraces(_))));
}

#[test]
fn test_progress_callback_per_pair() {
    let d = dirs();
    for i in 0..8 {
        write(&d.golden, &format!("t{i}.spike.json"), ADDI_GOLDEN);
        write(&d.dut, &format!("t{i}.fragmented.json"), &addi_dut(5));
    }

    let done = AtomicUsize::new(0);
    let options = BatchOptions {
        out_dir: None,
        jobs: 0,
    };
    let report = run_batch(&d.golden, &d.dut, &options, &Config::default(), |_| {
        done.fetch_add(1, Ordering::Relaxed);
    })
    .unwrap();

    assert_eq!(done.load(Ordering::Relaxed), 8);
    assert_eq!(report.passed(), 8);
    let names: Vec<&str> = report.entries.iter().map(|e| e.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[test]
fn test_mismatch_report_is_hex() {
    let d = dirs();
    write(&d.golden, "add.spike.json", ADDI_GOLDEN);
    write(&d.dut, "add.fragmented.json", &addi_dut(0x10));

    let options = BatchOptions {
        out_dir: Some(d.out.clone()),
        jobs: 1,
    };
    run_batch(&d.golden, &d.dut, &options, &Config::default(), |_| {}).unwrap();

    let text = fs::read_to_string(d.out.join("add.mismatches.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json[0]["golden"]["reg_val"], "0x00000005");
    assert_eq!(json[0]["dut"]["reg_val"], "0x00000010");
    assert_eq!(json[0]["dut"]["pc"], "0x00000000");
}
