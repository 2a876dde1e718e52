//! File-backed runs of the noise pass and the full pipeline.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use pixel_audit::config::{AuditConfig, PipelineFiles};
use pixel_audit::data::loader::load_file;
use pixel_audit::data::pixels::PixelMatrix;
use pixel_audit::error::DataError;
use pixel_audit::eval::RiskDimension;
use pixel_audit::pipeline::{apply_dp, run};
use tempfile::TempDir;

fn write_images_csv(path: &Path, n: usize) {
    let mut text = String::from("name,type,size,pixels,label\n");
    for i in 0..n {
        let v = (i * 13) % 256;
        text.push_str(&format!(
            "img_{i},png,2x2,\"[[{v}, {v}], [{}, {}]]\",{}\n",
            255 - v,
            v / 2,
            i % 3
        ));
    }
    std::fs::write(path, text).unwrap();
}

#[test]
fn apply_dp_noises_every_row_and_keeps_other_columns() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("images.csv");
    let output = dir.path().join("syn.csv");
    write_images_csv(&input, 10);

    let report = apply_dp(&input, &output, 1.0, Some(3)).unwrap();
    assert_eq!(report.noised, 10);

    let before = load_file(&input).unwrap();
    let after = load_file(&output).unwrap();
    assert_eq!(after.columns, before.columns);
    for (a, b) in after.rows.iter().zip(&before.rows) {
        assert_eq!(a.get("name"), b.get("name"));
        assert_eq!(a.get("label"), b.get("label"));
        let m = PixelMatrix::parse(a.pixels().unwrap()).unwrap();
        assert_eq!(m.shape(), &[2, 2]);
        assert!(m.values().iter().all(|v| (0.0..=255.0).contains(v)));
    }
}

#[test]
fn apply_dp_passes_malformed_rows_through() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    std::fs::write(
        &input,
        "name,type,size,pixels\na,png,2x2,\"[[10,20],[30,40]]\"\nb,png,2x2,not-a-list\n",
    )
    .unwrap();

    let report = apply_dp(&input, &output, 1.0, Some(1)).unwrap();
    assert_eq!(report.noised, 1);
    assert_eq!(report.fallbacks.len(), 1);

    let after = load_file(&output).unwrap();
    assert_eq!(after.rows[1].pixels(), Some("not-a-list"));
}

#[test]
fn apply_dp_requires_pixels_column() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    std::fs::write(&input, "name,size\na,2x2\n").unwrap();

    let err = apply_dp(&input, &output, 1.0, None).unwrap_err();
    assert_eq!(
        err.downcast_ref::<DataError>(),
        Some(&DataError::MissingColumn("pixels".into()))
    );
    assert!(!output.exists());
}

#[test]
fn full_run_writes_three_views_and_reports_three_risks() {
    let dir = TempDir::new().unwrap();
    let files = PipelineFiles::in_dir(dir.path());
    write_images_csv(&files.images, 100);

    let config = AuditConfig {
        noise_seed: Some(11),
        files: files.clone(),
        ..Default::default()
    };
    let result = run(&config).unwrap();

    let ori = load_file(&files.original).unwrap();
    let ctl = load_file(&files.control).unwrap();
    let syn = load_file(&files.synthetic).unwrap();
    assert_eq!(ori.len(), 70);
    assert_eq!(ctl.len(), 30);
    assert_eq!(syn.len(), 70);

    let names = |c: &pixel_audit::data::model::RowCollection| -> BTreeSet<String> {
        c.rows
            .iter()
            .map(|r| r.get("name").unwrap().to_string())
            .collect()
    };
    assert!(names(&ori).is_disjoint(&names(&ctl)));
    assert_eq!(names(&ori), names(&syn));

    for dim in [
        RiskDimension::SinglingOut,
        RiskDimension::Linkability,
        RiskDimension::Inference,
    ] {
        let estimate = result.evaluation.get(dim).unwrap().result.as_ref().unwrap();
        assert!((0.0..=1.0).contains(&estimate.risk));
    }
}

#[test]
fn full_run_split_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let files = PipelineFiles::in_dir(dir.path());
    write_images_csv(&files.images, 50);
    let config = AuditConfig {
        files: files.clone(),
        ..Default::default()
    };

    run(&config).unwrap();
    let first = std::fs::read(&files.control).unwrap();
    run(&config).unwrap();
    let second = std::fs::read(&files.control).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_input_aborts_without_writing() {
    let dir = TempDir::new().unwrap();
    let files = PipelineFiles::in_dir(dir.path());
    let config = AuditConfig {
        files: files.clone(),
        ..Default::default()
    };

    assert!(run(&config).is_err());
    assert!(!files.original.exists());
    assert!(!files.control.exists());
    assert!(!files.synthetic.exists());
}

#[test]
fn cli_exits_with_one_when_pixels_column_is_absent() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.csv");
    std::fs::write(&input, "name,size\na,2x2\n").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_pixel-audit"))
        .arg("apply-dp")
        .arg(&input)
        .arg(dir.path().join("out.csv"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn cli_apply_dp_succeeds_on_valid_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    write_images_csv(&input, 3);

    let status = Command::new(env!("CARGO_BIN_EXE_pixel-audit"))
        .args(["apply-dp"])
        .arg(&input)
        .arg(&output)
        .arg("0.5")
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(load_file(&output).unwrap().len(), 3);
}
