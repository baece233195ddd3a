//! Integration tests for melatool
//!
//! Runs the built binary against files in a temp dir.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::{Value, json};
use tempfile::tempdir;

const PAR: &str = "\
VUODET 0 5 10
TULOSTUS 1 0 2 0 1 0 0 0 1 0

TAPAHTUMA
#10 Thinning
#TAPAHTUMAVUODET 5 10 5
#METSIKKOEHDOT 4 42 3 5 -10
#VASTAAVAT_TAPAHTUMAT 20 99
#TAPAHTUMAKUTSU 40 1 2.5

TAPAHTUMA
#20 Clear cut
#SALLITUT_EDELTAJAT 10
";

fn melatool(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_melatool"))
        .args(args)
        .output()
        .expect("Failed to run melatool")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "melatool failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn msb_json() -> Value {
    json!([
        {
            "uid": 1,
            "records": [
                {
                    "record_type": 1,
                    "id": 5,
                    "year": 2020,
                    "area": 1.5,
                    "plot_field_count": 3,
                    "tree_field_count": 0
                },
                { "record_type": 7, "buf": [1.25, -2.0, 3.0] }
            ]
        },
        {
            "uid": 2,
            "records": [{ "record_type": 9, "buf": [] }]
        }
    ])
}

#[test]
fn test_par_json_par_roundtrip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let par = dir.path().join("sim.par");
    let json = dir.path().join("sim.json");
    let again = dir.path().join("again.par");
    fs::write(&par, PAR).unwrap();

    assert_success(&melatool(&["convert", path_str(&par), path_str(&json)]));
    let value: Value = serde_json::from_slice(&fs::read(&json).unwrap()).unwrap();
    assert_eq!(value["years"], json!([0.0, 5.0, 10.0]));
    assert_eq!(value["events"]["10"]["name"], "Thinning");
    assert_eq!(value["events"]["10"]["comparable_events"], json!([20, 99]));
    assert_eq!(value["events"]["20"]["feasible_precedessors"], json!([10]));

    assert_success(&melatool(&["convert", path_str(&json), path_str(&again)]));
    let text = fs::read_to_string(&again).unwrap();
    assert!(text.starts_with("VUODET 0 5 10\n"));
    assert!(text.contains("#METSIKKOEHDOT 4 42 3 5 -10\n"));
    assert!(text.contains("#VASTAAVAT_TAPAHTUMAT 20 99\n"));

    // normalizing twice is stable
    let twice = dir.path().join("twice.par");
    assert_success(&melatool(&["convert", path_str(&again), path_str(&twice)]));
    assert_eq!(fs::read_to_string(&twice).unwrap(), text);
}

#[test]
fn test_json_msb_json_roundtrip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let json = dir.path().join("plots.json");
    let rsd = dir.path().join("plots.rsd");
    fs::write(&json, serde_json::to_vec(&msb_json()).unwrap()).unwrap();

    let format = ["--endian", "big", "--float-type", "f64", "--uid-type", "u32"];
    let mut args = vec!["convert", path_str(&json), path_str(&rsd)];
    args.extend(format);
    assert_success(&melatool(&args));

    // first record: u32 uid, u32 count, (2 + 6) + (2 + 3) f64 values
    let bytes = fs::read(&rsd).unwrap();
    assert_eq!(&bytes[..4], &(4u32 + 4 + 13 * 8).to_be_bytes());

    let mut args = vec!["convert", path_str(&rsd)];
    args.extend(format);
    let output = melatool(&args);
    assert_success(&output);
    let back: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(back.as_array().unwrap().len(), 2);
    assert_eq!(back[0]["uid"], 1);
    assert_eq!(back[0]["records"][0]["id"], 5);
    assert_eq!(back[0]["records"][0]["area"], 1.5);
    assert_eq!(back[0]["records"][0]["plot_field_count"], 3);
    assert_eq!(back[0]["records"][1]["buf"], json!([1.25, -2.0, 3.0]));
    assert_eq!(back[1]["records"][0]["record_type"], 9);
}

#[test]
fn test_msb_reencode_between_formats() {
    let dir = tempdir().expect("Failed to create temp dir");
    let json = dir.path().join("plots.json");
    let native = dir.path().join("native.rsd");
    let wide = dir.path().join("wide.rsd");
    fs::write(&json, serde_json::to_vec(&msb_json()).unwrap()).unwrap();

    assert_success(&melatool(&["convert", path_str(&json), path_str(&native)]));
    assert_success(&melatool(&[
        "convert",
        path_str(&native),
        path_str(&wide),
        "--out-float-type",
        "f64",
        "--out-int-type",
        "u64",
    ]));
    assert!(fs::metadata(&wide).unwrap().len() > fs::metadata(&native).unwrap().len());

    let narrow = melatool(&["convert", path_str(&native)]);
    let widened = melatool(&[
        "convert",
        path_str(&wide),
        "--float-type",
        "f64",
        "--int-type",
        "u64",
    ]);
    assert_success(&narrow);
    assert_success(&widened);
    assert_eq!(narrow.stdout, widened.stdout);
}

#[test]
fn test_unsupported_pair_fails_without_output() {
    let dir = tempdir().expect("Failed to create temp dir");
    let par = dir.path().join("sim.par");
    let rsd = dir.path().join("sim.rsd");
    fs::write(&par, PAR).unwrap();

    let output = melatool(&["convert", path_str(&par), path_str(&rsd)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("can't convert par to msb"));
    assert!(!rsd.exists());
}

#[test]
fn test_corrupt_msb_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let rsd = dir.path().join("bad.rsd");
    fs::write(&rsd, [1u8, 2, 3]).unwrap();

    let output = melatool(&["convert", path_str(&rsd)]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_stdin_to_stdout() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_melatool"))
        .args(["convert", "-", "--from", "par"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run melatool");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"VUODET 1 2\nTUNTEMATON 3\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert_success(&output);

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value, json!({ "years": [1.0, 2.0] }));
    assert!(String::from_utf8_lossy(&output.stderr).contains("TUNTEMATON"));
}

#[test]
fn test_config_vocabulary_and_width() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = dir.path().join("melatool.toml");
    let par = dir.path().join("sim.par");
    let out = dir.path().join("out.par");
    fs::write(
        &config,
        "[par]\nline_width = 20\n\n[par.symbols]\nYEARS = \"VUODET\"\n",
    )
    .unwrap();
    fs::write(&par, "YEARS 1 2 3 4 5 6 7 8 9 10\n").unwrap();

    assert_success(&melatool(&[
        "--config",
        path_str(&config),
        "convert",
        path_str(&par),
        path_str(&out),
    ]));
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text, "YEARS 1 2 3 4 5 6 7\n    8 9 10\n\n");
}

#[test]
fn test_inspect_par() {
    let dir = tempdir().expect("Failed to create temp dir");
    let par = dir.path().join("sim.par");
    fs::write(&par, PAR).unwrap();

    let output = melatool(&["inspect", path_str(&par)]);
    assert_success(&output);
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("event 10 Thinning: 1 calls, 1 unresolved references\n"));
    assert!(text.contains("event 20 Clear cut: 0 calls\n"));
}
