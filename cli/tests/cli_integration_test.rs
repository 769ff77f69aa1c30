use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn run_bytetone(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bytetone"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute bytetone")
}

fn combined(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string() + &String::from_utf8_lossy(&output.stdout)
}

fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_encode_default_output_name() {
    let dir = tempfile::tempdir().unwrap();
    let input = create_test_file(dir.path(), "message.txt", b"Test message");

    let output = run_bytetone(&["encode", arg(&input)]);
    assert!(output.status.success(), "encode failed: {}", combined(&output));

    let wav = dir.path().join("message.wav");
    assert!(wav.exists(), "Output file was not created");

    let reader = hound::WavReader::open(&wav).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_rate, 7500);
    // 15 header symbols + 12 payload bytes + ".txt"
    assert_eq!(reader.len(), (15 + 12 + 4) * 750);
}

#[test]
fn test_round_trip_and_collisions() {
    let dir = tempfile::tempdir().unwrap();
    let content: Vec<u8> = (0..=255u8).rev().collect();
    let input = create_test_file(dir.path(), "blob.bin", &content);
    let wav = dir.path().join("blob.wav");
    let base = dir.path().join("blob_out");

    let output = run_bytetone(&["encode", arg(&input), "-o", arg(&wav)]);
    assert!(output.status.success(), "encode failed: {}", combined(&output));

    let output = run_bytetone(&["decode", arg(&wav), "-o", arg(&base)]);
    assert!(output.status.success(), "decode failed: {}", combined(&output));
    assert!(combined(&output).contains("Decoding completed"));

    let output = run_bytetone(&["decode", arg(&wav), "-o", arg(&base)]);
    assert!(output.status.success(), "second decode failed: {}", combined(&output));

    assert_eq!(fs::read(dir.path().join("blob_out1.bin")).unwrap(), content);
    assert_eq!(fs::read(dir.path().join("blob_out2.bin")).unwrap(), content);
}

#[test]
fn test_default_decode_base_strips_audio_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let input = create_test_file(dir.path(), "notes.md", b"# hi");
    let wav = dir.path().join("notes.wav");

    assert!(run_bytetone(&["encode", arg(&input), "-o", arg(&wav)]).status.success());
    let output = run_bytetone(&["decode", arg(&wav)]);
    assert!(output.status.success(), "decode failed: {}", combined(&output));

    assert_eq!(fs::read(dir.path().join("notes1.md")).unwrap(), b"# hi");
}

#[test]
fn test_bare_waveform_needs_matching_flags() {
    let dir = tempfile::tempdir().unwrap();
    let input = create_test_file(dir.path(), "data.csv", b"a,b\n1,2\n");
    let wav = dir.path().join("data.wav");
    let base = dir.path().join("data_out");

    let output = run_bytetone(&[
        "encode",
        arg(&input),
        "-o",
        arg(&wav),
        "--no-header",
        "--sample-rate",
        "8000",
    ]);
    assert!(output.status.success(), "encode failed: {}", combined(&output));

    // Default 7500 Hz does not match the 8000 Hz container
    let output = run_bytetone(&["decode", arg(&wav), "-o", arg(&base)]);
    assert!(!output.status.success());
    assert!(!dir.path().join("data_out1.csv").exists());

    let output = run_bytetone(&["decode", arg(&wav), "-o", arg(&base), "--sample-rate", "8000"]);
    assert!(output.status.success(), "decode failed: {}", combined(&output));
    assert_eq!(fs::read(dir.path().join("data_out1.csv")).unwrap(), b"a,b\n1,2\n");
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.bin");

    let output = run_bytetone(&["encode", arg(&missing)]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("does not exist"));

    let output = run_bytetone(&["decode", arg(&missing)]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_parameters_fail() {
    let dir = tempfile::tempdir().unwrap();
    let input = create_test_file(dir.path(), "x.bin", b"x");

    // 4 kHz cannot represent the 2650 Hz top tone
    let output = run_bytetone(&["encode", arg(&input), "--sample-rate", "4000"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("x.wav").exists());
}

#[test]
fn test_failed_transcode_keeps_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = create_test_file(dir.path(), "clip.mp3", b"not audio at all");

    let output = run_bytetone(&[
        "decode",
        arg(&input),
        "--ffmpeg",
        "bytetone-missing-transcoder",
    ]);
    assert!(!output.status.success());
    assert!(input.exists(), "input must not be deleted when conversion fails");
    assert!(!dir.path().join("clip1").exists());
}
