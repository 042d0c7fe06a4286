//! Process-level tests for the `html-to-pdf` binary: exit codes and the
//! `Error:` line on stderr.

use std::fs;
use std::process::{Command, Output};

fn html_to_pdf(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_html-to-pdf"))
        .args(args)
        .output()
        .expect("failed to spawn html-to-pdf")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// =====================================================================
// Success
// =====================================================================

#[test]
fn inline_html_converts() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("nested/report.pdf");
    let out = html_to_pdf(&[
        "--html",
        "<h1>Quarterly</h1><p>Total: <b>42</b> units</p>",
        "--output",
        output.to_str().unwrap(),
    ]);

    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[0..5], b"%PDF-");
    assert!(stderr(&out).is_empty(), "quiet mode wrote: {}", stderr(&out));
}

#[test]
fn debug_flag_logs_success() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.html");
    fs::write(&input, "<p>from a file</p>").unwrap();
    let output = dir.path().join("out.pdf");
    let out = html_to_pdf(&[
        "--file",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--debug",
    ]);

    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("PDF generated successfully"));
}

// =====================================================================
// Failures
// =====================================================================

#[test]
fn missing_file_exits_with_error_line() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.pdf");
    let out = html_to_pdf(&[
        "--file",
        dir.path().join("absent.html").to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("Error: "), "stderr: {}", stderr(&out));
    assert!(!output.exists());
}

#[test]
fn unknown_flag_exits_one() {
    let out = html_to_pdf(&["--html", "<p>x</p>", "--output", "x.pdf", "--landscape"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("--landscape"));
}

#[test]
fn both_sources_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.pdf");
    let out = html_to_pdf(&[
        "--html",
        "<p>x</p>",
        "--file",
        "in.html",
        "--output",
        output.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!output.exists());
}

#[test]
fn help_exits_zero() {
    let out = html_to_pdf(&["--help"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("--base-url"));
}
