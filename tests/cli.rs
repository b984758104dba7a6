//! End-to-end tests driving the csv-grep binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn csv_grep() -> Command {
    let mut cmd = Command::cargo_bin("csv-grep").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn literal_pattern_from_stdin() {
    csv_grep()
        .args(["-p", "b"])
        .write_stdin("a,1\nb,2\nc,3\nb,4\n")
        .assert()
        .success()
        .stdout("b,2\nb,4\n")
        .stderr(predicate::str::contains("hit proportion: 50.00% ( 2 / 4 )"));
}

#[test]
fn pattern_file_with_composite_keys() {
    let dir = TempDir::new().unwrap();
    let patterns = write(&dir, "patterns.csv", "x,a,c\ny,b,d\n");
    let data = write(&dir, "data.csv", "a,1,c\na,2,d\nb,3,d\n");

    csv_grep()
        .args(["-f", &patterns, "-K", "2,3", "-k", "1,3", &data])
        .assert()
        .success()
        .stdout("a,1,c\nb,3,d\n");
}

#[test]
fn title_skipped_in_every_file() {
    let dir = TempDir::new().unwrap();
    let first = write(&dir, "first.csv", "id,v\nk,1\n");
    let second = write(&dir, "second.csv", "id,v\nk,2\nz,3\n");

    csv_grep()
        .args(["-H", "-p", "k", &first, &second])
        .assert()
        .success()
        .stdout("k,1\nk,2\n")
        .stderr(predicate::str::contains("( 2 / 3 )"));
}

#[test]
fn invert_match_tab_mode() {
    csv_grep()
        .args(["-t", "-i", "-p", "a"])
        .write_stdin("a\t\"q\"\nb\t\"r\"\n")
        .assert()
        .success()
        .stdout("b\t\"r\"\n");
}

#[test]
fn regex_with_speedup() {
    csv_grep()
        .args(["-r", "-d", "-p", "^foo"])
        .write_stdin("foobar\nbarfoo\nfoobaz\n")
        .assert()
        .success()
        .stdout("foobar\n");
}

#[test]
fn output_file_and_delimiter() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out").join("hits.csv");

    csv_grep()
        .args(["-q", "-p", "a", "--fs-out", ";", "-o"])
        .arg(&out)
        .write_stdin("a,\"x;y\",z\nb,1,2\n")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("hit proportion").not());

    assert_eq!(fs::read_to_string(&out).unwrap(), "a;\"x;y\";z\n");
}

#[test]
fn no_pattern_is_fatal() {
    csv_grep()
        .write_stdin("a,1\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("-p and -f"));
}

#[test]
fn empty_pattern_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let patterns = write(&dir, "empty.csv", "");

    csv_grep()
        .args(["-f", &patterns])
        .write_stdin("a,1\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no pattern given"));
}

#[test]
fn key_column_overrun_is_fatal() {
    csv_grep()
        .args(["-p", "x", "-k", "5"])
        .write_stdin("a,b,c\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("key (5) is beyond number of column (3)"));
}

#[test]
fn empty_input_reports_zero() {
    csv_grep()
        .args(["-p", "x"])
        .write_stdin("")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("hit proportion: 0.00% ( 0 / 0 )"));
}

#[test]
fn speedup_counts_the_stop_row() {
    csv_grep()
        .args(["-d", "-p", "A"])
        .write_stdin("A,1\nA,2\nB,3\nA,4\nC,5\n")
        .assert()
        .success()
        .stdout("A,1\n")
        .stderr(predicate::str::contains("hit proportion: 50.00% ( 1 / 2 )"));
}

#[test]
fn blank_lines_are_seen_not_written() {
    csv_grep()
        .args(["-p", "a"])
        .write_stdin("a,1\n\nb,2\n")
        .assert()
        .success()
        .stdout("a,1\n")
        .stderr(predicate::str::contains("( 1 / 3 )"));

    csv_grep()
        .args(["-i", "-p", "a"])
        .write_stdin("a,1\n\nb,2\n")
        .assert()
        .success()
        .stdout("b,2\n")
        .stderr(predicate::str::contains("( 1 / 3 )"));
}

#[test]
fn oversized_buffer_is_rejected() {
    csv_grep()
        .args(["-p", "a", "--buffer-size", "99999999999999GB"])
        .write_stdin("a\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("too large"));
}
