//! End-to-end tests for the cubridor binary.

use assert_cmd::Command;
use predicates::prelude::*;

/// Minimal encoders for the profile/mapping containers the binary reads.
mod wire {
    fn put_str(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    pub fn profile(records: &[(&str, u64, &[u64])]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"cubprof\x81");
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&(records.len() as u32).to_le_bytes());
        for (name, hash, counters) in records {
            put_str(&mut buf, name);
            buf.extend_from_slice(&hash.to_le_bytes());
            buf.extend_from_slice(&(counters.len() as u32).to_le_bytes());
            for c in *counters {
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        buf
    }

    /// One function per file, one code region spanning lines 1..=3, counter 0.
    pub fn mapping(arch: &str, funcs: &[(&str, u64, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"cubcmap\x81");
        buf.extend_from_slice(&1u32.to_le_bytes());
        put_str(&mut buf, arch);
        buf.extend_from_slice(&(funcs.len() as u32).to_le_bytes());
        for (_, _, file) in funcs {
            put_str(&mut buf, file);
        }
        buf.extend_from_slice(&(funcs.len() as u32).to_le_bytes());
        for (index, (name, hash, _)) in funcs.iter().enumerate() {
            put_str(&mut buf, name);
            buf.extend_from_slice(&hash.to_le_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes()); // no expressions
            buf.extend_from_slice(&1u32.to_le_bytes()); // one region
            buf.push(0); // Code
            buf.extend_from_slice(&(index as u32).to_le_bytes());
            for v in [1u32, 1, 3, 2] {
                buf.extend_from_slice(&v.to_le_bytes());
            }
            buf.push(1); // counter ref
            buf.extend_from_slice(&0u32.to_le_bytes());
        }
        buf
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    profile: std::path::PathBuf,
    object: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("default.cprof");
    let object = dir.path().join("app.bin");
    std::fs::write(
        &profile,
        wire::profile(&[("run", 1, &[7]), ("skip", 2, &[0])]),
    )
    .unwrap();
    std::fs::write(
        &object,
        wire::mapping("", &[("run", 1, "/proj/run.rs"), ("skip", 2, "/proj/skip.rs")]),
    )
    .unwrap();
    Fixture {
        _dir: dir,
        profile,
        object,
    }
}

#[test]
fn export_writes_json_to_stdout() {
    let fx = fixture();
    Command::cargo_bin("cubridor")
        .unwrap()
        .arg("export")
        .arg(&fx.object)
        .arg("--instr-profile")
        .arg(&fx.profile)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"llvm.coverage.json.export""#))
        .stdout(predicate::str::contains("/proj/run.rs"));
}

#[test]
fn export_writes_to_output_file() {
    let fx = fixture();
    let out = fx._dir.path().join("coverage.json");
    Command::cargo_bin("cubridor")
        .unwrap()
        .arg("export")
        .arg(&fx.object)
        .arg("--instr-profile")
        .arg(&fx.profile)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    let written = std::fs::read_to_string(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["version"], "3.0.1");
}

#[test]
fn missing_profile_fails_with_an_error_line() {
    let fx = fixture();
    Command::cargo_bin("cubridor")
        .unwrap()
        .arg("export")
        .arg(&fx.object)
        .arg("--instr-profile")
        .arg(fx._dir.path().join("nope.cprof"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn architecture_mismatch_fails() {
    let fx = fixture();
    Command::cargo_bin("cubridor")
        .unwrap()
        .arg("export")
        .arg(&fx.object)
        .arg("--instr-profile")
        .arg(&fx.profile)
        .arg("--arch")
        .arg("riscv64")
        .assert()
        .failure();
}

#[test]
fn report_prints_the_summary_table() {
    let fx = fixture();
    Command::cargo_bin("cubridor")
        .unwrap()
        .arg("report")
        .arg(&fx.object)
        .arg("--instr-profile")
        .arg(&fx.profile)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Filename"))
        .stdout(predicate::str::contains("run.rs"))
        .stdout(predicate::str::contains("TOTAL"));
}

#[test]
fn help_names_both_subcommands() {
    Command::cargo_bin("cubridor")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("report"));
}
