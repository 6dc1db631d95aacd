use std::fs;

use assert_cmd::Command;

use predicates::prelude::*;
use tempfile::TempDir;

use crate::{utils, CMD_NAME};

#[test]
fn display_of_values() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::t2m_file()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("decode").arg(input.path()).arg("t2m");
    cmd.assert()
        .success()
        .stdout(predicate::str::diff(
            "(time, latitude, longitude)\n270\n271\n272\n273\n",
        ))
        .stderr(predicate::str::is_empty());

    Ok(())
}

macro_rules! test_binary_export {
    ($(($name:ident, $option:expr, $to_bytes:expr),)*) => ($(
        #[test]
        fn $name() -> Result<(), Box<dyn std::error::Error>> {
            let input = utils::t2m_file()?;
            let dir = TempDir::new()?;
            let out_path = dir.path().join("out.bin");

            let mut cmd = Command::cargo_bin(CMD_NAME)?;
            cmd.arg("decode")
                .arg(input.path())
                .arg("t2m")
                .arg($option)
                .arg(&out_path);
            cmd.assert()
                .success()
                .stdout(predicate::str::is_empty())
                .stderr(predicate::str::is_empty());

            let expected = [270_f64, 271., 272., 273.]
                .iter()
                .flat_map($to_bytes)
                .collect::<Vec<_>>();
            assert_eq!(fs::read(&out_path)?, expected);

            Ok(())
        }
    )*);
}

test_binary_export! {
    (export_as_big_endian, "-b", |v: &f64| v.to_be_bytes()),
    (export_as_little_endian, "--little-endian", |v: &f64| v.to_le_bytes()),
}

#[test]
fn export_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("decode")
        .arg("-")
        .arg("t2m")
        .args(["-b", "-"])
        .write_stdin(utils::t2m_bytes());
    let output = cmd.output()?;
    assert!(output.status.success());
    assert_eq!(output.stdout.len(), 4 * 8);
    assert_eq!(output.stdout[..8], 270_f64.to_be_bytes());

    Ok(())
}

#[test]
fn both_endiannesses() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::t2m_file()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("decode")
        .arg(input.path())
        .arg("t2m")
        .args(["-b", "a.bin", "-l", "b.bin"]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("cannot be used with"));

    Ok(())
}

#[test]
fn decoding_ignoring_fields_of_other_variables() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::partly_unsupported_file()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("decode").arg(input.path()).arg("msl");
    cmd.assert()
        .success()
        .stdout(predicate::str::diff(
            "(time, latitude, longitude)\n101325\n101300\n100900\n101010\n",
        ))
        .stderr(predicate::str::is_empty());

    Ok(())
}
