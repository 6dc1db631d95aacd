use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::{utils, CMD_NAME};

macro_rules! test_select_output {
    ($(($name:ident, $options:expr, $expected_stdout:expr),)*) => ($(
        #[test]
        fn $name() -> Result<(), Box<dyn std::error::Error>> {
            let input = utils::t2m_file()?;
            let mut cmd = Command::cargo_bin(CMD_NAME)?;
            cmd.arg("select").arg(input.path()).arg("t2m").args($options);
            cmd.assert()
                .success()
                .stdout(predicate::str::diff($expected_stdout))
                .stderr(predicate::str::is_empty());

            Ok(())
        }
    )*);
}

test_select_output! {
    (
        nearest_point,
        ["-s", "latitude=9", "-s", "longitude=1"],
        "270\n"
    ),
    (
        nearest_point_after_subtraction,
        ["-s", "latitude=9", "-s", "longitude=1", "--sub", "270"],
        "0\n"
    ),
    (
        exact_point_after_division,
        ["--sel", "latitude=0", "--sel", "longitude=10", "--exact", "--div", "2"],
        "136.5\n"
    ),
    (
        selection_by_time,
        ["-s", "time=2024-01-01T00:00:00Z", "-s", "latitude=0", "-s", "longitude=0"],
        "272\n"
    ),
    (
        extrapolated_point,
        ["-s", "latitude=90", "-s", "longitude=-5", "--extrapolate"],
        "270\n"
    ),
}

#[test]
fn selection_of_row() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::t2m_file()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("select")
        .arg(input.path())
        .arg("t2m")
        .args(["-s", "latitude=0", "--add", "1"]);
    cmd.assert()
        .success()
        .stdout(
            predicate::str::starts_with("(time, longitude)\n")
                .and(predicate::str::contains("273"))
                .and(predicate::str::contains("274")),
        )
        .stderr(predicate::str::is_empty());

    Ok(())
}

macro_rules! test_select_failure {
    ($(($name:ident, $variable:expr, $options:expr, $expected_stderr:expr),)*) => ($(
        #[test]
        fn $name() -> Result<(), Box<dyn std::error::Error>> {
            let input = utils::t2m_file()?;
            let mut cmd = Command::cargo_bin(CMD_NAME)?;
            cmd.arg("select").arg(input.path()).arg($variable).args($options);
            cmd.assert()
                .failure()
                .stdout(predicate::str::is_empty())
                .stderr(predicate::str::starts_with($expected_stderr));

            Ok(())
        }
    )*);
}

test_select_failure! {
    (
        out_of_range_point,
        "t2m",
        ["-s", "latitude=15"],
        "error: coordinate 15 is out of range [0, 10] of axis 'latitude'"
    ),
    (
        missing_exact_point,
        "t2m",
        ["-s", "latitude=9", "--exact"],
        "error: coordinate 9 not found in axis 'latitude'"
    ),
    (
        unknown_dimension,
        "t2m",
        ["-s", "isobaricInhPa=500"],
        "error: no such dimension: isobaricInhPa"
    ),
    (
        unknown_variable,
        "q",
        Vec::<&str>::new(),
        "error: no such variable: q"
    ),
    (
        malformed_selector,
        "t2m",
        ["-s", "latitude"],
        "error: invalid value 'latitude' for '--sel <SELECTOR>'"
    ),
    (
        conflicting_operations,
        "t2m",
        ["--add", "1", "--sub", "1"],
        "error: the argument '--add <X>' cannot be used with '--sub <X>'"
    ),
}

#[test]
fn selection_ignoring_fields_of_other_variables() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::partly_unsupported_file()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("select")
        .arg(input.path())
        .arg("msl")
        .args(["-s", "latitude=0", "-s", "longitude=10"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::diff("101010\n"))
        .stderr(predicate::str::is_empty());

    Ok(())
}

#[test]
fn selection_of_unsupported_variable() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::partly_unsupported_file()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("select").arg(input.path()).arg("t2m");
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::diff(
            "error: data representation template 5.3 is not supported\n",
        ));

    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("select")
        .arg(input.path())
        .arg("t2m")
        .arg("--skip-unsupported");
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::ends_with("error: no such variable: t2m\n"));

    Ok(())
}
