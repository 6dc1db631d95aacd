use assert_cmd::Command;

use predicates::prelude::*;

use crate::{utils, CMD_NAME};

#[test]
fn display_of_dataset_summary() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::t2m_file()?;
    let expected = [
        "Dimensions:".to_owned(),
        format!("    {:<20}1", "time"),
        format!("    {:<20}2", "latitude"),
        format!("    {:<20}2", "longitude"),
        String::new(),
        "Coordinates:".to_owned(),
        format!("    {:<20}2024-01-01 00:00:00 UTC", "time"),
        format!("    {:<20}10 .. 0 [degrees_north]", "latitude"),
        format!("    {:<20}0 .. 10 [degrees_east]", "longitude"),
        String::new(),
        "Variables:".to_owned(),
        format!(
            "    {:<20}(time, latitude, longitude)  [1, 2, 2]  [K]  2 metre temperature",
            "t2m"
        ),
        String::new(),
    ]
    .join("\n");

    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("info").arg(input.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::diff(expected))
        .stderr(predicate::str::is_empty());

    Ok(())
}

#[test]
fn reading_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("info").arg("-").write_stdin(utils::t2m_bytes());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("t2m"))
        .stderr(predicate::str::is_empty());

    Ok(())
}

#[test]
fn non_grib_input() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::non_grib_file()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("info").arg(input.path());
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::diff("error: not GRIB data at 0\n"));

    Ok(())
}

#[test]
fn nonexistent_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::TempDir::new()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("info").arg(dir.path().join("missing.grib2"));
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::starts_with("error: "));

    Ok(())
}

#[test]
fn partly_unsupported_input() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::partly_unsupported_file()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("info").arg(input.path());
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::diff(
            "error: data representation template 5.3 is not supported\n",
        ));

    Ok(())
}

macro_rules! test_skipping_unsupported_fields {
    ($(($name:ident, $args:expr),)*) => ($(
        #[test]
        fn $name() -> Result<(), Box<dyn std::error::Error>> {
            let input = utils::partly_unsupported_file()?;
            let mut cmd = Command::cargo_bin(CMD_NAME)?;
            cmd.args($args).arg(input.path());
            cmd.assert()
                .success()
                .stdout(
                    predicate::str::contains("msl")
                        .and(predicate::str::contains("t2m").not()),
                )
                .stderr(predicate::str::contains("skipping field"));

            Ok(())
        }
    )*);
}

test_skipping_unsupported_fields! {
    (skipping_unsupported_fields_with_flag_after_subcommand, ["info", "--skip-unsupported"]),
    (skipping_unsupported_fields_with_flag_before_subcommand, ["--skip-unsupported", "info"]),
}
