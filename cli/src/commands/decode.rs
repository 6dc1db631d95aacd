use std::{fmt, path::PathBuf};

use anyhow::Result;
use clap::{arg, ArgMatches, Command};
use grib_dataset::Variable;

use crate::cli;

pub fn cli() -> Command {
    Command::new("decode")
        .about("Export all values of a variable")
        .arg(arg!(<FILE> "Target file (\"-\" for stdin)").value_parser(clap::value_parser!(PathBuf)))
        .arg(arg!(<VARIABLE> "Variable name"))
        .arg(
            arg!(-b --"big-endian" <OUT_FILE> "Export as a big-endian flat binary file")
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(-l --"little-endian" <OUT_FILE> "Export as a little-endian flat binary file")
                .required(false)
                .value_parser(clap::value_parser!(PathBuf))
                .conflicts_with("big-endian"),
        )
}

fn write_output(
    out_path: &PathBuf,
    values: impl Iterator<Item = f64>,
    to_bytes: fn(&f64) -> [u8; 8],
) -> Result<()> {
    let mut stream = cli::WriteStream::new(out_path)?;
    for value in values {
        stream.write_all(&to_bytes(&value))?;
    }
    stream.flush()?;
    Ok(())
}

pub fn exec(args: &ArgMatches) -> Result<()> {
    let file_name = args.get_one::<PathBuf>("FILE").unwrap();
    let name = args.get_one::<String>("VARIABLE").unwrap();
    let options = cli::decode_options(args).variables([name.as_str()]);
    let ds = cli::dataset(file_name, &options)?;
    let var = ds.get(name)?;
    let values = var.values().iter().copied();

    if let Some(out_path) = args.get_one::<PathBuf>("big-endian") {
        write_output(out_path, values, |f| f.to_be_bytes())
    } else if let Some(out_path) = args.get_one::<PathBuf>("little-endian") {
        write_output(out_path, values, |f| f.to_le_bytes())
    } else {
        cli::display_in_pager(DecodeTextDisplay(var));
        Ok(())
    }
}

struct DecodeTextDisplay<'a>(&'a Variable);

impl cli::PredictableNumLines for DecodeTextDisplay<'_> {
    fn num_lines(&self) -> usize {
        let Self(inner) = self;
        inner.values().len() + 1
    }
}

impl fmt::Display for DecodeTextDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Self(inner) = self;
        writeln!(f, "({})", inner.dims().join(", "))?;
        for value in inner.values().iter() {
            writeln!(f, "{value}")?;
        }
        Ok(())
    }
}
