use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

use clap::{arg, ArgMatches, Command};
use grib_dataset::{CoordinateAxis, Dataset};

use crate::cli;

pub fn cli() -> Command {
    Command::new("info")
        .about("Show dimensions, coordinates and variables")
        .arg(arg!(<FILE> "Target file (\"-\" for stdin)").value_parser(clap::value_parser!(PathBuf)))
}

pub fn exec(args: &ArgMatches) -> anyhow::Result<()> {
    let file_name = args.get_one::<PathBuf>("FILE").unwrap();
    let ds = cli::dataset(file_name, &cli::decode_options(args))?;
    if ds.is_empty() {
        anyhow::bail!("no variables found")
    }
    print!("{}", InfoView(&ds));
    Ok(())
}

struct InfoView<'i>(&'i Dataset);

impl Display for InfoView<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self(ds) = self;
        writeln!(f, "Dimensions:")?;
        for (name, len) in ds.dims() {
            writeln!(f, "    {name:<20}{len}")?;
        }

        writeln!(f, "\nCoordinates:")?;
        for axis in ds.coords() {
            writeln!(f, "    {:<20}{}", axis.name(), AxisRangeView(axis))?;
        }

        writeln!(f, "\nVariables:")?;
        for var in ds.variables() {
            let attrs = var.attributes();
            write!(
                f,
                "    {:<20}({})  {:?}",
                var.name(),
                var.dims().join(", "),
                var.shape()
            )?;
            if let Some(units) = &attrs.units {
                write!(f, "  [{units}]")?;
            }
            if let Some(long_name) = &attrs.long_name {
                write!(f, "  {long_name}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

struct AxisRangeView<'a>(&'a CoordinateAxis);

impl Display for AxisRangeView<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self(axis) = self;
        if let Some(times) = axis.datetimes() {
            match (times.first(), times.last()) {
                (Some(first), Some(last)) if times.len() > 1 => write!(f, "{first} .. {last}")?,
                (Some(first), _) => write!(f, "{first}")?,
                _ => {}
            }
            return Ok(());
        }

        let values = axis.values();
        match (values.first(), values.last()) {
            (Some(first), Some(last)) if values.len() > 1 => write!(f, "{first} .. {last}")?,
            (Some(first), _) => write!(f, "{first}")?,
            _ => {}
        }
        if let Some(units) = axis.units() {
            write!(f, " [{units}]")?;
        }
        Ok(())
    }
}
