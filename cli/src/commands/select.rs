use std::path::PathBuf;

use clap::{arg, ArgAction, ArgGroup, ArgMatches, Command};
use grib_dataset::{ScalarOp, SelectOptions};

use crate::cli::{self, CliSelector};

const OPS: [(&str, ScalarOp); 4] = [
    ("add", ScalarOp::Add),
    ("sub", ScalarOp::Sub),
    ("mul", ScalarOp::Mul),
    ("div", ScalarOp::Div),
];

pub fn cli() -> Command {
    Command::new("select")
        .about("Print values of a variable selected by coordinates")
        .arg(arg!(<FILE> "Target file (\"-\" for stdin)").value_parser(clap::value_parser!(PathBuf)))
        .arg(arg!(<VARIABLE> "Variable name"))
        .arg(
            arg!(-s --sel <SELECTOR> "Coordinate to select, as DIM=VALUE")
                .required(false)
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(CliSelector)),
        )
        .arg(arg!(--exact "Require exact coordinate matches instead of the nearest ones"))
        .arg(
            arg!(--extrapolate "Select the closest edge for coordinates outside an axis")
                .conflicts_with("exact"),
        )
        .arg(arg!(--add <X> "Add X to each value").required(false).value_parser(clap::value_parser!(f64)))
        .arg(arg!(--sub <X> "Subtract X from each value").required(false).value_parser(clap::value_parser!(f64)))
        .arg(arg!(--mul <X> "Multiply each value by X").required(false).value_parser(clap::value_parser!(f64)))
        .arg(arg!(--div <X> "Divide each value by X").required(false).value_parser(clap::value_parser!(f64)))
        .group(ArgGroup::new("op").args(["add", "sub", "mul", "div"]))
}

pub fn exec(args: &ArgMatches) -> anyhow::Result<()> {
    let file_name = args.get_one::<PathBuf>("FILE").unwrap();
    let name = args.get_one::<String>("VARIABLE").unwrap();
    let options = cli::decode_options(args).variables([name.as_str()]);
    let ds = cli::dataset(file_name, &options)?;
    let mut var = ds.get(name)?.clone();

    if let Some((op, operand)) = OPS
        .iter()
        .find_map(|(id, op)| args.get_one::<f64>(id).map(|x| (*op, *x)))
    {
        var = var.apply_scalar(op, operand);
    }

    let selectors = args
        .get_many::<CliSelector>("sel")
        .into_iter()
        .flatten()
        .map(|s| (s.dim.as_str(), s.value))
        .collect::<Vec<_>>();
    let options = if args.get_flag("exact") {
        SelectOptions::exact()
    } else {
        SelectOptions::nearest().extrapolate(args.get_flag("extrapolate"))
    };
    let selected = if selectors.is_empty() {
        var
    } else {
        var.sel(&selectors, options)?
    };

    match selected.item() {
        Some(value) => println!("{value}"),
        None => {
            println!("({})", selected.dims().join(", "));
            println!("{}", selected.values());
        }
    }
    Ok(())
}
