use clap::{ArgMatches, Command};

pub fn cli() -> Vec<Command> {
    vec![decode::cli(), info::cli(), select::cli()]
}

pub fn dispatch(matches: ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("decode", args)) => decode::exec(args),
        Some(("info", args)) => info::exec(args),
        Some(("select", args)) => select::exec(args),
        _ => unreachable!(),
    }
}

pub mod decode;
pub mod info;
pub mod select;
