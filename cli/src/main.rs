use clap::{arg, crate_name, crate_version, ArgAction, ArgMatches, Command};
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod commands;

fn app() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .arg_required_else_help(true)
        .arg(
            arg!(-v --verbose "Print decoding progress; repeat for more detail")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            arg!(--"skip-unsupported" "Skip fields with unsupported encodings instead of failing")
                .global(true),
        )
        .subcommands(commands::cli())
}

fn init_tracing(matches: &ArgMatches) {
    let level = match matches.get_count("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn real_main() -> anyhow::Result<()> {
    let matches = app().get_matches();
    init_tracing(&matches);

    commands::dispatch(matches)
}

fn main() {
    if let Err(ref e) = real_main() {
        let red = console::Style::new().red();
        eprintln!("{}: {}", red.apply_to("error"), e);
        std::process::exit(1);
    }
}
