use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    sync::LazyLock,
};

use chrono::{DateTime, NaiveDateTime};
use clap::ArgMatches;
use grib_dataset::{Dataset, DecodeOptions};
#[cfg(unix)]
use pager::Pager;
use regex::Regex;
use tracing::info;
#[cfg(unix)]
use which::which;

/// Decoding options given by the global flags.
pub(crate) fn decode_options(args: &ArgMatches) -> DecodeOptions {
    DecodeOptions::default().skip_unsupported(args.get_flag("skip-unsupported"))
}

pub fn dataset<P>(path: P, options: &DecodeOptions) -> anyhow::Result<Dataset>
where
    P: AsRef<Path>,
{
    let mut buf = Vec::with_capacity(4096);
    if is_dash(&path) {
        std::io::stdin().read_to_end(&mut buf)?;
    } else {
        let f = File::open(path)?;
        let mut f = BufReader::new(f);
        f.read_to_end(&mut buf)?;
    };
    let ds = grib_dataset::from_bytes_with_options(&buf, options)?;
    info!(bytes = buf.len(), variables = ds.len(), "decoded dataset");
    Ok(ds)
}

pub(crate) fn display_in_pager<V>(view: V)
where
    V: PredictableNumLines + std::fmt::Display,
{
    let user_attended = console::user_attended();

    let term = console::Term::stdout();
    let (height, _width) = term.size();
    if user_attended && view.num_lines() > height.into() {
        start_pager();
    }

    if user_attended {
        console::set_colors_enabled(true);
    }

    print!("{view}");
}

pub(crate) trait PredictableNumLines {
    fn num_lines(&self) -> usize;
}

#[cfg(unix)]
fn start_pager() {
    if which("less").is_ok() {
        Pager::with_pager("less -R").setup();
    } else {
        Pager::new().setup();
    }
}

#[cfg(not(unix))]
fn start_pager() {}

/// A `DIM=VALUE` pair given on the command line. Values of the `time`
/// dimension may also be given as dates.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CliSelector {
    pub(crate) dim: String,
    pub(crate) value: f64,
}

impl std::str::FromStr for CliSelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r"(?x)      # insignificant whitespace mode
                ^
                ([^=\s]+)   # dimension name
                =           # separator
                (\S+)       # coordinate value
                $",
            )
            .unwrap()
        });
        let cap = RE.captures(s).ok_or_else(|| {
            anyhow::anyhow!("selector must be specified as 'DIM=VALUE'")
        })?;
        let (_, [dim, value]) = cap.extract();
        let value = parse_coordinate(value)
            .ok_or_else(|| anyhow::anyhow!("invalid coordinate value: {value}"))?;
        Ok(Self {
            dim: dim.to_owned(),
            value,
        })
    }
}

/// Parses a number, or a date as seconds since the Unix epoch.
fn parse_coordinate(s: &str) -> Option<f64> {
    if let Ok(value) = s.parse::<f64>() {
        return Some(value);
    }
    let time = DateTime::parse_from_rfc3339(s)
        .map(|t| t.to_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").map(|t| t.and_utc()))
        .ok()?;
    Some(time.timestamp() as f64)
}

pub(crate) enum WriteStream {
    File(BufWriter<std::fs::File>),
    Stdout(std::io::Stdout),
}

impl WriteStream {
    pub(crate) fn new<P>(out_path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let stream = if is_dash(&out_path) {
            Self::Stdout(std::io::stdout())
        } else {
            let f = File::create(out_path)?;
            let f = BufWriter::new(f);
            Self::File(f)
        };
        Ok(stream)
    }

    pub(crate) fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Self::File(file) => file.write_all(buf),
            Self::Stdout(stdout) => stdout.write_all(buf),
        }
    }

    pub(crate) fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::File(file) => file.flush(),
            Self::Stdout(stdout) => stdout.flush(),
        }
    }
}

fn is_dash<P: AsRef<Path>>(path: P) -> bool {
    matches!(path.as_ref().to_str(), Some("-"))
}
