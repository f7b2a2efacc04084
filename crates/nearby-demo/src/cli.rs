#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Flags are `--name=value` pairs parsed by hand.
//! Every flag except `--help` and `--version` has a `NEARBY_DEMO_*` variable.

use std::env;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
Nearby store finder demo

USAGE:
    nearby-demo [OPTIONS]

OPTIONS:
    --keyword=TEXT       Store name to search for (default: Starbucks)
    --start=LAT,LON      Starting position (default: 47.6097,-122.3422)
    --steps=N            Number of walk steps after the first fix (default: 5)
    --step-m=M           Meters walked north per step (default: 150)
    --distance-filter=M  Minimum movement before a fix is published (default: 10)
    --digits=N           Max fraction digits in distance labels (default: 2)
    --json-logs          Emit JSON logs to stdout (filter with RUST_LOG)
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT:
    NEARBY_DEMO_KEYWORD, NEARBY_DEMO_START, NEARBY_DEMO_STEPS,
    NEARBY_DEMO_STEP_M, NEARBY_DEMO_DISTANCE_FILTER, NEARBY_DEMO_DIGITS,
    NEARBY_DEMO_JSON_LOGS
    Flags override environment variables.";

/// Parsed demo options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Search keyword.
    pub keyword: String,
    /// Starting latitude and longitude.
    pub start: (f64, f64),
    /// Walk steps after the first fix.
    pub steps: u32,
    /// Meters walked per step.
    pub step_m: f64,
    /// Location distance filter in meters.
    pub distance_filter_m: f64,
    /// Max fraction digits for distance labels.
    pub digits: u8,
    /// Install the JSON log subscriber.
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            keyword: "Starbucks".into(),
            start: (47.6097, -122.3422),
            steps: 5,
            step_m: 150.0,
            distance_filter_m: 10.0,
            digits: 2,
            json_logs: false,
        }
    }
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("nearby-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = get_env("NEARBY_DEMO_KEYWORD")
            && !val.trim().is_empty()
        {
            opts.keyword = val;
        }
        if let Some(val) = get_env("NEARBY_DEMO_START")
            && let Some(start) = parse_lat_lon(&val)
        {
            opts.start = start;
        }
        if let Some(val) = get_env("NEARBY_DEMO_STEPS")
            && let Ok(n) = val.parse()
        {
            opts.steps = n;
        }
        if let Some(val) = get_env("NEARBY_DEMO_STEP_M")
            && let Ok(n) = val.parse()
        {
            opts.step_m = n;
        }
        if let Some(val) = get_env("NEARBY_DEMO_DISTANCE_FILTER")
            && let Ok(n) = val.parse()
        {
            opts.distance_filter_m = n;
        }
        if let Some(val) = get_env("NEARBY_DEMO_DIGITS")
            && let Ok(n) = val.parse()
        {
            opts.digits = n;
        }
        if let Some(val) = get_env("NEARBY_DEMO_JSON_LOGS") {
            opts.json_logs = val == "1" || val.eq_ignore_ascii_case("true");
        }

        // Parse command-line args (override env vars)
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--json-logs" => opts.json_logs = true,
                other => {
                    if let Some(val) = other.strip_prefix("--keyword=") {
                        if val.trim().is_empty() {
                            return Err(invalid("--keyword", val));
                        }
                        opts.keyword = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--start=") {
                        opts.start = parse_lat_lon(val).ok_or_else(|| invalid("--start", val))?;
                    } else if let Some(val) = other.strip_prefix("--steps=") {
                        opts.steps = val.parse().map_err(|_| invalid("--steps", val))?;
                    } else if let Some(val) = other.strip_prefix("--step-m=") {
                        opts.step_m = val.parse().map_err(|_| invalid("--step-m", val))?;
                    } else if let Some(val) = other.strip_prefix("--distance-filter=") {
                        opts.distance_filter_m =
                            val.parse().map_err(|_| invalid("--distance-filter", val))?;
                    } else if let Some(val) = other.strip_prefix("--digits=") {
                        opts.digits = val.parse().map_err(|_| invalid("--digits", val))?;
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }
}

fn invalid(flag: &'static str, value: &str) -> ParseError {
    ParseError::InvalidValue {
        flag,
        value: value.to_string(),
    }
}

/// Parse `"lat,lon"`. Range validation happens when the coordinate is built.
fn parse_lat_lon(raw: &str) -> Option<(f64, f64)> {
    let mut parts = raw.trim().split(',');
    let lat: f64 = parts.next()?.trim().parse().ok()?;
    let lon: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((lat, lon))
}
