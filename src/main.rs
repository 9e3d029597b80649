use clap::Parser;

use aprs_loc::ax25::{self, Callsign, Station};
use aprs_loc::config::{DEFAULT_HOST, DEFAULT_PORT, GpsdConfig, WaitPolicy};
use aprs_loc::gpsd;
use aprs_loc::output::{OutputFormat, create_formatter};

#[derive(Parser, Debug)]
#[command(name = "aprs-loc")]
#[command(about = "Print the current gpsd position as an APRS position beacon", long_about = None)]
struct Args {
    /// gpsd host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// gpsd TCP port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// How long to wait for a fix (e.g. "30s", "500ms", "forever")
    #[arg(short = 't', long, default_value = "forever")]
    timeout: WaitPolicy,

    /// Output format: aprs, json, ax25, bits
    #[arg(short = 'f', long, value_enum, default_value = "aprs")]
    format: OutputFormat,

    /// Source callsign for AX.25 output (e.g. "N0CALL-9")
    #[arg(short = 'c', long)]
    callsign: Option<Callsign>,

    /// AX.25 destination address
    #[arg(long, default_value = ax25::DEFAULT_DEST)]
    dest: Callsign,

    /// Comma-separated digipeater path; empty for none
    #[arg(long, default_value = ax25::DEFAULT_PATH)]
    path: String,

    /// Increase log verbosity (logs go to stderr)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let station = match args.callsign {
        Some(source) => Some(Station {
            source,
            dest: args.dest,
            path: ax25::parse_path(&args.path)?,
        }),
        None => None,
    };
    let formatter = create_formatter(args.format, station)?;

    let config = GpsdConfig {
        host: args.host,
        port: args.port,
        wait: args.timeout,
    };
    log::debug!("gpsd {} (wait: {})", config.address(), config.wait);

    let fix = gpsd::query_position(&config)?;

    println!("{}", formatter.format(&fix));

    Ok(())
}
