use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "radikorec",
    about = "Record time-shift programs from the Radiko streaming radio service",
    version,
    author
)]
pub struct Args {
    /// Station ID (e.g. "TBS")
    #[arg(short = 's', long = "station-id")]
    pub station_id: Option<String>,

    /// Record start datetime (YYYYMMDDHHmm)
    #[arg(short = 'f', long = "fromtime")]
    pub fromtime: Option<String>,

    /// Record end datetime (YYYYMMDDHHmm)
    #[arg(short = 't', long = "totime")]
    pub totime: Option<String>,

    /// Record length in minutes, used when no end datetime is given
    #[arg(short = 'd', long = "duration")]
    pub duration: Option<i64>,

    /// Email address for Radiko premium
    #[arg(short = 'm', long = "mail")]
    pub mail: Option<String>,

    /// Password for Radiko premium
    #[arg(short = 'p', long = "password")]
    pub password: Option<String>,

    /// URL of the program page, fills in station and start time
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// Output file name (".m4a" is appended when missing)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
