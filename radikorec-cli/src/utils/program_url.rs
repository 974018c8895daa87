use regex::Regex;
use std::sync::LazyLock;

// Program pages look like
// https://radiko.jp/<region>/<station>/<anything>/<12-digit-stamp>
static PROGRAM_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://radiko\.jp/[^/]+/([^/]+)/[^/]+/(\d{12})$").unwrap());

/// Station and start time pattern-matched out of a program-page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRef {
    pub station_id: String,
    pub fromtime: String,
}

pub fn parse_program_url(url: &str) -> Option<ProgramRef> {
    let caps = PROGRAM_URL_REGEX.captures(url)?;
    Some(ProgramRef {
        station_id: caps[1].to_string(),
        fromtime: caps[2].to_string(),
    })
}
