use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

pub const DEFAULT_REGISTRY_BASE: &str = "https://cnpja.com";
const POLL_INTERVAL_MS: u64 = 250;

/// Used when no identifiers are passed on the command line or via `--input`.
pub const DEFAULT_IDENTIFIERS: &[&str] = &[
    "47703730000112",
    "09117642000140",
    "21848698000170",
    "49629113000140",
    "40188631000109",
    "22802772000180",
    "30596100000193",
];

#[derive(Args, Debug, Clone)]
pub struct BrowserArgs {
    /// WebDriver endpoint (chromedriver or a Selenium hub)
    #[arg(long = "webdriver", env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,
    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Base URL of the registry; pages live at <base>/office/<identifier>
    #[arg(long = "registry-base", env = "REGISTRY_BASE_URL", default_value = DEFAULT_REGISTRY_BASE)]
    pub registry_base: String,
    /// Seconds to wait for the page's main content before extracting anyway
    #[arg(long = "timeout-secs", default_value = "10")]
    pub timeout_secs: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Sqlite,
    Sheets,
}

#[derive(Args, Debug, Clone)]
pub struct SinkArgs {
    /// Where records are appended
    #[arg(long, value_enum, default_value = "sqlite")]
    pub sink: SinkKind,
    /// SQLite database path
    #[arg(long, env = "REGISTRY_DB", default_value = "data/registry.sqlite")]
    pub db: PathBuf,
    /// Sheet range rows are appended to
    #[arg(long = "sheet-range", default_value = "Sheet1")]
    pub sheet_range: String,
    /// Don't append the header row before the first record
    #[arg(long = "no-header")]
    pub no_header: bool,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub poll_interval: Duration,
}

impl From<&BrowserArgs> for BrowserConfig {
    fn from(args: &BrowserArgs) -> Self {
        BrowserConfig {
            webdriver_url: args.webdriver_url.clone(),
            headless: !args.headed,
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub registry_base: String,
    pub readiness_timeout: Duration,
}

impl ExtractConfig {
    pub fn office_url(&self, identifier: &str) -> String {
        format!("{}/office/{}", self.registry_base.trim_end_matches('/'), identifier)
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            registry_base: DEFAULT_REGISTRY_BASE.to_string(),
            readiness_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&ExtractArgs> for ExtractConfig {
    fn from(args: &ExtractArgs) -> Self {
        ExtractConfig {
            registry_base: args.registry_base.clone(),
            readiness_timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub access_token: String,
    pub range: String,
}

impl SheetsConfig {
    pub fn from_env(range: &str) -> Result<Self> {
        let spreadsheet_id = std::env::var("SHEETS_SPREADSHEET_ID")
            .context("SHEETS_SPREADSHEET_ID environment variable must be set")?;
        let access_token = std::env::var("SHEETS_ACCESS_TOKEN")
            .context("SHEETS_ACCESS_TOKEN environment variable must be set")?;
        if spreadsheet_id.trim().is_empty() {
            bail!("SHEETS_SPREADSHEET_ID is empty");
        }
        Ok(SheetsConfig {
            spreadsheet_id,
            access_token,
            range: range.to_string(),
        })
    }
}

/// Identifiers from positional args plus an optional file, in that order.
/// Blank lines and `#` comments in the file are skipped.
pub fn collect_identifiers(
    args: &[String],
    input: Option<&std::path::Path>,
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let mut ids: Vec<String> = args
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(path) = input {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read identifiers from {}", path.display()))?;
        ids.extend(parse_identifier_list(&text));
    }

    if ids.is_empty() {
        ids = DEFAULT_IDENTIFIERS.iter().map(|s| s.to_string()).collect();
    }
    if let Some(n) = limit {
        ids.truncate(n);
    }
    Ok(ids)
}

fn parse_identifier_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
