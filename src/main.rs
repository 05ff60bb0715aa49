mod browser;
mod config;
mod extract;
mod record;
mod sink;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use browser::{PageBackend, Snapshot, WebDriverSession};
use config::{BrowserArgs, BrowserConfig, ExtractArgs, ExtractConfig, SinkArgs};
use extract::readiness::Readiness;
use extract::Extraction;
use record::{CompanyRecord, HEADER};
use sink::Sink;

#[derive(Parser)]
#[command(name = "registry_scraper", about = "Company registry page scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open each identifier's registry page in the browser and append one record per identifier
    Run {
        /// Registry identifiers (default: built-in list)
        identifiers: Vec<String>,
        /// File with one identifier per line
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Max identifiers to process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[command(flatten)]
        browser: BrowserArgs,
        #[command(flatten)]
        extract: ExtractArgs,
        #[command(flatten)]
        sink: SinkArgs,
    },
    /// Extract records from saved pages instead of a live browser
    Extract {
        /// Saved page markup; the file stem is the identifier (e.g. 47703730000112.html)
        #[arg(required = true)]
        pages: Vec<PathBuf>,
        /// Identifier to use instead of the file stem (single page only)
        #[arg(long)]
        identifier: Option<String>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Show statistics for stored records
    Stats {
        #[arg(long, env = "REGISTRY_DB", default_value = "data/registry.sqlite")]
        db: PathBuf,
    },
    /// Latest stored records
    Overview {
        /// Filter by status (e.g. "Ativa")
        #[arg(short, long)]
        status: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        #[arg(long, env = "REGISTRY_DB", default_value = "data/registry.sqlite")]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            identifiers,
            input,
            limit,
            browser,
            extract: extract_args,
            sink,
        } => {
            let ids = config::collect_identifiers(&identifiers, input.as_deref(), limit)?;
            let extract_config = ExtractConfig::from(&extract_args);
            let out = Sink::open(&sink)?;
            out.prepare(!sink.no_header).await?;

            let t_browser = Instant::now();
            let mut session = WebDriverSession::start(&BrowserConfig::from(&browser)).await?;
            println!(
                "Browser started in {:.2}s",
                t_browser.elapsed().as_secs_f64()
            );

            println!("Processing {} identifiers into {}...", ids.len(), out.name());
            let processed = process_identifiers(&mut session, &extract_config, &out, &ids).await;
            let closed = session.quit().await;
            let counts = processed?;
            closed?;
            counts.print();
            Ok(())
        }
        Commands::Extract {
            pages,
            identifier,
            json,
            extract: extract_args,
        } => {
            let extract_config = ExtractConfig::from(&extract_args);
            let (mut snapshot, ids) = load_snapshots(&extract_config, &pages, identifier)?;
            for id in &ids {
                let out = extract::process_identifier(&mut snapshot, &extract_config, id).await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&out.record)?);
                } else {
                    println!("\n{}\n{}", id, format_record(&out.record));
                    if out.fallback_used {
                        println!("  (text-pattern fallback used)");
                    }
                }
            }
            Ok(())
        }
        Commands::Stats { db } => {
            let conn = sink::db::connect(&db)?;
            sink::db::init_schema(&conn)?;
            let s = sink::db::get_stats(&conn)?;
            println!("Records:      {}", s.total);
            println!("Identifiers:  {}", s.identifiers);
            println!("Fallback:     {}", s.fallback_used);
            println!("Timed out:    {}", s.timed_out);
            println!("Load failed:  {}", s.load_failed);
            println!("No address:   {}", s.missing_address);
            println!("No capital:   {}", s.missing_capital);
            println!("No email:     {}", s.missing_email);
            println!("No phone:     {}", s.missing_phone);
            Ok(())
        }
        Commands::Overview { status, limit, db } => {
            let conn = sink::db::connect(&db)?;
            sink::db::init_schema(&conn)?;
            let rows = sink::db::fetch_overview(&conn, status.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No records found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<14} | {:<28} | {:<10} | {:<18} | {:<16} | {:<3} | {:<10}",
                "#", "Identifier", "Name", "Status", "Capital", "Phone", "FB", "Date"
            );
            println!("{}", "-".repeat(120));

            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<14} | {:<28} | {:<10} | {:<18} | {:<16} | {:<3} | {:<10}",
                    i + 1,
                    r.identifier,
                    truncate(&r.legal_name, 28),
                    truncate(&r.status, 10),
                    truncate(&r.capital_social, 18),
                    truncate(&r.phone, 16),
                    if r.fallback_used { "yes" } else { "" },
                    truncate(&r.extracted_at, 10),
                );
            }

            println!("\n{} records", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RunCounts {
    total: usize,
    fallback: usize,
    timeouts: usize,
    load_failures: usize,
}

impl RunCounts {
    fn add(&mut self, extraction: &Extraction) {
        self.total += 1;
        if extraction.fallback_used {
            self.fallback += 1;
        }
        match extraction.readiness {
            Readiness::NotLoaded => self.load_failures += 1,
            Readiness::TimedOut => self.timeouts += 1,
            Readiness::Ready => {}
        }
    }

    fn print(&self) {
        println!(
            "Saved {} records ({} via fallback, {} slow pages, {} failed loads).",
            self.total, self.fallback, self.timeouts, self.load_failures,
        );
    }
}

/// Sequential: one page at a time on the shared session, each record
/// appended before the next identifier starts. A sink error stops the run.
async fn process_identifiers<B: PageBackend>(
    page: &mut B,
    config: &ExtractConfig,
    out: &Sink,
    ids: &[String],
) -> Result<RunCounts> {
    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut counts = RunCounts::default();
    for id in ids {
        info!("Opening {}", config.office_url(id));
        let extraction = extract::process_identifier(page, config, id).await;
        pb.println(format!("\n{}\n{}", id, format_record(&extraction.record)));
        debug!(
            "{}: {} of {} fields unresolved",
            id,
            extraction.record.unresolved_count(),
            HEADER.len()
        );

        out.append(&extraction)
            .await
            .with_context(|| format!("Sink append failed at {}", id))?;
        counts.add(&extraction);
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(counts)
}

/// Saved pages keyed by the office URL of their identifier.
fn load_snapshots(
    config: &ExtractConfig,
    paths: &[PathBuf],
    identifier: Option<String>,
) -> Result<(Snapshot, Vec<String>)> {
    if let Some(id) = identifier {
        anyhow::ensure!(paths.len() == 1, "--identifier takes exactly one page");
        let markup = std::fs::read_to_string(&paths[0])
            .with_context(|| format!("Failed to read {}", paths[0].display()))?;
        return Ok((Snapshot::single(markup), vec![id]));
    }

    let mut pages = HashMap::new();
    let mut ids = Vec::with_capacity(paths.len());
    for path in paths {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("No identifier in file name {}", path.display()))?
            .to_string();
        let markup = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        pages.insert(config.office_url(&id), markup);
        ids.push(id);
    }
    Ok((Snapshot::from_pages(pages), ids))
}

fn format_record(record: &CompanyRecord) -> String {
    HEADER
        .iter()
        .zip(record.to_row())
        .map(|(h, v)| format!("  {:<17} {}", format!("{}:", h), v))
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[tokio::test]
    async fn run_appends_one_row_per_identifier_and_survives_failures() {
        let config = ExtractConfig {
            readiness_timeout: Duration::from_millis(10),
            ..Default::default()
        };
        let ids: Vec<String> = ["47703730000112", "99999999999999", "09117642000140", "21848698000170"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut pages = HashMap::new();
        pages.insert(config.office_url(&ids[0]), fixture("office_complete"));
        pages.insert(config.office_url(&ids[2]), fixture("office_missing_phone"));
        pages.insert(config.office_url(&ids[3]), fixture("office_never_ready"));
        let mut page = Snapshot::from_pages(pages);

        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let out = Sink::Sqlite(conn);
        out.prepare(true).await.unwrap();

        let counts = process_identifiers(&mut page, &config, &out, &ids).await.unwrap();
        assert_eq!(
            counts,
            RunCounts {
                total: 4,
                fallback: 2,
                timeouts: 1,
                load_failures: 1,
            }
        );

        let Sink::Sqlite(conn) = &out else { unreachable!() };
        let stats = sink::db::get_stats(conn).unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.fallback_used, 2);
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.load_failed, 1);
    }

    #[tokio::test]
    async fn sink_failure_stops_the_run() {
        let config = ExtractConfig::default();
        let mut page = Snapshot::single(fixture("office_complete"));
        // No schema: the first insert fails.
        let out = Sink::Sqlite(rusqlite::Connection::open_in_memory().unwrap());
        let ids = vec!["47703730000112".to_string(), "09117642000140".to_string()];
        assert!(process_identifiers(&mut page, &config, &out, &ids).await.is_err());
    }

    #[test]
    fn snapshots_keyed_by_file_stem() {
        let config = ExtractConfig::default();
        let paths = vec![PathBuf::from("tests/fixtures/office_complete.html")];
        let (_, ids) = load_snapshots(&config, &paths, None).unwrap();
        assert_eq!(ids, vec!["office_complete"]);

        let (_, ids) = load_snapshots(&config, &paths, Some("47703730000112".into())).unwrap();
        assert_eq!(ids, vec!["47703730000112"]);

        let two = vec![paths[0].clone(), paths[0].clone()];
        assert!(load_snapshots(&config, &two, Some("1".into())).is_err());
    }

    #[test]
    fn record_report_lists_every_column() {
        let r = CompanyRecord::unresolved("1", "https://cnpja.com/office/1");
        let report = format_record(&r);
        assert_eq!(report.lines().count(), HEADER.len());
        assert!(report.contains("Phone:"));
        assert!(report.ends_with("https://cnpja.com/office/1"));
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate("Acme", 10), "Acme");
        assert_eq!(truncate("Período de Operação", 7), "Período...");
    }
}
