use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use dog_rates_wrangler::app::analyze_use_case::AnalyzeUseCase;
use dog_rates_wrangler::app::assess_use_case::AssessUseCase;
use dog_rates_wrangler::app::clean_use_case::CleanUseCase;
use dog_rates_wrangler::config::Config;
use dog_rates_wrangler::infra::{CsvOutputAdapter, ReqwestFetcher};
use dog_rates_wrangler::observability::init_logging;
use dog_rates_wrangler::pipeline::processing::quality_gate::{QualityDecision, QualitySeverity};

#[derive(Parser)]
#[command(name = "wrangle")]
#[command(about = "Gather, clean and merge the WeRateDogs tweet archive")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to ./wrangle.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the rolling JSON log
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and persist the cleaned table
    Clean {
        /// Override the archive source (path or URL)
        #[arg(long)]
        archive: Option<String>,
        /// Override the image predictions source (path or URL)
        #[arg(long)]
        predictions: Option<String>,
        /// Override the engagement metrics source (path or URL)
        #[arg(long)]
        metrics: Option<String>,
        /// Override the output path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load the sources and report their quality issues
    Assess {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize a persisted cleaned table
    Analyze {
        /// Cleaned table to read (defaults to the configured output path)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.log_dir {
        config.logging.dir = dir;
    }

    let _guard = init_logging(&config.logging.dir);

    let result = run(cli.command, config).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run(command: Commands, mut config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Clean {
            archive,
            predictions,
            metrics,
            output,
        } => {
            if let Some(archive) = archive {
                config.sources.archive = archive;
            }
            if let Some(predictions) = predictions {
                config.sources.predictions = predictions;
            }
            if let Some(metrics) = metrics {
                config.sources.metrics = metrics;
            }
            if let Some(output) = output {
                config.output.path = output;
            }

            let fetcher = ReqwestFetcher::new(Duration::from_secs(config.fetch.timeout_seconds))?;
            let use_case = CleanUseCase::new(
                Box::new(fetcher),
                Box::new(CsvOutputAdapter::new(&config.output.path)),
            );

            info!("Starting clean run");
            let summary = use_case.run(&config.source_set()).await?;

            println!("\n📊 Clean run results:");
            println!("   Archive rows: {}", summary.archive_rows);
            println!("   Image predictions: {}", summary.prediction_rows);
            println!("   Metrics lines: {}", summary.metrics_rows);
            println!("   Cleaned rows: {}", summary.cleaned_rows);
            println!("   Columns: {}", summary.columns.join(", "));
            println!("   Output file: {}", summary.receipt.path);
            println!("   SHA-256: {}", summary.receipt.sha256);
            println!("   Duration: {:.2}s", summary.duration_secs);
        }
        Commands::Assess { json } => {
            let fetcher = ReqwestFetcher::new(Duration::from_secs(config.fetch.timeout_seconds))?;
            let use_case = AssessUseCase::with_default_quality_gate(Box::new(fetcher));
            let report = use_case.assess(&config.source_set()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n🔍 Source assessment: {:?}", report.decision);
                println!(
                    "   Rows: {} archive, {} predictions, {} metrics",
                    report.archive_rows, report.prediction_rows, report.metrics_rows
                );
                let counts = report.severity_counts();
                println!(
                    "   Issues: {} critical, {} error, {} warning, {} info",
                    counts.get(&QualitySeverity::Critical).unwrap_or(&0),
                    counts.get(&QualitySeverity::Error).unwrap_or(&0),
                    counts.get(&QualitySeverity::Warning).unwrap_or(&0),
                    counts.get(&QualitySeverity::Info).unwrap_or(&0)
                );
                for issue in &report.issues {
                    println!(
                        "   [{:?}] {} {}: {} ({} rows, e.g. {:?})",
                        issue.severity,
                        issue.table,
                        issue.field.as_deref().unwrap_or("-"),
                        issue.description,
                        issue.count,
                        issue.examples
                    );
                }
            }

            if report.decision == QualityDecision::Blocked {
                anyhow::bail!("sources are blocked by {} quality issues", report.issues.len());
            }
        }
        Commands::Analyze { input } => {
            let input = input.unwrap_or(config.output.path);
            let summary = AnalyzeUseCase::new(input).analyze().await?;

            println!("\n📈 Analysis of {} rows", summary.rows);
            println!("   Sources:");
            for share in &summary.source_share {
                println!("     {:<24} {:>6} ({:.1}%)", share.source, share.count, share.percent);
            }
            println!("   Ratings (% of denominator):");
            for bucket in &summary.rating_distribution {
                println!("     {:>6.1}% {:>6}", bucket.percent, bucket.count);
            }
            match summary.engagement_correlation {
                Some(r) => println!("   Retweet/favorite correlation: {:.3}", r),
                None => println!("   Retweet/favorite correlation: undefined"),
            }
        }
    }

    Ok(())
}
