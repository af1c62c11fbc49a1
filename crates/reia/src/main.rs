use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reia_client::CompletionClient;
use reia_models::config::ReiaConfig;
use reia_models::property::{demo_portfolio, Property};
use reia_models::report::AnalysisReport;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/reia.toml";

#[derive(Parser, Debug)]
#[command(name = "reia", about = "Real Estate Investment Analyzer")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank and score a set of properties
    Analyze {
        /// Read a JSON array of properties from a file instead of stdin
        #[arg(short, long, conflicts_with = "demo")]
        input: Option<PathBuf>,

        /// Analyze the built-in four-property demo portfolio
        #[arg(long)]
        demo: bool,

        /// Skip the completion service and use rule-based scoring only
        #[arg(long)]
        no_ai: bool,

        /// Where to write the analysis report (overrides the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
    /// List the models the completion service offers
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => reia::load_config(path, true)?,
        None => reia::load_config(Path::new(DEFAULT_CONFIG), false)?,
    };

    match cli.command {
        Command::Analyze {
            input,
            demo,
            no_ai,
            output,
            json,
        } => run_analyze(config, input, demo, no_ai, output, json).await,
        Command::Config => show_config(&config),
        Command::Models => list_models(&config).await,
    }
}

async fn run_analyze(
    mut config: ReiaConfig,
    input: Option<PathBuf>,
    demo: bool,
    no_ai: bool,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    if no_ai {
        config.analysis.ai_enabled = false;
    }

    let properties = if demo {
        demo_portfolio()
    } else {
        read_properties(input.as_deref())?
    };

    let mut engine = reia::build_engine(&config);
    let report = reia::analyze(&mut engine, &properties)
        .await
        .context("Analysis failed")?;

    let path = output.unwrap_or_else(|| config.output.analysis_path());
    reia::engine::write_report(&report, &path)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
        println!("\nReport written to {}", path.display());
    }
    Ok(())
}

fn read_properties(input: Option<&Path>) -> Result<Vec<Property>> {
    let properties_json = if let Some(input_path) = input {
        std::fs::read_to_string(input_path)
            .with_context(|| format!("Failed to read input: {}", input_path.display()))?
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    };

    serde_json::from_str(&properties_json).context("Failed to parse property list JSON")
}

fn print_table(report: &AnalysisReport) {
    println!(
        "{:<4} {:<10} {:<28} {:>12} {:>8} {:>6} {:<7} RECOMMENDATION",
        "RANK", "ID", "ADDRESS", "NOI", "CAP", "SCORE", "RISK"
    );
    for entry in &report.analysis_results {
        println!(
            "{:<4} {:<10} {:<28} {:>12.2} {:>7.2}% {:>6.1} {:<7} {}",
            entry.rank,
            entry.property_id,
            truncate(&entry.address, 28),
            entry.noi,
            entry.cap_rate,
            entry.score,
            entry.risk_level.as_str(),
            entry.recommendation
        );
    }

    let summary = &report.summary;
    println!();
    println!("Properties:       {}", report.total_properties);
    println!("Total investment: {:.2}", summary.total_investment);
    println!("Total NOI:        {:.2}", summary.total_noi);
    println!(
        "Cap rate:         best {:.2}%, average {:.2}%",
        summary.best_cap_rate, summary.average_cap_rate
    );
    println!("Average score:    {:.1}", summary.average_score);
    if let Some(top) = &summary.top_recommendation {
        println!("Top pick:         {top}");
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn show_config(config: &ReiaConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    println!("{rendered}");

    let key_status = match config.api.api_key() {
        Some(key) => reia::mask_secret(&key),
        None => "(not set, rule-based scoring only)".to_string(),
    };
    println!("# {} = {}", config.api.api_key_env, key_status);
    Ok(())
}

async fn list_models(config: &ReiaConfig) -> Result<()> {
    let mut client =
        CompletionClient::from_config(config).context("Failed to build completion client")?;

    let available = client.available_models().await.to_vec();
    let selected = client.selector().and_then(|s| s.select_best());
    print!(
        "{}",
        reia::render_model_listing(
            &available,
            &config.api.preferred_models,
            client.catalog_is_fallback(),
            selected.as_deref(),
        )
    );
    Ok(())
}
