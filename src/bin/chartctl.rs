use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commit_chart::commits::collect_last_week;
use commit_chart::{Config, JobOrchestrator, Provenance};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chartctl", about = "CLI for the commit chart service", version)]
struct Cli {
    /// Override FUSIONBRAIN_URL
    #[arg(global = true, long)]
    fusionbrain_url: Option<String>,

    /// Override REPO_PATH
    #[arg(global = true, long, value_name = "PATH")]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check FusionBrain availability and show the pipeline that would be used
    Status,
    /// Print the prompt composed from the repository's last week
    Prompt,
    /// Build the chart and write it to disk
    Build {
        /// Output path (defaults to <CHART_OUT_DIR>/commit_chart.png)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    Config::dotenv_load();
    let cli = Cli::parse();

    let mut conf = Config::new()?;
    if let Some(url) = cli.fusionbrain_url {
        conf.fusionbrain_url = url;
    }
    if let Some(repo) = cli.repo {
        conf.repo_path = repo;
    }
    let orchestrator = JobOrchestrator::from_config(&conf);

    let outcome = match cli.command {
        Commands::Status => status(&orchestrator).await,
        Commands::Prompt => prompt(&orchestrator, &conf).await,
        Commands::Build { out } => build(&orchestrator, &conf, out.unwrap_or_else(|| conf.png_path())).await,
    };
    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(if e.is_retryable() { 75 } else { 1 });
    }
    Ok(())
}

async fn status(orchestrator: &JobOrchestrator) -> commit_chart::AppResult<()> {
    let client = orchestrator.client();
    client.check_availability().await?;
    let pipeline = client.resolve_pipeline().await?;
    println!("FusionBrain at {} is available", client.base_url());
    println!("pipeline: {}", pipeline);
    println!("prompt refiner: {}", orchestrator.composer().refiner_name());
    Ok(())
}

async fn prompt(orchestrator: &JobOrchestrator, conf: &Config) -> commit_chart::AppResult<()> {
    let week = collect_last_week(&conf.repo_path).await?;
    let prompt = orchestrator.composer().compose(&week).await;
    let source = match prompt.provenance {
        Provenance::Deterministic => "deterministic",
        Provenance::LlmComposed => "llm",
    };
    eprintln!("[{}]", source);
    println!("{}", prompt.text);
    Ok(())
}

async fn build(orchestrator: &JobOrchestrator, conf: &Config, out: PathBuf) -> commit_chart::AppResult<()> {
    let week = collect_last_week(&conf.repo_path).await?;
    for day in &week {
        eprintln!("{} {}", day.date, day.count);
    }
    let bytes = orchestrator.produce_image(&week).await?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&out, &bytes).await?;
    println!("Saved {} ({} bytes)", out.display(), bytes.len());
    Ok(())
}
