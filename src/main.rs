use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use record_validator::{cli, client, config, error, report, review, session};
use cli::{Cli, Commands};
use client::{HttpValidationClient, RunOptions, ValidationClient};
use config::Config;
use error::Result;
use report::{default_output_path, summary_lines, SessionReport};
use session::Session;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Validate { input, rag, output } => {
            println!("📋 record-validator - 検証\n");

            let mut session = Session::new();
            upload_file(&mut session, &input)?;

            let client = HttpValidationClient::from_config(&config)?;
            let options = RunOptions::from_config(&config, rag);
            run_with_spinner(&mut session, &client, options).await?;

            print_summary(&session);
            let output = output.unwrap_or_else(|| default_output_path(&input));
            save_report(&session, &output)?;

            println!("\n✅ 検証完了");
        }

        Commands::Demo { rag, output } => {
            println!("🧪 record-validator - デモ\n");

            let mut session = Session::new();
            let count = session.load_demo(&config.demo_path)?;
            println!("✔ デモデータ {}件を読み込み: {}\n", count, config.demo_path.display());

            let client = HttpValidationClient::from_config(&config)?;
            let options = RunOptions::from_config(&config, rag);
            run_with_spinner(&mut session, &client, options).await?;

            print_summary(&session);
            let output = output.unwrap_or_else(|| PathBuf::from("demo.result.json"));
            save_report(&session, &output)?;

            println!("\n✅ 完了");
        }

        Commands::Review { input, rag, output } => {
            println!("🔍 record-validator - レビュー\n");

            let mut session = Session::new();
            upload_file(&mut session, &input)?;

            let client = HttpValidationClient::from_config(&config)?;
            let options = RunOptions::from_config(&config, rag);
            run_with_spinner(&mut session, &client, options.clone()).await?;

            review::run_interactive_review(&mut session, &client, &options).await?;

            let output = output.unwrap_or_else(|| default_output_path(&input));
            save_report(&session, &output)?;

            println!("\n✅ レビュー完了");
        }

        Commands::Config { set_api_url, show } => {
            let mut config = config;

            if let Some(url) = set_api_url {
                config.set_api_url(url)?;
                println!("✔ APIのURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  API URL: {}", config.api_url().unwrap_or_else(|_| "未設定".into()));
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  temperature: {}", config.temperature);
                println!("  source: {}", config.source);
                println!("  デモデータ: {}", config.demo_path.display());
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "record_validator=debug"
    } else {
        "record_validator=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn upload_file(session: &mut Session, input: &Path) -> Result<()> {
    println!("[1/2] レコードを読み込み中...");
    let content = std::fs::read_to_string(input)?;
    let count = session.upload_text(&content)?;
    println!("✔ {}件のレコードを検出\n", count);
    Ok(())
}

async fn run_with_spinner(
    session: &mut Session,
    client: &dyn ValidationClient,
    options: RunOptions,
) -> Result<()> {
    if session.records().is_empty() {
        println!("レコードがありません。JSON配列をアップロードしてください");
        return Ok(());
    }

    println!(
        "[2/2] AI検証中...{}",
        if options.use_augmented_context { " (Expert Mode)" } else { "" }
    );

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        spinner.set_style(style);
    }
    spinner.set_message("Validating...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = session.run_validation(client, options).await;
    spinner.finish_and_clear();
    outcome?;

    println!("✔ {}件の検証完了（{}）\n", session.items().len(), session.key_source());
    Ok(())
}

fn print_summary(session: &Session) {
    println!("Analysis:");
    for line in summary_lines(&session.summary()) {
        println!("  {}", line);
    }
}

fn save_report(session: &Session, output: &Path) -> Result<()> {
    SessionReport::from_session(session).save(output)?;
    println!("✔ 結果を保存: {}", output.display());
    Ok(())
}
