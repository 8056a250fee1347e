use anyhow::Context;
use clap::Parser;
use coldmail::app::{build_pipeline, console, open_portfolio_index};
use coldmail::config::toml_config::TomlConfig;
use coldmail::domain::ports::{ConfigProvider, VectorIndex};
use coldmail::utils::{logger, validation::Validate};
use coldmail::OutreachEngine;

#[derive(Parser)]
#[command(name = "toml-coldmail")]
#[command(about = "Cold email generator with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "coldmail.toml")]
    config: String,

    /// Job page URL, overrides [job].url from the config
    #[arg(long)]
    url: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Dry run - show the configuration and index state without calling any model
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    if args.json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based cold email tool");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 命令列網址優先於設定檔
    let url = args.url.clone().or_else(|| config.job_url().map(String::from));

    if !args.json {
        display_config_summary(&config, url.as_deref(), &args);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No model calls will be made");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let url = match config.resolve_job_url(args.url.as_deref()) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Pass --url or set [job].url in {}", args.config);
            std::process::exit(1);
        }
    };

    let pipeline = match build_pipeline(&config).await {
        Ok(pipeline) => pipeline,
        Err(e) => std::process::exit(console::report_failure("Setup", &e)),
    };
    let engine = OutreachEngine::new(pipeline);

    match engine.run(&url).await {
        Ok(outcome) => {
            if args.json {
                let report = serde_json::to_string_pretty(&outcome)
                    .context("serializing run report")?;
                println!("{}", report);
            } else {
                println!("{}", console::render_outcome(&outcome));
            }
        }
        Err(e) => {
            let exit_code = console::report_failure("Cold email run", &e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, url: Option<&str>, args: &Args) {
    let models = config.models();

    println!("📋 Configuration Summary:");
    println!("  Job URL: {}", url.unwrap_or("(not set)"));
    println!("  API: {}", config.api_base_url());
    println!("  Models: {} (fallback: {})", models.primary, models.fallback);
    println!("  Temperature: {}", config.temperature());
    println!("  Portfolio: {}", config.portfolio_path());
    println!(
        "  Vector store: {} (collection '{}')",
        config.vectorstore_path(),
        config.collection_name()
    );
    println!("  Neighbors per skill: {}", config.neighbors_per_skill());
    if config.save_email() {
        println!("  Output: {}", config.output_path());
    } else {
        println!("  Output: (not saved)");
    }
    println!("  Sender: {}", config.profile().name);

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    // 作品集來源
    println!("📚 Portfolio:");
    let portfolio_exists = std::path::Path::new(config.portfolio_path()).exists();
    println!(
        "  CSV: {} ({})",
        config.portfolio_path(),
        if portfolio_exists { "found" } else { "missing" }
    );

    // 索引狀態
    let index = open_portfolio_index(config)
        .await
        .context("opening the portfolio index")?;
    let count = index.count().await?;
    if count > 0 {
        println!("  Index: {} entries, population will be skipped", count);
    } else {
        println!("  Index: empty, will be populated from the CSV on the first run");
    }

    println!();
    println!("📧 Sender profile block:");
    for line in config.profile().render_block().lines() {
        println!("  {}", line);
    }

    println!();
    println!("✅ Dry run completed. Remove --dry-run to generate the email.");
    Ok(())
}
