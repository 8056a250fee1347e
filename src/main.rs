use clap::Parser;
use coldmail::app::{build_pipeline, console};
use coldmail::domain::model::RunOutcome;
use coldmail::domain::ports::ConfigProvider;
use coldmail::utils::{logger, validation::Validate};
use coldmail::{CliConfig, OutreachEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting coldmail CLI");
    if config.verbose {
        tracing::debug!(
            "Models: {:?}, portfolio: {}, vectorstore: {}/{}",
            config.models(),
            config.portfolio,
            config.vectorstore,
            config.collection
        );
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let pipeline = match build_pipeline(&config).await {
        Ok(pipeline) => pipeline,
        Err(e) => std::process::exit(console::report_failure("Setup", &e)),
    };
    let engine = OutreachEngine::new(pipeline);

    match engine.run(&config.job_url).await {
        Ok(outcome) => {
            if config.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", console::render_outcome(&outcome));
            }

            if let RunOutcome::Completed(_) = outcome {
                tracing::info!("✅ Cold email generated successfully!");
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
