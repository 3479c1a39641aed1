use clap::Parser;
use issue_triage::config::cli::{Cli, Command};
use issue_triage::utils::error::{ErrorCategory, TriageError};
use issue_triage::utils::{logger, validation::Validate};
use issue_triage::{GitHubConfig, GitHubRetriever, TriageEngine};

fn exit_code(e: &TriageError) -> i32 {
    match e.category() {
        ErrorCategory::Input | ErrorCategory::Configuration | ErrorCategory::Auth => 1,
        ErrorCategory::Upstream => 2,
        ErrorCategory::Internal => 3,
    }
}

fn fail(e: TriageError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    eprintln!("❌ {}", e);
    std::process::exit(exit_code(&e));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            // 初始化日誌
            if args.json_logs {
                logger::init_json_logger(cli.verbose);
            } else {
                logger::init_cli_logger(cli.verbose);
            }
            tracing::info!("Starting issue-triage server");

            let config = args.resolve().unwrap_or_else(|e| fail(e));
            if cli.verbose {
                tracing::debug!("Service config: {:?}", config);
            }

            // 驗證配置
            if let Err(e) = config.validate() {
                tracing::error!("❌ Configuration validation failed: {}", e);
                fail(e);
            }

            if let Err(e) = issue_triage::serve(config).await {
                fail(e);
            }
        }
        Command::Analyze(args) => {
            logger::init_cli_logger(cli.verbose);

            let github = GitHubConfig::from(args.github);
            if let Err(e) = github.validate() {
                fail(e);
            }

            let retriever = GitHubRetriever::new(&github).unwrap_or_else(|e| fail(e));
            let engine = TriageEngine::new(retriever);

            match engine.run(&args.repo_url, args.issue_number).await {
                Ok(verdict) => {
                    println!("{}", serde_json::to_string_pretty(&verdict)?);
                }
                Err(e) => fail(e),
            }
        }
    }

    Ok(())
}
