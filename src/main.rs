use anyhow::{Context, Result};
use clap::Parser;
use schemalens::cli::commands::inspect::{InspectCommand, InspectCommandHandler};
use schemalens::cli::{Cli, Commands};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する
///
/// RUST_LOG が設定されていればそれを優先し、未設定なら warn（--verbose 時は debug）。
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // プロジェクトのルートパスを取得
    let project_path = env::current_dir().context("Failed to resolve current directory")?;

    match cli.command {
        Commands::Inspect {
            source,
            tables,
            exclude_tables,
            keep_join_tables,
            timeout,
        } => {
            let handler = InspectCommandHandler::new();
            let command = InspectCommand {
                project_path,
                config_path: cli.config,
                source,
                tables,
                exclude_tables,
                keep_join_tables,
                timeout,
                format: cli.format,
            };
            handler.execute(&command).await
        }
    }
}
