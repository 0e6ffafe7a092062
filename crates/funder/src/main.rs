use anyhow::Result;
use captx::OwnershipProvider;
use clap::Parser;
use funder::{command, config};
use indexer::WalletRpc;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{self},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // TIPS: guard must have same long lifetime with main
    let _guard = logger_init();

    let args = config::Cli::parse();
    let cfg = config::load_config(&args.config)?;
    let draft = command::read_draft(args.command.draft_path())?;

    let wallet = Arc::new(WalletRpc::new(&cfg.rpc.url));
    let provider = OwnershipProvider::shared(wallet);

    info!("Start funder against {} ...", cfg.rpc.url);
    match command::execute(&provider, &cfg.fee, &args.command, &draft).await {
        Ok(funded) => {
            println!("{}", serde_json::to_string_pretty(&funded)?);
            Ok(())
        }
        Err(e) => {
            error!("funding failed: {:#}", e);
            Err(e)
        }
    }
}

fn logger_init() -> WorkerGuard {
    // stdout carries the funded draft, logs go to stderr
    let formatting_layer = fmt::layer().pretty().with_writer(std::io::stderr);
    let file_appender = RollingFileAppender::new(Rotation::HOURLY, "logs/funder", "funder.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG)
        .boxed();

    Registry::default()
        .with(formatting_layer)
        .with(file_layer)
        .with(EnvFilter::from_default_env())
        .init();

    guard
}
