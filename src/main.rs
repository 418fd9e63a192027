use anyhow::Result;
use clap::Parser;
use tarot_ai::{config::Config, web::serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tarot-ai")]
#[command(about = "Tarot card image classification service")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: String,

    /// ONNX model artifact path
    #[arg(long, default_value = "model/model.onnx")]
    model_path: String,

    /// Label vocabulary file, one card name per line
    #[arg(long)]
    labels: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level))
        )
        .with_target(false)
        .init();

    tracing::info!("Starting Tarot AI service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model path: {}", args.model_path);

    let config = Config::new(args.bind, args.model_path, args.labels, args.dev)?;

    serve(config).await?;

    Ok(())
}
