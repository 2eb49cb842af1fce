use anyhow::Result;
use clap::Parser;
use market_brief::cli::Args;
use market_brief::launch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.into_config()?;

    let default_directive = if config.verbose {
        "market_brief=debug"
    } else {
        "market_brief=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = launch(&config, &args.industry).await {
        eprintln!("❌ 生成报告时发生错误: {}", e);
        eprintln!("{:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
