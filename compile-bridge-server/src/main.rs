use clap::Parser;
use compile_bridge::{BridgeConfig, ToolchainConfig};
use compile_bridge_server::{create_app, run_server};
use std::{net::IpAddr, net::SocketAddr, path::PathBuf, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8081")]
    port: u16,

    /// Kotlin compiler executable
    #[arg(long, env = "KOTLINC_PATH", default_value = "kotlinc")]
    kotlinc: String,

    /// Java launcher executable
    #[arg(long, env = "JAVA_PATH", default_value = "java")]
    java: String,

    /// Directory for generated source and jar files
    #[arg(long, env = "COMPILE_BRIDGE_BASE_DIR", default_value = ".")]
    base_dir: PathBuf,

    /// Compiler time limit in seconds (0 disables it)
    #[arg(long, default_value = "120")]
    compile_timeout: u64,

    /// Program time limit in seconds (0 disables it)
    #[arg(long, default_value = "30")]
    run_timeout: u64,

    /// Maximum number of concurrent compile-and-run requests
    #[arg(short, long, default_value = "10")]
    max_concurrent: usize,
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let toolchain = ToolchainConfig::kotlin()
        .with_compiler(args.kotlinc)
        .with_runtime(args.java);
    let config = BridgeConfig::new(args.base_dir)
        .with_toolchain(toolchain)
        .with_timeouts(seconds(args.compile_timeout), seconds(args.run_timeout))
        .with_max_concurrent(args.max_concurrent);

    let app = create_app(config)?;
    run_server(app, SocketAddr::new(args.host, args.port)).await?;

    Ok(())
}
