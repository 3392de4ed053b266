use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttplayer_lyrics_rs::config::Config;
use ttplayer_lyrics_rs::lyrics::setup_lyrics_manager;
use ttplayer_lyrics_rs::server::{create_router, AppContext};

#[derive(Parser, Debug)]
#[command(name = "ttplayer-lyrics-rs")]
#[command(about = "TTPlayer 歌词协议代理服务器")]
#[command(version)]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 监听端口，覆盖配置文件中的设置
    #[arg(short, long, env = "TTPLAYER_LYRICS_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttplayer_lyrics_rs=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config::load(args.config).context("加载配置失败")?;
    let port = args.port.unwrap_or(config.port);

    let manager = Arc::new(setup_lyrics_manager(&config));
    let app = create_router(AppContext { manager });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("歌词服务器监听于 {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("无法绑定端口 {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("收到终止信号，正在退出");
        })
        .await
        .context("HTTP 服务器异常退出")?;

    Ok(())
}
