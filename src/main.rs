use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jusou_bot::bot::Bot;
use jusou_bot::catalog::{CatalogStore, JsonCatalogSource};
use jusou_bot::config;
use jusou_bot::error::SendError;
use jusou_bot::message::OutboundChannel;

/// Console outbound channel - prints replies to stdout / 控制台发送通道
///
/// Thin demo glue: a real deployment plugs a chat-client adapter in here.
struct ConsoleChannel;

#[async_trait]
impl OutboundChannel for ConsoleChannel {
    async fn send(&self, text: &str, channel_id: &str) -> Result<(), SendError> {
        println!("[{}]\n{}\n", channel_id, text);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jusou_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config();
    config::init_config(app_config.clone());

    let store = Arc::new(CatalogStore::new());
    let source = Arc::new(JsonCatalogSource::new(&app_config.data_source.catalog_file));

    // 首次加载失败不致命：以空目录启动，可发送「重新加载」修复后重试
    match store.reload(source.as_ref()) {
        Ok(count) => tracing::info!("目录加载完成，共 {} 条", count),
        Err(e) => tracing::error!("目录加载失败，以空目录启动: {}", e),
    }

    let bot = Arc::new(Bot::new(
        &app_config,
        store,
        source,
        Arc::new(ConsoleChannel),
        None,
    ));

    println!("{}\n", bot.welcome());
    tracing::info!("控制台模式就绪，每行输入视为一条私聊消息");

    // Console mode: one line = one private message / 控制台模式
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        bot.handle(&line, "console-user", "console", false).await;
    }

    Ok(())
}
