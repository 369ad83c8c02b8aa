//! Market data client example.
//!
//! Connects to a FIX 4.4 broker, subscribes to a symbol and prints every
//! snapshot until interrupted. Endpoint and identities come from the
//! environment:
//!
//! ```text
//! FIX_HOST=127.0.0.1 FIX_PORT=9876 FIX_SENDER=CLIENT FIX_TARGET=BROKER \
//!     cargo run --example market_data_client
//! ```

use async_trait::async_trait;
use fixwire::prelude::*;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

struct MarketDataHandler;

#[async_trait]
impl SessionHandler for MarketDataHandler {
    async fn on_logon(&self, key: SessionKey, _config: Arc<SessionConfig>) {
        info!(session = %key, "logged on");
    }

    async fn on_app_message(
        &self,
        key: SessionKey,
        message: InboundMessage,
        _config: Arc<SessionConfig>,
    ) {
        info!(
            session = %key,
            msg_type = %message.msg_type(),
            symbol = message.field_str(55).unwrap_or("?"),
            frame = %display_frame(message.raw()),
            "market data",
        );
    }

    async fn on_session_message(
        &self,
        key: SessionKey,
        message: InboundMessage,
        _config: Arc<SessionConfig>,
    ) {
        warn!(
            session = %key,
            msg_type = %message.msg_type(),
            seq_num = message.seq_num(),
            "session event, leaving recovery to the broker",
        );
    }

    async fn on_logout(&self, key: SessionKey, reason: DisconnectReason, _config: Arc<SessionConfig>) {
        info!(session = %key, ?reason, "logged out");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let host = env::var("FIX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("FIX_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(9876);
    let sender = env::var("FIX_SENDER").unwrap_or_else(|_| "CLIENT".to_string());
    let target = env::var("FIX_TARGET").unwrap_or_else(|_| "BROKER".to_string());
    let symbol = env::var("FIX_SYMBOL").unwrap_or_else(|_| "BTC-USD".to_string());

    let key = SessionKey::new("md").expect("key fits");
    let config = SessionConfig::new(
        key.clone(),
        host,
        port,
        CompId::new(&sender).expect("sender comp id fits"),
        CompId::new(&target).expect("target comp id fits"),
    )
    .with_heartbeat_interval(Duration::from_secs(30));

    start_session(config, Arc::new(MarketDataHandler))?;

    // Give the handshake a moment, then subscribe.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let mut request = OutboundMessage::new(MsgType::MarketDataRequest);
    request.set_field(262, "md-req-1");
    request.set_field(263, "1"); // snapshot + updates
    request.set_field(264, "1"); // top of book
    request.set_field(146, "1");
    request.set_field(55, symbol);
    request.set_field(267, "2");
    request.set_field(269, "0"); // bid
    request.set_field(269, "1"); // offer

    match send_message(&key, request).await {
        Ok(written) => info!(frame = %written, "subscribed"),
        Err(err) => warn!(error = %err, "subscribe failed"),
    }

    tokio::signal::ctrl_c().await.expect("ctrl-c handler");
    stop_session(&key).await?;
    Ok(())
}
