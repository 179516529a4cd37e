//! Tandir conversational front-end binary.
//!
//! Long-polls the chat transport for updates and feeds them through the
//! per-identity dispatcher into the conversation state machine.

use std::sync::Arc;
use std::time::Duration;

use tandir_bot::api::ApiGateway;
use tandir_bot::config::BotConfig;
use tandir_bot::conversation::Conversation;
use tandir_bot::dispatcher::Dispatcher;
use tandir_bot::session::SessionStore;
use tandir_bot::transport::telegram::TelegramTransport;

#[tokio::main]
async fn main() {
    let config = BotConfig::from_env().expect("Failed to load configuration");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tandir_bot=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // One HTTP client for everything: gateway calls and transport calls
    // share a connection pool, injected rather than global.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .expect("Failed to build HTTP client");

    let sessions = SessionStore::open(&config.session_database_url)
        .await
        .expect("Failed to open session store");
    tracing::info!("Session store ready");

    let gateway = ApiGateway::new(http.clone(), config.api_base_url.clone(), sessions.clone());

    // The long-poll client must outlive the per-request timeout.
    let poll_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs) + 10))
        .build()
        .expect("Failed to build polling HTTP client");
    let transport = TelegramTransport::new(http, &config.bot_token);
    let poller = TelegramTransport::new(poll_http, &config.bot_token);

    let conversation = Conversation::new(gateway, sessions.clone(), Arc::new(transport));
    let dispatcher = Dispatcher::new(conversation, sessions);

    tracing::info!("bot polling for updates");
    run_poll_loop(&poller, &dispatcher, config.poll_timeout_secs).await;
}

/// Poll updates forever, dispatching each event on its own task so one
/// identity's slow backend call never blocks the others.
async fn run_poll_loop(poller: &TelegramTransport, dispatcher: &Dispatcher, timeout_secs: u16) {
    let mut offset = 0_i64;

    loop {
        match poller.poll_updates(offset, timeout_secs).await {
            Ok((events, next_offset)) => {
                offset = next_offset;
                for (identity, event) in events {
                    let dispatcher = dispatcher.clone();
                    tokio::spawn(async move {
                        dispatcher.dispatch(identity, event).await;
                    });
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "poll failed, backing off");
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
        }
    }
}
