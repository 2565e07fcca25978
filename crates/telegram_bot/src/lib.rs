//! Telegram transport for the tutoring tracker.
//!
//! The bot owns the conversation engine (per-operator flow state), input
//! parsing and rendering; every domain decision is delegated to the
//! [`engine`] crate.

use teloxide::prelude::*;

pub use access::AccessPolicy;
pub use commands::Command;

mod access;
mod commands;
mod flow;
mod handlers;
mod parsing;
mod state;
mod ui;

#[derive(Clone)]
pub struct ConfigParameters {
    pub(crate) policy: AccessPolicy,
    pub(crate) engine: engine::Engine,
    pub(crate) sessions: state::SessionStore,
}

pub struct Bot {
    token: String,
    policy: AccessPolicy,
    engine: engine::Engine,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        let parameters = ConfigParameters {
            policy: self.policy.clone(),
            engine: self.engine.clone(),
            sessions: state::SessionStore::default(),
        };

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(handlers::handle_command),
            )
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    policy: AccessPolicy,
    engine: Option<engine::Engine>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn policy(mut self, policy: AccessPolicy) -> BotBuilder {
        self.policy = policy;
        self
    }

    pub fn engine(mut self, engine: engine::Engine) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.trim().is_empty() {
            return Err("bot token must not be empty".to_string());
        }
        let engine = self
            .engine
            .ok_or_else(|| "engine is required".to_string())?;
        Ok(Bot {
            token: self.token,
            policy: self.policy,
            engine,
        })
    }
}
