use std::path::PathBuf;

use engine::Store;
use telegram_bot::AccessPolicy;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "urok={level},telegram_bot={level},engine={level}",
            level = settings.log_level
        ))
        .init();

    let store_file = PathBuf::from(&settings.store_path)
        .join(format!("{}.json", settings.store_name));
    tracing::info!(path = %store_file.display(), "Opening entity store...");
    let store = Store::open(store_file)?;

    let policy = AccessPolicy::new(settings.admin_operators(), settings.allowed_operators());
    let engine = engine::Engine::builder()
        .store(store)
        .allowed_operators(policy.operators())
        .build();

    let bot = telegram_bot::Bot::builder()
        .token(&settings.bot_token)
        .policy(policy)
        .engine(engine)
        .build()?;

    bot.run().await;

    Ok(())
}
