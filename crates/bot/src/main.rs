use std::sync::Arc;

use anyhow::Context;

use storefront_bot::Manager;
use storefront_chat::{Author, ConsoleTransport};
use storefront_core::{ChannelId, GuildId, RoleId, SystemClock, UserId};
use storefront_infra::{JsonFileSettingsStore, StorefrontConfig};

/// The single local operator every console line is attributed to.
struct ConsoleOperator {
    guild: GuildId,
    channel: ChannelId,
    author: Author,
}

impl ConsoleOperator {
    fn from_env() -> anyhow::Result<Self> {
        let id = |var: &str, default: u64| -> anyhow::Result<u64> {
            match std::env::var(var) {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{var} must be a numeric id, got {raw:?}")),
                Err(_) => Ok(default),
            }
        };

        let mut author = Author::new(UserId::new(id("STOREFRONT_CONSOLE_USER", 1)?), "console");
        author.administrator = std::env::var("STOREFRONT_CONSOLE_ADMIN")
            .map(|raw| !matches!(raw.trim(), "0" | "false" | "no"))
            .unwrap_or(true);
        if let Ok(roles) = std::env::var("STOREFRONT_CONSOLE_ROLES") {
            author.roles = roles
                .split(',')
                .filter(|r| !r.trim().is_empty())
                .map(|r| r.trim().parse::<RoleId>())
                .collect::<Result<_, _>>()
                .context("STOREFRONT_CONSOLE_ROLES must be comma separated role ids")?;
        }

        Ok(Self {
            guild: GuildId::new(id("STOREFRONT_CONSOLE_GUILD", 1)?),
            channel: ChannelId::new(id("STOREFRONT_CONSOLE_CHANNEL", 1)?),
            author,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let config = StorefrontConfig::from_env()?;
    let operator = ConsoleOperator::from_env()?;
    let store = JsonFileSettingsStore::open_in(&config.data_dir)
        .with_context(|| format!("failed to open settings in {}", config.data_dir.display()))?;
    tracing::info!(path = %store.path().display(), "settings store opened");

    let transport = Arc::new(ConsoleTransport::new());
    let manager = Arc::new(Manager::new(
        Arc::new(store),
        transport.clone(),
        Arc::new(SystemClock),
        config,
    ));
    let listener = tokio::spawn(manager.run());

    transport
        .read_stdin(operator.guild, operator.channel, operator.author)
        .await
        .context("failed to read console input")?;

    // Let commands still waiting on a reply finish before exiting.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    listener.abort();
    Ok(())
}
