//! Actor configuration
//!
//! Defaults, optionally overlaid by a TOML file and then by `ACTOR_`-prefixed
//! environment variables (`ACTOR_OWNER`, `ACTOR_NAME`, `ACTOR_QUEUE_ALL`).

use crate::context::ContextId;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const ENV_PREFIX: &str = "ACTOR";

/// Settings for one actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Identity this actor serves; envelopes targeted elsewhere are dropped
    pub owner: ContextId,
    /// Label used in logs
    pub name: String,
    /// Queue every inbound request; `false` dispatches immediately unless the
    /// envelope carries `mustQueue`
    pub queue_all: bool,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            owner: ContextId::default(),
            name: "actor".to_string(),
            queue_all: true,
        }
    }
}

impl ActorConfig {
    /// Load from an optional TOML file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading actor config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: ActorConfig = builder
            .build()
            .context("Failed to build actor configuration")?
            .try_deserialize()
            .context("Failed to deserialize actor configuration")?;

        config.validate()?;
        debug!(owner = %config.owner, name = %config.name, queue_all = config.queue_all, "Actor config loaded");
        Ok(config)
    }

    /// Reject settings the actor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Actor name must not be empty");
        }
        Ok(())
    }
}
