//! Process configuration, read once from the environment at startup.

use anyhow::{anyhow, Context, Result};
use api_client::{timeout_from_env_value, ClientConfig};
use api_shared::UserId;
use pims_core::Actor;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct Settings {
    pub client: ClientConfig,
    actor: Option<Actor>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from `get`, which maps a variable name to its value.
    ///
    /// `PIMS_API_TOKEN` is required. The actor is optional here because read-only commands do
    /// not need one; [`Settings::actor`] enforces it where records are created.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = get("PIMS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token = get("PIMS_API_TOKEN").unwrap_or_default();
        let timeout = timeout_from_env_value(get("PIMS_API_TIMEOUT_SECS"))?;
        let client = ClientConfig::new(base_url, token, timeout)?;

        let actor = match (get("PIMS_ACTOR_ID"), get("PIMS_ACTOR_NAME")) {
            (Some(id), Some(name)) => {
                let id: UserId = id
                    .parse()
                    .with_context(|| format!("PIMS_ACTOR_ID must be a user id, got {id:?}"))?;
                Some(Actor::new(id, name).context("PIMS_ACTOR_NAME cannot be empty")?)
            }
            _ => None,
        };

        Ok(Self { client, actor })
    }

    pub fn actor(&self) -> Result<&Actor> {
        self.actor.as_ref().ok_or_else(|| {
            anyhow!("PIMS_ACTOR_ID and PIMS_ACTOR_NAME must be set to record changes")
        })
    }
}
