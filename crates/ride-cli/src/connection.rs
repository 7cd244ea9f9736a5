//! # Connection Settings
//!
//! Resolves the API location, bearer token and timeout from global flags,
//! falling back to the `RIDE_*` environment variables read by
//! [`RideClientConfig::from_env`].

use anyhow::{bail, Context, Result};
use clap::Args;
use ride_client::config::{parse_timeout, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use ride_client::{RideClient, RideClientConfig};
use ride_core::{Actor, Role};
use url::Url;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Ride API base URL [env: RIDE_API_URL].
    #[arg(long, global = true)]
    pub api_url: Option<Url>,

    /// Bearer token `{role}:{user_id}:{secret}` [env: RIDE_API_TOKEN].
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds [env: RIDE_TIMEOUT_SECS].
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    /// Merge flags over the environment.
    pub fn resolve(&self) -> Result<RideClientConfig> {
        let api_url = match &self.api_url {
            Some(url) => url.clone(),
            None => {
                let raw = std::env::var("RIDE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
                Url::parse(&raw).with_context(|| format!("invalid RIDE_API_URL: {raw}"))?
            }
        };

        let token = match &self.token {
            Some(token) => token.clone(),
            None => match std::env::var("RIDE_API_TOKEN") {
                Ok(token) if !token.is_empty() => token,
                _ => bail!("no token: pass --token or set RIDE_API_TOKEN"),
            },
        };

        let timeout_secs = match self.timeout_secs {
            Some(0) => bail!("--timeout-secs must be positive"),
            Some(secs) => secs,
            None => match std::env::var("RIDE_TIMEOUT_SECS") {
                Ok(raw) => parse_timeout(&raw)?,
                Err(_) => DEFAULT_TIMEOUT_SECS,
            },
        };

        Ok(RideClientConfig {
            api_url,
            api_token: Zeroizing::new(token),
            timeout_secs,
        })
    }
}

/// The actor a token authenticates as.
///
/// The server remains the authority; this only drives local pre-checks
/// and rendering.
pub fn actor_from_token(token: &str) -> Result<Actor> {
    let mut parts = token.splitn(3, ':');
    let (Some(role), Some(user), Some(_)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("invalid token format, expected {{role}}:{{user_id}}:{{secret}}");
    };
    let role: Role = role.parse().with_context(|| format!("unknown role: {role}"))?;
    let user: Uuid = user
        .parse()
        .with_context(|| format!("invalid user_id: {user}"))?;
    Ok(Actor::from_parts(role, user))
}

/// Build a client and the actor it speaks for.
pub fn connect(args: &ConnectionArgs) -> Result<(RideClient, Actor)> {
    let config = args.resolve()?;
    let actor = actor_from_token(&config.api_token)?;
    tracing::debug!(api_url = %config.api_url, %actor, "connecting to ride API");
    let client = RideClient::new(config).context("failed to build ride API client")?;
    Ok((client, actor))
}
