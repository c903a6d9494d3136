// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Environment variable selecting an alternate `.env.<name>` file.
pub const ENV_SELECTOR: &str = "REVBRIDGE_ENV";

/// Credential bridge between an MCP agent and a Vbrick Rev tenant.
#[derive(Debug, Clone, Parser)]
#[command(name = "revbridge", version, about)]
pub struct BridgeConfig {
    /// Base URL of the Rev tenant.
    #[arg(long, env = "VBRICK_REV_TENANT_URL", default_value = "https://tenant.rev.vbrick.com")]
    pub tenant_url: String,

    /// User-Agent header sent with every outbound request.
    #[arg(long, env = "USER_AGENT", default_value = "rev-mcp-server-app/1.0")]
    pub user_agent: String,

    /// API key for the key/secret exchange. If unset, only interactive login is used.
    #[arg(long, env = "API_KEY")]
    pub api_key: Option<String>,

    /// Secret paired with `--api-key`.
    #[arg(long, env = "SECRET", default_value = "", hide_env_values = true)]
    pub secret: String,

    /// Enable the interactive OAuth login (callback server + authorize tool).
    #[arg(long, env = "OAUTH_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    pub oauth_enabled: bool,

    /// OAuth client id registered with the tenant.
    #[arg(long, env = "OAUTH_CLIENT_ID", default_value = "vbrick-mcp-server")]
    pub oauth_client_id: String,

    /// Space-separated scopes requested at authorization time.
    #[arg(long, env = "OAUTH_SCOPES", default_value = "openid profile email")]
    pub oauth_scopes: String,

    /// Primary port for the OAuth callback server.
    #[arg(long, env = "OAUTH_PORT", default_value_t = 8008)]
    pub oauth_port: u16,

    /// Port tried when the primary port is already in use.
    #[arg(long, env = "OAUTH_BACKUP_PORT", default_value_t = 8009)]
    pub oauth_backup_port: u16,

    /// Host the callback server binds to.
    #[arg(long, env = "REVBRIDGE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Do not open a browser from the authorize tool; the login URL is only logged.
    #[arg(long, env = "REVBRIDGE_NO_BROWSER")]
    pub no_browser: bool,

    /// Interval between credential checks while waiting for a login.
    #[arg(long, default_value_t = 1000, env = "REVBRIDGE_LOGIN_POLL_MS", hide = true)]
    pub login_poll_ms: u64,

    /// How long the authorize tool waits before reporting the login as pending.
    #[arg(long, default_value_t = 20000, env = "REVBRIDGE_LOGIN_TIMEOUT_MS", hide = true)]
    pub login_timeout_ms: u64,

    /// Log filter (tracing `EnvFilter` syntax).
    #[arg(long, env = "REVBRIDGE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format: `text` or `json`.
    #[arg(long, env = "REVBRIDGE_LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl BridgeConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.tenant_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("--tenant-url must be an http(s) URL, got: {url}");
        }
        if self.oauth_enabled && self.oauth_port == self.oauth_backup_port {
            anyhow::bail!("--oauth-port and --oauth-backup-port must differ");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    /// Tenant base URL without a trailing slash.
    pub fn tenant(&self) -> &str {
        self.tenant_url.trim().trim_end_matches('/')
    }

    /// Absolute URL for a tenant API path (`path` starts with `/`).
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.tenant())
    }

    pub fn authenticate_url(&self) -> String {
        self.api_url("/api/v2/authenticate")
    }

    pub fn token_url(&self) -> String {
        self.api_url("/api/v2/oauth2/token")
    }

    pub fn authorize_url(&self) -> String {
        self.api_url("/api/v2/oauth2/authorize")
    }

    /// Redirect URI registered for the callback server listening on `port`.
    pub fn redirect_uri(port: u16) -> String {
        format!("http://localhost:{port}/oauth/callback")
    }

    /// Configured API key, treating an empty string as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn login_poll_interval(&self) -> Duration {
        Duration::from_millis(self.login_poll_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }
}

/// Load `.env` (or `.env.<REVBRIDGE_ENV>`) into the process environment.
///
/// Runs before argument parsing so the file can supply `env` fallbacks.
/// Returns the path that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    let name = match std::env::var(ENV_SELECTOR) {
        Ok(env) if !env.is_empty() => format!(".env.{env}"),
        _ => ".env".to_owned(),
    };
    dotenvy::from_filename(name).ok()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
