use std::{env, fmt, net::SocketAddr};

use crate::error::AppError;

pub const DEV_COOKIE_SECRET: &str = "change-me-pulse-session-cookie-secret-for-development";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Production,
    #[default]
    NonProduction,
}

impl RuntimeMode {
    /// Anything other than `production` (case-insensitive) counts as non-production.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("production") => RuntimeMode::Production,
            _ => RuntimeMode::NonProduction,
        }
    }

    pub fn is_production(self) -> bool {
        self == RuntimeMode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeMode::Production => "production",
            RuntimeMode::NonProduction => "non-production",
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub runtime_mode: RuntimeMode,
    pub demo_mode: bool,
    pub cookie_secret: String,
    pub login_path: String,
    pub legacy_cookie_session: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            runtime_mode: RuntimeMode::NonProduction,
            demo_mode: false,
            cookie_secret: DEV_COOKIE_SECRET.to_string(),
            login_path: "/login".to_string(),
            legacy_cookie_session: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("APP_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let runtime_mode = RuntimeMode::parse(lookup("APP_ENV").as_deref());
        let demo_mode = parse_flag(lookup("DEMO_MODE").as_deref());
        let legacy_cookie_session = parse_flag(lookup("LEGACY_COOKIE_SESSION").as_deref());

        let cookie_secret = lookup("COOKIE_SECRET").unwrap_or_else(|| DEV_COOKIE_SECRET.to_string());

        let login_path = lookup("LOGIN_PATH").unwrap_or_else(|| "/login".to_string());
        if !login_path.starts_with('/') {
            return Err(AppError::Config(format!(
                "LOGIN_PATH must be an absolute path, got {login_path:?}"
            )));
        }

        Ok(Self {
            listen_addr,
            runtime_mode,
            demo_mode,
            cookie_secret,
            login_path,
            legacy_cookie_session,
        })
    }

    pub fn uses_dev_cookie_secret(&self) -> bool {
        self.cookie_secret == DEV_COOKIE_SECRET
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
