use std::env;

/// AppConfig
///
/// Holds the shell's entire configuration state. Loaded once at startup and
/// shared read-only through `AppState` (pulled out by handlers via `FromRef`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Origin of the remote learning API (e.g. https://localhost:7099).
    pub api_base_url: String,
    // Socket address the shell listens on.
    pub bind_addr: String,
    // Runtime environment marker. Controls log format and TLS leniency.
    pub env: Env,
    // Accept the backend's self-signed development certificate.
    pub accept_invalid_certs: bool,
    // Adds the `Secure` attribute to session cookies.
    pub cookie_secure: bool,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty logs, self-signed backend certificate) and production behavior.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values used by test state scaffolding.
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:7099".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            env: Env::Local,
            accept_invalid_certs: true,
            cookie_secure: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (after `.env` has been
    /// loaded by the binary).
    ///
    /// # Panics
    /// Panics if `API_BASE_URL` is missing in production. The shell has nothing
    /// to render without a backend, so it refuses to start.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                api_base_url: env::var("API_BASE_URL")
                    .map(|url| trim_origin(&url))
                    .unwrap_or_else(|_| "https://localhost:7099".to_string()),
                bind_addr,
                accept_invalid_certs: flag("ACCEPT_INVALID_CERTS", true),
                cookie_secure: flag("COOKIE_SECURE", false),
            },
            Env::Production => Self {
                env: Env::Production,
                api_base_url: trim_origin(
                    &env::var("API_BASE_URL").expect("FATAL: API_BASE_URL required in prod"),
                ),
                bind_addr,
                // Never relaxed in production, whatever the environment says.
                accept_invalid_certs: false,
                cookie_secure: flag("COOKIE_SECURE", true),
            },
        }
    }
}

/// Parses a boolean environment flag, falling back to `default` when unset or unreadable.
fn flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

fn trim_origin(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
