use std::env;

/// AppConfig
///
/// Holds the portal's entire configuration state. This struct is designed to be
/// immutable once loaded, ensuring consistency across all request handlers.
/// It is pulled into the application state via FromRef, embodying the "immutable AppConfig"
/// part of the Unified State Pattern.
#[derive(Clone)]
pub struct AppConfig {
    // Base URL of the remote expense-splitting API (e.g., "http://localhost:8000").
    pub api_url: String,
    // Address the portal's HTTP server binds to.
    pub bind_addr: String,
    // Runtime environment marker. Controls log formatting (pretty vs JSON).
    pub env: Env,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty log output, default upstream URL) and production settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    /// This allows us to instantiate the configuration without needing to set environment
    /// variables for lightweight unit or integration testing state scaffolding.
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the portal configuration at startup.
    /// It reads all parameters from environment variables and implements the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics if `API_URL` is not set when running in Production. This prevents the
    /// portal from starting with no upstream to talk to.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // Upstream API Resolution
        // The production upstream is mandatory and must be explicitly set.
        let api_url = match env {
            Env::Production => {
                env::var("API_URL").expect("FATAL: API_URL must be set in production.")
            }
            // In local, fall back to the conventional local backend address.
            _ => env::var("API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Self {
            api_url,
            bind_addr,
            env,
        }
    }
}
