use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

pub const DEFAULT_REST_URL: &str = "https://api.binance.com";
pub const DEFAULT_STREAM_URL: &str = "wss://stream.binance.com:9443/ws/";
pub const TESTNET_REST_URL: &str = "https://testnet.binance.vision";
pub const TESTNET_STREAM_URL: &str = "wss://testnet.binance.vision/ws/";

/// Receive window applied to signed requests unless overridden.
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub testnet: bool,
    pub base_url: Option<String>,
    pub stream_url: Option<String>,
    pub recv_window_ms: u64,
    pub timeout_seconds: u64,
}

// Never expose secrets in serialization
impl Serialize for ClientConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ClientConfig", 7)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("testnet", &self.testnet)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("stream_url", &self.stream_url)?;
        state.serialize_field("recv_window_ms", &self.recv_window_ms)?;
        state.serialize_field("timeout_seconds", &self.timeout_seconds)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ClientConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ClientConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            testnet: bool,
            base_url: Option<String>,
            stream_url: Option<String>,
            recv_window_ms: Option<u64>,
            timeout_seconds: Option<u64>,
        }

        let helper = ClientConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            testnet: helper.testnet,
            base_url: helper.base_url,
            stream_url: helper.stream_url,
            recv_window_ms: helper.recv_window_ms.unwrap_or(DEFAULT_RECV_WINDOW_MS),
            timeout_seconds: helper.timeout_seconds.unwrap_or(30),
        })
    }
}

impl ClientConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet: false,
            base_url: None,
            stream_url: None,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
            timeout_seconds: 30,
        }
    }

    /// Configuration for public endpoints only; signed and user-stream calls
    /// fail with an authentication error.
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables (for prefix `BINANCE`):
    /// - `BINANCE_API_KEY`
    /// - `BINANCE_SECRET_KEY`
    /// - `BINANCE_TESTNET` (optional, defaults to false)
    /// - `BINANCE_BASE_URL` (optional)
    /// - `BINANCE_STREAM_URL` (optional)
    /// - `BINANCE_RECV_WINDOW` (optional, milliseconds)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let var = |name: &str| format!("{}_{}", prefix, name);

        let api_key_var = var("API_KEY");
        let secret_key_var = var("SECRET_KEY");

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;
        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let testnet = env::var(var("TESTNET"))
            .map(|v| v.parse::<bool>().unwrap_or(false))
            .unwrap_or(false);

        let recv_window_ms = match env::var(var("RECV_WINDOW")) {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidConfiguration(format!(
                    "{} must be a number of milliseconds: {}",
                    var("RECV_WINDOW"),
                    e
                ))
            })?,
            Err(_) => DEFAULT_RECV_WINDOW_MS,
        };

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet,
            base_url: env::var(var("BASE_URL")).ok(),
            stream_url: env::var(var("STREAM_URL")).ok(),
            recv_window_ms,
            timeout_seconds: 30,
        })
    }

    /// Load `.env` (if present) and then read the environment.
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Same as [`Self::from_env_file`] with an explicit file path.
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // no file, fall back to the process environment
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn stream_url(mut self, stream_url: String) -> Self {
        self.stream_url = Some(stream_url);
        self
    }

    #[must_use]
    pub const fn recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// REST host: explicit override, then testnet, then production.
    pub fn rest_url(&self) -> String {
        match (&self.base_url, self.testnet) {
            (Some(url), _) => url.clone(),
            (None, true) => TESTNET_REST_URL.to_string(),
            (None, false) => DEFAULT_REST_URL.to_string(),
        }
    }

    /// Stream base URL; always ends with `/` so paths can be appended.
    pub fn ws_url(&self) -> String {
        let url = match (&self.stream_url, self.testnet) {
            (Some(url), _) => url.clone(),
            (None, true) => TESTNET_STREAM_URL.to_string(),
            (None, false) => DEFAULT_STREAM_URL.to_string(),
        };
        if url.ends_with('/') {
            url
        } else {
            format!("{}/", url)
        }
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
