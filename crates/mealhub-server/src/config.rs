use std::net::{Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Value of `Access-Control-Allow-Origin`; `*` allows any origin.
    pub cors_origin: String,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 7071)),
            cors_origin: "*".into(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Config files keep server settings under a `[server]` table, next to the
/// hub settings at the top level.
#[derive(Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let file: ConfigFile =
            toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        file.server.validate()?;
        Ok(file.server)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.cors_origin.trim().is_empty() {
            return Err(ServerError::Config("cors_origin must not be empty".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ServerError::Config("max_upload_bytes must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:7071".parse::<SocketAddr>().unwrap());
        assert_eq!(c.cors_origin, "*");
        assert_eq!(c.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn reads_server_table_and_ignores_hub_keys() {
        let c = ServerConfig::from_toml_str(
            r#"
            meals_table = "meals1"

            [server]
            bind_addr = "0.0.0.0:8080"
            cors_origin = "https://mealhub.example"
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.cors_origin, "https://mealhub.example");
        assert_eq!(c.max_upload_bytes, ServerConfig::default().max_upload_bytes);
    }

    #[test]
    fn missing_server_table_uses_defaults() {
        let c = ServerConfig::from_toml_str("meals_table = \"meals1\"").unwrap();
        assert_eq!(c, ServerConfig::default());
    }

    #[test]
    fn rejects_zero_upload_limit() {
        let err = ServerConfig::from_toml_str("[server]\nmax_upload_bytes = 0").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }
}
