use crate::core::errors::ConfigError;
use std::env;
use std::path::Path;
use tracing::Level;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub log_level: Level,
}

/// Classifier model configuration
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: String,
    /// Number of ONNX sessions kept in the inference pool
    pub session_pool_size: usize,
}

/// History store configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_path: String,
}

/// Randomized estimator configuration
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Fixed seed for the size/quality jitter RNG. Unset means a fresh OS
    /// seed per process; set it to make estimates reproducible.
    pub rng_seed: Option<u64>,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub estimator: EstimatorConfig,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Result<Self, ConfigError> {
        let log_level = env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| parse_log_level(&s))
            .unwrap_or(Level::INFO);

        Ok(Self {
            server: ServerConfig {
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5001),
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                log_level,
            },
            model: ModelConfig {
                model_path: env::var("MODEL_PATH")
                    .unwrap_or_else(|_| "models/classifier.onnx".to_string()),
                session_pool_size: env::var("SESSION_POOL_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        // Half the cores covers typical request concurrency
                        // without holding eight copies of the graph in memory
                        std::cmp::max(num_cpus::get() / 2, 2)
                    }),
            },
            storage: StorageConfig {
                database_path: env::var("DATABASE_PATH")
                    .unwrap_or_else(|_| "aquagrade.db".to_string()),
            },
            estimator: EstimatorConfig {
                rng_seed: env::var("RNG_SEED").ok().and_then(|s| s.parse().ok()),
            },
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.session_pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize(self.model.session_pool_size));
        }

        if self.model.model_path.trim().is_empty() {
            return Err(ConfigError::EmptyModelPath);
        }

        // The database file is created on demand, but its parent must exist
        let db_path = Path::new(&self.storage.database_path);
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidDatabasePath(format!(
                    "parent directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        Ok(())
    }

    pub fn server_host(&self) -> &str {
        &self.server.host
    }

    pub fn server_port(&self) -> u16 {
        self.server.port
    }

    pub fn log_level(&self) -> Level {
        self.server.log_level
    }

    pub fn model_path(&self) -> &str {
        &self.model.model_path
    }

    pub fn session_pool_size(&self) -> usize {
        self.model.session_pool_size
    }

    pub fn database_path(&self) -> &str {
        &self.storage.database_path
    }

    pub fn rng_seed(&self) -> Option<u64> {
        self.estimator.rng_seed
    }
}

fn parse_log_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

// Note: No Default implementation because Config::new() can fail
// Users should explicitly call Config::new()? and handle errors

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_log_level("WARNING"), Some(Level::WARN));
        assert_eq!(parse_log_level("loud"), None);
    }

    #[test]
    fn test_validate_rejects_zero_pool() {
        let mut config = Config::load_from_env().unwrap();
        config.model.session_pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_model_path() {
        let mut config = Config::load_from_env().unwrap();
        config.model.model_path = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
