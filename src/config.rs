use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("point-model driver not found: {0} (compile the MSISE-00 driver first)")]
    MissingDriver(String),
}

/// Immutable run configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the compiled MSISE-00 driver executable
    pub model_exe: PathBuf,
    /// Path to the daily geomagnetic indices table
    pub indices_path: PathBuf,
    /// Timeout applied to each driver invocation
    pub model_timeout: Duration,
    /// Worker threads for the parallel sweep (0 = rayon default)
    pub num_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_exe: PathBuf::from("build/msise00_driver"),
            indices_path: PathBuf::from("data/indices.txt"),
            model_timeout: Duration::from_secs(30),
            num_threads: 0,
        }
    }
}

impl Config {
    /// Fail fast when the driver executable is missing, before any query
    /// is attempted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.model_exe.is_file() {
            return Err(ConfigError::MissingDriver(
                self.model_exe.display().to_string(),
            ));
        }
        Ok(())
    }
}
