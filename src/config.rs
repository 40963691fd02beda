// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_address() -> String {
    constants::DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    constants::DEFAULT_PORT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL prepended to `/v/{token}` in shareable links. Falls back to
    /// the listen address when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            public_base_url: None,
        }
    }
}

fn default_data_dir() -> String {
    constants::DEFAULT_DATA_DIR.to_string()
}

fn default_max_create_retries() -> u32 {
    constants::DEFAULT_MAX_CREATE_RETRIES
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `links.db` and the `files/` blob directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_max_create_retries")]
    pub max_create_retries: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_create_retries: default_max_create_retries(),
        }
    }
}

fn default_jpeg_quality() -> u8 {
    constants::DEFAULT_JPEG_QUALITY
}

fn default_watermark_angle() -> f32 {
    constants::DEFAULT_WATERMARK_ANGLE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Explicit font file to load before trying system fonts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_watermark_angle")]
    pub watermark_angle_degrees: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            jpeg_quality: default_jpeg_quality(),
            watermark_angle_degrees: default_watermark_angle(),
        }
    }
}

fn default_log_level() -> String {
    constants::DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_format() -> String {
    constants::DEFAULT_LOG_FORMAT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        // Now perform the substitution (we know all vars exist)
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap() // Safe because we checked above
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Load from `path`, falling back to built-in defaults when the file does
    /// not exist. A file that exists but fails to parse is still an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.storage.data_dir.trim().is_empty() {
            return Err("storage.data_dir cannot be empty".to_string());
        }

        if self.storage.max_create_retries == 0 {
            return Err("storage.max_create_retries must be >= 1".to_string());
        }

        if self.render.jpeg_quality == 0 || self.render.jpeg_quality > 100 {
            return Err(format!(
                "render.jpeg_quality must be within 1..=100, got {}",
                self.render.jpeg_quality
            ));
        }

        if !self.render.watermark_angle_degrees.is_finite() {
            return Err("render.watermark_angle_degrees must be finite".to_string());
        }

        Ok(())
    }

    /// Shareable URL for a token.
    pub fn share_url(&self, token: &str) -> String {
        match &self.server.public_base_url {
            Some(base) => format!("{}/v/{}", base.trim_end_matches('/'), token),
            None => format!(
                "http://{}:{}/v/{}",
                self.server.address, self.server.port, token
            ),
        }
    }
}
