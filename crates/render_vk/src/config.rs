//! Renderer configuration
//!
//! Start-time settings for the Vulkan context: application metadata, the
//! validation switch and the SPIR-V blob locations. Loadable from TOML so
//! applications can ship a config file next to the binary.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file missing or unreadable
    #[error("failed to read config file {path}")]
    Io {
        /// Path that was attempted
        path: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
}

/// Shader blob locations for the two required pipeline stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Create shader config with automatic path resolution
    ///
    /// Tries common shader output locations, useful for applications that may
    /// be run from different working directories.
    pub fn with_path_resolution(base_vertex: &str, base_fragment: &str) -> Self {
        let shader_dirs = ["target/shaders/", "shaders/", "../shaders/", "./"];

        let resolve = |base: &str| {
            shader_dirs
                .iter()
                .map(|dir| format!("{dir}{base}"))
                .find(|candidate| Path::new(candidate).exists())
                .unwrap_or_else(|| format!("shaders/{base}"))
        };

        Self {
            vertex_shader_path: resolve(base_vertex),
            fragment_shader_path: resolve(base_fragment),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::with_path_resolution("vert.spv", "frag.spv")
    }
}

/// Start-time configuration for [`crate::VulkanContext`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Application name reported to the driver
    pub application_name: String,
    /// Application version (major, minor, patch)
    pub application_version: (u32, u32, u32),
    /// Shader configuration
    pub shaders: ShaderConfig,
    /// Whether to enable validation layers; `None` follows the build profile
    pub enable_validation: Option<bool>,
}

impl RendererConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Resolve the validation switch, defaulting to the build profile
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            application_name: "render_vk application".to_string(),
            application_version: (0, 1, 0),
            shaders: ShaderConfig::default(),
            enable_validation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_follows_build_profile_when_unset() {
        let config = RendererConfig::default();
        assert_eq!(config.validation_enabled(), cfg!(debug_assertions));
    }

    #[test]
    fn test_validation_explicit_override() {
        let mut config = RendererConfig::default();
        config.enable_validation = Some(true);
        assert!(config.validation_enabled());
        config.enable_validation = Some(false);
        assert!(!config.validation_enabled());
    }

    #[test]
    fn test_config_parses_from_toml() {
        let text = r#"
            application_name = "demo"
            application_version = [0, 2, 0]
            enable_validation = false

            [shaders]
            vertex_shader_path = "shaders/vert.spv"
            fragment_shader_path = "shaders/frag.spv"
        "#;
        let config: RendererConfig = toml::from_str(text).unwrap();
        assert_eq!(config.application_name, "demo");
        assert_eq!(config.application_version, (0, 2, 0));
        assert_eq!(config.enable_validation, Some(false));
        assert_eq!(config.shaders.vertex_shader_path, "shaders/vert.spv");
    }
}
