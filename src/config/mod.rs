//! Site configuration management for `quire.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[base]`    | Site metadata (title)                            |
//! | `[build]`   | Output dir, sitemap file, assets, extensions     |
//! | `[serve]`   | Dev server (port, interface, reload, debounce)   |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Notes"
//!
//! [build]
//! output = "_build"
//! assets = ["favicon.ico", "assets"]
//!
//! [serve]
//! port = 8000
//! ```
//!
//! The config is loaded once in `main` and passed by reference to every
//! component; nothing reads it from global state.

mod base;
mod build;
pub mod defaults;
mod error;
mod serve;

pub use base::BaseConfig;
pub use build::BuildConfig;
use error::ConfigError;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|err| ConfigError::Unreadable(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load the config for a CLI invocation.
    ///
    /// A missing config file yields the defaults; `init` writes one.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Update configuration with CLI arguments
    fn update_with_cli(&mut self, cli: &Cli) {
        if let Some(output) = &cli.output {
            self.build.output.clone_from(output);
        }

        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.config_path = normalize_path(&root.join(&cli.config));
        self.resolve_paths(&root);

        if let Commands::Dev { interface, port } = &cli.command {
            if let Some(interface) = interface {
                self.serve.interface.clone_from(interface);
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
        }
    }

    /// Anchor all paths at `root` and make them absolute.
    ///
    /// Asset entries stay root-relative (minus any `./`), because they are
    /// mirrored into the output directory under the same relative path.
    pub fn resolve_paths(&mut self, root: &Path) {
        let root = normalize_path(root);

        self.build.output = normalize_path(&root.join(&self.build.output));
        self.build.sitemap = normalize_path(&root.join(&self.build.sitemap));
        self.build.layout = normalize_path(&root.join(&self.build.layout));
        self.build.assets = self
            .build
            .assets
            .iter()
            .map(|asset| {
                asset
                    .components()
                    .filter(|c| !matches!(c, Component::CurDir | Component::RootDir))
                    .collect()
            })
            .collect();
        self.build.root = Some(root);
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let build = &self.build;

        for (field, ext) in [
            ("[build.source_ext]", &build.source_ext),
            ("[build.output_ext]", &build.output_ext),
        ] {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                bail!(ConfigError::Rejected(format!(
                    "{field} must be a bare extension like `page`"
                )));
            }
        }

        if build.source_ext == build.output_ext {
            bail!(ConfigError::Rejected(
                "[build.source_ext] and [build.output_ext] must differ".into()
            ));
        }

        if build.output == self.get_root() {
            bail!(ConfigError::Rejected(
                "[build.output] must not be the project root".into()
            ));
        }

        Ok(())
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_from_str() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "My Notes"
        "#,
        )
        .unwrap();
        assert_eq!(config.base.title, "My Notes");
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[base\ntitle = 1");
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = SiteConfig::from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Unreadable(..))));
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = SiteConfig::from_str("[deploy]\nprovider = \"github\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();
        assert_eq!(config.base.title, "personal website");
        assert_eq!(config.get_root(), Path::new("./"));
        assert_eq!(config.serve.port, 8000);
    }

    #[test]
    fn test_resolve_paths() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.build.assets = vec!["./assets".into(), "favicon.ico".into()];
        config.resolve_paths(dir.path());

        let root = config.get_root().to_path_buf();
        assert!(root.is_absolute());
        assert_eq!(config.build.output, root.join("_build"));
        assert_eq!(config.build.sitemap, root.join("sitemap_gen.toml"));
        assert_eq!(
            config.build.assets,
            vec![PathBuf::from("assets"), PathBuf::from("favicon.ico")]
        );
    }

    #[test]
    fn test_load_without_config_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Cli::parse_from(["quire", "--root", root, "-o", "public", "build"]);

        let config = SiteConfig::load(&cli).unwrap();
        assert!(config.build.output.ends_with("public"));
        assert!(config.config_path.ends_with("quire.toml"));
    }

    #[test]
    fn test_load_reads_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("quire.toml"),
            "[base]\ntitle = \"Loaded\"\n[serve]\nport = 9000\n",
        )
        .unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Cli::parse_from(["quire", "--root", root, "dev", "--port", "9100"]);

        let config = SiteConfig::load(&cli).unwrap();
        assert_eq!(config.base.title, "Loaded");
        // CLI wins over the file
        assert_eq!(config.serve.port, 9100);
    }

    #[test]
    fn test_validate_rejects_equal_extensions() {
        let mut config = SiteConfig::default();
        config.build.output_ext = "page".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dotted_extension() {
        let mut config = SiteConfig::default();
        config.build.source_ext = ".page".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_output_at_root() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.build.output = ".".into();
        config.resolve_paths(dir.path());
        assert!(config.validate().is_err());
    }
}
