//! Layered configuration loading.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::ClientConfig;
use config::{Config, ConfigError, Environment, File};
use std::path::{Path, PathBuf};

/// Prefix of environment overrides, e.g. `NOTION_TYPED__QUERY__DEFAULT_PAGE_SIZE=50`
const ENV_PREFIX: &str = "NOTION_TYPED";

/// Conventional token variable, used when no token is configured otherwise
const TOKEN_ENV: &str = "NOTION_TOKEN";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, workspace `config/{env}.toml`, environment.
    /// A relative schema path is resolved against `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<ClientConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let mut config: ClientConfig = builder.build()?.try_deserialize()?;
        apply_token_fallback(&mut config);
        if config.schema.path.is_relative() {
            config.schema.path = workspace_root.join(&config.schema.path);
        }
        Ok(config)
    }

    /// Load configuration from a single file, without layering
    pub fn load_from_file(path: &Path) -> Result<ClientConfig, ConfigError> {
        let mut config: ClientConfig = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        apply_token_fallback(&mut config);
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

fn apply_token_fallback(config: &mut ClientConfig) {
    if config.api.token.is_none() {
        config.api.token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
    }
}
