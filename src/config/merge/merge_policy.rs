//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("api.base_url", "https://api.notion.com/v1")?
        .set_default("api.version", "2022-06-28")?
        .set_default("api.connect_timeout_secs", 10)?
        .set_default("api.request_timeout_secs", 60)?
        .set_default("query.default_page_size", 100)?
        .set_default("schema.path", "notion-schema.json")?
        .set_default("unmapped", "skip")
}
