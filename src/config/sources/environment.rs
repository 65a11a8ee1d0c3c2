//! Environment variable source: CHRONOFOLD__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `CHRONOFOLD__ORGANIZE__IGNORE_MARK=true` sets `organize.ignore_mark`;
/// extensions are a comma separated list.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("CHRONOFOLD")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("organize.extensions")
            .try_parsing(true),
    ))
}
