//! Compile-time rendering configuration.
//!
//! Loaded from TOML by the embedding application; every field has a
//! default so an empty document is valid.

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// CompileConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileConfig {
    /// How bound parameters are written into SQL text.
    pub placeholder: PlaceholderStyle,

    /// Prefix for generated parameter names (`p` gives `p1`, `p2`, ...).
    pub parameter_prefix: String,

    /// Prefix for generated table aliases (`t` gives `t1`, `t2`, ...).
    pub alias_prefix: String,

    /// Column qualification policy.
    pub qualify: QualifyMode,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            placeholder: PlaceholderStyle::Named,
            parameter_prefix: "p".to_string(),
            alias_prefix: "t".to_string(),
            qualify: QualifyMode::Auto,
        }
    }
}

impl CompileConfig {
    /// Parse a configuration document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Reject prefixes that cannot form SQL identifiers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_prefix("parameter_prefix", &self.parameter_prefix)?;
        check_prefix("alias_prefix", &self.alias_prefix)?;

        Ok(())
    }

    /// Render one placeholder for a parameter name and its 1-based
    /// ordinal within the compiled statement.
    #[must_use]
    pub fn placeholder(&self, name: &str, ordinal: usize) -> String {
        match self.placeholder {
            PlaceholderStyle::Named => format!(":{name}"),
            PlaceholderStyle::MyBatis => format!("#{{{name}}}"),
            PlaceholderStyle::Dollar => format!("${ordinal}"),
        }
    }
}

fn check_prefix(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidPrefix {
            field,
            value: value.to_string(),
        })
    }
}

///
/// PlaceholderStyle
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `:p1`
    #[default]
    Named,
    /// `#{p1}`
    #[serde(rename = "mybatis")]
    MyBatis,
    /// `$1`, numbered by bind order within the statement.
    Dollar,
}

///
/// QualifyMode
/// Whether rendered columns carry their table alias.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualifyMode {
    /// Qualify only when the statement joins tables or correlates columns.
    #[default]
    Auto,
    Always,
    Never,
}

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("invalid compile config: {message}")]
    Parse { message: String },

    #[error("config field '{field}' is not a valid identifier prefix: '{value}'")]
    InvalidPrefix { field: &'static str, value: String },
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CompileConfig::from_toml_str("").expect("empty config");

        assert_eq!(config, CompileConfig::default());
    }

    #[test]
    fn fields_parse_from_toml() {
        let config = CompileConfig::from_toml_str(
            r#"
            placeholder = "mybatis"
            parameter_prefix = "arg"
            alias_prefix = "a_"
            qualify = "always"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.placeholder, PlaceholderStyle::MyBatis);
        assert_eq!(config.parameter_prefix, "arg");
        assert_eq!(config.alias_prefix, "a_");
        assert_eq!(config.qualify, QualifyMode::Always);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = CompileConfig::from_toml_str("dialect = \"mysql\"").expect_err("unknown");

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        let err = CompileConfig::from_toml_str("alias_prefix = \"1x\"").expect_err("bad prefix");

        assert_eq!(
            err,
            ConfigError::InvalidPrefix {
                field: "alias_prefix",
                value: "1x".to_string(),
            }
        );
    }

    #[test]
    fn placeholder_styles_render() {
        let mut config = CompileConfig::default();
        assert_eq!(config.placeholder("p1", 1), ":p1");

        config.placeholder = PlaceholderStyle::MyBatis;
        assert_eq!(config.placeholder("p1", 1), "#{p1}");

        config.placeholder = PlaceholderStyle::Dollar;
        assert_eq!(config.placeholder("p7", 3), "$3");
    }
}
