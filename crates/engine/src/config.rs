//! Engine configuration.

use tracing::warn;

pub const IDENTITY_FIELD_ENV: &str = "WARDEN_IDENTITY_FIELD";
pub const PATH_DELIMITER_ENV: &str = "WARDEN_PATH_DELIMITER";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Context key whose (truthy) presence means "authenticated".
    pub identity_field: String,
    /// Separator between segments of activity/assertion paths.
    pub delimiter: char,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identity_field: "user".to_string(),
            delimiter: ':',
        }
    }
}

impl EngineConfig {
    pub fn with_identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = field.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Defaults overridden by `WARDEN_IDENTITY_FIELD` / `WARDEN_PATH_DELIMITER`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`EngineConfig::from_env`], reading values through `lookup`.
    ///
    /// Invalid values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(field) = lookup(IDENTITY_FIELD_ENV) {
            if field.trim().is_empty() {
                warn!("{IDENTITY_FIELD_ENV} is empty; using `{}`", config.identity_field);
            } else {
                config.identity_field = field.trim().to_string();
            }
        }

        if let Some(raw) = lookup(PATH_DELIMITER_ENV) {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(delimiter), None) => config.delimiter = delimiter,
                _ => warn!(
                    value = %raw,
                    "{PATH_DELIMITER_ENV} must be a single character; using `{}`",
                    config.delimiter
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        assert_eq!(EngineConfig::from_lookup(lookup(&[])), EngineConfig::default());
    }

    #[test]
    fn overrides_apply() {
        let config = EngineConfig::from_lookup(lookup(&[
            (IDENTITY_FIELD_ENV, "principal"),
            (PATH_DELIMITER_ENV, "."),
        ]));
        assert_eq!(config.identity_field, "principal");
        assert_eq!(config.delimiter, '.');
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let config = EngineConfig::from_lookup(lookup(&[
            (IDENTITY_FIELD_ENV, "  "),
            (PATH_DELIMITER_ENV, "::"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }
}
