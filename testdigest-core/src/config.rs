// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for testdigest.
//!
//! Configuration is layered: the embedded [`DigestConfig::DEFAULT_CONFIG`] is read first, and an
//! optional TOML file is layered on top of it.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::Utf8Path;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// How a test's final status is derived from the report.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusPolicy {
    /// Scan the attempt history: a test that failed or timed out before passing is flaky, even
    /// if the tool recorded it as expected.
    #[default]
    RetryAware,

    /// Map the tool's coarse outcome token directly.
    StatusToken,
}

/// Settings that control normalization.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NormalizeConfig {
    /// The status resolution policy.
    pub status_policy: StatusPolicy,

    /// The project assigned to tests without one.
    pub default_project: String,

    /// The file assigned to tests without a resolvable location.
    pub unknown_file: String,

    /// The separator between title segments in a test's full title.
    pub title_separator: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            status_policy: StatusPolicy::RetryAware,
            default_project: "default".to_owned(),
            unknown_file: "unknown".to_owned(),
            title_separator: " › ".to_owned(),
        }
    }
}

/// Settings that control statistics and summaries.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StatsConfig {
    /// The number of slowest tests to list in summaries.
    pub slowest_count: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { slowest_count: 5 }
    }
}

/// Overall testdigest configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DigestConfig {
    /// Normalization settings.
    pub normalize: NormalizeConfig,

    /// Statistics settings.
    pub stats: StatsConfig,
}

impl DigestConfig {
    /// The default configuration, embedded in the binary.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the default configuration and layers `config_file` over it, if specified.
    ///
    /// Unknown keys are logged as warnings and otherwise ignored.
    pub fn from_sources(config_file: Option<&Utf8Path>) -> Result<Self, ConfigParseError> {
        let mut builder = Self::make_default_config();
        if let Some(config_file) = config_file {
            debug!("layering config file `{config_file}` over defaults");
            builder = builder.add_source(File::new(config_file.as_str(), FileFormat::Toml));
        }

        let (config, ignored) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;
        for path in ignored {
            warn!("ignoring unknown configuration key `{path}`");
        }
        Ok(config)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: Self = serde_path_to_error::deserialize(ignored_de).map_err(|error| {
            // serde_path_to_error already tracks the key, so drop the one reported by the
            // config crate.
            let path = error.path().clone();
            let error = match error.into_inner() {
                ConfigError::At { error, .. } => *error,
                other => other,
            };
            ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                path, error,
            )))
        })?;

        Ok((config, ignored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use test_case::test_case;

    fn load_str(contents: &str) -> Result<(DigestConfig, BTreeSet<String>), ConfigParseErrorKind> {
        let builder = DigestConfig::make_default_config()
            .add_source(File::from_str(contents, FileFormat::Toml));
        DigestConfig::build_and_deserialize_config(&builder)
    }

    #[test]
    fn embedded_default_matches_default_impl() {
        let config = DigestConfig::from_sources(None).expect("default config is valid");
        assert_eq!(config, DigestConfig::default());
    }

    #[test_case(
        indoc! {r#"
            [normalize]
            status-policy = "status-token"
        "#},
        StatusPolicy::StatusToken
        ; "status token"
    )]
    #[test_case(
        indoc! {r#"
            [normalize]
            status-policy = "retry-aware"
        "#},
        StatusPolicy::RetryAware
        ; "retry aware"
    )]
    #[test_case("", StatusPolicy::RetryAware ; "default")]
    fn parse_status_policy(contents: &str, expected: StatusPolicy) {
        let (config, ignored) = load_str(contents).expect("config is valid");
        assert_eq!(config.normalize.status_policy, expected);
        assert!(ignored.is_empty(), "no keys ignored: {ignored:?}");
    }

    #[test]
    fn overrides_keep_unrelated_defaults() {
        let (config, _) = load_str(indoc! {r#"
            [normalize]
            default-project = "chromium"

            [stats]
            slowest-count = 10
        "#})
        .expect("config is valid");

        assert_eq!(config.normalize.default_project, "chromium");
        assert_eq!(config.normalize.unknown_file, "unknown");
        assert_eq!(config.normalize.title_separator, " › ");
        assert_eq!(config.stats.slowest_count, 10);
    }

    #[test]
    fn unknown_keys_are_reported() {
        let (_, ignored) = load_str(indoc! {r#"
            [normalize]
            colour = "blue"

            [reporting]
            enabled = true
        "#})
        .expect("config is valid");
        assert_eq!(
            ignored.into_iter().collect::<Vec<_>>(),
            vec!["normalize.colour", "reporting"]
        );
    }

    #[test]
    fn unknown_status_policy_is_rejected() {
        let err = load_str(indoc! {r#"
            [normalize]
            status-policy = "optimistic"
        "#})
        .expect_err("unknown policy is rejected");
        match err {
            ConfigParseErrorKind::DeserializeError(error) => {
                assert_eq!(error.path().to_string(), "normalize.status-policy");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn config_file_is_layered() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("testdigest.toml");
        std::fs::write(
            &path,
            indoc! {r#"
                [normalize]
                unknown-file = "<anonymous>"
            "#},
        )
        .unwrap();

        let config = DigestConfig::from_sources(Some(&path)).expect("config is valid");
        assert_eq!(config.normalize.unknown_file, "<anonymous>");
        assert_eq!(config.normalize.status_policy, StatusPolicy::RetryAware);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        let err = DigestConfig::from_sources(Some(&path)).expect_err("missing file errors");
        assert_eq!(err.config_file(), Some(path.as_path()));
        assert!(matches!(err.kind(), ConfigParseErrorKind::BuildError(_)));
    }
}
