//! Pre-deploy checks and the default pipeline.
//!
//! Each check is a stateless unit implementing [`Check`]; configuration and the
//! project root arrive through the `CheckContext`.

pub mod assets;
pub mod build;
pub mod config_files;
pub mod manifest;
pub mod seo;
pub mod source;

use crate::core::config::Config;
use crate::core::coordinator::Check;

/// Every check name in pipeline order, including conditionally registered ones.
pub const PIPELINE_ORDER: &[&str] = &[
    "build-config",
    "package-manager-config",
    "deploy-config",
    "seo-files",
    "seo-metadata",
    "content-guards",
    "manifest",
    "critical-assets",
    "asset-audit",
    "log-statements",
    "lint",
    "build",
];

/// Build the pipeline for `config`, dropping any check named in `skip`.
///
/// `content-guards` and `critical-assets` are only registered when configured;
/// `lint` and `build` honor their `enabled` flags.
pub fn default_pipeline(config: &Config, skip: &[String]) -> Vec<Box<dyn Check>> {
    let mut checks: Vec<Box<dyn Check>> = vec![
        Box::new(config_files::BuildConfigCheck),
        Box::new(config_files::PackageManagerCheck),
        Box::new(config_files::DeployConfigCheck),
        Box::new(seo::SeoFilesCheck),
        Box::new(seo::SeoMetadataCheck),
    ];
    if !config.guards.is_empty() {
        checks.push(Box::new(source::ContentGuardsCheck));
    }
    checks.push(Box::new(manifest::ManifestCheck));
    if !config.critical_assets.paths.is_empty() {
        checks.push(Box::new(assets::CriticalAssetsCheck));
    }
    checks.push(Box::new(assets::AssetAuditCheck));
    checks.push(Box::new(source::LogStatementsCheck));
    if config.lint.enabled {
        checks.push(Box::new(build::LintCheck));
    }
    if config.build.enabled {
        checks.push(Box::new(build::BuildCheck));
    }

    checks.retain(|c| !skip.iter().any(|s| s == c.name()));
    checks
}

/// Names in `skip` that match no known check.
pub fn unknown_checks(skip: &[String]) -> Vec<&str> {
    skip.iter()
        .map(String::as_str)
        .filter(|s| !PIPELINE_ORDER.contains(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GuardRule;
    use crate::core::rules::Severity;

    fn names(checks: &[Box<dyn Check>]) -> Vec<&'static str> {
        checks.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn full_pipeline_follows_documented_order() {
        let mut config = Config::default();
        config.critical_assets.paths = vec!["images/hero.png".to_string()];
        config.guards.push(GuardRule {
            name: "g".to_string(),
            file: "f.js".to_string(),
            when_contains: "x".to_string(),
            unless_contains: Vec::new(),
            message: "m".to_string(),
            severity: Severity::Warn,
        });
        assert_eq!(names(&default_pipeline(&config, &[])), PIPELINE_ORDER.to_vec());
    }

    #[test]
    fn optional_checks_drop_out() {
        let mut config = Config::default();
        config.lint.enabled = false;
        let skip = vec!["build".to_string(), "seo-files".to_string()];
        let got = names(&default_pipeline(&config, &skip));
        assert_eq!(
            got,
            vec![
                "build-config",
                "package-manager-config",
                "deploy-config",
                "seo-metadata",
                "manifest",
                "asset-audit",
                "log-statements",
            ]
        );
    }

    #[test]
    fn unknown_skip_names_are_reported() {
        let skip = vec!["build".to_string(), "bogus".to_string()];
        assert_eq!(unknown_checks(&skip), vec!["bogus"]);
    }
}
