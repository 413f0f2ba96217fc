//! Deploy-target configuration files: framework config, package-manager
//! settings and the hosting platform descriptor.

use crate::core::coordinator::{Check, CheckContext};
use crate::core::error::DeployCheckError;
use crate::core::rules;
use crate::core::verdict::{Status, Verdict};
use serde_json::Value as JsonValue;
use std::fs;

fn read_required(ctx: &CheckContext, file: &str) -> Result<Option<String>, DeployCheckError> {
    let path = ctx.path(file);
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
}

pub struct BuildConfigCheck;

impl Check for BuildConfigCheck {
    fn name(&self) -> &'static str {
        "build-config"
    }

    fn title(&self) -> &'static str {
        "Framework build configuration"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let cfg = &ctx.config.build_config;
        let Some(content) = read_required(ctx, &cfg.file)? else {
            return Ok(Verdict::fail(
                self.name(),
                self.title(),
                vec![format!("{} not found", cfg.file)],
            ));
        };

        let compiled = rules::compile_rules(&cfg.rules)?;
        let findings = rules::match_rules(&compiled, &content)
            .into_iter()
            .map(|m| {
                (
                    m.severity.status(),
                    format!("[{}] matched \"{}\": {}", m.rule, m.matched, m.message),
                )
            })
            .collect();

        Ok(Verdict::from_findings(
            self.name(),
            self.title(),
            findings,
            &format!("{} has no disallowed settings", cfg.file),
        ))
    }
}

pub struct PackageManagerCheck;

impl Check for PackageManagerCheck {
    fn name(&self) -> &'static str {
        "package-manager-config"
    }

    fn title(&self) -> &'static str {
        "Package manager settings"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let cfg = &ctx.config.package_manager;
        let Some(content) = read_required(ctx, &cfg.file)? else {
            return Ok(Verdict::fail(
                self.name(),
                self.title(),
                vec![format!("{} not found", cfg.file)],
            ));
        };

        let findings = cfg
            .required_settings
            .iter()
            .filter(|s| !content.contains(s.as_str()))
            .map(|s| (Status::Fail, format!("{} is missing `{}`", cfg.file, s)))
            .collect();

        Ok(Verdict::from_findings(
            self.name(),
            self.title(),
            findings,
            &format!("{} has all required settings", cfg.file),
        ))
    }
}

fn describe(value: Option<&JsonValue>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "absent".to_string(),
    }
}

pub struct DeployConfigCheck;

impl Check for DeployConfigCheck {
    fn name(&self) -> &'static str {
        "deploy-config"
    }

    fn title(&self) -> &'static str {
        "Deploy target configuration"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let cfg = &ctx.config.deploy_config;
        let Some(content) = read_required(ctx, &cfg.file)? else {
            return Ok(Verdict::warn(
                self.name(),
                self.title(),
                vec![format!("{} not found (optional but recommended)", cfg.file)],
            ));
        };

        let doc: JsonValue = serde_json::from_str(&content)
            .map_err(|e| DeployCheckError::parse(ctx.path(&cfg.file), e))?;

        let mut findings = Vec::new();
        for key in &cfg.forbidden_keys {
            if doc.get(key).is_some() {
                findings.push((
                    Status::Fail,
                    format!("`{}` must not be set; let the platform detect it", key),
                ));
            }
        }
        for (key, expected) in &cfg.expected {
            let actual = doc.get(key);
            if actual != Some(expected) {
                findings.push((
                    Status::Fail,
                    format!(
                        "`{}` should be {} (found {})",
                        key,
                        expected,
                        describe(actual)
                    ),
                ));
            }
        }

        Ok(Verdict::from_findings(
            self.name(),
            self.title(),
            findings,
            &format!("{} is valid", cfg.file),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use tempfile::tempdir;

    fn ctx_with(files: &[(&str, &str)]) -> (tempfile::TempDir, CheckContext) {
        let tmp = tempdir().unwrap();
        for (name, body) in files {
            fs::write(tmp.path().join(name), body).unwrap();
        }
        let ctx = CheckContext::new(tmp.path(), Config::default());
        (tmp, ctx)
    }

    #[test]
    fn every_disallowed_setting_is_reported() {
        let (_tmp, ctx) = ctx_with(&[(
            "next.config.js",
            "module.exports = { output: 'export', trailingSlash: true, images: { unoptimized: true } }",
        )]);
        let v = BuildConfigCheck.run(&ctx).unwrap();
        assert_eq!(v.status, Status::Fail);
        assert_eq!(v.messages.len(), 3);
        assert!(v.messages[0].starts_with("[output-mode] matched \"output: 'export'\""));
        assert!(v.messages[1].starts_with("[trailing-slash]"));
        assert!(v.messages[2].starts_with("[unoptimized-images]"));
    }

    #[test]
    fn clean_build_config_passes() {
        let (_tmp, ctx) = ctx_with(&[("next.config.js", "module.exports = { reactStrictMode: true }")]);
        assert_eq!(BuildConfigCheck.run(&ctx).unwrap().status, Status::Pass);
    }

    #[test]
    fn missing_build_config_fails() {
        let (_tmp, ctx) = ctx_with(&[]);
        let v = BuildConfigCheck.run(&ctx).unwrap();
        assert_eq!(v.status, Status::Fail);
        assert_eq!(v.messages, vec!["next.config.js not found"]);
    }

    #[test]
    fn npmrc_requires_settings() {
        let (_tmp, ctx) = ctx_with(&[(".npmrc", "fund=false\n")]);
        let v = PackageManagerCheck.run(&ctx).unwrap();
        assert_eq!(v.status, Status::Fail);
        assert!(v.messages[0].contains("legacy-peer-deps=true"));

        let (_tmp, ctx) = ctx_with(&[(".npmrc", "legacy-peer-deps=true\n")]);
        assert_eq!(PackageManagerCheck.run(&ctx).unwrap().status, Status::Pass);
    }

    #[test]
    fn absent_deploy_config_only_warns() {
        let (_tmp, ctx) = ctx_with(&[]);
        assert_eq!(DeployConfigCheck.run(&ctx).unwrap().status, Status::Warn);
    }

    #[test]
    fn invalid_deploy_config_is_parse_error() {
        let (_tmp, ctx) = ctx_with(&[("vercel.json", "{ not json")]);
        let err = DeployConfigCheck.run(&ctx).unwrap_err();
        assert!(matches!(err, DeployCheckError::ParseError { .. }));
    }

    #[test]
    fn forbidden_keys_and_expected_values() {
        let (_tmp, ctx) = ctx_with(&[(
            "vercel.json",
            r#"{"framework": "vite", "buildCommand": "npm run build"}"#,
        )]);
        let v = DeployConfigCheck.run(&ctx).unwrap();
        assert_eq!(v.status, Status::Fail);
        assert_eq!(v.messages.len(), 2);
        assert!(v.messages[0].contains("buildCommand"));
        assert!(v.messages[1].contains("\"nextjs\""));
        assert!(v.messages[1].contains("\"vite\""));

        let (_tmp, ctx) = ctx_with(&[("vercel.json", r#"{"framework": "nextjs"}"#)]);
        assert_eq!(DeployConfigCheck.run(&ctx).unwrap().status, Status::Pass);
    }
}
