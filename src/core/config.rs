//! Project configuration (`deploycheck.toml`).
//!
//! Every field has a default, so a project without a configuration file gets
//! the stock Next.js/Vercel policy. Paths are relative to the project root.

use crate::core::error::DeployCheckError;
use crate::core::rules::{PatternRule, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "deploycheck.toml";
pub const CONFIG_ENV: &str = "DEPLOYCHECK_CONFIG";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub project: ProjectConfig,
    pub audit: AuditConfig,
    pub build_config: BuildConfigRules,
    pub package_manager: PackageManagerConfig,
    pub deploy_config: DeployTargetConfig,
    pub seo: SeoConfig,
    pub guards: Vec<GuardRule>,
    pub manifest: ManifestConfig,
    pub critical_assets: CriticalAssetsConfig,
    pub log_scan: LogScanConfig,
    pub lint: LintConfig,
    pub build: BuildConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directories scanned for asset references.
    pub source_dirs: Vec<String>,
    /// Directory names never descended into.
    pub exclude_dirs: Vec<String>,
    pub source_extensions: Vec<String>,
    /// Where reports and history are written.
    pub report_dir: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            source_dirs: strings(&["components", "app"]),
            exclude_dirs: strings(&["node_modules", ".next", "out", ".vercel", ".git"]),
            source_extensions: strings(&["js", "jsx", "ts", "tsx"]),
            report_dir: ".tmp".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub images_dir: String,
    pub reference_prefix: String,
    pub image_extensions: Vec<String>,
    pub recursive: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            images_dir: "public/images".to_string(),
            reference_prefix: "images".to_string(),
            image_extensions: strings(&["png", "jpg", "jpeg", "gif", "svg", "webp"]),
            recursive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfigRules {
    pub file: String,
    pub rules: Vec<PatternRule>,
}

impl Default for BuildConfigRules {
    fn default() -> Self {
        BuildConfigRules {
            file: "next.config.js".to_string(),
            rules: vec![
                PatternRule::new(
                    "output-mode",
                    r#"output:\s*['"](export|standalone)['"]"#,
                    Severity::Fail,
                    "static/standalone output mode breaks platform deploys; remove the `output` setting",
                ),
                PatternRule::new(
                    "trailing-slash",
                    r"trailingSlash:\s*true",
                    Severity::Fail,
                    "`trailingSlash: true` breaks platform routing; remove it",
                ),
                PatternRule::new(
                    "unoptimized-images",
                    r"unoptimized:\s*true",
                    Severity::Fail,
                    "`images.unoptimized: true` disables platform image optimization; remove it",
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageManagerConfig {
    pub file: String,
    pub required_settings: Vec<String>,
}

impl Default for PackageManagerConfig {
    fn default() -> Self {
        PackageManagerConfig {
            file: ".npmrc".to_string(),
            required_settings: strings(&["legacy-peer-deps=true"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployTargetConfig {
    pub file: String,
    pub forbidden_keys: Vec<String>,
    pub expected: BTreeMap<String, JsonValue>,
}

impl Default for DeployTargetConfig {
    fn default() -> Self {
        let mut expected = BTreeMap::new();
        expected.insert(
            "framework".to_string(),
            JsonValue::String("nextjs".to_string()),
        );
        DeployTargetConfig {
            file: "vercel.json".to_string(),
            forbidden_keys: strings(&["buildCommand", "outputDirectory"]),
            expected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeoConfig {
    pub files: Vec<String>,
    /// Candidate layout files; the first one that exists is inspected.
    pub metadata_files: Vec<String>,
    pub metadata_markers: Vec<String>,
}

impl Default for SeoConfig {
    fn default() -> Self {
        SeoConfig {
            files: strings(&["public/robots.txt", "public/sitemap.xml"]),
            metadata_files: strings(&[
                "app/layout.js",
                "app/layout.jsx",
                "app/layout.tsx",
                "app/layout.ts",
            ]),
            metadata_markers: strings(&["export const metadata", "title", "description"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GuardRule {
    pub name: String,
    pub file: String,
    pub when_contains: String,
    #[serde(default)]
    pub unless_contains: Vec<String>,
    pub message: String,
    #[serde(default = "default_guard_severity")]
    pub severity: Severity,
}

fn default_guard_severity() -> Severity {
    Severity::Warn
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    pub file: String,
    /// Dotted paths that should be present, e.g. `engines.node`.
    pub required_fields: Vec<String>,
    /// Dependencies whose declared versions are echoed in the report.
    pub tracked_dependencies: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        ManifestConfig {
            file: "package.json".to_string(),
            required_fields: strings(&["engines.node"]),
            tracked_dependencies: strings(&[
                "next",
                "react",
                "@react-three/fiber",
                "@react-three/drei",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct CriticalAssetsConfig {
    /// Paths relative to `public/`.
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogScanConfig {
    pub roots: Vec<String>,
    pub rules: Vec<PatternRule>,
    pub max_reported: usize,
    pub max_line_chars: usize,
}

impl Default for LogScanConfig {
    fn default() -> Self {
        LogScanConfig {
            roots: strings(&["."]),
            rules: vec![PatternRule::new(
                "console-statement",
                r"console\.(log|warn|error|debug|info)",
                Severity::Warn,
                "remove console statements before deploying",
            )],
            max_reported: 5,
            max_line_chars: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    pub enabled: bool,
    pub command: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for LintConfig {
    fn default() -> Self {
        LintConfig {
            enabled: true,
            command: strings(&["npm", "run", "lint"]),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub enabled: bool,
    pub command: Vec<String>,
    pub timeout_secs: u64,
    /// Builds finishing faster than this are flagged as suspicious.
    pub min_duration_secs: u64,
    pub fast_build_severity: Severity,
    /// Directory the build must produce.
    pub artifact_dir: String,
    /// Remove `artifact_dir` before building so a stale one cannot satisfy the post-condition.
    pub clean_artifact: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            enabled: true,
            command: strings(&["npm", "run", "build"]),
            timeout_secs: 600,
            min_duration_secs: 10,
            fast_build_severity: Severity::Warn,
            artifact_dir: ".next".to_string(),
            clean_artifact: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig { limit: 20 }
    }
}

impl Config {
    /// Resolve and load the configuration for `root`.
    ///
    /// Precedence: `explicit` path, then `DEPLOYCHECK_CONFIG`, then
    /// `<root>/deploycheck.toml`, then built-in defaults. An explicitly named
    /// file must exist.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Config, DeployCheckError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        if let Some(path) = named {
            let path = if path.is_absolute() {
                path
            } else {
                root.join(path)
            };
            if !path.is_file() {
                return Err(DeployCheckError::ConfigError(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(&path);
        }

        let default_path = root.join(CONFIG_FILE);
        if default_path.is_file() {
            Self::from_file(&default_path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Config, DeployCheckError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| DeployCheckError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Config, DeployCheckError> {
        toml::from_str(content).map_err(|e| DeployCheckError::ConfigError(e.to_string()))
    }

    /// Default configuration rendered as TOML, used by `deploycheck init`.
    pub fn default_toml() -> Result<String, DeployCheckError> {
        let body = toml::to_string_pretty(&Config::default())
            .map_err(|e| DeployCheckError::ConfigError(e.to_string()))?;
        Ok(format!(
            "# deploycheck configuration. Paths are relative to the project root.\n\n{}",
            body
        ))
    }

    pub fn report_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.project.report_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempdir().unwrap();
        let cfg = Config::load(tmp.path(), None).unwrap();
        assert_eq!(cfg.audit.images_dir, "public/images");
        assert_eq!(cfg.history.limit, 20);
        assert_eq!(cfg.build_config.rules.len(), 3);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = Config::from_toml_str(
            r#"
[build]
command = ["sh", "-c", "true"]
min_duration_secs = 0

[audit]
reference_prefix = "assets"
"#,
        )
        .unwrap();
        assert_eq!(cfg.build.command, vec!["sh", "-c", "true"]);
        assert_eq!(cfg.build.timeout_secs, 600);
        assert_eq!(cfg.audit.reference_prefix, "assets");
        assert_eq!(cfg.audit.images_dir, "public/images");
        assert!(cfg.lint.enabled);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Config::from_toml_str("[build]\ncomand = []\n").unwrap_err();
        assert!(matches!(err, DeployCheckError::ConfigError(_)));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let tmp = tempdir().unwrap();
        let err = Config::load(tmp.path(), Some(Path::new("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn default_toml_round_trips() {
        let rendered = Config::default_toml().unwrap();
        let cfg = Config::from_toml_str(&rendered).unwrap();
        assert_eq!(cfg.deploy_config.forbidden_keys.len(), 2);
        assert_eq!(
            cfg.deploy_config.expected.get("framework"),
            Some(&JsonValue::String("nextjs".to_string()))
        );
    }

    #[test]
    fn guards_parse_with_default_severity() {
        let cfg = Config::from_toml_str(
            r#"
[[guards]]
name = "hero-canvas"
file = "components/HeroCanvas.jsx"
when_contains = "<Canvas"
unless_contains = ["return null"]
message = "3D canvas is enabled"
"#,
        )
        .unwrap();
        assert_eq!(cfg.guards.len(), 1);
        assert_eq!(cfg.guards[0].severity, Severity::Warn);
    }
}
