//! Search-engine files and layout metadata.

use crate::core::coordinator::{Check, CheckContext};
use crate::core::error::DeployCheckError;
use crate::core::verdict::{Status, Verdict};
use std::fs;

pub struct SeoFilesCheck;

impl Check for SeoFilesCheck {
    fn name(&self) -> &'static str {
        "seo-files"
    }

    fn title(&self) -> &'static str {
        "SEO files"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let files = &ctx.config.seo.files;
        let findings = files
            .iter()
            .filter(|f| !ctx.path(f).is_file())
            .map(|f| (Status::Warn, format!("{} not found", f)))
            .collect();
        Ok(Verdict::from_findings(
            self.name(),
            self.title(),
            findings,
            &format!("{} SEO file(s) present", files.len()),
        ))
    }
}

pub struct SeoMetadataCheck;

impl Check for SeoMetadataCheck {
    fn name(&self) -> &'static str {
        "seo-metadata"
    }

    fn title(&self) -> &'static str {
        "SEO metadata"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let seo = &ctx.config.seo;
        let Some(layout) = seo.metadata_files.iter().find(|f| ctx.path(f).is_file()) else {
            return Ok(Verdict::fail(
                self.name(),
                self.title(),
                vec![format!(
                    "no layout file found (looked for {})",
                    seo.metadata_files.join(", ")
                )],
            ));
        };

        let content = fs::read_to_string(ctx.path(layout))?;
        let findings = seo
            .metadata_markers
            .iter()
            .filter(|m| !content.contains(m.as_str()))
            .map(|m| (Status::Warn, format!("{} does not contain `{}`", layout, m)))
            .collect();

        Ok(Verdict::from_findings(
            self.name(),
            self.title(),
            findings,
            &format!("{} declares page metadata", layout),
        ))
    }
}
