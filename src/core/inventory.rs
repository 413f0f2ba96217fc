//! Physical asset inventory under the public image directory.
//!
//! A missing directory is not an error: it produces an empty inventory so the
//! audit can still report every reference as missing.

use crate::core::error::DeployCheckError;
use crate::core::scan::{self, Scanner};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Raster,
    Vector,
    Other,
}

impl AssetClass {
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "bmp" | "ico" => AssetClass::Raster,
            "svg" => AssetClass::Vector,
            _ => AssetClass::Other,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    /// Path relative to the inventory directory (`/`-separated).
    pub name: String,
    pub size: u64,
    pub class: AssetClass,
}

#[derive(Debug, Clone)]
pub struct AssetInventory {
    exists: bool,
    entries: Vec<InventoryEntry>,
}

impl AssetInventory {
    /// List assets in `dir` whose extension is in `extensions`.
    ///
    /// Non-recursive unless `recursive` is set, in which case entries are
    /// named by their sub-path (`work/a.png`).
    pub fn load(
        dir: &Path,
        extensions: &[String],
        recursive: bool,
    ) -> Result<AssetInventory, DeployCheckError> {
        if !dir.is_dir() {
            return Ok(AssetInventory {
                exists: false,
                entries: Vec::new(),
            });
        }

        let extensions = scan::normalize_extensions(extensions);
        let records = if recursive {
            Scanner::new(dir)
                .extensions(&extensions)
                .iter()?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            scan::list_dir(dir)?
                .into_iter()
                .filter(|r| !r.is_dir && scan::has_extension(&r.path, &extensions))
                .collect()
        };

        let entries = records
            .into_iter()
            .map(|r| InventoryEntry {
                class: AssetClass::from_name(&r.relative),
                name: r.relative,
                size: r.size,
            })
            .collect();

        Ok(AssetInventory {
            exists: true,
            entries,
        })
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
