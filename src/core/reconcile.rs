//! Reconciliation of code references against the physical inventory.

use crate::core::inventory::{AssetInventory, InventoryEntry};
use crate::core::refs::ReferenceIndex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissingAsset {
    pub path: String,
    pub referenced_in: Vec<String>,
}

/// `found = refs ∩ inventory`, `missing = refs − inventory`,
/// `unused = inventory − refs`.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub found: Vec<String>,
    pub missing: Vec<MissingAsset>,
    pub unused: Vec<InventoryEntry>,
}

pub fn reconcile(references: &ReferenceIndex, inventory: &AssetInventory) -> Reconciliation {
    let present: FxHashSet<&str> = inventory.entries().iter().map(|e| e.name.as_str()).collect();

    let mut found = Vec::new();
    let mut missing = Vec::new();
    for path in references.paths() {
        if present.contains(path.as_str()) {
            found.push(path.clone());
        } else {
            missing.push(MissingAsset {
                path: path.clone(),
                referenced_in: references.origins(path),
            });
        }
    }

    let unused = inventory
        .entries()
        .iter()
        .filter(|e| !references.contains(&e.name))
        .cloned()
        .collect();

    Reconciliation {
        found,
        missing,
        unused,
    }
}
