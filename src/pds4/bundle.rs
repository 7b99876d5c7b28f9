//! Product variants, `FullBundle`, and the bundle loader (C4).

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::pds4::consts::SUPERSEDED_DIR;
use crate::pds4::error::{PdsError, Result};
use crate::pds4::inventory::CollectionInventory;
use crate::pds4::label::{self, ProductLabel};

/// A basic (observational/ancillary/document) product.
#[derive(Debug, Clone)]
pub struct BasicProduct {
    pub label: ProductLabel,
    pub label_path: PathBuf,
    pub data_paths: Vec<PathBuf>,
}

/// A collection product, paired with its parsed inventory.
#[derive(Debug, Clone)]
pub struct CollectionProduct {
    pub label: ProductLabel,
    pub label_path: PathBuf,
    pub inventory_path: PathBuf,
    pub inventory: CollectionInventory,
}

/// The bundle product. At most one README may be tracked per the
/// filesystem layout contract.
#[derive(Debug, Clone)]
pub struct BundleProduct {
    pub label: ProductLabel,
    pub label_path: PathBuf,
    pub readme_path: Option<PathBuf>,
}

/// The on-disk snapshot of one bundle directory, partitioned into live
/// and superseded buckets per product kind.
#[derive(Debug, Clone, Default)]
pub struct FullBundle {
    pub path: PathBuf,
    pub bundles: Vec<BundleProduct>,
    pub superseded_bundles: Vec<BundleProduct>,
    pub collections: Vec<CollectionProduct>,
    pub superseded_collections: Vec<CollectionProduct>,
    pub products: Vec<BasicProduct>,
    pub superseded_products: Vec<BasicProduct>,
}

impl FullBundle {
    /// The single live bundle product. Callers may rely on exactly one
    /// being present — the loader enforces this invariant.
    pub fn bundle(&self) -> &BundleProduct {
        &self.bundles[0]
    }
}

fn is_collection(path: &str) -> bool {
    path.contains("collection")
}

fn is_bundle(path: &str) -> bool {
    path.contains("bundle")
}

fn is_superseded(path: &str) -> bool {
    path.contains(SUPERSEDED_DIR)
}

/// Walks `root`, classifies every `.xml` label by path substring, and
/// assembles a `FullBundle`. Fails `NoBundleLabel` if no live bundle
/// label is found.
pub fn load_local_bundle(root: impl AsRef<Path>) -> Result<FullBundle> {
    let root = root.as_ref();
    info!("loading bundle: {}", root.display());

    let label_paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().map(|e| e == "xml").unwrap_or(false))
        .collect();

    let mut bundle = FullBundle {
        path: root.to_path_buf(),
        ..Default::default()
    };

    for label_path in label_paths {
        let path_str = label_path.to_string_lossy().to_string();
        let superseded = is_superseded(&path_str);

        if is_bundle(&path_str) {
            let product = load_bundle_product(&label_path)?;
            debug!("loaded bundle label {}", label_path.display());
            if superseded {
                bundle.superseded_bundles.push(product);
            } else {
                bundle.bundles.push(product);
            }
        } else if is_collection(&path_str) {
            let product = load_collection_product(&label_path)?;
            debug!("loaded collection label {}", label_path.display());
            if superseded {
                bundle.superseded_collections.push(product);
            } else {
                bundle.collections.push(product);
            }
        } else {
            let product = load_basic_product(&label_path)?;
            debug!("loaded product label {}", label_path.display());
            if superseded {
                bundle.superseded_products.push(product);
            } else {
                bundle.products.push(product);
            }
        }
    }

    if bundle.bundles.len() != 1 {
        return Err(PdsError::NoBundleLabel(format!(
            "{} (found {} live bundle labels, expected exactly 1)",
            root.display(),
            bundle.bundles.len()
        )));
    }

    Ok(bundle)
}

fn load_bundle_product(label_path: &Path) -> Result<BundleProduct> {
    let label = label::read_label(label_path)?;
    let readme_path = label_path.parent().map(|dir| dir.join("readme.txt"));
    let readme_path = readme_path.filter(|p| p.exists());

    Ok(BundleProduct {
        label,
        label_path: label_path.to_path_buf(),
        readme_path,
    })
}

fn load_collection_product(label_path: &Path) -> Result<CollectionProduct> {
    let label = label::read_label(label_path)?;
    let file_name = label
        .file_areas
        .first()
        .ok_or_else(|| PdsError::General(format!("collection label {} has no file area", label_path.display())))?
        .file_name
        .clone();

    let dir = label_path
        .parent()
        .ok_or_else(|| PdsError::General("label path has no parent directory".to_string()))?;
    let inventory_path = dir.join(&file_name);

    let inventory_text = fs::read_to_string(&inventory_path)?;
    let inventory = CollectionInventory::from_csv(&inventory_text)?;

    Ok(CollectionProduct {
        label,
        label_path: label_path.to_path_buf(),
        inventory_path,
        inventory,
    })
}

fn load_basic_product(label_path: &Path) -> Result<BasicProduct> {
    let label = label::read_label(label_path)?;
    let dir = label_path
        .parent()
        .ok_or_else(|| PdsError::General("label path has no parent directory".to_string()))?;

    let mut data_paths: Vec<PathBuf> = label.file_areas.iter().map(|fa| dir.join(&fa.file_name)).collect();

    if let Some(document) = &label.document {
        data_paths.extend(document.filenames().map(|name| dir.join(name)));
    }

    Ok(BasicProduct {
        label,
        label_path: label_path.to_path_buf(),
        data_paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_helpers() {
        assert!(is_bundle("/root/bundle_urn.xml"));
        assert!(is_collection("/root/collection/collection_urn.xml"));
        assert!(!is_bundle("/root/collection/product.xml"));
        assert!(is_superseded("/root/SUPERSEDED/v1_0/product.xml"));
        assert!(!is_superseded("/root/product.xml"));
    }
}
