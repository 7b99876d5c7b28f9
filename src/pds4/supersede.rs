//! Supersede/merge engine (C6): combines a previous bundle delivery and a
//! delta delivery into a merged tree.
//!
//! Orchestration: partition each product kind into keep/supersede by LID overlap, copy
//! labels and data to their planned paths, merge the inventories of
//! superseded collections, then carry forward anything that was already
//! superseded in the previous delivery untouched.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::pds4::bundle::{BasicProduct, BundleProduct, CollectionProduct, FullBundle};
use crate::pds4::digest::{md5_hex, HexDigest};
use crate::pds4::error::Result;
use crate::pds4::ids::{Lid, Vid};
use crate::pds4::inventory::CollectionInventory;
use crate::pds4::label::{BundleMemberEntry, MemberReference};
use crate::pds4::labeledit;
use crate::pds4::paths::{generate_product_path, relocate_path};
use crate::pds4::validate::patch_bundle_member_entries;

/// Anything with a label path and an identifying LIDVID, so the
/// partition/copy helpers below work uniformly over bundles, collections,
/// and basic products.
trait Product {
    fn lid(&self) -> &Lid;
    fn vid(&self) -> &Vid;
    fn label_path(&self) -> &Path;
}

impl Product for BundleProduct {
    fn lid(&self) -> &Lid {
        &self.label.identification_area.lidvid.lid
    }
    fn vid(&self) -> &Vid {
        &self.label.identification_area.lidvid.vid
    }
    fn label_path(&self) -> &Path {
        &self.label_path
    }
}

impl Product for CollectionProduct {
    fn lid(&self) -> &Lid {
        &self.label.identification_area.lidvid.lid
    }
    fn vid(&self) -> &Vid {
        &self.label.identification_area.lidvid.vid
    }
    fn label_path(&self) -> &Path {
        &self.label_path
    }
}

impl Product for BasicProduct {
    fn lid(&self) -> &Lid {
        &self.label.identification_area.lidvid.lid
    }
    fn vid(&self) -> &Vid {
        &self.label.identification_area.lidvid.vid
    }
    fn label_path(&self) -> &Path {
        &self.label_path
    }
}

fn find_superseded<'a, T: Product>(previous: &'a [T], new: &[T]) -> (Vec<&'a T>, Vec<&'a T>) {
    let new_lids: std::collections::HashSet<&Lid> = new.iter().map(Product::lid).collect();
    let mut keep = Vec::new();
    let mut supersede = Vec::new();
    for p in previous {
        if new_lids.contains(p.lid()) {
            supersede.push(p);
        } else {
            keep.push(p);
        }
    }
    (keep, supersede)
}

fn copy_to_path(src: &Path, dest: &Path, dry_run: bool) -> Result<()> {
    debug!("{} -> {}", src.display(), dest.display());
    if dry_run {
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dest)?;
    Ok(())
}

fn planned_path(label_path: &Path, old_base: &Path, new_base: &Path, superseded: bool, vid: &Vid) -> PathBuf {
    let versioned = generate_product_path(label_path, superseded, Some(vid));
    relocate_path(versioned, old_base, new_base)
}

fn do_copy_labels<T: Product>(products: &[&T], old_base: &Path, new_base: &Path, superseded: bool, dry_run: bool) -> Result<()> {
    for p in products {
        let dest = planned_path(p.label_path(), old_base, new_base, superseded, p.vid());
        copy_to_path(p.label_path(), &dest, dry_run)?;
    }
    Ok(())
}

fn do_copy_data(products: &[&BasicProduct], old_base: &Path, new_base: &Path, superseded: bool, dry_run: bool) -> Result<()> {
    for p in products {
        for data_path in &p.data_paths {
            let dest = planned_path(data_path, old_base, new_base, superseded, p.vid());
            copy_to_path(data_path, &dest, dry_run)?;
        }
    }
    Ok(())
}

/// Copies each bundle's README to its planned path. Every live previous
/// bundle README is forced under `SUPERSEDED/vMAJOR_MINOR/` regardless of
/// whether the bundle label itself landed in the keep or supersede
/// partition — the bundle as a whole is being superseded by the delta's
/// bundle label taking the live position, even if the README's own bytes
/// are unchanged. Delta bundle READMEs are mirrored to their live path.
fn do_copy_readmes(previous_bundles: &[BundleProduct], delta_bundles: &[BundleProduct], previous_base: &Path, delta_base: &Path, merged_base: &Path, dry_run: bool) -> Result<()> {
    for bundle in previous_bundles {
        if let Some(readme) = &bundle.readme_path {
            let versioned = generate_product_path(readme, true, Some(bundle.vid()));
            let dest = relocate_path(versioned, previous_base, merged_base);
            copy_to_path(readme, &dest, dry_run)?;
        }
    }
    for bundle in delta_bundles {
        if let Some(readme) = &bundle.readme_path {
            let dest = relocate_path(readme, delta_base, merged_base);
            copy_to_path(readme, &dest, dry_run)?;
        }
    }
    Ok(())
}

/// Carries forward collections that did not change: the inventory is
/// copied unmodified from the previous delivery to its mirrored merged
/// path (never superseded, so no `SUPERSEDED/` rewrite applies).
fn copy_unmodified_collections(collections: &[&CollectionProduct], old_base: &Path, new_base: &Path, dry_run: bool) -> Result<()> {
    for c in collections {
        let dest = relocate_path(&c.inventory_path, old_base, new_base);
        copy_to_path(&c.inventory_path, &dest, dry_run)?;
    }
    Ok(())
}

struct MergedCollection {
    lid: Lid,
    records: usize,
    file_size: u64,
    md5: HexDigest,
}

/// For each previous collection being superseded, finds the matching
/// delta collection by collection id, ingests previous-then-delta into a
/// fresh inventory, and writes the merged CSV at the relocated inventory
/// path. Returns enough detail for the caller to patch each merged
/// collection label's `records`/`file_size`/`md5_checksum`.
fn generate_collections(
    previous_to_supersede: &[&CollectionProduct],
    new_collections: &[CollectionProduct],
    previous_base: &Path,
    merged_base: &Path,
    dry_run: bool,
) -> Result<Vec<MergedCollection>> {
    let mut merged = Vec::new();

    for previous in previous_to_supersede {
        let collection_id = previous.label.identification_area.collection_id.clone();
        let Some(new_collection) = new_collections
            .iter()
            .find(|c| c.label.identification_area.collection_id == collection_id)
        else {
            warn!("no delta collection found matching previous collection {}", previous.lid());
            continue;
        };

        let mut inventory = CollectionInventory::new();
        inventory.ingest_new_inventory(&previous.inventory)?;
        inventory.ingest_new_inventory(&new_collection.inventory)?;

        let csv = inventory.to_csv();
        let inventory_path = relocate_path(&previous.inventory_path, previous_base, merged_base);

        if !dry_run {
            if let Some(parent) = inventory_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&inventory_path, &csv)?;
        }

        merged.push(MergedCollection {
            lid: previous.lid().clone(),
            records: inventory.len(),
            file_size: csv.len() as u64,
            md5: md5_hex(csv.as_bytes()),
        });
    }

    Ok(merged)
}

fn copy_previously_superseded_products(
    products: &[BasicProduct],
    collections: &[CollectionProduct],
    bundles: &[BundleProduct],
    old_base: &Path,
    new_base: &Path,
    dry_run: bool,
) -> Result<()> {
    for bundle in bundles {
        let dest = relocate_path(&bundle.label_path, old_base, new_base);
        copy_to_path(&bundle.label_path, &dest, dry_run)?;
        if let Some(readme) = &bundle.readme_path {
            let readme_dest = relocate_path(readme, old_base, new_base);
            copy_to_path(readme, &readme_dest, dry_run)?;
        }
    }
    for collection in collections {
        let label_dest = relocate_path(&collection.label_path, old_base, new_base);
        copy_to_path(&collection.label_path, &label_dest, dry_run)?;
        let inventory_dest = relocate_path(&collection.inventory_path, old_base, new_base);
        copy_to_path(&collection.inventory_path, &inventory_dest, dry_run)?;
    }
    for product in products {
        let label_dest = relocate_path(&product.label_path, old_base, new_base);
        copy_to_path(&product.label_path, &label_dest, dry_run)?;
        for data_path in &product.data_paths {
            if data_path.exists() {
                let data_dest = relocate_path(data_path, old_base, new_base);
                copy_to_path(data_path, &data_dest, dry_run)?;
            }
        }
    }
    Ok(())
}

/// Runs the full merge: partitions each product kind, copies labels and
/// data to their planned paths, merges superseded collection inventories,
/// patches the merged collection labels, carries forward previously
/// superseded artifacts untouched, and (in JAXA mode) completes the
/// merged bundle label with entries for collections the delta omitted.
pub fn supersede(previous: &FullBundle, delta: &FullBundle, merged_dir: impl AsRef<Path>, dry_run: bool, jaxa: bool) -> Result<()> {
    let merged_dir = merged_dir.as_ref();
    info!(
        "superseding {} with {} into {}",
        previous.path.display(),
        delta.path.display(),
        merged_dir.display()
    );
    if dry_run {
        info!("dry run: no files will be written");
    }

    let (bundles_keep, bundles_supersede) = find_superseded(&previous.bundles, &delta.bundles);
    let (collections_keep, collections_supersede) = find_superseded(&previous.collections, &delta.collections);
    let (products_keep, products_supersede) = find_superseded(&previous.products, &delta.products);

    do_copy_labels(&bundles_keep, &previous.path, merged_dir, false, dry_run)?;
    do_copy_labels(&collections_keep, &previous.path, merged_dir, false, dry_run)?;
    do_copy_labels(&products_keep, &previous.path, merged_dir, false, dry_run)?;

    do_copy_labels(&bundles_supersede, &previous.path, merged_dir, true, dry_run)?;
    do_copy_labels(&collections_supersede, &previous.path, merged_dir, true, dry_run)?;
    do_copy_labels(&products_supersede, &previous.path, merged_dir, true, dry_run)?;

    let delta_bundles: Vec<&BundleProduct> = delta.bundles.iter().collect();
    let delta_collections: Vec<&CollectionProduct> = delta.collections.iter().collect();
    let delta_products: Vec<&BasicProduct> = delta.products.iter().collect();
    do_copy_labels(&delta_collections, &delta.path, merged_dir, false, dry_run)?;
    do_copy_labels(&delta_bundles, &delta.path, merged_dir, false, dry_run)?;
    do_copy_labels(&delta_products, &delta.path, merged_dir, false, dry_run)?;

    do_copy_readmes(&previous.bundles, &delta.bundles, &previous.path, &delta.path, merged_dir, dry_run)?;

    do_copy_data(&products_keep, &previous.path, merged_dir, false, dry_run)?;
    do_copy_data(&products_supersede, &previous.path, merged_dir, true, dry_run)?;
    do_copy_data(&delta_products, &delta.path, merged_dir, false, dry_run)?;

    copy_unmodified_collections(&collections_keep, &previous.path, merged_dir, dry_run)?;

    let merged_collections = generate_collections(&collections_supersede, &delta.collections, &previous.path, merged_dir, dry_run)?;

    if !dry_run {
        for merged in &merged_collections {
            let label_path = find_merged_collection_label_path(&merged.lid, &delta.collections, &delta.path, merged_dir);
            let Some(label_path) = label_path else {
                warn!("could not locate merged label for collection {}", merged.lid);
                continue;
            };
            labeledit::update_collection_inventory(&label_path, &label_path, merged.records, merged.file_size, &merged.md5)?;
        }
    }

    copy_previously_superseded_products(
        &previous.superseded_products,
        &previous.superseded_collections,
        &previous.superseded_bundles,
        &previous.path,
        merged_dir,
        dry_run,
    )?;

    if jaxa {
        complete_jaxa_bundle(previous, delta, &collections_keep, merged_dir, dry_run)?;
    }

    Ok(())
}

fn find_merged_collection_label_path(lid: &Lid, delta_collections: &[CollectionProduct], delta_base: &Path, merged_base: &Path) -> Option<PathBuf> {
    delta_collections
        .iter()
        .find(|c| &c.label.identification_area.lidvid.lid == lid)
        .map(|c| relocate_path(&c.label_path, delta_base, merged_base))
}

fn complete_jaxa_bundle(
    previous: &FullBundle,
    delta: &FullBundle,
    collections_keep: &[&CollectionProduct],
    merged_dir: &Path,
    dry_run: bool,
) -> Result<()> {
    let declared: std::collections::HashSet<Lid> = delta
        .bundle()
        .label
        .bundle_member_entries
        .iter()
        .filter_map(|e| e.effective_lidvid().ok().map(|l| l.lid))
        .collect();

    let missing: Vec<BundleMemberEntry> = collections_keep
        .iter()
        .filter(|c| !declared.contains(c.lid()))
        .map(|c| BundleMemberEntry {
            member_status: "Primary".to_string(),
            reference_type: "bundle_has_collection".to_string(),
            reference: MemberReference::LidOnly(c.lid().to_string()),
        })
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let (patched, warnings) = patch_bundle_member_entries(&missing, &previous.collections);
    for w in &warnings {
        warn!("{}", w.message);
    }

    if dry_run {
        info!("dry run: would inject {} jaxa completion entries", patched.len());
        return Ok(());
    }

    let merged_bundle_label = relocate_path(&delta.bundle().label_path, &delta.path, merged_dir);
    labeledit::inject_bundle_member_entries(&merged_bundle_label, &patched)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pds4::ids::LidVid;

    #[test]
    fn find_superseded_partitions_by_lid() {
        struct Dummy {
            lid: Lid,
            vid: Vid,
            path: PathBuf,
        }
        impl Product for Dummy {
            fn lid(&self) -> &Lid {
                &self.lid
            }
            fn vid(&self) -> &Vid {
                &self.vid
            }
            fn label_path(&self) -> &Path {
                &self.path
            }
        }

        let a = LidVid::parse("urn:p:b:a::1.0").unwrap();
        let b = LidVid::parse("urn:p:b:b::1.0").unwrap();

        let previous = vec![
            Dummy { lid: a.lid.clone(), vid: a.vid, path: PathBuf::from("/a") },
            Dummy { lid: b.lid.clone(), vid: b.vid, path: PathBuf::from("/b") },
        ];
        let new = vec![Dummy { lid: a.lid.clone(), vid: a.vid, path: PathBuf::from("/a2") }];

        let (keep, supersede) = find_superseded(&previous, &new);
        assert_eq!(keep.len(), 1);
        assert_eq!(supersede.len(), 1);
        assert_eq!(supersede[0].lid, a.lid);
    }

    #[test]
    fn planned_path_inserts_superseded_for_flagged_products() {
        let vid = Vid::new(1, 0);
        let planned = planned_path(Path::new("/prev/bundle/collection/c.xml"), Path::new("/prev"), Path::new("/merged"), true, &vid);
        assert_eq!(planned, PathBuf::from("/merged/bundle/collection/SUPERSEDED/v1_0/c.xml"));
    }
}
