//! Validation engine (C5): the readiness check.
//!
//! Each check returns a list of [`ValidationError`]s; nothing here ever
//! raises. The driver (or [`check_ready`]) treats any `error`-severity
//! entry as a blocking failure.

use std::collections::HashSet;
use std::fmt;

use log::info;

use crate::pds4::bundle::{BasicProduct, BundleProduct, CollectionProduct, FullBundle};
use crate::pds4::ids::{Lid, LidVid, Vid};
use crate::pds4::inventory::CollectionInventory;
use crate::pds4::label::{BundleMemberEntry, ModificationHistory, ProductLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    IncorrectlyIncrementedLidvid,
    NonLidvidReference,
    MissingVidFromLidvid,
    CollectionMissingFromPreviousBundle,
    CollectionMissingFromDeltaBundle,
    CollectionNotDeclared,
    DeclaredCollectionNotFound,
    MissingModificationHistory,
    MissingCurrentModificationDetail,
    NotEnoughModificationDetails,
    IncorrectModificationDetailCountForSupersedingProduct,
    IncorrectModificationDetailCountForNonSupersedingProduct,
    MismatchedModificationDetail,
    DuplicateProducts,
    ProductInconsistentFilenames,
    DataInconsistentFilename,
    PreviousProductMissing,
    PatchedLidReferenceWithCollectionLidvid,
    UnpatchableLidReference,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncorrectlyIncrementedLidvid => "incorrectly_incremented_lidvid",
            Self::NonLidvidReference => "non_lidvid_reference",
            Self::MissingVidFromLidvid => "missing_vid_from_lidvid",
            Self::CollectionMissingFromPreviousBundle => "collection_missing_from_previous_bundle",
            Self::CollectionMissingFromDeltaBundle => "collection_missing_from_delta_bundle",
            Self::CollectionNotDeclared => "collection_not_declared",
            Self::DeclaredCollectionNotFound => "declared_collection_not_found",
            Self::MissingModificationHistory => "missing_modification_history",
            Self::MissingCurrentModificationDetail => "missing_current_modification_detail",
            Self::NotEnoughModificationDetails => "not_enough_modification_details",
            Self::IncorrectModificationDetailCountForSupersedingProduct => {
                "incorrect_modification_detail_count_for_superseding_product"
            }
            Self::IncorrectModificationDetailCountForNonSupersedingProduct => {
                "incorrect_modification_detail_count_for_non_superseding_product"
            }
            Self::MismatchedModificationDetail => "mismatched_modification_detail",
            Self::DuplicateProducts => "duplicate_products",
            Self::ProductInconsistentFilenames => "product_inconsistent_filenames",
            Self::DataInconsistentFilename => "data_inconsistent_filename",
            Self::PreviousProductMissing => "previous_product_missing",
            Self::PatchedLidReferenceWithCollectionLidvid => "patched_lid_reference_with_collection_lidvid",
            Self::UnpatchableLidReference => "unpatchable_lid_reference",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
    pub error_type: ErrorType,
    pub severity: Severity,
}

impl ValidationError {
    fn new(message: impl Into<String>, error_type: ErrorType, severity: Severity) -> Self {
        Self {
            message: message.into(),
            error_type,
            severity,
        }
    }

    fn error(message: impl Into<String>, error_type: ErrorType) -> Self {
        Self::new(message, error_type, Severity::Error)
    }

    fn warning(message: impl Into<String>, error_type: ErrorType) -> Self {
        Self::new(message, error_type, Severity::Warning)
    }
}

// ---------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------

/// Runs the full readiness check and logs a `(severity, error_type)`
/// grouped summary alongside each bundle's label checksum.
pub fn check_ready(previous: &FullBundle, delta: &FullBundle, jaxa: bool) -> Vec<ValidationError> {
    info!(
        "checking readiness of delta bundle {} against {}",
        delta.path.display(),
        previous.path.display()
    );

    for bundle in &previous.bundles {
        info!("previous bundle checksum: {}", bundle.label.checksum);
    }
    for bundle in &delta.bundles {
        info!("delta bundle checksum: {}", bundle.label.checksum);
    }

    let errors = do_checkready(previous, delta, jaxa);

    if errors.is_empty() {
        info!("no errors encountered");
    } else {
        let mut counts: std::collections::BTreeMap<(Severity, ErrorType), usize> = std::collections::BTreeMap::new();
        for e in &errors {
            *counts.entry((e.severity, e.error_type)).or_insert(0) += 1;
        }
        for ((severity, error_type), count) in &counts {
            info!("  {severity} - {error_type}: {count}");
        }
        info!("total: {}", errors.len());
    }

    errors
}

// BTreeMap key ordering needs Ord on (Severity, ErrorType); derive via a
// manual impl since the enums are plain tags without natural order.
impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}
impl PartialOrd for ErrorType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ErrorType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

pub fn do_checkready(previous: &FullBundle, delta: &FullBundle, jaxa: bool) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(check_bundle_against_previous(
        previous.bundle(),
        delta.bundle(),
        &previous.collections,
        jaxa,
    ));
    errors.extend(check_bundle_against_collections(delta.bundle(), &delta.collections));

    if !errors.iter().any(|e| e.severity == Severity::Error) {
        for delta_collection in &delta.collections {
            let new_lid = &delta_collection.label.identification_area.lidvid.lid;
            if let Some(previous_collection) = previous
                .collections
                .iter()
                .find(|c| &c.label.identification_area.lidvid.lid == new_lid)
            {
                errors.extend(check_collection_against_previous(previous_collection, delta_collection));
            }
        }

        errors.extend(check_filename_consistency(&previous.products, &delta.products));
    }

    errors
}

// ---------------------------------------------------------------------
// V1: bundle vs previous bundle
// ---------------------------------------------------------------------

fn check_bundle_against_previous(
    previous: &BundleProduct,
    delta: &BundleProduct,
    previous_collections: &[CollectionProduct],
    jaxa: bool,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // V1a
    errors.extend(check_modification_history(&previous.label, &delta.label));

    // V1b
    let prev_lidvid = &previous.label.identification_area.lidvid;
    let delta_lidvid = &delta.label.identification_area.lidvid;
    if !prev_lidvid.vid.is_legal_bump(&delta_lidvid.vid, false) {
        errors.push(ValidationError::error(
            format!(
                "bundle {delta_lidvid} is not a legal increment of previous bundle {prev_lidvid}"
            ),
            ErrorType::IncorrectlyIncrementedLidvid,
        ));
    }

    // V1c
    for entry in &delta.label.bundle_member_entries {
        if !entry.has_lidvid_reference() {
            errors.push(ValidationError::error(
                format!(
                    "delta bundle member entry for {} has no lidvid_reference",
                    entry.reference_lid_string()
                ),
                ErrorType::NonLidvidReference,
            ));
        }
    }

    let (_, patch_warnings) = patch_bundle_member_entries(&previous.label.bundle_member_entries, previous_collections);
    errors.extend(patch_warnings);

    // V1d
    for entry in &delta.label.bundle_member_entries {
        errors.extend(check_member_vid_presence(entry));
    }

    // V1e
    for entry in &delta.label.bundle_member_entries {
        let Ok(delta_member_lidvid) = entry.effective_lidvid() else {
            continue;
        };
        if !delta_member_lidvid.vid.is_superseding() {
            continue;
        }

        match previous
            .label
            .bundle_member_entries
            .iter()
            .find_map(|e| e.effective_lidvid().ok().filter(|l| l.lid == delta_member_lidvid.lid))
        {
            Some(prev_member_lidvid) => {
                if !prev_member_lidvid.vid.is_legal_bump(&delta_member_lidvid.vid, false) {
                    errors.push(ValidationError::error(
                        format!(
                            "collection member {delta_member_lidvid} is not a legal increment of {prev_member_lidvid}"
                        ),
                        ErrorType::IncorrectlyIncrementedLidvid,
                    ));
                }
            }
            None => {
                errors.push(ValidationError::error(
                    format!("collection member {delta_member_lidvid} has no prior version in the previous bundle"),
                    ErrorType::CollectionMissingFromPreviousBundle,
                ));
            }
        }
    }

    // V1f
    if !jaxa {
        let delta_lids: HashSet<Lid> = delta
            .label
            .bundle_member_entries
            .iter()
            .filter_map(|e| e.effective_lidvid().ok().map(|l| l.lid))
            .collect();

        for entry in &previous.label.bundle_member_entries {
            let Ok(prev_member_lidvid) = entry.effective_lidvid() else {
                continue;
            };
            if !delta_lids.contains(&prev_member_lidvid.lid) {
                errors.push(ValidationError::error(
                    format!("previous bundle member {prev_member_lidvid} is missing from the delta bundle"),
                    ErrorType::CollectionMissingFromDeltaBundle,
                ));
            }
        }
    }

    errors
}

fn check_member_vid_presence(entry: &BundleMemberEntry) -> Vec<ValidationError> {
    let lid_str = entry.reference_lid_string();
    if is_context_reference(lid_str) {
        return Vec::new();
    }

    match entry.effective_lidvid() {
        Ok(_) => Vec::new(),
        Err(_) => vec![ValidationError::error(
            format!("bundle member reference '{lid_str}' carries no real VID"),
            ErrorType::MissingVidFromLidvid,
        )],
    }
}

fn is_context_reference(lid_str: &str) -> bool {
    Lid::parse(lid_str)
        .ok()
        .and_then(|lid| lid.collection_component().map(|s| s == "context"))
        .unwrap_or(false)
}

/// For each entry carrying only a `lid_reference`, finds the collection
/// whose LID matches and substitutes a synthesized entry whose
/// `lidvid_reference` is that collection's current LIDVID.
pub fn patch_bundle_member_entries(
    entries: &[BundleMemberEntry],
    collections: &[CollectionProduct],
) -> (Vec<BundleMemberEntry>, Vec<ValidationError>) {
    let mut patched = Vec::with_capacity(entries.len());
    let mut warnings = Vec::new();

    for entry in entries {
        if entry.has_lidvid_reference() {
            patched.push(entry.clone());
            continue;
        }

        let lid_str = entry.reference_lid_string();
        let matching = Lid::parse(lid_str)
            .ok()
            .and_then(|lid| collections.iter().find(|c| c.label.identification_area.lidvid.lid == lid));

        match matching {
            Some(collection) => {
                let lidvid = collection.label.identification_area.lidvid.clone();
                warnings.push(ValidationError::warning(
                    format!("patched lid-only reference '{lid_str}' with collection lidvid {lidvid}"),
                    ErrorType::PatchedLidReferenceWithCollectionLidvid,
                ));
                patched.push(BundleMemberEntry {
                    member_status: entry.member_status.clone(),
                    reference_type: entry.reference_type.clone(),
                    reference: crate::pds4::label::MemberReference::Full(lidvid.to_string()),
                });
            }
            None => {
                warnings.push(ValidationError::warning(
                    format!("could not patch lid-only reference '{lid_str}': no matching collection"),
                    ErrorType::UnpatchableLidReference,
                ));
                patched.push(entry.clone());
            }
        }
    }

    (patched, warnings)
}

// ---------------------------------------------------------------------
// V2: bundle vs its collections
// ---------------------------------------------------------------------

fn check_bundle_against_collections(bundle: &BundleProduct, collections: &[CollectionProduct]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let declared: HashSet<Lid> = bundle
        .label
        .bundle_member_entries
        .iter()
        .filter_map(|e| e.effective_lidvid().ok().map(|l| l.lid))
        .collect();
    let on_disk: HashSet<Lid> = collections
        .iter()
        .map(|c| c.label.identification_area.lidvid.lid.clone())
        .collect();

    for lid in &declared {
        if !on_disk.contains(lid) {
            errors.push(ValidationError::warning(
                format!("bundle declares collection {lid} which was not found on disk"),
                ErrorType::DeclaredCollectionNotFound,
            ));
        }
    }

    for lid in &on_disk {
        if !declared.contains(lid) {
            errors.push(ValidationError::error(
                format!("collection {lid} on disk is not declared by the bundle label"),
                ErrorType::CollectionNotDeclared,
            ));
        }
    }

    errors
}

// ---------------------------------------------------------------------
// V3 + V4: per-collection increment and duplicate detection
// ---------------------------------------------------------------------

fn check_collection_against_previous(previous: &CollectionProduct, delta: &CollectionProduct) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    errors.extend(check_modification_history(&previous.label, &delta.label));
    errors.extend(check_collection_increment(&previous.inventory, &delta.inventory));
    errors.extend(check_collection_duplicates(&previous.inventory, &delta.inventory));
    errors
}

fn check_collection_increment(previous: &CollectionInventory, delta: &CollectionInventory) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for lid_str in previous.lids() {
        let Ok(lid) = Lid::parse(lid_str) else { continue };
        let Some(prev_item) = previous.get(&lid) else { continue };
        if let Some(delta_item) = delta.get(&lid) {
            if !prev_item.lidvid.vid.is_legal_bump(&delta_item.lidvid.vid, false) {
                errors.push(ValidationError::error(
                    format!(
                        "{} is not a legal increment of {}",
                        delta_item.lidvid, prev_item.lidvid
                    ),
                    ErrorType::IncorrectlyIncrementedLidvid,
                ));
            }
        }
    }

    errors
}

fn check_collection_duplicates(previous: &CollectionInventory, delta: &CollectionInventory) -> Vec<ValidationError> {
    let previous_rows: HashSet<String> = previous.to_csv().lines().map(|l| l.trim_end().to_string()).collect();
    let mut errors = Vec::new();

    for row in delta.to_csv().lines() {
        let row = row.trim_end();
        if previous_rows.contains(row) {
            errors.push(ValidationError::error(
                format!("inventory row '{row}' appears in both previous and delta inventories"),
                ErrorType::DuplicateProducts,
            ));
        }
    }

    errors
}

// ---------------------------------------------------------------------
// V5: modification history
// ---------------------------------------------------------------------

fn check_modification_history(previous: &ProductLabel, delta: &ProductLabel) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let previous_history = match &previous.identification_area.modification_history {
        Some(h) => h,
        None => {
            errors.push(ValidationError::error(
                format!(
                    "{} has no modification history",
                    previous.identification_area.lidvid
                ),
                ErrorType::MissingModificationHistory,
            ));
            return errors;
        }
    };
    let delta_history = match &delta.identification_area.modification_history {
        Some(h) => h,
        None => {
            errors.push(ValidationError::error(
                format!("{} has no modification history", delta.identification_area.lidvid),
                ErrorType::MissingModificationHistory,
            ));
            return errors;
        }
    };

    if !has_current_detail(previous_history, &previous.identification_area.lidvid.vid) {
        errors.push(ValidationError::error(
            format!(
                "{} has no modification detail for its current version",
                previous.identification_area.lidvid
            ),
            ErrorType::MissingCurrentModificationDetail,
        ));
    }
    if !has_current_detail(delta_history, &delta.identification_area.lidvid.vid) {
        errors.push(ValidationError::error(
            format!(
                "{} has no modification detail for its current version",
                delta.identification_area.lidvid
            ),
            ErrorType::MissingCurrentModificationDetail,
        ));
    }

    // Current-detail presence and history-length/content agreement are
    // independent conditions; a label can fail either or both, so the count
    // and mismatch checks below always run rather than short-circuiting.
    let mut previous_sorted = previous_history.modification_details.clone();
    previous_sorted.sort_by(|a, b| a.version_id.cmp(&b.version_id));
    let mut delta_sorted = delta_history.modification_details.clone();
    delta_sorted.sort_by(|a, b| a.version_id.cmp(&b.version_id));

    if previous_sorted.len() > delta_sorted.len() {
        errors.push(ValidationError::error(
            format!(
                "{} modification history is shorter than the previous version's",
                delta.identification_area.lidvid
            ),
            ErrorType::NotEnoughModificationDetails,
        ));
        return errors;
    }

    for (a, b) in previous_sorted.iter().zip(delta_sorted.iter()) {
        if a.version_id != b.version_id || a.modification_date != b.modification_date || a.description != b.description {
            errors.push(ValidationError::error(
                format!(
                    "modification detail for version {} does not match between previous and delta",
                    a.version_id
                ),
                ErrorType::MismatchedModificationDetail,
            ));
        }
    }

    let delta_vid = &delta.identification_area.lidvid.vid;
    let previous_vid = &previous.identification_area.lidvid.vid;

    if delta_vid > previous_vid {
        if delta_sorted.len() != previous_sorted.len() + 1 {
            errors.push(ValidationError::error(
                format!(
                    "{} bumped its version but does not have exactly one new modification detail",
                    delta.identification_area.lidvid
                ),
                ErrorType::IncorrectModificationDetailCountForSupersedingProduct,
            ));
        }
    } else if delta_sorted.len() != previous_sorted.len() {
        errors.push(ValidationError::error(
            format!(
                "{} did not change version but its modification detail count changed",
                delta.identification_area.lidvid
            ),
            ErrorType::IncorrectModificationDetailCountForNonSupersedingProduct,
        ));
    }

    errors
}

fn has_current_detail(history: &ModificationHistory, vid: &Vid) -> bool {
    let vid_str = vid.to_string();
    history.modification_details.iter().any(|d| d.version_id == vid_str)
}

// ---------------------------------------------------------------------
// V7: filename consistency
// ---------------------------------------------------------------------

fn check_filename_consistency(previous: &[BasicProduct], delta: &[BasicProduct]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for delta_product in delta {
        let delta_lidvid = &delta_product.label.identification_area.lidvid;
        if !delta_lidvid.vid.is_superseding() {
            continue;
        }

        let Some(previous_product) = previous
            .iter()
            .find(|p| p.label.identification_area.lidvid.lid == delta_lidvid.lid)
        else {
            continue;
        };

        let prev_label_name = basename(&previous_product.label_path);
        let delta_label_name = basename(&delta_product.label_path);
        if prev_label_name != delta_label_name {
            errors.push(ValidationError::error(
                format!("{delta_lidvid} label filename changed from {prev_label_name} to {delta_label_name}"),
                ErrorType::ProductInconsistentFilenames,
            ));
        }

        let prev_data: HashSet<String> = previous_product.data_paths.iter().map(|p| basename(p)).collect();
        let delta_data: HashSet<String> = delta_product.data_paths.iter().map(|p| basename(p)).collect();
        if prev_data != delta_data {
            errors.push(ValidationError::error(
                format!("{delta_lidvid} data filenames changed"),
                ErrorType::DataInconsistentFilename,
            ));
        }
    }

    errors
}

fn basename(path: &std::path::Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pds4::digest::md5_hex;
    use crate::pds4::ids::{Lid, LidVid, Vid};
    use crate::pds4::label::{IdentificationArea, MemberReference, ModificationDetail};

    fn lidvid(s: &str) -> LidVid {
        LidVid::parse(s).unwrap()
    }

    fn label_with(lidvid_str: &str, details: Vec<(&str, &str, &str)>) -> ProductLabel {
        ProductLabel {
            checksum: md5_hex(b""),
            identification_area: IdentificationArea {
                lidvid: lidvid(lidvid_str),
                collection_id: None,
                modification_history: Some(ModificationHistory {
                    modification_details: details
                        .into_iter()
                        .map(|(v, d, desc)| ModificationDetail {
                            version_id: v.to_string(),
                            modification_date: Some(d.to_string()),
                            description: Some(desc.to_string()),
                        })
                        .collect(),
                }),
            },
            file_areas: Vec::new(),
            context_area: None,
            discipline_area: None,
            document: None,
            bundle_member_entries: Vec::new(),
        }
    }

    #[test]
    fn legal_minor_bump_passes_modification_history() {
        let previous = label_with(
            "urn:p:b:c::1.0",
            vec![("1.0", "2020-01-01", "initial")],
        );
        let delta = label_with(
            "urn:p:b:c::1.1",
            vec![("1.0", "2020-01-01", "initial"), ("1.1", "2020-02-01", "update")],
        );

        let errors = check_modification_history(&previous, &delta);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn missing_current_detail_is_flagged() {
        let previous = label_with("urn:p:b:c::1.0", vec![("1.0", "2020-01-01", "initial")]);
        let delta = label_with("urn:p:b:c::1.1", vec![("1.0", "2020-01-01", "initial")]);

        let errors = check_modification_history(&previous, &delta);
        assert!(errors
            .iter()
            .any(|e| e.error_type == ErrorType::MissingCurrentModificationDetail));
    }

    #[test]
    fn duplicate_row_detected() {
        let previous = CollectionInventory::from_csv("P,urn:p:b:c:x::1.0\r\n").unwrap();
        let delta = CollectionInventory::from_csv("P,urn:p:b:c:x::1.0\r\n").unwrap();
        let errors = check_collection_duplicates(&previous, &delta);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorType::DuplicateProducts);
    }

    #[test]
    fn patch_bundle_member_entries_fills_in_lidvid() {
        let collections = vec![];
        let entries = vec![BundleMemberEntry {
            member_status: "Primary".to_string(),
            reference_type: "bundle_has_collection".to_string(),
            reference: MemberReference::LidOnly("urn:p:b:c".to_string()),
        }];
        let (_patched, warnings) = patch_bundle_member_entries(&entries, &collections);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].error_type, ErrorType::UnpatchableLidReference);
    }

}
