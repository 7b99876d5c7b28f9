//! PDS4 archive bundle validation and supersede/merge domain logic.

mod bundle;
mod consts;
mod digest;
mod error;
mod ids;
mod inventory;
mod label;
mod labeledit;
mod paths;
mod supersede;
mod validate;

pub use bundle::{load_local_bundle, BasicProduct, BundleProduct, CollectionProduct, FullBundle};
pub use digest::{md5_hex, HexDigest};
pub use error::{PdsError, Result};
pub use ids::{Lid, LidVid, Vid};
pub use inventory::{CollectionInventory, InventoryItem, Status};
pub use label::{
    BundleMemberEntry, ContextArea, Document, DocumentEdition, DocumentFile, FileArea, IdentificationArea,
    MemberReference, ModificationDetail, ModificationHistory, ProductLabel,
};
pub use labeledit::{inject_bundle_member_entries, update_collection_inventory};
pub use paths::{generate_product_path, rebase_filenames, relocate_path};
pub use supersede::supersede;
pub use validate::{check_ready, do_checkready, patch_bundle_member_entries, ErrorType, Severity, ValidationError};
