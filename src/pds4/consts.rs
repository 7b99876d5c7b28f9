//! Shared path and namespace constants.

pub const SUPERSEDED_DIR: &str = "SUPERSEDED";

pub const TAG_PRODUCT_BUNDLE: &str = "Product_Bundle";
pub const TAG_PRODUCT_COLLECTION: &str = "Product_Collection";
pub const TAG_PRODUCT_OBSERVATIONAL: &str = "Product_Observational";
pub const TAG_PRODUCT_ANCILLARY: &str = "Product_Ancillary";
pub const TAG_PRODUCT_DOCUMENT: &str = "Product_Document";
pub const TAG_PRODUCT_CONTEXT: &str = "Product_Context";

pub const TAG_BUNDLE_MEMBER_ENTRY: &str = "Bundle_Member_Entry";
pub const TAG_RECORDS: &str = "records";
pub const TAG_FILE_SIZE: &str = "file_size";
pub const TAG_MD5_CHECKSUM: &str = "md5_checksum";
