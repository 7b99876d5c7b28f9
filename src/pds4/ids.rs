//! LID / VID / LIDVID identifier algebra (C1).

use std::cmp::Ordering;
use std::fmt;

use crate::pds4::error::{PdsError, Result};

/// A hierarchical Logical Identifier: `prefix:bundle[:collection[:product]]`.
///
/// `prefix` is always the first three colon-separated tokens joined back
/// together; a bundle-level LID has no `collection`/`product`, a
/// collection-level LID has `collection` but no `product`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lid {
    prefix: String,
    bundle: String,
    collection: Option<String>,
    product: Option<String>,
}

impl Lid {
    pub fn parse(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.split(':').collect();
        if tokens.len() < 4 {
            return Err(PdsError::MalformedIdentifier(format!(
                "LID '{s}' has fewer than 4 tokens"
            )));
        }

        Ok(Self {
            prefix: tokens[0..3].join(":"),
            bundle: tokens[3].to_string(),
            collection: tokens.get(4).map(|t| t.to_string()),
            product: tokens.get(5).map(|t| t.to_string()),
        })
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    pub fn collection_component(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn product_component(&self) -> Option<&str> {
        self.product.as_deref()
    }
}

impl fmt::Display for Lid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.collection, &self.product) {
            (Some(collection), Some(product)) => {
                write!(f, "{}:{}:{}:{}", self.prefix, self.bundle, collection, product)
            }
            (Some(collection), None) => write!(f, "{}:{}:{}", self.prefix, self.bundle, collection),
            _ => write!(f, "{}:{}", self.prefix, self.bundle),
        }
    }
}

/// `major.minor`, both non-negative. Total order is lexicographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vid {
    pub major: u64,
    pub minor: u64,
}

impl Vid {
    pub fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let mut tokens = s.splitn(2, '.');
        let major = tokens.next().unwrap_or_default();
        let minor = match tokens.next() {
            Some(m) => m,
            None => {
                return Err(PdsError::MalformedIdentifier(format!(
                    "VID '{s}' is not major.minor"
                )))
            }
        };

        let major: u64 = major
            .parse()
            .map_err(|_| PdsError::MalformedIdentifier(format!("VID '{s}' has a non-numeric major")))?;
        let minor: u64 = minor
            .parse()
            .map_err(|_| PdsError::MalformedIdentifier(format!("VID '{s}' has a non-numeric minor")))?;

        Ok(Self { major, minor })
    }

    pub fn inc_major(&self) -> Self {
        Self::new(self.major + 1, 0)
    }

    pub fn inc_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1)
    }

    pub fn is_superseding(&self) -> bool {
        self.major > 1 || self.minor > 0
    }

    /// True iff `candidate` is `self`, `self.inc_minor()`, or `self.inc_major()`.
    pub fn is_legal_bump(&self, candidate: &Vid, allow_same: bool) -> bool {
        (allow_same && candidate == self) || *candidate == self.inc_minor() || *candidate == self.inc_major()
    }
}

impl fmt::Display for Vid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// `LID::VID`, the fully qualified identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LidVid {
    pub lid: Lid,
    pub vid: Vid,
}

impl LidVid {
    pub fn new(lid: Lid, vid: Vid) -> Self {
        Self { lid, vid }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (lid, vid) = s.split_once("::").ok_or_else(|| {
            PdsError::MalformedIdentifier(format!("LIDVID '{s}' is missing the '::' separator"))
        })?;
        Self::assemble(lid, vid)
    }

    pub fn assemble(lid: &str, vid: &str) -> Result<Self> {
        Ok(Self {
            lid: Lid::parse(lid)?,
            vid: Vid::parse(vid)?,
        })
    }

    pub fn inc_major(&self) -> Self {
        Self::new(self.lid.clone(), self.vid.inc_major())
    }

    pub fn inc_minor(&self) -> Self {
        Self::new(self.lid.clone(), self.vid.inc_minor())
    }
}

impl fmt::Display for LidVid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.lid, self.vid)
    }
}

impl PartialOrd for LidVid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.lid == other.lid {
            self.vid.partial_cmp(&other.vid)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lid_round_trip_bundle() {
        let lid = Lid::parse("urn:nasa:pds:bundle").unwrap();
        assert_eq!(lid.to_string(), "urn:nasa:pds:bundle");
    }

    #[test]
    fn lid_round_trip_product() {
        let s = "urn:nasa:pds:bundle:collection:product";
        let lid = Lid::parse(s).unwrap();
        assert_eq!(lid.to_string(), s);
        assert_eq!(lid.collection_component(), Some("collection"));
        assert_eq!(lid.product_component(), Some("product"));
    }

    #[test]
    fn lid_too_short_is_malformed() {
        assert!(Lid::parse("urn:nasa").is_err());
    }

    #[test]
    fn vid_total_order() {
        let a = Vid::new(1, 0);
        let b = Vid::new(1, 1);
        let c = Vid::new(2, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn vid_bump_closure() {
        let prev = Vid::new(1, 0);
        assert!(prev.is_legal_bump(&Vid::new(1, 1), false));
        assert!(prev.is_legal_bump(&Vid::new(2, 0), false));
        assert!(!prev.is_legal_bump(&Vid::new(1, 5), false));
        assert!(!prev.is_legal_bump(&Vid::new(1, 0), false));
        assert!(prev.is_legal_bump(&Vid::new(1, 0), true));
    }

    #[test]
    fn lidvid_round_trip() {
        let s = "urn:nasa:pds:bundle:collection:product::1.2";
        let lidvid = LidVid::parse(s).unwrap();
        assert_eq!(lidvid.to_string(), s);
    }

    #[test]
    fn lidvid_missing_separator_is_malformed() {
        assert!(LidVid::parse("urn:nasa:pds:bundle:1.0").is_err());
    }
}
