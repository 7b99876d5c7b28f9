//! Collection inventory codec (C3).
//!
//! A collection inventory is a CRLF-delimited CSV of `status,LIDVID` rows,
//! keyed by LID (a collection holds at most one version of a given
//! product). Hand-rolled rather than via a CSV crate: the format is two
//! fields wide with a fixed terminator, and direct parsing beats pulling
//! in a general-purpose CSV dependency for a shape this simple.

use std::collections::BTreeMap;

use crate::pds4::error::{PdsError, Result};
use crate::pds4::ids::{Lid, LidVid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Primary,
    Secondary,
}

impl Status {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "P" => Ok(Self::Primary),
            "S" => Ok(Self::Secondary),
            other => Err(PdsError::MalformedIdentifier(format!(
                "inventory status must be P or S, got '{other}'"
            ))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "P",
            Self::Secondary => "S",
        }
    }
}

#[derive(Debug, Clone)]
pub struct InventoryItem {
    pub lidvid: LidVid,
    pub status: Status,
}

impl InventoryItem {
    fn row(&self) -> String {
        format!("{},{}", self.status.as_str(), self.lidvid)
    }
}

/// A collection's product membership list, keyed by LID.
#[derive(Debug, Clone, Default)]
pub struct CollectionInventory {
    items: BTreeMap<String, InventoryItem>,
}

impl CollectionInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_csv(text: &str) -> Result<Self> {
        let mut inventory = Self::new();

        for line in text.split("\r\n") {
            if line.is_empty() {
                continue;
            }

            let (status, lidvid) = line.split_once(',').ok_or_else(|| {
                PdsError::MalformedIdentifier(format!("inventory row '{line}' is missing a comma"))
            })?;

            let item = InventoryItem {
                status: Status::parse(status)?,
                lidvid: LidVid::parse(lidvid)?,
            };
            inventory.add_item(item)?;
        }

        Ok(inventory)
    }

    /// Inserts `item`, failing `DuplicateProduct` if the LID is already
    /// present with a VID `>=` the new item's VID.
    pub fn add_item(&mut self, item: InventoryItem) -> Result<()> {
        let key = item.lidvid.lid.to_string();

        if let Some(existing) = self.items.get(&key) {
            if existing.lidvid.vid >= item.lidvid.vid {
                return Err(PdsError::DuplicateProduct(format!(
                    "{} is not newer than existing {}",
                    item.lidvid, existing.lidvid
                )));
            }
        }

        self.items.insert(key, item);
        Ok(())
    }

    /// Merges `other`'s items into `self` via `add_item`, propagating the
    /// first failure encountered.
    pub fn ingest_new_inventory(&mut self, other: &CollectionInventory) -> Result<()> {
        for item in other.items.values() {
            self.add_item(item.clone())?;
        }
        Ok(())
    }

    pub fn products(&self) -> Vec<LidVid> {
        self.items.values().map(|i| i.lidvid.clone()).collect()
    }

    pub fn lids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(|s| s.as_str())
    }

    pub fn get(&self, lid: &Lid) -> Option<&InventoryItem> {
        self.items.get(&lid.to_string())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows sorted ascending as raw strings, joined by CRLF, with a
    /// trailing CRLF.
    pub fn to_csv(&self) -> String {
        let mut rows: Vec<String> = self.items.values().map(InventoryItem::row).collect();
        rows.sort();

        let mut out = rows.join("\r\n");
        if !rows.is_empty() {
            out.push_str("\r\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(s: &str) -> InventoryItem {
        let (status, lidvid) = s.split_once(',').unwrap();
        InventoryItem {
            status: Status::parse(status).unwrap(),
            lidvid: LidVid::parse(lidvid).unwrap(),
        }
    }

    #[test]
    fn round_trips_sorted_csv() {
        let csv = "P,urn:p:b:c:x::1.0\r\nP,urn:p:b:c:y::1.0\r\n";
        let inventory = CollectionInventory::from_csv(csv).unwrap();
        assert_eq!(inventory.to_csv(), csv);
    }

    #[test]
    fn duplicate_product_rejected() {
        let mut inventory = CollectionInventory::new();
        inventory.add_item(item("P,urn:p:b:c:x::1.0")).unwrap();
        let err = inventory.add_item(item("P,urn:p:b:c:x::1.0"));
        assert!(err.is_err());
    }

    #[test]
    fn add_item_replaces_on_real_bump() {
        let mut inventory = CollectionInventory::new();
        inventory.add_item(item("P,urn:p:b:c:x::1.0")).unwrap();
        inventory.add_item(item("P,urn:p:b:c:x::1.1")).unwrap();
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn ingest_monotonicity_on_disjoint_lids() {
        let mut a = CollectionInventory::new();
        a.add_item(item("P,urn:p:b:c:x::1.0")).unwrap();
        let mut b = CollectionInventory::new();
        b.add_item(item("P,urn:p:b:c:y::1.0")).unwrap();

        a.ingest_new_inventory(&b).unwrap();
        assert_eq!(a.products().len(), 2);
    }

    #[test]
    fn ingest_commutative_on_disjoint_lids() {
        let mut a = CollectionInventory::new();
        a.add_item(item("P,urn:p:b:c:x::1.0")).unwrap();
        let mut b = CollectionInventory::new();
        b.add_item(item("P,urn:p:b:c:y::1.0")).unwrap();

        let mut ab = a.clone();
        ab.ingest_new_inventory(&b).unwrap();
        let mut ba = b.clone();
        ba.ingest_new_inventory(&a).unwrap();

        assert_eq!(ab.to_csv(), ba.to_csv());
    }
}
