//! Label editor (C8): in-place XML rewrites.
//!
//! Both operations stream the source document through a `quick_xml`
//! `Reader`/`Writer` pair rather than rebuilding a DOM, so every byte
//! outside the element(s) being touched — including the PDS namespace
//! declaration and existing indentation — passes through unchanged.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::pds4::consts::{TAG_BUNDLE_MEMBER_ENTRY, TAG_FILE_SIZE, TAG_MD5_CHECKSUM, TAG_PRODUCT_BUNDLE, TAG_RECORDS};
use crate::pds4::digest::HexDigest;
use crate::pds4::error::Result;
use crate::pds4::label::{local_name, BundleMemberEntry};

/// Appends one `Bundle_Member_Entry` per `entries` as the last children of
/// the label's `Product_Bundle` root, then rewrites `label_path` in place.
pub fn inject_bundle_member_entries(label_path: impl AsRef<Path>, entries: &[BundleMemberEntry]) -> Result<()> {
    let label_path = label_path.as_ref();
    let xml = fs::read_to_string(label_path)?;

    let mut reader = Reader::from_str(&xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::End(ref e) if local_name(e.name().as_ref()) == TAG_PRODUCT_BUNDLE => {
                for entry in entries {
                    write_bundle_member_entry(&mut writer, entry)?;
                }
                writer.write_event(Event::End(e.to_owned()))?;
            }
            e => writer.write_event(e)?,
        }
        buf.clear();
    }

    fs::write(label_path, writer.into_inner().into_inner())?;
    Ok(())
}

fn write_bundle_member_entry(writer: &mut Writer<Cursor<Vec<u8>>>, entry: &BundleMemberEntry) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(TAG_BUNDLE_MEMBER_ENTRY)))?;
    write_text_element(writer, "lidvid_reference", entry.reference_lid_string())?;
    write_text_element(writer, "member_status", &entry.member_status)?;
    write_text_element(writer, "reference_type", &entry.reference_type)?;
    writer.write_event(Event::End(BytesEnd::new(TAG_BUNDLE_MEMBER_ENTRY)))?;
    Ok(())
}

fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Reads `src_label`, replaces the text of its `records`, `file_size`, and
/// `md5_checksum` elements, and writes the result to `dest_label`.
pub fn update_collection_inventory(
    src_label: impl AsRef<Path>,
    dest_label: impl AsRef<Path>,
    records: usize,
    file_size: u64,
    md5: &HexDigest,
) -> Result<()> {
    let xml = fs::read_to_string(src_label)?;

    let mut reader = Reader::from_str(&xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();
    let mut pending: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(ref e) => {
                pending = match local_name(e.name().as_ref()).as_str() {
                    TAG_RECORDS => Some(TAG_RECORDS),
                    TAG_FILE_SIZE => Some(TAG_FILE_SIZE),
                    TAG_MD5_CHECKSUM => Some(TAG_MD5_CHECKSUM),
                    _ => None,
                };
                writer.write_event(Event::Start(e.to_owned()))?;
            }
            Event::Text(_) if pending.is_some() => {
                let replacement = match pending.unwrap() {
                    TAG_RECORDS => records.to_string(),
                    TAG_FILE_SIZE => file_size.to_string(),
                    TAG_MD5_CHECKSUM => md5.to_string(),
                    _ => unreachable!(),
                };
                writer.write_event(Event::Text(BytesText::new(&replacement)))?;
            }
            Event::End(ref e) => {
                pending = None;
                writer.write_event(Event::End(e.to_owned()))?;
            }
            e => writer.write_event(e)?,
        }
        buf.clear();
    }

    fs::write(dest_label, writer.into_inner().into_inner())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pds4::label::MemberReference;

    #[test]
    fn injects_member_entries_before_closing_tag() {
        let xml = r#"<?xml version="1.0"?>
<Product_Bundle xmlns="http://pds.nasa.gov/pds4/pds/v1">
  <Identification_Area>
    <logical_identifier>urn:nasa:pds:bundle</logical_identifier>
    <version_id>1.0</version_id>
  </Identification_Area>
</Product_Bundle>"#;

        let dir = std::env::temp_dir().join(format!("pdsmerge-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bundle.xml");
        fs::write(&path, xml).unwrap();

        let entry = BundleMemberEntry {
            member_status: "Primary".to_string(),
            reference_type: "bundle_has_collection".to_string(),
            reference: MemberReference::Full("urn:nasa:pds:bundle:collection::1.0".to_string()),
        };
        inject_bundle_member_entries(&path, std::slice::from_ref(&entry)).unwrap();

        let result = fs::read_to_string(&path).unwrap();
        assert!(result.contains("<Bundle_Member_Entry>"));
        assert!(result.contains("urn:nasa:pds:bundle:collection::1.0"));
        assert!(result.ends_with("</Product_Bundle>"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn patches_records_size_and_checksum() {
        let xml = r#"<?xml version="1.0"?>
<Product_Collection xmlns="http://pds.nasa.gov/pds4/pds/v1" xmlns:pds="http://pds.nasa.gov/pds4/pds/v1">
  <File_Area_Inventory>
    <File>
      <file_name>collection.csv</file_name>
    </File>
    <records>1</records>
    <pds:file_size>10</pds:file_size>
    <md5_checksum>deadbeef</md5_checksum>
  </File_Area_Inventory>
</Product_Collection>"#;

        let dir = std::env::temp_dir().join(format!("pdsmerge-test-patch-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let src = dir.join("src.xml");
        let dest = dir.join("dest.xml");
        fs::write(&src, xml).unwrap();

        let md5 = crate::pds4::digest::md5_hex(b"hello");
        update_collection_inventory(&src, &dest, 2, 42, &md5).unwrap();

        let result = fs::read_to_string(&dest).unwrap();
        assert!(result.contains("<records>2</records>"));
        assert!(result.contains(">42</pds:file_size>"));
        assert!(result.contains(&md5.to_string()));
        assert!(!result.contains("deadbeef"));

        fs::remove_dir_all(&dir).ok();
    }
}
