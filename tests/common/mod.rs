#![allow(dead_code)]

use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;
use assert_fs::TempDir;

pub fn create_dirs(temp: &TempDir, path: &str) -> ChildPath {
    let child = resolve_child(temp, path);
    child.create_dir_all().unwrap();
    child
}

pub fn create_file(temp: &TempDir, path: &str, content: &str) -> ChildPath {
    let child = resolve_child(temp, path);
    child.write_str(content).unwrap();
    child
}

pub fn resolve_child(temp: &TempDir, path: &str) -> ChildPath {
    let mut child: Option<ChildPath> = None;
    for part in path.split('/') {
        child = match child {
            Some(child) => Some(child.child(part)),
            None => Some(temp.child(part)),
        };
    }
    child.unwrap()
}

/// One `(version_id, modification_date, description)` row of a
/// `Modification_History`.
pub type HistoryEntry<'a> = (&'a str, &'a str, &'a str);

fn modification_history_xml(entries: &[HistoryEntry]) -> String {
    let mut out = String::from("<Modification_History>");
    for (version, date, description) in entries {
        out.push_str(&format!(
            "<Modification_Detail><version_id>{version}</version_id><modification_date>{date}</modification_date><description>{description}</description></Modification_Detail>"
        ));
    }
    out.push_str("</Modification_History>");
    out
}

/// One `Bundle_Member_Entry`: either a fully version-qualified
/// `lidvid_reference` or a bare `lid_reference`.
pub struct MemberEntry<'a> {
    pub status: &'a str,
    pub reference_type: &'a str,
    pub lidvid: Option<&'a str>,
    pub lid: Option<&'a str>,
}

impl<'a> MemberEntry<'a> {
    pub fn lidvid(status: &'a str, reference_type: &'a str, lidvid: &'a str) -> Self {
        Self {
            status,
            reference_type,
            lidvid: Some(lidvid),
            lid: None,
        }
    }

    pub fn lid_only(status: &'a str, reference_type: &'a str, lid: &'a str) -> Self {
        Self {
            status,
            reference_type,
            lidvid: None,
            lid: Some(lid),
        }
    }

    fn to_xml(&self) -> String {
        let reference = match (self.lidvid, self.lid) {
            (Some(lv), _) => format!("<lidvid_reference>{lv}</lidvid_reference>"),
            (None, Some(l)) => format!("<lid_reference>{l}</lid_reference>"),
            (None, None) => String::new(),
        };
        format!(
            "<Bundle_Member_Entry>{reference}<member_status>{}</member_status><reference_type>{}</reference_type></Bundle_Member_Entry>",
            self.status, self.reference_type
        )
    }
}

/// A `Product_Bundle` label with the given LIDVID, modification history,
/// and member entries.
pub fn bundle_label(lidvid: &str, history: &[HistoryEntry], members: &[MemberEntry]) -> String {
    let (lid, vid) = lidvid.split_once("::").expect("lidvid must contain '::'");
    let members_xml: String = members.iter().map(MemberEntry::to_xml).collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Product_Bundle xmlns="http://pds.nasa.gov/pds4/pds/v1">
  <Identification_Area>
    <logical_identifier>{lid}</logical_identifier>
    <version_id>{vid}</version_id>
    {history}
  </Identification_Area>
  {members_xml}
</Product_Bundle>"#,
        history = modification_history_xml(history),
    )
}

/// A `Product_Collection` label with the given LIDVID, modification
/// history, and `File_Area_Inventory/File/file_name`.
pub fn collection_label(lidvid: &str, inventory_file_name: &str, history: &[HistoryEntry]) -> String {
    let (lid, vid) = lidvid.split_once("::").expect("lidvid must contain '::'");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Product_Collection xmlns="http://pds.nasa.gov/pds4/pds/v1">
  <Identification_Area>
    <logical_identifier>{lid}</logical_identifier>
    <version_id>{vid}</version_id>
    {history}
  </Identification_Area>
  <File_Area_Inventory>
    <File>
      <file_name>{inventory_file_name}</file_name>
    </File>
    <records>0</records>
    <file_size>0</file_size>
    <md5_checksum>0</md5_checksum>
  </File_Area_Inventory>
</Product_Collection>"#,
        history = modification_history_xml(history),
    )
}

/// A `Product_Observational` label with the given LIDVID and a single
/// `File_Area_Observational/File/file_name`.
pub fn basic_product_label(lidvid: &str, data_file_name: &str, history: &[HistoryEntry]) -> String {
    let (lid, vid) = lidvid.split_once("::").expect("lidvid must contain '::'");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Product_Observational xmlns="http://pds.nasa.gov/pds4/pds/v1">
  <Identification_Area>
    <logical_identifier>{lid}</logical_identifier>
    <version_id>{vid}</version_id>
    {history}
  </Identification_Area>
  <File_Area_Observational>
    <File>
      <file_name>{data_file_name}</file_name>
    </File>
  </File_Area_Observational>
</Product_Observational>"#,
        history = modification_history_xml(history),
    )
}

/// A collection inventory CSV: CRLF-terminated `status,lidvid` rows.
pub fn inventory_csv(rows: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (status, lidvid) in rows {
        out.push_str(status);
        out.push(',');
        out.push_str(lidvid);
        out.push_str("\r\n");
    }
    out
}
