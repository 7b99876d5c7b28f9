//! Label types and reader (C2).
//!
//! The reader parses a PDS4 XML label into the typed [`ProductLabel`]
//! tree. XML is tokenized with `quick_xml` and assembled into a small,
//! generic element tree (`XmlElement`) that is then walked by
//! depth-first tag-name lookups. The reader never invents values: a
//! missing optional child simply yields `None`/an empty list.

use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::pds4::consts::{
    TAG_PRODUCT_ANCILLARY, TAG_PRODUCT_BUNDLE, TAG_PRODUCT_COLLECTION, TAG_PRODUCT_CONTEXT, TAG_PRODUCT_DOCUMENT,
    TAG_PRODUCT_OBSERVATIONAL,
};
use crate::pds4::digest::{md5_hex, HexDigest};
use crate::pds4::error::{PdsError, Result};
use crate::pds4::ids::LidVid;

// ---------------------------------------------------------------------
// Typed label model
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct DocumentEdition {
    pub files: Vec<DocumentFile>,
}

impl DocumentEdition {
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.filename.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub editions: Vec<DocumentEdition>,
}

impl Document {
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.editions.iter().flat_map(|e| e.filenames())
    }
}

#[derive(Debug, Clone)]
pub struct SoftwareProgram {
    pub name: String,
    pub program_version: String,
}

#[derive(Debug, Clone)]
pub struct Software {
    pub software_id: String,
    pub software_version_id: String,
    pub software_program: Vec<SoftwareProgram>,
}

#[derive(Debug, Clone)]
pub struct Process {
    pub name: String,
    pub description: String,
    pub software: Vec<Software>,
}

#[derive(Debug, Clone)]
pub struct ProcessingInformation {
    pub process: Vec<Process>,
}

#[derive(Debug, Clone)]
pub struct DisciplineArea {
    pub processing_information: Option<ProcessingInformation>,
}

#[derive(Debug, Clone)]
pub struct FileArea {
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct TimeCoordinates {
    pub start_date: Option<String>,
    pub stop_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InternalReference {
    pub lid_reference: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObservingSystemComponent {
    pub name: Option<String>,
    pub component_type: Option<String>,
    pub internal_reference: Option<InternalReference>,
}

#[derive(Debug, Clone)]
pub struct ObservingSystem {
    pub components: Vec<ObservingSystemComponent>,
}

#[derive(Debug, Clone)]
pub struct ContextArea {
    pub time_coordinates: Option<TimeCoordinates>,
    pub observing_system: Option<ObservingSystem>,
}

#[derive(Debug, Clone)]
pub struct ModificationDetail {
    pub version_id: String,
    pub modification_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ModificationHistory {
    pub modification_details: Vec<ModificationDetail>,
}

#[derive(Debug, Clone)]
pub struct IdentificationArea {
    pub lidvid: LidVid,
    pub collection_id: Option<String>,
    pub modification_history: Option<ModificationHistory>,
}

/// A reference to another product from a bundle label, carrying either a
/// bare LID or a fully version-qualified LIDVID.
#[derive(Debug, Clone)]
pub enum MemberReference {
    LidOnly(String),
    Full(String),
}

#[derive(Debug, Clone)]
pub struct BundleMemberEntry {
    pub member_status: String,
    pub reference_type: String,
    pub reference: MemberReference,
}

impl BundleMemberEntry {
    /// The parsed LIDVID if `lidvid_reference` was present, otherwise the
    /// LIDVID parsed out of `lid_reference` (which may carry no real VID
    /// and must be flagged by the validation engine).
    pub fn effective_lidvid(&self) -> Result<LidVid> {
        match &self.reference {
            MemberReference::Full(s) => LidVid::parse(s),
            MemberReference::LidOnly(s) => LidVid::parse(s),
        }
    }

    pub fn has_lidvid_reference(&self) -> bool {
        matches!(self.reference, MemberReference::Full(_))
    }

    pub fn reference_lid_string(&self) -> &str {
        match &self.reference {
            MemberReference::Full(s) => s,
            MemberReference::LidOnly(s) => s,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductLabel {
    pub checksum: HexDigest,
    pub identification_area: IdentificationArea,
    pub file_areas: Vec<FileArea>,
    pub context_area: Option<ContextArea>,
    pub discipline_area: Option<DisciplineArea>,
    pub document: Option<Document>,
    pub bundle_member_entries: Vec<BundleMemberEntry>,
}

// ---------------------------------------------------------------------
// Minimal generic XML tree, built from quick_xml events
// ---------------------------------------------------------------------

#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// First matching element anywhere below `self`, depth-first.
    fn descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// All matching elements anywhere below `self` — mirrors `find_all`.
    fn all_descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.all_descendants(name, out);
        }
    }

    fn text_opt(&self) -> Option<String> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.descendant(name).and_then(|e| e.text_opt())
    }
}

pub(crate) fn local_name(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match s.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => s.to_string(),
    }
}

fn parse_xml_tree(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = vec![XmlElement {
        name: "#document".to_string(),
        ..Default::default()
    }];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                stack.push(XmlElement {
                    name: local_name(e.name().as_ref()),
                    ..Default::default()
                });
            }
            Event::Empty(e) => {
                let elem = XmlElement {
                    name: local_name(e.name().as_ref()),
                    ..Default::default()
                };
                stack.last_mut().expect("non-empty stack").children.push(elem);
            }
            Event::Text(e) => {
                let text = e.unescape()?.into_owned();
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::End(_) => {
                let finished = stack.pop().expect("matching start for every end");
                stack.last_mut().expect("non-empty stack").children.push(finished);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let mut document = stack.pop().expect("document root");
    document
        .children
        .pop()
        .ok_or_else(|| PdsError::General("label has no root element".to_string()))
}

// ---------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------

pub fn read_label(path: impl AsRef<Path>) -> Result<ProductLabel> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let checksum = md5_hex(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    let root = parse_xml_tree(&text)?;

    match root.name.as_str() {
        TAG_PRODUCT_BUNDLE => extract_bundle(&root, checksum),
        TAG_PRODUCT_COLLECTION => extract_collection(&root, checksum),
        TAG_PRODUCT_OBSERVATIONAL => extract_product_observational(&root, checksum),
        TAG_PRODUCT_ANCILLARY => extract_product_ancillary(&root, checksum),
        TAG_PRODUCT_DOCUMENT => extract_product_document(&root, checksum),
        TAG_PRODUCT_CONTEXT => extract_context_product(&root, checksum),
        other => Err(PdsError::UnknownProductType(other.to_string())),
    }
}

fn extract_bundle(root: &XmlElement, checksum: HexDigest) -> Result<ProductLabel> {
    let mut entries = Vec::new();
    let mut found = Vec::new();
    root.all_descendants("Bundle_Member_Entry", &mut found);
    for entry in found {
        entries.push(extract_bundle_member_entry(entry)?);
    }

    Ok(ProductLabel {
        checksum,
        identification_area: extract_identification_area(
            root.descendant("Identification_Area")
                .ok_or_else(|| PdsError::General("missing Identification_Area".to_string()))?,
        )?,
        file_areas: Vec::new(),
        context_area: root.descendant("Context_Area").map(extract_context_area),
        discipline_area: None,
        document: None,
        bundle_member_entries: entries,
    })
}

fn extract_context_product(root: &XmlElement, checksum: HexDigest) -> Result<ProductLabel> {
    Ok(ProductLabel {
        checksum,
        identification_area: extract_identification_area(
            root.descendant("Identification_Area")
                .ok_or_else(|| PdsError::General("missing Identification_Area".to_string()))?,
        )?,
        file_areas: Vec::new(),
        context_area: None,
        discipline_area: None,
        document: None,
        bundle_member_entries: Vec::new(),
    })
}

fn extract_collection(root: &XmlElement, checksum: HexDigest) -> Result<ProductLabel> {
    Ok(ProductLabel {
        checksum,
        identification_area: extract_identification_area(
            root.descendant("Identification_Area")
                .ok_or_else(|| PdsError::General("missing Identification_Area".to_string()))?,
        )?,
        file_areas: extract_file_areas(root, "File_Area_Inventory"),
        context_area: root.descendant("Context_Area").map(extract_context_area),
        discipline_area: None,
        document: None,
        bundle_member_entries: Vec::new(),
    })
}

fn extract_product_observational(root: &XmlElement, checksum: HexDigest) -> Result<ProductLabel> {
    Ok(ProductLabel {
        checksum,
        identification_area: extract_identification_area(
            root.descendant("Identification_Area")
                .ok_or_else(|| PdsError::General("missing Identification_Area".to_string()))?,
        )?,
        file_areas: extract_file_areas(root, "File_Area_Observational"),
        context_area: root.descendant("Observation_Area").map(extract_context_area),
        discipline_area: root.descendant("Discipline_Area").map(extract_discipline_area),
        document: None,
        bundle_member_entries: Vec::new(),
    })
}

fn extract_product_ancillary(root: &XmlElement, checksum: HexDigest) -> Result<ProductLabel> {
    Ok(ProductLabel {
        checksum,
        identification_area: extract_identification_area(
            root.descendant("Identification_Area")
                .ok_or_else(|| PdsError::General("missing Identification_Area".to_string()))?,
        )?,
        file_areas: extract_file_areas(root, "File_Area_Ancillary"),
        context_area: root.descendant("Context_Area").map(extract_context_area),
        discipline_area: root.descendant("Discipline_Area").map(extract_discipline_area),
        document: None,
        bundle_member_entries: Vec::new(),
    })
}

fn extract_product_document(root: &XmlElement, checksum: HexDigest) -> Result<ProductLabel> {
    Ok(ProductLabel {
        checksum,
        identification_area: extract_identification_area(
            root.descendant("Identification_Area")
                .ok_or_else(|| PdsError::General("missing Identification_Area".to_string()))?,
        )?,
        file_areas: Vec::new(),
        context_area: None,
        discipline_area: None,
        document: root.descendant("Document").map(extract_document),
        bundle_member_entries: Vec::new(),
    })
}

fn extract_identification_area(area: &XmlElement) -> Result<IdentificationArea> {
    let lid = area
        .child_text("logical_identifier")
        .ok_or_else(|| PdsError::General("missing logical_identifier".to_string()))?;
    let vid = area
        .child_text("version_id")
        .ok_or_else(|| PdsError::General("missing version_id".to_string()))?;
    let lidvid = LidVid::assemble(&lid, &vid)?;
    let collection_id = lidvid.lid.collection_component().map(|s| s.to_string());

    let modification_history = area
        .descendant("Modification_History")
        .map(extract_modification_history);

    Ok(IdentificationArea {
        lidvid,
        collection_id,
        modification_history,
    })
}

fn extract_modification_history(area: &XmlElement) -> ModificationHistory {
    let mut details = Vec::new();
    let mut found = Vec::new();
    area.all_descendants("Modification_Detail", &mut found);
    for detail in found {
        details.push(extract_modification_detail(detail));
    }
    ModificationHistory {
        modification_details: details,
    }
}

fn extract_modification_detail(detail: &XmlElement) -> ModificationDetail {
    ModificationDetail {
        version_id: detail.child_text("version_id").unwrap_or_default(),
        modification_date: detail.child_text("modification_date"),
        description: detail.child_text("description"),
    }
}

fn extract_context_area(area: &XmlElement) -> ContextArea {
    ContextArea {
        time_coordinates: area.descendant("Time_Coordinates").map(extract_time_coordinates),
        observing_system: area.descendant("Observing_System").map(extract_observing_system),
    }
}

fn extract_time_coordinates(area: &XmlElement) -> TimeCoordinates {
    TimeCoordinates {
        start_date: area.child_text("start_date_time"),
        stop_date: area.child_text("stop_date_time"),
    }
}

fn extract_observing_system(area: &XmlElement) -> ObservingSystem {
    let mut components = Vec::new();
    let mut found = Vec::new();
    area.all_descendants("Observing_System_Component", &mut found);
    for component in found {
        components.push(extract_observing_system_component(component));
    }
    ObservingSystem { components }
}

fn extract_observing_system_component(component: &XmlElement) -> ObservingSystemComponent {
    ObservingSystemComponent {
        name: component.child_text("name"),
        component_type: component.child_text("type"),
        internal_reference: component
            .descendant("Internal_Reference")
            .map(extract_internal_reference),
    }
}

fn extract_internal_reference(reference: &XmlElement) -> InternalReference {
    InternalReference {
        lid_reference: reference.child_text("lid_reference"),
    }
}

fn extract_file_areas(root: &XmlElement, area_tag: &str) -> Vec<FileArea> {
    let mut areas = Vec::new();
    root.all_descendants(area_tag, &mut areas);

    let mut files = Vec::new();
    for area in areas {
        let mut file_elems = Vec::new();
        area.all_descendants("File", &mut file_elems);
        for file_elem in file_elems {
            if let Some(name) = file_elem.child_text("file_name") {
                files.push(FileArea {
                    file_name: basename(&name),
                });
            }
        }
    }
    files
}

fn basename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

fn extract_discipline_area(area: &XmlElement) -> DisciplineArea {
    DisciplineArea {
        processing_information: area
            .descendant("Processing_Information")
            .map(extract_processing_information),
    }
}

fn extract_processing_information(area: &XmlElement) -> ProcessingInformation {
    let mut process = Vec::new();
    let mut found = Vec::new();
    area.all_descendants("Process", &mut found);
    for p in found {
        process.push(extract_process(p));
    }
    ProcessingInformation { process }
}

fn extract_process(area: &XmlElement) -> Process {
    let mut software = Vec::new();
    let mut found = Vec::new();
    area.all_descendants("Software", &mut found);
    for s in found {
        software.push(extract_software(s));
    }

    Process {
        name: area.child_text("name").unwrap_or_default(),
        description: area.child_text("description").unwrap_or_default(),
        software,
    }
}

fn extract_software(area: &XmlElement) -> Software {
    let mut programs = Vec::new();
    let mut found = Vec::new();
    area.all_descendants("Software_Program", &mut found);
    for p in found {
        programs.push(extract_software_program(p));
    }

    Software {
        software_id: area.child_text("software_id").unwrap_or_default(),
        software_version_id: area.child_text("software_version_id").unwrap_or_default(),
        software_program: programs,
    }
}

fn extract_software_program(area: &XmlElement) -> SoftwareProgram {
    SoftwareProgram {
        name: area.child_text("name").unwrap_or_default(),
        program_version: area.child_text("program_version").unwrap_or_default(),
    }
}

fn extract_document(area: &XmlElement) -> Document {
    let mut editions = Vec::new();
    let mut found = Vec::new();
    area.all_descendants("Document_Edition", &mut found);
    for edition in found {
        editions.push(extract_document_edition(edition));
    }
    Document { editions }
}

fn extract_document_edition(area: &XmlElement) -> DocumentEdition {
    let mut files = Vec::new();
    let mut found = Vec::new();
    area.all_descendants("Document_File", &mut found);
    for file in found {
        files.push(extract_document_file(file));
    }
    DocumentEdition { files }
}

fn extract_document_file(area: &XmlElement) -> DocumentFile {
    DocumentFile {
        filename: area.child_text("file_name").unwrap_or_default(),
    }
}

fn extract_bundle_member_entry(area: &XmlElement) -> Result<BundleMemberEntry> {
    let member_status = area.child_text("member_status").unwrap_or_default();
    let reference_type = area.child_text("reference_type").unwrap_or_default();
    let lidvid_reference = area.child_text("lidvid_reference");
    let lid_reference = area.child_text("lid_reference");

    let reference = match (lidvid_reference, lid_reference) {
        (Some(lidvid), _) => MemberReference::Full(lidvid),
        (None, Some(lid)) => MemberReference::LidOnly(lid),
        (None, None) => {
            return Err(PdsError::General(
                "Bundle_Member_Entry has neither lid_reference nor lidvid_reference".to_string(),
            ))
        }
    };

    Ok(BundleMemberEntry {
        member_status,
        reference_type,
        reference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION_LABEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Product_Collection xmlns="http://pds.nasa.gov/pds4/pds/v1">
  <Identification_Area>
    <logical_identifier>urn:nasa:pds:bundle:collection</logical_identifier>
    <version_id>1.1</version_id>
    <Modification_History>
      <Modification_Detail>
        <version_id>1.0</version_id>
        <modification_date>2020-01-01</modification_date>
        <description>initial</description>
      </Modification_Detail>
      <Modification_Detail>
        <version_id>1.1</version_id>
        <modification_date>2020-02-01</modification_date>
        <description>update</description>
      </Modification_Detail>
    </Modification_History>
  </Identification_Area>
  <File_Area_Inventory>
    <File>
      <file_name>collection_inventory.csv</file_name>
    </File>
  </File_Area_Inventory>
</Product_Collection>"#;

    #[test]
    fn parses_collection_label() {
        let root = parse_xml_tree(COLLECTION_LABEL).unwrap();
        let label = extract_collection(&root, md5_hex(COLLECTION_LABEL.as_bytes())).unwrap();

        assert_eq!(label.identification_area.lidvid.vid.to_string(), "1.1");
        assert_eq!(label.identification_area.collection_id.as_deref(), Some("collection"));
        assert_eq!(label.file_areas.len(), 1);
        assert_eq!(label.file_areas[0].file_name, "collection_inventory.csv");

        let history = label.identification_area.modification_history.unwrap();
        assert_eq!(history.modification_details.len(), 2);
    }

    const BUNDLE_LABEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Product_Bundle xmlns="http://pds.nasa.gov/pds4/pds/v1">
  <Identification_Area>
    <logical_identifier>urn:nasa:pds:bundle</logical_identifier>
    <version_id>1.0</version_id>
  </Identification_Area>
  <Bundle_Member_Entry>
    <lidvid_reference>urn:nasa:pds:bundle:collection::1.0</lidvid_reference>
    <member_status>Primary</member_status>
    <reference_type>bundle_has_collection</reference_type>
  </Bundle_Member_Entry>
</Product_Bundle>"#;

    #[test]
    fn parses_bundle_member_entries() {
        let root = parse_xml_tree(BUNDLE_LABEL).unwrap();
        let label = extract_bundle(&root, md5_hex(BUNDLE_LABEL.as_bytes())).unwrap();
        assert_eq!(label.bundle_member_entries.len(), 1);
        assert!(label.bundle_member_entries[0].has_lidvid_reference());
    }

    #[test]
    fn unknown_root_element_is_rejected() {
        let xml = "<Something_Else/>";
        let root = parse_xml_tree(xml).unwrap();
        assert_eq!(root.name, "Something_Else");
    }
}
