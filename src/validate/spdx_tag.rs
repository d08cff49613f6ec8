//! SPDX 2.3 tag-value checks.

use std::collections::HashSet;

use super::{check_license, DocumentValidator, Finding, ValidationResult};
use crate::model::NOASSERTION;
use crate::parsers::SpdxParser;

const FORMAT: &str = "SPDX 2.3 tag-value";

/// Document creation fields every SPDX 2.3 document carries.
const REQUIRED_FIELDS: &[&str] = &[
    "SPDXVersion",
    "DataLicense",
    "SPDXID",
    "DocumentName",
    "DocumentNamespace",
    "Creator",
    "Created",
];

/// Checks SPDX 2.3 tag-value documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpdxTagValueValidator;

/// `SPDXRef-` followed by letters, digits, `.` and `-`.
fn is_spdx_ref(id: &str) -> bool {
    id.strip_prefix("SPDXRef-").is_some_and(|rest| {
        !rest.is_empty()
            && rest
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    })
}

struct Package<'a> {
    name: &'a str,
    tags: Vec<(&'a str, &'a str)>,
}

impl<'a> Package<'a> {
    fn get(&self, tag: &str) -> Option<&'a str> {
        self.tags.iter().find(|(t, _)| *t == tag).map(|(_, v)| *v)
    }
}

impl DocumentValidator for SpdxTagValueValidator {
    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn validate(&self, content: &str) -> ValidationResult {
        let tags = match SpdxParser::tags(content) {
            Ok(tags) => tags,
            Err(e) => {
                return ValidationResult::new(FORMAT, None, vec![Finding::error(e.to_string())])
            }
        };
        let mut findings = Vec::new();

        let header_end = tags
            .iter()
            .position(|(_, tag, _)| tag == "PackageName")
            .unwrap_or(tags.len());
        let header = &tags[..header_end];
        let field = |name: &str| {
            header
                .iter()
                .find(|(_, tag, _)| tag == name)
                .map(|(_, _, value)| value.as_str())
        };

        for &name in REQUIRED_FIELDS {
            if field(name).is_none() {
                findings.push(Finding::error(format!("Missing {name} field")));
            }
        }
        let version = field("SPDXVersion").map(|v| v.trim_start_matches("SPDX-").to_string());
        if let Some(v) = field("SPDXVersion") {
            if v != "SPDX-2.3" {
                findings.push(Finding::error(format!("Unsupported SPDX version: {v}")));
            }
        }
        if let Some(license) = field("DataLicense") {
            if license != "CC0-1.0" {
                findings.push(Finding::error(format!(
                    "DataLicense must be CC0-1.0, found {license}"
                )));
            }
        }
        if let Some(id) = field("SPDXID") {
            if id != "SPDXRef-DOCUMENT" {
                findings.push(Finding::error(format!(
                    "Document SPDXID must be SPDXRef-DOCUMENT, found {id}"
                )));
            }
        }
        if let Some(namespace) = field("DocumentNamespace") {
            if !namespace.contains("://") || namespace.contains('#') {
                findings.push(Finding::error(format!(
                    "DocumentNamespace must be an absolute URI without '#': {namespace}"
                )));
            }
        }
        if let Some(created) = field("Created") {
            if chrono::DateTime::parse_from_rfc3339(created).is_err() {
                findings.push(Finding::error(format!(
                    "Created is not an RFC 3339 timestamp: {created}"
                )));
            }
        }
        for (line, tag, value) in header {
            let agents = ["Tool:", "Organization:", "Person:"];
            if tag == "Creator" && !agents.iter().any(|a| value.starts_with(a)) {
                findings.push(
                    Finding::error(format!("Creator must name a Tool, Organization or Person: {value}"))
                        .at(format!("line {line}")),
                );
            }
        }

        let document_refs: HashSet<&str> = header
            .iter()
            .filter(|(_, tag, _)| tag == "ExternalDocumentRef")
            .filter_map(|(_, _, value)| value.split_whitespace().next())
            .collect();

        let mut packages: Vec<Package<'_>> = Vec::new();
        let mut relationships = Vec::new();
        for (line, tag, value) in &tags[header_end..] {
            match tag.as_str() {
                "PackageName" => packages.push(Package {
                    name: value,
                    tags: Vec::new(),
                }),
                "Relationship" => relationships.push((*line, value.as_str())),
                _ => {
                    if let Some(package) = packages.last_mut() {
                        package.tags.push((tag.as_str(), value.as_str()));
                    }
                }
            }
        }
        relationships.extend(
            header
                .iter()
                .filter(|(_, tag, _)| tag == "Relationship")
                .map(|(line, _, value)| (*line, value.as_str())),
        );

        let mut ids: HashSet<&str> = HashSet::from(["SPDXRef-DOCUMENT"]);
        for package in &packages {
            match package.get("SPDXID") {
                None => findings.push(Finding::error("Package missing SPDXID").at(package.name)),
                Some(id) if !is_spdx_ref(id) => findings.push(
                    Finding::error(format!("Malformed SPDXID: {id}")).at(package.name),
                ),
                Some(id) => {
                    if !ids.insert(id) {
                        findings.push(
                            Finding::error(format!("Duplicate SPDXID: {id}")).at(package.name),
                        );
                    }
                }
            }
            if package.get("PackageDownloadLocation").is_none() {
                findings.push(
                    Finding::error("Package missing PackageDownloadLocation").at(package.name),
                );
            }
            for tag in ["PackageLicenseConcluded", "PackageLicenseDeclared"] {
                if let Some(expression) = package.get(tag) {
                    check_license(expression, package.name, &mut findings);
                }
            }
        }
        if packages.is_empty() {
            findings.push(Finding::warning("No packages found in SBOM"));
        }

        let known = |id: &str| {
            ids.contains(id)
                || id
                    .split_once(':')
                    .is_some_and(|(doc, element)| document_refs.contains(doc) && is_spdx_ref(element))
        };
        for (line, relationship) in relationships {
            let parts: Vec<&str> = relationship.split_whitespace().collect();
            let [from, _, to] = parts[..] else {
                findings.push(
                    Finding::error(format!("Malformed Relationship: {relationship}"))
                        .at(format!("line {line}")),
                );
                continue;
            };
            if !known(from) {
                findings.push(
                    Finding::error(format!("Relationship from unknown element {from}"))
                        .at(format!("line {line}")),
                );
            }
            if !(known(to) || to == NOASSERTION || to == "NONE") {
                findings.push(
                    Finding::error(format!("Relationship to unknown element {to}"))
                        .at(format!("line {line}")),
                );
            }
        }

        ValidationResult::new(FORMAT, version, findings)
    }
}
