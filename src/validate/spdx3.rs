//! SPDX 3.0 JSON-LD checks.

use std::collections::HashSet;

use serde_json::Value;

use super::{check_license, DocumentValidator, Finding, ValidationResult};

const FORMAT: &str = "SPDX 3 JSON-LD";

/// Vocabulary individuals (`NoAssertion`, ...) live under this prefix.
const SPDX_TERMS: &str = "https://spdx.org/rdf/";

/// Checks SPDX 3.0 and 3.0.1 JSON-LD documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spdx3Validator;

fn normalize_version(version: &str) -> Option<&'static str> {
    match version {
        "3.0" | "3.0.0" => Some("3.0.0"),
        "3.0.1" => Some("3.0.1"),
        _ => None,
    }
}

fn str_field<'a>(element: &'a Value, key: &str) -> Option<&'a str> {
    element.get(key).and_then(Value::as_str)
}

impl DocumentValidator for Spdx3Validator {
    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn validate(&self, content: &str) -> ValidationResult {
        let doc: Value = match serde_json::from_str(content) {
            Ok(doc) => doc,
            Err(e) => {
                let finding = Finding::error(format!("Invalid JSON: {e}"));
                return ValidationResult::new(FORMAT, None, vec![finding]);
            }
        };
        let mut findings = Vec::new();

        match str_field(&doc, "@context") {
            None => findings.push(Finding::error("Missing @context")),
            Some(context) if !context.starts_with(SPDX_TERMS) => {
                findings.push(Finding::error(format!("Unexpected @context: {context}")));
            }
            Some(_) => {}
        }
        let Some(graph) = doc.get("@graph").and_then(Value::as_array) else {
            findings.push(Finding::error("Missing @graph array"));
            return ValidationResult::new(FORMAT, None, findings);
        };

        let version = graph
            .iter()
            .find_map(|element| str_field(element, "specVersion"));
        match version {
            None => findings.push(Finding::error("Missing specVersion")),
            Some(v) if normalize_version(v).is_none() => {
                findings.push(Finding::error(format!("Unsupported SPDX version: {v}")));
            }
            Some(_) => {}
        }

        let mut creation_infos = HashSet::new();
        let mut ids = HashSet::new();
        let mut externals = HashSet::new();
        let mut documents = 0usize;
        let mut packages = 0usize;
        for element in graph {
            let Some(kind) = str_field(element, "type") else {
                findings.push(Finding::error("Element without type"));
                continue;
            };
            if kind == "CreationInfo" {
                match str_field(element, "@id") {
                    Some(id) => {
                        creation_infos.insert(id);
                    }
                    None => findings.push(Finding::error("CreationInfo without @id")),
                }
                if let Some(created) = str_field(element, "created") {
                    if chrono::DateTime::parse_from_rfc3339(created).is_err() {
                        findings.push(Finding::error(format!(
                            "created is not an RFC 3339 timestamp: {created}"
                        )));
                    }
                }
                continue;
            }
            let Some(id) = str_field(element, "spdxId") else {
                findings.push(Finding::error(format!("{kind} element without spdxId")));
                continue;
            };
            if !ids.insert(id) {
                findings.push(Finding::error(format!("Duplicate spdxId: {id}")));
            }
            match kind {
                "SpdxDocument" => {
                    documents += 1;
                    let maps = element.get("externalMap").and_then(Value::as_array);
                    externals.extend(
                        maps.into_iter()
                            .flatten()
                            .filter_map(|m| str_field(m, "externalSpdxId")),
                    );
                }
                "software_Package" | "software_File" => {
                    packages += 1;
                    if str_field(element, "name").is_none() {
                        findings.push(Finding::error("Package missing name").at(id));
                    }
                }
                "simplelicensing_LicenseExpression" => {
                    match str_field(element, "simplelicensing_licenseExpression") {
                        Some(expression) => check_license(expression, id, &mut findings),
                        None => findings.push(Finding::error("Empty license expression").at(id)),
                    }
                }
                _ => {}
            }
        }
        if documents != 1 {
            findings.push(Finding::error(format!(
                "Expected one SpdxDocument element, found {documents}"
            )));
        }
        if packages == 0 {
            findings.push(Finding::warning("No packages found in SBOM"));
        }

        let known = |iri: &str| {
            ids.contains(iri) || externals.contains(iri) || iri.starts_with(SPDX_TERMS)
        };
        for element in graph {
            if let Some(info) = str_field(element, "creationInfo") {
                if !creation_infos.contains(info) {
                    findings.push(
                        Finding::error(format!("Unknown creationInfo {info}"))
                            .at(str_field(element, "spdxId").unwrap_or("-")),
                    );
                }
            }
            if str_field(element, "type") != Some("Relationship") {
                continue;
            }
            let id = str_field(element, "spdxId").unwrap_or("-");
            let to = element.get("to").and_then(Value::as_array);
            let targets = to.into_iter().flatten().filter_map(Value::as_str);
            for target in str_field(element, "from").into_iter().chain(targets) {
                if !known(target) {
                    findings.push(
                        Finding::error(format!("Relationship references unknown element {target}"))
                            .at(id),
                    );
                }
            }
        }

        let version = version.map(|v| normalize_version(v).unwrap_or(v).to_string());
        ValidationResult::new(FORMAT, version, findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "@context": "https://spdx.org/rdf/3.0.1/spdx-context.jsonld",
            "@graph": [
                {"type": "CreationInfo", "@id": "_:creationinfo", "specVersion": "3.0.1",
                 "created": "2024-01-01T00:00:00Z"},
                {"type": "SpdxDocument", "spdxId": "urn:doc#SPDXRef-DOCUMENT",
                 "creationInfo": "_:creationinfo",
                 "externalMap": [{"type": "ExternalMap", "externalSpdxId": "urn:binsbom:external:libc.so.6"}]},
                {"type": "software_Package", "spdxId": "urn:doc#SPDXRef-app", "name": "app",
                 "creationInfo": "_:creationinfo"},
                {"type": "Relationship", "spdxId": "urn:doc#SPDXRef-Relationship-1",
                 "creationInfo": "_:creationinfo", "from": "urn:doc#SPDXRef-app",
                 "relationshipType": "dependsOn", "to": ["urn:binsbom:external:libc.so.6"]},
                {"type": "Relationship", "spdxId": "urn:doc#SPDXRef-Relationship-2",
                 "creationInfo": "_:creationinfo", "from": "urn:doc#SPDXRef-app",
                 "relationshipType": "hasDeclaredLicense",
                 "to": ["https://spdx.org/rdf/3.0.1/terms/Licensing/NoAssertion"]}
            ]
        })
    }

    #[test]
    fn test_well_formed_document() {
        let result = Spdx3Validator.validate(&document().to_string());
        assert!(result.is_valid, "{:?}", result.findings);
        assert_eq!(result.version.as_deref(), Some("3.0.1"));
    }

    #[test]
    fn test_missing_graph() {
        let content = r#"{"@context": "https://spdx.org/rdf/3.0.1/spdx-context.jsonld"}"#;
        let result = Spdx3Validator.validate(content);
        assert_eq!(result.findings, vec![Finding::error("Missing @graph array")]);
    }

    #[test]
    fn test_version_and_references() {
        let mut doc = document();
        doc["@graph"][0]["specVersion"] = json!("2.3");
        doc["@graph"][3]["to"] = json!(["urn:doc#SPDXRef-missing"]);
        doc["@graph"][2]["creationInfo"] = json!("_:other");
        let result = Spdx3Validator.validate(&doc.to_string());
        let messages: Vec<&str> = result.errors().map(|f| f.message.as_str()).collect();
        assert!(messages.contains(&"Unsupported SPDX version: 2.3"));
        assert!(messages.contains(&"Relationship references unknown element urn:doc#SPDXRef-missing"));
        assert!(messages.contains(&"Unknown creationInfo _:other"));
    }

    #[test]
    fn test_license_expressions_are_checked() {
        let mut doc = document();
        doc["@graph"].as_array_mut().unwrap().push(json!({
            "type": "simplelicensing_LicenseExpression", "spdxId": "urn:doc#SPDXRef-License-app",
            "creationInfo": "_:creationinfo", "simplelicensing_licenseExpression": "mit or whatever"
        }));
        let result = Spdx3Validator.validate(&doc.to_string());
        assert_eq!(result.error_count, 1);
        assert_eq!(result.findings[0].element.as_deref(), Some("urn:doc#SPDXRef-License-app"));
    }

    #[test]
    fn test_short_version_is_normalized() {
        let mut doc = document();
        doc["@graph"][0]["specVersion"] = json!("3.0");
        let result = Spdx3Validator.validate(&doc.to_string());
        assert!(result.is_valid);
        assert_eq!(result.version.as_deref(), Some("3.0.0"));
    }
}
