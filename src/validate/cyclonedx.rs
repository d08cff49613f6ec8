//! CycloneDX 1.4 to 1.6 JSON checks.

use std::collections::HashSet;

use serde_json::Value;

use super::{check_license, DocumentValidator, Finding, ValidationResult};

const FORMAT: &str = "CycloneDX JSON";

const SUPPORTED_VERSIONS: &[&str] = &["1.4", "1.5", "1.6"];

const COMPONENT_TYPES: &[&str] = &[
    "application",
    "framework",
    "library",
    "container",
    "platform",
    "operating-system",
    "device",
    "device-driver",
    "firmware",
    "file",
    "machine-learning-model",
    "data",
    "cryptographic-asset",
];

/// Checks CycloneDX JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycloneDxValidator;

/// Walks nested components, collecting `bom-ref`s.
struct ComponentChecks<'a> {
    refs: HashSet<&'a str>,
    count: usize,
    findings: Vec<Finding>,
}

impl<'a> ComponentChecks<'a> {
    fn visit(&mut self, components: &'a [Value]) {
        for component in components {
            self.count += 1;
            let name = component.get("name").and_then(Value::as_str);
            let label = name.unwrap_or("-");
            if name.is_none() {
                self.findings.push(Finding::error("Component missing name"));
            }
            match component.get("type").and_then(Value::as_str) {
                None => self
                    .findings
                    .push(Finding::error("Component missing type").at(label)),
                Some(kind) if !COMPONENT_TYPES.contains(&kind) => self.findings.push(
                    Finding::error(format!("Unknown component type: {kind}")).at(label),
                ),
                Some(_) => {}
            }
            if let Some(bom_ref) = component.get("bom-ref").and_then(Value::as_str) {
                if !self.refs.insert(bom_ref) {
                    self.findings.push(
                        Finding::error(format!("Duplicate bom-ref: {bom_ref}")).at(label),
                    );
                }
            }
            let licenses = component.get("licenses").and_then(Value::as_array);
            for choice in licenses.into_iter().flatten() {
                self.check_license_choice(choice, label);
            }
            if let Some(children) = component.get("components").and_then(Value::as_array) {
                self.visit(children);
            }
        }
    }

    fn check_license_choice(&mut self, choice: &Value, label: &str) {
        if let Some(expression) = choice.get("expression").and_then(Value::as_str) {
            check_license(expression, label, &mut self.findings);
        } else if let Some(license) = choice.get("license") {
            let id = license.get("id").and_then(Value::as_str);
            match id {
                Some(id) if spdx::license_id(id).is_none() => self.findings.push(
                    Finding::error(format!("Unknown SPDX license id: {id}")).at(label),
                ),
                Some(_) => {}
                None if license.get("name").and_then(Value::as_str).is_some() => {}
                None => self
                    .findings
                    .push(Finding::error("License without id or name").at(label)),
            }
        } else {
            self.findings
                .push(Finding::error("License entry without license or expression").at(label));
        }
    }
}

impl DocumentValidator for CycloneDxValidator {
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

        match doc.get("bomFormat").and_then(Value::as_str) {
            None => findings.push(Finding::error("Missing bomFormat field")),
            Some("CycloneDX") => {}
            Some(other) => findings.push(Finding::error(format!(
                "bomFormat must be CycloneDX, found {other}"
            ))),
        }
        let version = doc.get("specVersion").and_then(Value::as_str);
        match version {
            None => findings.push(Finding::error("Missing specVersion field")),
            Some(v) if !SUPPORTED_VERSIONS.contains(&v) => {
                findings.push(Finding::error(format!("Unsupported CycloneDX version: {v}")));
            }
            Some(_) => {}
        }
        match doc.get("version") {
            None => findings.push(Finding::error("Missing version field")),
            Some(v) if v.as_u64().map_or(true, |n| n == 0) => {
                findings.push(Finding::error(format!(
                    "version must be a positive integer, found {v}"
                )));
            }
            Some(_) => {}
        }
        if let Some(serial) = doc.get("serialNumber").and_then(Value::as_str) {
            let valid = serial
                .strip_prefix("urn:uuid:")
                .is_some_and(|u| uuid::Uuid::parse_str(u).is_ok());
            if !valid {
                findings.push(Finding::error(format!(
                    "serialNumber is not a urn:uuid: {serial}"
                )));
            }
        }
        match doc.get("metadata") {
            None => findings.push(Finding::error("Missing metadata field")),
            Some(metadata) => {
                if let Some(timestamp) = metadata.get("timestamp").and_then(Value::as_str) {
                    if chrono::DateTime::parse_from_rfc3339(timestamp).is_err() {
                        findings.push(Finding::error(format!(
                            "metadata.timestamp is not an RFC 3339 timestamp: {timestamp}"
                        )));
                    }
                }
            }
        }

        let mut checks = ComponentChecks {
            refs: HashSet::new(),
            count: 0,
            findings: Vec::new(),
        };
        if let Some(root) = doc.pointer("/metadata/component") {
            checks.visit(std::slice::from_ref(root));
        }
        let root_count = checks.count;
        if let Some(components) = doc.get("components").and_then(Value::as_array) {
            checks.visit(components);
        }
        if checks.count == root_count {
            findings.push(Finding::warning("No components found in SBOM"));
        }
        findings.append(&mut checks.findings);

        let dependencies = doc.get("dependencies").and_then(Value::as_array);
        for dependency in dependencies.into_iter().flatten() {
            let Some(from) = dependency.get("ref").and_then(Value::as_str) else {
                findings.push(Finding::error("Dependency without ref"));
                continue;
            };
            if !checks.refs.contains(from) {
                findings.push(Finding::error(format!("Dependency ref {from} names no component")));
            }
            let targets = dependency.get("dependsOn").and_then(Value::as_array);
            for target in targets.into_iter().flatten().filter_map(Value::as_str) {
                if !checks.refs.contains(target) {
                    findings.push(
                        Finding::error(format!("dependsOn {target} names no component")).at(from),
                    );
                }
            }
        }

        ValidationResult::new(FORMAT, version.map(str::to_string), findings)
    }
}
