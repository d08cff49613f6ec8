//! Serializer contract and helpers shared by the writers.

use super::context::DocumentContext;
use super::format::OutputFormat;
use crate::error::Result;
use crate::model::{Component, Registry};

/// One output format over a resolved registry.
pub trait DocumentWriter {
    fn format(&self) -> OutputFormat;

    /// Render the whole document. Must be deterministic for a given registry
    /// and context.
    fn write_document(&self, registry: &Registry, ctx: &DocumentContext) -> Result<String>;
}

/// Binary facts that have no native field in either SBOM format, as
/// ordered `binsbom:*` key/value pairs.
pub(crate) fn component_properties(
    component: &Component,
    ctx: &DocumentContext,
) -> Vec<(String, String)> {
    let mut props: Vec<(String, String)> = component
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if !component.architectures.is_empty() {
        let arches: Vec<&str> = component
            .architectures
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        props.push(("binsbom:architectures".to_string(), arches.join(",")));
    }
    if component.symbols_count > 0 {
        props.push((
            "binsbom:defined-symbols".to_string(),
            component.symbols_count.to_string(),
        ));
    }
    if component.build_info.is_stripped {
        props.push(("binsbom:stripped".to_string(), "true".to_string()));
    }
    if let Some(soname) = &component.build_info.soname {
        props.push(("binsbom:soname".to_string(), soname.clone()));
    }
    if ctx.include_debug_details {
        let lists = [
            ("binsbom:compile-units", &component.compile_units),
            ("binsbom:source-files", &component.source_files),
            ("binsbom:functions", &component.functions),
        ];
        for (key, values) in lists {
            if !values.is_empty() {
                props.push((key.to_string(), values.join(",")));
            }
        }
    }
    for conflict in &component.merge_conflicts {
        props.push((
            format!("binsbom:merge-conflict:{}", conflict.field),
            format!("kept {} over {}", conflict.kept, conflict.discarded),
        ));
    }
    props
}
