//! Integration tests for binsbom
//!
//! These tests build small binaries byte by byte, run them through
//! extraction, registration, generation and comparison, and check the
//! documents that come out.

mod common;

use binsbom::{
    config::{AppConfig, DiffFormat},
    diff::DiffEngine,
    error::BinsbomError,
    extract::{
        probe_magic, ArchiveExtractor, BinaryFormat, ElfExtractor, Extractor,
        ExtractorDispatcher, ExtractErrorKind, FileKind, MachOExtractor, PeExtractor,
    },
    generate::{canonicalize, GeneratorConfig, OutputFormat, SbomGenerator},
    model::{EdgeKind, EdgeTarget, Registry},
    parsers::parse_bom_str,
    pipeline::{self, exit_codes},
};
use chrono::{TimeZone, Utc};
use common::{elf64, fat_macho, pe64, write_file, CPU_TYPE_ARM64, CPU_TYPE_X86_64, ET_DYN, ET_EXEC};
use std::path::PathBuf;
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

/// `app` needs `libA.so.1` and `libc.so.6`; `libA.so.1` is present too.
fn app_and_lib(dir: &TempDir) -> (PathBuf, PathBuf) {
    let app = write_file(
        dir.path(),
        "app",
        &elf64(ET_EXEC, &["libA.so.1", "libc.so.6"], None),
    );
    let lib = write_file(
        dir.path(),
        "libA.so.1",
        &elf64(ET_DYN, &["libc.so.6"], Some("libA.so.1")),
    );
    (app, lib)
}

fn reproducible(format: &str) -> AppConfig {
    AppConfig::builder()
        .format(format)
        .timestamp(Some("2024-01-01T00:00:00Z".to_string()))
        .threads(1)
        .build()
}

fn fixed_generator_config() -> GeneratorConfig {
    GeneratorConfig::default()
        .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .with_document_name("fixture")
}

// ============================================================================
// Extraction Tests
// ============================================================================

mod extraction_tests {
    use super::*;

    #[test]
    fn test_elf_needed_entries() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app_and_lib(&dir);

        let artifact = ExtractorDispatcher::standard().extract_path(&app).unwrap();
        assert_eq!(artifact.format, "ELF");
        assert_eq!(artifact.architectures.len(), 1);
        assert_eq!(artifact.architectures[0].name, "x86_64");
        assert_eq!(artifact.architectures[0].bits, 64);
        assert_eq!(artifact.build_info.file_kind, FileKind::Executable);

        let deps: Vec<&str> = artifact.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(deps, vec!["libA.so.1", "libc.so.6"]);
        assert_eq!(artifact.checksum.len(), 64);
    }

    #[test]
    fn test_elf_soname_and_version() {
        let dir = TempDir::new().unwrap();
        let (_, lib) = app_and_lib(&dir);

        let artifact = ExtractorDispatcher::standard().extract_path(&lib).unwrap();
        assert_eq!(artifact.build_info.file_kind, FileKind::SharedLibrary);
        assert_eq!(artifact.build_info.soname.as_deref(), Some("libA.so.1"));
        assert_eq!(artifact.version.as_deref(), Some("1"));
    }

    #[test]
    fn test_fat_macho_reports_every_slice() {
        let dir = TempDir::new().unwrap();
        let bytes = fat_macho(&[CPU_TYPE_X86_64, CPU_TYPE_ARM64]);
        assert_eq!(probe_magic(&bytes), Some(BinaryFormat::MachOFat));
        let path = write_file(dir.path(), "libuniversal.dylib", &bytes);

        let artifact = ExtractorDispatcher::standard().extract_path(&path).unwrap();
        assert_eq!(artifact.format, "Mach-O");
        let arches: Vec<&str> = artifact.architectures.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(arches, vec!["x86_64", "aarch64"]);
        assert_eq!(artifact.architectures[0].offset, Some(0x1000));
        assert_eq!(artifact.architectures[1].offset, Some(0x2000));
        assert_eq!(artifact.build_info.file_kind, FileKind::SharedLibrary);
    }

    #[test]
    fn test_pe_image() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "tool.exe", &pe64());

        let artifact = ExtractorDispatcher::standard().extract_path(&path).unwrap();
        assert_eq!(artifact.format, "PE");
        assert_eq!(artifact.architectures[0].name, "x86_64");
        assert!(artifact.dependencies.is_empty());
        assert!(artifact.version.is_none());
    }

    #[test]
    fn test_archive_members_are_extracted() {
        let dir = TempDir::new().unwrap();
        let object = common::elf64_object(&["member_fn"]);
        let bytes = common::archive(&[("a.o", &object), ("notes.txt", b"hello")]);
        let path = write_file(dir.path(), "libx.a", &bytes);

        let artifact = ExtractorDispatcher::standard().extract_path(&path).unwrap();
        assert_eq!(artifact.format, "Archive");
        assert_eq!(artifact.build_info.file_kind, FileKind::StaticLibrary);
        assert_eq!(artifact.members.len(), 1);
        assert_eq!(artifact.members[0].file_name(), "libx.a(a.o)");
        assert_eq!(artifact.members[0].build_info.file_kind, FileKind::Object);

        // Member symbols stay on the member, not on the archive
        assert!(artifact.symbols.is_empty());
        assert!(artifact.members[0]
            .symbols
            .iter()
            .any(|s| s.name == "member_fn" && s.is_defined));

        let mut registry = Registry::new();
        let archive_ref = registry.register_artifact(&artifact).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry
            .edges()
            .any(|e| e.from == archive_ref && e.kind == EdgeKind::Contains));
    }

    #[test]
    fn test_empty_and_text_files_select_nothing() {
        let dir = TempDir::new().unwrap();
        let empty = write_file(dir.path(), "empty", b"");
        let text = write_file(dir.path(), "README", b"not a binary\n");
        let dispatcher = ExtractorDispatcher::standard();

        assert!(dispatcher.select_path(&empty).unwrap().is_none());
        assert!(dispatcher.select_path(&text).unwrap().is_none());

        let err = dispatcher.extract_path(&text).unwrap_err();
        assert!(matches!(err.kind, ExtractErrorKind::BadMagic));
    }

    #[test]
    fn test_size_limit() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app_and_lib(&dir);

        let err = ExtractorDispatcher::standard()
            .with_max_file_size(16)
            .extract_path(&app)
            .unwrap_err();
        assert!(matches!(err.kind, ExtractErrorKind::TooLarge { limit: 16, .. }));
    }

    #[test]
    fn test_truncated_elf_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let mut bytes = elf64(ET_EXEC, &["libc.so.6"], None);
        bytes.truncate(80);
        let path = write_file(dir.path(), "cut", &bytes);

        assert!(ExtractorDispatcher::standard().extract_path(&path).is_err());
    }

    #[test]
    fn test_dispatcher_rejects_shared_priority() {
        let result = ExtractorDispatcher::new(vec![
            Extractor::Elf(ElfExtractor::new()),
            Extractor::MachO(MachOExtractor::new()),
            Extractor::Elf(ElfExtractor::new()),
        ]);
        assert!(matches!(result, Err(BinsbomError::Dispatch { .. })));

        let ok = ExtractorDispatcher::new(vec![
            Extractor::Archive(ArchiveExtractor::new()),
            Extractor::Pe(PeExtractor::new()),
        ])
        .unwrap();
        let names: Vec<&str> = ok
            .extractors()
            .map(binsbom::BinaryExtractor::format_name)
            .collect();
        assert_eq!(names, vec!["PE", "Archive"]);
    }
}

// ============================================================================
// Registry and Generation Tests
// ============================================================================

mod generation_tests {
    use super::*;

    fn registry_for(paths: &[PathBuf]) -> Registry {
        let dispatcher = ExtractorDispatcher::standard();
        let mut registry = Registry::new();
        for path in paths {
            let artifact = dispatcher.extract_path(path).unwrap();
            registry.register_artifact(&artifact).unwrap();
        }
        registry
    }

    #[test]
    fn test_dependencies_resolve_or_go_external() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let mut registry = registry_for(&[app, lib]);

        let outcome = registry.resolve_edges();
        assert_eq!(outcome.resolved, 1);
        assert_eq!(outcome.external, 2);
        assert!(registry.validate().is_empty());
        assert!(registry.edges().all(|e| !e.to.is_pending()));
        assert_eq!(registry.external_targets(), vec!["libc.so.6"]);

        let app = registry.find_by_name("app").unwrap();
        let lib = registry.find_by_name("libA.so.1").unwrap();
        assert_eq!(app.dependencies, vec![lib.bom_ref().clone()]);
        assert!(registry
            .edges()
            .any(|e| &e.from == lib.bom_ref() && e.to == EdgeTarget::External("libc.so.6".into())));
    }

    #[test]
    fn test_same_file_registers_once() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app_and_lib(&dir);
        let artifact = ExtractorDispatcher::standard().extract_path(&app).unwrap();

        let mut registry = Registry::new();
        let first = registry.register_artifact(&artifact).unwrap();
        let second = registry.register_artifact(&artifact).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.edge_count(), 2);
    }

    #[test]
    fn test_path_spellings_share_identity() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app_and_lib(&dir);
        let dotted = dir.path().join(".").join("app");

        let registry = registry_for(&[app, dotted]);
        assert_eq!(registry.len(), 1);
        assert!(registry.find_by_name("app").is_some());
    }

    #[test]
    fn test_cyclonedx_round_trip() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let registry = registry_for(&[app, lib]);

        let document = SbomGenerator::generate(
            registry,
            fixed_generator_config(),
            OutputFormat::default(),
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&document).unwrap();
        assert_eq!(json["bomFormat"], "CycloneDX");
        assert_eq!(json["specVersion"], "1.6");
        assert_eq!(json["metadata"]["timestamp"], "2024-01-01T00:00:00Z");

        let bom = parse_bom_str(&document).unwrap();
        assert_eq!(bom.components.len(), 2);
        assert_eq!(bom.externals.len(), 1);
        assert!(bom.components.values().any(|c| c.name == "app"));
        assert!(bom
            .components
            .values()
            .any(|c| c.name == "libA.so.1" && c.version.as_deref() == Some("1")));
        assert_eq!(bom.edges.len(), 3);
    }

    #[test]
    fn test_fixed_timestamp_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let paths = [app, lib];

        for format in OutputFormat::all() {
            let first =
                SbomGenerator::generate(registry_for(&paths), fixed_generator_config(), format)
                    .unwrap();
            let second =
                SbomGenerator::generate(registry_for(&paths), fixed_generator_config(), format)
                    .unwrap();
            assert_eq!(first, second, "{format} output differs between runs");
        }
    }

    #[test]
    fn test_spdx_tag_value_document() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let document = SbomGenerator::generate(
            registry_for(&[app, lib]),
            fixed_generator_config(),
            OutputFormat::SpdxTagValue,
        )
        .unwrap();

        assert!(document.starts_with("SPDXVersion: SPDX-2.3\n"));
        assert!(document.contains("Created: 2024-01-01T00:00:00Z\n"));
        assert!(document.contains("ExternalDocumentRef: DocumentRef-external "));
        assert!(document.contains("Relationship: SPDXRef-app DEPENDS_ON SPDXRef-libA.so.1-1\n"));
        assert!(document
            .contains("Relationship: SPDXRef-app DEPENDS_ON DocumentRef-external:SPDXRef-libc.so.6\n"));
    }

    #[test]
    fn test_canonical_form_ignores_key_order_and_signatures() {
        let a = r#"{"b": 1, "a": {"y": [1, 2], "x": "v"}, "signature": {"value": "abc"}}"#;
        let b = r#"{
            "a": {"x": "v", "y": [1, 2]},
            "b": 1
        }"#;
        assert_eq!(canonicalize(a).unwrap(), canonicalize(b).unwrap());
        assert_eq!(
            String::from_utf8(canonicalize(b).unwrap()).unwrap(),
            r#"{"a":{"x":"v","y":[1,2]},"b":1}"#
        );
        assert!(canonicalize("not a document").is_err());
    }
}

// ============================================================================
// Diff Tests
// ============================================================================

mod diff_tests {
    use super::*;

    fn cyclonedx(paths: &[PathBuf]) -> String {
        let (registry, _) =
            pipeline::build_registry_from_paths(paths, &reproducible("cyclonedx-1.6")).unwrap();
        pipeline::render_registry(registry, &reproducible("cyclonedx-1.6")).unwrap()
    }

    #[test]
    fn test_self_diff_is_empty() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let bom = parse_bom_str(&cyclonedx(&[app, lib])).unwrap();

        let result = DiffEngine::new().diff(&bom, &bom).unwrap();
        assert!(!result.has_changes());
        assert_eq!(result.summary.total_changes, 0);
    }

    #[test]
    fn test_removed_library() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let old = parse_bom_str(&cyclonedx(&[app.clone(), lib])).unwrap();
        let new = parse_bom_str(&cyclonedx(&[app])).unwrap();

        let result = DiffEngine::new().diff(&old, &new).unwrap();
        assert_eq!(result.summary.components_removed, 1);
        assert_eq!(result.components.removed[0].name, "libA.so.1");
        assert_eq!(result.summary.components_added, 0);
        // libA's own edge to libc disappears with it
        assert_eq!(result.summary.dependencies_removed, 1);
        assert!(result.to_text().contains("  - libA.so.1@1"));
    }

    #[test]
    fn test_diff_reports_through_pipeline() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let old = write_file(dir.path(), "old.cdx.json", cyclonedx(&[app.clone(), lib]).as_bytes());
        let new = write_file(dir.path(), "new.cdx.json", cyclonedx(&[app]).as_bytes());

        let config = AppConfig::default().diff;
        let result = pipeline::compute_diff(&old, &new, &config).unwrap();
        let csv = pipeline::render_diff(&result, DiffFormat::Csv).unwrap();
        assert!(csv.contains("component,removed,\"libA.so.1\",\"1\",\"-\",\"\""));
        let json = pipeline::render_diff(&result, DiffFormat::Json).unwrap();
        assert!(json.contains("\"components_removed\": 1"));
    }
}

// ============================================================================
// Pipeline Tests
// ============================================================================

mod pipeline_tests {
    use super::*;

    #[test]
    fn test_directory_walk_skips_non_binaries() {
        let dir = TempDir::new().unwrap();
        app_and_lib(&dir);
        write_file(dir.path(), "README.md", b"# docs\n");

        let outcome = pipeline::generate_document(
            &[dir.path().to_path_buf()],
            &reproducible("cyclonedx-1.5"),
        )
        .unwrap();
        assert_eq!(outcome.report.registered, 2);
        assert!(!outcome.report.is_partial());
        let bom = parse_bom_str(&outcome.document).unwrap();
        assert_eq!(bom.components.len(), 2);
    }

    #[test]
    fn test_one_file_named_twice_is_one_component() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let inputs = vec![
            app.clone(),
            dir.path().join(".").join("app"),
            lib,
            dir.path().join("sub").join("..").join("libA.so.1"),
        ];
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let (registry, report) =
            pipeline::build_registry_from_paths(&inputs, &reproducible("cyclonedx-1.6")).unwrap();
        assert_eq!(report.registered, 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_explicit_non_binary_is_partial() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app_and_lib(&dir);
        let text = write_file(dir.path(), "notes.txt", b"plain text");

        let outcome =
            pipeline::generate_document(&[app, text.clone()], &reproducible("spdx-2.3")).unwrap();
        assert_eq!(outcome.report.registered, 1);
        assert!(outcome.report.is_partial());
        assert_eq!(outcome.report.failed[0].0, text);
    }

    #[test]
    fn test_strict_mode_aborts() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app_and_lib(&dir);
        let text = write_file(dir.path(), "notes.txt", b"plain text");

        let mut config = reproducible("spdx-2.3");
        config.behavior.strict = true;
        assert!(pipeline::generate_document(&[app, text], &config).is_err());
    }

    #[test]
    fn test_overrides_apply_licenses() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let overrides = write_file(
            dir.path(),
            "overrides.yaml",
            b"components:\n  app:\n    license: totally-not-a-license\n  libA.so.1:\n    license: MIT\n    supplier: Acme\n",
        );

        let mut config = reproducible("spdx-2.3");
        config.extraction.overrides = Some(overrides);
        let outcome = pipeline::generate_document(&[app, lib], &config).unwrap();

        assert_eq!(outcome.report.overrides_applied, 2);
        let doc = &outcome.document;
        assert!(doc.contains("PackageName: app\n"));
        assert!(doc.contains("PackageLicenseDeclared: NOASSERTION\n"));
        assert!(doc.contains("PackageLicenseDeclared: MIT\n"));
        assert!(doc.contains("PackageSupplier: Organization: Acme\n"));
    }

    #[test]
    fn test_license_file_fills_and_overrides_win() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        write_file(
            dir.path(),
            "COPYING",
            b"Permission to use, copy, modify, and/or distribute this software for any\n\
              purpose with or without fee is hereby granted.",
        );
        let overrides = write_file(
            dir.path(),
            "overrides.yaml",
            b"components:\n  libA.so.1:\n    license: Zlib\n",
        );

        let mut config = reproducible("spdx-2.3");
        config.extraction.overrides = Some(overrides);
        let (registry, report) =
            pipeline::build_registry_from_paths(&[app.clone(), lib.clone()], &config).unwrap();
        assert_eq!(report.licenses_detected, 2);

        let app = registry.find_by_name("app").unwrap();
        assert_eq!(app.license.spdx_or_noassertion(), "ISC");
        let lib = registry.find_by_name("libA.so.1").unwrap();
        assert_eq!(lib.license.spdx_or_noassertion(), "Zlib");

        config.extraction.skip_detection = true;
        let (registry, report) =
            pipeline::build_registry_from_paths(&[dir.path().join("app")], &config).unwrap();
        assert_eq!(report.licenses_detected, 0);
        assert!(registry.find_by_name("app").unwrap().license.is_noassertion());
    }

    #[test]
    fn test_written_documents_pass_validation() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let mut inputs = Vec::new();
        for format in OutputFormat::all() {
            let config = reproducible(&format.to_string());
            let outcome = pipeline::generate_document(&[app.clone(), lib.clone()], &config).unwrap();
            let name = format!("{format}.{}", format.extension());
            inputs.push(write_file(dir.path(), &name, outcome.document.as_bytes()));
        }

        let mut config = reproducible("spdx-2.3");
        config.behavior.quiet = true;
        config.output.file = Some(dir.path().join("report.json"));
        let code = binsbom::cli::run_validate(
            &inputs,
            binsbom::cli::ValidateFormat::Json,
            true,
            &config,
        )
        .unwrap();
        assert_eq!(code, exit_codes::SUCCESS);

        let broken = write_file(
            dir.path(),
            "broken.cdx.json",
            br#"{"bomFormat":"CycloneDX","specVersion":"1.2"}"#,
        );
        let code =
            binsbom::cli::run_validate(&[broken], binsbom::cli::ValidateFormat::Text, false, &config)
                .unwrap();
        assert_eq!(code, exit_codes::VALIDATION_FAILED);
    }

    #[test]
    fn test_generate_command_writes_file() {
        let dir = TempDir::new().unwrap();
        let (app, lib) = app_and_lib(&dir);
        let output = dir.path().join("out").join("sbom.json");
        std::fs::create_dir_all(output.parent().unwrap()).unwrap();

        let mut config = reproducible("spdx-3.0.1");
        config.output.file = Some(output.clone());
        config.behavior.quiet = true;
        let code = binsbom::cli::run_generate(&[app, lib], &config).unwrap();
        assert_eq!(code, exit_codes::SUCCESS);

        let written = std::fs::read_to_string(&output).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert!(json.get("@context").is_some());
        let bom = parse_bom_str(&written).unwrap();
        assert_eq!(bom.components.len(), 2);
    }
}
