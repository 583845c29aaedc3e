//! End-to-end properties of the squash engine.

use pretty_assertions::assert_eq;
use relgen_squash::{IngestOptions, SquashError, Squasher, Substitution};

fn default_opts() -> IngestOptions<'static> {
    IngestOptions::default()
}

#[test]
fn ingestion_is_concatenation_with_separators() {
    let mut merged = Squasher::new(false, "");
    merged.ingest("a.c", "int a;\n", &default_opts());
    merged.ingest("b.c", "int b;\nint c;\n", &default_opts());

    let mut expected = Squasher::new(false, "");
    expected.ingest("ab.c", "int a;\n", &default_opts());
    expected.ingest("ab.c", "int b;\nint c;\n", &default_opts());

    assert_eq!(merged.serialize(), expected.serialize());
    assert_eq!(merged.serialize(), "\n\n\nint a;\n\n\nint b;\nint c;\n");
}

#[test]
fn system_includes_deduplicate_across_fragments() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "a.c",
        "#include <stdint.h>\n#include <stdio.h>\nint a;\n",
        &default_opts(),
    );
    squash.ingest(
        "b.c",
        "#include <stdint.h>\nint b;\n",
        &default_opts(),
    );

    let out = squash.serialize();
    assert_eq!(out.matches("#include <stdint.h>").count(), 1);
    // First-capture order is preserved.
    let stdint = out.find("#include <stdint.h>").unwrap();
    let stdio = out.find("#include <stdio.h>").unwrap();
    assert!(stdint < stdio);
}

#[test]
fn assert_include_stays_inline_and_is_never_hoisted() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "a.c",
        "#ifdef SHT_DEBUG\n#include <assert.h>\n#endif\n",
        &default_opts(),
    );
    squash.ingest(
        "b.c",
        "#ifdef SHT_DEBUG\n#include <assert.h>\n#endif\n",
        &default_opts(),
    );

    let out = squash.serialize();
    // Retained verbatim in both fragment bodies, absent from the include block.
    assert_eq!(out.matches("#include <assert.h>").count(), 2);
    assert!(out.find("#include <assert.h>").unwrap() > out.find("#ifdef SHT_DEBUG").unwrap());
}

#[test]
fn project_includes_from_fragments_are_dropped() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "a.c",
        "#include \"sht.h\"\nint a;\n",
        &default_opts(),
    );
    assert!(!squash.serialize().contains("sht.h"));
}

#[test]
fn injected_includes_are_idempotent_and_ordered() {
    let mut squash = Squasher::new(false, "");
    squash.ingest("a.c", "#include <stdint.h>\nint a;\n", &default_opts());
    squash.inject_include("sht3x.h");
    squash.inject_include("sensirion_arch_config.h");
    squash.inject_include("sht3x.h");

    let out = squash.serialize();
    assert_eq!(
        out,
        "\n#include <stdint.h>\n\n#include \"sht3x.h\"\n#include \"sensirion_arch_config.h\"\n\n\nint a;\n"
    );
}

#[test]
fn visibility_restriction_narrows_function_definitions() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "a.c",
        "#include <stdio.h>\n#include <assert.h>\nvoid foo(int x)\n{\n}\n",
        &default_opts(),
    );

    let out = squash.serialize();
    assert!(out.starts_with("\n#include <stdio.h>\n"));
    assert!(out.contains("\n#include <assert.h>\n"));
    assert!(out.contains("\nstatic void foo(int x)\n{\n}\n"));
}

#[test]
fn visibility_restriction_is_idempotent() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "a.c",
        "static void foo(int x)\n{\n}\n",
        &default_opts(),
    );
    let out = squash.serialize();
    assert!(out.contains("\nstatic void foo(int x)\n"));
    assert!(!out.contains("static static"));
}

#[test]
fn declarations_keep_their_visibility_when_restriction_is_off() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "a.c",
        "void foo(int x)\n{\n}\n",
        &IngestOptions {
            restrict_visibility: false,
            ..IngestOptions::default()
        },
    );
    assert!(squash.serialize().contains("\nvoid foo(int x)\n"));
}

#[test]
fn copyright_reflects_most_recent_flagged_fragment() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "a.c",
        "/* first */\nint a;\n",
        &IngestOptions {
            set_copyright: true,
            ..IngestOptions::default()
        },
    );
    squash.ingest(
        "b.c",
        "/* second */\nint b;\n",
        &IngestOptions {
            set_copyright: true,
            ..IngestOptions::default()
        },
    );
    squash.ingest("c.c", "/* third */\nint c;\n", &default_opts());

    let out = squash.serialize();
    assert!(out.starts_with("/* second */\n"));
    assert!(!out.contains("first"));
    assert!(!out.contains("third"));
}

#[test]
fn discarded_headers_do_not_reach_the_body() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "a.c",
        "/*\n * Copyright (c) 2018\n */\nint a;\n",
        &default_opts(),
    );
    let out = squash.serialize();
    assert!(!out.contains("Copyright"));
    assert!(out.contains("int a;"));
}

#[test]
fn header_only_fragment_produces_no_body_lines() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "hdr.txt",
        "/*\n * license text\n */\n",
        &IngestOptions {
            set_copyright: true,
            ..IngestOptions::default()
        },
    );
    assert_eq!(squash.serialize(), "/*\n * license text\n */\n\n");
}

#[test]
fn unclosed_header_truncates_silently() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "bad.c",
        "/* never closed\nint hidden;\n",
        &default_opts(),
    );
    assert_eq!(squash.serialize(), "\n");
}

#[test]
fn zero_fragments_serialize_to_the_bare_copyright_section() {
    let squash = Squasher::new(false, "");
    assert_eq!(squash.serialize(), "\n");

    let tagged = Squasher::new(false, "v1.0.0");
    assert_eq!(tagged.serialize(), "/* SHT Driver Version: v1.0.0\n *\n\n");
}

#[test]
fn version_tag_fuses_with_the_copyright_comment() {
    let mut squash = Squasher::new(false, "v1.2.3-dirty");
    squash.ingest(
        "a.c",
        "/* Copyright X\n * all rights */\nint a;\n",
        &IngestOptions {
            set_copyright: true,
            ..IngestOptions::default()
        },
    );

    let out = squash.serialize();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "/* SHT Driver Version: v1.2.3-dirty");
    assert_eq!(lines[1], " *");
    assert_eq!(lines[2], " * Copyright X");
    assert_eq!(lines[3], " * all rights */");
}

#[test]
fn bare_comment_opener_is_dropped_when_tag_is_injected() {
    let mut squash = Squasher::new(false, "v2.0.0");
    squash.ingest(
        "a.c",
        "/*\n * Copyright X\n */\nint a;\n",
        &IngestOptions {
            set_copyright: true,
            ..IngestOptions::default()
        },
    );

    let out = squash.serialize();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "/* SHT Driver Version: v2.0.0");
    assert_eq!(lines[1], " *");
    assert_eq!(lines[2], " * Copyright X");
    assert_eq!(lines[3], " */");
}

#[test]
fn without_version_tag_the_copyright_is_untouched() {
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "a.c",
        "/* Copyright X */\nint a;\n",
        &IngestOptions {
            set_copyright: true,
            ..IngestOptions::default()
        },
    );
    assert!(squash.serialize().starts_with("/* Copyright X */\n\n"));
}

#[test]
fn substitutions_apply_to_copyright_lines_too() {
    let subs = vec![Substitution::new(r"\[###SENSOR###\]", "SHT3x").unwrap()];
    let mut squash = Squasher::new(false, "");
    squash.ingest(
        "hdr.txt",
        "/* [###SENSOR###] driver */\n",
        &IngestOptions {
            set_copyright: true,
            substitutions: Some(&subs),
            ..IngestOptions::default()
        },
    );
    assert!(squash.serialize().starts_with("/* SHT3x driver */\n"));
}

#[test]
fn trailing_whitespace_is_trimmed_from_ingested_lines() {
    let mut squash = Squasher::new(false, "");
    squash.ingest("a.c", "int a;   \r\n", &default_opts());
    assert_eq!(squash.serialize(), "\n\n\nint a;\n");
}

#[test]
fn ingest_file_and_write_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");

    let fragment = root.join("frag.c");
    std::fs::write(&fragment, "#include <stdint.h>\nint a;\n").expect("write fragment");

    let mut squash = Squasher::new(false, "");
    squash.ingest_file(&fragment, &default_opts()).expect("ingest");

    let dest = root.join("out.c");
    squash.write(&dest).expect("write output");
    let written = std::fs::read_to_string(&dest).expect("read back");
    assert_eq!(written, squash.serialize());
}

#[test]
fn missing_fragment_is_a_typed_error() {
    let mut squash = Squasher::new(false, "");
    let err = squash
        .ingest_file(camino::Utf8Path::new("/nonexistent/frag.c"), &default_opts())
        .unwrap_err();
    assert!(matches!(err, SquashError::MissingFragment { .. }));
}

#[test]
fn write_failure_is_a_typed_error() {
    let squash = Squasher::new(false, "");
    let err = squash
        .write(camino::Utf8Path::new("/nonexistent/dir/out.c"))
        .unwrap_err();
    assert!(matches!(err, SquashError::WriteFailure { .. }));
}
