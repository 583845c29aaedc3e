//! Build all output units for one (sensor, transport) variant.
//!
//! Each unit gets its own engine instance; a failed fragment read or output
//! write aborts the variant with nothing half-written (units are serialized
//! fully in memory before the destination file is touched).

use crate::plan::{ReleasePlan, Sensor, Transport};
use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use relgen_squash::{IngestOptions, Squasher, Substitution};
use tracing::{debug, info};

/// Assemble and write the full bundle for one variant. Returns the written
/// paths in write order.
pub fn release_variant(
    plan: &ReleasePlan,
    source_root: &Utf8Path,
    sensor: Sensor,
    transport: Transport,
    version_tag: &str,
    out_dir: &Utf8Path,
) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let transport_files = plan.transport_files(transport);

    // Proprietary merge files force the SLA license header onto every unit.
    // Resolve it up front: a missing SLA header must abort before any output
    // file is created.
    let sla_header = if plan.requires_proprietary_license() {
        let path = abs(source_root, &plan.sla_header);
        if !path.is_file() {
            bail!("SLA copyright header not found at {path}");
        }
        Some(path)
    } else {
        None
    };

    fs::create_dir_all(out_dir).with_context(|| format!("create {out_dir}"))?;

    let mut written = Vec::new();

    // Driver source: transport preamble and shared internals (made static),
    // then the per-sensor driver body, which donates the copyright header
    // unless the SLA header already did.
    let source_subs = plan.source_substitutions(sensor);
    let mut driver_source = Squasher::new(false, version_tag);
    for file in transport_files
        .source_merge
        .iter()
        .chain(&plan.source_merge_files)
    {
        debug!(%file, "merging driver internals");
        driver_source
            .ingest_file(&abs(source_root, file), &IngestOptions::default())
            .with_context(|| format!("merge {file}"))?;
    }
    let use_copyright = ingest_sla(&mut driver_source, sla_header.as_deref(), &source_subs)?;
    let sensor_source = plan.sensor_merge_file(sensor);
    driver_source
        .ingest_file(&abs(source_root, sensor_source), &IngestOptions {
            restrict_visibility: false,
            set_copyright: use_copyright,
            substitutions: Some(&source_subs),
        })
        .with_context(|| format!("merge {sensor_source}"))?;
    for file in &plan.proprietary_source_merge_files {
        driver_source
            .ingest_file(&abs(source_root, file), &IngestOptions {
                restrict_visibility: false,
                ..IngestOptions::default()
            })
            .with_context(|| format!("merge {file}"))?;
    }
    let driver_source_name = format!("{sensor}.c");

    // Driver header.
    let header_subs = plan.header_substitutions(sensor);
    let mut driver_header = Squasher::new(false, version_tag);
    let use_copyright = ingest_sla(&mut driver_header, sla_header.as_deref(), &header_subs)?;
    driver_header
        .ingest_file(&abs(source_root, &plan.driver_header), &IngestOptions {
            restrict_visibility: false,
            set_copyright: use_copyright,
            substitutions: Some(&header_subs),
        })
        .with_context(|| format!("merge {}", plan.driver_header))?;
    for file in &plan.proprietary_header_merge_files {
        driver_header
            .ingest_file(&abs(source_root, file), &IngestOptions {
                restrict_visibility: false,
                ..IngestOptions::default()
            })
            .with_context(|| format!("merge {file}"))?;
    }
    let driver_header_name = format!("{sensor}.h");
    driver_source.inject_include(&driver_header_name);

    // Configuration header: arch config plus the transport's headers.
    let other_subs = plan.other_substitutions(sensor);
    let mut config_header = Squasher::new(false, version_tag);
    let use_copyright = ingest_sla(&mut config_header, sla_header.as_deref(), &other_subs)?;
    config_header
        .ingest_file(&abs(source_root, &plan.arch_config_header), &IngestOptions {
            restrict_visibility: false,
            set_copyright: use_copyright,
            substitutions: None,
        })
        .with_context(|| format!("merge {}", plan.arch_config_header))?;
    for file in &transport_files.configuration_header_merge {
        config_header
            .ingest_file(&abs(source_root, file), &IngestOptions {
                restrict_visibility: false,
                ..IngestOptions::default()
            })
            .with_context(|| format!("merge {file}"))?;
    }
    driver_header.inject_include(&plan.arch_config_header_name);

    // Configuration source: the transport implementation.
    let mut config_source = Squasher::new(false, version_tag);
    let use_copyright = ingest_sla(&mut config_source, sla_header.as_deref(), &other_subs)?;
    config_source
        .ingest_file(
            &abs(source_root, &transport_files.configuration_source),
            &IngestOptions {
                restrict_visibility: false,
                set_copyright: use_copyright,
                substitutions: None,
            },
        )
        .with_context(|| format!("merge {}", transport_files.configuration_source))?;
    config_source.inject_include(&plan.arch_config_header_name);
    let config_source_name = file_name(&transport_files.configuration_source);

    // Example programs, one unit each, depending on the generated header.
    for file in &plan.example_source_files {
        let mut example = Squasher::new(false, version_tag);
        let use_copyright = ingest_sla(&mut example, sla_header.as_deref(), &other_subs)?;
        example
            .ingest_file(&abs(source_root, file), &IngestOptions {
                restrict_visibility: false,
                set_copyright: use_copyright,
                substitutions: None,
            })
            .with_context(|| format!("merge {file}"))?;
        example.inject_include(&driver_header_name);

        let dest = out_dir.join(file_name(file));
        example.write(&dest).with_context(|| format!("write {dest}"))?;
        written.push(dest);
    }

    // Copied files travel as their own units, wired up to their siblings:
    // headers are pulled into the driver header and lean on the arch-config
    // typedefs; sources include their own header when it ships too.
    for file in &plan.copy_files {
        let mut copy = Squasher::new(false, version_tag);
        let name = file_name(file);
        if name.ends_with(".h") {
            driver_header.inject_include(&name);
            copy.inject_include(&plan.arch_config_header_name);
        } else if let Some(stem) = file.as_str().strip_suffix(".c") {
            let sibling = Utf8PathBuf::from(format!("{stem}.h"));
            if plan.copy_files.contains(&sibling) {
                copy.inject_include(&file_name(&sibling));
            }
        }
        let use_copyright = ingest_sla(&mut copy, sla_header.as_deref(), &other_subs)?;
        copy.ingest_file(&abs(source_root, file), &IngestOptions {
            restrict_visibility: false,
            set_copyright: use_copyright,
            substitutions: None,
        })
        .with_context(|| format!("merge {file}"))?;

        let dest = out_dir.join(name);
        copy.write(&dest).with_context(|| format!("write {dest}"))?;
        written.push(dest);
    }

    for (squash, name) in [
        (&driver_header, driver_header_name.as_str()),
        (&driver_source, driver_source_name.as_str()),
        (&config_header, plan.arch_config_header_name.as_str()),
        (&config_source, config_source_name.as_str()),
    ] {
        let dest = out_dir.join(name);
        squash.write(&dest).with_context(|| format!("write {dest}"))?;
        written.push(dest);
    }

    info!(%sensor, %transport, files = written.len(), out_dir = %out_dir, "released variant");
    Ok(written)
}

/// Merge the SLA header as the copyright donor, when one applies. Returns
/// whether the unit's primary fragment should still donate its own header.
fn ingest_sla(
    squash: &mut Squasher,
    sla_header: Option<&Utf8Path>,
    substitutions: &[Substitution],
) -> anyhow::Result<bool> {
    let Some(path) = sla_header else {
        return Ok(true);
    };
    squash
        .ingest_file(path, &IngestOptions {
            set_copyright: true,
            substitutions: Some(substitutions),
            ..IngestOptions::default()
        })
        .with_context(|| format!("merge SLA header {path}"))?;
    Ok(false)
}

fn abs(root: &Utf8Path, rel: &Utf8Path) -> Utf8PathBuf {
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}

fn file_name(path: &Utf8Path) -> String {
    path.file_name().unwrap_or(path.as_str()).to_string()
}
