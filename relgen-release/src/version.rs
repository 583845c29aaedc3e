//! Version-tag acquisition.
//!
//! A release tag file in the source tree wins; otherwise the tag comes from
//! `git describe`. Without either, the tag is empty and the engine skips
//! banner injection entirely.

use camino::Utf8Path;
use fs_err as fs;
use std::process::Command;
use tracing::debug;

/// First line of this file, when present, is the release tag.
pub const RELEASE_TAG_FILE: &str = "git_release_tag.txt";

pub fn version_tag(source_root: &Utf8Path) -> String {
    let tag_file = source_root.join(RELEASE_TAG_FILE);
    if tag_file.is_file()
        && let Ok(contents) = fs::read_to_string(&tag_file)
    {
        return contents.lines().next().unwrap_or_default().to_string();
    }
    match git_describe(source_root) {
        Some(tag) => tag,
        None => {
            debug!("no release tag file and no usable git describe output");
            String::new()
        }
    }
}

fn git_describe(root: &Utf8Path) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root.as_str())
        .args(["describe", "--dirty", "--always"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let tag = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if tag.is_empty() {
        return None;
    }
    Some(normalize_describe(&tag))
}

/// `git describe` emits `tag-N-gHASH[-dirty]`; collapse that to the bare tag
/// when the commit is exactly the tagged one and the tree is clean.
fn normalize_describe(tag: &str) -> String {
    let mut parts: Vec<&str> = tag.split('-').collect();
    if parts.len() == 3 {
        parts.push("");
    }
    if parts.len() > 1 && (parts[1] != "0" || parts.get(3).copied() == Some("dirty")) {
        tag.to_string()
    } else {
        parts[0].to_string()
    }
}
