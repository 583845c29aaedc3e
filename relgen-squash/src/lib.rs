//! Squash-merge engine for C source fragments.
//!
//! Responsibilities:
//! - Accumulate body lines, a copyright block, and two insertion-ordered
//!   deduplicated include sets across repeated fragment ingestions.
//! - Rewrite function-definition headers to `static` visibility on request.
//! - Serialize the accumulated state deterministically, byte for byte.
//!
//! The engine knows nothing about sensors, transports, or release layouts;
//! the caller injects all variant-specific behavior as substitution rules
//! and ingestion order. One `Squasher` produces exactly one output unit.

mod classify;
mod error;

pub use classify::{ASSERT_INCLUDE, LineClass, LineClassifier};
pub use error::SquashError;

use camino::Utf8Path;
use fs_err as fs;
use regex::{NoExpand, Regex};

/// A single text-substitution rule: a whole-line global regex replace with a
/// literal replacement. Rules are applied in the order given, each one
/// re-scanning the possibly already-rewritten line.
#[derive(Debug, Clone)]
pub struct Substitution {
    pattern: Regex,
    replacement: String,
}

impl Substitution {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
        })
    }

    fn apply(&self, line: &str) -> String {
        self.pattern
            .replace_all(line, NoExpand(&self.replacement))
            .into_owned()
    }
}

/// Per-ingestion flags. `restrict_visibility` defaults to on; body copies of
/// the driver (as opposed to its internal helpers) are ingested with it off.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions<'a> {
    /// Prepend `static` to function-definition headers that lack it.
    pub restrict_visibility: bool,
    /// Replace the engine's copyright block with this fragment's leading
    /// block comment.
    pub set_copyright: bool,
    /// Substitution rules applied to every line of this fragment.
    pub substitutions: Option<&'a [Substitution]>,
}

impl Default for IngestOptions<'_> {
    fn default() -> Self {
        Self {
            restrict_visibility: true,
            set_copyright: false,
            substitutions: None,
        }
    }
}

/// Insertion-ordered set of include names.
///
/// Emission order is first-capture order, made explicit rather than left to
/// map iteration order. Lookups are linear; the sets hold a handful of
/// entries per output unit.
#[derive(Debug, Clone, Default)]
struct OrderedSet(Vec<String>);

impl OrderedSet {
    fn insert(&mut self, name: &str) {
        if !self.0.iter().any(|n| n == name) {
            self.0.push(name.to_string());
        }
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Accumulates fragments and emits one amalgamated compilation unit.
///
/// Lifecycle: construct once per output file, call [`Squasher::ingest`] /
/// [`Squasher::ingest_file`] any number of times (ingestion order is body
/// order), optionally [`Squasher::inject_include`], then consume the state
/// with [`Squasher::serialize`] or [`Squasher::write`].
#[derive(Debug)]
pub struct Squasher {
    copyright: Vec<String>,
    system_includes: OrderedSet,
    project_includes: OrderedSet,
    lines: Vec<String>,
    classifier: LineClassifier,
    emit_fragment_markers: bool,
    version_tag: String,
}

impl Squasher {
    /// `version_tag` is injected as a synthetic first line of the copyright
    /// comment at serialization time; an empty tag disables injection.
    pub fn new(emit_fragment_markers: bool, version_tag: impl Into<String>) -> Self {
        Self {
            copyright: Vec::new(),
            system_includes: OrderedSet::default(),
            project_includes: OrderedSet::default(),
            lines: Vec::new(),
            classifier: LineClassifier::new(),
            emit_fragment_markers,
            version_tag: version_tag.into(),
        }
    }

    /// Declare a cross-output dependency: the merged unit must include the
    /// named sibling file. Idempotent. Quote-includes found in fragments are
    /// never captured (they refer to files being merged away), so this is the
    /// only way entries reach the project include block.
    pub fn inject_include(&mut self, name: &str) {
        self.project_includes.insert(name);
    }

    /// Read and ingest a fragment from disk. A path that cannot be opened is
    /// fatal for this output unit.
    pub fn ingest_file(
        &mut self,
        path: &Utf8Path,
        opts: &IngestOptions<'_>,
    ) -> Result<(), SquashError> {
        let text = fs::read_to_string(path).map_err(|source| SquashError::MissingFragment {
            path: path.to_owned(),
            source,
        })?;
        self.ingest(path.as_str(), &text, opts);
        Ok(())
    }

    /// Ingest one fragment.
    ///
    /// If the first line opens a block comment, everything through the
    /// closing line is the fragment header: it replaces the copyright block
    /// when `set_copyright` is on and is discarded otherwise. A header that
    /// never closes truncates ingestion silently at end of input; the body
    /// stays whatever was accumulated so far.
    ///
    /// Every remaining line gets the substitutions, then include
    /// classification: bracket includes are hoisted into the deduplicated
    /// system set (except [`ASSERT_INCLUDE`], which stays in the body
    /// verbatim), quote includes are dropped outright. Lines surviving both
    /// are appended to the body, preceded on first append by two blank
    /// separator lines and an optional fragment-name marker.
    pub fn ingest(&mut self, name: &str, text: &str, opts: &IngestOptions<'_>) {
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        if lines.is_empty() {
            return;
        }

        let mut idx = 0;
        if lines[0].starts_with("/*") {
            if opts.set_copyright {
                self.copyright.clear();
            }
            let mut closed = false;
            while idx < lines.len() {
                let line = lines[idx];
                if opts.set_copyright {
                    let rewritten = apply_substitutions(line, opts.substitutions);
                    self.copyright.push(rewritten.trim_end().to_string());
                }
                idx += 1;
                if line.contains("*/") {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return;
            }
        }

        let mut started_body = false;
        for raw in &lines[idx..] {
            let mut line = apply_substitutions(raw, opts.substitutions);

            match self.classifier.classify(&line) {
                LineClass::SystemInclude(include) => {
                    // assert.h is #ifdef'ed in the fragments and must not be
                    // hoisted; let the raw line fall through to the body.
                    if include != ASSERT_INCLUDE {
                        self.system_includes.insert(&include);
                        continue;
                    }
                }
                LineClass::ProjectInclude(_) => continue,
                LineClass::Other => {}
            }

            if opts.restrict_visibility
                && let Some(rewritten) = self.classifier.make_static(&line)
            {
                line = rewritten;
            }

            if !started_body {
                self.lines.push(String::new());
                self.lines.push(String::new());
                if self.emit_fragment_markers {
                    self.lines
                        .push(format!("/* =========== {name} =========== */"));
                }
                started_body = true;
            }
            self.lines.push(line);
        }
    }

    /// Produce the complete output text: copyright section, include section,
    /// body, in that fixed order, every line terminated by a single `\n`.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_copyright(&mut out);
        self.write_includes(&mut out);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Serialize fully in memory, then write the destination in one shot.
    pub fn write(&self, path: &Utf8Path) -> Result<(), SquashError> {
        let text = self.serialize();
        fs::write(path, text).map_err(|source| SquashError::WriteFailure {
            path: path.to_owned(),
            source,
        })
    }

    fn write_copyright(&self, out: &mut String) {
        let inject = !self.version_tag.is_empty();
        if inject {
            out.push_str("/* SHT Driver Version: ");
            out.push_str(&self.version_tag);
            out.push_str("\n *\n");
        }
        for line in &self.copyright {
            if inject && line.starts_with("/*") {
                // Fuse the copyright comment into the version banner comment.
                if line.len() > 2 {
                    out.push(' ');
                    out.push_str(&line[1..]);
                } else {
                    // A bare "/*" would become an empty line; drop it.
                    continue;
                }
            } else {
                out.push_str(line);
            }
            out.push('\n');
        }
        out.push('\n');
    }

    fn write_includes(&self, out: &mut String) {
        for include in self.system_includes.iter() {
            out.push_str("#include <");
            out.push_str(include);
            out.push_str(">\n");
        }
        if !self.project_includes.is_empty() {
            out.push('\n');
        }
        for include in self.project_includes.iter() {
            out.push_str("#include \"");
            out.push_str(include);
            out.push_str("\"\n");
        }
    }
}

fn apply_substitutions(line: &str, subs: Option<&[Substitution]>) -> String {
    let mut line = line.to_string();
    if let Some(subs) = subs {
        for sub in subs {
            line = sub.apply(&line);
        }
    }
    line
}
