//! Best-effort lexical classification of single source lines.
//!
//! This is deliberately not a C parser. Include directives and
//! function-definition headers are recognized by line-local patterns; an
//! unusual line that happens to match one of them is an accepted false
//! positive. Anything more precise would need a real grammar, which the
//! merge does not require.

use regex::Regex;

/// The assertion-facility header. It is expected to sit inside `#ifdef`
/// guards in the fragments, so it must stay in the body verbatim instead of
/// being hoisted into the deduplicated include block.
pub const ASSERT_INCLUDE: &str = "assert.h";

/// Category assigned to a single body line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// `#include <name>` with the captured name.
    SystemInclude(String),
    /// `#include "name"` with the captured name.
    ProjectInclude(String),
    /// Everything else.
    Other,
}

/// Line recognizers shared by all ingestions of one engine instance.
#[derive(Debug)]
pub struct LineClassifier {
    system_include: Regex,
    project_include: Regex,
    function_def: Regex,
}

impl LineClassifier {
    pub fn new() -> Self {
        // One identifier or pointer token, e.g. `const`, `*foo`.
        let ident = r"[a-zA-Z_*]\w*";
        Self {
            system_include: Regex::new(r"^\s*#include\s*<(.*)>").expect("system include pattern"),
            project_include: Regex::new(r#"^\s*#include\s*"(.*)""#)
                .expect("project include pattern"),
            // Function definitions: "const long int *foo(...". The first
            // group is the leading token run up to the function name.
            function_def: Regex::new(&format!(r"^((?:{ident}\s+)+){ident}\s*\(.*$"))
                .expect("function definition pattern"),
        }
    }

    /// Classify a single line. The two include recognizers are mutually
    /// exclusive; the first match wins.
    pub fn classify(&self, line: &str) -> LineClass {
        if let Some(caps) = self.system_include.captures(line) {
            return LineClass::SystemInclude(caps[1].to_string());
        }
        if let Some(caps) = self.project_include.captures(line) {
            return LineClass::ProjectInclude(caps[1].to_string());
        }
        LineClass::Other
    }

    /// Rewrite a line that looks like a top-level function-definition header
    /// to `static` visibility. Returns `None` when the line is not a function
    /// definition or already carries `static` in its leading token run.
    pub fn make_static(&self, line: &str) -> Option<String> {
        let caps = self.function_def.captures(line)?;
        if caps[1].contains("static ") {
            return None;
        }
        Some(format!("static {line}"))
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}
