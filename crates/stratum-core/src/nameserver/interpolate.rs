//! `{dotted.key}` markers
//!
//! A marker is an opening brace, a dotted key and a closing brace, with
//! nothing else in between. Braces that do not form a marker are left alone.
//! Each pass replaces every marker with the string form of the referenced
//! value; the output of a pass is scanned again until no markers remain.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::Nameserver;
use super::evaluate::Evaluation;
use crate::error::{Error, Result};
use crate::key;
use crate::slot::SlotId;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\{{({id}(?:\.{id})*)\}}", id = key::IDENTIFIER))
        .expect("marker pattern is valid")
});

/// Keys referenced by the markers in `text`, in order of appearance
pub fn markers(text: &str) -> Vec<&str> {
    MARKER
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Whether `text` contains at least one marker
pub fn has_markers(text: &str) -> bool {
    MARKER.is_match(text)
}

/// The key of `text` if the whole text is a single marker
pub(crate) fn sole_marker(text: &str) -> Option<&str> {
    let captures = MARKER.captures(text)?;
    let whole = captures.get(0)?;
    if whole.start() == 0 && whole.end() == text.len() {
        captures.get(1).map(|m| m.as_str())
    } else {
        None
    }
}

impl Nameserver {
    /// Expand every marker in `text`
    ///
    /// References are resolved through this nameserver, creating placeholders
    /// for keys that were never mentioned. Fails if a referenced key has no
    /// value, if references form a cycle, or if expansion does not settle
    /// within the configured number of passes.
    pub fn interpolate(&mut self, text: &str) -> Result<String> {
        let mut evaluation = Evaluation::default();
        let mut dependencies = BTreeSet::new();
        self.expand(text, "<text>", &mut evaluation, &mut dependencies)
    }

    pub(super) fn expand(
        &mut self,
        text: &str,
        label: &str,
        evaluation: &mut Evaluation,
        dependencies: &mut BTreeSet<SlotId>,
    ) -> Result<String> {
        let mut current = text.to_string();
        for pass in 0..self.limits.max_passes {
            if !has_markers(&current) {
                return Ok(current);
            }
            tracing::trace!(label, pass, text = %current, "interpolation pass");
            current = self.substitute(&current, evaluation, dependencies)?;
        }
        if has_markers(&current) {
            return Err(Error::InterpolationBudget {
                key: label.to_string(),
                reason: format!(
                    "markers remain after {} passes: {current:?}",
                    self.limits.max_passes
                ),
            });
        }
        Ok(current)
    }

    fn substitute(
        &mut self,
        text: &str,
        evaluation: &mut Evaluation,
        dependencies: &mut BTreeSet<SlotId>,
    ) -> Result<String> {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for captures in MARKER.captures_iter(text) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            output.push_str(&text[last..whole.start()]);
            let value = self.reference(key.as_str(), evaluation, dependencies)?;
            output.push_str(&value.to_string());
            last = whole.end();
        }
        output.push_str(&text[last..]);
        Ok(output)
    }
}
