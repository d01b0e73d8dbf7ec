//! Splicing JSON data into the static review page.
//!
//! The page carries its data as JavaScript assignments such as
//! `const SIGNALS_DATA = [...];`. These helpers locate such a blob by its
//! variable name and swap the JSON value in place, leaving the rest of the
//! page byte-for-byte untouched. The end of a blob is found by parsing the
//! JSON, not by scanning for `;`, so semicolons inside strings are harmless.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::HtmlError;

pub const SIGNALS_VAR: &str = "SIGNALS_DATA";
pub const REVIEWS_VAR: &str = "OPUS_REVIEWS";

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex"));
/// Any `name = [` / `name = {` assignment; group 1 is the name.
static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*[\[{]").expect("valid assignment regex")
});
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<script\b").expect("valid script regex"));
static BLOB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][A-Z0-9_]*)\s*=\s*([\[{])").expect("valid blob regex")
});

/// A located `VAR = <json>` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlob {
    pub var: String,
    /// Byte offset where the JSON value starts.
    pub start: usize,
    /// Byte offset one past the JSON value (the `;`, if any, is not included).
    pub end: usize,
    pub value: Value,
}

/// Serialize `value` for embedding inside a `<script>` element.
///
/// `<` is written as `\u003c` so no string can close the element or open a
/// comment, and U+2028/U+2029 are escaped for pre-ES2019 parsers. The output
/// is still valid JSON.
///
/// # Errors
///
/// Returns [`HtmlError::Serialize`] if `value` cannot be serialized.
pub fn script_safe_json<T: Serialize + ?Sized>(value: &T) -> Result<String, HtmlError> {
    let raw = serde_json::to_string(value)?;
    Ok(raw
        .replace('<', "\\u003c")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

fn validate_var(var: &str) -> Result<(), HtmlError> {
    if IDENT_RE.is_match(var) {
        Ok(())
    } else {
        Err(HtmlError::InvalidVarName(var.to_string()))
    }
}

/// Parse one JSON value starting at `html[start..]`, returning it with the
/// byte offset just past it.
fn parse_value_at(html: &str, start: usize) -> Result<(Value, usize), serde_json::Error> {
    let mut stream = serde_json::Deserializer::from_str(&html[start..]).into_iter::<Value>();
    // Callers only start at `[` or `{`, so the stream is never empty.
    let value = stream.next().transpose()?.unwrap_or(Value::Null);
    Ok((value, start + stream.byte_offset()))
}

/// Locate the `var = [...]` / `var = {...}` assignment in `html`.
///
/// Assignments whose right-hand side is not a JSON array or object (for
/// example `SIGNALS_DATA = SIGNALS_DATA.filter(...)`) are skipped.
///
/// # Errors
///
/// Returns [`HtmlError::InvalidVarName`] for a non-identifier `var` and
/// [`HtmlError::MalformedBlob`] when the first candidate value is not valid JSON.
pub fn find_data_blob(html: &str, var: &str) -> Result<Option<DataBlob>, HtmlError> {
    validate_var(var)?;
    let Some(m) = ASSIGN_RE
        .captures_iter(html)
        .find(|cap| &cap[1] == var)
        .and_then(|cap| cap.get(0))
    else {
        return Ok(None);
    };

    let start = m.end() - 1;
    let (value, end) = parse_value_at(html, start).map_err(|source| HtmlError::MalformedBlob {
        var: var.to_string(),
        source,
    })?;

    Ok(Some(DataBlob {
        var: var.to_string(),
        start,
        end,
        value,
    }))
}

/// Replace the JSON value of an existing `var = ...` assignment.
///
/// # Errors
///
/// Returns [`HtmlError::MarkerNotFound`] when the page has no such
/// assignment, plus the errors of [`find_data_blob`] and [`script_safe_json`].
pub fn replace_data_blob<T: Serialize + ?Sized>(
    html: &str,
    var: &str,
    value: &T,
) -> Result<String, HtmlError> {
    let blob = find_data_blob(html, var)?.ok_or_else(|| HtmlError::MarkerNotFound {
        var: var.to_string(),
    })?;
    let json = script_safe_json(value)?;

    let mut out = String::with_capacity(html.len() - (blob.end - blob.start) + json.len());
    out.push_str(&html[..blob.start]);
    out.push_str(&json);
    out.push_str(&html[blob.end..]);
    tracing::debug!(var, old_bytes = blob.end - blob.start, new_bytes = json.len(), "replaced data blob");
    Ok(out)
}

/// Replace `var`'s data if the page already has it, otherwise add a new
/// `<script>` block defining it just before the last `</body>` (or at the
/// end of the page when there is no `</body>`).
///
/// # Errors
///
/// See [`replace_data_blob`].
pub fn inject_data_script<T: Serialize + ?Sized>(
    html: &str,
    var: &str,
    value: &T,
) -> Result<String, HtmlError> {
    if find_data_blob(html, var)?.is_some() {
        return replace_data_blob(html, var, value);
    }

    let json = script_safe_json(value)?;
    let block = format!("<script>\nconst {var} = {json};\n</script>\n");

    let insert_at = html
        .to_ascii_lowercase()
        .rfind("</body>")
        .unwrap_or(html.len());

    let mut out = String::with_capacity(html.len() + block.len());
    out.push_str(&html[..insert_at]);
    out.push_str(&block);
    out.push_str(&html[insert_at..]);
    tracing::debug!(var, at = insert_at, "inserted new data script");
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub var: String,
    pub kind: &'static str,
    /// Array length or object key count; `None` when the JSON did not parse.
    pub entries: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlReport {
    pub bytes: usize,
    pub script_blocks: usize,
    pub has_body_close: bool,
    pub blobs: Vec<BlobInfo>,
    /// `signal_type` counts inside `SIGNALS_DATA`, keyed by the raw string.
    pub signal_types: BTreeMap<String, usize>,
}

impl HtmlReport {
    #[must_use]
    pub fn blob(&self, var: &str) -> Option<&BlobInfo> {
        self.blobs.iter().find(|b| b.var == var)
    }
}

impl fmt::Display for HtmlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "size:          {} bytes", self.bytes)?;
        writeln!(f, "script blocks: {}", self.script_blocks)?;
        writeln!(
            f,
            "</body>:       {}",
            if self.has_body_close { "present" } else { "missing" }
        )?;
        if self.blobs.is_empty() {
            writeln!(f, "data blobs:    none")?;
        } else {
            writeln!(f, "data blobs:")?;
            for blob in &self.blobs {
                match (&blob.entries, &blob.error) {
                    (Some(n), _) => writeln!(f, "  {:<20} {} with {n} entries", blob.var, blob.kind)?,
                    (None, Some(e)) => writeln!(f, "  {:<20} {} INVALID: {e}", blob.var, blob.kind)?,
                    (None, None) => writeln!(f, "  {:<20} {}", blob.var, blob.kind)?,
                }
            }
        }
        if !self.signal_types.is_empty() {
            writeln!(f, "signal types in {SIGNALS_VAR}:")?;
            for (t, n) in &self.signal_types {
                writeln!(f, "  {t:<13}{n:>6}")?;
            }
        }
        Ok(())
    }
}

/// Inspect a review page: script blocks, embedded data blobs and the
/// signal-type mix of `SIGNALS_DATA`.
#[must_use]
pub fn analyze(html: &str) -> HtmlReport {
    let mut report = HtmlReport {
        bytes: html.len(),
        script_blocks: SCRIPT_RE.find_iter(html).count(),
        has_body_close: html.to_ascii_lowercase().contains("</body>"),
        ..HtmlReport::default()
    };

    let mut seen = std::collections::HashSet::new();
    // Matches inside an already-parsed blob are string content, not assignments.
    let mut covered_until = 0;
    for cap in BLOB_RE.captures_iter(html) {
        let open = cap.get(2).map_or(0, |m| m.start());
        if open < covered_until {
            continue;
        }
        let var = cap[1].to_string();
        if !seen.insert(var.clone()) {
            continue;
        }
        let kind = if &cap[2] == "[" { "array" } else { "object" };

        match parse_value_at(html, open) {
            Ok((value, end)) => {
                covered_until = end;
                let entries = match &value {
                    Value::Array(items) => items.len(),
                    Value::Object(map) => map.len(),
                    _ => 0,
                };
                if var == SIGNALS_VAR {
                    report.signal_types = count_signal_types(&value);
                }
                report.blobs.push(BlobInfo {
                    var,
                    kind,
                    entries: Some(entries),
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!(var = %var, error = %e, "embedded data blob does not parse");
                report.blobs.push(BlobInfo {
                    var,
                    kind,
                    entries: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    report
}

fn count_signal_types(value: &Value) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    if let Value::Array(items) = value {
        for item in items {
            let t = item
                .get("signal_type")
                .and_then(Value::as_str)
                .unwrap_or("(missing)");
            *counts.entry(t.to_string()).or_insert(0) += 1;
        }
    }
    counts
}
