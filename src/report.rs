//! HTML report rendering: pure string substitution over a template file.
//!
//! The template carries `%(name)s` placeholders for the two ledgers
//! (embedded as indented JSON), the compiler version, and the remote
//! browsing URL. No HTML is generated here beyond what the template
//! already contains.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{Result, SizeError};
use crate::ledger::{HistoricLedger, RecentLedger};

/// Everything the template gets substituted with.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub git_sizes: &'a HistoricLedger,
    pub recent_sizes: &'a RecentLedger,
    pub compiler_version: &'a str,
    pub remote_url: &'a str,
}

/// Serialize `value` as 4-space-indented JSON, with every line after the
/// first shifted right by `initial_indent` spaces so the blob lines up
/// inside the surrounding template markup.
pub(crate) fn json_indented<T: Serialize>(value: &T, initial_indent: usize) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|err| SizeError::TemplateError(format!("cannot serialize report data: {err}")))?;

    let text = String::from_utf8_lossy(&buf).into_owned();
    let space = " ".repeat(initial_indent);
    let mut lines = text.lines();
    let mut out = String::new();
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        out.push_str(&space);
        out.push_str(line);
    }
    Ok(out)
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%\(([A-Za-z_]+)\)s").unwrap())
}

/// Substitute `%(name)s` placeholders in `template`.
///
/// A single pass over the template only; substituted values are never
/// rescanned, so placeholder-shaped text inside the data (say, a commit
/// message quoting `%(remote_url)s`) stays literal.
///
/// # Errors
///
/// [`SizeError::TemplateError`] if the template references a name not in
/// `vars` — a typo in the template should not silently produce a report
/// with a literal placeholder in it.
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut unknown: Option<String> = None;
    let out = placeholder_re().replace_all(template, |captures: &regex::Captures<'_>| {
        let name = &captures[1];
        match vars.iter().find(|(var, _)| *var == name) {
            Some((_, value)) => (*value).to_string(),
            None => {
                unknown.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    if let Some(name) = unknown {
        return Err(SizeError::TemplateError(format!(
            "unknown placeholder '%({name})s' in template"
        )));
    }
    Ok(out.into_owned())
}

/// Render the report: prune a display copy of the historic ledger,
/// substitute all placeholders, write the output file.
///
/// Pruning here is a display optimization only — the persisted git-sizes
/// file keeps the full sequence.
pub fn generate(inputs: ReportInputs<'_>, template_path: &Path, output_path: &Path) -> Result<()> {
    let template = fs::read_to_string(template_path).map_err(|source| SizeError::IoError {
        path: template_path.to_path_buf(),
        source,
    })?;

    let mut git_sizes = inputs.git_sizes.clone();
    git_sizes.prune();

    let git_json = json_indented(&git_sizes, 4)?;
    let recent_json = json_indented(inputs.recent_sizes, 4)?;

    let html = render(
        &template,
        &[
            ("git_sizes", &git_json),
            ("recent_sizes", &recent_json),
            ("compiler_version", inputs.compiler_version),
            ("remote_url", inputs.remote_url),
        ],
    )?;

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| SizeError::IoError {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(output_path, html).map_err(|source| SizeError::IoError {
        path: output_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::git::CommitInfo;
    use crate::ledger::SizeSnapshot;

    fn sample_ledger() -> HistoricLedger {
        let mut ledger = HistoricLedger::new();
        for (day, (hash, size)) in [("aaa", 100), ("bbb", 100), ("ccc", 120)]
            .into_iter()
            .enumerate()
        {
            let mut snapshot = SizeSnapshot::new(CommitInfo {
                hash: hash.to_string(),
                short: None,
                author: None,
                email: None,
                date: Some(format!("2024-01-0{} 10:00:00 +0000", day + 1)),
                comment: None,
            });
            snapshot.sizes.insert(
                "4.6.2".to_string(),
                [("app.bin".to_string(), size)].into_iter().collect(),
            );
            ledger.push(snapshot);
        }
        ledger
    }

    #[test]
    fn json_indented_shifts_continuation_lines() {
        let value = serde_json::json!({"a": 1});
        let text = json_indented(&value, 4).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "{");
        assert!(lines[1].starts_with("    ")); // shifted
        assert_eq!(*lines.last().unwrap(), "    }");
    }

    #[test]
    fn render_substitutes_all_placeholders() {
        let html = render(
            "v=%(compiler_version)s url=%(remote_url)s",
            &[("compiler_version", "4.6.2"), ("remote_url", "https://x")],
        )
        .unwrap();
        assert_eq!(html, "v=4.6.2 url=https://x");
    }

    #[test]
    fn render_does_not_rescan_substituted_values() {
        // a commit message quoting a placeholder must stay literal, not
        // pick up a later substitution
        let html = render(
            "c=%(comment)s u=%(remote_url)s",
            &[
                ("comment", "fix %(remote_url)s handling"),
                ("remote_url", "https://x"),
            ],
        )
        .unwrap();
        assert_eq!(html, "c=fix %(remote_url)s handling u=https://x");
    }

    #[test]
    fn render_accepts_unknown_tokens_inside_values() {
        let html = render("v=%(version)s", &[("version", "see %(whatever)s")]).unwrap();
        assert_eq!(html, "v=see %(whatever)s");
    }

    #[test]
    fn render_rejects_unknown_placeholder() {
        let err = render("%(mystery)s", &[("compiler_version", "4.6.2")]).unwrap_err();
        assert!(matches!(err, SizeError::TemplateError(_)));
    }

    #[test]
    fn generate_writes_report_with_pruned_history() {
        let tmp = TempDir::new().unwrap();
        let template_path = tmp.path().join("sizes.template");
        let output_path = tmp.path().join("sizes.html");
        fs::write(
            &template_path,
            "<script>var sizes = %(git_sizes)s;\nvar recent = %(recent_sizes)s;</script>\n\
             <p>%(compiler_version)s @ %(remote_url)s</p>",
        )
        .unwrap();

        let recent = RecentLedger::new();
        generate(
            ReportInputs {
                git_sizes: &sample_ledger(),
                recent_sizes: &recent,
                compiler_version: "4.6.2",
                remote_url: "https://github.com/acme/firmware",
            },
            &template_path,
            &output_path,
        )
        .unwrap();

        let html = fs::read_to_string(&output_path).unwrap();
        assert!(html.contains("4.6.2 @ https://github.com/acme/firmware"));
        // "bbb" is size-equal to its predecessor and pruned from display
        assert!(html.contains("\"aaa\""));
        assert!(!html.contains("\"bbb\""));
        assert!(html.contains("\"ccc\""));
        assert!(!html.contains("%("));
    }
}
