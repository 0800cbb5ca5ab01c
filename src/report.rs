//! Per-repository results and the artifacts written from them
//!
//! Text artifacts are meant for people reading an audit, not for machines;
//! the JSON report is the structured form.

use crate::api::ApiReport;
use crate::error::{HunterError, Result};
use crate::headers::HeaderClosure;
use crate::inventory::SourceFile;
use crate::locator::Occurrences;
use crate::mapper::SyscallHeaderMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const RULE: &str = "########################################################";

/// Syscall -> file -> occurrences
pub type LineNumberMap = BTreeMap<String, BTreeMap<PathBuf, Occurrences>>;

/// Everything learned about one repository
#[derive(Debug, Clone, Serialize)]
pub struct RepoReport {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub repository: String,
    pub path: PathBuf,
    pub sources: Vec<SourceFile>,
    pub headers: HeaderClosure,
    pub syscall_headers: SyscallHeaderMap,
    /// Call-shaped syscalls found in each source file
    pub syscalls_per_file: BTreeMap<PathBuf, BTreeSet<String>>,
    pub line_numbers: LineNumberMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiReport>,
}

impl RepoReport {
    pub fn new(repository: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "syscall-hunter-json-v1".to_string(),
            repository: repository.into(),
            path: path.into(),
            sources: Vec::new(),
            headers: HeaderClosure::default(),
            syscall_headers: SyscallHeaderMap::new(),
            syscalls_per_file: BTreeMap::new(),
            line_numbers: LineNumberMap::new(),
            api: None,
        }
    }

    /// Every syscall called from at least one source file
    pub fn called_syscalls(&self) -> BTreeSet<&str> {
        self.syscalls_per_file
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Short human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{}: {} source files, {} headers ({} resolved, {} missing), {} syscalls in headers, {} called",
            self.repository,
            self.sources.len(),
            self.headers.discovered.len(),
            self.headers.resolved.len(),
            self.headers.missing.len(),
            self.syscall_headers.len(),
            self.called_syscalls().len()
        )
    }
}

/// Sorted list of every discovered header
pub fn render_headers(closure: &HeaderClosure) -> String {
    let mut out = String::new();
    for header in &closure.discovered {
        let status = if closure.resolved.contains_key(header) {
            ""
        } else if closure.missing.contains(header) {
            "  (missing)"
        } else {
            "  (not expanded)"
        };
        let _ = writeln!(out, "{}{}", header, status);
    }
    out
}

/// Syscall -> headers association
pub fn render_syscall_headers(map: &SyscallHeaderMap) -> String {
    let mut out = String::new();
    for (syscall, headers) in map {
        let list: Vec<&str> = headers.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}: {}", syscall, list.join(", "));
    }
    out
}

/// One banner plus syscall list per source file
pub fn render_syscalls_per_file(per_file: &BTreeMap<PathBuf, BTreeSet<String>>) -> String {
    let mut out = String::new();
    for (file, syscalls) in per_file {
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "System calls found in the {}", file.display());
        let _ = writeln!(out, "{}", RULE);
        if syscalls.is_empty() {
            let _ = writeln!(out, "(none)");
        }
        for syscall in syscalls {
            let _ = writeln!(out, "{}", syscall);
        }
        out.push('\n');
    }
    out
}

/// Per-syscall, per-file line occurrences
pub fn render_line_numbers(lines: &LineNumberMap) -> String {
    let mut out = String::new();
    for (syscall, files) in lines {
        for (file, occurrences) in files {
            let _ = writeln!(out, "{} is found in file {}", syscall, file.display());
            for (line, text) in occurrences {
                let _ = writeln!(out, "  {:>6}: {}", line, text);
            }
        }
    }
    out
}

/// Writes the artifacts of one repository into its output folder
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
    stem: String,
}

impl ArtifactWriter {
    /// Create `<output>/<repo>/`, with spaces in the name replaced by `_`
    pub fn create(output: &Path, repository: &str) -> Result<Self> {
        let stem = repository.replace(' ', "_");
        let dir = output.join(&stem);
        fs::create_dir_all(&dir).map_err(|e| HunterError::write(&dir, e))?;
        Ok(Self { dir, stem })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn headers_path(&self) -> PathBuf {
        self.dir.join(format!("Headers_{}.txt", self.stem))
    }

    pub fn syscall_headers_path(&self) -> PathBuf {
        self.dir.join(format!("user_output_{}.txt", self.stem))
    }

    pub fn syscalls_per_file_path(&self) -> PathBuf {
        self.dir
            .join(format!("syscalls_per_file_output_{}.txt", self.stem))
    }

    pub fn line_numbers_path(&self) -> PathBuf {
        self.dir.join(format!("line_number_output_{}.txt", self.stem))
    }

    pub fn json_path(&self) -> PathBuf {
        self.dir.join(format!("report_{}.json", self.stem))
    }

    pub fn api_output_path(&self) -> PathBuf {
        self.dir.join(format!("api_output_{}.txt", self.stem))
    }

    fn write(&self, path: PathBuf, contents: &str) -> Result<()> {
        fs::write(&path, contents).map_err(|e| HunterError::write(&path, e))?;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }

    pub fn write_syscall_headers(&self, report: &RepoReport) -> Result<()> {
        self.write(
            self.syscall_headers_path(),
            &render_syscall_headers(&report.syscall_headers),
        )
    }

    /// Header list, per-file syscalls and line numbers
    pub fn write_developer_artifacts(&self, report: &RepoReport) -> Result<()> {
        self.write(self.headers_path(), &render_headers(&report.headers))?;
        self.write(
            self.syscalls_per_file_path(),
            &render_syscalls_per_file(&report.syscalls_per_file),
        )?;
        self.write(
            self.line_numbers_path(),
            &render_line_numbers(&report.line_numbers),
        )
    }

    pub fn write_json(&self, report: &RepoReport) -> Result<()> {
        self.write(self.json_path(), &report.to_json()?)
    }

    /// Cleaned lookup output, all parsed entries and the function subset
    pub fn write_api(&self, api: &ApiReport) -> Result<()> {
        self.write(self.api_output_path(), &api.annotated)?;

        let mut all = String::new();
        let mut functions = String::new();
        for entry in &api.entries {
            let types: Vec<&str> = entry.types.iter().map(String::as_str).collect();
            let line = format!("{}: {}\n", entry.name, types.join(", "));
            if entry.is_function() {
                functions.push_str(&line);
            }
            all.push_str(&line);
        }
        self.write(self.dir.join("APICALLS.txt"), &all)?;
        self.write(self.dir.join("filtered_api_calls.txt"), &functions)?;
        self.write(
            self.dir.join("filtered_api_calls.json"),
            &api.functions_json()?,
        )
    }

    /// Write everything the configuration asks for
    pub fn write_all(&self, report: &RepoReport, echo: bool, dev_echo: bool) -> Result<()> {
        if echo {
            self.write_syscall_headers(report)?;
        }
        if dev_echo {
            self.write_developer_artifacts(report)?;
        }
        if let Some(api) = &report.api {
            self.write_api(api)?;
        }
        self.write_json(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_report() -> RepoReport {
        let mut report = RepoReport::new("demo repo", "/src/demo repo");
        report.headers.discovered.insert("foo.h".to_string());
        report.headers.discovered.insert("gone.h".to_string());
        report
            .headers
            .resolved
            .insert("foo.h".to_string(), PathBuf::from("/inc/foo.h"));
        report.headers.missing.insert("gone.h".to_string());
        report.syscall_headers.insert(
            "write".to_string(),
            BTreeSet::from(["foo.h".to_string()]),
        );
        report.syscalls_per_file.insert(
            PathBuf::from("/src/demo repo/main.c"),
            BTreeSet::from(["write".to_string()]),
        );
        report.line_numbers.insert(
            "write".to_string(),
            BTreeMap::from([(
                PathBuf::from("/src/demo repo/main.c"),
                Occurrences::from([(3, "write(1, \"hi\", 2);".to_string())]),
            )]),
        );
        report
    }

    #[test]
    fn test_render_headers_marks_missing() {
        let text = render_headers(&sample_report().headers);
        assert_eq!(text, "foo.h\ngone.h  (missing)\n");
    }

    #[test]
    fn test_render_syscall_headers() {
        let text = render_syscall_headers(&sample_report().syscall_headers);
        assert_eq!(text, "write: foo.h\n");
    }

    #[test]
    fn test_render_line_numbers() {
        let text = render_line_numbers(&sample_report().line_numbers);
        assert!(text.contains("write is found in file /src/demo repo/main.c"));
        assert!(text.contains("3: write(1, \"hi\", 2);"));
    }

    #[test]
    fn test_summary_counts() {
        let summary = sample_report().summary();
        assert!(summary.contains("2 headers (1 resolved, 1 missing)"));
        assert!(summary.contains("1 called"));
    }

    #[test]
    fn test_json_has_format_tag() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_report().to_json().unwrap()).unwrap();
        assert_eq!(json["format"], "syscall-hunter-json-v1");
        assert_eq!(json["syscall_headers"]["write"][0], "foo.h");
        assert!(json.get("api").is_none());
    }

    #[test]
    fn test_writer_respects_flags() {
        let out = TempDir::new().unwrap();
        let writer = ArtifactWriter::create(out.path(), "demo repo").unwrap();
        assert!(writer.dir().ends_with("demo_repo"));

        writer.write_all(&sample_report(), true, false).unwrap();
        assert!(writer.syscall_headers_path().exists());
        assert!(writer.json_path().exists());
        assert!(!writer.headers_path().exists());
        assert!(!writer.line_numbers_path().exists());

        writer.write_all(&sample_report(), false, true).unwrap();
        assert!(writer.headers_path().exists());
        assert!(writer.syscalls_per_file_path().exists());
        assert!(writer.line_numbers_path().exists());
    }
}
