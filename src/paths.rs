use crate::record::RecordKind;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

pub const ARCHIVE_EXTENSION: &str = "zst";

/// One input archive and the extension-less base of its output file.
#[derive(Clone, Debug)]
pub struct FileJob {
    pub input: PathBuf,
    pub output_base: PathBuf,
    pub kind: RecordKind,
}

impl FileJob {
    pub fn new(input: impl Into<PathBuf>, output_base: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let kind = kind_from_path(&input);
        Self { input, output_base: output_base.into(), kind }
    }
}

fn monthly_submissions_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^RS_\d{4}-\d{2}").expect("static regex"))
}

/// Submissions are named `*submissions*.zst` (subreddit dumps) or `RS_YYYY-MM.zst`
/// (monthly dumps); anything else is treated as comments.
pub fn kind_from_path(path: &Path) -> RecordKind {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if name.contains("submission") || monthly_submissions_re().is_match(name) {
        RecordKind::Submission
    } else {
        RecordKind::Comment
    }
}

/// `RS_2021-01.zst` → `RS_2021-01`; `foo.ndjson.zst` → `foo`. Strips up to two extensions.
pub fn output_stem(path: &Path) -> String {
    let mut stem = PathBuf::from(path.file_name().unwrap_or_default());
    for _ in 0..2 {
        if stem.extension().is_some() {
            stem = PathBuf::from(stem.file_stem().unwrap_or_default());
        }
    }
    stem.to_string_lossy().into_owned()
}

/// Build the job list. A file input maps to `output` directly; a directory input maps
/// every `*.zst` entry (sorted by name) to `output/<stem>`, creating `output` if needed.
pub fn plan_jobs(input: &Path, output: &Path) -> Result<Vec<FileJob>> {
    if !input.exists() {
        bail!("input {} does not exist", input.display());
    }
    if !input.is_dir() {
        return Ok(vec![FileJob::new(input, output)]);
    }

    fs::create_dir_all(output).with_context(|| format!("create output dir {}", output.display()))?;
    let mut jobs = Vec::new();
    for entry in WalkDir::new(input).min_depth(1).max_depth(1).sort_by_file_name() {
        let ent = entry.with_context(|| format!("list {}", input.display()))?;
        if ent.file_type().is_dir() {
            continue;
        }
        let is_archive = ent.path().extension().and_then(|e| e.to_str()) == Some(ARCHIVE_EXTENSION);
        if !is_archive {
            continue;
        }
        let stem = output_stem(ent.path());
        jobs.push(FileJob::new(ent.path(), output.join(stem)));
    }
    Ok(jobs)
}
