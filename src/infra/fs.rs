use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: [&str; 3] = [".git", "node_modules", "charts"];

/// Replaces `target` with `content` via a sibling temp file, so readers never see a partial document.
/// The file keeps the mode of `target`, or takes the mode of `mode_from` when `target` is new.
pub fn write_atomic(target: &Path, content: &str, mode_from: &Path) -> Result<()> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    if let Ok(meta) = fs::metadata(target).or_else(|_| fs::metadata(mode_from)) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }
    tmp.persist(target).map_err(|e| anyhow!("{}", e.error))?;
    Ok(())
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().map(|n| SKIPPED_DIRS.contains(&n)).unwrap_or(false)
}

pub fn find_values_files(root: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(anyhow!("Scan directory '{}' not found", root.display()));
    }
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == file_name)
        .map(|e| e.into_path())
        .collect();
    found.sort();
    Ok(found)
}
