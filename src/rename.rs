use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::batch::list_pngs;
use crate::foundation::error::OverlayResult;

/// Suffix the original augmentation runs tag their outputs with.
pub const DEFAULT_SUFFIX: &str = "(rand)(1)";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// `dir/name.png` -> `dir/name{suffix}.png`, keeping the original extension spelling.
pub fn suffixed_path(path: &Path, suffix: &str) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_string_lossy();
    let new_name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    Some(path.with_file_name(new_name))
}

/// Insert `suffix` before the extension of every PNG in `dir`.
///
/// Files whose new name already exists are left alone and counted as skipped.
#[tracing::instrument]
pub fn rename_pngs(dir: &Path, suffix: &str) -> OverlayResult<RenameReport> {
    let files = list_pngs(dir)?;
    tracing::info!(count = files.len(), "found png files");

    let mut report = RenameReport::default();
    for path in &files {
        let Some(new_path) = suffixed_path(path, suffix) else {
            report.failed += 1;
            continue;
        };
        if new_path.exists() {
            tracing::warn!(
                from = %path.display(),
                to = %new_path.display(),
                "skipped, destination exists"
            );
            report.skipped += 1;
            continue;
        }
        match std::fs::rename(path, &new_path)
            .with_context(|| format!("rename '{}'", path.display()))
        {
            Ok(()) => {
                tracing::info!(from = %path.display(), to = %new_path.display(), "renamed");
                report.renamed += 1;
            }
            Err(err) => {
                tracing::error!("{err:#}");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        renamed = report.renamed,
        skipped = report.skipped,
        failed = report.failed,
        "rename complete"
    );
    Ok(report)
}
