use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::{ImageFormat, RgbImage};
use rand::{Rng, seq::IndexedRandom as _};

use crate::{
    foundation::error::{OverlayError, OverlayResult},
    pipeline::{self, CompositeParams},
};

/// Directories and tunables of one batch run.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub material_dir: PathBuf,
    pub target_dir: PathBuf,
    pub output_dir: PathBuf,
    pub params: CompositeParams,
}

/// Per-outcome counters of a batch run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped_no_material: usize,
    pub skipped_empty_mask: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.processed + self.skipped_no_material + self.skipped_empty_mask + self.failed
    }

    fn record(&mut self, err: &OverlayError) {
        match err {
            OverlayError::NoMaterialAvailable => self.skipped_no_material += 1,
            OverlayError::EmptyMask => self.skipped_empty_mask += 1,
            _ => self.failed += 1,
        }
    }
}

/// Regular `*.png` files directly inside `dir` (extension matched case-insensitively),
/// sorted by path.
pub fn list_pngs(dir: &Path) -> OverlayResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read dir '{}'", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Encode `img` as PNG next to `path` and rename it into place once fully written.
pub fn write_png_atomic(img: &RgbImage, path: &Path) -> OverlayResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".overlay-")
        .suffix(".png.part")
        .tempfile_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        img.write_to(&mut w, ImageFormat::Png)?;
        w.flush()?;
    }
    tmp.persist(path).map_err(|e| OverlayError::Io(e.error))?;
    Ok(())
}

/// Composite one target with one material and write the result under the output directory.
///
/// Returns the written path. Nothing is left on disk when any step fails.
#[tracing::instrument(skip_all, fields(file = %target_path.display()))]
pub fn process_target<R: Rng + ?Sized>(
    target_path: &Path,
    material_path: Option<&Path>,
    config: &BatchConfig,
    rng: &mut R,
) -> OverlayResult<PathBuf> {
    let material_path = material_path.ok_or(OverlayError::NoMaterialAvailable)?;
    let file_name = target_path
        .file_name()
        .with_context(|| format!("target path '{}' has no file name", target_path.display()))?;

    let target = image::open(target_path)?.to_rgb8();
    let material = image::open(material_path)?.to_rgba8();

    let outcome = pipeline::composite(&target, &material, &config.params, rng)?;

    let out_path = config.output_dir.join(file_name);
    write_png_atomic(&outcome.image, &out_path)?;

    tracing::info!(
        material = %display_name(material_path),
        roi = %format!("{}x{}", outcome.roi.width(), outcome.roi.height()),
        size = %format!("{}x{}", outcome.plan.new_width, outcome.plan.new_height),
        paste = %format!("({}, {})", outcome.plan.paste_x, outcome.plan.paste_y),
        "composited"
    );
    Ok(out_path)
}

/// Process every PNG target, each with a uniformly chosen material.
///
/// Per-target failures are logged and counted; only listing the input directories or creating
/// the output directory aborts the run.
#[tracing::instrument(skip_all, fields(targets = %config.target_dir.display()))]
pub fn run_batch<R: Rng + ?Sized>(
    config: &BatchConfig,
    rng: &mut R,
) -> OverlayResult<BatchReport> {
    config.params.validate()?;
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("create output dir '{}'", config.output_dir.display())
    })?;

    let materials = list_pngs(&config.material_dir)?;
    let targets = list_pngs(&config.target_dir)?;
    tracing::info!(
        materials = materials.len(),
        targets = targets.len(),
        "starting batch"
    );

    let mut report = BatchReport::default();
    for target_path in &targets {
        let material = materials.choose(rng).map(PathBuf::as_path);
        match process_target(target_path, material, config, rng) {
            Ok(_) => report.processed += 1,
            Err(err) if err.is_skip() => {
                tracing::warn!(file = %display_name(target_path), "skipped: {err}");
                report.record(&err);
            }
            Err(err) => {
                tracing::error!(file = %display_name(target_path), "failed: {err}");
                report.record(&err);
            }
        }
    }

    tracing::info!(
        processed = report.processed,
        skipped_no_material = report.skipped_no_material,
        skipped_empty_mask = report.skipped_empty_mask,
        failed = report.failed,
        "batch complete"
    );
    Ok(report)
}

/// Write `report` as pretty JSON.
pub fn write_report(report: &BatchReport, path: &Path) -> OverlayResult<()> {
    let f = File::create(path).with_context(|| format!("create report '{}'", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(f), report)
        .with_context(|| format!("write report '{}'", path.display()))?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn list_pngs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.PNG", "c.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let names: Vec<String> = list_pngs(dir.path())
            .unwrap()
            .iter()
            .map(|p| display_name(p))
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.png"]);
    }

    #[test]
    fn list_pngs_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_pngs(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn atomic_write_leaves_only_the_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        let path = dir.path().join("out.png");
        write_png_atomic(&img, &path).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let back = image::open(&path).unwrap();
        assert_eq!(back.to_rgb8(), img);
    }

    #[test]
    fn report_counts_by_error_kind() {
        let mut r = BatchReport::default();
        r.record(&OverlayError::EmptyMask);
        r.record(&OverlayError::NoMaterialAvailable);
        r.record(&OverlayError::NoMaterialAvailable);
        r.record(&OverlayError::validation("x"));
        r.processed = 4;
        assert_eq!(
            r,
            BatchReport {
                processed: 4,
                skipped_no_material: 2,
                skipped_empty_mask: 1,
                failed: 1,
            }
        );
        assert_eq!(r.total(), 8);
    }
}
