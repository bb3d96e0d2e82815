//! Batch driver: input directory in, two render directories out.
//!
//! Every input image is handled independently. Fit rejections skip the
//! image, decode and write failures mark it failed; neither stops the batch.
//! Both renders of an image are staged next to their destinations and
//! renamed into place together, so an image never ends up with only one of
//! its two outputs.

use std::collections::hash_map::{Entry, HashMap};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{FitError, PipelineError, Result};
use crate::fit::{fit_ellipse, EllipseDescriptor, EllipseFit};
use crate::marker::extract_marker_points;
use crate::render::{render_filled, render_marked};

const OUTPUT_EXTENSION: &str = "png";
const STAGING_SUFFIX: &str = "tmp";

/// Result of processing one image that did not fail.
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    /// Both renders were written.
    Written {
        fit: EllipseFit,
        filled: PathBuf,
        marked: PathBuf,
    },
    /// No ellipse could be fitted; nothing was written.
    Skipped(FitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    Written,
    Skipped,
    Failed,
}

/// Per-image batch entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    /// Input file name.
    pub file: String,
    pub status: ImageStatus,
    /// Why the image was skipped or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ellipse: Option<EllipseDescriptor>,
    /// Half the farthest-pair distance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    /// Maximum deviation from the farthest-pair segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_points: Option<usize>,
}

/// Summary of a batch run, in input file name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub entries: Vec<ImageReport>,
}

impl BatchReport {
    fn count(&self, status: ImageStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn n_written(&self) -> usize {
        self.count(ImageStatus::Written)
    }

    pub fn n_skipped(&self) -> usize {
        self.count(ImageStatus::Skipped)
    }

    pub fn n_failed(&self) -> usize {
        self.count(ImageStatus::Failed)
    }

    /// Write the report as pretty JSON.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| PipelineError::io(path, e))
    }
}

/// Marker-to-ellipse image pipeline.
///
/// Create once, run on many directories.
///
/// ```no_run
/// use markfit::{Pipeline, PipelineConfig};
/// use std::path::Path;
///
/// let pipeline = Pipeline::new(PipelineConfig::default())?;
/// let report = pipeline.run(
///     Path::new("original"),
///     Path::new("filled"),
///     Path::new("marked"),
/// )?;
/// println!("{} images written", report.n_written());
/// # Ok::<(), markfit::PipelineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline after validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract marker pixels and fit the ellipse.
    pub fn fit_image(&self, image: &RgbImage) -> std::result::Result<EllipseFit, FitError> {
        let points = extract_marker_points(image, &self.config.marker);
        tracing::debug!(n_points = points.len(), "marker pixels extracted");
        fit_ellipse(&points, &self.config.fit)
    }

    /// Produce the `(filled, marked)` renders for a fitted image.
    pub fn render(&self, image: &RgbImage, fit: &EllipseFit) -> (RgbImage, RgbImage) {
        let (w, h) = image.dimensions();
        let filled = render_filled(w, h, &fit.ellipse, &self.config.render);
        let marked = render_marked(image, fit, &self.config.render);
        (filled, marked)
    }

    /// Process a single image file.
    ///
    /// Output files are named after the input stem with a `.png` extension.
    pub fn process_image(
        &self,
        path: &Path,
        filled_dir: &Path,
        marked_dir: &Path,
    ) -> Result<ImageOutcome> {
        let image = image::open(path)
            .map_err(|source| PipelineError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();

        let fit = match self.fit_image(&image) {
            Ok(fit) => fit,
            Err(e) => return Ok(ImageOutcome::Skipped(e)),
        };

        let (filled, marked) = self.render(&image, &fit);
        let file_name = output_file_name(path);
        let filled_path = filled_dir.join(&file_name);
        let marked_path = marked_dir.join(&file_name);

        let filled_png = encode_png(&filled, &filled_path)?;
        let marked_png = encode_png(&marked, &marked_path)?;
        write_all_or_none(&[
            (filled_path.as_path(), filled_png.as_slice()),
            (marked_path.as_path(), marked_png.as_slice()),
        ])?;

        Ok(ImageOutcome::Written {
            fit,
            filled: filled_path,
            marked: marked_path,
        })
    }

    /// Process every accepted image in `input_dir`.
    ///
    /// Output directories are created if missing and must be distinct. Only
    /// directory setup and listing errors abort the batch.
    ///
    /// When several inputs map to one output name (`s.png` and `s.PNG`), the
    /// first in file name order is processed and the rest are marked failed.
    pub fn run(&self, input_dir: &Path, filled_dir: &Path, marked_dir: &Path) -> Result<BatchReport> {
        for dir in [filled_dir, marked_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
        }
        ensure_distinct_dirs(filled_dir, marked_dir)?;

        let inputs = self.list_inputs(input_dir)?;
        let claimed_by = output_collisions(&inputs);
        tracing::info!("{} input images in {}", inputs.len(), input_dir.display());

        let run_one = |(path, other): (&PathBuf, &Option<PathBuf>)| {
            self.report_image(path, other.as_deref(), filled_dir, marked_dir)
        };
        let entries: Vec<ImageReport> = if self.config.parallel {
            inputs.par_iter().zip(claimed_by.par_iter()).map(run_one).collect()
        } else {
            inputs.iter().zip(claimed_by.iter()).map(run_one).collect()
        };

        let report = BatchReport { entries };
        tracing::info!(
            "batch done: {} written, {} skipped, {} failed",
            report.n_written(),
            report.n_skipped(),
            report.n_failed(),
        );
        Ok(report)
    }

    fn list_inputs(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        let read_dir = std::fs::read_dir(input_dir).map_err(|e| PipelineError::io(input_dir, e))?;
        let mut inputs = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| PipelineError::io(input_dir, e))?;
            let path = entry.path();
            if path.is_file() && self.config.accepts(&path) {
                inputs.push(path);
            }
        }
        inputs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(inputs)
    }

    fn report_image(
        &self,
        path: &Path,
        claimed_by: Option<&Path>,
        filled_dir: &Path,
        marked_dir: &Path,
    ) -> ImageReport {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut report = ImageReport {
            file,
            status: ImageStatus::Failed,
            reason: None,
            ellipse: None,
            a: None,
            b: None,
            n_points: None,
        };

        let outcome = match claimed_by {
            Some(other) => Err(PipelineError::OutputCollision {
                path: path.to_path_buf(),
                other: other.to_path_buf(),
            }),
            None => self.process_image(path, filled_dir, marked_dir),
        };
        match outcome {
            Ok(ImageOutcome::Written { fit, .. }) => {
                tracing::info!(
                    "{}: a={:.1} b={:.1} angle={:.1}deg",
                    report.file,
                    fit.a,
                    fit.b,
                    fit.ellipse.angle_deg,
                );
                report.status = ImageStatus::Written;
                report.ellipse = Some(fit.ellipse);
                report.a = Some(fit.a);
                report.b = Some(fit.b);
                report.n_points = Some(fit.n_points);
            }
            Ok(ImageOutcome::Skipped(e)) => {
                tracing::warn!("{}: skipped ({})", report.file, e);
                report.status = ImageStatus::Skipped;
                report.reason = Some(e.to_string());
            }
            Err(e) => {
                tracing::warn!("{}: failed ({})", report.file, e);
                report.reason = Some(e.to_string());
            }
        }
        report
    }
}

fn output_file_name(input: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .unwrap_or(input.as_os_str())
        .to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    PathBuf::from(name)
}

/// For each input, the earlier input that already owns its output name.
fn output_collisions(inputs: &[PathBuf]) -> Vec<Option<PathBuf>> {
    let mut owners: HashMap<PathBuf, &PathBuf> = HashMap::with_capacity(inputs.len());
    inputs
        .iter()
        .map(|path| match owners.entry(output_file_name(path)) {
            Entry::Occupied(owner) => Some((*owner.get()).clone()),
            Entry::Vacant(slot) => {
                slot.insert(path);
                None
            }
        })
        .collect()
}

/// Both renders share a file name, so they need separate directories.
fn ensure_distinct_dirs(filled_dir: &Path, marked_dir: &Path) -> Result<()> {
    let filled = filled_dir
        .canonicalize()
        .map_err(|e| PipelineError::io(filled_dir, e))?;
    let marked = marked_dir
        .canonicalize()
        .map_err(|e| PipelineError::io(marked_dir, e))?;
    if filled == marked {
        return Err(PipelineError::Config(format!(
            "filled and marked outputs share the directory {}",
            filled.display()
        )));
    }
    Ok(())
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".");
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

fn encode_png(image: &RgbImage, dest: &Path) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|source| PipelineError::Encode {
            path: dest.to_path_buf(),
            source,
        })?;
    Ok(buf)
}

/// Stage every file, then rename each into place. On any error, staged and
/// already-renamed files of this set are removed.
fn write_all_or_none(outputs: &[(&Path, &[u8])]) -> Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(outputs.len());
    for &(dest, bytes) in outputs {
        let tmp = staging_path(dest);
        if let Err(e) = std::fs::write(&tmp, bytes) {
            let _ = std::fs::remove_file(&tmp);
            for (t, _) in &staged {
                let _ = std::fs::remove_file(t);
            }
            return Err(PipelineError::io(tmp, e));
        }
        staged.push((tmp, dest));
    }

    for (i, (tmp, dest)) in staged.iter().enumerate() {
        if let Err(e) = std::fs::rename(tmp, dest) {
            for (_, done) in &staged[..i] {
                let _ = std::fs::remove_file(done);
            }
            for (t, _) in &staged[i..] {
                let _ = std::fs::remove_file(t);
            }
            return Err(PipelineError::io(*dest, e));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiameterSearch;
    use crate::test_utils::{canvas_with_ellipse, canvas_with_markers, save_png};
    use approx::assert_relative_eq;
    use std::fs;

    struct Dirs {
        _root: tempfile::TempDir,
        input: PathBuf,
        filled: PathBuf,
        marked: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempfile::tempdir().expect("tempdir");
        let input = root.path().join("original");
        fs::create_dir(&input).expect("mkdir");
        Dirs {
            filled: root.path().join("out/filled"),
            marked: root.path().join("out/marked"),
            input,
            _root: root,
        }
    }

    fn scenario_image() -> RgbImage {
        canvas_with_markers(50, 50, &[(5, 25), (45, 25), (25, 30)])
    }

    fn list(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default()).expect("valid config")
    }

    #[test]
    fn three_marker_image_end_to_end() {
        let d = dirs();
        save_png(&scenario_image(), &d.input.join("shape_01.png"));

        let report = pipeline().run(&d.input, &d.filled, &d.marked).expect("run");
        assert_eq!(report.n_written(), 1);

        let entry = &report.entries[0];
        assert_eq!(entry.file, "shape_01.png");
        assert_eq!(entry.status, ImageStatus::Written);
        let e = entry.ellipse.expect("ellipse");
        assert_eq!(e.center, [25.0, 25.0]);
        assert_relative_eq!(e.semi_major, 20.0);
        assert_relative_eq!(e.semi_minor, 5.0);
        assert_relative_eq!(e.angle_deg, 0.0);
        assert_eq!(entry.a, Some(20.0));
        assert_eq!(entry.b, Some(5.0));
        assert_eq!(entry.n_points, Some(3));

        assert_eq!(list(&d.filled), vec!["shape_01.png"]);
        assert_eq!(list(&d.marked), vec!["shape_01.png"]);

        let filled = image::open(d.filled.join("shape_01.png")).expect("open").to_rgb8();
        assert_eq!(filled.dimensions(), (50, 50));
        assert_eq!(filled.get_pixel(25, 25).0, [230, 60, 60]);
        assert_eq!(filled.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn insufficient_markers_are_skipped_without_output() {
        let d = dirs();
        save_png(&canvas_with_markers(20, 20, &[]), &d.input.join("empty.png"));
        save_png(&canvas_with_markers(20, 20, &[(3, 3)]), &d.input.join("single.png"));
        save_png(&scenario_image(), &d.input.join("z_good.png"));

        let report = pipeline().run(&d.input, &d.filled, &d.marked).expect("run");
        let statuses: Vec<_> = report.entries.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![ImageStatus::Skipped, ImageStatus::Skipped, ImageStatus::Written]
        );
        assert!(report.entries[0]
            .reason
            .as_deref()
            .unwrap_or_default()
            .contains("insufficient"));
        assert_eq!(list(&d.filled), vec!["z_good.png"]);
        assert_eq!(list(&d.marked), vec!["z_good.png"]);
    }

    #[test]
    fn undecodable_image_fails_locally() {
        let d = dirs();
        fs::write(d.input.join("broken.png"), b"not a png").expect("write");
        save_png(&scenario_image(), &d.input.join("ok.png"));

        let report = pipeline().run(&d.input, &d.filled, &d.marked).expect("run");
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].file, "broken.png");
        assert_eq!(report.entries[0].status, ImageStatus::Failed);
        assert_eq!(report.entries[1].status, ImageStatus::Written);
        assert_eq!(report.n_failed(), 1);
        assert_eq!(list(&d.filled), vec!["ok.png"]);
    }

    #[test]
    fn other_extensions_are_ignored_and_case_is_folded() {
        let d = dirs();
        save_png(&scenario_image(), &d.input.join("UPPER.PNG"));
        fs::write(d.input.join("notes.txt"), b"hello").expect("write");
        fs::create_dir(d.input.join("nested.png")).expect("mkdir");

        let report = pipeline().run(&d.input, &d.filled, &d.marked).expect("run");
        assert_eq!(report.entries.len(), 1);
        assert_eq!(list(&d.filled), vec!["UPPER.png"]);
    }

    #[test]
    fn rerun_produces_identical_bytes() {
        let d = dirs();
        save_png(&scenario_image(), &d.input.join("a.png"));
        save_png(
            &canvas_with_ellipse(80, 60, [40.0, 30.0], [25.0, 9.0]),
            &d.input.join("b.png"),
        );

        let p = pipeline();
        let first = p.run(&d.input, &d.filled, &d.marked).expect("run 1");
        let root = d._root.path();
        let (filled2, marked2) = (root.join("again/filled"), root.join("again/marked"));
        let second = p.run(&d.input, &filled2, &marked2).expect("run 2");

        assert_eq!(first, second);
        for name in ["a.png", "b.png"] {
            assert_eq!(
                fs::read(d.filled.join(name)).expect("read"),
                fs::read(filled2.join(name)).expect("read")
            );
            assert_eq!(
                fs::read(d.marked.join(name)).expect("read"),
                fs::read(marked2.join(name)).expect("read")
            );
        }
    }

    #[test]
    fn parallel_run_matches_sequential() {
        let d = dirs();
        for i in 0..6u32 {
            let axes = [10.0 + 3.0 * i as f64, 6.0 + i as f64];
            save_png(
                &canvas_with_ellipse(90, 70, [45.0, 35.0], axes),
                &d.input.join(format!("img_{i}.png")),
            );
        }
        save_png(&canvas_with_markers(10, 10, &[]), &d.input.join("img_blank.png"));

        let seq = pipeline().run(&d.input, &d.filled, &d.marked).expect("seq");

        let cfg = PipelineConfig {
            parallel: true,
            ..PipelineConfig::default()
        };
        let root = d._root.path();
        let par = Pipeline::new(cfg)
            .expect("valid")
            .run(&d.input, &root.join("pf"), &root.join("pm"))
            .expect("par");

        assert_eq!(seq, par);
        assert_eq!(seq.n_written(), 6);
        assert_eq!(seq.n_skipped(), 1);
    }

    #[test]
    fn solid_blob_fit_spans_its_extent() {
        let d = dirs();
        let img = canvas_with_ellipse(100, 60, [50.0, 30.0], [30.0, 10.0]);
        let path = d.input.join("blob.png");
        save_png(&img, &path);

        let cfg = PipelineConfig {
            fit: crate::config::FitConfig {
                diameter_search: DiameterSearch::ConvexHull,
                ..Default::default()
            },
            ..PipelineConfig::default()
        };
        fs::create_dir_all(&d.filled).expect("mkdir");
        fs::create_dir_all(&d.marked).expect("mkdir");
        let outcome = Pipeline::new(cfg)
            .expect("valid")
            .process_image(&path, &d.filled, &d.marked)
            .expect("process");
        let ImageOutcome::Written { fit, filled, marked } = outcome else {
            panic!("expected written outcome");
        };
        assert_relative_eq!(fit.ellipse.semi_major, 30.0, epsilon = 0.01);
        assert_relative_eq!(fit.ellipse.semi_minor, 10.0, epsilon = 0.01);
        assert_relative_eq!(fit.ellipse.center[0], 50.0, epsilon = 0.01);
        assert_relative_eq!(fit.ellipse.center[1], 30.0, epsilon = 0.01);
        assert!(filled.exists());
        assert!(marked.exists());
    }

    #[test]
    fn failed_write_leaves_no_partial_output() {
        let d = dirs();
        save_png(&scenario_image(), &d.input.join("shape.png"));
        fs::create_dir_all(&d.filled).expect("mkdir");
        // A directory where the marked output should go makes the rename fail.
        fs::create_dir_all(d.marked.join("shape.png")).expect("mkdir");

        let report = pipeline().run(&d.input, &d.filled, &d.marked).expect("run");
        assert_eq!(report.entries[0].status, ImageStatus::Failed);
        assert!(list(&d.filled).is_empty());
        assert_eq!(list(&d.marked), vec!["shape.png"]);
        assert!(d.marked.join("shape.png").is_dir());
    }

    #[test]
    fn inputs_sharing_an_output_name_are_written_once() {
        let d = dirs();
        save_png(&scenario_image(), &d.input.join("s.PNG"));
        save_png(
            &canvas_with_ellipse(80, 60, [40.0, 30.0], [25.0, 9.0]),
            &d.input.join("s.png"),
        );

        let report = pipeline().run(&d.input, &d.filled, &d.marked).expect("run");
        let files: Vec<_> = report.entries.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["s.PNG", "s.png"]);
        assert_eq!(report.entries[0].status, ImageStatus::Written);
        assert_eq!(report.entries[1].status, ImageStatus::Failed);
        assert!(report.entries[1]
            .reason
            .as_deref()
            .unwrap_or_default()
            .contains("collides with"));

        assert_eq!(report.n_written(), list(&d.filled).len());
        assert_eq!(report.n_written(), list(&d.marked).len());
        let filled = image::open(d.filled.join("s.png")).expect("open").to_rgb8();
        assert_eq!(filled.dimensions(), (50, 50));
    }

    #[test]
    fn output_collisions_keep_first_owner() {
        let inputs = [
            PathBuf::from("in/a.PNG"),
            PathBuf::from("in/a.png"),
            PathBuf::from("in/b.png"),
            PathBuf::from("in/a.Png"),
        ];
        let owner = Some(PathBuf::from("in/a.PNG"));
        assert_eq!(
            output_collisions(&inputs),
            vec![None, owner.clone(), None, owner]
        );
    }

    #[test]
    fn shared_output_dir_is_rejected() {
        let d = dirs();
        save_png(&scenario_image(), &d.input.join("shape.png"));

        let err = pipeline()
            .run(&d.input, &d.filled, &d.filled.join("."))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(list(&d.filled).is_empty());
    }

    #[test]
    fn missing_input_dir_is_fatal() {
        let d = dirs();
        let err = pipeline()
            .run(&d.input.join("nope"), &d.filled, &d.marked)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.fit.min_points = 0;
        assert!(matches!(Pipeline::new(cfg), Err(PipelineError::Config(_))));
    }

    #[test]
    fn report_serializes_status_in_snake_case() {
        let d = dirs();
        save_png(&canvas_with_markers(8, 8, &[(1, 1)]), &d.input.join("one.png"));
        let report = pipeline().run(&d.input, &d.filled, &d.marked).expect("run");

        let path = d._root.path().join("report.json");
        report.to_json_file(&path).expect("write report");
        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\"skipped\""));
        let back: BatchReport = serde_json::from_str(&raw).expect("parse");
        assert_eq!(back, report);
    }

    #[test]
    fn output_names_replace_extension() {
        assert_eq!(output_file_name(Path::new("in/shape.v2.PNG")), PathBuf::from("shape.v2.png"));
        assert_eq!(
            staging_path(Path::new("out/shape.png")),
            PathBuf::from("out/shape.png.tmp")
        );
    }
}
