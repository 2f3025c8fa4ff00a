//! Builder pipeline: slide plan plus images to a new deck.

use rand::Rng;
use slidecraft_core::{read_plan, Result, SlideSpec, PLAN_FILE_NAME};
use slidecraft_pptx::{Deck, SlideRenderer};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the deck written by [`build_from_job_dir`] in job runs.
pub const DEFAULT_OUTPUT_NAME: &str = "presentation.pptx";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Build a deck where slide `i` shows `specs[i]` and, if present, `images[i]`.
///
/// Specs beyond the last image render text only; images beyond the last spec
/// are ignored.
pub fn build<P: AsRef<Path>>(specs: &[SlideSpec], images: &[P], output: &Path) -> Result<PathBuf> {
    build_with(&mut SlideRenderer::new(), specs, images, output)
}

/// [`build`] with a caller-supplied renderer.
pub fn build_with<R: Rng, P: AsRef<Path>>(
    renderer: &mut SlideRenderer<R>,
    specs: &[SlideSpec],
    images: &[P],
    output: &Path,
) -> Result<PathBuf> {
    if images.len() != specs.len() {
        log::warn!(
            "Plan has {} slides but {} images were supplied",
            specs.len(),
            images.len()
        );
    }

    let mut deck = Deck::new()?;
    for (index, spec) in specs.iter().enumerate() {
        let image = images.get(index).map(AsRef::as_ref);
        renderer.render_slide(&mut deck, spec, image)?;
    }

    deck.save(output)?;
    log::info!("Wrote {} slides to {}", specs.len(), output.display());
    Ok(output.to_path_buf())
}

/// Image files directly inside `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Build `dir/output_name` from `dir/slides.json` and the images in `dir`.
pub fn build_from_job_dir(dir: &Path, output_name: &str) -> Result<PathBuf> {
    let specs = read_plan(&dir.join(PLAN_FILE_NAME))?;
    let images = list_images(dir)?;
    log::info!(
        "Building from {} with {} slides and {} images",
        dir.display(),
        specs.len(),
        images.len()
    );
    build(&specs, &images, &dir.join(output_name))
}
