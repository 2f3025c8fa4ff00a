//! Job runs: fetch inputs from an object store into a temporary directory,
//! run a pipeline, upload the outputs.
//!
//! Object keys are `/`-separated and start with the job id, e.g.
//! `job-42/slides.json`. The working directory is removed when the job
//! returns, whether it succeeded or not.

use crate::build::{build_from_job_dir, DEFAULT_OUTPUT_NAME};
use crate::enhance::Enhancer;
use crate::plan::generate_plan_file;
use slidecraft_ai::{GenerativeModel, PlanGenerator};
use slidecraft_core::{Error, Result, SlideSpec, PLAN_FILE_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Storage the job layer reads inputs from and writes outputs to.
pub trait ObjectStore {
    /// Copy the object at `key` to the local file `dest`.
    fn fetch(&self, key: &str, dest: &Path) -> Result<()>;

    /// Store the local file `src` under `key`.
    fn put(&self, src: &Path, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// An [`ObjectStore`] backed by a directory tree.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    fn walk(&self, dir: &Path, keys: &mut Vec<String>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.walk(&path, keys)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let key: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                keys.push(key.join("/"));
            }
        }
        Ok(())
    }
}

impl ObjectStore for LocalStore {
    fn fetch(&self, key: &str, dest: &Path) -> Result<()> {
        fs::copy(self.path_of(key), dest)
            .map(|_| ())
            .map_err(|e| Error::StorageError(format!("Failed to download '{}': {}", key, e)))
    }

    fn put(&self, src: &Path, key: &str) -> Result<()> {
        let target = self.path_of(key);
        let copied = match target.parent() {
            Some(parent) => fs::create_dir_all(parent).and_then(|_| fs::copy(src, &target)),
            None => fs::copy(src, &target),
        };
        copied
            .map(|_| ())
            .map_err(|e| Error::StorageError(format!("Failed to upload '{}': {}", key, e)))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if self.root.is_dir() {
            self.walk(&self.root, &mut keys)
                .map_err(|e| Error::StorageError(format!("Failed to list '{}': {}", prefix, e)))?;
        }
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

/// Private working directory for one job run, deleted on drop.
#[derive(Debug)]
pub struct JobDir {
    dir: TempDir,
}

impl JobDir {
    pub fn new(job_id: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", sanitize(job_id)))
            .tempdir()?;
        log::debug!("Job {} working in {}", job_id, dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file named `name` inside the directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Download `key` into the directory under its file name.
    pub fn download(&self, store: &dyn ObjectStore, key: &str) -> Result<PathBuf> {
        let dest = self.file(file_name(key));
        store.fetch(key, &dest)?;
        Ok(dest)
    }
}

fn sanitize(job_id: &str) -> String {
    job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Last segment of an object key.
fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Job id of an object key: its first segment.
fn job_id_of(key: &str) -> &str {
    key.split('/').next().unwrap_or(key)
}

/// Enhance the deck stored at `input_key` and store the result at `output_key`.
pub fn enhance_job(
    store: &dyn ObjectStore,
    enhancer: &Enhancer,
    input_key: &str,
    output_key: &str,
    logo_key: Option<&str>,
    credits: Option<&str>,
) -> Result<String> {
    let dir = JobDir::new(job_id_of(input_key))?;
    let input = dir.download(store, input_key)?;
    let logo = logo_key.map(|key| dir.download(store, key)).transpose()?;

    let output = dir.file(&format!("enhanced_{}", file_name(output_key)));
    enhancer.enhance(&input, &output, logo.as_deref(), credits)?;

    store.put(&output, output_key)?;
    log::info!("Stored enhanced deck at {}", output_key);
    Ok(output_key.to_string())
}

/// Generate `{job_id}/slides.json` from the job's source document and images.
///
/// The source is the first object under the job whose file name is neither
/// one of `image_names` nor the plan file.
pub fn plan_job<M: GenerativeModel>(
    store: &dyn ObjectStore,
    generator: &PlanGenerator<M>,
    job_id: &str,
    image_names: &[String],
) -> Result<Vec<SlideSpec>> {
    let prefix = format!("{}/", job_id);
    let keys = store.list(&prefix)?;
    let source_key = keys
        .iter()
        .find(|key| {
            let name = file_name(key);
            name != PLAN_FILE_NAME && !image_names.iter().any(|image| image == name)
        })
        .ok_or_else(|| Error::StorageError(format!("No source document found for job {}", job_id)))?;

    let dir = JobDir::new(job_id)?;
    let source = dir.download(store, source_key)?;
    let images = image_names
        .iter()
        .map(|name| dir.download(store, &format!("{}{}", prefix, name)))
        .collect::<Result<Vec<_>>>()?;

    let plan_path = dir.file(PLAN_FILE_NAME);
    let plan = generate_plan_file(generator, &source, &images, &plan_path)?;
    store.put(&plan_path, &format!("{}{}", prefix, PLAN_FILE_NAME))?;
    Ok(plan)
}

/// Build `{job_id}/presentation.pptx` from everything stored under the job.
pub fn build_job(store: &dyn ObjectStore, job_id: &str) -> Result<String> {
    let prefix = format!("{}/", job_id);
    let dir = JobDir::new(job_id)?;
    for key in store.list(&prefix)? {
        dir.download(store, &key)?;
    }

    let output = build_from_job_dir(dir.path(), DEFAULT_OUTPUT_NAME)?;
    let output_key = format!("{}{}", prefix, DEFAULT_OUTPUT_NAME);
    store.put(&output, &output_key)?;
    log::info!("Stored built deck at {}", output_key);
    Ok(output_key)
}
