//! Model discovery and loading.
//!
//! Walks a directory tree for `*.archimate` files, parses each one and
//! hands the resulting models to a [`ModelRepository`]. One bad file never
//! aborts a load: it is logged and recorded in [`LoadReport::skipped`].

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use ainstein_core::models::Model;
use ainstein_core::repository::ModelRepository;

use crate::config::ModelsConfig;
use crate::parser;

const MODEL_EXTENSION: &str = "archimate";

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

/// Failure of a whole load call.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("models directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("failed to scan models directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid exclude glob: {0}")]
    Glob(#[from] globset::Error),
}

/// One successfully parsed file.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub model: String,
    pub elements: usize,
    pub relationships: usize,
    pub views: usize,
}

/// What a load call did.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub loaded: Vec<LoadedFile>,
    /// Files that failed to parse, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    pub loaded_at: DateTime<Utc>,
    /// The repository was already populated and nothing was read.
    pub already_loaded: bool,
}

impl LoadReport {
    fn empty(already_loaded: bool) -> Self {
        Self {
            loaded: Vec::new(),
            skipped: Vec::new(),
            loaded_at: Utc::now(),
            already_loaded,
        }
    }
}

/// Scan `root` for model files, in sorted path order.
pub fn scan_models(config: &ModelsConfig) -> Result<Vec<PathBuf>, LoadError> {
    let root = &config.root;
    if !root.is_dir() {
        return Err(LoadError::RootNotFound(root.to_path_buf()));
    }

    let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    excludes.extend(config.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        // Case-sensitive: `.ARCHIMATE` and `.archimate.bak` are not models.
        if path.extension() != Some(OsStr::new(MODEL_EXTENSION)) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative) {
            continue;
        }

        paths.push(path.to_path_buf());
    }

    paths.sort();
    Ok(paths)
}

/// Parse every model under `config.root`. Unparseable files are skipped.
pub fn load_all(config: &ModelsConfig) -> Result<(Vec<Model>, LoadReport), LoadError> {
    let paths = scan_models(config)?;
    let mut report = LoadReport::empty(false);
    let mut models = Vec::with_capacity(paths.len());
    let mut unknown_types: HashSet<String> = HashSet::new();

    for path in paths {
        match parser::parse_file(&path) {
            Ok(model) => {
                for element in model.elements().iter().filter(|e| e.kind().is_none()) {
                    if unknown_types.insert(element.element_type.clone()) {
                        tracing::warn!(
                            model = %model.name,
                            raw_type = %element.element_type,
                            "unknown element type, excluded from typed queries"
                        );
                    }
                }
                let dangling = model.dangling_relationships().len();
                if dangling > 0 {
                    tracing::warn!(
                        model = %model.name,
                        count = dangling,
                        "relationships reference unknown elements"
                    );
                }
                tracing::debug!(
                    path = %path.display(),
                    model = %model.name,
                    elements = model.elements().len(),
                    "parsed model"
                );
                report.loaded.push(LoadedFile {
                    path: path.clone(),
                    model: model.name.clone(),
                    elements: model.elements().len(),
                    relationships: model.relationships().len(),
                    views: model.views().len(),
                });
                models.push(model);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping model file");
                report.skipped.push((path, err.to_string()));
            }
        }
    }

    report.loaded_at = Utc::now();
    Ok((models, report))
}

/// Load the models under `root` into `repo` with default excludes.
pub fn load_into(repo: &mut ModelRepository, root: &Path) -> Result<LoadReport, LoadError> {
    let config = ModelsConfig {
        root: root.to_path_buf(),
        exclude_globs: Vec::new(),
        follow_symlinks: false,
    };
    load_into_with(repo, &config)
}

/// Load into `repo` unless it is already loaded, in which case this is a
/// no-op and the report says so.
pub fn load_into_with(
    repo: &mut ModelRepository,
    config: &ModelsConfig,
) -> Result<LoadReport, LoadError> {
    if repo.is_loaded() {
        tracing::debug!("models already loaded, skipping");
        return Ok(LoadReport::empty(true));
    }

    let (models, report) = load_all(config)?;
    repo.extend(models);

    tracing::info!(
        root = %config.root.display(),
        models = report.loaded.len(),
        skipped = report.skipped.len(),
        elements = repo.elements().count(),
        relationships = repo.relationships().count(),
        "loaded models"
    );
    Ok(report)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}
