//! Corpus sampling: draw a fixed-size random subset of extension archives
//! from a folder and walk each of them into one shared frequency table.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Serialize;
use walkdir::WalkDir;

use crate::archive::ArchiveWalker;
use crate::error::{Result, ScanError};
use crate::table::FrequencyTable;

pub const DEFAULT_SAMPLE_SIZE: usize = 500;
pub const DEFAULT_POOL_LIMIT: usize = 5000;

/// Distinct archive paths, in the order they were drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SampleSet {
    pub members: Vec<PathBuf>,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// An archive from the sample that could not be opened.
#[derive(Debug, Clone, Serialize)]
pub struct FailedArchive {
    pub path: PathBuf,
    pub error: String,
}

/// Sensitive permissions requested by one analyzed archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivePermissions {
    pub path: PathBuf,
    /// Empty when no manifest lists a sensitive permission.
    pub sensitive_permissions: Vec<String>,
}

/// Outcome of a sampling run. Counts live in the caller's table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SampleRun {
    pub pool_size: usize,
    pub sample: SampleSet,
    pub analyzed: usize,
    /// One record per analyzed archive, in sample order.
    pub permissions: Vec<ArchivePermissions>,
    pub failed: Vec<FailedArchive>,
}

/// List candidate archives under `folder`: entries whose name contains
/// `.zip`, at most `pool_limit` of them, sorted by path.
///
/// `max_depth` of 1 lists immediate children only.
pub fn list_candidates(folder: &Path, pool_limit: usize, max_depth: usize) -> Result<Vec<PathBuf>> {
    let dir_err = |message: String| ScanError::DirectoryOpen {
        path: folder.display().to_string(),
        message,
    };

    if !folder.is_dir() {
        return Err(dir_err("not a directory".into()));
    }

    let mut candidates = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(max_depth.max(1))
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(dir_err(e.to_string())),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if candidates.len() >= pool_limit {
            break;
        }
        if entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(".zip") {
            candidates.push(entry.into_path());
        }
    }

    tracing::info!(folder = %folder.display(), found = candidates.len(), "listed candidate archives");
    Ok(candidates)
}

/// Draw `target` distinct members of `pool` uniformly at random.
///
/// Rejection sampling: an index already taken is redrawn.
pub fn draw_sample<R: Rng>(pool: &[PathBuf], target: usize, rng: &mut R) -> Result<SampleSet> {
    if pool.len() < target {
        return Err(ScanError::InsufficientPool {
            found: pool.len(),
            required: target,
        });
    }

    let mut taken = vec![false; pool.len()];
    let mut members = Vec::with_capacity(target);
    while members.len() < target {
        let idx = rng.gen_range(0..pool.len());
        if taken[idx] {
            continue;
        }
        taken[idx] = true;
        members.push(pool[idx].clone());
    }
    Ok(SampleSet { members })
}

pub struct Sampler<'a> {
    walker: ArchiveWalker<'a>,
    sample_size: usize,
    pool_limit: usize,
    max_depth: usize,
}

impl<'a> Sampler<'a> {
    pub fn new(walker: ArchiveWalker<'a>) -> Self {
        Self {
            walker,
            sample_size: DEFAULT_SAMPLE_SIZE,
            pool_limit: DEFAULT_POOL_LIMIT,
            max_depth: 1,
        }
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_pool_limit(mut self, pool_limit: usize) -> Self {
        self.pool_limit = pool_limit;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sample archives from `folder` and walk each once into `table`.
    ///
    /// `on_archive` is called before each walk. Archives that fail to open
    /// are logged and recorded in [`SampleRun::failed`]; the run continues.
    pub fn run<R, F>(
        &self,
        folder: &Path,
        rng: &mut R,
        table: &mut FrequencyTable,
        mut on_archive: F,
    ) -> Result<SampleRun>
    where
        R: Rng,
        F: FnMut(&Path),
    {
        let pool = list_candidates(folder, self.pool_limit, self.max_depth)?;
        let sample = draw_sample(&pool, self.sample_size, rng)?;

        let mut run = SampleRun {
            pool_size: pool.len(),
            ..Default::default()
        };

        for path in &sample.members {
            on_archive(path);
            match self.walker.walk(path, table) {
                Ok(summary) => {
                    tracing::debug!(
                        path = %path.display(),
                        files = summary.files_analyzed.len(),
                        hits = summary.hits,
                        sensitive = summary.sensitive_permissions.len(),
                        "archive analyzed"
                    );
                    run.analyzed += 1;
                    run.permissions.push(ArchivePermissions {
                        path: summary.path,
                        sensitive_permissions: summary.sensitive_permissions,
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "archive skipped");
                    run.failed.push(FailedArchive {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        run.sample = sample;
        Ok(run)
    }
}
