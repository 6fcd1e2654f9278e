//! Sequential batch processing over the manifest.

pub mod recovery;

pub use recovery::scrub_interrupted_jobs;

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::error::{Result, SubsplitError};
use crate::manifest::{JobRef, JobStatus, ManifestStore};
use crate::pipeline::JobPipeline;

/// Outcome of one scheduling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Interrupted jobs reset before selection.
    pub scrubbed: usize,
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Jobs still pending once the pass ends.
    pub remaining: usize,
}

/// Picks pending jobs and runs them one at a time.
///
/// The scheduler owns the store for the whole pass. A job failure is recorded on
/// the job and the batch moves on; only a failure to persist the manifest ends
/// the pass early.
pub struct JobScheduler {
    store: ManifestStore,
    pipeline: JobPipeline,
    show_progress: bool,
}

impl JobScheduler {
    pub fn new(store: ManifestStore, pipeline: JobPipeline) -> Self {
        Self {
            store,
            pipeline,
            show_progress: false,
        }
    }

    /// Show a progress bar over the selected jobs.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// A split count below 1 is a manifest error, reported before any job starts.
    fn check_splits(&self, selected: &[JobRef]) -> Result<()> {
        for job_ref in selected {
            let job = self.store.job(job_ref)?;
            if job.splits < 1 {
                return Err(SubsplitError::Config(format!(
                    "job {}#{} ('{}') has {} splits, at least 1 is required",
                    job_ref.playlist_id, job_ref.index, job.title, job.splits
                )));
            }
        }
        Ok(())
    }

    /// Process up to `cap` pending jobs (all of them when `None`).
    pub async fn run(&mut self, cap: Option<usize>) -> Result<RunReport> {
        let scrubbed = scrub_interrupted_jobs(&mut self.store, self.pipeline.workspace())?;
        if scrubbed > 0 {
            info!("Reset {} interrupted jobs", scrubbed);
        }

        let mut selected = self.store.pending_jobs();
        if let Some(cap) = cap {
            selected.truncate(cap);
        }

        self.check_splits(&selected)?;

        let mut report = RunReport {
            scrubbed,
            remaining: self.store.pending_count(),
            ..RunReport::default()
        };
        if selected.is_empty() {
            info!("No pending videos to process");
            return Ok(report);
        }

        info!("Processing {} videos", selected.len());
        let started = Instant::now();

        let progress_bar = if self.show_progress {
            let pb = ProgressBar::new(selected.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} videos {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        for job_ref in &selected {
            let job = self.store.job(job_ref)?.clone();
            info!(
                "[{}/{}] {} ({} parts)",
                report.processed + 1,
                selected.len(),
                job.title,
                job.splits
            );
            if let Some(ref pb) = progress_bar {
                pb.set_message(job.title.clone());
            }

            self.store
                .set_status(job_ref, JobStatus::Processing, None, None)?;

            let outcome = match self.pipeline.workspace().create_scratch(&job_ref.playlist_id) {
                Ok(scratch) => {
                    let result = self
                        .pipeline
                        .process_video(&job_ref.playlist_id, &job, scratch.path())
                        .await;
                    let scratch_path = scratch.path().to_path_buf();
                    if let Err(e) = scratch.close() {
                        warn!(
                            "Could not remove scratch directory {}: {}",
                            scratch_path.display(),
                            e
                        );
                    }
                    result
                }
                Err(e) => Err(e),
            };

            report.processed += 1;
            match outcome {
                Ok(artifacts) => {
                    info!("Completed '{}': {} parts", job.title, artifacts.len());
                    self.store
                        .set_status(job_ref, JobStatus::Completed, None, Some(artifacts))?;
                    report.completed += 1;
                }
                Err(e) => {
                    error!("Failed '{}': {}", job.title, e);
                    self.store
                        .set_status(job_ref, JobStatus::Failed, Some(e.to_string()), None)?;
                    report.failed += 1;
                }
            }

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("done");
        }

        report.remaining = self.store.pending_count();
        info!(
            "Processed {} videos in {:.1}s ({} completed, {} failed), {} still pending",
            report.processed,
            started.elapsed().as_secs_f64(),
            report.completed,
            report.failed,
            report.remaining
        );
        Ok(report)
    }
}
