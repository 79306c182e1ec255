use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::caption::{burn_captions, CaptionStyle, CaptionTrack, Transcriber};
use crate::error::{ClipstormError, Result};
use crate::media::{
    check_ffmpeg, check_ffprobe, concat_with_body, cut_clip, finalize_single, merge_audio,
    trim_voiceover, MediaAsset, TrimmedVoiceover,
};
use crate::name::sanitize;

/// One batch of compositions: the full (hook x voice-over x body) matrix.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub prefix: String,
    pub hooks: Vec<MediaAsset>,
    pub voiceovers: Vec<MediaAsset>,
    /// Empty means every composition is hook+voice-over only.
    pub bodies: Vec<MediaAsset>,
    pub captions: bool,
    pub concurrency: usize,
    /// Directory the timestamped batch directory is created under.
    pub output_root: PathBuf,
    pub show_progress: bool,
}

/// One cell of the job matrix.
#[derive(Debug, Clone)]
pub struct CompositionJob {
    pub index: usize,
    pub hook: MediaAsset,
    pub voiceover: MediaAsset,
    pub body: Option<MediaAsset>,
    /// Deterministic output file name, derived from the sanitized prefix and
    /// asset names.
    pub output_name: String,
}

/// Terminal state of a single job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Exported(PathBuf),
    /// Planned omission (hook shorter than the voice-over), with its warning.
    Skipped(String),
    /// A stage failed; the rest of the batch is unaffected.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub output_name: String,
    pub outcome: JobOutcome,
}

/// Everything a caller needs to know about a finished batch: every exported
/// path, every per-job outcome, every warning. Nothing is swallowed.
#[derive(Debug)]
pub struct BatchReport {
    pub batch_dir: PathBuf,
    pub exported: Vec<PathBuf>,
    pub records: Vec<JobRecord>,
    pub warnings: Vec<String>,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Failed(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Skipped(_)))
            .count()
    }
}

/// Stage-execution seam. The production implementation shells out to
/// ffmpeg; tests substitute a mock to drive the matrix without media files.
#[async_trait]
pub trait Composer: Send + Sync {
    /// Checked once before any batch work starts.
    fn preflight(&self) -> Result<()> {
        Ok(())
    }

    /// Trim endpoint silence from one voice-over upload. Called exactly once
    /// per distinct upload, never per job.
    async fn prepare_voiceover(
        &self,
        voiceover: &MediaAsset,
        shared_dir: &Path,
    ) -> Result<TrimmedVoiceover>;

    /// Transcribe one trimmed voice-over. Called exactly once per distinct
    /// upload, only when captions are requested.
    async fn transcribe_voiceover(&self, voice: &TrimmedVoiceover) -> Result<CaptionTrack>;

    /// Run one job through cut -> merge -> [caption] -> [concat|finalize],
    /// writing the finished render to `output`.
    async fn compose(
        &self,
        job: &CompositionJob,
        voice: &TrimmedVoiceover,
        captions: Option<&CaptionTrack>,
        work_dir: &Path,
        output: &Path,
    ) -> Result<()>;
}

/// Production composer: every stage is an ffmpeg invocation, transcription
/// goes through the configured `Transcriber`.
pub struct FfmpegComposer {
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl FfmpegComposer {
    pub fn new(transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self { transcriber }
    }
}

#[async_trait]
impl Composer for FfmpegComposer {
    fn preflight(&self) -> Result<()> {
        check_ffmpeg()?;
        check_ffprobe()
    }

    async fn prepare_voiceover(
        &self,
        voiceover: &MediaAsset,
        shared_dir: &Path,
    ) -> Result<TrimmedVoiceover> {
        trim_voiceover(voiceover, shared_dir).await
    }

    async fn transcribe_voiceover(&self, voice: &TrimmedVoiceover) -> Result<CaptionTrack> {
        let transcriber = self.transcriber.as_ref().ok_or_else(|| {
            ClipstormError::Config("Captions requested but no transcriber configured".to_string())
        })?;
        let segments = transcriber.transcribe(&voice.path).await?;
        Ok(CaptionTrack::from_segments(segments))
    }

    async fn compose(
        &self,
        job: &CompositionJob,
        voice: &TrimmedVoiceover,
        captions: Option<&CaptionTrack>,
        work_dir: &Path,
        output: &Path,
    ) -> Result<()> {
        let cut = work_dir.join("cut.mp4");
        cut_clip(&job.hook.path, voice.duration, &cut).await?;

        let merged = work_dir.join("merged.mp4");
        merge_audio(&cut, &voice.path, &merged).await?;

        let mut current = merged;
        if let Some(track) = captions {
            if !track.is_empty() {
                let captioned = work_dir.join("captioned.mp4");
                let style = CaptionStyle::for_height(job.hook.height);
                burn_captions(&current, track, style, work_dir, &captioned).await?;
                current = captioned;
            }
        }

        match &job.body {
            Some(body) => concat_with_body(&current, &body.path, work_dir, output).await?,
            None => {
                finalize_single(&current, work_dir, output).await?;
            }
        }
        Ok(())
    }
}

/// Enumerate the full cross-product as discrete jobs with deterministic
/// output names.
pub fn enumerate_jobs(request: &BatchRequest) -> Vec<CompositionJob> {
    let prefix = sanitize(&request.prefix);
    let mut jobs = Vec::new();

    for hook in &request.hooks {
        for voiceover in &request.voiceovers {
            if request.bodies.is_empty() {
                let output_name = format!("{}_{}_{}.mp4", prefix, hook.name, voiceover.name);
                jobs.push(CompositionJob {
                    index: jobs.len(),
                    hook: hook.clone(),
                    voiceover: voiceover.clone(),
                    body: None,
                    output_name,
                });
            } else {
                for body in &request.bodies {
                    let output_name = format!(
                        "{}_{}_{}_{}.mp4",
                        prefix, hook.name, voiceover.name, body.name
                    );
                    jobs.push(CompositionJob {
                        index: jobs.len(),
                        hook: hook.clone(),
                        voiceover: voiceover.clone(),
                        body: Some(body.clone()),
                        output_name,
                    });
                }
            }
        }
    }

    jobs
}

/// Distinct input combinations that map to the same output name overwrite
/// each other; surface that as a warning instead of deduplicating.
fn collision_warnings(jobs: &[CompositionJob]) -> Vec<String> {
    let mut by_name: HashMap<&str, Vec<String>> = HashMap::new();
    for job in jobs {
        let sources = format!(
            "{} + {}{}",
            job.hook.original_name,
            job.voiceover.original_name,
            job.body
                .as_ref()
                .map(|b| format!(" + {}", b.original_name))
                .unwrap_or_default()
        );
        by_name.entry(&job.output_name).or_default().push(sources);
    }

    let mut warnings = Vec::new();
    for (name, sources) in by_name {
        let distinct: HashSet<&String> = sources.iter().collect();
        if distinct.len() > 1 {
            warnings.push(format!(
                "Output name collision: {} is produced by {} input combinations; later renders overwrite earlier ones",
                name,
                distinct.len()
            ));
        }
    }
    warnings.sort();
    warnings
}

fn validate(request: &BatchRequest) -> Result<()> {
    if sanitize(&request.prefix).is_empty() {
        return Err(ClipstormError::MissingInput(
            "Output prefix is required".to_string(),
        ));
    }
    if request.hooks.is_empty() {
        return Err(ClipstormError::MissingInput(
            "At least one hook clip is required".to_string(),
        ));
    }
    if request.voiceovers.is_empty() {
        return Err(ClipstormError::MissingInput(
            "At least one voice-over is required".to_string(),
        ));
    }
    if request.concurrency == 0 {
        return Err(ClipstormError::Config(
            "Concurrency must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn batch_dir_name(prefix: &str, captions: bool) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    if captions {
        format!("{}_captions_{}", sanitize(prefix), timestamp)
    } else {
        format!("{}_{}", sanitize(prefix), timestamp)
    }
}

/// Per-voiceover artifacts, computed once before dispatch and read-only
/// afterwards.
struct VoiceArtifacts {
    trimmed: TrimmedVoiceover,
    captions: Option<CaptionTrack>,
}

/// Run a whole batch: validate, precompute per-voiceover artifacts,
/// enumerate the matrix, and drive jobs through a bounded worker pool.
///
/// A failing job is recorded and the batch continues; the report always
/// carries every exported path. `MissingInput` (and a failing preflight) are
/// the only ways out before jobs start.
pub async fn run_batch(
    request: BatchRequest,
    composer: Arc<dyn Composer>,
    cancelled: Arc<AtomicBool>,
) -> Result<BatchReport> {
    let start_time = Instant::now();

    validate(&request)?;
    composer.preflight()?;

    let batch_dir = request.output_root.join(batch_dir_name(&request.prefix, request.captions));
    std::fs::create_dir_all(&batch_dir)?;

    let scratch = TempDir::new()?;
    let shared_dir = scratch.path().join("shared");
    std::fs::create_dir_all(&shared_dir)?;

    let mut warnings: Vec<String> = Vec::new();

    // ═══════════════════════════════════════════════════════════════════════
    // Precompute: trim (and transcribe) each distinct voice-over once
    // ═══════════════════════════════════════════════════════════════════════
    let mut voices: HashMap<PathBuf, VoiceArtifacts> = HashMap::new();
    for voiceover in &request.voiceovers {
        if voices.contains_key(&voiceover.path) {
            continue;
        }
        if cancelled.load(Ordering::Relaxed) {
            return Err(ClipstormError::Transcode("Batch cancelled".to_string()));
        }

        info!("Preparing voice-over {}", voiceover.original_name);
        let trimmed = composer.prepare_voiceover(voiceover, &shared_dir).await?;

        let captions = if request.captions {
            let track = composer.transcribe_voiceover(&trimmed).await?;
            if track.is_empty() {
                warnings.push(format!(
                    "No speech transcribed for {}; captions omitted",
                    voiceover.original_name
                ));
            }
            Some(track)
        } else {
            None
        };

        voices.insert(voiceover.path.clone(), VoiceArtifacts { trimmed, captions });
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Enumerate and dispatch the matrix
    // ═══════════════════════════════════════════════════════════════════════
    let jobs = enumerate_jobs(&request);
    warnings.extend(collision_warnings(&jobs));

    let total = jobs.len();
    info!(
        "Composing {} videos ({} hooks x {} voice-overs x {} bodies) with concurrency {}",
        total,
        request.hooks.len(),
        request.voiceovers.len(),
        request.bodies.len().max(1),
        request.concurrency
    );

    let progress_bar = if request.show_progress {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} videos ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let semaphore = Arc::new(Semaphore::new(request.concurrency));
    let completed = Arc::new(AtomicUsize::new(0));
    let voices = Arc::new(voices);
    let scratch_path = scratch.path().to_path_buf();

    let mut futures = FuturesUnordered::new();
    for job in jobs {
        let sem = semaphore.clone();
        let composer = composer.clone();
        let voices = voices.clone();
        let cancelled = cancelled.clone();
        let completed = completed.clone();
        let pb = progress_bar.clone();
        let batch_dir = batch_dir.clone();
        let scratch_path = scratch_path.clone();

        futures.push(async move {
            let _permit = sem.acquire().await.expect("Semaphore closed");

            let record = run_job(&job, composer, &voices, &cancelled, &scratch_path, &batch_dir).await;

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            debug!("Progress: {done}/{total}");
            if let Some(ref pb) = pb {
                pb.inc(1);
            }

            (job.index, record)
        });
    }

    let mut results: Vec<(usize, JobRecord)> = Vec::with_capacity(total);
    while let Some(result) = futures.next().await {
        results.push(result);
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Batch complete");
    }

    results.sort_by_key(|(index, _)| *index);

    let mut exported = Vec::new();
    let mut records = Vec::new();
    for (_, record) in results {
        match &record.outcome {
            JobOutcome::Exported(path) => exported.push(path.clone()),
            JobOutcome::Skipped(warning) => warnings.push(warning.clone()),
            JobOutcome::Failed(error) => {
                warnings.push(format!("{} failed: {}", record.output_name, error))
            }
        }
        records.push(record);
    }

    info!(
        "Batch finished in {:.1}s: {} exported, {} skipped, {} failed",
        start_time.elapsed().as_secs_f64(),
        exported.len(),
        records
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Skipped(_)))
            .count(),
        records
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Failed(_)))
            .count(),
    );

    Ok(BatchReport {
        batch_dir,
        exported,
        records,
        warnings,
    })
}

async fn run_job(
    job: &CompositionJob,
    composer: Arc<dyn Composer>,
    voices: &HashMap<PathBuf, VoiceArtifacts>,
    cancelled: &AtomicBool,
    scratch_path: &Path,
    batch_dir: &Path,
) -> JobRecord {
    if cancelled.load(Ordering::Relaxed) {
        return JobRecord {
            output_name: job.output_name.clone(),
            outcome: JobOutcome::Skipped(format!("{}: batch cancelled", job.output_name)),
        };
    }

    let artifacts = match voices.get(&job.voiceover.path) {
        Some(a) => a,
        None => {
            return JobRecord {
                output_name: job.output_name.clone(),
                outcome: JobOutcome::Failed("voice-over artifacts missing".to_string()),
            }
        }
    };

    // Skip, never pad: a hook shorter than the narration cannot carry it.
    if job.hook.duration < artifacts.trimmed.duration {
        let warning = format!(
            "Skipping {}: hook {} ({:.1}s) is shorter than voice-over {} ({:.1}s)",
            job.output_name,
            job.hook.original_name,
            job.hook.duration,
            job.voiceover.original_name,
            artifacts.trimmed.duration,
        );
        warn!("{warning}");
        return JobRecord {
            output_name: job.output_name.clone(),
            outcome: JobOutcome::Skipped(warning),
        };
    }

    let work_dir = scratch_path.join(format!("job_{:04}", job.index));
    if let Err(e) = std::fs::create_dir_all(&work_dir) {
        return JobRecord {
            output_name: job.output_name.clone(),
            outcome: JobOutcome::Failed(format!("failed to create work dir: {e}")),
        };
    }

    let output = batch_dir.join(&job.output_name);
    debug!("Composing {}", job.output_name);

    let outcome = match composer
        .compose(job, &artifacts.trimmed, artifacts.captions.as_ref(), &work_dir, &output)
        .await
    {
        Ok(()) if output.exists() => JobOutcome::Exported(output),
        Ok(()) => JobOutcome::Failed(format!(
            "composer reported success but {} does not exist",
            output.display()
        )),
        Err(e) => {
            warn!("Job {} failed: {e}", job.output_name);
            JobOutcome::Failed(e.to_string())
        }
    };

    JobRecord {
        output_name: job.output_name.clone(),
        outcome,
    }
}

/// Print a summary of the batch results.
pub fn print_summary(report: &BatchReport) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                       Batch Composition Complete               ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output dir: {}", report.batch_dir.display());
    println!("  Exported:   {}", report.exported.len());
    println!("  Skipped:    {}", report.skipped_count());
    println!("  Failed:     {}", report.failed_count());
    for path in &report.exported {
        println!("    {}", path.display());
    }
    if !report.warnings.is_empty() {
        println!();
        println!("  Warnings:");
        for warning in &report.warnings {
            println!("    {warning}");
        }
    }
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
