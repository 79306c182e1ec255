use std::path::Path;

use hound::WavReader;
use tracing::{debug, info};

use crate::error::{ClipstormError, Result};

use super::ffmpeg::{require_exists, require_output, run_ffmpeg};
use super::{MediaAsset, TrimmedVoiceover};

/// Silence threshold relative to the track's peak loudness.
const THRESHOLD_BELOW_PEAK_DB: f32 = 20.0;

/// Minimum run of loud frames that counts as a nonsilent interval.
const MIN_RUN_MS: u64 = 100;

/// Padding kept around the detected nonsilent span.
const PADDING_SECS: f64 = 0.05;

/// Analysis frame length.
const FRAME_MS: u64 = 10;

/// Endpoint trim window over a voice-over track, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

fn rms_db(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }
    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = s as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();
    let rms = (sum_squares / samples.len() as f64).sqrt();
    if rms <= 0.0 {
        f32::NEG_INFINITY
    } else {
        (20.0 * rms.log10()) as f32
    }
}

fn peak_db(samples: &[i16]) -> f32 {
    let peak = samples.iter().map(|&s| (s as i32).abs()).max().unwrap_or(0);
    if peak == 0 {
        f32::NEG_INFINITY
    } else {
        (20.0 * (peak as f64 / i16::MAX as f64).log10()) as f32
    }
}

/// Locate the span of audible content in a decoded track.
///
/// The threshold tracks the recording itself (peak loudness minus 20 dB), so
/// a quiet voice memo and a hot studio track both trim sensibly. The 100 ms
/// minimum run only serves to find the first and last nonsilent interval;
/// internal pauses are never removed. Returns `None` when the whole track is
/// silence.
pub fn compute_trim_window(samples: &[i16], sample_rate: u32) -> Option<TrimWindow> {
    if samples.is_empty() || sample_rate == 0 {
        return None;
    }

    let peak = peak_db(samples);
    if peak == f32::NEG_INFINITY {
        return None;
    }
    let threshold = peak - THRESHOLD_BELOW_PEAK_DB;

    let frame_len = (sample_rate as u64 * FRAME_MS / 1000).max(1) as usize;
    let min_run = (MIN_RUN_MS / FRAME_MS).max(1) as usize;
    let frame_secs = frame_len as f64 / sample_rate as f64;
    let total_secs = samples.len() as f64 / sample_rate as f64;

    let loud: Vec<bool> = samples
        .chunks(frame_len)
        .map(|frame| rms_db(frame) >= threshold)
        .collect();

    let mut first_start: Option<usize> = None;
    let mut last_end: Option<usize> = None;
    let mut run_start = 0usize;
    let mut in_run = false;

    for (i, &is_loud) in loud.iter().enumerate() {
        if is_loud && !in_run {
            in_run = true;
            run_start = i;
        } else if !is_loud && in_run {
            in_run = false;
            if i - run_start >= min_run {
                first_start.get_or_insert(run_start);
                last_end = Some(i);
            }
        }
    }
    if in_run && loud.len() - run_start >= min_run {
        first_start.get_or_insert(run_start);
        last_end = Some(loud.len());
    }

    let (first, last) = match (first_start, last_end) {
        (Some(f), Some(l)) => (f, l),
        _ => return None,
    };

    let start = (first as f64 * frame_secs - PADDING_SECS).max(0.0);
    let end = (last as f64 * frame_secs + PADDING_SECS).min(total_secs);
    Some(TrimWindow { start, end })
}

fn read_samples(analysis_wav: &Path) -> Result<(Vec<i16>, u32)> {
    let reader = WavReader::open(analysis_wav)
        .map_err(|e| ClipstormError::Transcode(format!("Failed to open WAV file: {e}")))?;
    let spec = reader.spec();
    let sample_rate = spec.sample_rate;

    let samples: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .into_samples::<i16>()
            .map(|s| s.unwrap_or(0))
            .collect(),
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| (s.unwrap_or(0.0) * i16::MAX as f32) as i16)
            .collect(),
    };

    Ok((samples, sample_rate))
}

/// Trim leading/trailing silence from a voice-over upload.
///
/// Called exactly once per distinct voice-over; the result is shared across
/// every job pairing it with a hook or body. A fully-silent track comes back
/// unmodified at its original location.
pub async fn trim_voiceover(asset: &MediaAsset, shared_dir: &Path) -> Result<TrimmedVoiceover> {
    require_exists(&asset.path)?;

    // Decode to a canonical mono WAV for analysis only; the artifact below
    // is cut from the original upload.
    let analysis_wav = shared_dir.join(format!("{}_analysis.wav", asset.name));
    run_ffmpeg(
        "analysis decode",
        [
            "-i".as_ref(),
            asset.path.as_os_str(),
            "-vn".as_ref(),
            "-acodec".as_ref(),
            "pcm_s16le".as_ref(),
            "-ar".as_ref(),
            "16000".as_ref(),
            "-ac".as_ref(),
            "1".as_ref(),
            analysis_wav.as_os_str(),
        ],
    )?;
    require_output(&analysis_wav, "analysis decode")?;

    let (samples, sample_rate) = read_samples(&analysis_wav)?;
    let total_secs = samples.len() as f64 / sample_rate.max(1) as f64;

    let window = match compute_trim_window(&samples, sample_rate) {
        Some(w) => w,
        None => {
            info!(
                "No audible content in {}, keeping original audio",
                asset.original_name
            );
            let duration = if asset.duration > 0.0 { asset.duration } else { total_secs };
            return Ok(TrimmedVoiceover {
                path: asset.path.clone(),
                duration,
            });
        }
    };

    debug!(
        "Trim window for {}: {:.3}s..{:.3}s of {:.3}s",
        asset.original_name, window.start, window.end, total_secs
    );

    let trimmed = shared_dir.join(format!("{}_trimmed.wav", asset.name));
    let start = format!("{:.3}", window.start);
    let dur = format!("{:.3}", window.duration());
    run_ffmpeg(
        "voiceover trim",
        [
            "-ss".as_ref(),
            start.as_ref(),
            "-t".as_ref(),
            dur.as_ref(),
            "-i".as_ref(),
            asset.path.as_os_str(),
            "-vn".as_ref(),
            "-acodec".as_ref(),
            "pcm_s16le".as_ref(),
            "-ar".as_ref(),
            "44100".as_ref(),
            "-ac".as_ref(),
            "2".as_ref(),
            trimmed.as_os_str(),
        ],
    )?;
    require_output(&trimmed, "voiceover trim")?;

    info!(
        "Trimmed {} to {:.2}s (was {:.2}s)",
        asset.original_name,
        window.duration(),
        total_secs
    );

    Ok(TrimmedVoiceover {
        path: trimmed,
        duration: window.duration(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16000;

    fn silence(secs: f64) -> Vec<i16> {
        vec![0i16; (secs * RATE as f64) as usize]
    }

    fn tone(secs: f64, amplitude: i16) -> Vec<i16> {
        (0..(secs * RATE as f64) as usize)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn test_all_silence_returns_none() {
        assert!(compute_trim_window(&silence(2.0), RATE).is_none());
    }

    #[test]
    fn test_empty_returns_none() {
        assert!(compute_trim_window(&[], RATE).is_none());
    }

    #[test]
    fn test_window_trims_endpoints_only() {
        let mut samples = silence(1.0);
        samples.extend(tone(2.0, 8000));
        samples.extend(silence(0.5));
        samples.extend(tone(1.0, 8000));
        samples.extend(silence(1.0));

        let window = compute_trim_window(&samples, RATE).unwrap();
        // Speech spans 1.0..4.5 with an internal pause that must survive.
        assert!((window.start - 0.95).abs() < 0.05, "start={}", window.start);
        assert!((window.end - 4.55).abs() < 0.05, "end={}", window.end);
    }

    #[test]
    fn test_window_never_exceeds_bounds() {
        // Loud from the very first to the very last sample.
        let samples = tone(3.0, 8000);
        let window = compute_trim_window(&samples, RATE).unwrap();
        assert!(window.start >= 0.0);
        assert!(window.end <= 3.0 + 1e-9);
        // Padding is clamped, so the window covers essentially the whole track.
        assert!(window.duration() > 2.9);
    }

    #[test]
    fn test_short_blip_is_ignored() {
        // A 20 ms click inside silence is below the 100 ms minimum run.
        let mut samples = silence(1.0);
        samples.extend(tone(0.02, 8000));
        samples.extend(silence(1.0));
        assert!(compute_trim_window(&samples, RATE).is_none());
    }

    #[test]
    fn test_threshold_is_peak_relative() {
        // Quiet track: a -20dB-from-peak threshold still finds the speech.
        let mut samples = silence(0.5);
        samples.extend(tone(1.0, 500));
        samples.extend(silence(0.5));
        let window = compute_trim_window(&samples, RATE).unwrap();
        assert!((window.start - 0.45).abs() < 0.05);
        assert!((window.end - 1.55).abs() < 0.05);
    }
}
