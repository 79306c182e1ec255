//! End-to-end tests against a real ffmpeg binary.
//!
//! Inputs are synthesized with lavfi sources; every test skips itself when
//! ffmpeg is not installed.

use clipstorm::batch::{run_batch, BatchRequest, FfmpegComposer};
use clipstorm::media::{finalize_single, probe_duration, MediaAsset, MediaKind};

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn run(args: &[&str]) {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .args(args)
        .output()
        .expect("failed to spawn ffmpeg");
    assert!(
        output.status.success(),
        "ffmpeg failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Test pattern video with a sine audio track.
fn gen_video(path: &Path, secs: f64) {
    let video_src = format!("testsrc=duration={secs}:size=160x320:rate=30");
    let audio_src = format!("sine=frequency=440:duration={secs}");
    run(&[
        "-f",
        "lavfi",
        "-i",
        &video_src,
        "-f",
        "lavfi",
        "-i",
        &audio_src,
        "-c:v",
        "libx264",
        "-preset",
        "veryfast",
        "-c:a",
        "aac",
        "-shortest",
        path.to_str().unwrap(),
    ]);
}

/// Sine tone WAV with one second of digital silence at each end.
fn gen_voice(path: &Path, total_secs: f64) {
    let src = format!("sine=frequency=300:duration={total_secs}");
    let mute_edges = format!(
        "volume=enable='between(t,0,1)':volume=0,volume=enable='between(t,{},{})':volume=0",
        total_secs - 1.0,
        total_secs
    );
    run(&[
        "-f",
        "lavfi",
        "-i",
        &src,
        "-af",
        &mute_edges,
        "-ar",
        "44100",
        "-ac",
        "2",
        path.to_str().unwrap(),
    ]);
}

/// Solid tone WAV with no silence to trim.
fn gen_voice_no_silence(path: &Path, secs: f64) {
    let src = format!("sine=frequency=300:duration={secs}");
    run(&[
        "-f", "lavfi", "-i", &src, "-ar", "44100", "-ac", "2",
        path.to_str().unwrap(),
    ]);
}

fn asset(kind: MediaKind, path: &Path) -> MediaAsset {
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    MediaAsset::probed(kind, path.to_path_buf(), &name)
}

fn request(hooks: Vec<MediaAsset>, voices: Vec<MediaAsset>, bodies: Vec<MediaAsset>, root: PathBuf) -> BatchRequest {
    BatchRequest {
        prefix: "demo".to_string(),
        hooks,
        voiceovers: voices,
        bodies,
        captions: false,
        concurrency: 2,
        output_root: root,
        show_progress: false,
    }
}

#[tokio::test]
async fn test_e2e_single_combo_duration_tracks_voiceover() {
    if !ffmpeg_available() {
        eprintln!("Skipping test: FFmpeg not available");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let hook_path = dir.path().join("hook.mp4");
    let voice_path = dir.path().join("voice.wav");
    gen_video(&hook_path, 10.0);
    // 8s raw, ~6s once the silent second at each end is trimmed.
    gen_voice(&voice_path, 8.0);

    let req = request(
        vec![asset(MediaKind::Hook, &hook_path)],
        vec![asset(MediaKind::Voiceover, &voice_path)],
        vec![],
        dir.path().to_path_buf(),
    );

    let composer = Arc::new(FfmpegComposer::new(None));
    let report = run_batch(req, composer, Arc::new(AtomicBool::new(false)))
        .await
        .unwrap();

    assert_eq!(report.exported.len(), 1);
    let out = &report.exported[0];
    assert_eq!(
        out.file_name().unwrap().to_string_lossy(),
        "demo_hook_voice.mp4"
    );

    let duration = probe_duration(out);
    assert!(
        (5.5..=6.8).contains(&duration),
        "expected ~6s output, got {duration}"
    );
}

#[tokio::test]
async fn test_e2e_body_is_appended() {
    if !ffmpeg_available() {
        eprintln!("Skipping test: FFmpeg not available");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let hook_path = dir.path().join("hook.mp4");
    let voice_path = dir.path().join("voice.wav");
    let body_path = dir.path().join("body.mp4");
    gen_video(&hook_path, 10.0);
    gen_voice(&voice_path, 8.0);
    gen_video(&body_path, 5.0);

    let req = request(
        vec![asset(MediaKind::Hook, &hook_path)],
        vec![asset(MediaKind::Voiceover, &voice_path)],
        vec![asset(MediaKind::Body, &body_path)],
        dir.path().to_path_buf(),
    );

    let composer = Arc::new(FfmpegComposer::new(None));
    let report = run_batch(req, composer, Arc::new(AtomicBool::new(false)))
        .await
        .unwrap();

    assert_eq!(report.exported.len(), 1);
    assert_eq!(
        report.exported[0].file_name().unwrap().to_string_lossy(),
        "demo_hook_voice_body.mp4"
    );

    // ~6s overlay + 5s body.
    let duration = probe_duration(&report.exported[0]);
    assert!(
        (10.0..=12.5).contains(&duration),
        "expected ~11s output, got {duration}"
    );
}

#[tokio::test]
async fn test_e2e_short_hook_is_skipped() {
    if !ffmpeg_available() {
        eprintln!("Skipping test: FFmpeg not available");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let hook_path = dir.path().join("hook.mp4");
    let voice_path = dir.path().join("voice.wav");
    gen_video(&hook_path, 3.0);
    gen_voice_no_silence(&voice_path, 6.0);

    let req = request(
        vec![asset(MediaKind::Hook, &hook_path)],
        vec![asset(MediaKind::Voiceover, &voice_path)],
        vec![],
        dir.path().to_path_buf(),
    );

    let composer = Arc::new(FfmpegComposer::new(None));
    let report = run_batch(req, composer, Arc::new(AtomicBool::new(false)))
        .await
        .unwrap();

    assert!(report.exported.is_empty());
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.warnings.len(), 1);
}

#[tokio::test]
async fn test_e2e_finalize_single_preserves_duration() {
    if !ffmpeg_available() {
        eprintln!("Skipping test: FFmpeg not available");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.mp4");
    gen_video(&clip, 4.0);
    let input_duration = probe_duration(&clip);

    let output = dir.path().join("final.mp4");
    finalize_single(&clip, dir.path(), &output).await.unwrap();

    let output_duration = probe_duration(&output);
    assert!(
        (output_duration - input_duration).abs() < 0.5,
        "duration changed: {input_duration} -> {output_duration}"
    );
}
