//! Audio and subtitle extraction via external tools.
//!
//! Wraps yt-dlp for audio download and subtitle extraction, and ffmpeg for
//! format normalization.

use crate::error::{ArkivError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Verify an external tool responds to a version probe. Fails fast with a
/// clear diagnostic when the tool is missing.
pub fn ensure_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match std::process::Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(ArkivError::ToolFailed(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ArkivError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(ArkivError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

/// Downloads a video's audio track and saves it as MP3.
///
/// Uses yt-dlp to download and extract audio. If the file already exists,
/// it will be returned without re-downloading.
#[instrument(skip(output_dir), fields(video_id = %video_id))]
pub async fn download_audio(url: &str, video_id: &str, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let target_path = output_dir.join(format!("{}.mp3", video_id));

    if target_path.exists() {
        info!("Using cached audio file");
        return Ok(target_path);
    }

    info!("Downloading audio from {}", url);

    let template = output_dir.join(format!("{}.%(ext)s", video_id));

    let result = Command::new("yt-dlp")
        .arg("--extract-audio")
        .arg("--audio-format").arg("mp3")
        .arg("--audio-quality").arg("0")
        .arg("--output").arg(template.to_str().unwrap_or_default())
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArkivError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(ArkivError::AudioDownload(format!("yt-dlp execution failed: {e}")));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ArkivError::AudioDownload(format!("yt-dlp failed: {stderr}")));
    }

    // yt-dlp may output different formats; find and normalize to mp3
    let downloaded = find_audio_file(output_dir, video_id)?;

    if downloaded != target_path {
        normalize_to_mp3(&downloaded, &target_path).await?;
        let _ = std::fs::remove_file(&downloaded);
    }

    Ok(target_path)
}

/// Locates a downloaded audio file by video ID.
fn find_audio_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    // Common audio formats that yt-dlp may produce
    for ext in &["mp3", "opus", "m4a", "webm", "ogg"] {
        let candidate = dir.join(format!("{}.{}", video_id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    // Fallback: scan directory for matching prefix
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ArkivError::AudioDownload(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(video_id) {
            return Ok(entry.path());
        }
    }

    Err(ArkivError::AudioDownload("Audio file not found after download".into()))
}

/// Converts an audio file to MP3 using ffmpeg.
async fn normalize_to_mp3(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to MP3", source);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(ArkivError::AudioDownload(format!("ffmpeg conversion failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ArkivError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(ArkivError::AudioDownload(format!("ffmpeg error: {e}"))),
    }
}

/// Extract (auto-generated) subtitles for a video as a json3 payload.
///
/// Returns `Ok(None)` when the video has no subtitle track. The
/// intermediate subtitle file is removed after reading.
#[instrument(skip(output_dir), fields(video_id = %video_id))]
pub async fn extract_subtitles(
    video_id: &str,
    language: &str,
    output_dir: &Path,
) -> Result<Option<String>> {
    std::fs::create_dir_all(output_dir)?;

    let url = format!("https://www.youtube.com/watch?v={}", video_id);
    let template = output_dir.join(format!("{}.%(ext)s", video_id));

    let result = Command::new("yt-dlp")
        .arg("--skip-download")
        .arg("--write-subs")
        .arg("--write-auto-subs")
        .arg("--sub-format").arg("json3")
        .arg("--sub-langs").arg(language)
        .arg("--output").arg(template.to_str().unwrap_or_default())
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(&url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArkivError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(ArkivError::Provider(format!("yt-dlp execution failed: {e}")));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ArkivError::Provider(format!("yt-dlp subtitle extraction failed: {stderr}")));
    }

    // yt-dlp writes <id>.<lang>.json3; take any matching subtitle file.
    let subtitle_path = find_subtitle_file(output_dir, video_id);
    let Some(path) = subtitle_path else {
        debug!("No subtitle track for {}", video_id);
        return Ok(None);
    };

    let body = tokio::fs::read_to_string(&path).await?;
    let _ = std::fs::remove_file(&path);

    Ok(Some(body))
}

fn find_subtitle_file(dir: &Path, video_id: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(video_id) && name.ends_with(".json3") {
            return Some(entry.path());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_subtitle_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_subtitle_file(dir.path(), "abc").is_none());

        std::fs::write(dir.path().join("abc.en.json3"), "{}").unwrap();
        std::fs::write(dir.path().join("other.en.json3"), "{}").unwrap();

        let found = find_subtitle_file(dir.path(), "abc").unwrap();
        assert!(found.ends_with("abc.en.json3"));
    }

    #[test]
    fn test_find_audio_file_prefers_known_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vid1.opus"), "x").unwrap();

        let found = find_audio_file(dir.path(), "vid1").unwrap();
        assert!(found.ends_with("vid1.opus"));

        assert!(find_audio_file(dir.path(), "missing").is_err());
    }
}
