//! Driving ffmpeg to mux or re-encode downloaded streams.

use crate::error::{Error, Result};
use crate::model::AudioFormat;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// One transcoding run: at least one input, one output.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub audio_input: Option<PathBuf>,
    pub video_input: Option<PathBuf>,
    pub output: PathBuf,
    pub audio_format: AudioFormat,
    /// The source duration, used to turn ffmpeg's progress clock into a
    /// percentage. Zero disables percent reporting.
    pub duration_secs: u64,
}

/// The transcoding collaborator, a black-box command runner around ffmpeg.
pub struct Ffmpeg {
    executable: PathBuf,
}

impl Ffmpeg {
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("ffmpeg"),
        }
    }

    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Runs the job, emitting percent progress parsed from ffmpeg's
    /// `-progress` output.
    ///
    /// # Errors
    ///
    /// This function will return an error if ffmpeg cannot be spawned or
    /// exits with a non-zero status. A failed run is a hard failure, the
    /// caller must not continue to cleanup as if it succeeded.
    pub async fn run(&self, job: &TranscodeJob, on_progress: &mut dyn FnMut(f64)) -> Result<()> {
        let args = build_args(job)?;
        debug!("running {:?} with args {:?}", self.executable, args);

        let mut command = Command::new(&self.executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Command("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Command("Failed to capture stderr".to_string()))?;

        // Collect stderr on the side so a chatty encoder cannot block.
        let stderr_task = tokio::spawn(async move {
            let mut buffer = Vec::new();
            let _ = tokio::io::copy(&mut BufReader::new(stderr), &mut buffer).await;
            String::from_utf8_lossy(&buffer).into_owned()
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(percent) = percent_from_progress_line(&line, job.duration_secs) {
                on_progress(percent);
            }
        }

        let status = child.wait().await?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return Err(Error::Command(format!(
                "ffmpeg exited with code {}: {}",
                code,
                stderr_output.trim()
            )));
        }

        on_progress(100.0);
        Ok(())
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new()
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or(Error::Path(format!("Invalid path: {:?}", path)))
}

/// Builds the ffmpeg argument list for a job.
///
/// Both inputs mux into the output container with the video stream copied;
/// an audio-only job re-encodes to the target codec.
fn build_args(job: &TranscodeJob) -> Result<Vec<String>> {
    let output = path_str(&job.output)?;
    let codec = job.audio_format.codec();

    let args: Vec<&str> = match (job.audio_input.as_deref(), job.video_input.as_deref()) {
        (Some(audio), Some(video)) => vec![
            "-y",
            "-i",
            path_str(audio)?,
            "-i",
            path_str(video)?,
            "-c:v",
            "copy",
            "-c:a",
            codec,
            "-progress",
            "pipe:1",
            "-nostats",
            output,
        ],
        (Some(audio), None) => vec![
            "-y",
            "-i",
            path_str(audio)?,
            "-vn",
            "-c:a",
            codec,
            "-b:a",
            "192k",
            "-progress",
            "pipe:1",
            "-nostats",
            output,
        ],
        (None, Some(video)) => vec![
            "-y",
            "-i",
            path_str(video)?,
            "-an",
            "-c:v",
            "copy",
            "-progress",
            "pipe:1",
            "-nostats",
            output,
        ],
        (None, None) => {
            return Err(Error::Command("Transcode job has no inputs".to_string()));
        }
    };

    Ok(args.into_iter().map(String::from).collect())
}

/// Parses one line of ffmpeg `-progress` output into a percentage.
///
/// Despite the name, `out_time_ms` is in microseconds.
fn percent_from_progress_line(line: &str, duration_secs: u64) -> Option<f64> {
    let value = line.strip_prefix("out_time_ms=")?;
    if duration_secs == 0 {
        return None;
    }
    let micros: u64 = value.trim().parse().ok()?;
    Some(micros as f64 / (duration_secs as f64 * 1_000_000.0) * 100.0)
}
