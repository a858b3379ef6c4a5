use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tubegrab::error::Result;
use tubegrab::model::{AudioFormat, StreamFormat, VideoInfo};
use tubegrab::transcoder::TranscodeJob;
use tubegrab::{DownloadOptions, Muxer, Pipeline, StreamSource, TrackChoice};

struct StubSource {
    video: VideoInfo,
    downloads: Mutex<Vec<u32>>,
}

impl StreamSource for StubSource {
    async fn fetch_video_info(&self, _video_id: &str) -> Result<VideoInfo> {
        Ok(self.video.clone())
    }

    async fn download_to_file(
        &self,
        format: &StreamFormat,
        dest: &Path,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<()> {
        self.downloads.lock().unwrap().push(format.itag);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, b"stream bytes")?;
        on_progress(12, 12);
        Ok(())
    }
}

struct StubMuxer {
    jobs: Mutex<Vec<TranscodeJob>>,
}

impl Muxer for StubMuxer {
    async fn run(&self, job: &TranscodeJob, on_progress: &mut dyn FnMut(f64)) -> Result<()> {
        self.jobs.lock().unwrap().push(job.clone());
        std::fs::write(&job.output, b"muxed")?;
        on_progress(100.0);
        Ok(())
    }
}

fn stream_format(value: serde_json::Value) -> StreamFormat {
    serde_json::from_value(value).unwrap()
}

fn test_video() -> VideoInfo {
    let audio = |itag: u32| {
        stream_format(serde_json::json!({
            "itag": itag,
            "url": format!("https://example.com/{}", itag),
            "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"",
            "bitrate": 130000,
            "audioQuality": "AUDIO_QUALITY_MEDIUM",
            "audioChannels": 2
        }))
    };
    let video = |itag: u32| {
        stream_format(serde_json::json!({
            "itag": itag,
            "url": format!("https://example.com/{}", itag),
            "mimeType": "video/webm; codecs=\"vp9\"",
            "bitrate": 2000000,
            "width": 1280,
            "height": 720,
            "fps": 30,
            "quality": "hd720"
        }))
    };

    VideoInfo {
        id: "dQw4w9WgXcQ".to_string(),
        title: "Test Video".to_string(),
        duration_secs: 10,
        audio_formats: vec![audio(140), audio(141)],
        video_formats: vec![video(247), video(248)],
    }
}

fn test_options(root: &Path) -> DownloadOptions {
    DownloadOptions {
        url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
        only_audio: false,
        highest_quality: false,
        audio_format: "aac".to_string(),
        container: "mp4".to_string(),
        output_dir: root.join("out").to_string_lossy().into_owned(),
        temp_dir: root.join("tmp").to_string_lossy().into_owned(),
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tubegrab-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn downloads_both_tracks_muxes_once_and_removes_temp_files() {
    let root = scratch_dir("both");
    let video = test_video();

    let source = StubSource {
        video: video.clone(),
        downloads: Mutex::new(Vec::new()),
    };
    let muxer = StubMuxer {
        jobs: Mutex::new(Vec::new()),
    };
    let pipeline = Pipeline::new(source, muxer, test_options(&root));

    let output = pipeline
        .run(&video, TrackChoice::Track(0), TrackChoice::Track(1))
        .await
        .unwrap();

    // One download per selected descriptor, audio first.
    let downloads = pipeline.source().downloads.lock().unwrap().clone();
    assert_eq!(downloads, vec![140, 248]);

    // Exactly one mux run, combining both inputs.
    let jobs = pipeline.muxer().jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.audio_format, AudioFormat::Aac);
    assert_eq!(job.duration_secs, 10);

    let audio_input = job.audio_input.as_ref().unwrap();
    let video_input = job.video_input.as_ref().unwrap();
    assert!(audio_input.ends_with("audio_Test Video.mp4"));
    assert!(video_input.ends_with("video_Test Video.webm"));

    // Temp files removed after the muxer reported completion.
    assert!(!audio_input.exists());
    assert!(!video_input.exists());

    assert!(output.ends_with("Test Video.mp4"));
    assert!(output.exists());

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn audio_only_run_uses_audio_extension_and_no_prefix() {
    let root = scratch_dir("audio");
    let video = test_video();

    let source = StubSource {
        video: video.clone(),
        downloads: Mutex::new(Vec::new()),
    };
    let muxer = StubMuxer {
        jobs: Mutex::new(Vec::new()),
    };
    let mut options = test_options(&root);
    options.audio_format = "mp3".to_string();
    let pipeline = Pipeline::new(source, muxer, options);

    let output = pipeline
        .run(&video, TrackChoice::Track(1), TrackChoice::None)
        .await
        .unwrap();

    let downloads = pipeline.source().downloads.lock().unwrap().clone();
    assert_eq!(downloads, vec![141]);

    let jobs = pipeline.muxer().jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].video_input.is_none());
    let audio_input = jobs[0].audio_input.as_ref().unwrap();
    assert!(audio_input.ends_with("Test Video.mp4"));
    assert!(!audio_input.exists());

    assert!(output.ends_with("Test Video.mp3"));

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn out_of_range_choice_is_an_error() {
    let root = scratch_dir("range");
    let video = test_video();

    let pipeline = Pipeline::new(
        StubSource {
            video: video.clone(),
            downloads: Mutex::new(Vec::new()),
        },
        StubMuxer {
            jobs: Mutex::new(Vec::new()),
        },
        test_options(&root),
    );

    let result = pipeline
        .run(&video, TrackChoice::Track(5), TrackChoice::None)
        .await;
    assert!(result.is_err());

    let _ = std::fs::remove_dir_all(&root);
}
