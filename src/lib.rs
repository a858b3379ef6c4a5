use crate::error::{Error, Result};
use crate::extractor::YoutubeClient;
use crate::model::{AudioFormat, Container, StreamFormat, VideoInfo, sanitize_title};
use crate::selector::TrackSelector;
use crate::transcoder::{Ffmpeg, TranscodeJob};
use log::{debug, info};
use std::path::{Path, PathBuf};

pub mod error;
pub mod extractor;
pub mod model;
pub mod progress;
pub mod selector;
pub mod transcoder;

/// The options for one download run, filled from the CLI.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub url: String,
    pub only_audio: bool,
    pub highest_quality: bool,
    pub audio_format: String,
    pub container: String,
    pub output_dir: String,
    pub temp_dir: String,
}

/// The outcome of one selection session: no track, or an index into the
/// caller-supplied format list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackChoice {
    None,
    Track(usize),
}

impl TrackChoice {
    /// Maps a selector result over a `0: None` sentinel list to a choice.
    fn from_option_index(index: usize) -> Self {
        match index {
            0 => TrackChoice::None,
            n => TrackChoice::Track(n - 1),
        }
    }
}

/// The extraction collaborator as the pipeline sees it.
pub trait StreamSource {
    async fn fetch_video_info(&self, video_id: &str) -> Result<VideoInfo>;

    async fn download_to_file(
        &self,
        format: &StreamFormat,
        dest: &Path,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<()>;
}

impl StreamSource for YoutubeClient {
    async fn fetch_video_info(&self, video_id: &str) -> Result<VideoInfo> {
        YoutubeClient::fetch_video_info(self, video_id).await
    }

    async fn download_to_file(
        &self,
        format: &StreamFormat,
        dest: &Path,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<()> {
        YoutubeClient::download_to_file(self, format, dest, on_progress).await
    }
}

/// The transcoding collaborator as the pipeline sees it.
pub trait Muxer {
    async fn run(&self, job: &TranscodeJob, on_progress: &mut dyn FnMut(f64)) -> Result<()>;
}

impl Muxer for Ffmpeg {
    async fn run(&self, job: &TranscodeJob, on_progress: &mut dyn FnMut(f64)) -> Result<()> {
        Ffmpeg::run(self, job, on_progress).await
    }
}

/// Downloads the chosen tracks of a video and muxes them into one file.
///
/// Steps run strictly sequentially: validate the URL, fetch metadata, prompt
/// for the audio and video tracks, download each chosen stream to the temp
/// directory, drive ffmpeg into the final output, delete the temp files.
pub async fn download(options: DownloadOptions) -> Result<()> {
    let Some(video_id) = extractor::validate_url(&options.url) else {
        println!("Invalid YouTube URL");
        return Ok(());
    };

    let source = YoutubeClient::new();
    let video = source.fetch_video_info(&video_id).await?;
    info!(
        "Found \"{}\": {} audio and {} video formats",
        video.title,
        video.audio_formats.len(),
        video.video_formats.len()
    );

    let (audio, video_track) = choose_tracks(&video, &options).await?;

    if audio == TrackChoice::None && video_track == TrackChoice::None {
        println!("No tracks selected");
        println!("exiting...");
        std::process::exit(0);
    }

    let pipeline = Pipeline::new(source, Ffmpeg::new(), options);
    let output = pipeline.run(&video, audio, video_track).await?;
    println!("Done! Saved to {}", output.display());
    Ok(())
}

/// Resolves the audio and video track choices, either automatically from the
/// flags or by running the interactive selector twice.
async fn choose_tracks(
    video: &VideoInfo,
    options: &DownloadOptions,
) -> Result<(TrackChoice, TrackChoice)> {
    let first = |formats: &[StreamFormat]| {
        if formats.is_empty() {
            TrackChoice::None
        } else {
            TrackChoice::Track(0)
        }
    };

    if options.highest_quality {
        let video_choice = if options.only_audio {
            TrackChoice::None
        } else {
            first(&video.video_formats)
        };
        return Ok((first(&video.audio_formats), video_choice));
    }

    if options.only_audio {
        return Ok((first(&video.audio_formats), TrackChoice::None));
    }

    let mut audio_options = vec!["0: None".to_string()];
    audio_options.extend(
        video
            .audio_formats
            .iter()
            .enumerate()
            .map(|(i, f)| f.audio_label(i)),
    );
    let picked = TrackSelector::new("Select audio track", audio_options)
        .run()
        .await?;
    let audio = TrackChoice::from_option_index(picked);

    let mut video_options = vec!["0: None".to_string()];
    video_options.extend(
        video
            .video_formats
            .iter()
            .enumerate()
            .map(|(i, f)| f.video_label(i)),
    );
    let picked = TrackSelector::new("Select video track", video_options)
        .run()
        .await?;
    let video_choice = TrackChoice::from_option_index(picked);

    Ok((audio, video_choice))
}

/// The download-then-mux pipeline, generic over its collaborators so the
/// end-to-end flow can be exercised with stubs.
pub struct Pipeline<S, M> {
    source: S,
    muxer: M,
    options: DownloadOptions,
}

impl<S: StreamSource, M: Muxer> Pipeline<S, M> {
    pub fn new(source: S, muxer: M, options: DownloadOptions) -> Self {
        Self {
            source,
            muxer,
            options,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn muxer(&self) -> &M {
        &self.muxer
    }

    /// Downloads the chosen stream(s) and muxes them into the output file,
    /// returning its path. Temp files are removed only after the muxer
    /// reports success.
    pub async fn run(
        &self,
        video: &VideoInfo,
        audio: TrackChoice,
        video_track: TrackChoice,
    ) -> Result<PathBuf> {
        let audio_format = self.resolve(&video.audio_formats, audio, "audio")?;
        let video_format = self.resolve(&video.video_formats, video_track, "video")?;
        if audio_format.is_none() && video_format.is_none() {
            return Err(Error::MissingFormat("selected".to_string()));
        }

        let title = sanitize_title(&video.title);
        let both = audio_format.is_some() && video_format.is_some();
        let target_audio: AudioFormat = self.options.audio_format.parse()?;
        let target_container: Container = self.options.container.parse()?;

        let audio_path = match audio_format {
            Some(format) => Some(
                self.fetch_stream(format, &title, if both { "audio_" } else { "" }, "audio")
                    .await?,
            ),
            None => None,
        };
        let video_path = match video_format {
            Some(format) => Some(
                self.fetch_stream(format, &title, if both { "video_" } else { "" }, "video")
                    .await?,
            ),
            None => None,
        };

        let extension = if video_format.is_some() {
            target_container.extension()
        } else {
            target_audio.extension()
        };
        let output = Path::new(&self.options.output_dir).join(format!("{}.{}", title, extension));
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let job = TranscodeJob {
            audio_input: audio_path.clone(),
            video_input: video_path.clone(),
            output: output.clone(),
            audio_format: target_audio,
            duration_secs: video.duration_secs,
        };

        let bar = progress::transcode_bar(format!("Transcoding to {}", output.display()))?;
        self.muxer
            .run(&job, &mut |percent| progress::set_percent(&bar, percent))
            .await?;
        bar.finish();

        for temp in [audio_path, video_path].into_iter().flatten() {
            debug!("removing temp file {:?}", temp);
            tokio::fs::remove_file(&temp).await?;
        }

        Ok(output)
    }

    fn resolve<'a>(
        &self,
        formats: &'a [StreamFormat],
        choice: TrackChoice,
        kind: &str,
    ) -> Result<Option<&'a StreamFormat>> {
        match choice {
            TrackChoice::None => Ok(None),
            TrackChoice::Track(index) => formats
                .get(index)
                .map(Some)
                .ok_or(Error::MissingFormat(kind.to_string())),
        }
    }

    async fn fetch_stream(
        &self,
        format: &StreamFormat,
        title: &str,
        prefix: &str,
        kind: &str,
    ) -> Result<PathBuf> {
        let dest = Path::new(&self.options.temp_dir)
            .join(format!("{}{}.{}", prefix, title, format.container()));

        let bar = progress::download_bar(format!("Downloading {} track", kind))?;
        self.source
            .download_to_file(format, &dest, &mut |downloaded, total| {
                bar.set_length(total);
                bar.set_position(downloaded);
            })
            .await?;
        bar.finish();

        Ok(dest)
    }
}
