//! The data model for videos and their selectable stream formats.

use crate::error::{Error, Result};
use serde::Deserialize;

/// The player response returned by the innertube `player` endpoint.
///
/// Only the fields this tool needs are modeled; everything else in the
/// response is ignored during deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub video_details: Option<VideoDetails>,
    pub streaming_data: Option<StreamingData>,
}

/// The details of a video.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    /// The length of the video in seconds, sent as a string.
    pub length_seconds: Option<String>,
}

/// The streaming data of a video.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    #[serde(default)]
    pub formats: Vec<StreamFormat>,
    #[serde(default)]
    pub adaptive_formats: Vec<StreamFormat>,
}

/// A single selectable audio-only or video-only stream variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFormat {
    pub itag: u32,
    /// The direct download URL. Cipher-protected formats have none and are
    /// filtered out, signature decryption is out of scope.
    pub url: Option<String>,
    pub mime_type: String,
    pub bitrate: Option<u64>,

    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub quality: Option<String>,

    pub audio_quality: Option<String>,
    pub audio_channels: Option<u32>,

    pub content_length: Option<String>,
}

impl StreamFormat {
    /// Returns true if this is an audio-only format.
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    /// Returns true if this is a video-only format.
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// Returns the container extension derived from the MIME type,
    /// e.g. `"audio/webm; codecs=\"opus\""` -> `"webm"`.
    pub fn container(&self) -> &str {
        self.mime_type
            .split('/')
            .nth(1)
            .and_then(|rest| rest.split(';').next())
            .unwrap_or("bin")
    }

    /// Builds the option label for an audio format, numbered from 1.
    pub fn audio_label(&self, index: usize) -> String {
        format!(
            "{}: audio bitrate: {}; audio quality: {}; audio channels: {}",
            index + 1,
            display_opt(self.bitrate),
            self.audio_quality.as_deref().unwrap_or("unknown"),
            display_opt(self.audio_channels),
        )
    }

    /// Builds the option label for a video format, numbered from 1.
    pub fn video_label(&self, index: usize) -> String {
        format!(
            "{}: video bitrate: {}; width: {}; height: {}; fps: {}; quality: {}",
            index + 1,
            display_opt(self.bitrate),
            display_opt(self.width),
            display_opt(self.height),
            display_opt(self.fps),
            self.quality.as_deref().unwrap_or("unknown"),
        )
    }
}

fn display_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "unknown".to_string(),
    }
}

/// The metadata of a video with its formats partitioned into audio-only and
/// video-only variants.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub duration_secs: u64,
    pub audio_formats: Vec<StreamFormat>,
    pub video_formats: Vec<StreamFormat>,
}

impl VideoInfo {
    /// Builds the video info from a player response.
    ///
    /// # Errors
    ///
    /// This function will return an error if the response carries no video
    /// details or no streaming data.
    pub fn from_player_response(response: PlayerResponse) -> Result<Self> {
        let details = response
            .video_details
            .ok_or(Error::Video("No videoDetails found in response".to_string()))?;
        let streaming = response
            .streaming_data
            .ok_or(Error::Video("No streamingData found in response".to_string()))?;

        let duration_secs = details
            .length_seconds
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let mut audio_formats = Vec::new();
        let mut video_formats = Vec::new();

        for format in streaming.adaptive_formats {
            if format.url.is_none() {
                continue;
            }
            if format.is_audio() {
                audio_formats.push(format);
            } else if format.is_video() {
                video_formats.push(format);
            }
        }

        Ok(Self {
            id: details.video_id,
            title: details.title,
            duration_secs,
            audio_formats,
            video_formats,
        })
    }
}

/// The target audio codec for audio-only output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Aac,
}

impl AudioFormat {
    /// The ffmpeg encoder name.
    pub fn codec(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::Aac => "aac",
        }
    }

    /// The file extension for audio-only output.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Aac => "aac",
        }
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mp3" => Ok(AudioFormat::Mp3),
            "aac" => Ok(AudioFormat::Aac),
            other => Err(Error::Video(format!("Unknown audio format: {}", other))),
        }
    }
}

/// The target container for combined audio and video output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mkv,
    Mp4,
}

impl Container {
    /// The file extension for combined output.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mkv => "mkv",
            Container::Mp4 => "mp4",
        }
    }
}

impl std::str::FromStr for Container {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mkv" => Ok(Container::Mkv),
            "mp4" => Ok(Container::Mp4),
            other => Err(Error::Video(format!("Unknown container: {}", other))),
        }
    }
}

/// Replaces filesystem-unsafe characters in a video title so it can be used
/// as a filename.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_RESPONSE: &str = r#"{
        "videoDetails": {
            "videoId": "dQw4w9WgXcQ",
            "title": "Test: A/B Video?",
            "lengthSeconds": "212",
            "author": "Rick"
        },
        "streamingData": {
            "formats": [],
            "adaptiveFormats": [
                {
                    "itag": 140,
                    "url": "https://example.com/a1",
                    "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"",
                    "bitrate": 130000,
                    "audioQuality": "AUDIO_QUALITY_MEDIUM",
                    "audioChannels": 2,
                    "audioSampleRate": "44100",
                    "contentLength": "3440000"
                },
                {
                    "itag": 251,
                    "mimeType": "audio/webm; codecs=\"opus\"",
                    "bitrate": 160000,
                    "audioQuality": "AUDIO_QUALITY_MEDIUM",
                    "signatureCipher": "s=abc"
                },
                {
                    "itag": 137,
                    "url": "https://example.com/v1",
                    "mimeType": "video/mp4; codecs=\"avc1.640028\"",
                    "bitrate": 4400000,
                    "width": 1920,
                    "height": 1080,
                    "fps": 30,
                    "quality": "hd1080",
                    "qualityLabel": "1080p"
                }
            ]
        }
    }"#;

    fn parse_info() -> VideoInfo {
        let response: PlayerResponse = serde_json::from_str(PLAYER_RESPONSE).unwrap();
        VideoInfo::from_player_response(response).unwrap()
    }

    #[test]
    fn parses_player_response() {
        let info = parse_info();
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.title, "Test: A/B Video?");
        assert_eq!(info.duration_secs, 212);
        assert_eq!(info.audio_formats.len(), 1);
        assert_eq!(info.video_formats.len(), 1);
    }

    #[test]
    fn unmodeled_response_fields_are_ignored() {
        // The fixture carries author, qualityLabel and audioSampleRate,
        // none of which the model keeps.
        let response: PlayerResponse = serde_json::from_str(PLAYER_RESPONSE).unwrap();
        assert!(response.video_details.is_some());
    }

    #[test]
    fn ciphered_formats_are_filtered_out() {
        let info = parse_info();
        assert!(info.audio_formats.iter().all(|f| f.url.is_some()));
    }

    #[test]
    fn audio_label_text() {
        let info = parse_info();
        assert_eq!(
            info.audio_formats[0].audio_label(0),
            "1: audio bitrate: 130000; audio quality: AUDIO_QUALITY_MEDIUM; audio channels: 2"
        );
    }

    #[test]
    fn video_label_text() {
        let info = parse_info();
        assert_eq!(
            info.video_formats[0].video_label(0),
            "1: video bitrate: 4400000; width: 1920; height: 1080; fps: 30; quality: hd1080"
        );
    }

    #[test]
    fn container_from_mime() {
        let info = parse_info();
        assert_eq!(info.audio_formats[0].container(), "mp4");
        assert_eq!(info.video_formats[0].container(), "mp4");
    }

    #[test]
    fn sanitizes_titles() {
        assert_eq!(sanitize_title("Test: A/B Video?"), "Test_ A_B Video_");
        assert_eq!(sanitize_title("  plain title "), "plain title");
    }

    #[test]
    fn missing_streaming_data_is_an_error() {
        let response: PlayerResponse =
            serde_json::from_str(r#"{"videoDetails": {"videoId": "x", "title": "t"}}"#).unwrap();
        assert!(VideoInfo::from_player_response(response).is_err());
    }

    #[test]
    fn format_enums_parse() {
        assert_eq!("mp3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!("aac".parse::<AudioFormat>().unwrap().codec(), "aac");
        assert_eq!("mkv".parse::<Container>().unwrap().extension(), "mkv");
        assert!("avi".parse::<Container>().is_err());
    }
}
