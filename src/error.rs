//! The errors that can occur.

use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The possible errors that can occur.
#[derive(Debug, Error)]
pub enum Error {
    /// An error occurred while interacting with the file system.
    #[error("An IO error occurred: {0}")]
    IO(#[from] std::io::Error),
    /// An error occurred while fetching data over HTTP.
    #[error("An error occurred while fetching: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// An error occurred while parsing JSON.
    #[error("An error occurred while parsing JSON: {0}")]
    Serde(#[from] serde_json::Error),
    /// An error occurred while building a progress bar style.
    #[error("An error occurred while building a progress bar: {0}")]
    Template(#[from] indicatif::style::TemplateError),

    /// An error occurred while running a command.
    #[error("Failed to execute command: {0}")]
    Command(String),
    /// An error occurred while fetching a video.
    #[error("Failed to fetch video: {0}")]
    Video(String),
    /// An error occurred manipulating a path.
    #[error("An invalid path was provided: {0}")]
    Path(String),
    /// An error occurred due to missing URL in format.
    #[error("Format {0} has no URL available")]
    MissingUrl(String),
    /// An error occurred due to missing format.
    #[error("No {0} format available for video")]
    MissingFormat(String),
}
