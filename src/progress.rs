//! Progress bars for downloads and transcoding.

use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// Creates a byte-count bar for a stream download, starting at zero.
pub fn download_bar(label: impl Into<String>) -> Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        )?
        .progress_chars("#>-"),
    );
    bar.set_message(label.into());
    Ok(bar)
}

/// Creates a percentage bar for a transcode run, starting at 0%.
pub fn transcode_bar(label: impl Into<String>) -> Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg}\n[{wide_bar:.cyan/blue}] {percent}%")?
            .progress_chars("#>-"),
    );
    bar.set_message(label.into());
    Ok(bar)
}

/// Redraws a percentage bar in place, clamping to `[0, 100]`.
pub fn set_percent(bar: &ProgressBar, percent: f64) {
    let clamped = percent.clamp(0.0, 100.0);
    bar.set_position(clamped.round() as u64);
}
