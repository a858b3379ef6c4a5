use clap::Parser;
use log::error;
use tubegrab::{DownloadOptions, download};

#[derive(Parser, Clone)]
#[command(
    name = "tubegrab",
    version,
    about = "Pick and download YouTube audio/video tracks"
)]
pub struct Cli {
    /// URL of the YouTube video
    pub url: Option<String>,

    /// Download only audio, skipping the track prompts
    #[arg(long = "only-audio", short = 'a', action = clap::ArgAction::SetTrue)]
    pub only_audio: bool,

    /// Auto-pick the highest quality for audio and video, skipping the prompts
    #[arg(long = "highest-quality", action = clap::ArgAction::SetTrue)]
    pub highest_quality: bool,

    #[arg(
        long = "audio-format",
        default_value = "mp3",
        value_parser = clap::builder::PossibleValuesParser::new(["mp3", "aac"])
    )]
    pub audio_format: String,

    #[arg(
        long = "container",
        short = 'c',
        default_value = "mp4",
        value_parser = clap::builder::PossibleValuesParser::new(["mkv", "mp4"])
    )]
    pub container: String,

    #[arg(long = "output-dir", short, default_value = "./output")]
    pub output_dir: String,

    #[arg(long = "temp-dir", default_value = "./output/tmp")]
    pub temp_dir: String,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    env_logger::init();
    let args = Cli::parse();

    let Some(url) = args.url else {
        println!("No link provided, use --help for usage");
        return std::process::ExitCode::SUCCESS;
    };

    let options = DownloadOptions {
        url,
        only_audio: args.only_audio,
        highest_quality: args.highest_quality,
        audio_format: args.audio_format,
        container: args.container,
        output_dir: args.output_dir,
        temp_dir: args.temp_dir,
    };

    if let Err(e) = download(options).await {
        error!("An error occurred: {}", e);
        return std::process::ExitCode::FAILURE;
    }

    std::process::ExitCode::SUCCESS
}
