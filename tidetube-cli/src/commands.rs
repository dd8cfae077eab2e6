//! CLI command implementations

use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;
use tidetube_core::library::JsonFileStore;
use tidetube_core::video::VideoDetails;
use tidetube_core::{
    FfmpegFrameExtractor, FrameExtractor, PeerVideoPayload, Result, TidetubeConfig, ValidationError,
    VideoId, VideoLibrary, VideoUpload,
};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Publish a local video file
    Upload {
        /// Path to an .mp4, .webm or .ogv file
        file: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        author: String,
        /// Tag, repeat for up to three
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
    },
    /// Import a video exported by a peer
    Import {
        /// Peer payload JSON file
        payload: PathBuf,
    },
    /// Remove a video and its artifacts
    Remove { id: VideoId },
    /// List all videos
    List,
    /// Show the client view of a video
    Show { id: VideoId },
    /// Print the peer export payload of an owned video
    Export {
        id: VideoId,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the magnet link of a video
    Magnet { id: VideoId },
    /// Print the duration of a media file in whole seconds
    Probe { file: PathBuf },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(config: TidetubeConfig, command: Commands) -> Result<()> {
    let config = Arc::new(config);
    let extractor: Arc<dyn FrameExtractor> = Arc::new(FfmpegFrameExtractor::new());

    match command {
        Commands::Upload {
            file,
            name,
            description,
            author,
            tags,
        } => {
            let library = open_library(&config, &extractor).await?;
            upload_video(
                &library,
                extractor.as_ref(),
                file,
                name,
                description,
                author,
                tags,
            )
            .await
        }
        Commands::Import { payload } => {
            let library = open_library(&config, &extractor).await?;
            import_video(&library, payload).await
        }
        Commands::Remove { id } => {
            let video = open_library(&config, &extractor).await?.remove(id).await?;
            println!("Removed {} ({})", video.id, video.name);
            Ok(())
        }
        Commands::List => list_videos(&open_library(&config, &extractor).await?).await,
        Commands::Show { id } => {
            let library = open_library(&config, &extractor).await?;
            print_json(&library.client_view(id).await?)
        }
        Commands::Export { id, output } => {
            let library = open_library(&config, &extractor).await?;
            export_video(&library, id, output).await
        }
        Commands::Magnet { id } => {
            let library = open_library(&config, &extractor).await?;
            println!("{}", library.magnet(id).await?);
            Ok(())
        }
        Commands::Probe { file } => {
            let duration = extractor.probe_duration(&file).await?;
            println!("{duration}");
            Ok(())
        }
    }
}

/// Opens the video manifest; only commands that touch records call this.
///
/// # Errors
/// - `TidetubeError::Store` - Manifest unreadable or corrupt
async fn open_library(
    config: &Arc<TidetubeConfig>,
    extractor: &Arc<dyn FrameExtractor>,
) -> Result<VideoLibrary<JsonFileStore>> {
    let store = JsonFileStore::open(
        &config.storage.manifest_path,
        config.storage.temp_file_suffix,
    )
    .await?;
    Ok(VideoLibrary::new(
        Arc::clone(config),
        Arc::clone(extractor),
        store,
    ))
}

/// Probe the duration, then publish the file.
///
/// # Errors
/// - `TidetubeError::Media` - Duration could not be probed
/// - `TidetubeError::Validation` - Details violate a constraint
/// - `TidetubeError::Artifact` - Artifact generation failed
async fn upload_video(
    library: &VideoLibrary<JsonFileStore>,
    extractor: &dyn FrameExtractor,
    file: PathBuf,
    name: String,
    description: String,
    author: String,
    tags: Vec<String>,
) -> Result<()> {
    let duration = extractor.probe_duration(&file).await?;
    println!("Publishing {} ({duration}s)", file.display());

    let video = library
        .publish(VideoUpload {
            source: file,
            details: VideoDetails {
                name,
                description,
                author,
                duration,
                tags: tags.into_iter().collect(),
            },
        })
        .await?;

    println!("Published video: {}", video.id);
    if let Some(info_hash) = &video.info_hash {
        println!("  Info hash: {info_hash}");
    }
    Ok(())
}

/// Import a peer payload from a JSON file.
///
/// # Errors
/// - `TidetubeError::Io` - Payload file unreadable
/// - `TidetubeError::Validation` - Payload malformed or invalid
async fn import_video(library: &VideoLibrary<JsonFileStore>, payload: PathBuf) -> Result<()> {
    let bytes = tokio::fs::read(&payload).await?;
    let payload: PeerVideoPayload = serde_json::from_slice(&bytes)
        .map_err(|e| ValidationError::new("payload", e.to_string()))?;

    let video = library.import_remote(payload).await?;
    println!(
        "Imported remote video {} from {}",
        video.id,
        video.origin_host().unwrap_or_default()
    );
    Ok(())
}

async fn list_videos(library: &VideoLibrary<JsonFileStore>) -> Result<()> {
    let videos = library.list().await?;
    if videos.is_empty() {
        println!("No videos");
        return Ok(());
    }

    for video in videos {
        let origin = match video.origin_host() {
            Some(host) => format!("remote from {host}"),
            None => "owned".to_string(),
        };
        println!(
            "{}  {:<30}  {:>5}s  {}",
            video.id, video.name, video.duration, origin
        );
    }
    Ok(())
}

/// Export an owned video for peers.
///
/// # Errors
/// - `TidetubeError::ArtifactRead` - Video is remote or thumbnail unreadable
/// - `TidetubeError::Io` - Output file not writable
async fn export_video(
    library: &VideoLibrary<JsonFileStore>,
    id: VideoId,
    output: Option<PathBuf>,
) -> Result<()> {
    let payload = library.export(id).await?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, to_pretty_json(&payload)?).await?;
            println!("Wrote export of {} to {}", id, path.display());
            Ok(())
        }
        None => print_json(&payload),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", to_pretty_json(value)?);
    Ok(())
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use tidetube_core::TidetubeError;

    use super::*;

    #[tokio::test]
    async fn test_probe_does_not_open_manifest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = TidetubeConfig::for_testing(temp_dir.path());
        std::fs::write(&config.storage.manifest_path, b"not json").unwrap();

        let result = handle_command(
            config,
            Commands::Probe {
                file: temp_dir.path().join("missing.mp4"),
            },
        )
        .await;

        assert!(matches!(result, Err(TidetubeError::Media(_))));
    }

    #[tokio::test]
    async fn test_list_reports_corrupt_manifest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = TidetubeConfig::for_testing(temp_dir.path());
        std::fs::write(&config.storage.manifest_path, b"not json").unwrap();

        let result = handle_command(config, Commands::List).await;

        assert!(matches!(result, Err(TidetubeError::Store(_))));
    }

    #[test]
    fn test_pretty_json_output() {
        let json = to_pretty_json(&vec!["a", "b"]).unwrap();
        assert_eq!(json, "[\n  \"a\",\n  \"b\"\n]");
    }
}
