//! Stream descriptor planning: maps rendition artifacts to packager inputs.

use af_av::OutputTree;
use af_core::config::AudioTrackConfig;
use af_core::{Renditions, Result, StreamDescriptor};

const AUDIO_OUTPUT: &str = "audio.mp4";
const AUDIO_PLAYLIST: &str = "audio.m3u8";

/// Build the packager descriptor list for a completed rendition set.
///
/// The first descriptor is the audio track, taken from the ladder's audio
/// source rendition. It is followed by one video descriptor per rendition in
/// ladder order. Ensures `output/` exists.
pub fn build_descriptors(
    renditions: &Renditions,
    tree: &OutputTree,
    audio: &AudioTrackConfig,
) -> Result<Vec<StreamDescriptor>> {
    tree.output_dir()?;

    let mut descriptors = Vec::with_capacity(renditions.len() + 1);
    descriptors.push(StreamDescriptor::Audio {
        source: renditions.audio_source().path.clone(),
        output: tree.output_file(AUDIO_OUTPUT),
        playlist_name: AUDIO_PLAYLIST.to_string(),
        group_id: audio.group_id.clone(),
        label: audio.name.clone(),
    });

    for artifact in renditions {
        let stem = format!("h264_{}", artifact.rendition);
        descriptors.push(StreamDescriptor::Video {
            source: artifact.path.clone(),
            output: tree.output_file(&format!("{stem}.mp4")),
            playlist_name: format!("{stem}.m3u8"),
            iframe_playlist_name: format!("{stem}_iframe.m3u8"),
        });
    }

    tracing::debug!(streams = descriptors.len(), "planned packager streams");
    Ok(descriptors)
}
