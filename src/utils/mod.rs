use std::path::Path;

const VIDEO_MARKERS: &[&str] = &["watch?v=", "youtu.be/"];
const PLAYLIST_MARKER: &str = "list=";
const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

/// Whether the text points at a single video
pub fn has_video_marker(url: &str) -> bool {
    VIDEO_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Whether the text carries a playlist id
pub fn has_playlist_marker(url: &str) -> bool {
    url.contains(PLAYLIST_MARKER)
}

pub fn mentions_youtube(text: &str) -> bool {
    YOUTUBE_HOSTS.iter().any(|host| text.contains(host))
}

/// Lowercased text after the last dot of the file name, if any.
///
/// A leading dot counts, so `.txt` has the extension `txt`.
pub fn file_extension(name: &str) -> Option<String> {
    let file_name = Path::new(name).file_name()?.to_str()?;
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string()
}
