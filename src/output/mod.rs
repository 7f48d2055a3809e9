//! Playlist rendering and writing.
//!
//! Produces the two output artifacts: an `#EXTM3U` playlist and a pretty
//! JSON document. Rendering is pure; the writer only ever writes the final
//! aggregate, never per-seed partials.

use std::path::Path;

use serde::Serialize;

use crate::config::OutputFormat;
use crate::error_handling::OutputError;
use crate::models::ChannelLink;

#[derive(Serialize)]
struct JsonPlaylist<'a> {
    channels: &'a [ChannelLink],
}

/// Renders an M3U playlist.
///
/// First line `#EXTM3U`, then per link an `#EXTINF` line carrying the name
/// as both `group-title` and `tvg-id`, followed by the URL. Ends with a
/// trailing newline.
pub fn render_m3u(links: &[ChannelLink]) -> String {
    let mut out = String::from("#EXTM3U\n");
    for link in links {
        out.push_str(&format!(
            "#EXTINF:-1 group-title=\"{name}\" tvg-id=\"{name}\",{name}\n{url}\n",
            name = link.name,
            url = link.url,
        ));
    }
    out
}

/// Renders the JSON document: `{"channels": [...]}` with 2-space indentation
/// and a trailing newline.
pub fn render_json(links: &[ChannelLink]) -> String {
    let doc = JsonPlaylist { channels: links };
    // Serialization of these plain structs cannot fail
    let mut out = serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string());
    out.push('\n');
    out
}

/// Writes the aggregate playlist in the selected format.
pub fn write_playlist(
    path: &Path,
    format: OutputFormat,
    links: &[ChannelLink],
) -> Result<(), OutputError> {
    let rendered = match format {
        OutputFormat::M3u => render_m3u(links),
        OutputFormat::Json => render_json(links),
    };
    std::fs::write(path, rendered).map_err(|source| OutputError::Write {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Wrote {} channel(s) to {}", links.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Vec<ChannelLink> {
        vec![
            ChannelLink {
                name: "Ch1".into(),
                url: "acestream://a".into(),
            },
            ChannelLink {
                name: "Ch2".into(),
                url: "https://cdn.example.com/ch2.m3u8".into(),
            },
        ]
    }

    #[test]
    fn test_render_m3u_exact() {
        let expected = "#EXTM3U\n\
            #EXTINF:-1 group-title=\"Ch1\" tvg-id=\"Ch1\",Ch1\n\
            acestream://a\n\
            #EXTINF:-1 group-title=\"Ch2\" tvg-id=\"Ch2\",Ch2\n\
            https://cdn.example.com/ch2.m3u8\n";
        assert_eq!(render_m3u(&links()), expected);
    }

    #[test]
    fn test_render_m3u_empty() {
        assert_eq!(render_m3u(&[]), "#EXTM3U\n");
    }

    #[test]
    fn test_render_json_exact() {
        let expected = "{\n  \"channels\": [\n    {\n      \"name\": \"Ch1\",\n      \"url\": \"acestream://a\"\n    },\n    {\n      \"name\": \"Ch2\",\n      \"url\": \"https://cdn.example.com/ch2.m3u8\"\n    }\n  ]\n}\n";
        assert_eq!(render_json(&links()), expected);
    }

    #[test]
    fn test_write_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlist.m3u");
        write_playlist(&path, OutputFormat::M3u, &links()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("#EXTM3U\n"));
        assert!(contents.ends_with("\n"));
        assert_eq!(contents.matches("#EXTINF").count(), 2);
    }

    #[test]
    fn test_write_playlist_bad_path() {
        let err = write_playlist(
            Path::new("/nonexistent-dir/playlist.m3u"),
            OutputFormat::Json,
            &links(),
        )
        .unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
    }
}
