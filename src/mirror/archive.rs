//! Archive extraction
//!
//! Decodes a branch snapshot zip held in memory into the list of files to
//! mirror. Directory markers are dropped and the top-level `{repo}-{branch}/`
//! folder is stripped from every path.

use hyper::body::Bytes;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::http::mime;
use crate::logger;

/// One file extracted from the archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path as recorded in the archive
    pub path: String,
    /// Storage key: `path` without the top-level prefix
    pub name: String,
    pub content: Bytes,
    pub mime_type: &'static str,
}

/// Extract every file entry of `archive`, in archive order
///
/// The whole archive is parsed before any entry is returned; a malformed
/// archive or an unreadable entry fails the extraction as a whole.
pub fn extract(archive: &[u8], prefix: &str) -> Result<Vec<ArchiveEntry>> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let strip = format!("{prefix}/");
    let mut entries = Vec::with_capacity(zip.len());

    for index in 0..zip.len() {
        let mut file = zip.by_index(index)?;
        if file.is_dir() {
            continue;
        }

        let path = file.name().to_string();
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| Error::ArchiveDecodeFailed(format!("{path}: {e}")))?;

        let name = path.strip_prefix(&strip).unwrap_or(&path).to_string();
        let mime_type = mime::classify(&name);
        logger::log_archive_entry(&name, content.len(), mime_type);

        entries.push(ArchiveEntry {
            path,
            name,
            content: Bytes::from(content),
            mime_type,
        });
    }

    Ok(entries)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Build a zip in memory; names ending in `/` become directory entries
    pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
            } else {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(content).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_strips_prefix_and_skips_directories() {
        let zip = build_zip(&[
            ("repo-main/", b""),
            ("repo-main/a.txt", b"alpha"),
            ("repo-main/dir/b.png", b"\x89PNG"),
        ]);

        let entries = extract(&zip, "repo-main").unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "dir/b.png"]);

        assert_eq!(entries[0].path, "repo-main/a.txt");
        assert_eq!(entries[0].content, Bytes::from_static(b"alpha"));
        assert_eq!(entries[0].mime_type, "text/plain");
        assert_eq!(entries[1].mime_type, "image/png");
    }

    #[test]
    fn test_nested_directories_excluded() {
        let zip = build_zip(&[
            ("dots-main/", b""),
            ("dots-main/.config/", b""),
            ("dots-main/.config/hypr/", b""),
            ("dots-main/.config/hypr/hyprland.conf", b"monitor=,preferred,auto,1"),
            ("dots-main/install.sh", b"#!/bin/bash\n"),
        ]);

        let entries = extract(&zip, "dots-main").unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".config/hypr/hyprland.conf", "install.sh"]);
        assert_eq!(entries[1].mime_type, "application/x-sh");
    }

    #[test]
    fn test_empty_file_is_kept() {
        let zip = build_zip(&[("repo-main/", b""), ("repo-main/.keep", b"")]);
        let entries = extract(&zip, "repo-main").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, ".keep");
        assert!(entries[0].content.is_empty());
    }

    #[test]
    fn test_foreign_prefix_left_untouched() {
        let zip = build_zip(&[("other-dev/x.json", b"{}"), ("repo-main/y.css", b"")]);
        let entries = extract(&zip, "repo-main").unwrap();
        assert_eq!(entries[0].name, "other-dev/x.json");
        assert_eq!(entries[1].name, "y.css");
    }

    #[test]
    fn test_prefix_only_stripped_once() {
        let zip = build_zip(&[("repo-main/repo-main/z.txt", b"z")]);
        let entries = extract(&zip, "repo-main").unwrap();
        assert_eq!(entries[0].name, "repo-main/z.txt");
    }

    #[test]
    fn test_corrupt_entry_fails_extraction() {
        let content = b"set -g mouse on # tmux";
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                "dots-main/.tmux.conf",
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored),
            )
            .unwrap();
        writer.write_all(content).unwrap();
        let mut zip = writer.finish().unwrap().into_inner();

        // Flip one stored byte so the entry no longer matches its CRC
        let offset = zip
            .windows(content.len())
            .position(|window| window == content)
            .unwrap();
        zip[offset] ^= 0xff;

        let err = extract(&zip, "dots-main").unwrap_err();
        match err {
            Error::ArchiveDecodeFailed(reason) => assert!(reason.contains(".tmux.conf")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_archive() {
        let err = extract(b"definitely not a zip", "repo-main").unwrap_err();
        assert!(matches!(err, Error::ArchiveDecodeFailed(_)));
    }
}
