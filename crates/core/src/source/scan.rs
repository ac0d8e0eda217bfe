//! Backlog scan of the input tree.

use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::error::SourceError;
use super::types::{Origin, WatchedPath};

/// Walks `input_dir` recursively and returns every regular file in it.
///
/// A missing root is created and yields an empty backlog. Unreadable entries
/// are skipped with a warning. Symlinks are followed. Results are in
/// file-name order within each directory.
pub fn scan_backlog(input_dir: &Path) -> Result<Vec<WatchedPath>, SourceError> {
    if !input_dir.exists() {
        info!("Creating input directory: {}", input_dir.display());
        std::fs::create_dir_all(input_dir).map_err(|source| SourceError::CreateInputDir {
            path: input_dir.to_path_buf(),
            source,
        })?;
        return Ok(Vec::new());
    }
    if !input_dir.is_dir() {
        return Err(SourceError::NotADirectory {
            path: input_dir.to_path_buf(),
        });
    }

    info!("Scanning for existing files in {}", input_dir.display());
    let files = walk_files(input_dir, Origin::Backlog);
    debug!("Backlog scan found {} files", files.len());
    Ok(files)
}

/// Turns one reported arrival into the files it stands for.
///
/// A directory (created or moved into the tree) expands to every file
/// beneath it; a file stands for itself. A path that no longer exists is
/// passed through so the dispatcher can account for it.
pub fn expand_arrival(path: &Path, origin: Origin) -> Vec<WatchedPath> {
    if path.is_dir() {
        walk_files(path, origin)
    } else {
        vec![WatchedPath::new(path, origin)]
    }
}

fn walk_files(root: &Path, origin: Origin) -> Vec<WatchedPath> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| WatchedPath::new(entry.into_path(), origin))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_scan_missing_root_is_created() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input");

        let files = scan_backlog(&input).unwrap();
        assert!(files.is_empty());
        assert!(input.is_dir());
    }

    #[test]
    fn test_scan_finds_nested_files_only() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.mkv"));
        touch(&dir.path().join("show/s01/e01.mp4"));
        touch(&dir.path().join("music/album/01.flac"));
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();

        let mut paths: Vec<PathBuf> = scan_backlog(dir.path())
            .unwrap()
            .into_iter()
            .map(|w| {
                assert_eq!(w.origin, Origin::Backlog);
                w.path
            })
            .collect();
        paths.sort();

        assert_eq!(
            paths,
            vec![
                dir.path().join("a.mkv"),
                dir.path().join("music/album/01.flac"),
                dir.path().join("show/s01/e01.mp4"),
            ]
        );
    }

    #[test]
    fn test_scan_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("input");
        std::fs::write(&file, b"").unwrap();

        let err = scan_backlog(&file).unwrap_err();
        assert!(matches!(err, SourceError::NotADirectory { .. }));
    }

    #[test]
    fn test_expand_directory_arrival() {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("album");
        touch(&album.join("01.flac"));
        touch(&album.join("02.flac"));

        let files = expand_arrival(&album, Origin::Live);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|w| w.origin == Origin::Live));
    }

    #[test]
    fn test_expand_file_and_missing_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("one.mkv");
        touch(&file);

        assert_eq!(expand_arrival(&file, Origin::Live)[0].path, file);

        let gone = dir.path().join("gone.mkv");
        assert_eq!(expand_arrival(&gone, Origin::Live)[0].path, gone);
    }
}
