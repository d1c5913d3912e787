//! Media folder scanning

use std::path::Path;
use tracing::{debug, info};

use crate::workflow::{MediaAsset, MediaKind};
use crate::{Error, Result};

/// `.jpg` and `.mp4` files directly inside `folder`, sorted by file name.
///
/// Subdirectories are not searched. Paths are absolute.
pub fn scan_media_folder<P: AsRef<Path>>(folder: P) -> Result<Vec<MediaAsset>> {
    let folder = folder.as_ref();
    let folder = folder
        .canonicalize()
        .map_err(|e| Error::invalid_input(format!("cannot open media folder {}: {}", folder.display(), e)))?;

    let mut assets = Vec::new();
    for entry in std::fs::read_dir(&folder)? {
        let path = entry?.path();
        // Follows symlinks
        if !std::fs::metadata(&path)?.is_file() {
            continue;
        }

        match MediaKind::from_path(&path) {
            Some(kind) => assets.push(MediaAsset::new(path, kind)),
            None => debug!("Skipping {}", path.display()),
        }
    }

    assets.sort_by(|a, b| a.path().file_name().cmp(&b.path().file_name()));
    info!("Found {} media file(s) in {}", assets.len(), folder.display());
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_folder() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("autopost-media-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = temp_folder();
        for name in ["b.mp4", "a.JPG", "c.png", "notes.txt", "d.jpg"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested").join("e.jpg"), b"x").unwrap();

        let assets = scan_media_folder(&dir).unwrap();
        let names: Vec<String> = assets
            .iter()
            .map(|asset| asset.path().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.mp4", "d.jpg"]);

        assert_eq!(assets[0].kind(), MediaKind::Image);
        assert_eq!(assets[1].kind(), MediaKind::Video);
        assert!(assets.iter().all(|asset| asset.path().is_absolute()));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_included() {
        let dir = temp_folder();
        let source = temp_folder();
        fs::write(source.join("clip.mp4"), b"x").unwrap();
        fs::create_dir_all(source.join("album")).unwrap();

        std::os::unix::fs::symlink(source.join("clip.mp4"), dir.join("linked.mp4")).unwrap();
        std::os::unix::fs::symlink(source.join("album"), dir.join("album.jpg")).unwrap();

        let assets = scan_media_folder(&dir).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].path().file_name().unwrap(), "linked.mp4");
        assert_eq!(assets[0].kind(), MediaKind::Video);

        fs::remove_dir_all(&dir).unwrap();
        fs::remove_dir_all(&source).unwrap();
    }

    #[test]
    fn test_empty_folder() {
        let dir = temp_folder();
        assert!(scan_media_folder(&dir).unwrap().is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_folder() {
        let result = scan_media_folder("/nonexistent/media");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
