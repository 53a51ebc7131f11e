//! Photo reference resolution.
//!
//! The field app stores photos either as `Folder/file.jpg` relative to the
//! export root or as a bare file name. Both are looked up inside the
//! workspace; a photo that cannot be found is reported and skipped.

use std::path::{Component, Path, PathBuf};

/// Folders the field app exports photos into, probed in this order.
pub const PHOTO_FOLDERS: [&str; 3] = [
    "Fotos_imovel_Images",
    "Foto_ambiente_Images",
    "Fotos_ambiente_Images",
];

/// Resolves photo references against one workspace root.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    root: PathBuf,
}

impl ImageResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the file behind `reference`, or `None` if it is not in the
    /// workspace. Never fails.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        let rel_path = reference.replace('\\', "/");
        let rel_path = rel_path.trim_start_matches('/');

        if let Some(relative) = workspace_relative(rel_path) {
            let full_path = self.root.join(relative);
            if full_path.is_file() {
                return Some(full_path);
            }
        }

        if let Some(filename) = Path::new(rel_path).file_name() {
            for folder in PHOTO_FOLDERS {
                let candidate = self.root.join(folder).join(filename);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        log::warn!("Image not found in workspace: {}", reference);
        None
    }
}

/// Only plain relative segments are followed; `..` or a drive prefix never
/// leaves the workspace.
fn workspace_relative(rel_path: &str) -> Option<PathBuf> {
    let path = Path::new(rel_path);
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_direct_path_preferred_over_folder_fallback() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Outros")).unwrap();
        fs::create_dir_all(dir.path().join("Fotos_imovel_Images")).unwrap();
        fs::write(dir.path().join("Outros/a.jpg"), b"direct").unwrap();
        fs::write(dir.path().join("Fotos_imovel_Images/a.jpg"), b"fallback").unwrap();

        let resolver = ImageResolver::new(dir.path());
        let found = resolver.resolve("Outros\\a.jpg").unwrap();
        assert_eq!(found, dir.path().join("Outros/a.jpg"));
    }

    #[test]
    fn test_bare_filename_uses_folder_order() {
        let dir = tempdir().unwrap();
        for folder in ["Foto_ambiente_Images", "Fotos_ambiente_Images"] {
            fs::create_dir_all(dir.path().join(folder)).unwrap();
            fs::write(dir.path().join(folder).join("b.jpg"), folder).unwrap();
        }

        let resolver = ImageResolver::new(dir.path());
        let found = resolver.resolve("Pasta_Antiga/b.jpg").unwrap();
        assert_eq!(found, dir.path().join("Foto_ambiente_Images/b.jpg"));
    }

    #[test]
    fn test_missing_and_empty_references() {
        let dir = tempdir().unwrap();
        let resolver = ImageResolver::new(dir.path());
        assert!(resolver.resolve("").is_none());
        assert!(resolver.resolve("nada.jpg").is_none());
    }

    #[test]
    fn test_parent_segments_are_not_followed() {
        let dir = tempdir().unwrap();
        let inner = dir.path().join("ws");
        fs::create_dir_all(&inner).unwrap();
        fs::write(dir.path().join("secret.jpg"), b"x").unwrap();

        let resolver = ImageResolver::new(&inner);
        assert!(resolver.resolve("../secret.jpg").is_none());
    }
}
