use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Expands directory arguments into the test files they contain.
///
/// Files are kept as given, even when they do not exist, so that the loader
/// reports them. Each directory is replaced in place by its matching files,
/// found recursively and sorted for a deterministic order.
pub fn expand_paths(paths: &[PathBuf], extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(discover_test_files(path, extensions));
        } else {
            files.push(path.clone());
        }
    }
    files
}

/// Recursively finds files under `root` whose extension is in `extensions`.
pub fn discover_test_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), extensions))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_are_kept() {
        let paths = vec![PathBuf::from("does/not/exist.yaml")];
        assert_eq!(expand_paths(&paths, &["yaml".to_string()]), paths);
    }

    #[test]
    fn matches_extension_exactly() {
        let exts = vec!["yaml".to_string(), "yml".to_string()];
        assert!(has_extension(Path::new("a/b.yml"), &exts));
        assert!(!has_extension(Path::new("a/b.yaml.bak"), &exts));
        assert!(!has_extension(Path::new("a/yaml"), &exts));
    }
}
