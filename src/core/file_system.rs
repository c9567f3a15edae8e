use super::directory_tree::{DirectoryTree, is_document_name, is_image_name};
use super::session_state::PROJECT_CONFIG_DIR_NAME;
use ignore::WalkBuilder;
use serde_json::Value;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/*
 * This module produces the static directory tree the gallery browses. The tree either
 * comes from a prebuilt JSON tree document (`load_tree_document`) or from scanning a
 * real image directory (`FileSystemScannerOperations`), which can then be written back
 * out as a tree document (`save_tree_document`).
 */

#[derive(Debug)]
pub enum TreeLoadError {
    Io(io::Error),
    Serde(serde_json::Error),
    IgnoreError(ignore::Error),
    InvalidPath(PathBuf),
    NotAnObject(PathBuf),
}

impl From<io::Error> for TreeLoadError {
    fn from(err: io::Error) -> Self {
        TreeLoadError::Io(err)
    }
}

impl From<serde_json::Error> for TreeLoadError {
    fn from(err: serde_json::Error) -> Self {
        TreeLoadError::Serde(err)
    }
}

impl From<ignore::Error> for TreeLoadError {
    fn from(err: ignore::Error) -> Self {
        TreeLoadError::IgnoreError(err)
    }
}

impl std::fmt::Display for TreeLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeLoadError::Io(e) => write!(f, "I/O error: {e}"),
            TreeLoadError::Serde(e) => write!(f, "Tree document is not valid JSON: {e}"),
            TreeLoadError::IgnoreError(e) => write!(f, "Directory walk error: {e}"),
            TreeLoadError::InvalidPath(p) => write!(f, "Invalid path: {p:?}"),
            TreeLoadError::NotAnObject(p) => {
                write!(f, "Tree document {p:?} does not contain a JSON object")
            }
        }
    }
}

impl std::error::Error for TreeLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeLoadError::Io(e) => Some(e),
            TreeLoadError::Serde(e) => Some(e),
            TreeLoadError::IgnoreError(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TreeLoadError>;

/*
 * Reads a tree document. The top level must be a JSON object; below it, objects are
 * directories and every other value is a leaf file.
 */
pub fn load_tree_document(path: &Path) -> Result<DirectoryTree> {
    log::trace!("TreeLoader: Loading tree document {path:?}");
    let text = fs::read_to_string(path)?;
    let Value::Object(map) = serde_json::from_str::<Value>(&text)? else {
        return Err(TreeLoadError::NotAnObject(path.to_path_buf()));
    };
    let tree = DirectoryTree::from(map);
    let (dirs, images, docs) = tree.statistics();
    log::debug!(
        "TreeLoader: Loaded {path:?} with {dirs} directories, {images} images, {docs} documents."
    );
    Ok(tree)
}

pub fn save_tree_document(path: &Path, tree: &DirectoryTree) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, tree)?;
    log::debug!("TreeLoader: Saved tree document to {path:?}.");
    Ok(())
}

/*
 * Builds a `DirectoryTree` from a directory on disk. Implementations keep every
 * directory, including empty ones, and only the image and document leaf files.
 */
pub trait FileSystemScannerOperations: Send + Sync {
    fn scan_directory(&self, root_path: &Path) -> Result<DirectoryTree>;
}

/*
 * Walks the directory with the `ignore` crate, so hidden entries and anything covered
 * by `.gitignore`/`.ignore` files are skipped. The result is wrapped under the root
 * folder's own name, matching the layout that column path templates start from.
 */
pub struct CoreFileSystemScanner {}

impl CoreFileSystemScanner {
    pub fn new() -> Self {
        CoreFileSystemScanner {}
    }
}

impl Default for CoreFileSystemScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemScannerOperations for CoreFileSystemScanner {
    fn scan_directory(&self, root_path: &Path) -> Result<DirectoryTree> {
        if !root_path.is_dir() {
            return Err(TreeLoadError::InvalidPath(root_path.to_path_buf()));
        }
        let canonical_root = fs::canonicalize(root_path)?;
        let Some(root_name) = canonical_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
        else {
            return Err(TreeLoadError::InvalidPath(root_path.to_path_buf()));
        };
        log::debug!("FileSystemScanner: Scanning {root_path:?} as '{root_name}'.");

        let mut walker_builder = WalkBuilder::new(root_path);
        walker_builder
            .standard_filters(true)
            .parents(false)
            .git_global(false)
            .hidden(true)
            .sort_by_file_path(|a, b| a.cmp(b));

        let mut content = DirectoryTree::new();
        let mut skipped_files = 0usize;

        'walk: for entry_result in walker_builder.build() {
            let entry = entry_result?;
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(root_path) else {
                continue;
            };
            if relative.as_os_str().is_empty() || is_internal_config_path(relative) {
                continue;
            }

            let components: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let Some((leaf, parents)) = components.split_last() else {
                continue;
            };
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            if !is_dir && !is_image_name(leaf) && !is_document_name(leaf) {
                skipped_files += 1;
                continue;
            }

            let mut dir = &mut content;
            for parent in parents {
                dir = match dir.insert_directory(parent) {
                    Some(child) => child,
                    None => {
                        log::warn!("FileSystemScanner: {relative:?} lies below a file; skipped.");
                        continue 'walk;
                    }
                };
            }
            if is_dir {
                if dir.insert_directory(leaf).is_none() {
                    log::warn!("FileSystemScanner: Directory {relative:?} clashes with a file.");
                }
            } else {
                dir.insert_file(leaf);
            }
        }

        let (dirs, images, docs) = content.statistics();
        log::debug!(
            "FileSystemScanner: Found {dirs} directories, {images} images, {docs} documents."
        );
        if skipped_files > 0 {
            log::debug!("FileSystemScanner: Skipped {skipped_files} unrecognized files.");
        }

        let mut tree = DirectoryTree::new();
        tree.insert_subtree(&root_name, content);
        Ok(tree)
    }
}

fn is_internal_config_path(relative_path: &Path) -> bool {
    let config_component = OsStr::new(PROJECT_CONFIG_DIR_NAME);
    relative_path
        .components()
        .any(|component| component.as_os_str() == config_component)
}
