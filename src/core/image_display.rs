/*
 * Describes what a column's image area should show, given its resolved path, its
 * cached image list and local index, and the globally focused filename. The
 * renderer only has to map each variant to pixels or a message.
 */
use super::column_state::ColumnState;
use super::directory_tree::DirectoryTree;
use super::path_resolver::{NodeRef, resolve};
use super::path_template::join_segments;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDisplay {
    Image {
        path: String,
        filename: String,
        companion_document: Option<String>,
    },
    /* The focused filename does not exist in this column's directory. */
    NotFoundHere { filename: Option<String> },
    NoImages,
    InvalidPath,
    SelectFullPath,
}

impl ImageDisplay {
    pub fn describe(
        column: &ColumnState,
        tree: &DirectoryTree,
        focused_filename: Option<&str>,
    ) -> ImageDisplay {
        let resolution = resolve(tree, column.path_template(), column.selections());
        if !resolution.valid {
            return ImageDisplay::InvalidPath;
        }
        let Some(NodeRef::Directory(dir)) = resolution.node else {
            return ImageDisplay::SelectFullPath;
        };
        if column.current_image_files().is_empty() {
            return ImageDisplay::NoImages;
        }
        match column.current_filename() {
            Some(filename) => {
                let mut parts = resolution.resolved_segments.clone();
                let companion_document = dir.companion_document(filename).map(|doc| {
                    let mut doc_parts = parts.clone();
                    doc_parts.push(doc);
                    join_segments(&doc_parts)
                });
                parts.push(filename.to_string());
                ImageDisplay::Image {
                    path: join_segments(&parts),
                    filename: filename.to_string(),
                    companion_document,
                }
            }
            None => ImageDisplay::NotFoundHere {
                filename: focused_filename.map(str::to_string),
            },
        }
    }

    pub fn message(&self) -> String {
        match self {
            ImageDisplay::Image { filename, .. } => filename.clone(),
            ImageDisplay::NotFoundHere { filename } => format!(
                "Image \"{}\" not found here",
                filename.as_deref().unwrap_or("(Unknown)")
            ),
            ImageDisplay::NoImages => "No PNG images found".to_string(),
            ImageDisplay::InvalidPath => "Invalid path/selection".to_string(),
            ImageDisplay::SelectFullPath => "Select full path".to_string(),
        }
    }
}
