/*
 * Defines the static, precomputed directory tree that every gallery column browses.
 * Directories are nested mappings and files are leaf markers; a leaf's type is
 * carried purely by its name suffix (`.png` images, `.pdf` companion documents).
 *
 * The tree is loaded once (see `file_system`) and never mutated afterwards, so all
 * accessors hand out borrowed views. Entries are kept in a `BTreeMap`, which gives
 * the lexicographic ordering that both dropdown options and image navigation rely on.
 */
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const IMAGE_EXTENSION: &str = "png";
pub const DOCUMENT_EXTENSION: &str = "pdf";

/*
 * Classification of a single directory entry. `Other` covers leaf files whose
 * extension the gallery does not recognize; they are never offered anywhere.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Image,
    Document,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Directory(DirectoryTree),
    File,
}

impl TreeNode {
    pub fn as_directory(&self) -> Option<&DirectoryTree> {
        match self {
            TreeNode::Directory(dir) => Some(dir),
            TreeNode::File => None,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, TreeNode::Directory(_))
    }
}

/*
 * One directory level of the static tree. Deserialization accepts the tree document
 * format directly: any JSON object value becomes a subdirectory, any other value
 * (usually `null`) becomes a leaf file.
 */
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct DirectoryTree {
    entries: BTreeMap<String, TreeNode>,
}

fn has_extension(name: &str, extension: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower
        .strip_suffix(extension)
        .is_some_and(|stem| stem.ends_with('.'))
}

pub fn is_image_name(name: &str) -> bool {
    has_extension(name, IMAGE_EXTENSION)
}

pub fn is_document_name(name: &str) -> bool {
    has_extension(name, DOCUMENT_EXTENSION)
}

impl DirectoryTree {
    pub fn new() -> Self {
        DirectoryTree {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TreeNode> {
        self.entries.get(name)
    }

    pub fn child_directory(&self, name: &str) -> Option<&DirectoryTree> {
        self.entries.get(name).and_then(TreeNode::as_directory)
    }

    /* Entries in lexicographic order, each paired with its classification. */
    pub fn entries(&self) -> impl Iterator<Item = (&str, &TreeNode, EntryKind)> {
        self.entries
            .iter()
            .map(|(name, node)| (name.as_str(), node, Self::classify(name, node)))
    }

    pub fn classify(name: &str, node: &TreeNode) -> EntryKind {
        match node {
            TreeNode::Directory(_) if !is_image_name(name) && !is_document_name(name) => {
                EntryKind::Directory
            }
            _ if is_image_name(name) => EntryKind::Image,
            _ if is_document_name(name) => EntryKind::Document,
            _ => EntryKind::Other,
        }
    }

    /*
     * Names of the selectable sub-levels below this directory: every entry that is
     * itself a directory. Image and document names are never offered as levels, even
     * if a malformed document stored them as objects.
     */
    pub fn subdirectory_names(&self) -> Vec<&str> {
        self.entries()
            .filter(|(_, _, kind)| *kind == EntryKind::Directory)
            .map(|(name, _, _)| name)
            .collect()
    }

    pub fn has_subdirectories(&self) -> bool {
        self.entries()
            .any(|(_, _, kind)| kind == EntryKind::Directory)
    }

    /* Leaf image files, sorted lexicographically. */
    pub fn image_files(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(name, node)| !node.is_directory() && is_image_name(name))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /*
     * Returns the same-stem document leaf for an image (e.g. `f1.png` -> `f1.pdf`)
     * if this directory contains one.
     */
    pub fn companion_document(&self, image_name: &str) -> Option<String> {
        if !is_image_name(image_name) {
            return None;
        }
        let stem = &image_name[..image_name.len() - IMAGE_EXTENSION.len()];
        let candidate = format!("{stem}{DOCUMENT_EXTENSION}");
        match self.entries.get(&candidate) {
            Some(TreeNode::File) => Some(candidate),
            _ => None,
        }
    }

    /*
     * Returns the named subdirectory, creating it when absent. An existing leaf file of
     * that name is left alone and yields `None`.
     */
    pub fn insert_directory(&mut self, name: &str) -> Option<&mut DirectoryTree> {
        match self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| TreeNode::Directory(DirectoryTree::new()))
        {
            TreeNode::Directory(dir) => Some(dir),
            TreeNode::File => None,
        }
    }

    pub fn insert_subtree(&mut self, name: &str, subtree: DirectoryTree) {
        self.entries.insert(name.to_string(), TreeNode::Directory(subtree));
    }

    pub fn insert_file(&mut self, name: &str) {
        self.entries.insert(name.to_string(), TreeNode::File);
    }

    /* Counts (directories, images, documents) over the whole subtree. */
    pub fn statistics(&self) -> (usize, usize, usize) {
        let mut totals = (0, 0, 0);
        for (_, node, kind) in self.entries() {
            match kind {
                EntryKind::Directory => {
                    totals.0 += 1;
                    if let Some(dir) = node.as_directory() {
                        let (d, i, p) = dir.statistics();
                        totals.0 += d;
                        totals.1 += i;
                        totals.2 += p;
                    }
                }
                EntryKind::Image => totals.1 += 1,
                EntryKind::Document => totals.2 += 1,
                EntryKind::Other => {}
            }
        }
        totals
    }
}

impl From<Map<String, Value>> for DirectoryTree {
    fn from(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(name, value)| {
                let node = match value {
                    Value::Object(children) => TreeNode::Directory(DirectoryTree::from(children)),
                    _ => TreeNode::File,
                };
                (name, node)
            })
            .collect();
        DirectoryTree { entries }
    }
}

impl Serialize for DirectoryTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, node) in &self.entries {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TreeNode::Directory(dir) => dir.serialize(serializer),
            TreeNode::File => serializer.serialize_unit(),
        }
    }
}
