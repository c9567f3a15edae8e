/*
 * Resolves a column's path template plus its dropdown selections against the static
 * directory tree. Literal segments must exist; each `*` consumes the next selection
 * by position. Selections left over once the template is exhausted describe the
 * implicit levels below the typed path (every subdirectory-only level the UI offers
 * a selector for), and are consumed in order as well.
 *
 * Resolution never fails with an error: an unresolvable path is an ordinary
 * `PathResolution` with `valid == false`, and an empty selection at an implicit level
 * yields a valid-but-incomplete resolution without a node.
 */
use super::directory_tree::{DirectoryTree, TreeNode};
use super::path_template::{PathTemplate, Segment};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Directory(&'a DirectoryTree),
    File,
}

impl<'a> From<&'a TreeNode> for NodeRef<'a> {
    fn from(node: &'a TreeNode) -> Self {
        match node {
            TreeNode::Directory(dir) => NodeRef::Directory(dir),
            TreeNode::File => NodeRef::File,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathResolution<'a> {
    /* The node the walk ended on; `None` when invalid or incomplete. */
    pub node: Option<NodeRef<'a>>,
    /* Concrete names for every walked level, literal and selected alike. */
    pub resolved_segments: Vec<String>,
    pub valid: bool,
}

impl<'a> PathResolution<'a> {
    fn invalid(resolved_segments: Vec<String>) -> Self {
        PathResolution {
            node: None,
            resolved_segments,
            valid: false,
        }
    }

    fn incomplete(resolved_segments: Vec<String>) -> Self {
        PathResolution {
            node: None,
            resolved_segments,
            valid: true,
        }
    }

    pub fn directory(&self) -> Option<&'a DirectoryTree> {
        match (self.valid, self.node) {
            (true, Some(NodeRef::Directory(dir))) => Some(dir),
            _ => None,
        }
    }
}

/* One selector level as the renderer would show it. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownLevel {
    pub index: usize,
    pub options: Vec<String>,
    /* The saved selection when it is one of `options`, otherwise `None`. */
    pub selected: Option<String>,
    pub sync_enabled: bool,
}

impl DropdownLevel {
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }

    pub fn current_value(&self) -> &str {
        self.selected.as_deref().unwrap_or("")
    }
}

pub fn resolve<'a>(
    tree: &'a DirectoryTree,
    path_template: &str,
    selections: &[String],
) -> PathResolution<'a> {
    let template = PathTemplate::parse(path_template);
    let mut current = NodeRef::Directory(tree);
    let mut resolved_segments = Vec::new();
    let mut level = 0;

    for segment in template.segments() {
        let NodeRef::Directory(dir) = current else {
            log::trace!("PathResolver: '{path_template}' descends below a file.");
            return PathResolution::invalid(resolved_segments);
        };
        match segment {
            Segment::Literal(name) => match dir.get(name) {
                Some(node) => {
                    current = NodeRef::from(node);
                    resolved_segments.push(name.clone());
                }
                None => {
                    log::trace!("PathResolver: literal '{name}' missing in '{path_template}'.");
                    return PathResolution::invalid(resolved_segments);
                }
            },
            Segment::Wildcard => {
                let selection = selections.get(level).map(String::as_str).unwrap_or("");
                level += 1;
                match dir.child_directory(selection) {
                    Some(child) if !selection.is_empty() => {
                        current = NodeRef::Directory(child);
                        resolved_segments.push(selection.to_string());
                    }
                    _ => {
                        log::trace!(
                            "PathResolver: wildcard level {} lacks usable selection '{selection}'.",
                            level - 1
                        );
                        return PathResolution::invalid(resolved_segments);
                    }
                }
            }
        }
    }

    while level < selections.len() {
        let selection = selections[level].as_str();
        if selection.is_empty() {
            return PathResolution::incomplete(resolved_segments);
        }
        let NodeRef::Directory(dir) = current else {
            return PathResolution::invalid(resolved_segments);
        };
        match dir.child_directory(selection) {
            Some(child) => {
                current = NodeRef::Directory(child);
                resolved_segments.push(selection.to_string());
            }
            None => {
                log::trace!("PathResolver: stale selection '{selection}' at level {level}.");
                return PathResolution::invalid(resolved_segments);
            }
        }
        level += 1;
    }

    PathResolution {
        node: Some(current),
        resolved_segments,
        valid: true,
    }
}

/*
 * True when the template plus every selection, including deep ones, resolves all
 * the way down to a directory.
 */
pub fn is_valid_path(tree: &DirectoryTree, path_template: &str, selections: &[String]) -> bool {
    resolve(tree, path_template, selections).directory().is_some()
}

/*
 * Derives the selector levels a column shows for its current template and
 * selections. Explicit wildcards produce a level when their directory has
 * subdirectories; once the template is exhausted, implicit levels keep being added
 * while the reached directory has subdirectories. Derivation stops at the first
 * level without a (still valid) selection.
 */
pub fn dropdown_levels(
    tree: &DirectoryTree,
    path_template: &str,
    selections: &[String],
    sync_disabled: &BTreeMap<usize, bool>,
) -> Vec<DropdownLevel> {
    let template = PathTemplate::parse(path_template);
    let mut levels = Vec::new();
    let mut current = Some(tree);

    let push_level = |dir: &DirectoryTree, levels: &mut Vec<DropdownLevel>| {
        let index = levels.len();
        let options: Vec<String> = dir
            .subdirectory_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let selected = selections
            .get(index)
            .filter(|s| options.iter().any(|o| o == *s))
            .cloned();
        levels.push(DropdownLevel {
            index,
            options,
            selected: selected.clone(),
            sync_enabled: !sync_disabled.get(&index).copied().unwrap_or(false),
        });
        selected
    };

    for segment in template.segments() {
        let Some(dir) = current else { break };
        match segment {
            Segment::Wildcard => {
                if !dir.has_subdirectories() {
                    current = None;
                    break;
                }
                current = push_level(dir, &mut levels).and_then(|s| dir.child_directory(&s));
                if current.is_none() {
                    break;
                }
            }
            Segment::Literal(name) => {
                current = dir.child_directory(name);
            }
        }
    }

    while let Some(dir) = current {
        if !dir.has_subdirectories() {
            break;
        }
        current = push_level(dir, &mut levels).and_then(|s| dir.child_directory(&s));
    }

    levels
}
