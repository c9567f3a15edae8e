/*
 * Path autocomplete over the static tree. The query is walked literally, segment by
 * segment (wildcards and dropdown state play no role here). A query that reaches a
 * directory lists its entries; a query whose last segment matches nothing falls back
 * to prefix matching among that segment's siblings. Only directories and images are
 * ever suggested.
 */
use super::directory_tree::{DirectoryTree, EntryKind, TreeNode};
use super::path_template::{SEPARATOR, join_segments, split_segments};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub path: String,
    pub kind: EntryKind,
}

impl Suggestion {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /* Text to put into the path input when chosen; directories get a trailing separator. */
    pub fn input_text(&self) -> String {
        if self.is_directory() {
            format!("{}{SEPARATOR}", self.path)
        } else {
            self.path.clone()
        }
    }
}

pub struct SearchIndex<'a> {
    tree: &'a DirectoryTree,
}

impl<'a> SearchIndex<'a> {
    pub fn new(tree: &'a DirectoryTree) -> Self {
        SearchIndex { tree }
    }

    fn listing(
        dir: &DirectoryTree,
        walked: &[&str],
        filter: impl Fn(&str) -> bool,
    ) -> Vec<Suggestion> {
        dir.entries()
            .filter(|(name, _, kind)| {
                matches!(kind, EntryKind::Directory | EntryKind::Image) && filter(*name)
            })
            .map(|(name, _, kind)| {
                let mut parts = walked.to_vec();
                parts.push(name);
                Suggestion {
                    path: join_segments(&parts),
                    kind,
                }
            })
            .collect()
    }

    pub fn suggest(&self, query: &str) -> Vec<Suggestion> {
        let parts: Vec<&str> = split_segments(query).collect();
        let mut current = self.tree;
        let mut walked: Vec<&str> = Vec::new();

        for (position, &part) in parts.iter().enumerate() {
            let is_last = position + 1 == parts.len();
            match current.get(part) {
                Some(TreeNode::Directory(dir)) => {
                    current = dir;
                    walked.push(part);
                }
                Some(TreeNode::File) if is_last => {
                    let kind = DirectoryTree::classify(part, &TreeNode::File);
                    if kind != EntryKind::Image {
                        return Vec::new();
                    }
                    walked.push(part);
                    return vec![Suggestion {
                        path: join_segments(&walked),
                        kind,
                    }];
                }
                Some(TreeNode::File) => {
                    log::trace!("SearchIndex: '{query}' continues below file '{part}'.");
                    return Vec::new();
                }
                None if is_last => {
                    let matches = Self::listing(current, &walked, |name| name.starts_with(part));
                    log::trace!(
                        "SearchIndex: prefix '{part}' matched {} entries.",
                        matches.len()
                    );
                    return matches;
                }
                None => return Vec::new(),
            }
        }

        Self::listing(current, &walked, |_| true)
    }
}
