/*
 * Maintains the master image list: the sorted union of distinct image filenames
 * across all columns, plus the global index identifying the filename that is the
 * shared focus for cross-column navigation.
 *
 * Each column's local index is always re-derived by looking the focused filename up
 * in that column's own list, never by position. A column that lacks the focused
 * filename gets `None` and shows an explicit "not present here" state.
 */
use super::column_state::{ColumnId, ColumnState};
use super::directory_tree::DirectoryTree;
use super::path_resolver::resolve;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalImageIndex {
    master_list: Vec<String>,
    global_index: usize,
}

impl GlobalImageIndex {
    pub fn new() -> Self {
        GlobalImageIndex {
            master_list: Vec::new(),
            global_index: 0,
        }
    }

    pub fn master_list(&self) -> &[String] {
        &self.master_list
    }

    pub fn global_index(&self) -> usize {
        self.global_index
    }

    pub fn focused_filename(&self) -> Option<&str> {
        self.master_list.get(self.global_index).map(String::as_str)
    }

    /* Full recomputation after any column's resolved directory may have changed. */
    pub fn recalculate(&mut self, columns: &mut [ColumnState], tree: &DirectoryTree) {
        self.refresh_image_lists(columns, tree);
        self.update_column_indices(columns);
    }

    /*
     * Re-resolves every column, caches its image list and rebuilds the master list.
     * The global index follows the previously focused filename when it survives;
     * otherwise it stays put if still in bounds, or is clamped to the last entry.
     */
    pub fn refresh_image_lists(&mut self, columns: &mut [ColumnState], tree: &DirectoryTree) {
        let previous_filename = self.focused_filename().map(str::to_string);
        let mut union = BTreeSet::new();

        for column in columns.iter_mut() {
            let resolution = resolve(tree, column.path_template(), column.selections());
            let files = match resolution.directory() {
                Some(dir) => dir.image_files(),
                None => Vec::new(),
            };
            union.extend(files.iter().cloned());
            column.set_current_image_files(files);
        }

        self.master_list = union.into_iter().collect();
        let anchored = previous_filename
            .as_deref()
            .and_then(|name| self.master_list.iter().position(|f| f == name));
        self.global_index = match anchored {
            Some(position) => position,
            None if self.global_index < self.master_list.len() => self.global_index,
            None => self.master_list.len().saturating_sub(1),
        };
        log::debug!(
            "ImageIndexer: {} distinct images across {} columns, global index {}.",
            self.master_list.len(),
            columns.len(),
            self.global_index
        );
    }

    pub fn update_column_indices(&self, columns: &mut [ColumnState]) {
        let focused = self.focused_filename();
        for column in columns.iter_mut() {
            column.focus_filename(focused);
        }
    }

    /*
     * Adopts the focus stored in restored columns: the first column whose stored
     * local index still points into its freshly computed list decides the focused
     * filename. Used right after a bulk load, before indices are re-derived.
     */
    pub fn restore_focus_from_columns(&mut self, columns: &[ColumnState]) -> bool {
        let restored = columns.iter().find_map(ColumnState::current_filename);
        match restored {
            Some(filename) => self.focus_filename(filename),
            None => false,
        }
    }

    pub fn focus_filename(&mut self, filename: &str) -> bool {
        match self.master_list.iter().position(|f| f == filename) {
            Some(position) => {
                self.global_index = position;
                true
            }
            None => false,
        }
    }

    /*
     * Moves the global focus by `direction` with wrap-around in both directions and
     * re-derives every column's local index. No column is re-resolved.
     */
    pub fn navigate(&mut self, direction: isize, columns: &mut [ColumnState]) -> bool {
        if self.master_list.is_empty() {
            log::debug!("ImageIndexer: No images to navigate.");
            return false;
        }
        let len = self.master_list.len() as isize;
        self.global_index = (self.global_index as isize + direction).rem_euclid(len) as usize;
        log::debug!("ImageIndexer: Global index now {}.", self.global_index);
        self.update_column_indices(columns);
        true
    }

    /*
     * Steps through one column's own image list (starting from its first image when
     * it shows none), then aligns every other column and the global focus to the
     * filename reached.
     */
    pub fn navigate_column(
        &mut self,
        columns: &mut [ColumnState],
        source_id: &ColumnId,
        direction: isize,
    ) -> bool {
        let Some(source) = columns.iter().find(|c| c.id() == source_id) else {
            log::warn!("ImageIndexer: Navigation for unknown column {source_id} ignored.");
            return false;
        };
        let files = source.current_image_files();
        if files.is_empty() {
            log::debug!("ImageIndexer: Column {source_id} has no images to navigate.");
            return false;
        }
        let len = files.len() as isize;
        let start = source.current_index().unwrap_or(0) as isize;
        let next = (start + direction).rem_euclid(len) as usize;
        let target = files[next].clone();

        self.focus_filename(&target);
        for column in columns.iter_mut() {
            column.focus_filename(Some(&target));
        }
        true
    }
}
