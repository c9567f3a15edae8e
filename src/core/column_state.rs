/*
 * Per-column mutable state: the typed path template, the ordered dropdown
 * selections, the per-level sync opt-outs, and the cached image list with the
 * local index of the image currently shown.
 *
 * The struct owns its invariants: selections never end in empty entries, and the
 * local index is always either `None` or a valid position in `current_image_files`.
 */
use super::session_state::ColumnRecord;
use std::collections::BTreeMap;
use std::fmt;

const COLUMN_ID_PREFIX: &str = "col-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn from_counter(counter: u64) -> Self {
        ColumnId(format!("{COLUMN_ID_PREFIX}{counter}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnState {
    id: ColumnId,
    title: String,
    path_template: String,
    selections: Vec<String>,
    sync_disabled: BTreeMap<usize, bool>,
    current_image_files: Vec<String>,
    current_index: Option<usize>,
}

impl ColumnState {
    pub fn new(id: ColumnId, path_template: &str) -> Self {
        log::debug!("ColumnState: Creating column {id} with path '{path_template}'.");
        ColumnState {
            id,
            title: String::new(),
            path_template: path_template.to_string(),
            selections: Vec::new(),
            sync_disabled: BTreeMap::new(),
            current_image_files: Vec::new(),
            current_index: None,
        }
    }

    /*
     * Rebuilds a column from a persisted record. The image list is not part of the
     * record; it is re-derived by the next recalculation, which also re-validates
     * the stored index.
     */
    pub fn from_record(id: ColumnId, record: &ColumnRecord) -> Self {
        let mut column = ColumnState::new(id, &record.path);
        column.title = record.title.clone();
        column.set_selections(record.dropdown_selections.clone());
        column.sync_disabled = record.sync_disabled.clone();
        column.current_index = record.current_index;
        column
    }

    pub fn to_record(&self) -> ColumnRecord {
        ColumnRecord {
            title: self.title.clone(),
            path: self.path_template.clone(),
            dropdown_selections: self.selections.clone(),
            sync_disabled: self.sync_disabled.clone(),
            current_index: self.current_index,
        }
    }

    pub fn id(&self) -> &ColumnId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    /*
     * A new template makes every previous dropdown choice meaningless, so this is a
     * hard reset of selections, sync opt-outs and the local index.
     */
    pub fn set_path_template(&mut self, path_template: &str) {
        log::debug!(
            "ColumnState: Column {} path '{}' -> '{}', resetting selections.",
            self.id,
            self.path_template,
            path_template
        );
        self.path_template = path_template.to_string();
        self.selections.clear();
        self.sync_disabled.clear();
        self.current_index = None;
    }

    pub fn selections(&self) -> &[String] {
        &self.selections
    }

    pub fn set_selections(&mut self, mut selections: Vec<String>) {
        while selections.last().is_some_and(|s| s.is_empty()) {
            selections.pop();
        }
        self.selections = selections;
    }

    pub fn sync_disabled(&self) -> &BTreeMap<usize, bool> {
        &self.sync_disabled
    }

    pub fn is_sync_enabled(&self, level: usize) -> bool {
        !self.sync_disabled.get(&level).copied().unwrap_or(false)
    }

    /* Records the checkbox state; an explicit `false` entry still means "enabled". */
    pub fn set_sync_enabled(&mut self, level: usize, enabled: bool) {
        self.sync_disabled.insert(level, !enabled);
    }

    /* Drops every opt-out strictly deeper than `level`. */
    pub fn clear_sync_flags_below(&mut self, level: usize) {
        self.sync_disabled.retain(|&key, _| key <= level);
    }

    pub fn current_image_files(&self) -> &[String] {
        &self.current_image_files
    }

    pub fn set_current_image_files(&mut self, files: Vec<String>) {
        self.current_image_files = files;
        if self
            .current_index
            .is_some_and(|index| index >= self.current_image_files.len())
        {
            self.current_index = None;
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn set_current_index(&mut self, index: Option<usize>) {
        self.current_index = index.filter(|&i| i < self.current_image_files.len());
    }

    /* Positions the local index on `filename`, or clears it when absent here. */
    pub fn focus_filename(&mut self, filename: Option<&str>) {
        self.current_index = filename.and_then(|name| {
            self.current_image_files
                .iter()
                .position(|candidate| candidate == name)
        });
    }

    pub fn current_filename(&self) -> Option<&str> {
        self.current_index
            .and_then(|index| self.current_image_files.get(index))
            .map(String::as_str)
    }
}
