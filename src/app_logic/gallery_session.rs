use super::gallery_events::{GalleryCommand, GalleryEvent};
use crate::core::path_template::SEPARATOR;
use crate::core::{
    ChangeOrigin, ColumnId, ColumnState, Debouncer, DirectoryTree, EntryKind, GalleryConfig,
    GlobalImageIndex, ImageDisplay, SearchIndex, SessionState, SessionStoreError, Suggestion,
    dropdown_levels, handle_dropdown_change, resolve,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

/*
 * Owns the gallery's mutable state: the ordered columns, the global image index and
 * the per-column path input debouncers, over one shared static tree. Every operation
 * leaves the state fully consistent (image lists, master list and local indices
 * recomputed) and queues `GalleryCommand`s describing what a renderer should redraw.
 * State-changing operations also queue exactly one `PersistState` snapshot.
 */
pub struct GallerySession {
    tree: Arc<DirectoryTree>,
    config: GalleryConfig,
    columns: Vec<ColumnState>,
    image_index: GlobalImageIndex,
    next_column_id: u64,
    dark_mode: bool,
    path_debouncers: HashMap<ColumnId, Debouncer<String>>,
    command_queue: VecDeque<GalleryCommand>,
}

impl GallerySession {
    /* A session without columns. */
    pub fn new(tree: Arc<DirectoryTree>, config: GalleryConfig) -> Self {
        GallerySession {
            tree,
            config,
            columns: Vec::new(),
            image_index: GlobalImageIndex::new(),
            next_column_id: 0,
            dark_mode: false,
            path_debouncers: HashMap::new(),
            command_queue: VecDeque::new(),
        }
    }

    /* The initial layout: `initial_column_count` columns on the default template. */
    pub fn with_default_columns(tree: Arc<DirectoryTree>, config: GalleryConfig) -> Self {
        let mut session = GallerySession::new(tree, config);
        for _ in 0..session.config.initial_column_count {
            let path = session.config.default_column_path.clone();
            session.push_column(&path);
        }
        session.image_index.recalculate(&mut session.columns, &session.tree);
        session.enqueue_column_order();
        session.render_all_columns();
        session
    }

    /*
     * Bulk load from a persisted state. Columns get fresh ids, the id counter never
     * falls behind them, and the focus is restored from the first column whose stored
     * index still points at an image. Selections that no longer resolve are kept and
     * show up as invalid paths.
     */
    pub fn from_session_state(
        tree: Arc<DirectoryTree>,
        config: GalleryConfig,
        state: &SessionState,
    ) -> Self {
        let mut session = GallerySession::new(tree, config);
        session.dark_mode = state.dark_mode;
        for (position, record) in state.columns.iter().enumerate() {
            let id = ColumnId::from_counter(position as u64);
            let column = ColumnState::from_record(id, record);
            if !resolve(&session.tree, column.path_template(), column.selections()).valid {
                log::warn!(
                    "GallerySession: Restored column {} no longer resolves ('{}' with {:?}).",
                    column.id(),
                    column.path_template(),
                    column.selections()
                );
            }
            session.columns.push(column);
        }
        session.next_column_id = state.next_id.max(state.columns.len() as u64);

        session
            .image_index
            .refresh_image_lists(&mut session.columns, &session.tree);
        session.image_index.restore_focus_from_columns(&session.columns);
        session.image_index.update_column_indices(&mut session.columns);

        log::debug!(
            "GallerySession: Restored {} columns, focus {:?}.",
            session.columns.len(),
            session.image_index.focused_filename()
        );
        session.enqueue_column_order();
        session.render_all_columns();
        session
    }

    /* Restores `loaded` when given; a failed load falls back to the default layout. */
    pub fn load_state_or_default(
        tree: Arc<DirectoryTree>,
        config: GalleryConfig,
        loaded: Option<Result<SessionState, SessionStoreError>>,
    ) -> Self {
        match loaded {
            Some(Ok(state)) => GallerySession::from_session_state(tree, config, &state),
            Some(Err(e)) => {
                log::warn!("GallerySession: Ignoring unusable session state: {e}");
                GallerySession::with_default_columns(tree, config)
            }
            None => GallerySession::with_default_columns(tree, config),
        }
    }

    pub fn to_session_state(&self) -> SessionState {
        SessionState {
            columns: self.columns.iter().map(ColumnState::to_record).collect(),
            dark_mode: self.dark_mode,
            next_id: self.next_column_id,
        }
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    pub fn columns(&self) -> &[ColumnState] {
        &self.columns
    }

    pub fn column(&self, column_id: &ColumnId) -> Option<&ColumnState> {
        self.columns.iter().find(|c| c.id() == column_id)
    }

    pub fn image_index(&self) -> &GlobalImageIndex {
        &self.image_index
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn display_for(&self, column_id: &ColumnId) -> Option<ImageDisplay> {
        let column = self.column(column_id)?;
        Some(ImageDisplay::describe(
            column,
            &self.tree,
            self.image_index.focused_filename(),
        ))
    }

    pub fn try_dequeue_command(&mut self) -> Option<GalleryCommand> {
        self.command_queue.pop_front()
    }

    pub fn handle_event(&mut self, event: GalleryEvent) {
        log::trace!("GallerySession: Handling {event:?}");
        match event {
            GalleryEvent::ColumnAdded { path_template } => {
                self.add_column(path_template.as_deref());
            }
            GalleryEvent::ColumnDeleted { column_id } => {
                self.delete_column(&column_id);
            }
            GalleryEvent::ColumnsReordered { order } => self.reorder_columns(&order),
            GalleryEvent::ColumnTitleChanged { column_id, title } => {
                self.set_column_title(&column_id, &title);
            }
            GalleryEvent::PathTyped {
                column_id,
                text,
                at,
            } => {
                self.on_path_input(&column_id, &text, at);
            }
            GalleryEvent::SuggestionChosen {
                column_id,
                suggestion,
            } => {
                self.select_suggestion(&column_id, &suggestion);
            }
            GalleryEvent::DropdownChanged {
                column_id,
                level,
                value,
            } => {
                self.change_dropdown(&column_id, level, &value, ChangeOrigin::User);
            }
            GalleryEvent::LevelSyncToggled {
                column_id,
                level,
                enabled,
            } => {
                self.set_level_sync(&column_id, level, enabled);
            }
            GalleryEvent::NavigateGlobal { direction } => {
                self.navigate_global(direction);
            }
            GalleryEvent::NavigateColumn {
                column_id,
                direction,
            } => {
                self.navigate_column(&column_id, direction);
            }
            GalleryEvent::DarkModeToggled { enabled } => self.set_dark_mode(enabled),
            GalleryEvent::TimerTick { now } => self.poll_timers(now),
        }
    }

    // --- Column lifecycle ---

    fn push_column(&mut self, path_template: &str) -> ColumnId {
        let id = ColumnId::from_counter(self.next_column_id);
        self.next_column_id += 1;
        self.columns.push(ColumnState::new(id.clone(), path_template));
        id
    }

    /* Appends a column on `path_template`, or on the configured default template. */
    pub fn add_column(&mut self, path_template: Option<&str>) -> ColumnId {
        let path = path_template
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_column_path.clone());
        let id = self.push_column(&path);
        log::debug!("GallerySession: Added column {id} on '{path}'.");
        self.recalculate_and_render();
        self.enqueue_column_order();
        self.enqueue_persist();
        id
    }

    pub fn delete_column(&mut self, column_id: &ColumnId) -> bool {
        let Some(position) = self.columns.iter().position(|c| c.id() == column_id) else {
            log::warn!("GallerySession: Cannot delete unknown column {column_id}.");
            return false;
        };
        self.columns.remove(position);
        self.path_debouncers.remove(column_id);
        log::debug!("GallerySession: Deleted column {column_id}.");
        self.command_queue.push_back(GalleryCommand::RemoveColumn {
            column_id: column_id.clone(),
        });
        self.recalculate_and_render();
        self.enqueue_persist();
        true
    }

    /*
     * Re-derives the column order from a visual order. Unknown ids are ignored and
     * columns missing from `order` keep their relative order at the end.
     */
    pub fn reorder_columns(&mut self, order: &[ColumnId]) {
        let mut remaining = std::mem::take(&mut self.columns);
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in order {
            if let Some(position) = remaining.iter().position(|c| c.id() == id) {
                reordered.push(remaining.remove(position));
            } else {
                log::trace!("GallerySession: Reorder skips unknown column {id}.");
            }
        }
        reordered.extend(remaining);
        self.columns = reordered;
        self.enqueue_column_order();
        self.enqueue_persist();
    }

    pub fn set_column_title(&mut self, column_id: &ColumnId, title: &str) -> bool {
        let Some(column) = self.column_mut(column_id) else {
            return false;
        };
        column.set_title(title);
        self.enqueue_persist();
        true
    }

    // --- Path input ---

    /* Replaces the column's template outright, resetting its dropdown state. */
    pub fn set_path_template(&mut self, column_id: &ColumnId, path_template: &str) -> bool {
        let Some(column) = self.column_mut(column_id) else {
            log::warn!("GallerySession: Path change for unknown column {column_id} ignored.");
            return false;
        };
        column.set_path_template(path_template);
        self.recalculate_and_render();
        self.enqueue_persist();
        true
    }

    /* Records a keystroke; the path is applied once typing pauses (see `poll_timers`). */
    pub fn on_path_input(&mut self, column_id: &ColumnId, text: &str, now: Instant) -> bool {
        if self.column(column_id).is_none() {
            return false;
        }
        let delay = self.config.debounce_delay();
        self.path_debouncers
            .entry(column_id.clone())
            .or_insert_with(|| Debouncer::new(delay))
            .call(text.to_string(), now);
        true
    }

    /* Fires every path input whose quiet period has elapsed, in column order. */
    pub fn poll_timers(&mut self, now: Instant) {
        let ids: Vec<ColumnId> = self.columns.iter().map(|c| c.id().clone()).collect();
        for id in ids {
            let fired = self
                .path_debouncers
                .get_mut(&id)
                .and_then(|debouncer| debouncer.poll(now));
            if let Some(text) = fired {
                log::debug!("GallerySession: Applying typed path '{text}' to column {id}.");
                let candidates = self.suggestions_for(&text);
                self.set_path_template(&id, &text);
                self.command_queue.push_back(GalleryCommand::RenderSuggestions {
                    column_id: id,
                    candidates,
                });
            }
        }
    }

    /* The earliest instant at which `poll_timers` has typed input to apply. */
    pub fn next_timer_deadline(&self) -> Option<Instant> {
        self.path_debouncers
            .values()
            .filter_map(Debouncer::deadline)
            .min()
    }

    pub fn suggestions_for(&self, query: &str) -> Vec<Suggestion> {
        let mut candidates = SearchIndex::new(&self.tree).suggest(query);
        candidates.truncate(self.config.max_suggestions);
        candidates
    }

    /*
     * Applies a chosen completion immediately, dropping any pending typed text.
     * A directory becomes the column's path and its own entries are offered next.
     * An image opens its parent directory with that image focused in every column,
     * and the suggestion box is hidden.
     */
    pub fn select_suggestion(&mut self, column_id: &ColumnId, suggestion: &Suggestion) -> bool {
        if let Some(debouncer) = self.path_debouncers.get_mut(column_id) {
            debouncer.cancel();
        }
        let (path, focus) = match suggestion.kind {
            EntryKind::Image => match suggestion.path.rsplit_once(SEPARATOR) {
                Some((parent, filename)) => (format!("{parent}{SEPARATOR}"), Some(filename)),
                None => (String::new(), Some(suggestion.path.as_str())),
            },
            _ => (suggestion.input_text(), None),
        };
        let Some(column) = self.column_mut(column_id) else {
            log::warn!("GallerySession: Suggestion for unknown column {column_id} ignored.");
            return false;
        };
        column.set_path_template(&path);

        self.image_index.refresh_image_lists(&mut self.columns, &self.tree);
        if let Some(filename) = focus {
            if !self.image_index.focus_filename(filename) {
                log::debug!("GallerySession: Chosen image '{filename}' has no master entry.");
            }
        }
        self.image_index.update_column_indices(&mut self.columns);
        self.render_all_columns();
        self.enqueue_persist();

        let candidates = match focus {
            Some(_) => Vec::new(),
            None => self.suggestions_for(&path),
        };
        self.command_queue.push_back(GalleryCommand::RenderSuggestions {
            column_id: column_id.clone(),
            candidates,
        });
        true
    }

    // --- Dropdowns ---

    /*
     * Applies a dropdown change and, for user changes, replicates it to compatible
     * columns. All columns are recomputed once afterwards, whatever the number of
     * columns touched.
     */
    pub fn change_dropdown(
        &mut self,
        column_id: &ColumnId,
        level: usize,
        value: &str,
        origin: ChangeOrigin,
    ) -> bool {
        let outcome =
            handle_dropdown_change(&mut self.columns, &self.tree, column_id, level, value, origin);
        if outcome.updated_columns.is_empty() {
            return false;
        }
        self.image_index.recalculate(&mut self.columns, &self.tree);
        for id in &outcome.updated_columns {
            self.enqueue_dropdowns(id);
        }
        self.enqueue_all_images();
        self.enqueue_persist();
        true
    }

    pub fn set_level_sync(&mut self, column_id: &ColumnId, level: usize, enabled: bool) -> bool {
        let Some(column) = self.column_mut(column_id) else {
            return false;
        };
        column.set_sync_enabled(level, enabled);
        log::debug!("GallerySession: Column {column_id} level {level} sync enabled: {enabled}.");
        self.enqueue_dropdowns(column_id);
        self.enqueue_persist();
        true
    }

    // --- Navigation ---

    pub fn navigate_global(&mut self, direction: isize) -> bool {
        if !self.image_index.navigate(direction, &mut self.columns) {
            return false;
        }
        self.enqueue_all_images();
        self.enqueue_persist();
        true
    }

    pub fn navigate_column(&mut self, column_id: &ColumnId, direction: isize) -> bool {
        if !self
            .image_index
            .navigate_column(&mut self.columns, column_id, direction)
        {
            return false;
        }
        self.enqueue_all_images();
        self.enqueue_persist();
        true
    }

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.dark_mode = enabled;
        self.enqueue_persist();
    }

    // --- Internals ---

    fn column_mut(&mut self, column_id: &ColumnId) -> Option<&mut ColumnState> {
        self.columns.iter_mut().find(|c| c.id() == column_id)
    }

    fn recalculate_and_render(&mut self) {
        self.image_index.recalculate(&mut self.columns, &self.tree);
        self.render_all_columns();
    }

    fn render_all_columns(&mut self) {
        let ids: Vec<ColumnId> = self.columns.iter().map(|c| c.id().clone()).collect();
        for id in &ids {
            self.enqueue_dropdowns(id);
        }
        self.enqueue_all_images();
    }

    fn enqueue_dropdowns(&mut self, column_id: &ColumnId) {
        let Some(column) = self.column(column_id) else {
            return;
        };
        let levels = dropdown_levels(
            &self.tree,
            column.path_template(),
            column.selections(),
            column.sync_disabled(),
        );
        self.command_queue.push_back(GalleryCommand::RenderDropdowns {
            column_id: column_id.clone(),
            levels,
        });
    }

    fn enqueue_all_images(&mut self) {
        let focused = self.image_index.focused_filename();
        let commands: Vec<GalleryCommand> = self
            .columns
            .iter()
            .map(|column| GalleryCommand::RenderImage {
                column_id: column.id().clone(),
                display: ImageDisplay::describe(column, &self.tree, focused),
            })
            .collect();
        self.command_queue.extend(commands);
    }

    fn enqueue_column_order(&mut self) {
        let order = self.columns.iter().map(|c| c.id().clone()).collect();
        self.command_queue.push_back(GalleryCommand::SetColumnOrder { order });
    }

    fn enqueue_persist(&mut self) {
        let state = self.to_session_state();
        self.command_queue.push_back(GalleryCommand::PersistState(state));
    }
}
