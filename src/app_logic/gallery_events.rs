use crate::core::{ColumnId, DropdownLevel, ImageDisplay, SessionState, Suggestion};
use std::time::Instant;

// --- Events from the renderer to the session ---

/*
 * Everything a renderer can report. `GallerySession::handle_event` dispatches each
 * variant to the matching session operation; the operations are also callable
 * directly.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    ColumnAdded {
        path_template: Option<String>,
    },
    ColumnDeleted {
        column_id: ColumnId,
    },
    ColumnsReordered {
        order: Vec<ColumnId>,
    },
    ColumnTitleChanged {
        column_id: ColumnId,
        title: String,
    },
    PathTyped {
        column_id: ColumnId,
        text: String,
        at: Instant,
    },
    SuggestionChosen {
        column_id: ColumnId,
        suggestion: Suggestion,
    },
    DropdownChanged {
        column_id: ColumnId,
        level: usize,
        value: String,
    },
    LevelSyncToggled {
        column_id: ColumnId,
        level: usize,
        enabled: bool,
    },
    NavigateGlobal {
        direction: isize,
    },
    NavigateColumn {
        column_id: ColumnId,
        direction: isize,
    },
    DarkModeToggled {
        enabled: bool,
    },
    TimerTick {
        now: Instant,
    },
}

// --- Commands from the session to the renderer ---

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryCommand {
    RenderDropdowns {
        column_id: ColumnId,
        levels: Vec<DropdownLevel>,
    },
    RenderImage {
        column_id: ColumnId,
        display: ImageDisplay,
    },
    // An empty candidate list hides the suggestion box.
    RenderSuggestions {
        column_id: ColumnId,
        candidates: Vec<Suggestion>,
    },
    SetColumnOrder {
        order: Vec<ColumnId>,
    },
    RemoveColumn {
        column_id: ColumnId,
    },
    PersistState(SessionState),
}
