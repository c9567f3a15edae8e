/*
 * This module consolidates the platform-agnostic gallery logic: the static directory
 * tree and its loaders, path template resolution, per-column state, the dropdown sync
 * engine, the global image index, path autocomplete, session persistence and
 * configuration. Nothing in here knows how columns are drawn.
 */
pub mod column_state;
pub mod config;
pub mod debouncer;
pub mod directory_tree;
pub mod file_system;
pub mod image_display;
pub mod image_indexer;
pub mod path_resolver;
pub mod path_template;
pub mod search_index;
pub mod session_state;
pub mod sync_engine;

pub use column_state::{ColumnId, ColumnState};
pub use directory_tree::{DirectoryTree, EntryKind};
pub use image_display::ImageDisplay;
pub use image_indexer::GlobalImageIndex;
pub use path_resolver::{DropdownLevel, dropdown_levels, resolve};
pub use search_index::{SearchIndex, Suggestion};
pub use sync_engine::{ChangeOrigin, handle_dropdown_change};

// Re-export file system related items
pub use file_system::{
    CoreFileSystemScanner, FileSystemScannerOperations, load_tree_document, save_tree_document,
};

// Re-export session persistence items
pub use session_state::{CoreSessionStore, SessionState, SessionStoreError, SessionStoreOperations};

// Re-export config related items
pub use config::{ConfigManagerOperations, CoreConfigManager, GalleryConfig};

pub use debouncer::Debouncer;
