/*
 * This module is responsible for persisting gallery sessions. A session is the
 * ordered list of column records plus the dark-mode flag and the next column id
 * counter, in the same JSON shape the permalink uses, so a saved session and a
 * permalink are interchangeable.
 *
 * It includes a trait for session storage (`SessionStoreOperations`) to facilitate
 * testing and dependency injection, and a concrete implementation (`CoreSessionStore`)
 * keeping named sessions as JSON files under `<project>/.gallery/sessions`.
 */
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const SESSION_FILE_EXTENSION: &str = "json";
const SESSIONS_SUBFOLDER_NAME: &str = "sessions";
pub const PROJECT_CONFIG_DIR_NAME: &str = ".gallery";

#[derive(Debug)]
pub enum SessionStoreError {
    Io(io::Error),
    Serde(serde_json::Error),
    SessionNotFound(String),
    InvalidSessionName(String),
    InvalidState(String),
}

impl From<io::Error> for SessionStoreError {
    fn from(err: io::Error) -> Self {
        SessionStoreError::Io(err)
    }
}

impl From<serde_json::Error> for SessionStoreError {
    fn from(err: serde_json::Error) -> Self {
        SessionStoreError::Serde(err)
    }
}

impl std::fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStoreError::Io(e) => write!(f, "I/O error: {e}"),
            SessionStoreError::Serde(e) => write!(f, "Session state is not valid JSON: {e}"),
            SessionStoreError::SessionNotFound(name) => write!(f, "Session not found: {name}"),
            SessionStoreError::InvalidSessionName(name) => write!(
                f,
                "Invalid session name: {name}. Contains invalid characters or is empty."
            ),
            SessionStoreError::InvalidState(reason) => write!(f, "Invalid session state: {reason}"),
        }
    }
}

impl std::error::Error for SessionStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionStoreError::Io(e) => Some(e),
            SessionStoreError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionStoreError>;

/*
 * The persisted form of one column. Field names follow the permalink format; the
 * local index is stored as `-1` when no image applies.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub dropdown_selections: Vec<String>,
    #[serde(default)]
    pub sync_disabled: BTreeMap<usize, bool>,
    #[serde(
        default,
        serialize_with = "serialize_index",
        deserialize_with = "deserialize_index"
    )]
    pub current_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub columns: Vec<ColumnRecord>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub next_id: u64,
}

fn serialize_index<S: Serializer>(
    index: &Option<usize>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match index {
        Some(i) => serializer.serialize_i64(*i as i64),
        None => serializer.serialize_i64(-1),
    }
}

fn deserialize_index<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<usize>, D::Error> {
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|i| usize::try_from(i).ok()))
}

impl SessionState {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /*
     * Parses a session from its JSON text. A malformed document is rejected as a
     * whole; callers never see a partially applied state.
     */
    pub fn from_json(text: &str) -> Result<SessionState> {
        let state: SessionState = serde_json::from_str(text)?;
        for (position, column) in state.columns.iter().enumerate() {
            if column.dropdown_selections.iter().any(|s| s.contains('/')) {
                return Err(SessionStoreError::InvalidState(format!(
                    "column {position} has a selection containing a path separator"
                )));
            }
        }
        Ok(state)
    }
}

pub fn sanitize_session_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

pub fn is_valid_session_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == ' '
}

fn validate_session_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || !name.chars().all(is_valid_session_name_char) {
        return Err(SessionStoreError::InvalidSessionName(name.to_string()));
    }
    Ok(())
}

pub trait SessionStoreOperations: Send + Sync {
    fn load_session(&self, project_root: &Path, session_name: &str) -> Result<SessionState>;
    fn load_session_from_path(&self, path: &Path) -> Result<SessionState>;
    fn save_session(
        &self,
        project_root: &Path,
        session_name: &str,
        state: &SessionState,
    ) -> Result<()>;
    fn save_session_to_path(&self, path: &Path, state: &SessionState) -> Result<()>;
    fn list_sessions(&self, project_root: &Path) -> Result<Vec<String>>;
}

pub struct CoreSessionStore {}

impl CoreSessionStore {
    pub fn new() -> Self {
        CoreSessionStore {}
    }

    fn session_storage_dir(project_root: &Path) -> Result<PathBuf> {
        let dir = project_root
            .join(PROJECT_CONFIG_DIR_NAME)
            .join(SESSIONS_SUBFOLDER_NAME);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            log::debug!("CoreSessionStore: Created session storage directory: {dir:?}");
        }
        Ok(dir)
    }

    fn session_file_path(project_root: &Path, session_name: &str) -> Result<PathBuf> {
        validate_session_name(session_name)?;
        let dir = CoreSessionStore::session_storage_dir(project_root)?;
        let sanitized = sanitize_session_name(session_name);
        Ok(dir.join(format!("{sanitized}.{SESSION_FILE_EXTENSION}")))
    }
}

impl Default for CoreSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStoreOperations for CoreSessionStore {
    fn load_session(&self, project_root: &Path, session_name: &str) -> Result<SessionState> {
        log::trace!("CoreSessionStore: Loading session '{session_name}'");
        let file_path = CoreSessionStore::session_file_path(project_root, session_name)?;
        if !file_path.exists() {
            log::debug!("CoreSessionStore: Session file {file_path:?} not found.");
            return Err(SessionStoreError::SessionNotFound(session_name.to_string()));
        }
        self.load_session_from_path(&file_path)
    }

    fn load_session_from_path(&self, path: &Path) -> Result<SessionState> {
        let text = fs::read_to_string(path)?;
        let state = SessionState::from_json(&text)?;
        log::debug!(
            "CoreSessionStore: Loaded session with {} columns from {path:?}.",
            state.columns.len()
        );
        Ok(state)
    }

    fn save_session(
        &self,
        project_root: &Path,
        session_name: &str,
        state: &SessionState,
    ) -> Result<()> {
        log::trace!("CoreSessionStore: Saving session '{session_name}'");
        let file_path = CoreSessionStore::session_file_path(project_root, session_name)?;
        self.save_session_to_path(&file_path, state)
    }

    fn save_session_to_path(&self, path: &Path, state: &SessionState) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, state)?;
        log::debug!("CoreSessionStore: Saved session to {path:?}.");
        Ok(())
    }

    fn list_sessions(&self, project_root: &Path) -> Result<Vec<String>> {
        let dir = CoreSessionStore::session_storage_dir(project_root)?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(SESSION_FILE_EXTENSION)
            {
                continue;
            }
            // Only list files that actually parse.
            let parses = File::open(&path)
                .map(BufReader::new)
                .ok()
                .and_then(|reader| serde_json::from_reader::<_, SessionState>(reader).ok())
                .is_some();
            if !parses {
                log::warn!("CoreSessionStore: Skipping unreadable session file {path:?}.");
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_state() -> SessionState {
        let mut sync_disabled = BTreeMap::new();
        sync_disabled.insert(1, true);
        sync_disabled.insert(0, false);
        SessionState {
            columns: vec![
                ColumnRecord {
                    title: "Log".into(),
                    path: "data/*".into(),
                    dropdown_selections: vec!["expA".into(), "log".into()],
                    sync_disabled,
                    current_index: Some(2),
                },
                ColumnRecord {
                    title: String::new(),
                    path: "data/".into(),
                    dropdown_selections: vec![],
                    sync_disabled: BTreeMap::new(),
                    current_index: None,
                },
            ],
            dark_mode: true,
            next_id: 7,
        }
    }

    #[test]
    fn test_json_uses_permalink_field_names() {
        let text = sample_state().to_json().unwrap();
        assert!(text.contains("\"dropdownSelections\":[\"expA\",\"log\"]"));
        assert!(text.contains("\"syncDisabled\":{\"0\":false,\"1\":true}"));
        assert!(text.contains("\"currentIndex\":-1"));
        assert!(text.contains("\"darkMode\":true"));
        assert!(text.contains("\"nextId\":7"));
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let state = sample_state();
        let reparsed = SessionState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, state);
    }

    #[test]
    fn test_from_json_accepts_minimal_records() {
        let state = SessionState::from_json(r#"{"columns":[{"path":"data/"}]}"#).unwrap();
        assert_eq!(state.columns.len(), 1);
        assert_eq!(state.columns[0].current_index, None);
        assert!(!state.dark_mode);
        assert_eq!(state.next_id, 0);
    }

    #[test]
    fn test_from_json_rejects_corrupt_documents() {
        assert!(matches!(
            SessionState::from_json("not json"),
            Err(SessionStoreError::Serde(_))
        ));
        assert!(matches!(
            SessionState::from_json(r#"{"columns":{}}"#),
            Err(SessionStoreError::Serde(_))
        ));
        assert!(matches!(
            SessionState::from_json(r#"{"columns":[{"dropdownSelections":["a/b"]}]}"#),
            Err(SessionStoreError::InvalidState(_))
        ));
    }

    #[test]
    fn test_save_load_and_list_sessions() {
        let dir = tempdir().unwrap();
        let store = CoreSessionStore::new();
        let state = sample_state();

        store.save_session(dir.path(), "compare log", &state).unwrap();
        let loaded = store.load_session(dir.path(), "compare log").unwrap();
        assert_eq!(loaded, state);

        let garbage = dir
            .path()
            .join(PROJECT_CONFIG_DIR_NAME)
            .join(SESSIONS_SUBFOLDER_NAME)
            .join("broken.json");
        fs::write(&garbage, "{").unwrap();

        assert_eq!(store.list_sessions(dir.path()).unwrap(), vec!["comparelog"]);
    }

    #[test]
    fn test_load_missing_and_invalid_names() {
        let dir = tempdir().unwrap();
        let store = CoreSessionStore::new();
        assert!(matches!(
            store.load_session(dir.path(), "absent"),
            Err(SessionStoreError::SessionNotFound(_))
        ));
        assert!(matches!(
            store.load_session(dir.path(), "bad/name"),
            Err(SessionStoreError::InvalidSessionName(_))
        ));
        assert!(matches!(
            store.save_session(dir.path(), "  ", &sample_state()),
            Err(SessionStoreError::InvalidSessionName(_))
        ));
    }

    #[test]
    fn test_save_and_load_explicit_path() {
        let dir = tempdir().unwrap();
        let store = CoreSessionStore::new();
        let path = dir.path().join("state.json");
        store.save_session_to_path(&path, &sample_state()).unwrap();
        assert_eq!(store.load_session_from_path(&path).unwrap(), sample_state());
    }
}
