use super::gallery_events::{GalleryCommand, GalleryEvent};
use super::gallery_session::GallerySession;

use crate::core::{
    ChangeOrigin, ColumnId, DirectoryTree, EntryKind, GalleryConfig, ImageDisplay, SessionState,
    Suggestion,
};

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

/*
 * This module contains session-level tests for `GallerySession`. They drive the
 * session through its public operations (and `handle_event`), then inspect both
 * the resulting column state and the commands it queued for the renderer.
 */

fn scenario_tree() -> Arc<DirectoryTree> {
    Arc::new(
        serde_json::from_value(json!({
            "data": {
                "expA": {"f1.png": 1, "f1.pdf": 1},
                "expB": {"f1.png": 1, "f2.png": 1}
            }
        }))
        .unwrap(),
    )
}

fn col(n: u64) -> ColumnId {
    ColumnId::from_counter(n)
}

fn drain(session: &mut GallerySession) -> Vec<GalleryCommand> {
    std::iter::from_fn(|| session.try_dequeue_command()).collect()
}

fn persist_count(commands: &[GalleryCommand]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, GalleryCommand::PersistState(_)))
        .count()
}

fn suggestion_paths_for(commands: &[GalleryCommand], target: &ColumnId) -> Option<Vec<String>> {
    commands.iter().rev().find_map(|c| match c {
        GalleryCommand::RenderSuggestions {
            column_id,
            candidates,
        } if column_id == target => Some(candidates.iter().map(|s| s.path.clone()).collect()),
        _ => None,
    })
}

// Two independent columns on `data/*`, showing expA and expB.
fn scenario_session() -> GallerySession {
    let mut session =
        GallerySession::with_default_columns(scenario_tree(), GalleryConfig::default());
    for id in [col(0), col(1)] {
        session.set_path_template(&id, "data/*");
        session.set_level_sync(&id, 0, false);
    }
    session.change_dropdown(&col(0), 0, "expA", ChangeOrigin::User);
    session.change_dropdown(&col(1), 0, "expB", ChangeOrigin::User);
    drain(&mut session);
    session
}

#[test]
fn test_default_session_layout_and_initial_render() {
    // Arrange
    let config = GalleryConfig {
        initial_column_count: 3,
        ..GalleryConfig::default()
    };

    // Act
    let mut session = GallerySession::with_default_columns(scenario_tree(), config);

    // Assert
    let ids: Vec<ColumnId> = session.columns().iter().map(|c| c.id().clone()).collect();
    assert_eq!(ids, vec![col(0), col(1), col(2)]);
    assert!(session.columns().iter().all(|c| c.path_template() == "data/"));

    let commands = drain(&mut session);
    assert_eq!(
        commands[0],
        GalleryCommand::SetColumnOrder {
            order: vec![col(0), col(1), col(2)]
        }
    );
    let images = commands
        .iter()
        .filter(|c| {
            matches!(
                c,
                GalleryCommand::RenderImage {
                    display: ImageDisplay::NoImages,
                    ..
                }
            )
        })
        .count();
    assert_eq!(images, 3);
    assert_eq!(persist_count(&commands), 0);
}

#[test]
fn test_master_list_scenario_with_independent_columns() {
    // Arrange
    let mut session = scenario_session();
    assert_eq!(session.image_index().master_list(), &["f1.png", "f2.png"]);

    // Act
    assert!(session.navigate_global(1));

    // Assert
    assert_eq!(session.image_index().focused_filename(), Some("f2.png"));
    assert_eq!(session.column(&col(0)).unwrap().current_index(), None);
    assert_eq!(session.column(&col(1)).unwrap().current_index(), Some(1));
    assert_eq!(
        session.display_for(&col(0)),
        Some(ImageDisplay::NotFoundHere {
            filename: Some("f2.png".into())
        })
    );
    let state = session.to_session_state();
    assert_eq!(state.columns[0].current_index, None);
    assert_eq!(state.columns[1].current_index, Some(1));
}

#[test]
fn test_global_navigation_wraps_both_ways() {
    let mut session = scenario_session();
    assert_eq!(session.image_index().global_index(), 0);

    session.navigate_global(1);
    session.navigate_global(1);
    assert_eq!(session.image_index().global_index(), 0);

    session.navigate_global(-1);
    assert_eq!(session.image_index().global_index(), 1);
}

#[test]
fn test_dropdown_change_propagates_and_persists_once() {
    // Arrange
    let mut session =
        GallerySession::with_default_columns(scenario_tree(), GalleryConfig::default());
    session.set_path_template(&col(0), "data/*");
    session.set_path_template(&col(1), "data/*");
    drain(&mut session);

    // Act
    session.handle_event(GalleryEvent::DropdownChanged {
        column_id: col(0),
        level: 0,
        value: "expB".into(),
    });

    // Assert
    assert_eq!(session.column(&col(0)).unwrap().selections(), &["expB"]);
    assert_eq!(session.column(&col(1)).unwrap().selections(), &["expB"]);
    assert_eq!(session.image_index().master_list(), &["f1.png", "f2.png"]);

    let commands = drain(&mut session);
    assert_eq!(persist_count(&commands), 1);
    let dropdown_targets: Vec<&ColumnId> = commands
        .iter()
        .filter_map(|c| match c {
            GalleryCommand::RenderDropdowns { column_id, .. } => Some(column_id),
            _ => None,
        })
        .collect();
    assert_eq!(dropdown_targets, vec![&col(0), &col(1)]);
}

#[test]
fn test_focus_survives_changes_that_keep_the_filename() {
    let mut session = scenario_session();
    session.navigate_global(1);
    assert_eq!(session.image_index().focused_filename(), Some("f2.png"));

    // Column 0 switches to expB as well; f2.png is still in the master list.
    session.set_level_sync(&col(0), 0, true);
    session.change_dropdown(&col(0), 0, "expB", ChangeOrigin::User);

    assert_eq!(session.image_index().focused_filename(), Some("f2.png"));
    assert_eq!(session.column(&col(0)).unwrap().current_index(), Some(1));
}

#[test]
fn test_delete_column_clamps_focus() {
    // Arrange
    let mut session = scenario_session();
    session.navigate_global(1);
    drain(&mut session);

    // Act
    assert!(session.delete_column(&col(1)));

    // Assert
    assert_eq!(session.image_index().master_list(), &["f1.png"]);
    assert_eq!(session.image_index().focused_filename(), Some("f1.png"));
    assert_eq!(session.column(&col(0)).unwrap().current_index(), Some(0));
    let commands = drain(&mut session);
    assert!(commands.contains(&GalleryCommand::RemoveColumn { column_id: col(1) }));
    assert_eq!(persist_count(&commands), 1);
    assert!(!session.delete_column(&col(1)));
}

#[test]
fn test_added_column_gets_next_id_and_default_path() {
    let mut session = scenario_session();
    session.delete_column(&col(1));

    let id = session.add_column(None);
    let explicit = session.add_column(Some("data/expA"));

    assert_eq!(id, col(2));
    assert_eq!(explicit, col(3));
    assert_eq!(session.column(&id).unwrap().path_template(), "data/");
    assert_eq!(
        session.column(&explicit).unwrap().current_image_files(),
        &["f1.png"]
    );
}

#[test]
fn test_per_column_navigation_moves_global_focus() {
    let mut session = scenario_session();

    assert!(session.navigate_column(&col(1), 1));

    assert_eq!(session.image_index().global_index(), 1);
    assert_eq!(session.column(&col(1)).unwrap().current_index(), Some(1));
    assert_eq!(session.column(&col(0)).unwrap().current_index(), None);

    // Column 0 only has f1.png; stepping it lands back on f1.png everywhere.
    assert!(session.navigate_column(&col(0), 1));
    assert_eq!(session.image_index().focused_filename(), Some("f1.png"));
    assert_eq!(session.column(&col(1)).unwrap().current_index(), Some(0));
}

#[test]
fn test_session_state_round_trip_restores_focus() {
    // Arrange
    let mut session = scenario_session();
    session.navigate_global(1);
    session.set_column_title(&col(1), "Experiment B");
    session.set_dark_mode(true);
    let state = session.to_session_state();
    let text = state.to_json().unwrap();

    // Act
    let restored = GallerySession::load_state_or_default(
        scenario_tree(),
        GalleryConfig::default(),
        Some(SessionState::from_json(&text)),
    );

    // Assert
    assert_eq!(restored.to_session_state(), state);
    assert_eq!(restored.image_index().focused_filename(), Some("f2.png"));
    assert!(restored.dark_mode());
    assert_eq!(restored.column(&col(1)).unwrap().title(), "Experiment B");
}

#[test]
fn test_corrupt_state_falls_back_to_default_columns() {
    for text in ["{ broken", r#"{"columns":[{"path":"data/*","dropdownSelections":["a/b"]}]}"#] {
        let session = GallerySession::load_state_or_default(
            scenario_tree(),
            GalleryConfig::default(),
            Some(SessionState::from_json(text)),
        );
        assert_eq!(session.columns().len(), 2, "state {text}");
        assert_eq!(session.columns()[0].path_template(), "data/");
    }
}

#[test]
fn test_restored_stale_selection_shows_invalid_path() {
    let state = SessionState::from_json(
        r#"{"columns":[{"path":"data/*","dropdownSelections":["expZ"],"currentIndex":0}],"nextId":0}"#,
    )
    .unwrap();

    let session =
        GallerySession::from_session_state(scenario_tree(), GalleryConfig::default(), &state);

    assert_eq!(session.display_for(&col(0)), Some(ImageDisplay::InvalidPath));
    assert!(session.image_index().master_list().is_empty());
    // The id counter never falls behind the restored columns.
    assert_eq!(session.to_session_state().next_id, 1);
}

#[test]
fn test_path_input_is_debounced() {
    // Arrange
    let mut session =
        GallerySession::with_default_columns(scenario_tree(), GalleryConfig::default());
    drain(&mut session);
    let start = Instant::now();

    // Act
    session.on_path_input(&col(0), "data/e", start);
    session.on_path_input(&col(0), "data/exp", start + Duration::from_millis(100));
    assert_eq!(
        session.next_timer_deadline(),
        Some(start + Duration::from_millis(400))
    );
    session.poll_timers(start + Duration::from_millis(350));

    // Assert: nothing applied before the quiet period after the last keystroke.
    assert_eq!(session.column(&col(0)).unwrap().path_template(), "data/");
    assert!(drain(&mut session).is_empty());

    session.poll_timers(start + Duration::from_millis(400));
    assert_eq!(session.column(&col(0)).unwrap().path_template(), "data/exp");
    let commands = drain(&mut session);
    let suggestions = commands.iter().find_map(|c| match c {
        GalleryCommand::RenderSuggestions {
            column_id,
            candidates,
        } if *column_id == col(0) => Some(candidates.clone()),
        _ => None,
    });
    let paths: Vec<String> = suggestions.unwrap().into_iter().map(|s| s.path).collect();
    assert_eq!(paths, vec!["data/expA", "data/expB"]);
    assert_eq!(persist_count(&commands), 1);
    assert_eq!(session.next_timer_deadline(), None);
}

#[test]
fn test_selecting_suggestion_cancels_pending_input() {
    let mut session =
        GallerySession::with_default_columns(scenario_tree(), GalleryConfig::default());
    let start = Instant::now();
    session.handle_event(GalleryEvent::PathTyped {
        column_id: col(0),
        text: "data/ex".into(),
        at: start,
    });

    session.handle_event(GalleryEvent::SuggestionChosen {
        column_id: col(0),
        suggestion: Suggestion {
            path: "data/expB".into(),
            kind: EntryKind::Directory,
        },
    });
    session.handle_event(GalleryEvent::TimerTick {
        now: start + Duration::from_secs(1),
    });

    assert_eq!(session.next_timer_deadline(), None);
    let column = session.column(&col(0)).unwrap();
    assert_eq!(column.path_template(), "data/expB/");
    assert_eq!(column.current_image_files(), &["f1.png", "f2.png"]);
}

#[test]
fn test_choosing_directory_suggestion_offers_its_entries() {
    // Arrange
    let mut session =
        GallerySession::with_default_columns(scenario_tree(), GalleryConfig::default());
    drain(&mut session);
    let suggestion = session.suggestions_for("data/expB").remove(0);
    assert!(suggestion.is_directory());

    // Act
    assert!(session.select_suggestion(&col(0), &suggestion));

    // Assert
    let commands = drain(&mut session);
    assert_eq!(
        suggestion_paths_for(&commands, &col(0)),
        Some(vec![
            "data/expB/f1.png".to_string(),
            "data/expB/f2.png".to_string()
        ])
    );
    assert_eq!(persist_count(&commands), 1);
}

#[test]
fn test_choosing_image_suggestion_opens_parent_and_focuses_image() {
    // Arrange
    let mut session = scenario_session();
    let suggestion = session.suggestions_for("data/expB/f2.png").remove(0);
    assert_eq!(suggestion.kind, EntryKind::Image);

    // Act
    session.handle_event(GalleryEvent::SuggestionChosen {
        column_id: col(0),
        suggestion,
    });

    // Assert
    let column = session.column(&col(0)).unwrap();
    assert_eq!(column.path_template(), "data/expB/");
    assert_eq!(column.current_filename(), Some("f2.png"));
    assert_eq!(session.image_index().focused_filename(), Some("f2.png"));
    assert_eq!(session.column(&col(1)).unwrap().current_index(), Some(1));

    let commands = drain(&mut session);
    assert_eq!(suggestion_paths_for(&commands, &col(0)), Some(Vec::new()));
    assert_eq!(persist_count(&commands), 1);
    assert_eq!(session.to_session_state().columns[0].current_index, Some(1));
}

#[test]
fn test_suggestions_are_capped_by_config() {
    let config = GalleryConfig {
        max_suggestions: 1,
        ..GalleryConfig::default()
    };
    let session = GallerySession::new(scenario_tree(), config);
    let candidates = session.suggestions_for("data/exp");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].path, "data/expA");
}

#[test]
fn test_reorder_columns_ignores_unknown_and_keeps_rest() {
    let mut session =
        GallerySession::with_default_columns(scenario_tree(), GalleryConfig::default());
    session.add_column(None);
    drain(&mut session);

    session.handle_event(GalleryEvent::ColumnsReordered {
        order: vec![col(2), col(9), col(0)],
    });

    let ids: Vec<ColumnId> = session.columns().iter().map(|c| c.id().clone()).collect();
    assert_eq!(ids, vec![col(2), col(0), col(1)]);
    let commands = drain(&mut session);
    assert_eq!(
        commands[0],
        GalleryCommand::SetColumnOrder {
            order: vec![col(2), col(0), col(1)]
        }
    );
    assert_eq!(persist_count(&commands), 1);
}

#[test]
fn test_operations_on_unknown_column_are_ignored() {
    let mut session = scenario_session();
    let before = session.to_session_state();

    assert!(!session.set_path_template(&col(7), "data/"));
    assert!(!session.change_dropdown(&col(7), 0, "expA", ChangeOrigin::User));
    assert!(!session.set_level_sync(&col(7), 0, false));
    assert!(!session.navigate_column(&col(7), 1));
    assert!(!session.on_path_input(&col(7), "x", Instant::now()));

    assert_eq!(session.to_session_state(), before);
    assert!(drain(&mut session).is_empty());
}

#[test]
fn test_sync_toggle_rerenders_dropdowns_with_flag() {
    let mut session = scenario_session();

    session.handle_event(GalleryEvent::LevelSyncToggled {
        column_id: col(0),
        level: 0,
        enabled: true,
    });

    let commands = drain(&mut session);
    let levels = commands.iter().find_map(|c| match c {
        GalleryCommand::RenderDropdowns { levels, .. } => Some(levels.clone()),
        _ => None,
    });
    let levels = levels.unwrap();
    assert_eq!(levels[0].options, vec!["expA", "expB"]);
    assert_eq!(levels[0].selected.as_deref(), Some("expA"));
    assert!(levels[0].sync_enabled);
    assert_eq!(persist_count(&commands), 1);
}
