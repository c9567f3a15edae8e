/*
 * Applies a dropdown change to a column and replicates it across columns.
 *
 * The local update keeps deeper selections when the column's path still resolves
 * with them in place (same sibling names exist under the new branch) and truncates
 * below the changed level otherwise. Propagation only happens for user-originated
 * changes; every target gets the same local update, making its own preserve-or-reset
 * decision against its own template and selections. Targets are never propagated
 * from, which rules out cycles.
 */
use super::column_state::{ColumnId, ColumnState};
use super::directory_tree::DirectoryTree;
use super::path_resolver::{dropdown_levels, is_valid_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    User,
    Propagated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalUpdate {
    pub preserved_deeper: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    /* Every column whose selections were rewritten, the source first. */
    pub updated_columns: Vec<ColumnId>,
}

pub fn apply_level_change(
    column: &mut ColumnState,
    tree: &DirectoryTree,
    level: usize,
    value: &str,
) -> LocalUpdate {
    let old_selections = column.selections();
    let mut prefix: Vec<String> = old_selections.iter().take(level).cloned().collect();
    prefix.resize(level, String::new());

    let mut preserved_deeper = false;
    let mut final_selections = prefix.clone();
    if !value.is_empty() {
        let mut candidate = prefix.clone();
        candidate.push(value.to_string());
        candidate.extend(old_selections.iter().skip(level + 1).cloned());
        if is_valid_path(tree, column.path_template(), &candidate) {
            preserved_deeper = true;
            final_selections = candidate;
        } else {
            final_selections.push(value.to_string());
        }
    }

    log::debug!(
        "SyncEngine: Column {} level {level} -> '{value}', deeper levels {}.",
        column.id(),
        if preserved_deeper { "kept" } else { "reset" }
    );

    column.set_selections(final_selections);
    column.set_current_index(None);
    if !preserved_deeper {
        column.clear_sync_flags_below(level);
    }
    LocalUpdate { preserved_deeper }
}

/*
 * Whether `target` should follow a change of `level` to `value`. The target is left
 * alone when it opted out of this level, when its own selector at this level does
 * not offer `value` (the empty placeholder is always offered), or when it already
 * shows `value`.
 */
fn accepts_propagation(
    target: &ColumnState,
    tree: &DirectoryTree,
    level: usize,
    value: &str,
) -> bool {
    if !target.is_sync_enabled(level) {
        log::trace!("SyncEngine: Column {} has level {level} sync disabled.", target.id());
        return false;
    }
    let levels = dropdown_levels(
        tree,
        target.path_template(),
        target.selections(),
        target.sync_disabled(),
    );
    let Some(rendered) = levels.get(level) else {
        return false;
    };
    if !value.is_empty() && !rendered.has_option(value) {
        log::trace!(
            "SyncEngine: Column {} has no option '{value}' at level {level}.",
            target.id()
        );
        return false;
    }
    rendered.current_value() != value
}

pub fn handle_dropdown_change(
    columns: &mut [ColumnState],
    tree: &DirectoryTree,
    source_id: &ColumnId,
    level: usize,
    value: &str,
    origin: ChangeOrigin,
) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();
    let Some(source) = columns.iter_mut().find(|c| c.id() == source_id) else {
        log::warn!("SyncEngine: Change for unknown column {source_id} ignored.");
        return outcome;
    };
    apply_level_change(source, tree, level, value);
    outcome.updated_columns.push(source_id.clone());

    if origin == ChangeOrigin::Propagated {
        return outcome;
    }

    for target in columns.iter_mut().filter(|c| c.id() != source_id) {
        if accepts_propagation(target, tree, level, value) {
            log::debug!(
                "SyncEngine: Syncing column {} at level {level} to '{value}'.",
                target.id()
            );
            apply_level_change(target, tree, level, value);
            outcome.updated_columns.push(target.id().clone());
        }
    }
    outcome
}
