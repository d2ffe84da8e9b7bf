//! Pure position arithmetic for drag-and-drop reordering.
//!
//! [`reorder`] turns "move this task to that slot" into a minimal patch
//! set over a snapshot of the board. It never touches storage; callers
//! apply the patches wherever their truth lives.

use syncboard_proto::task::{Category, Task, TaskId};

/// New placement for one task, produced by [`reorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionPatch {
    /// The task being repositioned.
    pub id: TaskId,
    /// Column the task lands in.
    pub category: Category,
    /// Position within that column.
    pub position: u32,
}

/// Error returned when a reorder cannot be computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    /// The task to move is not in the given collection.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
}

/// Computes the patch set that moves `task_id` to `dest_index` in
/// `dest_category`, keeping every column's positions dense (`0..n-1`,
/// no gaps, no duplicates).
///
/// The collection is the truth for where the task currently sits; a
/// caller-stated source slot that disagrees (stale drag coordinates, or a
/// repeated call after the patches already landed) is overridden by the
/// stored placement, which makes re-applying the same move a no-op.
/// `dest_index` past the end of the destination column is clamped to
/// append.
///
/// Tasks whose placement does not change get no patch entry. Moving a
/// task onto the slot it already occupies yields an empty patch set.
///
/// # Errors
///
/// Returns [`ReorderError::TaskNotFound`] if `task_id` is not in `tasks`.
pub fn reorder(
    tasks: &[Task],
    task_id: &TaskId,
    source_category: Category,
    source_index: u32,
    dest_category: Category,
    dest_index: u32,
) -> Result<Vec<PositionPatch>, ReorderError> {
    let moved = tasks
        .iter()
        .find(|task| task.id == *task_id)
        .ok_or_else(|| ReorderError::TaskNotFound(task_id.clone()))?;

    if moved.category != source_category || moved.position != source_index {
        tracing::debug!(
            task = %task_id,
            stated_category = %source_category,
            stated_index = source_index,
            actual_category = %moved.category,
            actual_index = moved.position,
            "stale move source, using stored placement"
        );
    }
    let source_category = moved.category;
    let source_index = moved.position;

    // Clamp against the destination column as it will look once the moved
    // task is out of it.
    let dest_len = tasks
        .iter()
        .filter(|task| task.category == dest_category && task.id != *task_id)
        .count();
    let dest_index = dest_index.min(u32::try_from(dest_len).unwrap_or(u32::MAX));

    if source_category == dest_category && source_index == dest_index {
        return Ok(Vec::new());
    }

    let mut patches = Vec::new();
    for task in tasks {
        if task.id == *task_id {
            continue;
        }
        let mut position = task.position;
        if task.category == source_category && position > source_index {
            position -= 1;
        }
        if task.category == dest_category && position >= dest_index {
            position += 1;
        }
        if position != task.position {
            patches.push(PositionPatch {
                id: task.id.clone(),
                category: task.category,
                position,
            });
        }
    }
    patches.push(PositionPatch {
        id: task_id.clone(),
        category: dest_category,
        position: dest_index,
    });
    Ok(patches)
}
