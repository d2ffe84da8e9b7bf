//! Property-based tests for the reorder planner.
//!
//! Uses proptest to verify:
//! 1. Any move keeps every column's positions dense (`0..n`, no gaps).
//! 2. The moved task lands at the requested slot, clamped to the column.
//! 3. Re-applying a move, or lying about the source slot, changes nothing
//!    beyond what the first application did.
//! 4. Moves never touch unrelated columns and never lose tasks.

use proptest::prelude::*;

use syncboard::board::{PositionPatch, ReorderError, reorder};
use syncboard_proto::task::{Category, OwnerId, Task, TaskId, Timestamp};

// --- Strategies ---

/// Strategy for one of the three board columns.
fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Todo),
        Just(Category::InProgress),
        Just(Category::Done),
    ]
}

/// Strategy for a well-formed board: up to five tasks per column, each
/// column's positions dense from zero.
fn arb_board() -> impl Strategy<Value = Vec<Task>> {
    (0_u32..=5, 0_u32..=5, 0_u32..=5).prop_map(|(todo, doing, done)| {
        let mut tasks = Vec::new();
        for (category, count) in [
            (Category::Todo, todo),
            (Category::InProgress, doing),
            (Category::Done, done),
        ] {
            for position in 0..count {
                tasks.push(Task {
                    id: TaskId::new(),
                    owner: OwnerId::from("user-1"),
                    title: format!("{category} {position}"),
                    description: None,
                    category,
                    position,
                    created_at: Timestamp::from_millis(u64::from(position)),
                });
            }
        }
        tasks
    })
}

/// Strategy for a non-empty board plus one move request targeting a task
/// on it: the task's index, a destination column, and a requested slot
/// that may point past the end of the column.
fn arb_board_and_move() -> impl Strategy<Value = (Vec<Task>, usize, Category, u32)> {
    arb_board()
        .prop_filter("board must not be empty", |tasks| !tasks.is_empty())
        .prop_flat_map(|tasks| {
            let len = tasks.len();
            (Just(tasks), 0..len, arb_category(), 0_u32..10)
        })
}

// --- Helpers ---

/// Applies a patch set to a copy of the board.
fn apply(tasks: &[Task], patches: &[PositionPatch]) -> Vec<Task> {
    let mut after = tasks.to_vec();
    for patch in patches {
        let task = after
            .iter_mut()
            .find(|task| task.id == patch.id)
            .expect("patch must target a task on the board");
        task.category = patch.category;
        task.position = patch.position;
    }
    after
}

/// The board sorted by placement, for order-insensitive comparison.
fn by_placement(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_unstable_by_key(|task| (task.category, task.position));
    sorted
}

proptest! {
    /// After any move, every column's positions are `0..n` with no gaps
    /// and no duplicates.
    #[test]
    fn any_move_keeps_columns_dense((tasks, index, dest_category, dest_index) in arb_board_and_move()) {
        let moved = tasks[index].clone();
        let patches = reorder(&tasks, &moved.id, moved.category, moved.position, dest_category, dest_index)
            .expect("task is on the board");
        let after = apply(&tasks, &patches);

        for category in Category::ALL {
            let mut positions: Vec<u32> = after
                .iter()
                .filter(|task| task.category == category)
                .map(|task| task.position)
                .collect();
            positions.sort_unstable();
            let expected: Vec<u32> = (0..u32::try_from(positions.len()).expect("small board")).collect();
            prop_assert_eq!(positions, expected, "column {} has gaps", category);
        }
    }

    /// The moved task ends up in the destination column at the requested
    /// slot, clamped to the number of other tasks there.
    #[test]
    fn moved_task_lands_at_the_clamped_slot((tasks, index, dest_category, dest_index) in arb_board_and_move()) {
        let moved = tasks[index].clone();
        let others_at_dest = tasks
            .iter()
            .filter(|task| task.category == dest_category && task.id != moved.id)
            .count();
        let expected = dest_index.min(u32::try_from(others_at_dest).expect("small board"));

        let patches = reorder(&tasks, &moved.id, moved.category, moved.position, dest_category, dest_index)
            .expect("task is on the board");
        let after = apply(&tasks, &patches);
        let landed = after
            .iter()
            .find(|task| task.id == moved.id)
            .expect("moved task is still on the board");

        prop_assert_eq!(landed.category, dest_category);
        prop_assert_eq!(landed.position, expected);
    }

    /// Repeating the exact same request against the already-moved board
    /// is a no-op: the stored placement wins over the stated source.
    #[test]
    fn reapplying_the_same_move_changes_nothing((tasks, index, dest_category, dest_index) in arb_board_and_move()) {
        let moved = tasks[index].clone();
        let patches = reorder(&tasks, &moved.id, moved.category, moved.position, dest_category, dest_index)
            .expect("task is on the board");
        let first = apply(&tasks, &patches);

        let again = reorder(&first, &moved.id, moved.category, moved.position, dest_category, dest_index)
            .expect("task is still on the board");
        let second = apply(&first, &again);

        prop_assert!(again.is_empty(), "second application must patch nothing");
        prop_assert_eq!(by_placement(&first), by_placement(&second));
    }

    /// The stated source slot is advisory: whatever the caller claims,
    /// the outcome matches a request with the accurate coordinates.
    #[test]
    fn stale_source_coordinates_do_not_change_the_outcome(
        (tasks, index, dest_category, dest_index) in arb_board_and_move(),
        claimed_category in arb_category(),
        claimed_index in 0_u32..10,
    ) {
        let moved = tasks[index].clone();
        let accurate = reorder(&tasks, &moved.id, moved.category, moved.position, dest_category, dest_index)
            .expect("task is on the board");
        let claimed = reorder(&tasks, &moved.id, claimed_category, claimed_index, dest_category, dest_index)
            .expect("task is on the board");
        prop_assert_eq!(accurate, claimed);
    }

    /// Dropping a task back onto its own slot yields an empty patch set.
    #[test]
    fn dropping_onto_own_slot_patches_nothing((tasks, index, _, _) in arb_board_and_move()) {
        let moved = tasks[index].clone();
        let patches = reorder(&tasks, &moved.id, moved.category, moved.position, moved.category, moved.position)
            .expect("task is on the board");
        prop_assert!(patches.is_empty());
    }

    /// Patches only ever touch the source and destination columns, and
    /// each task at most once.
    #[test]
    fn patches_stay_inside_the_affected_columns((tasks, index, dest_category, dest_index) in arb_board_and_move()) {
        let moved = tasks[index].clone();
        let patches = reorder(&tasks, &moved.id, moved.category, moved.position, dest_category, dest_index)
            .expect("task is on the board");

        let mut seen = Vec::new();
        for patch in &patches {
            let original = tasks
                .iter()
                .find(|task| task.id == patch.id)
                .expect("patch must target a task on the board");
            prop_assert!(
                original.category == moved.category || original.category == dest_category,
                "patched a task in an unrelated column"
            );
            prop_assert!(!seen.contains(&patch.id), "task patched twice");
            seen.push(patch.id.clone());
        }
    }

    /// A move never creates or destroys tasks.
    #[test]
    fn moves_preserve_the_task_set((tasks, index, dest_category, dest_index) in arb_board_and_move()) {
        let moved = tasks[index].clone();
        let patches = reorder(&tasks, &moved.id, moved.category, moved.position, dest_category, dest_index)
            .expect("task is on the board");
        let after = apply(&tasks, &patches);

        prop_assert_eq!(after.len(), tasks.len());
        for task in &tasks {
            prop_assert!(after.iter().any(|t| t.id == task.id), "task vanished");
        }
    }

    /// Asking to move a task that is not on the board is an error, for
    /// any board and any coordinates.
    #[test]
    fn unknown_task_is_rejected(
        tasks in arb_board(),
        source in arb_category(),
        dest in arb_category(),
        dest_index in 0_u32..10,
    ) {
        let ghost = TaskId::new();
        let result = reorder(&tasks, &ghost, source, 0, dest, dest_index);
        prop_assert_eq!(result, Err(ReorderError::TaskNotFound(ghost)));
    }
}
