//! Scene progression arithmetic.
//!
//! Steps are kept ordered by `position`; the scene state stores an index into
//! that ordered list.

/// Index after advancing one step. Advancing past the last step wraps to 0.
///
/// Returns `None` when the scene has no steps.
pub fn next_step_index(current: usize, step_count: usize) -> Option<usize> {
    if step_count == 0 {
        return None;
    }
    Some((current % step_count + 1) % step_count)
}

/// Clamp a possibly stale index into `[0, step_count - 1]`.
///
/// Returns `None` when the scene has no steps.
pub fn clamp_step_index(index: usize, step_count: usize) -> Option<usize> {
    if step_count == 0 {
        return None;
    }
    Some(index.min(step_count - 1))
}

/// Position for a step appended after `last_position`.
pub fn next_step_position(last_position: Option<u32>) -> u32 {
    last_position.map_or(0, |position| position + 1)
}
