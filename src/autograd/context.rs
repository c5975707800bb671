//! Gradient-recording mode
//!
//! Inference passes (index building, visualisation, generation) run inside
//! [`no_grad`] so operations skip recording backward nodes.

use std::cell::Cell;

thread_local! {
    static GRAD_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Whether operations currently record backward nodes
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(Cell::get)
}

/// Run `f` with graph recording disabled, restoring the previous mode after
pub fn no_grad<T>(f: impl FnOnce() -> T) -> T {
    let _guard = NoGradGuard::new();
    f()
}

/// Restores the previous recording mode on drop (also on unwind)
struct NoGradGuard {
    previous: bool,
}

impl NoGradGuard {
    fn new() -> Self {
        let previous = GRAD_ENABLED.with(|g| g.replace(false));
        Self { previous }
    }
}

impl Drop for NoGradGuard {
    fn drop(&mut self) {
        GRAD_ENABLED.with(|g| g.set(self.previous));
    }
}
