//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! The reducer never talks to the controller directly.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,
    /// Flip the site flag.
    Toggle,
    /// Re-read the site flag (also the retry after a failed load).
    Refresh,
}
