//! UI event types.
//!
//! Everything the reducer reacts to arrives as a `UiEvent`: terminal input
//! polled by the runtime, and async results delivered through the inbox.

use crossterm::event::Event;
use sitectl_core::sync::SyncState;

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Frame timer; advances animations and triggers a redraw.
    Tick,
    /// Raw terminal input.
    Terminal(Event),
    /// The controller published a new snapshot.
    Sync(SyncState),
    /// A background action finished with something worth telling the user.
    Notice(String),
    /// The poll timer fired.
    PollDue,
}
