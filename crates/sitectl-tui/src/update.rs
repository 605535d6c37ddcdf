//! Dashboard reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Terminal(Event::Key(key)) if key.kind == KeyEventKind::Press => {
            handle_key(app, key)
        }
        UiEvent::Terminal(_) => vec![],
        UiEvent::Sync(site) => {
            app.site = site;
            vec![]
        }
        UiEvent::Notice(message) => {
            app.notice = Some(message);
            vec![]
        }
        UiEvent::PollDue => refresh(app),
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => quit(app),
        KeyCode::Char('q') | KeyCode::Esc => quit(app),
        KeyCode::Char(' ' | 't') | KeyCode::Enter => toggle(app),
        KeyCode::Char('r') => refresh(app),
        _ => vec![],
    }
}

fn quit(app: &mut AppState) -> Vec<UiEffect> {
    app.should_quit = true;
    vec![UiEffect::Quit]
}

fn toggle(app: &mut AppState) -> Vec<UiEffect> {
    if !app.site.can_toggle() {
        return vec![];
    }
    // Mirror the controller's guard until its snapshot arrives.
    app.site.pending = true;
    app.notice = None;
    vec![UiEffect::Toggle]
}

fn refresh(app: &mut AppState) -> Vec<UiEffect> {
    if app.site.pending {
        return vec![];
    }
    app.notice = None;
    vec![UiEffect::Refresh]
}
