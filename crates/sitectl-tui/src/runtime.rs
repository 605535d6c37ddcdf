//! Dashboard runtime: owns the terminal, runs the event loop, executes effects.
//!
//! This is the only place side effects happen. The reducer stays pure and
//! produces effects; this module turns them into controller calls.
//!
//! ## Inbox Pattern
//!
//! Background work reports back through a single unbounded channel:
//! - a forwarder task pushes every controller snapshot as `UiEvent::Sync`
//! - spawned effects push a `UiEvent::Notice` when they have something to say
//! - the optional poll timer pushes `UiEvent::PollDue`
//!
//! The loop drains the inbox each frame, so no task ever touches `AppState`.

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use sitectl_core::interrupt;
use sitectl_core::status::StatusService;
use sitectl_core::sync::{StatusSync, ToggleOutcome};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Target frame rate while something is animating (~60fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll duration when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

type UiEventSender = mpsc::UnboundedSender<UiEvent>;
type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Full-screen dashboard runtime.
///
/// Terminal state is restored on drop, panic, or a forced second Ctrl+C.
pub struct TuiRuntime<S> {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    sync: Arc<StatusSync<S>>,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    /// Stops the forwarder and poll timer when the runtime goes away.
    cancel: CancellationToken,
    poll_interval: Option<Duration>,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl<S: StatusService> TuiRuntime<S> {
    /// Creates a runtime and enters the alternate screen.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(
        sync: Arc<StatusSync<S>>,
        state: AppState,
        poll_interval: Option<Duration>,
    ) -> Result<Self> {
        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();
        interrupt::set_restore_hook(|| {
            let _ = terminal::restore_terminal();
        });
        interrupt::reset();

        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let now = Instant::now();
        Ok(Self {
            terminal,
            state,
            sync,
            inbox_tx,
            inbox_rx,
            cancel: CancellationToken::new(),
            poll_interval,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Starts background tasks, loads the site flag, and runs until quit.
    ///
    /// # Errors
    /// Returns an error if drawing or reading terminal input fails.
    pub fn run(&mut self) -> Result<()> {
        self.spawn_forwarder();
        self.spawn_poll_timer();

        let sync = Arc::clone(&self.sync);
        self.spawn_effect(async move {
            // Failure lands in SyncState::last_error via the forwarder.
            let _ = sync.initialize().await;
            None
        });

        let result = self.event_loop();
        self.cancel.cancel();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            if interrupt::is_interrupted() {
                self.state.should_quit = true;
                break;
            }

            let events = self.collect_events()?;
            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                // Only Tick triggers render, capping the frame rate
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let tick_interval = if self.state.is_busy() || recent_terminal_activity {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let time_until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
        let poll_duration = if events.is_empty() {
            time_until_tick
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Background Tasks
    // ========================================================================

    /// Relays every controller snapshot into the inbox.
    fn spawn_forwarder(&self) {
        let mut rx = self.sync.subscribe();
        let tx = self.inbox_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = rx.borrow_and_update().clone();
                        if tx.send(UiEvent::Sync(snapshot)).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    fn spawn_poll_timer(&self) {
        let Some(period) = self.poll_interval else {
            return;
        };
        debug!(secs = period.as_secs(), "Polling site status");
        let tx = self.inbox_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately; the initial load covers it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(UiEvent::PollDue).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns an async effect and delivers its optional result event.
    fn spawn_effect<Fut>(&self, fut: Fut)
    where
        Fut: Future<Output = Option<UiEvent>> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            if let Some(event) = fut.await {
                let _ = tx.send(event);
            }
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        debug!(?effect, "Executing effect");
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::Toggle => {
                let sync = Arc::clone(&self.sync);
                self.spawn_effect(async move { toggle_notice(&sync.toggle().await) });
            }
            UiEffect::Refresh => {
                let sync = Arc::clone(&self.sync);
                self.spawn_effect(async move {
                    // Errors surface through SyncState::last_error.
                    let _ = sync.refresh().await;
                    None
                });
            }
        }
    }
}

/// Message shown after a toggle, if any.
///
/// Failures are rendered from `SyncState::last_error`, so only an
/// overridden write needs its own notice.
fn toggle_notice(outcome: &ToggleOutcome) -> Option<UiEvent> {
    match outcome {
        ToggleOutcome::Applied { status, .. } if outcome.was_overridden() => Some(
            UiEvent::Notice(format!("Server kept the site {}", status.label())),
        ),
        _ => None,
    }
}

impl<S> Drop for TuiRuntime<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
        let _ = terminal::restore_terminal();
    }
}

#[cfg(test)]
mod tests {
    use sitectl_core::status::{Status, StatusError};

    use super::*;

    #[test]
    fn test_override_produces_notice() {
        let outcome = ToggleOutcome::Applied {
            previous: Status::LIVE,
            requested: Status::MAINTENANCE,
            status: Status::LIVE,
        };
        match toggle_notice(&outcome) {
            Some(UiEvent::Notice(message)) => assert_eq!(message, "Server kept the site Live"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_plain_outcomes_are_silent() {
        let applied = ToggleOutcome::Applied {
            previous: Status::LIVE,
            requested: Status::MAINTENANCE,
            status: Status::MAINTENANCE,
        };
        assert!(toggle_notice(&applied).is_none());
        assert!(toggle_notice(&ToggleOutcome::Skipped).is_none());
        assert!(toggle_notice(&ToggleOutcome::Failed(StatusError::network("x"))).is_none());
    }
}
