//! Headless driver that plays a recorded gesture script against a deck.
//!
//! Scripts are JSON arrays of timestamped pointer events:
//!
//! ```json
//! [
//!   { "t_ms": 0,   "card": 0, "kind": "down", "x": 200, "y": 300 },
//!   { "t_ms": 16,  "card": 0, "kind": "move", "x": 180, "y": 300 },
//!   { "t_ms": 32,  "card": 0, "kind": "up",   "x": 150, "y": 302 },
//!   { "t_ms": 900, "kind": "button", "direction": "accept" }
//! ]
//! ```

use crate::core::{DecisionSink, GestureTarget, PointerSample, SwipeDeck, Transition};
use crate::models::{Candidate, Decision, Direction};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One scripted input
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEvent {
    pub t_ms: f64,
    #[serde(default)]
    pub card: usize,
    #[serde(flatten)]
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptAction {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Cancel,
    /// Accept/reject button on the front card
    Button { direction: Direction },
}

/// Time-ordered list of scripted inputs
#[derive(Debug, Clone, Default)]
pub struct GestureScript {
    events: Vec<ScriptEvent>,
}

impl GestureScript {
    pub fn new(mut events: Vec<ScriptEvent>) -> Self {
        events.sort_by(|a, b| a.t_ms.total_cmp(&b.t_ms));
        Self { events }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let events = read_json(path.as_ref())?;
        Ok(Self::new(events))
    }

    pub fn events(&self) -> &[ScriptEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Load a JSON array of candidates
pub fn load_candidates<P: AsRef<Path>>(path: P) -> Result<Vec<Candidate>, ReplayError> {
    read_json(path.as_ref())
}

fn read_json<T>(path: &Path) -> Result<T, ReplayError>
where
    T: for<'de> Deserialize<'de>,
{
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ReplayError::Parse {
        path: display,
        source,
    })
}

/// Outcome of a replay run
#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub frames: usize,
    pub elapsed_ms: f64,
    pub ignored_events: usize,
    pub decisions: Vec<Decision>,
}

/// Give up waiting for animations after this many frames past the last event
const MAX_TAIL_FRAMES: usize = 60 * 30;

/// Steps a deck at a fixed frame rate while feeding it scripted input
#[derive(Debug, Clone, Copy)]
pub struct Replay {
    frame_ms: f64,
}

impl Replay {
    pub fn new(frame_ms: f64) -> Self {
        Self {
            frame_ms: frame_ms.max(1.0),
        }
    }

    /// Run on a simulated clock, as fast as possible
    pub fn run<S: DecisionSink>(&self, deck: &mut SwipeDeck<S>, script: &GestureScript) -> ReplaySummary {
        let mut summary = ReplaySummary::default();

        for event in script.events() {
            while summary.elapsed_ms + self.frame_ms <= event.t_ms {
                self.frame(deck, &mut summary);
            }
            dispatch(deck, event, &mut summary);
        }

        let mut tail = 0;
        while deck.is_animating() && tail < MAX_TAIL_FRAMES {
            self.frame(deck, &mut summary);
            tail += 1;
        }

        self.finish(deck, &summary);
        summary
    }

    /// Run against the wall clock, one frame per interval tick
    pub async fn run_paced<S: DecisionSink>(
        &self,
        deck: &mut SwipeDeck<S>,
        script: &GestureScript,
    ) -> ReplaySummary {
        let mut summary = ReplaySummary::default();
        let mut interval = tokio::time::interval(Duration::from_secs_f64(self.frame_ms / 1000.0));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        for event in script.events() {
            while summary.elapsed_ms + self.frame_ms <= event.t_ms {
                interval.tick().await;
                self.frame(deck, &mut summary);
            }
            dispatch(deck, event, &mut summary);
        }

        let mut tail = 0;
        while deck.is_animating() && tail < MAX_TAIL_FRAMES {
            interval.tick().await;
            self.frame(deck, &mut summary);
            tail += 1;
        }

        self.finish(deck, &summary);
        summary
    }

    fn frame<S: DecisionSink>(&self, deck: &mut SwipeDeck<S>, summary: &mut ReplaySummary) {
        let decided = deck.tick(self.frame_ms);
        summary.decisions.extend(decided);
        summary.frames += 1;
        summary.elapsed_ms += self.frame_ms;

        if tracing::enabled!(tracing::Level::TRACE) {
            if let Some(front) = deck.frontmost() {
                if let Some(t) = deck.transform(front) {
                    tracing::trace!("frame {} card {}: {}", summary.frames, front, t.css());
                }
            }
        }
    }

    fn finish<S: DecisionSink>(&self, deck: &SwipeDeck<S>, summary: &ReplaySummary) {
        if deck.is_animating() {
            tracing::warn!("Replay stopped with animations still running");
        }
        tracing::info!(
            "Replay finished: {} frames, {:.0}ms, {} decisions, {} cards pending",
            summary.frames,
            summary.elapsed_ms,
            summary.decisions.len(),
            deck.pending_count()
        );
    }
}

fn dispatch<S: DecisionSink>(deck: &mut SwipeDeck<S>, event: &ScriptEvent, summary: &mut ReplaySummary) {
    let transition = match event.action {
        ScriptAction::Down { x, y } => deck.bind(event.card).pointer_down(PointerSample::new(event.t_ms, x, y)),
        ScriptAction::Move { x, y } => deck.bind(event.card).pointer_move(PointerSample::new(event.t_ms, x, y)),
        ScriptAction::Up { x, y } => deck.bind(event.card).pointer_up(PointerSample::new(event.t_ms, x, y)),
        ScriptAction::Cancel => deck.bind(event.card).pointer_cancel(),
        ScriptAction::Button { direction } => deck.swipe(direction),
    };

    match transition {
        Transition::Ignored => {
            summary.ignored_events += 1;
            tracing::debug!("t={}ms card {}: {:?} ignored", event.t_ms, event.card, event.action);
        }
        Transition::Moved => {}
        other => tracing::debug!("t={}ms card {}: {:?}", event.t_ms, event.card, other),
    }
}

/// Drive a deck directly through the gesture interface, bypassing pointer
/// sampling. Useful for hosts that compute velocity themselves.
pub fn flick<T: GestureTarget>(target: &mut T, card: usize, vx: f64, dx: f64) -> Transition {
    use crate::core::Vec2;

    if target.on_gesture_start(card) != Transition::Grabbed {
        return Transition::Ignored;
    }
    target.on_gesture_move(card, Vec2::new(dx, 0.0));
    target.on_gesture_end(card, Vec2::new(vx, 0.0), Vec2::new(dx, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_parses_and_sorts() {
        let script = GestureScript::from_json(
            r#"[
                { "t_ms": 40, "card": 0, "kind": "up", "x": 0, "y": 0 },
                { "t_ms": 0, "card": 0, "kind": "down", "x": 10, "y": 0 },
                { "t_ms": 90, "kind": "button", "direction": "reject" },
                { "t_ms": 20, "card": 0, "kind": "cancel" }
            ]"#,
        )
        .unwrap();

        let times: Vec<f64> = script.events().iter().map(|e| e.t_ms).collect();
        assert_eq!(times, vec![0.0, 20.0, 40.0, 90.0]);
        assert!(matches!(
            script.events()[3].action,
            ScriptAction::Button { direction: Direction::Reject }
        ));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = GestureScript::from_json(r#"[{ "t_ms": 0, "kind": "pinch" }]"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = GestureScript::load("/nonexistent/gestures.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/gestures.json"));
    }
}
