//! SoloConnect - swipe deck core for the SoloConnect travel dating app
//!
//! The deck turns drag gestures on a stack of profile cards into spring
//! animations and accept/reject decisions. The services module talks to the
//! Supabase backend for auth, profiles and recorded swipes.

pub mod config;
pub mod core;
pub mod models;
pub mod replay;
pub mod services;

// Re-export commonly used types
pub use core::{DeckTuning, DecisionSink, GestureTarget, SwipeDeck, Transition};
pub use models::{Candidate, Decision, Direction, Profile};
