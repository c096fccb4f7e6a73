// Swipe deck core
pub mod card;
pub mod deck;
pub mod gesture;
pub mod layout;
pub mod spring;

pub use card::{Card, CardState, CardStatus, DeckTuning, DragState, Transform, Transition};
pub use deck::{CardBinding, DecisionSink, GestureTarget, SwipeDeck, BUTTON_FLICK_VELOCITY};
pub use gesture::{GestureTracker, PointerSample, Release, Vec2};
pub use layout::{CardLayout, FixedLayout, LayoutSource, SeededLayout};
pub use spring::{Spring, SpringConfig};
