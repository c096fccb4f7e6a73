use tokio::sync::mpsc;

use crate::core::card::{Card, CardState, CardStatus, DeckTuning, Transform, Transition};
use crate::core::gesture::{GestureTracker, PointerSample, Vec2};
use crate::core::layout::{CardLayout, LayoutSource};
use crate::models::{Candidate, Decision, Direction};

/// Release speed used for the accept/reject buttons, in units/ms
pub const BUTTON_FLICK_VELOCITY: f64 = 1.0;

/// Receives decisions as cards finish leaving the deck
pub trait DecisionSink {
    fn on_decision(&mut self, decision: &Decision);
}

impl<F> DecisionSink for F
where
    F: FnMut(&Decision),
{
    fn on_decision(&mut self, decision: &Decision) {
        self(decision)
    }
}

impl DecisionSink for mpsc::UnboundedSender<Decision> {
    fn on_decision(&mut self, decision: &Decision) {
        if self.send(decision.clone()).is_err() {
            tracing::warn!(
                "Decision receiver dropped, discarding {} for {}",
                decision.direction,
                decision.candidate_id
            );
        }
    }
}

/// Gesture-to-state interface, independent of any pointer event source
pub trait GestureTarget {
    fn on_gesture_start(&mut self, card: usize) -> Transition;

    /// `displacement` is measured from where the gesture started
    fn on_gesture_move(&mut self, card: usize, displacement: Vec2) -> Transition;

    /// `velocity` is in units/ms
    fn on_gesture_end(&mut self, card: usize, velocity: Vec2, displacement: Vec2) -> Transition;
}

/// Stack of candidate cards driven by drag gestures
///
/// Index 0 is the front of the deck. Only the frontmost card that is not
/// already leaving accepts gestures. Each card reports its decision to the
/// sink exactly once, when its exit animation completes.
pub struct SwipeDeck<S: DecisionSink> {
    cards: Vec<Card>,
    tuning: DeckTuning,
    sink: S,
    pointer: Option<(usize, GestureTracker)>,
}

impl<S: DecisionSink> SwipeDeck<S> {
    pub fn new(
        candidates: Vec<Candidate>,
        tuning: DeckTuning,
        layout: &mut dyn LayoutSource,
        sink: S,
    ) -> Self {
        let cards: Vec<Card> = candidates
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| Card::new(candidate, CardLayout::for_index(i, layout), &tuning))
            .collect();

        tracing::debug!("Created deck with {} cards", cards.len());

        Self {
            cards,
            tuning,
            sink,
            pointer: None,
        }
    }

    pub fn tuning(&self) -> &DeckTuning {
        &self.tuning
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn state(&self, index: usize) -> Option<CardState> {
        self.cards.get(index).map(Card::state)
    }

    pub fn status(&self, index: usize) -> Option<CardStatus> {
        self.cards.get(index).map(Card::status)
    }

    /// Index of the card that currently accepts gestures
    pub fn frontmost(&self) -> Option<usize> {
        self.cards.iter().position(Card::is_interactive)
    }

    pub fn pending_count(&self) -> usize {
        self.cards
            .iter()
            .filter(|c| c.status() == CardStatus::Pending)
            .count()
    }

    /// Every card has been decided
    pub fn is_finished(&self) -> bool {
        self.pending_count() == 0
    }

    pub fn is_animating(&self) -> bool {
        self.cards.iter().any(Card::is_animating)
    }

    pub fn transform(&self, index: usize) -> Option<Transform> {
        self.cards.get(index).map(Card::transform)
    }

    pub fn transforms(&self) -> Vec<Transform> {
        self.cards.iter().map(Card::transform).collect()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Commit the frontmost card without a gesture, as the card buttons do
    pub fn swipe(&mut self, direction: Direction) -> Transition {
        let Some(index) = self.frontmost() else {
            return Transition::Ignored;
        };

        if self.pointer.as_ref().is_some_and(|(i, _)| *i == index) {
            self.pointer = None;
        }

        let card = &mut self.cards[index];
        card.commit_exit(direction, BUTTON_FLICK_VELOCITY, &self.tuning);
        tracing::debug!("Card {} ({}) swiped {} by button", index, card.id(), direction);

        Transition::Exiting(direction)
    }

    /// Return a card to its rest pose, abandoning any drag in progress.
    /// A card already idle is left untouched.
    pub fn settle(&mut self, index: usize) -> Transition {
        if self.pointer.as_ref().is_some_and(|(i, _)| *i == index) {
            self.pointer = None;
        }

        match self.cards.get_mut(index) {
            Some(card) => card.settle(&self.tuning),
            None => Transition::Ignored,
        }
    }

    /// Advance every card's animation by `dt_ms`. Decisions completed during
    /// this tick are delivered to the sink and also returned.
    pub fn tick(&mut self, dt_ms: f64) -> Vec<Decision> {
        let mut decided = Vec::new();

        for (index, card) in self.cards.iter_mut().enumerate() {
            if let Some(direction) = card.step(dt_ms) {
                let decision = Decision::new(card.id(), direction);
                tracing::info!(
                    "Card {} resolved: {} -> {}",
                    index,
                    decision.candidate_id,
                    decision.direction
                );
                self.sink.on_decision(&decision);
                decided.push(decision);
            }
        }

        decided
    }

    /// Pointer-event handle for one card
    pub fn bind(&mut self, index: usize) -> CardBinding<'_, S> {
        CardBinding { deck: self, index }
    }

    fn is_front(&self, index: usize) -> bool {
        self.frontmost() == Some(index)
    }
}

impl<S: DecisionSink> GestureTarget for SwipeDeck<S> {
    fn on_gesture_start(&mut self, card: usize) -> Transition {
        if !self.is_front(card) {
            tracing::trace!("Ignoring gesture on card {}: not frontmost", card);
            return Transition::Ignored;
        }

        let transition = self.cards[card].begin_drag(&self.tuning);
        tracing::debug!("Gesture start on card {}: {:?}", card, transition);
        transition
    }

    fn on_gesture_move(&mut self, card: usize, displacement: Vec2) -> Transition {
        match self.cards.get_mut(card) {
            Some(c) => c.drag_by(displacement),
            None => Transition::Ignored,
        }
    }

    fn on_gesture_end(&mut self, card: usize, velocity: Vec2, displacement: Vec2) -> Transition {
        let Some(c) = self.cards.get_mut(card) else {
            return Transition::Ignored;
        };

        let transition = c.release(velocity, displacement, &self.tuning);
        tracing::debug!(
            "Gesture end on card {} (vx={:.3}, dx={:.1}): {:?}",
            card,
            velocity.x,
            displacement.x,
            transition
        );
        transition
    }
}

/// Binds raw pointer samples for one card to the deck's gesture interface
pub struct CardBinding<'a, S: DecisionSink> {
    deck: &'a mut SwipeDeck<S>,
    index: usize,
}

impl<S: DecisionSink> CardBinding<'_, S> {
    pub fn pointer_down(&mut self, sample: PointerSample) -> Transition {
        let transition = self.deck.on_gesture_start(self.index);
        if transition == Transition::Grabbed {
            let mut tracker = GestureTracker::new();
            tracker.begin(sample);
            self.deck.pointer = Some((self.index, tracker));
        }
        transition
    }

    pub fn pointer_move(&mut self, sample: PointerSample) -> Transition {
        let displacement = match self.deck.pointer.as_mut() {
            Some((i, tracker)) if *i == self.index => tracker.update(sample),
            _ => None,
        };

        match displacement {
            Some(d) => self.deck.on_gesture_move(self.index, d),
            None => Transition::Ignored,
        }
    }

    pub fn pointer_up(&mut self, sample: PointerSample) -> Transition {
        let release = match self.deck.pointer.take() {
            Some((i, mut tracker)) if i == self.index => tracker.finish(sample),
            other => {
                self.deck.pointer = other;
                None
            }
        };

        match release {
            Some(r) => self.deck.on_gesture_end(self.index, r.velocity, r.displacement),
            None => Transition::Ignored,
        }
    }

    /// Pointer lost (e.g. touch cancelled); the card settles back
    pub fn pointer_cancel(&mut self) -> Transition {
        self.deck.settle(self.index)
    }
}
