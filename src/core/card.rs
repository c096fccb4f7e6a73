use crate::core::gesture::Vec2;
use crate::core::layout::{CardLayout, ENTRY_OFFSET_Y, ENTRY_SCALE};
use crate::core::spring::{Spring, SpringConfig};
use crate::models::{Candidate, Direction};

/// Animation and commit parameters shared by every card of a deck
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckTuning {
    /// Minimum release speed (units/ms) that commits a card to exit
    pub trigger_velocity: f64,
    /// Width of the host viewport in layout units
    pub viewport_width: f64,
    /// Distance past the viewport edge an exiting card travels to
    pub exit_margin: f64,
    pub friction: f64,
    /// Stiffness while the card is held
    pub drag_tension: f64,
    /// Stiffness while returning to rest
    pub settle_tension: f64,
    /// Stiffness while flying off screen
    pub exit_tension: f64,
    pub precision: f64,
    /// Animate cards into the stack on creation
    pub entry_animation: bool,
}

impl DeckTuning {
    pub fn drag_spring(&self) -> SpringConfig {
        SpringConfig::new(self.drag_tension, self.friction).with_precision(self.precision)
    }

    pub fn settle_spring(&self) -> SpringConfig {
        SpringConfig::new(self.settle_tension, self.friction).with_precision(self.precision)
    }

    pub fn exit_spring(&self) -> SpringConfig {
        SpringConfig::new(self.exit_tension, self.friction).with_precision(self.precision)
    }

    /// Horizontal position an exiting card travels to
    #[inline]
    pub fn exit_distance(&self) -> f64 {
        self.exit_margin + self.viewport_width
    }
}

impl Default for DeckTuning {
    fn default() -> Self {
        Self {
            trigger_velocity: 0.2,
            viewport_width: 1280.0,
            exit_margin: 200.0,
            friction: 50.0,
            drag_tension: 800.0,
            settle_tension: 500.0,
            exit_tension: 200.0,
            precision: 0.01,
            entry_animation: true,
        }
    }
}

/// Per-card lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Idle,
    Dragging,
    Settling,
    Exiting,
    Resolved,
}

/// Whether a decision has been delivered for the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    Pending,
    Resolved,
}

/// Result of feeding a gesture event to the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Card is not interactive, or no gesture is in progress on it
    Ignored,
    Grabbed,
    Moved,
    Exiting(Direction),
    Settling,
}

/// Transient state of a held (or just released) card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Offset of the card when it was grabbed
    pub origin: Vec2,
    /// Current offset from the rest position
    pub offset: Vec2,
    /// Last known pointer velocity (units/ms)
    pub velocity: Vec2,
    pub held: bool,
}

/// What the host renders for a card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    /// Degrees
    pub rotation: f64,
    pub scale: f64,
}

impl Transform {
    /// CSS transform string for web hosts
    pub fn css(&self) -> String {
        format!(
            "translate3d({:.2}px, {:.2}px, 0) perspective(1500px) rotateX(30deg) rotateY({:.3}deg) rotateZ({:.3}deg) scale({:.3})",
            self.x,
            self.y,
            self.rotation / 10.0,
            self.rotation,
            self.scale
        )
    }
}

/// One candidate card and its animation state
#[derive(Debug, Clone)]
pub struct Card {
    candidate: Candidate,
    layout: CardLayout,
    state: CardState,
    status: CardStatus,
    x: Spring,
    y: Spring,
    rotation: Spring,
    scale: Spring,
    drag: Option<DragState>,
    exit: Option<Direction>,
}

impl Card {
    pub(crate) fn new(candidate: Candidate, layout: CardLayout, tuning: &DeckTuning) -> Self {
        let mut card = Self {
            candidate,
            layout,
            state: CardState::Idle,
            status: CardStatus::Pending,
            x: Spring::new(0.0),
            y: Spring::new(layout.lift),
            rotation: Spring::new(layout.rotation),
            scale: Spring::new(1.0),
            drag: None,
            exit: None,
        };

        if tuning.entry_animation {
            card.y.jump_to(ENTRY_OFFSET_Y);
            card.rotation.jump_to(0.0);
            card.scale.jump_to(ENTRY_SCALE);

            let config = tuning.settle_spring();
            let delay = layout.entry_delay_ms;
            card.y.animate_to_after(layout.lift, config, delay);
            card.rotation.animate_to_after(layout.rotation, config, delay);
            card.scale.animate_to_after(1.0, config, delay);
        }

        card
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    pub fn layout(&self) -> CardLayout {
        self.layout
    }

    pub fn state(&self) -> CardState {
        self.state
    }

    pub fn status(&self) -> CardStatus {
        self.status
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Direction the card left in, once committed
    pub fn exit_direction(&self) -> Option<Direction> {
        self.exit
    }

    /// Offset from the card's rest position in the stack
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x.value(), self.y.value() - self.layout.lift)
    }

    pub fn transform(&self) -> Transform {
        Transform {
            x: self.x.value(),
            y: self.y.value(),
            rotation: self.rotation.value(),
            scale: self.scale.value(),
        }
    }

    /// Pose the card returns to when released below the trigger
    pub fn rest_pose(&self) -> Transform {
        Transform {
            x: 0.0,
            y: self.layout.lift,
            rotation: self.layout.rotation,
            scale: 1.0,
        }
    }

    /// Exiting and resolved cards no longer take gestures
    #[inline]
    pub fn is_interactive(&self) -> bool {
        matches!(
            self.state,
            CardState::Idle | CardState::Dragging | CardState::Settling
        )
    }

    pub fn is_animating(&self) -> bool {
        match self.state {
            CardState::Dragging | CardState::Settling | CardState::Exiting => true,
            CardState::Resolved => false,
            CardState::Idle => !self.springs_settled(),
        }
    }

    /// Settled exactly on the rest pose
    pub fn is_at_rest(&self) -> bool {
        self.springs_settled() && self.transform() == self.rest_pose()
    }

    pub(crate) fn begin_drag(&mut self, tuning: &DeckTuning) -> Transition {
        if !self.is_interactive() || self.state == CardState::Dragging {
            return Transition::Ignored;
        }

        let origin = self.offset();
        self.drag = Some(DragState {
            origin,
            offset: origin,
            velocity: Vec2::ZERO,
            held: true,
        });
        self.state = CardState::Dragging;
        self.place(origin);
        self.scale.animate_to(1.1, tuning.drag_spring());

        Transition::Grabbed
    }

    pub(crate) fn drag_by(&mut self, displacement: Vec2) -> Transition {
        let Some(drag) = self.drag.as_mut().filter(|d| d.held) else {
            return Transition::Ignored;
        };
        if self.state != CardState::Dragging {
            return Transition::Ignored;
        }

        drag.offset = drag.origin + displacement;
        let offset = drag.offset;
        self.place(offset);

        Transition::Moved
    }

    pub(crate) fn release(
        &mut self,
        velocity: Vec2,
        displacement: Vec2,
        tuning: &DeckTuning,
    ) -> Transition {
        if self.state != CardState::Dragging {
            return Transition::Ignored;
        }

        if let Some(drag) = self.drag.as_mut() {
            drag.offset = drag.origin + displacement;
            drag.velocity = velocity;
            drag.held = false;
        }

        // A non-finite speed has no exit pose to animate to
        if velocity.x.is_finite() && velocity.x.abs() >= tuning.trigger_velocity {
            let direction = Direction::from_velocity(velocity.x);
            self.commit_exit(direction, velocity.x.abs(), tuning);
            Transition::Exiting(direction)
        } else {
            self.settle(tuning)
        }
    }

    /// Send the card off screen. The decision is reported when the
    /// animation completes.
    pub(crate) fn commit_exit(&mut self, direction: Direction, speed: f64, tuning: &DeckTuning) {
        let dir = direction.sign();
        let config = tuning.exit_spring();
        let rotation = self.x.value() / 100.0 + dir * 10.0 * speed;

        self.state = CardState::Exiting;
        self.exit = Some(direction);
        self.x.animate_to(tuning.exit_distance() * dir, config);
        self.y.animate_to(self.y.value(), config);
        self.rotation.animate_to(rotation, config);
        self.scale.animate_to(1.0, config);
    }

    pub(crate) fn settle(&mut self, tuning: &DeckTuning) -> Transition {
        match self.state {
            CardState::Dragging | CardState::Settling => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.held = false;
                }
                let rest = self.rest_pose();
                let config = tuning.settle_spring();

                self.state = CardState::Settling;
                self.x.animate_to(rest.x, config);
                self.y.animate_to(rest.y, config);
                self.rotation.animate_to(rest.rotation, config);
                self.scale.animate_to(rest.scale, config);
                Transition::Settling
            }
            // Idle springs always target the rest pose already
            CardState::Idle | CardState::Exiting | CardState::Resolved => Transition::Ignored,
        }
    }

    /// Advance the animation; returns the direction when the card finishes
    /// its exit on this step
    pub(crate) fn step(&mut self, dt_ms: f64) -> Option<Direction> {
        if self.state == CardState::Resolved {
            return None;
        }

        self.x.step(dt_ms);
        self.y.step(dt_ms);
        self.rotation.step(dt_ms);
        self.scale.step(dt_ms);

        match self.state {
            CardState::Settling if self.springs_settled() => {
                self.state = CardState::Idle;
                self.drag = None;
                None
            }
            CardState::Exiting if self.springs_settled() => {
                self.state = CardState::Resolved;
                self.status = CardStatus::Resolved;
                self.drag = None;
                self.exit
            }
            _ => None,
        }
    }

    /// Track the pointer 1:1; tilt follows the horizontal offset
    fn place(&mut self, offset: Vec2) {
        self.x.jump_to(offset.x);
        self.y.jump_to(self.layout.lift + offset.y);
        self.rotation.jump_to(offset.x / 100.0);
    }

    fn springs_settled(&self) -> bool {
        self.x.is_settled()
            && self.y.is_settled()
            && self.rotation.is_settled()
            && self.scale.is_settled()
    }
}
