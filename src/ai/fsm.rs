//! Finite State Machine for enemy behaviour
//!
//! States are plain enum values. The behaviour for every state lives in one
//! type implementing [`StateBehaviour`], which matches on the state it is
//! asked to enter, run or exit. The machine itself only tracks which state
//! is active and applies transitions.
//!
//! # Lifecycle
//!
//! 1. `enter()` - called once when a state becomes active
//! 2. `run()` - called once per tick while the state is active
//! 3. `exit()` - called once when the state is left
//!
//! Transitions are synchronous. A transition returned from `run()` (or from
//! `enter()`) exits the old state and enters the new one before `update()`
//! returns.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Guard { Idle, Chase }
//!
//! impl StateBehaviour<Guard, Senses> for GuardBrain {
//!     fn run(&mut self, state: Guard, senses: &mut Senses) -> Transition<Guard> {
//!         match state {
//!             Guard::Idle if senses.sees_player => Transition::To(Guard::Chase),
//!             _ => Transition::None,
//!         }
//!     }
//! }
//!
//! let mut fsm = StateMachine::new("Guard", Guard::Idle);
//! fsm.update(&mut brain, &mut senses);
//! ```

use std::fmt;

use log::{debug, warn};

/// Bound on transitions applied in one call, guards against enter loops
pub const MAX_CHAINED_TRANSITIONS: usize = 8;

// ============================================================================
// State identity
// ============================================================================

/// An enum value naming one state of a machine
pub trait StateId: Copy + PartialEq + fmt::Debug {
    /// State name for logging and debug overlays
    fn name(self) -> &'static str;
}

// ============================================================================
// Transition
// ============================================================================

/// A state transition decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Stay in the current state.
    None,
    /// Leave the current state for another.
    To(S),
}

// ============================================================================
// Behaviour
// ============================================================================

/// Callbacks for every state of a machine.
pub trait StateBehaviour<S: StateId, Ctx> {
    /// Called once when `state` becomes active.
    ///
    /// May itself transition, e.g. straight back out when a precondition
    /// no longer holds.
    fn enter(&mut self, _state: S, _ctx: &mut Ctx) -> Transition<S> {
        Transition::None
    }

    /// Called once per tick while `state` is active.
    fn run(&mut self, state: S, ctx: &mut Ctx) -> Transition<S>;

    /// Called once when `state` is left.
    fn exit(&mut self, _state: S, _ctx: &mut Ctx) {}
}

// ============================================================================
// State Machine
// ============================================================================

/// Tracks the active state and applies transitions.
///
/// The initial state is entered on the first [`update`](Self::update).
#[derive(Clone)]
pub struct StateMachine<S> {
    /// Name used in log lines
    label: &'static str,
    /// Current active state
    active: S,
    /// State active before the last transition
    previous: S,
    /// Whether enter() has been called on the active state
    entered: bool,
}

impl<S: StateId> StateMachine<S> {
    /// Create a machine starting in `initial`
    #[must_use]
    pub fn new(label: &'static str, initial: S) -> Self {
        Self {
            label,
            active: initial,
            previous: initial,
            entered: false,
        }
    }

    /// Run one tick.
    ///
    /// Enters the initial state on the first call, then runs the active
    /// state. Returns true if any transition was applied.
    pub fn update<Ctx, B>(&mut self, behaviour: &mut B, ctx: &mut Ctx) -> bool
    where
        B: StateBehaviour<S, Ctx> + ?Sized,
    {
        let mut changed = false;

        if !self.entered {
            self.entered = true;
            let transition = behaviour.enter(self.active, ctx);
            changed |= self.apply(transition, behaviour, ctx);
        }

        let transition = behaviour.run(self.active, ctx);
        changed |= self.apply(transition, behaviour, ctx);

        changed
    }

    /// Transition immediately, from outside the per-tick update
    pub fn transition_to<Ctx, B>(&mut self, state: S, behaviour: &mut B, ctx: &mut Ctx)
    where
        B: StateBehaviour<S, Ctx> + ?Sized,
    {
        if !self.entered {
            // Initial state was never entered, so it is not exited either
            self.entered = true;
            self.previous = self.active;
            self.active = state;
            debug!("{}: -> {}", self.label, state.name());
            let transition = behaviour.enter(state, ctx);
            self.apply(transition, behaviour, ctx);
            return;
        }

        self.apply(Transition::To(state), behaviour, ctx);
    }

    fn apply<Ctx, B>(&mut self, mut transition: Transition<S>, behaviour: &mut B, ctx: &mut Ctx) -> bool
    where
        B: StateBehaviour<S, Ctx> + ?Sized,
    {
        let mut applied = 0;

        while let Transition::To(next) = transition {
            if applied == MAX_CHAINED_TRANSITIONS {
                warn!(
                    "{}: more than {MAX_CHAINED_TRANSITIONS} chained transitions, stopping in {}",
                    self.label,
                    self.active.name()
                );
                break;
            }
            applied += 1;

            behaviour.exit(self.active, ctx);
            debug!("{}: {} -> {}", self.label, self.active.name(), next.name());

            self.previous = self.active;
            self.active = next;
            transition = behaviour.enter(next, ctx);
        }

        applied > 0
    }

    /// The active state
    #[must_use]
    pub fn active_state(&self) -> S {
        self.active
    }

    /// The state active before the last transition
    #[must_use]
    pub fn previous_state(&self) -> S {
        self.previous
    }

    /// Name of the active state
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.active.name()
    }

    /// Check if the machine is in `state`
    #[must_use]
    pub fn is_in_state(&self, state: S) -> bool {
        self.active == state
    }
}

impl<S: StateId> fmt::Debug for StateMachine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("label", &self.label)
            .field("active", &self.active.name())
            .field("previous", &self.previous.name())
            .field("entered", &self.entered)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
