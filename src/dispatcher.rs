//! Tool-call dispatcher
//!
//! Pure state machine in the Elm style: `transition` maps a state and an event
//! to a new state plus the effects the runtime must carry out. All I/O lives
//! in the runtime (`Assistant`).

mod effect;
mod event;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::TurnState;
pub use transition::{transition, TransitionError, TransitionResult};
