//! Game flow: states, transitions and the collaborators they drive
//!
//! The machine is synchronous; the only async work is collaborator calls
//! that states detach through a [`TaskSpawner`].

pub mod context;
pub mod machine;
pub mod states;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{
    Collaborators, HeadlessSurface, OfflineSession, RenderSurface, SessionClient, SessionFuture,
    TransitionContext,
};
pub use machine::{Entry, GameState, StateId, StateMachine, StateTicket, Transition, TransitionHandle};
pub use states::{FlowOptions, SubmitStatus, standard_machine};
#[cfg(target_arch = "wasm32")]
pub use task::BrowserSpawner;
pub use task::{TaskSpawner, detach};
