#![allow(dead_code)]

pub mod contexts;
pub mod states;
pub mod stores;

pub use contexts::{OpBehavior, ScriptedContext};
pub use states::{LateBoundState, MarkerState, StubExtension};
pub use stores::FlakyFlagStore;
