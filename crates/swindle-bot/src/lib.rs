pub mod bot;
pub mod policy;

pub use bot::{
    Branch, Decision, ENGINE_VERSION, EngineParams, OpeningPlanner, Reason, RespondingPlanner,
};
pub use policy::ReasoningEngine;
