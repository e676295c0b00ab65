mod reasoning;

pub use reasoning::ReasoningEngine;
