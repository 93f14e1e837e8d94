//! The blending model: choose quantities of feed streams to minimize cost
//! while meeting minimum-content requirements for every component.

pub mod model;
pub mod sets_and_parameters;
