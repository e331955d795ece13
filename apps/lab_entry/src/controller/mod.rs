//! Controller layer: backend events, command routing and the form driver.

pub mod driver;
pub mod events;
pub mod orchestration;
