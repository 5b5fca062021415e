//! Pure translation phases of a relay request.
//!
//! Normalizing the inbound body, rendering the prompt and reconciling the
//! model's reply are all free of I/O; only [`crate::upstream`] talks to the network.

pub mod input;
pub mod openai_types;
pub mod prompt;
pub mod reconcile;
pub mod relay_types;
