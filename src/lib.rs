//! Mouse control from eye gaze, blinks and hand gestures.
//!
//! Per frame, landmarks from a [`pipeline::LandmarkSource`] feed three
//! independent branches inside a [`session::Session`]: gaze drives the
//! cursor, a blink clicks, and a classified hand gesture dispatches one of
//! a few OS actions through an [`actuator::Actuator`].

pub mod actuator;
pub mod blink;
pub mod camera;
pub mod config;
pub mod cooldown;
pub mod detector;
pub mod dispatch;
pub mod error;
pub mod font;
pub mod gaze;
pub mod gesture;
pub mod output;
pub mod pipeline;
pub mod replay;
pub mod session;
pub mod synth;
pub mod types;

#[cfg(test)]
mod gaze_tests;
