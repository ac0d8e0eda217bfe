//! Dispatcher: drives every watched path through the per-path state machine.
//!
//! `Seen -> Classifying -> (Ignored | Claimed) -> Queued for a slot -> Waiting -> Encoding -> Released`
//!
//! Paths are claimed as soon as they are dequeued, before waiting for a job
//! slot or for the file to settle, so a duplicate event that arrives while
//! the first copy is queued, waiting or encoding is dropped at once.

mod runner;
mod types;

pub use runner::Dispatcher;
pub use types::{DispatcherStats, Disposition};
