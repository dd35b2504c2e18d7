//! # scout-core
//!
//! Foundation types and utilities for the Scout answer engine.
//!
//! This crate provides the shared vocabulary the runtime crate depends on:
//!
//! - **Stream messages**: [`messages::StreamMessage`], the ordered progress
//!   events a turn emits to its client, and the [`messages::Page`] citation
//!   record with its normalizer.
//! - **Pipeline signals**: [`signals::PipelineSignal`], the closed union of
//!   stage-completion signals the orchestrator consumes.
//! - **Text helpers**: [`text::strip_termination_sentinel`] and UTF-8-safe
//!   truncation.
//! - **Logging**: [`logging::init`] env-filter tracing setup.
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `scout-runtime`.

#![deny(unsafe_code)]

pub mod logging;
pub mod messages;
pub mod signals;
pub mod text;
