//! Viva Coach - Oral Tutoring Conversation Core
//!
//! This crate implements the conversation engine for a voice-driven tutoring
//! coach: a phase-based dialogue state machine, graduated hinting, grounded
//! response generation and session performance metrics.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
