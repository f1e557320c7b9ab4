//! Test module for duoshell-core
//!
//! This module contains cross-module tests for:
//! - Gesture dispatch (fallback rules, sentinel handling, debounce)
//! - The capture pipeline (stage ordering, placeholders, persistence)
//! - The deletion handshake (consent escalation, supersession)
