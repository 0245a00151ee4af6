//! # UI Module
//!
//! This module contains all UI components for the tuner application.

pub mod main_display;
pub mod needle_meter;
