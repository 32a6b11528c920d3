//! desktop-core: desktop automation for agents
//!
//! This library drives a desktop session: synthetic mouse and keyboard input,
//! screen and window capture, window enumeration and activation, and OCR on
//! screenshots. Platform libraries sit behind capability traits so the
//! [`automation::DesktopController`] runs unchanged against native backends
//! or the in-memory mock.

pub mod automation;
pub mod capture;
pub mod config;
pub mod error;
pub mod keys;
pub mod model;
pub mod ocr;
pub mod util;
