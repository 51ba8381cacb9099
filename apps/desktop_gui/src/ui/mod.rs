//! UI layer for the flap controller window.

pub mod app;

pub use app::FlapControllerApp;
