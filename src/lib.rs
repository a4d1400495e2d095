// Annotation, gesture, and reading-state engine for a document reading
// companion. The host application owns rendering and networking plumbing;
// this crate owns the state machines in between.
pub mod annotation;
pub mod chat;
pub mod clock;
pub mod coords;
pub mod geometry;
pub mod gesture;
pub mod persistence;
pub mod reading_state;
pub mod rest;
pub mod screenshot;
pub mod store;
pub mod viewer;

pub use viewer::{DocumentViewer, ViewerEvent};
