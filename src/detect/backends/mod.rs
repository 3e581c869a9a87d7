pub mod bright_rect;
pub mod scripted;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use bright_rect::BrightRectBackend;
pub use scripted::ScriptedBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
