mod backend;
mod backends;
mod registry;
mod result;

pub use backend::DetectorBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use backends::{BrightRectBackend, ScriptedBackend};
pub use registry::BackendRegistry;
pub use result::Detection;
