pub mod host;
pub mod renderer;
pub mod viewport;

pub use host::*;
pub use renderer::*;
pub use viewport::*;
