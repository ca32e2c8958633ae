pub mod github_handlers;
pub mod page_handlers;
pub mod predict_handlers;
pub mod system_handlers;

pub use github_handlers::*;
pub use page_handlers::*;
pub use predict_handlers::*;
pub use system_handlers::*;
