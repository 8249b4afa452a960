pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod traits;

pub use config::{SyncConfig, DEFAULT_DRAG_THRESHOLD_PX};
pub use error::BoardError;
pub use logging::init_logging;
pub use result::BoardResult;
pub use traits::Editable;
