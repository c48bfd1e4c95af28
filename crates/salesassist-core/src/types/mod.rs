//! Core types for SalesAssist.

mod identifiers;
mod content;
mod event;
mod session;
mod tool;

pub use identifiers::*;
pub use content::*;
pub use event::*;
pub use session::*;
pub use tool::*;
