//! Gatekeeper Common
//!
//! Small pieces shared by every Gatekeeper crate:
//! - `logging` - tracing subscriber bootstrap (text or JSON)
//! - `strings` - blank-input helpers used at validation boundaries

pub mod logging;
pub mod strings;

pub use strings::{is_blank, non_blank};
