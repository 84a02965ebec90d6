//! # Domain Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated, uppercase-normalized ticker identifier |
//! | [`ListKind`] | Which of the three persisted lists a value belongs to |

mod list_kind;
mod ticker;

pub use list_kind::ListKind;
pub use ticker::Ticker;
