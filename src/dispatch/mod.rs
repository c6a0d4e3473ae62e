//! Provider selection and the synthesis entry point.

mod dispatcher;
mod kind;

pub use dispatcher::{BatchReport, Dispatcher, Narration, NarrationJob};
pub use kind::ProviderKind;
