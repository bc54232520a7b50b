#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::struct_excessive_bools,
    clippy::wildcard_imports,
    clippy::too_many_lines,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::doc_markdown
)]

pub mod app;
pub mod changes;
pub mod dashboard;
pub mod events;
pub mod link;
pub mod logging;
#[cfg(feature = "desktop-notify")]
pub mod notify;
pub mod selection;
pub mod store;
pub mod view;
pub mod vrt;
