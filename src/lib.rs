//! Security-group relationship and governance analysis.
//!
//! [`aws`] gathers a [`model::Snapshot`] from the AWS CLI or a file,
//! [`engine::analyze`] correlates it into summary, detail and findings
//! tables, and [`render`] turns one of those tables into text or JSON.

pub mod aws;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod render;

pub use engine::{analyze, OutputShape, Report};
pub use error::{Result, SgMapError};
pub use model::Snapshot;
