//! ocaportal: chart, filter and result rendering for the OCA indicators portal.
//!
//! The core (labels, filters, payload parsing, chart building, result
//! rendering) is synchronous and free of I/O. [`client`] talks to the portal,
//! [`server`] serves the assembled pieces to the pages.

pub mod charts;
pub mod client;
pub mod config;
pub mod filters;
pub mod indicators;
pub mod journal;
pub mod labels;
pub mod payload;
pub mod results;
pub mod server;
pub mod session;
pub mod templates;

pub use client::{ClientError, PortalClient};
pub use config::{load_settings, Config, Settings};
pub use payload::{ParseError, StudyUnit, TimeSeriesPayload};
