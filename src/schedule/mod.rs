//! On-call schedule aggregation.
//!
//! # Data Flow
//! ```text
//! POST /getSchedule {"group": "X"} ?todayOnly=true | ?date=YYYYMMDD
//!     → handler.rs (validate body, credentials)
//!     → client.rs (two concurrent OCM lookups: X-Primary, X-Secondary)
//!     → transform.rs (flatten shifts, tag roles, filter by date)
//!     → {"Primary": [...], "Standby": [...]}
//! ```

pub mod client;
pub mod handler;
pub mod transform;
pub mod types;

pub use client::OcmClient;
pub use handler::get_schedule;
pub use types::{Role, ScheduleFilter, ScheduleResponse, ShiftRecord};
