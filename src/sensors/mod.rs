//! Zone inputs.
//!
//! One [`ZoneMonitor`](zone::ZoneMonitor) per configured zone, created at
//! boot and owned by the [`AppService`](crate::app::service::AppService).

pub mod zone;

pub use zone::{SensorState, ZoneMonitor, ZoneReport, ZoneStatus};
