//! Domain types organized by concern

pub mod attendance;
pub mod remote;
pub mod sync;

pub use attendance::{
    AttendanceEvent, DailyAttendance, DayOfficeHours, NewAttendanceEvent, OfficeWorkReason,
    PunchType,
};
pub use remote::{PunchOutUpdate, RemoteAttendanceRecord};
pub use sync::ConnectionStatus;
