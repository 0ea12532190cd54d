pub mod bleichenbacher;
pub mod intervals;

pub use bleichenbacher::{
    AttackOutcome, BleichenbacherAttack, BleichenbacherError, ProgressEvent, SearchPhase,
};
pub use intervals::{refine, Bounds, Interval, IntervalSet};
