pub mod range_result;
pub mod segment;
pub mod station;

pub use range_result::RangeResult;
pub use segment::{
    floor30, FailureReason, FetchedSegment, SegmentFailure, SegmentOutcome, SegmentRequest,
};
pub use station::{Frequency, StationRecord};
