pub mod range_scheduler;
pub mod segment_url_builder;
pub mod token_rules;

pub use range_scheduler::{plan_range, SegmentBoundaries, SEGMENT_MINUTES};
pub use segment_url_builder::{build_segment_url, segment_file_name};
pub use token_rules::{default_rules, derive_from_station, RawCandidate, TokenNormalizer, TokenRule};
