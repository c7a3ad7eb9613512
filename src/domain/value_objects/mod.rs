pub mod airport_code;
pub mod archive_token;
pub mod segment_url;
pub mod station_id;
pub mod zulu_time;

pub use airport_code::AirportCode;
pub use archive_token::{ArchiveToken, TokenConfidence, TokenResolution};
pub use segment_url::SegmentUrl;
pub use station_id::StationId;
pub use zulu_time::{parse_archive_date, parse_utc_instant, ZuluTime};
