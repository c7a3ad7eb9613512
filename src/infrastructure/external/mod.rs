pub mod html_parser;
pub mod http_transport;
pub mod liveatc_client;
pub mod segment_fetcher;

pub use html_parser::{CatalogPage, HtmlScanner};
pub use http_transport::{HttpResponse, HttpTransport, ReqwestTransport, TlsMode, TransportError};
pub use liveatc_client::LiveAtcClient;
pub use segment_fetcher::{FetchFailure, RetryPolicy, SegmentFetcher};
