//! HTTP protocol layer module
//!
//! Header evaluation (ranges, validators, content types) and the response
//! writer, independent of how paths are resolved.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

pub use range::{parse_range_header, RangeParseResult, RangeSpec};
pub use response::{FileHeaders, Reply, ResponseBody};
