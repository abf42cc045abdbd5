pub mod clash;
pub mod links;

use thiserror::Error;

/// A single input (link or clash map) failed to decode. These never abort a
/// source; the record is simply not produced.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("not a correct {0} link")]
    WrongScheme(&'static str),
    #[error("{0} link payload parse failed")]
    PayloadParse(&'static str),
    #[error("unsupported link scheme")]
    UnsupportedScheme,
    #[error("clash proxy map has no type")]
    MissingType,
    #[error("clash proxy map decode failed: {0}")]
    ClashDecode(String),
}

pub use clash::parse_proxy_from_clash_map;
pub use links::{grep_links_from_string, parse_proxy_link};
