//! Media module for post and asset representation, payload parsing and
//! content resolution.

pub mod item;
pub mod parser;
pub mod resolver;

pub use item::{ImageFormat, MediaKind, MediaRef, PageType, PostContent, PostRef};
pub use parser::{classify, extract_media, parse_publish_time};
pub use resolver::ContentResolver;
