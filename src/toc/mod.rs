#[cfg(test)]
pub(crate) mod fixtures;
mod locator;
mod numbering;
mod outline;

pub use locator::{PagedDocument, locate_by_toc, split_by_toc};
pub use numbering::{parse_chapter_identifier, parse_chapter_number, toc_chapter_number};
pub use outline::parse_outline_xml;
