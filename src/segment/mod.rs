mod patterns;
mod splitter;

pub use splitter::{Segmenter, split_into_chapters};
