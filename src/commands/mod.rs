pub mod chapter;
pub mod clean;
pub mod extract;
pub mod split;
pub mod toc;
