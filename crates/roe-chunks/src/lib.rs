//! roe-chunks: splitting files across containers and finding them again
//!
//! # Overview
//! - `ranges`: fixed-size contiguous byte ranges covering a file
//! - `naming`: `name.bmp` / `name.K-N.bmp` container filenames
//! - `parts`: collect, validate and order the sibling parts of a split file

pub mod naming;
pub mod parts;
pub mod ranges;

pub use naming::{
    container_file_name, has_container_ext, output_name, parse_container_name, parse_split_name,
};
pub use parts::discover_and_order_parts;
pub use ranges::plan_ranges;
