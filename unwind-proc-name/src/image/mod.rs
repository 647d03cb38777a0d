//! # Image Location and Mapping
//!
//! The first two stages of building a symbol table:
//!
//! - **`locator`**: asks the loader where the main executable came from and
//!   where it was loaded (`runtime_load_base`). ASLR moves the image on every
//!   run, so the base cannot be taken from the headers.
//! - **`mapping`**: maps the on-disk file read-only. The COFF symbol table is
//!   not part of any loaded section, so it is only reachable through the file.
//!
//! The mapping lives only as long as the table build; nothing here is kept
//! once the table is published.

pub mod locator;
pub mod mapping;

pub use locator::{locate_main_image, ImageLocation};
pub use mapping::MappedImage;
