//! # speclint_spec
//!
//! Package specification model and loader for speclint.
//!
//! A spec is a YAML document with the `.pkgspec` extension describing a
//! library's metadata, source location, license and per-platform file
//! layout. This crate only parses specs; checking them is the job of
//! `speclint_lint`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use speclint_spec::SpecReader;
//!
//! let loaded = SpecReader::read_spec("Bananas.pkgspec").unwrap();
//! println!("{} ({})", loaded.spec.name, loaded.spec.version);
//! for platform in loaded.spec.platforms() {
//!     println!("  {}: {:?}", platform.platform, platform.patterns);
//! }
//! ```

pub mod error;
pub mod models;
pub mod reader;

pub use error::{SpecError, SpecResult};
pub use models::*;
pub use reader::{LoadedSpec, SpecReader};
