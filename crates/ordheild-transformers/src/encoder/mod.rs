//! The seam to the external wordpiece encoder.
//!
//! The transformer itself lives outside this crate; these types define what
//! it must provide and which construction options are carried for it.

pub mod config;
pub mod traits;

pub use config::EncoderConfig;
pub use traits::WordpieceEncoder;
