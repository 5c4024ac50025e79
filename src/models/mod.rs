//! Request, link and API payload types

pub mod api;
pub mod link;
pub mod media;

pub use api::*;
pub use link::*;
pub use media::*;
