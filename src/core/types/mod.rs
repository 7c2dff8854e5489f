//! Core type definition module
//!
//! Request and response types exchanged with the dispatcher

pub mod requests;
pub mod responses;

pub use requests::*;
pub use responses::*;
