//! Database row types.

pub mod session;
