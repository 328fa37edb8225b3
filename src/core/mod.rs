//! Core infrastructure shared by the stores

pub mod logging;
