//! Command line front end for FEZ asset archives.

pub mod commands;
pub mod convert;
pub mod report;
