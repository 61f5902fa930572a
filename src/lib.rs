//! Dremio dataset snapshot library
//!
//! Logs in to Dremio, resolves one dataset by catalog path, runs a
//! `SELECT *` over it and renders the rows as tab-delimited text.

pub mod config;
pub mod dremio;
pub mod output;
pub mod pipeline;
