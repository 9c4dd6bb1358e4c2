//! File IO: raw instrument exports, probe JSON, spreadsheets.

pub mod probe;
pub mod raw;
pub mod xlsx;
