#![forbid(unsafe_code)]

pub mod date;
pub mod git;
