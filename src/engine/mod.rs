//! Core engine — the collect → store → bid pipeline.

pub mod bidder;
pub mod collector;
