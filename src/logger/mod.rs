//! Run logging.

pub mod jsonl;
