//! Readers (and, for iMessage threads, the writer) of the markdown exports
//! produced by the collector scripts.

pub mod email;
pub mod grammar;
pub mod imessage;
pub mod slack;
