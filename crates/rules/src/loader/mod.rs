//! Rules file loading.
//!
//! The rules file is polled by modification time. When it is newer than the
//! last successful load it is parsed line by line into an ordered rule list;
//! the engine then swaps that list in as a whole.

mod error;
mod parse;
mod source;


pub use self::error::{InvalidLinePolicy, LineDiagnostic, ReloadOutcome};
pub use self::parse::{parse_rules, ParseReport};
pub(crate) use self::source::{Poll, RuleSource};
