#![feature(portable_simd)]
//! A high-throughput, streaming CSV/TSV tokenizer.
//!
//! The core type is [`Parser`]: feed it bytes in any chunking via
//! [`Parser::parse_buffer`] and it emits fully-decoded rows through a
//! caller-supplied callback, with zero-copy field views wherever a field's
//! bytes did not need de-escaping or reassembling across a chunk boundary.
//! [`Parser::parse_buffer_collect`], [`Parser::parse_string`],
//! [`Parser::parse_stream`] and [`Parser::parse_file`] build on the same
//! engine for the common cases of in-memory and `Read`-backed input.
//!
//! No unwrap/expect in production code; fallible paths return `Result`.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod buffers;
mod charclass;
mod engine;
mod field;
mod simd;

pub mod block;
mod error;
mod options;
mod parser;
mod stats;

pub use error::{Error, ErrorKind};
pub use field::{Field, FieldsIter, Row};
pub use options::{ParserOptions, ParserOptionsBuilder};
pub use parser::{OwnedRow, Parser};
pub use stats::Stats;
