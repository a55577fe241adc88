//! Core parsing primitives
//!
//! The fundamental building blocks of the engine:
//! - Chars: UTF-8 character cursor with byte-exact spans
//! - Tokenizer: two-slot lexer producing the XML token stream
//! - Entities: entity decoding with a zero-copy fast path
//! - Span: offset-based ranges into input or document buffers

pub mod chars;
pub mod entities;
pub mod span;
pub mod tokenizer;
