//! Capability provider implementations.

pub mod http;
pub mod lexical;

pub use http::{HttpReader, HttpReranker};
pub use lexical::{LexicalReader, TermOverlapReranker};
