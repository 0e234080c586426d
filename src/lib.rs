//! Runtime lexer and LALR(1) parser toolkit.
//!
//! A grammar is built incrementally from a terminal set, productions and
//! precedence declarations, frozen with [`Grammar::set_start`], and compiled
//! into an [`LrTable`] with the DeRemer-Pennello lookahead algorithm. The
//! table is immutable and can be shared by any number of [`Parser`] runs.
//! Tokens come from a rule-driven [`Lexer`] declared through
//! [`LexerBuilder`], or from any hand-fed token stream.

pub mod token;
pub mod errors;
pub mod lexer;
pub mod grammar;
pub mod lalr;
pub mod parser;
pub mod rule_parser;
pub mod helpers;
pub mod dump;

pub type Map<K, V> = indexmap::IndexMap<K, V, fnv::FnvBuildHasher>;
pub type Set<T> = indexmap::IndexSet<T, fnv::FnvBuildHasher>;

pub use self::token::{Symbol, Token};
pub use self::errors::{
  ActionError, BuildError, GrammarError, LexBuildError, LexError, ParseError, RuleError,
};
pub use self::lexer::{Lexeme, Lexer, LexerBuilder, LexerSpec, Recovery, ScanState};
pub use self::grammar::{Assoc, Grammar, LrItem, Production, ReduceAction};
pub use self::lalr::{Action, Conflict, ConflictKind, Item, LrTable};
pub use self::parser::{ErrorRecovery, Frame, Parser, ParserBuilder};
pub use self::dump::Dump;
