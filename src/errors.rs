use std::error::Error;
use std::fmt;

use crate::token::Symbol;

/// Grammar-construction failures. All of these are immediate and local;
/// a grammar that made it through construction never raises them again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
  /// Terminal names must be UPPER_CASE.
  BadTerminalName(String),
  /// Production heads must be lower_case names.
  BadProductionName(Symbol),
  /// `error` is reserved and cannot head a production.
  ReservedName(Symbol),
  /// A `(head, body)` pair may only be declared once.
  DuplicateProduction(String),
  /// Precedence declarations are frozen by the first production.
  PrecedenceAfterProduction(Symbol),
  DuplicatePrecedence(Symbol),
  /// The start symbol must be a known nonterminal.
  UnknownStart(Symbol),
  StartAlreadySet(Symbol),
  /// `set_start` with no argument needs at least one production.
  NoProductions,
}

impl fmt::Display for GrammarError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      GrammarError::BadTerminalName(name) => {
        write!(f, "terminal `{}` is not an UPPER_CASE name", name)
      }
      GrammarError::BadProductionName(sym) => {
        write!(f, "production head `{}` is not a lower_case name", sym)
      }
      GrammarError::ReservedName(sym) => write!(f, "`{}` is a reserved terminal", sym),
      GrammarError::DuplicateProduction(prod) => {
        write!(f, "duplicate production `{}`", prod)
      }
      GrammarError::PrecedenceAfterProduction(sym) => {
        write!(f, "precedence of `{}` declared after productions were added", sym)
      }
      GrammarError::DuplicatePrecedence(sym) => {
        write!(f, "precedence of `{}` declared twice", sym)
      }
      GrammarError::UnknownStart(sym) => {
        write!(f, "start symbol `{}` is not a known nonterminal", sym)
      }
      GrammarError::StartAlreadySet(sym) => {
        write!(f, "start symbol already set to `{}`", sym)
      }
      GrammarError::NoProductions => {
        write!(f, "cannot pick a default start symbol for an empty grammar")
      }
    }
  }
}

impl Error for GrammarError {}

/// No lexer rule matched and no error hook recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
  pub pos: usize,
  pub line: usize,
}

impl fmt::Display for LexError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "no lexer rule matches input at line {}, position {}", self.line, self.pos)
  }
}

impl Error for LexError {}

/// A token rule's pattern failed to compile.
#[derive(Debug)]
pub struct LexBuildError {
  pub rule: String,
  pub error: regex::Error,
}

impl fmt::Display for LexBuildError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "bad pattern for token rule `{}`: {}", self.rule, self.error)
  }
}

impl Error for LexBuildError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    Some(&self.error)
  }
}

/// Failures of the grammar-string mini-syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
  Lex(LexError),
  MultiCharLiteral(String),
  Syntax { pos: usize },
}

impl fmt::Display for RuleError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      RuleError::Lex(err) => write!(f, "bad rule string: {}", err),
      RuleError::MultiCharLiteral(lit) => {
        write!(f, "quoted literal `{}` is longer than one character", lit)
      }
      RuleError::Syntax { pos } => write!(f, "malformed rule string at position {}", pos),
    }
  }
}

impl Error for RuleError {}

/// Error type a reduction action may fail with. Propagated unmodified
/// inside [`ParseError::Action`].
pub type ActionError = Box<dyn Error + Send + Sync>;

/// Runtime parse failure.
#[derive(Debug)]
pub enum ParseError {
  Lex(LexError),
  UnexpectedToken {
    state: usize,
    kind: Symbol,
    line: usize,
    pos: usize,
    expected: Vec<Symbol>,
  },
  UnexpectedEof {
    state: usize,
    expected: Vec<Symbol>,
  },
  Action(ActionError),
  /// `Parser::parse` was called on a parser declared without a lexer.
  NoLexer,
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ParseError::Lex(err) => write!(f, "{}", err),
      ParseError::UnexpectedToken { state, kind, line, pos, expected } => {
        write!(
          f,
          "unexpected `{}` at line {}, position {} (state {}, expected one of: {})",
          kind,
          line,
          pos,
          state,
          fmt_symbols(expected),
        )
      }
      ParseError::UnexpectedEof { state, expected } => {
        write!(
          f,
          "unexpected end of input (state {}, expected one of: {})",
          state,
          fmt_symbols(expected),
        )
      }
      ParseError::Action(err) => write!(f, "reduction action failed: {}", err),
      ParseError::NoLexer => write!(f, "parser has no lexer declaration"),
    }
  }
}

impl Error for ParseError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      ParseError::Lex(err) => Some(err),
      ParseError::Action(err) => Some(err.as_ref()),
      _ => None,
    }
  }
}

fn fmt_symbols(syms: &[Symbol]) -> String {
  use itertools::Itertools;

  syms.iter().map(|s| s.to_string()).join(", ")
}

/// Errors surfaced while assembling a parser from declarations.
#[derive(Debug)]
pub enum BuildError {
  Grammar(GrammarError),
  Lex(LexBuildError),
  Rule(RuleError),
  NoLexer,
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      BuildError::Grammar(err) => write!(f, "{}", err),
      BuildError::Lex(err) => write!(f, "{}", err),
      BuildError::Rule(err) => write!(f, "{}", err),
      BuildError::NoLexer => write!(f, "parser declaration has no lexer"),
    }
  }
}

impl Error for BuildError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      BuildError::Grammar(err) => Some(err),
      BuildError::Lex(err) => Some(err),
      BuildError::Rule(err) => Some(err),
      BuildError::NoLexer => None,
    }
  }
}

impl From<GrammarError> for BuildError {
  fn from(err: GrammarError) -> BuildError {
    BuildError::Grammar(err)
  }
}

impl From<LexBuildError> for BuildError {
  fn from(err: LexBuildError) -> BuildError {
    BuildError::Lex(err)
  }
}

impl From<RuleError> for BuildError {
  fn from(err: RuleError) -> BuildError {
    BuildError::Rule(err)
  }
}
