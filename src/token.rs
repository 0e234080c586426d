use std::fmt;

/// A grammar symbol: a named terminal or nonterminal, a one-character
/// literal terminal, or the end-of-input marker.
///
/// Named terminals are written `UPPER_CASE`, nonterminals `lower_case`;
/// the two namespaces are disjoint. `error` is a reserved terminal that
/// every grammar carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
  Name(String),
  Char(char),
  End,
}

impl Symbol {
  pub fn name(s: &str) -> Symbol {
    Symbol::Name(s.to_owned())
  }

  /// `UPPER_CASE` terminal naming: leading ASCII uppercase, then
  /// uppercase, digits or underscores.
  pub fn is_upper_name(&self) -> bool {
    match self {
      Symbol::Name(s) => {
        let mut chars = s.chars();
        match chars.next() {
          Some(c) if c.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
          }
          _ => false,
        }
      }
      _ => false,
    }
  }

  /// `lower_case` nonterminal naming.
  pub fn is_lower_name(&self) -> bool {
    match self {
      Symbol::Name(s) => {
        let mut chars = s.chars();
        match chars.next() {
          Some(c) if c.is_ascii_lowercase() || c == '_' => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
          }
          _ => false,
        }
      }
      _ => false,
    }
  }
}

impl From<&str> for Symbol {
  fn from(s: &str) -> Symbol {
    Symbol::Name(s.to_owned())
  }
}

impl From<char> for Symbol {
  fn from(c: char) -> Symbol {
    Symbol::Char(c)
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Symbol::Name(s) => write!(f, "{}", s),
      Symbol::Char(c) => write!(f, "{}", c),
      Symbol::End => write!(f, "$end"),
    }
  }
}

/// A token produced by the lexer. Immutable once emitted; `line` and `pos`
/// locate the start of the lexeme in the scanned input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<V> {
  pub kind: Symbol,
  pub value: V,
  pub line: usize,
  pub pos: usize,
}

impl<V> Token<V> {
  pub fn new(kind: impl Into<Symbol>, value: V, line: usize, pos: usize) -> Token<V> {
    Token {
      kind: kind.into(),
      value,
      line,
      pos,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_casing() {
    assert!(Symbol::name("NUMBER").is_upper_name());
    assert!(Symbol::name("LIT_STR2").is_upper_name());
    assert!(!Symbol::name("Number").is_upper_name());
    assert!(!Symbol::name("test").is_upper_name());
    assert!(!Symbol::Char('+').is_upper_name());

    assert!(Symbol::name("expression").is_lower_name());
    assert!(Symbol::name("maybe_2nd").is_lower_name());
    assert!(!Symbol::name("BAD").is_lower_name());
    assert!(!Symbol::End.is_lower_name());
  }

  #[test]
  fn display() {
    assert_eq!(Symbol::name("NUMBER").to_string(), "NUMBER");
    assert_eq!(Symbol::Char('+').to_string(), "+");
    assert_eq!(Symbol::End.to_string(), "$end");
  }
}
