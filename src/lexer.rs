use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::errors::{LexBuildError, LexError};
use crate::token::{Symbol, Token};

/// A matched lexeme handed to a token rule's transform.
#[derive(Debug, Clone, Copy)]
pub struct Lexeme<'a> {
  pub text: &'a str,
  pub rule: &'a str,
  pub line: usize,
  pub pos: usize,
}

impl<'a> Lexeme<'a> {
  /// The matched rule's terminal symbol.
  pub fn symbol(&self) -> Symbol {
    Symbol::name(self.rule)
  }

  /// Builds a token at this lexeme's location.
  pub fn token<V>(&self, value: V) -> Token<V> {
    Token {
      kind: self.symbol(),
      value,
      line: self.line,
      pos: self.pos,
    }
  }
}

/// Maps a matched lexeme to a token, or to nothing to discard the match
/// and keep scanning (whitespace and newline trackers do this).
pub type TokenTransform<V> = Arc<dyn Fn(Lexeme<'_>) -> Option<Token<V>> + Send + Sync>;

/// What an error hook decided to do with unmatched input.
pub enum Recovery<V> {
  /// Emit this token; the hook must have advanced the scan position.
  Token(Token<V>),
  /// Drop input and retry; if the hook did not move, one character is
  /// skipped.
  Skip,
}

/// Mutable scan position handed to the error hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanState {
  pub pos: usize,
  pub line: usize,
}

pub type LexErrorHook<V> =
  Arc<dyn Fn(&mut ScanState, Token<V>) -> Recovery<V> + Send + Sync>;

struct Rule<V> {
  name: String,
  pattern: Regex,
  transform: Option<TokenTransform<V>>,
}

/// Ordered lexer declaration: token rules, one-character literals, an
/// ignore set and an optional error hook. `build` compiles it into a
/// shareable [`LexerSpec`].
pub struct LexerBuilder<V> {
  rules: Vec<(String, String, Option<TokenTransform<V>>)>,
  literals: Vec<char>,
  ignore: String,
  on_error: Option<LexErrorHook<V>>,
}

impl<V> LexerBuilder<V> {
  pub fn new() -> LexerBuilder<V> {
    LexerBuilder {
      rules: Vec::new(),
      literals: Vec::new(),
      ignore: String::new(),
      on_error: None,
    }
  }

  /// Declares a token rule. The pattern is matched anchored at the scan
  /// position; among all matching rules the longest lexeme wins, with
  /// declaration order breaking ties.
  pub fn token(mut self, name: &str, pattern: &str) -> Self {
    self.rules.push((name.to_owned(), pattern.to_owned(), None));
    self
  }

  /// Like [`token`](Self::token), with a transform applied to every match.
  pub fn token_with<F>(mut self, name: &str, pattern: &str, transform: F) -> Self
  where
    F: Fn(Lexeme<'_>) -> Option<Token<V>> + Send + Sync + 'static,
  {
    self
      .rules
      .push((name.to_owned(), pattern.to_owned(), Some(Arc::new(transform))));
    self
  }

  /// Declares every character of `lits` as a literal terminal.
  pub fn literals(mut self, lits: &str) -> Self {
    self.literals.extend(lits.chars());
    self
  }

  /// Characters skipped silently between tokens.
  pub fn ignore(mut self, chars: &str) -> Self {
    self.ignore.push_str(chars);
    self
  }

  pub fn on_error<F>(mut self, hook: F) -> Self
  where
    F: Fn(&mut ScanState, Token<V>) -> Recovery<V> + Send + Sync + 'static,
  {
    self.on_error = Some(Arc::new(hook));
    self
  }

  pub fn build(self) -> Result<LexerSpec<V>, LexBuildError> {
    let mut rules = Vec::with_capacity(self.rules.len());
    for (name, pattern, transform) in self.rules {
      let anchored = format!("^(?:{})", pattern);
      let pattern = Regex::new(&anchored).map_err(|error| LexBuildError {
        rule: name.clone(),
        error,
      })?;
      rules.push(Rule {
        name,
        pattern,
        transform,
      });
    }

    Ok(LexerSpec {
      rules,
      literals: self.literals,
      ignore: self.ignore,
      on_error: self.on_error,
    })
  }
}

impl<V> Default for LexerBuilder<V> {
  fn default() -> Self {
    LexerBuilder::new()
  }
}

/// A compiled, immutable lexer declaration. Cheap to share; every call to
/// [`scan`](Self::scan) yields an independent [`Lexer`] instance.
pub struct LexerSpec<V> {
  rules: Vec<Rule<V>>,
  literals: Vec<char>,
  ignore: String,
  on_error: Option<LexErrorHook<V>>,
}

impl<V> LexerSpec<V> {
  /// Declared rule names, in declaration order.
  pub fn tokens(&self) -> Vec<&str> {
    self.rules.iter().map(|r| r.name.as_str()).collect()
  }

  pub fn literal_chars(&self) -> &[char] {
    &self.literals
  }

  /// Every terminal this lexer can produce: rule names first, then
  /// literals. Used to seed grammar construction.
  pub fn terminals(&self) -> Vec<Symbol> {
    let mut terms: Vec<Symbol> = self.rules.iter().map(|r| Symbol::name(&r.name)).collect();
    terms.extend(self.literals.iter().map(|&c| Symbol::Char(c)));
    terms
  }

  pub fn scan<'s, 'i>(&'s self, input: &'i str) -> Lexer<'s, 'i, V> {
    Lexer {
      spec: self,
      input,
      pos: 0,
      line: 1,
    }
  }
}

impl<V> fmt::Debug for LexerSpec<V> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("LexerSpec")
      .field("tokens", &self.tokens())
      .field("literals", &self.literals)
      .field("ignore", &self.ignore)
      .finish()
  }
}

/// One scan over one input. Owns nothing but its position; two concurrent
/// parses must each get their own instance.
pub struct Lexer<'s, 'i, V> {
  spec: &'s LexerSpec<V>,
  input: &'i str,
  pos: usize,
  line: usize,
}

impl<'s, 'i, V: From<String>> Lexer<'s, 'i, V> {
  pub fn pos(&self) -> usize {
    self.pos
  }

  pub fn line(&self) -> usize {
    self.line
  }

  /// Produces the next token, or `None` at end of input.
  pub fn next_token(&mut self) -> Result<Option<Token<V>>, LexError> {
    loop {
      self.skip_ignored();
      if self.pos >= self.input.len() {
        return Ok(None);
      }

      let rest = &self.input[self.pos..];

      // Longest match wins; declaration order breaks length ties.
      let mut best: Option<(usize, usize)> = None;
      for (ix, rule) in self.spec.rules.iter().enumerate() {
        if let Some(m) = rule.pattern.find(rest) {
          if m.end() > 0 && best.map(|(_, len)| m.end() > len).unwrap_or(true) {
            best = Some((ix, m.end()));
          }
        }
      }

      if let Some((ix, len)) = best {
        let rule = &self.spec.rules[ix];
        let text = &rest[..len];
        let lexeme = Lexeme {
          text,
          rule: &rule.name,
          line: self.line,
          pos: self.pos,
        };
        self.pos += len;
        self.line += text.matches('\n').count();

        let token = match &rule.transform {
          Some(f) => (**f)(lexeme),
          None => Some(lexeme.token(V::from(text.to_owned()))),
        };
        match token {
          Some(token) => return Ok(Some(token)),
          None => continue,
        }
      }

      let c = rest.chars().next().unwrap();
      if self.spec.literals.contains(&c) {
        let token = Token {
          kind: Symbol::Char(c),
          value: V::from(c.to_string()),
          line: self.line,
          pos: self.pos,
        };
        self.pos += c.len_utf8();
        return Ok(Some(token));
      }

      let err = LexError {
        pos: self.pos,
        line: self.line,
      };
      let hook = match &self.spec.on_error {
        Some(hook) => hook,
        None => return Err(err),
      };

      let bad = Token {
        kind: Symbol::name("error"),
        value: V::from(rest.to_owned()),
        line: self.line,
        pos: self.pos,
      };
      let mut state = ScanState {
        pos: self.pos,
        line: self.line,
      };
      match (**hook)(&mut state, bad) {
        Recovery::Token(token) => {
          if state.pos <= self.pos {
            // A hook that emits without consuming would loop forever.
            return Err(err);
          }
          self.pos = state.pos;
          self.line = state.line;
          return Ok(Some(token));
        }
        Recovery::Skip => {
          if state.pos <= self.pos {
            state.pos = self.pos + c.len_utf8();
          }
          self.pos = state.pos;
          self.line = state.line;
        }
      }
    }
  }

  fn skip_ignored(&mut self) {
    while let Some(c) = self.input[self.pos..].chars().next() {
      if self.spec.ignore.contains(c) {
        self.pos += c.len_utf8();
      } else {
        break;
      }
    }
  }
}

impl<'s, 'i, V: From<String>> Iterator for Lexer<'s, 'i, V> {
  type Item = Result<Token<V>, LexError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.next_token().transpose()
  }
}
