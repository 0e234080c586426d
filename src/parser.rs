use std::sync::Arc;

use crate::errors::{ActionError, BuildError, LexError, ParseError};
use crate::grammar::{Assoc, Grammar, ReduceAction};
use crate::lalr::{Action, LrTable};
use crate::lexer::{LexerBuilder, LexerSpec};
use crate::rule_parser;
use crate::token::{Symbol, Token};

/// One entry of the parse stack: the automaton state entered, the symbol
/// shifted or reduced to, and its semantic value.
#[derive(Debug)]
pub struct Frame<V> {
  pub state: usize,
  pub symbol: Symbol,
  pub value: V,
}

/// What a parse error hook decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRecovery {
  /// Retry with the (possibly modified) stack and lookahead.
  Resume,
  /// Give up; the usual parse error is returned.
  Abort,
}

/// Hook invoked when no action exists for the current lookahead. It may
/// mutate the stack, replace or drop the lookahead, and resume. A hook
/// that resumes without changing anything will hit the same error again.
pub type ParseErrorHook<V> =
  Box<dyn Fn(&mut Vec<Frame<V>>, &mut Option<Token<V>>) -> ErrorRecovery + Send + Sync>;

/// A shift-reduce parser over an immutable LALR(1) table. `parse` runs are
/// independent; the parser itself is never mutated.
pub struct Parser<V> {
  grammar: Arc<Grammar<V>>,
  table: Arc<LrTable>,
  lexer: Option<Arc<LexerSpec<V>>>,
  on_error: Option<ParseErrorHook<V>>,
}

impl<V> Parser<V> {
  /// Wraps a finished grammar, building its table. The grammar must have
  /// its start symbol set.
  pub fn new(grammar: Grammar<V>) -> Parser<V> {
    let table = LrTable::build(&grammar);
    Parser {
      grammar: Arc::new(grammar),
      table: Arc::new(table),
      lexer: None,
      on_error: None,
    }
  }

  pub fn grammar(&self) -> &Grammar<V> {
    &self.grammar
  }

  pub fn table(&self) -> &LrTable {
    &self.table
  }

  pub fn lexer_spec(&self) -> Option<&LexerSpec<V>> {
    self.lexer.as_deref()
  }

  pub fn set_error_hook<F>(&mut self, hook: F)
  where
    F: Fn(&mut Vec<Frame<V>>, &mut Option<Token<V>>) -> ErrorRecovery + Send + Sync + 'static,
  {
    self.on_error = Some(Box::new(hook));
  }

  /// Scans `input` with the parser's own lexer and parses the stream.
  pub fn parse(&self, input: &str) -> Result<V, ParseError>
  where
    V: Default + From<String>,
  {
    let spec = self.lexer.as_ref().ok_or(ParseError::NoLexer)?;
    let mut lexer = spec.scan(input);
    self.parse_tokens(&mut lexer)
  }

  /// Runs the shift-reduce loop over any token stream. The stream ends at
  /// the first `None`, which stands for `$end`.
  pub fn parse_tokens<I>(&self, tokens: I) -> Result<V, ParseError>
  where
    V: Default,
    I: IntoIterator<Item = Result<Token<V>, LexError>>,
  {
    let mut tokens = tokens.into_iter();
    let mut stack: Vec<Frame<V>> = vec![Frame {
      state: 0,
      symbol: Symbol::End,
      value: V::default(),
    }];
    let mut lookahead: Option<Token<V>> = None;
    let mut exhausted = false;

    loop {
      if lookahead.is_none() && !exhausted {
        match tokens.next() {
          Some(Ok(t)) => lookahead = Some(t),
          Some(Err(e)) => return Err(ParseError::Lex(e)),
          None => exhausted = true,
        }
      }

      let state = stack.last().unwrap().state;
      let la_kind = match &lookahead {
        Some(t) => &t.kind,
        None => &Symbol::End,
      };

      match self.table.action[state].get(la_kind).copied() {
        Some(Action::Shift(next)) => {
          let t = lookahead.take().unwrap();
          stack.push(Frame {
            state: next,
            symbol: t.kind,
            value: t.value,
          });
        }
        Some(Action::Reduce(prod)) => {
          let p = &self.grammar.productions[prod];
          let at = stack.len() - p.body.len();
          let values: Vec<V> = stack.drain(at..).map(|f| f.value).collect();
          let value = match &p.action {
            Some(f) => (**f)(values).map_err(ParseError::Action)?,
            None => V::default(),
          };
          let top = stack.last().unwrap().state;
          let next = self.table.goto[top][&p.head];
          stack.push(Frame {
            state: next,
            symbol: p.head.clone(),
            value,
          });
        }
        Some(Action::Accept) => {
          return Ok(stack.pop().unwrap().value);
        }
        None => {
          if let Some(hook) = &self.on_error {
            if hook(&mut stack, &mut lookahead) == ErrorRecovery::Resume {
              continue;
            }
          }
          let expected = self.table.action[state].keys().cloned().collect();
          return Err(match lookahead.take() {
            Some(t) => ParseError::UnexpectedToken {
              state,
              kind: t.kind,
              line: t.line,
              pos: t.pos,
              expected,
            },
            None => ParseError::UnexpectedEof { state, expected },
          });
        }
      }
    }
  }
}

/// Declarative parser assembly: a lexer declaration, precedence levels and
/// Yacc-style rule strings, compiled in one go by [`build`](Self::build).
pub struct ParserBuilder<V> {
  lexer: Option<LexerBuilder<V>>,
  precedences: Vec<(Symbol, Assoc, usize)>,
  rules: Vec<(String, Option<ReduceAction<V>>)>,
  start: Option<Symbol>,
  on_error: Option<ParseErrorHook<V>>,
}

impl<V> ParserBuilder<V> {
  pub fn new() -> ParserBuilder<V> {
    ParserBuilder {
      lexer: None,
      precedences: Vec::new(),
      rules: Vec::new(),
      start: None,
      on_error: None,
    }
  }

  pub fn lexer(mut self, lexer: LexerBuilder<V>) -> Self {
    self.lexer = Some(lexer);
    self
  }

  pub fn precedence(mut self, term: impl Into<Symbol>, assoc: Assoc, level: usize) -> Self {
    self.precedences.push((term.into(), assoc, level));
    self
  }

  /// A rule string, possibly with alternatives: `"expression : NUMBER"`,
  /// `"list : item | item ',' list |"`.
  pub fn rule(mut self, src: &str) -> Self {
    self.rules.push((src.to_owned(), None));
    self
  }

  /// A rule string whose action applies to every alternative.
  pub fn rule_with<F>(mut self, src: &str, action: F) -> Self
  where
    F: Fn(Vec<V>) -> Result<V, ActionError> + Send + Sync + 'static,
  {
    self.rules.push((src.to_owned(), Some(Arc::new(action))));
    self
  }

  /// Like [`rule_with`](Self::rule_with), taking an already shared action.
  pub fn rule_with_action(mut self, src: &str, action: ReduceAction<V>) -> Self {
    self.rules.push((src.to_owned(), Some(action)));
    self
  }

  /// Overrides the start symbol; by default the first rule's head starts.
  pub fn start(mut self, sym: impl Into<Symbol>) -> Self {
    self.start = Some(sym.into());
    self
  }

  pub fn on_error<F>(mut self, hook: F) -> Self
  where
    F: Fn(&mut Vec<Frame<V>>, &mut Option<Token<V>>) -> ErrorRecovery + Send + Sync + 'static,
  {
    self.on_error = Some(Box::new(hook));
    self
  }

  pub fn build(self) -> Result<Parser<V>, BuildError> {
    let spec = match self.lexer {
      Some(lexer) => lexer.build()?,
      None => return Err(BuildError::NoLexer),
    };

    let mut grammar = Grammar::new(spec.terminals())?;
    for (term, assoc, level) in self.precedences {
      grammar.set_precedence(term, assoc, level)?;
    }
    for (src, action) in self.rules {
      for (head, body) in rule_parser::parse_rules(&src)? {
        match &action {
          Some(action) => grammar.add_production_with(head, body, action.clone())?,
          None => grammar.add_production(head, body)?,
        };
      }
    }
    grammar.set_start(self.start)?;
    grammar.build_lritems();

    let table = LrTable::build(&grammar);
    Ok(Parser {
      grammar: Arc::new(grammar),
      table: Arc::new(table),
      lexer: Some(Arc::new(spec)),
      on_error: self.on_error,
    })
  }
}

impl<V> Default for ParserBuilder<V> {
  fn default() -> Self {
    ParserBuilder::new()
  }
}
