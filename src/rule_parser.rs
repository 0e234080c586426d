//! The rule-string mini-syntax: `head : sym "+" other | alternative |`.
//! An `ID` followed by `:` opens a rule, `|` separates alternatives (a
//! trailing or doubled `|` yields an empty body), and quoted one-character
//! strings are literal terminals.

use crate::errors::RuleError;
use crate::lexer::{LexerBuilder, LexerSpec};
use crate::token::{Symbol, Token};

pub(crate) fn meta_lexer() -> LexerSpec<String> {
  // fixed patterns, compilation cannot fail
  LexerBuilder::new()
    .token("ID", "[a-zA-Z_][a-zA-Z_0-9]*")
    .token("LITERAL", r#""[^"]*"|'[^']*'"#)
    .literals(":|")
    .ignore(" \t\r\n")
    .build()
    .unwrap()
}

/// Parses a rule string into `(head, body)` tuples, one per alternative.
pub fn parse_rules(src: &str) -> Result<Vec<(Symbol, Vec<Symbol>)>, RuleError> {
  let spec = meta_lexer();
  let tokens: Result<Vec<Token<String>>, _> = spec.scan(src).collect();
  let tokens = tokens.map_err(RuleError::Lex)?;

  let mut rules = Vec::new();
  let mut i = 0;
  while i < tokens.len() {
    let head = match &tokens[i].kind {
      Symbol::Name(n) if n == "ID" => Symbol::name(&tokens[i].value),
      _ => return Err(RuleError::Syntax { pos: tokens[i].pos }),
    };
    match tokens.get(i + 1) {
      Some(t) if t.kind == Symbol::Char(':') => {}
      Some(t) => return Err(RuleError::Syntax { pos: t.pos }),
      None => return Err(RuleError::Syntax { pos: src.len() }),
    }
    i += 2;

    let mut body = Vec::new();
    while i < tokens.len() {
      let tok = &tokens[i];
      match &tok.kind {
        Symbol::Char('|') => {
          rules.push((head.clone(), std::mem::take(&mut body)));
          i += 1;
        }
        Symbol::Name(n) if n == "ID" => {
          // an ID followed by `:` is the next rule's head
          if tokens.get(i + 1).map_or(false, |t| t.kind == Symbol::Char(':')) {
            break;
          }
          body.push(Symbol::name(&tok.value));
          i += 1;
        }
        Symbol::Name(n) if n == "LITERAL" => {
          let quoted = &tok.value[1..tok.value.len() - 1];
          let mut chars = quoted.chars();
          match (chars.next(), chars.next()) {
            (Some(c), None) => body.push(Symbol::Char(c)),
            _ => return Err(RuleError::MultiCharLiteral(quoted.to_owned())),
          }
          i += 1;
        }
        _ => return Err(RuleError::Syntax { pos: tok.pos }),
      }
    }
    rules.push((head, body));
  }

  Ok(rules)
}
