//! Shorthand for common lexer rules and reduction actions.

use std::sync::Arc;

use crate::grammar::ReduceAction;
use crate::lexer::LexerBuilder;

impl<V> LexerBuilder<V> {
  /// Skip spaces and tabs between tokens.
  pub fn ignore_spaces_and_tabs(self) -> Self {
    self.ignore(" \t")
  }

  /// A `NUMBER` rule for unsigned decimal literals, valued as an integer.
  pub fn lex_number_tokens(self) -> Self
  where
    V: From<i64> + 'static,
  {
    self.token_with("NUMBER", r"\d+", |lx| {
      Some(lx.token(V::from(lx.text.parse().unwrap_or(0))))
    })
  }

  /// A `STRING` rule for double-quoted strings, valued without the quotes.
  pub fn lex_double_quoted_string_tokens(self) -> Self
  where
    V: From<String> + 'static,
  {
    self.token_with("STRING", r#""[^"]*""#, |lx| {
      Some(lx.token(V::from(lx.text[1..lx.text.len() - 1].to_owned())))
    })
  }
}

/// Wraps an infallible closure as a reduction action.
pub fn action<V, F>(f: F) -> ReduceAction<V>
where
  F: Fn(Vec<V>) -> V + Send + Sync + 'static,
{
  Arc::new(move |values| Ok(f(values)))
}

/// An action producing the `n`th body value, 1-based. Out-of-range (an
/// empty alternative, say) yields the default value.
pub fn assign_rhs<V>(n: usize) -> ReduceAction<V>
where
  V: Default + 'static,
{
  Arc::new(move |values: Vec<V>| {
    if n == 0 {
      return Ok(V::default());
    }
    Ok(values.into_iter().nth(n - 1).unwrap_or_default())
  })
}

/// An action producing the first body value.
pub fn assign_rhs_first<V>() -> ReduceAction<V>
where
  V: Default + 'static,
{
  assign_rhs(1)
}

/// Value types that can carry a list, for [`collect_to_list`].
pub trait ListValue: Default + Sized {
  fn from_list(items: Vec<Self>) -> Self;
  fn into_list(self) -> Option<Vec<Self>>;
}

/// An action folding right-recursive list rules into one list value.
/// Handles the `x`, `x rest` and `x sep rest` body shapes (and the empty
/// body, yielding an empty list).
pub fn collect_to_list<V>() -> ReduceAction<V>
where
  V: ListValue + 'static,
{
  Arc::new(|values: Vec<V>| {
    let mut it = values.into_iter();
    let first = it.next();
    let rest = it.last();

    let mut items = Vec::new();
    if let Some(first) = first {
      items.push(first);
    }
    if let Some(tail) = rest.and_then(ListValue::into_list) {
      items.extend(tail);
    }
    Ok(V::from_list(items))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::Symbol;
  use pretty_assertions::assert_eq;

  #[test]
  fn spaces_and_tabs_are_ignored() {
    let spec = LexerBuilder::<String>::new()
      .ignore_spaces_and_tabs()
      .build()
      .unwrap();
    assert_eq!(spec.scan(" \t \t").next_token().unwrap(), None);
  }

  #[test]
  fn number_rule_produces_integer_values() {
    #[derive(Debug, PartialEq)]
    struct Val(i64);
    impl From<i64> for Val {
      fn from(n: i64) -> Val {
        Val(n)
      }
    }
    impl From<String> for Val {
      fn from(_: String) -> Val {
        Val(0)
      }
    }

    let spec = LexerBuilder::<Val>::new().lex_number_tokens().build().unwrap();
    let tok = spec.scan("123").next_token().unwrap().unwrap();
    assert_eq!(tok.kind, Symbol::name("NUMBER"));
    assert_eq!(tok.value, Val(123));
  }

  #[test]
  fn string_rule_strips_the_quotes() {
    let spec = LexerBuilder::<String>::new()
      .lex_double_quoted_string_tokens()
      .build()
      .unwrap();
    let tok = spec.scan(r#""a test""#).next_token().unwrap().unwrap();
    assert_eq!(tok.kind, Symbol::name("STRING"));
    assert_eq!(tok.value, "a test");
  }

  #[test]
  fn assign_rhs_picks_the_nth_value() {
    let act = assign_rhs::<String>(2);
    assert_eq!(
      (*act)(vec!["[".to_owned(), "test".to_owned(), "]".to_owned()]).unwrap(),
      "test",
    );
  }

  #[test]
  fn assign_rhs_defaults_when_out_of_range() {
    let act = assign_rhs_first::<String>();
    assert_eq!((*act)(vec![]).unwrap(), "");
  }
}
