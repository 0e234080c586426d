use std::fmt;
use std::sync::Arc;

use crate::errors::{ActionError, GrammarError};
use crate::token::Symbol;
use crate::Map;

/// Operator associativity for precedence declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
  Left,
  Right,
  Nonassoc,
}

/// A reduction action: consumes the values popped for a production's body
/// and produces the value of its head. Shared so one action can serve
/// every alternative of a rule string.
pub type ReduceAction<V> = Arc<dyn Fn(Vec<V>) -> Result<V, ActionError> + Send + Sync>;

/// A single production `head -> body`. Production 0 is always the synthetic
/// `S' -> start` added by [`Grammar::set_start`].
pub struct Production<V> {
  pub index: usize,
  pub head: Symbol,
  pub body: Vec<Symbol>,
  /// Resolved precedence: the rightmost body terminal with a declared
  /// precedence, else `(Right, 0)`.
  pub prec: (Assoc, usize),
  pub action: Option<ReduceAction<V>>,
  /// Dot chain `head -> . body` through `head -> body .`, filled by
  /// [`Grammar::build_lritems`].
  pub lr_items: Vec<LrItem>,
}

impl<V> Production<V> {
  pub fn len(&self) -> usize {
    self.body.len()
  }

  pub fn is_empty(&self) -> bool {
    self.body.is_empty()
  }

  /// Unique symbols of this production, in first-seen order.
  pub fn usyms(&self) -> Vec<&Symbol> {
    let mut syms = vec![&self.head];
    for sym in &self.body {
      if !syms.contains(&sym) {
        syms.push(sym);
      }
    }
    syms
  }
}

impl<V> fmt::Display for Production<V> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} ->", self.head)?;
    if self.body.is_empty() {
      write!(f, " <empty>")?;
    } else {
      for sym in &self.body {
        write!(f, " {}", sym)?;
      }
    }
    Ok(())
  }
}

impl<V> fmt::Debug for Production<V> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "Production({}. {})", self.index, self)
  }
}

/// An LR(0) item: a production with a dot position. `lr_after` lists the
/// productions of the nonterminal right after the dot, for closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrItem {
  pub prod: usize,
  pub dot: usize,
  pub lr_after: Vec<usize>,
}

impl LrItem {
  pub fn to_text<V>(&self, grammar: &Grammar<V>) -> String {
    let p = &grammar.productions[self.prod];
    let mut s = format!("{} ->", p.head);
    for (i, sym) in p.body.iter().enumerate() {
      if i == self.dot {
        s.push_str(" .");
      }
      s.push(' ');
      s.push_str(&sym.to_string());
    }
    if self.dot == p.body.len() {
      s.push_str(" .");
    }
    s
  }
}

/// A context-free grammar under construction. Terminals are fixed at
/// creation; productions and precedences accumulate until
/// [`set_start`](Self::set_start) freezes the start symbol.
///
/// The `terminals`, `nonterminals` and `prodnames` maps keep insertion
/// order; the index lists record, per symbol, the productions referencing
/// it (one entry per occurrence).
pub struct Grammar<V> {
  pub terminals: Map<Symbol, Vec<usize>>,
  pub nonterminals: Map<Symbol, Vec<usize>>,
  pub prodnames: Map<Symbol, Vec<usize>>,
  pub productions: Vec<Production<V>>,
  pub precedence: Map<Symbol, (Assoc, usize)>,
  pub start: Option<Symbol>,
  first: Map<Symbol, Vec<Symbol>>,
  follow: Map<Symbol, Vec<Symbol>>,
}

impl<V> Grammar<V> {
  /// Creates a grammar over the given terminals. Named terminals must be
  /// `UPPER_CASE`; the reserved `error` terminal is always present.
  pub fn new<I, S>(terminals: I) -> Result<Grammar<V>, GrammarError>
  where
    I: IntoIterator<Item = S>,
    S: Into<Symbol>,
  {
    let mut terms: Map<Symbol, Vec<usize>> = Map::default();
    for term in terminals {
      let term = term.into();
      match &term {
        Symbol::Name(name) => {
          if !term.is_upper_name() {
            return Err(GrammarError::BadTerminalName(name.clone()));
          }
        }
        Symbol::Char(_) => {}
        Symbol::End => return Err(GrammarError::BadTerminalName("$end".to_owned())),
      }
      terms.entry(term).or_default();
    }
    terms.entry(Symbol::name("error")).or_default();

    let mut productions = Vec::new();
    // Slot 0 is reserved for the synthetic start production.
    productions.push(Production {
      index: 0,
      head: Symbol::name("S'"),
      body: Vec::new(),
      prec: (Assoc::Right, 0),
      action: None,
      lr_items: Vec::new(),
    });

    Ok(Grammar {
      terminals: terms,
      nonterminals: Map::default(),
      prodnames: Map::default(),
      productions,
      precedence: Map::default(),
      start: None,
      first: Map::default(),
      follow: Map::default(),
    })
  }

  /// Declares a terminal's associativity and precedence level. Must happen
  /// before any production is added.
  pub fn set_precedence(
    &mut self,
    term: impl Into<Symbol>,
    assoc: Assoc,
    level: usize,
  ) -> Result<(), GrammarError> {
    let term = term.into();
    if self.productions.len() > 1 {
      return Err(GrammarError::PrecedenceAfterProduction(term));
    }
    if self.precedence.contains_key(&term) {
      return Err(GrammarError::DuplicatePrecedence(term));
    }
    self.precedence.insert(term, (assoc, level));
    Ok(())
  }

  /// Adds `head -> body` and returns its index (starting at 1).
  pub fn add_production(
    &mut self,
    head: impl Into<Symbol>,
    body: Vec<Symbol>,
  ) -> Result<usize, GrammarError> {
    self.add_production_raw(head.into(), body, None)
  }

  /// Like [`add_production`](Self::add_production), attaching a reduction
  /// action.
  pub fn add_production_with(
    &mut self,
    head: impl Into<Symbol>,
    body: Vec<Symbol>,
    action: ReduceAction<V>,
  ) -> Result<usize, GrammarError> {
    self.add_production_raw(head.into(), body, Some(action))
  }

  fn add_production_raw(
    &mut self,
    head: Symbol,
    body: Vec<Symbol>,
    action: Option<ReduceAction<V>>,
  ) -> Result<usize, GrammarError> {
    if head == Symbol::name("error") {
      return Err(GrammarError::ReservedName(head));
    }
    if !head.is_lower_name() {
      return Err(GrammarError::BadProductionName(head));
    }

    // Literal terminals register on first use.
    for sym in &body {
      if let Symbol::Char(c) = sym {
        self.terminals.entry(Symbol::Char(*c)).or_default();
      }
    }

    if self.prodnames.get(&head).map_or(false, |ixs| {
      ixs.iter().any(|&ix| self.productions[ix].body == body)
    }) {
      let dup = format!(
        "{} -> {}",
        head,
        body.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" "),
      );
      return Err(GrammarError::DuplicateProduction(dup));
    }

    let index = self.productions.len();

    for sym in &body {
      if self.terminals.contains_key(sym) {
        self.terminals[sym].push(index);
      } else {
        self.nonterminals.entry(sym.clone()).or_default().push(index);
      }
    }

    // Rightmost terminal decides the production's precedence.
    let mut prec = (Assoc::Right, 0);
    for sym in body.iter().rev() {
      if self.terminals.contains_key(sym) {
        if let Some(&p) = self.precedence.get(sym) {
          prec = p;
        }
        break;
      }
    }

    self.nonterminals.entry(head.clone()).or_default();
    self.prodnames.entry(head.clone()).or_default().push(index);

    self.productions.push(Production {
      index,
      head,
      body,
      prec,
      action,
      lr_items: Vec::new(),
    });

    Ok(index)
  }

  /// Freezes the start symbol and installs the synthetic `S' -> start`
  /// production at index 0. With `None`, the head of the first production
  /// is used.
  pub fn set_start(&mut self, start: Option<Symbol>) -> Result<(), GrammarError> {
    if let Some(start) = &self.start {
      return Err(GrammarError::StartAlreadySet(start.clone()));
    }
    let start = match start {
      Some(sym) => sym,
      None => match self.productions.get(1) {
        Some(p) => p.head.clone(),
        None => return Err(GrammarError::NoProductions),
      },
    };
    if !self.nonterminals.contains_key(&start) {
      return Err(GrammarError::UnknownStart(start));
    }

    self.productions[0].body = vec![start.clone()];
    self.nonterminals[&start].push(0);
    self.start = Some(start);
    Ok(())
  }

  /// Fills every production's dot chain. Requires the start symbol.
  pub fn build_lritems(&mut self) {
    let mut chains = Vec::with_capacity(self.productions.len());
    for p in &self.productions {
      let mut items = Vec::with_capacity(p.body.len() + 1);
      for dot in 0..=p.body.len() {
        let lr_after = p
          .body
          .get(dot)
          .and_then(|sym| self.prodnames.get(sym))
          .cloned()
          .unwrap_or_default();
        items.push(LrItem {
          prod: p.index,
          dot,
          lr_after,
        });
      }
      chains.push(items);
    }
    for (p, items) in self.productions.iter_mut().zip(chains) {
      p.lr_items = items;
    }
  }

  /// FIRST sets, cached after the first call. Terminals (and `$end`) are
  /// their own FIRST; nonterminals fixed-point over the leading body
  /// symbol of their productions. Diagnostic only: empty productions
  /// contribute nothing here, lookaheads come out of the table builder.
  pub fn compute_first(&mut self) -> &Map<Symbol, Vec<Symbol>> {
    if !self.first.is_empty() {
      return &self.first;
    }

    for term in self.terminals.keys() {
      self.first.insert(term.clone(), vec![term.clone()]);
    }
    self.first.insert(Symbol::End, vec![Symbol::End]);
    for nt in self.nonterminals.keys() {
      self.first.insert(nt.clone(), Vec::new());
    }

    loop {
      let mut changed = false;
      for p in self.productions.iter().skip(1) {
        let lead = match p.body.first() {
          Some(sym) => sym,
          None => continue,
        };
        let add: Vec<Symbol> = self.first[lead]
          .iter()
          .filter(|s| !self.first[&p.head].contains(s))
          .cloned()
          .collect();
        if !add.is_empty() {
          self.first[&p.head].extend(add);
          changed = true;
        }
      }
      if !changed {
        break;
      }
    }

    &self.first
  }

  /// FOLLOW sets, cached. `$end` seeds the start symbol.
  pub fn compute_follow(&mut self) -> &Map<Symbol, Vec<Symbol>> {
    if !self.follow.is_empty() {
      return &self.follow;
    }
    self.compute_first();

    for nt in self.nonterminals.keys() {
      self.follow.insert(nt.clone(), Vec::new());
    }
    if let Some(start) = &self.start {
      self.follow[start].push(Symbol::End);
    }

    loop {
      let mut changed = false;
      for p in self.productions.iter().skip(1) {
        for (i, sym) in p.body.iter().enumerate() {
          if !self.nonterminals.contains_key(sym) {
            continue;
          }
          let add: Vec<Symbol> = match p.body.get(i + 1) {
            Some(next) => self.first[next]
              .iter()
              .filter(|s| !self.follow[sym].contains(s))
              .cloned()
              .collect(),
            None => self.follow[&p.head]
              .iter()
              .filter(|s| !self.follow[sym].contains(s))
              .cloned()
              .collect(),
          };
          if !add.is_empty() {
            self.follow[sym].extend(add);
            changed = true;
          }
        }
      }
      if !changed {
        break;
      }
    }

    &self.follow
  }
}

impl<V> fmt::Debug for Grammar<V> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Grammar")
      .field("terminals", &self.terminals.keys().collect::<Vec<_>>())
      .field("productions", &self.productions)
      .field("start", &self.start)
      .finish()
  }
}
