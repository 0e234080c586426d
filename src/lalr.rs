//! LALR(1) table construction with the DeRemer-Pennello lookahead
//! algorithm: the LR(0) canonical collection first, then lookahead sets
//! propagated over the reads and includes relations with a single SCC
//! traversal, instead of the LR(1)-item blowup.

use fnv::{FnvHashMap, FnvHashSet};

use crate::grammar::{Assoc, Grammar};
use crate::token::Symbol;
use crate::{Map, Set};

/// An LR(0) item, identified structurally by production and dot position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
  pub prod: usize,
  pub dot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Shift(usize),
  Reduce(usize),
  Accept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
  ShiftReduce,
  ReduceReduce,
}

/// A resolved table conflict. Conflicts never fail the build; they are
/// recorded alongside the action that won and the one that was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
  pub state: usize,
  pub lookahead: Symbol,
  pub kind: ConflictKind,
  pub resolved: Action,
  pub dropped: Action,
}

/// An immutable LALR(1) parse table. `action` and `goto` are per-state
/// rows keyed by symbol; a missing cell is a syntax error.
#[derive(Debug)]
pub struct LrTable {
  pub states: Vec<Vec<Item>>,
  pub transitions: Vec<Map<Symbol, usize>>,
  pub action: Vec<Map<Symbol, Action>>,
  pub goto: Vec<Map<Symbol, usize>>,
  pub conflicts: Vec<Conflict>,
}

impl LrTable {
  /// Builds the table for a grammar whose start symbol has been set.
  pub fn build<V>(grammar: &Grammar<V>) -> LrTable {
    let mut b = TableBuilder::new(grammar);
    b.lr0_items();
    let nullable = b.compute_nullable_nonterminals();
    let trans = b.find_nonterminal_transitions();
    let read_sets = b.compute_read_sets(&trans, &nullable);
    let (lookback, includes) = b.compute_lookback_includes(&trans, &nullable);
    let follow_sets = b.compute_follow_sets(&trans, &read_sets, &includes);
    let lookaheads = b.add_lookaheads(&lookback, &follow_sets);
    let (action, goto, conflicts) = b.parse_table(&lookaheads);
    LrTable {
      states: b.states,
      transitions: b.transitions,
      action,
      goto,
      conflicts,
    }
  }
}

type Transition = (usize, Symbol);

pub(crate) struct TableBuilder<'g, V> {
  grammar: &'g Grammar<V>,
  pub(crate) states: Vec<Vec<Item>>,
  pub(crate) transitions: Vec<Map<Symbol, usize>>,
}

impl<'g, V> TableBuilder<'g, V> {
  pub(crate) fn new(grammar: &'g Grammar<V>) -> Self {
    TableBuilder {
      grammar,
      states: Vec::new(),
      transitions: Vec::new(),
    }
  }

  /// Closure of an item set: pull in `X -> . gamma` for every nonterminal
  /// X right after a dot. Worklist order keeps item lists deterministic.
  pub(crate) fn lr0_closure(&self, seed: &[Item]) -> Vec<Item> {
    let mut closure = seed.to_vec();
    let mut i = 0;
    while i < closure.len() {
      let item = closure[i];
      let p = &self.grammar.productions[item.prod];
      if let Some(prods) = p.body.get(item.dot).and_then(|s| self.grammar.prodnames.get(s)) {
        for &q in prods {
          let new = Item { prod: q, dot: 0 };
          if !closure.contains(&new) {
            closure.push(new);
          }
        }
      }
      i += 1;
    }
    closure
  }

  /// goto(I, X): advance the dot over X in every item that allows it,
  /// then close.
  pub(crate) fn lr0_goto(&self, items: &[Item], sym: &Symbol) -> Vec<Item> {
    let advanced: Vec<Item> = items
      .iter()
      .filter(|it| self.grammar.productions[it.prod].body.get(it.dot) == Some(sym))
      .map(|it| Item {
        prod: it.prod,
        dot: it.dot + 1,
      })
      .collect();
    if advanced.is_empty() {
      return advanced;
    }
    self.lr0_closure(&advanced)
  }

  /// The canonical LR(0) collection, discovered breadth-first from the
  /// start item. Structurally identical item sets are interned, so every
  /// set appears exactly once; `transitions` records goto edges for
  /// terminals and nonterminals alike.
  pub(crate) fn lr0_items(&mut self) {
    let start = self.lr0_closure(&[Item { prod: 0, dot: 0 }]);
    let mut interned: FnvHashMap<Vec<Item>, usize> = FnvHashMap::default();
    interned.insert(sorted(&start), 0);
    self.states.push(start);
    self.transitions.push(Map::default());

    let mut i = 0;
    while i < self.states.len() {
      let mut syms: Set<Symbol> = Set::default();
      for item in &self.states[i] {
        if let Some(sym) = self.grammar.productions[item.prod].body.get(item.dot) {
          syms.insert(sym.clone());
        }
      }

      for sym in syms {
        let goto = self.lr0_goto(&self.states[i], &sym);
        if goto.is_empty() {
          continue;
        }
        let key = sorted(&goto);
        let j = match interned.get(&key) {
          Some(&j) => j,
          None => {
            let j = self.states.len();
            interned.insert(key, j);
            self.states.push(goto);
            self.transitions.push(Map::default());
            j
          }
        };
        self.transitions[i].insert(sym, j);
      }
      i += 1;
    }
  }

  /// Nonterminals that can derive the empty string.
  pub(crate) fn compute_nullable_nonterminals(&self) -> Set<Symbol> {
    let mut nullable: Set<Symbol> = Set::default();
    loop {
      let before = nullable.len();
      for p in self.grammar.productions.iter().skip(1) {
        if p.body.iter().all(|s| nullable.contains(s)) {
          nullable.insert(p.head.clone());
        }
      }
      if nullable.len() == before {
        break;
      }
    }
    nullable
  }

  /// Every `(state, nonterminal)` goto edge, in state-then-item order.
  pub(crate) fn find_nonterminal_transitions(&self) -> Vec<Transition> {
    let mut trans = Vec::new();
    for (ix, items) in self.states.iter().enumerate() {
      for item in items {
        if let Some(sym) = self.grammar.productions[item.prod].body.get(item.dot) {
          if self.grammar.nonterminals.contains_key(sym) {
            let t = (ix, sym.clone());
            if !trans.contains(&t) {
              trans.push(t);
            }
          }
        }
      }
    }
    trans
  }

  /// DR(p, A): terminals readable directly after taking the transition.
  /// The start transition out of state 0 also reads `$end`.
  pub(crate) fn dr_relation(&self, trans: &Transition, _nullable: &Set<Symbol>) -> Vec<Symbol> {
    let (state, nt) = trans;
    let j = self.transitions[*state][nt];
    let mut terms = Vec::new();
    for item in &self.states[j] {
      if let Some(sym) = self.grammar.productions[item.prod].body.get(item.dot) {
        if self.grammar.terminals.contains_key(sym) && !terms.contains(sym) {
          terms.push(sym.clone());
        }
      }
    }
    if *state == 0 && self.grammar.productions[0].body.first() == Some(nt) {
      terms.push(Symbol::End);
    }
    terms
  }

  /// (p, A) READS (t, C) when the A-transition lands in t and C is a
  /// nullable nonterminal readable there.
  pub(crate) fn reads_relation(&self, trans: &Transition, nullable: &Set<Symbol>) -> Vec<Transition> {
    let (state, nt) = trans;
    let j = self.transitions[*state][nt];
    let mut rel = Vec::new();
    for item in &self.states[j] {
      if let Some(sym) = self.grammar.productions[item.prod].body.get(item.dot) {
        if nullable.contains(sym) {
          rel.push((j, sym.clone()));
        }
      }
    }
    rel
  }

  pub(crate) fn compute_read_sets(
    &self,
    trans: &[Transition],
    nullable: &Set<Symbol>,
  ) -> Map<Transition, Vec<Symbol>> {
    digraph(
      trans,
      |x| self.reads_relation(x, nullable),
      |x| self.dr_relation(x, nullable),
    )
  }

  /// The lookback and includes relations. For each nonterminal transition
  /// `(state, N)` and each item `N -> alpha . beta` in that state, walk
  /// `beta` through the automaton; transitions crossed over a nonterminal
  /// with a nullable remainder contribute includes edges, and the items of
  /// the final state whose prefix matches `beta` contribute lookback
  /// entries.
  #[allow(clippy::type_complexity)]
  pub(crate) fn compute_lookback_includes(
    &self,
    trans: &[Transition],
    nullable: &Set<Symbol>,
  ) -> (
    Map<Transition, Vec<(usize, Item)>>,
    Map<Transition, Vec<Transition>>,
  ) {
    let dtrans: FnvHashSet<&Transition> = trans.iter().collect();
    let mut lookback: Map<Transition, Vec<(usize, Item)>> = Map::default();
    let mut includes: Map<Transition, Vec<Transition>> = Map::default();

    for (state, nt) in trans {
      let mut lookb = Vec::new();
      let mut incl = Vec::new();

      for item in &self.states[*state] {
        let p = &self.grammar.productions[item.prod];
        if p.head != *nt {
          continue;
        }
        let plen = p.body.len() + 1;

        let mut k = item.dot;
        let mut j = *state;
        while k < plen - 1 {
          k += 1;
          let t = marked(&p.body, item.dot, k).unwrap();
          if dtrans.contains(&(j, t.clone())) {
            // includes only if everything after t can derive empty
            let tail_nullable = (k + 1..plen).all(|li| {
              let s = marked(&p.body, item.dot, li).unwrap();
              !self.grammar.terminals.contains_key(s) && nullable.contains(s)
            });
            if tail_nullable {
              incl.push((j, t.clone()));
            }
          }
          j = self.transitions[j][t];
        }

        for r in &self.states[j] {
          let rp = &self.grammar.productions[r.prod];
          if rp.head != p.head || rp.body.len() != p.body.len() {
            continue;
          }
          let matches = (0..r.dot)
            .all(|i| marked(&rp.body, r.dot, i) == marked(&p.body, item.dot, i + 1));
          if matches {
            lookb.push((j, *r));
          }
        }
      }

      for edge in incl {
        includes.entry(edge).or_default().push((*state, nt.clone()));
      }
      lookback.insert((*state, nt.clone()), lookb);
    }

    (lookback, includes)
  }

  pub(crate) fn compute_follow_sets(
    &self,
    trans: &[Transition],
    read_sets: &Map<Transition, Vec<Symbol>>,
    includes: &Map<Transition, Vec<Transition>>,
  ) -> Map<Transition, Vec<Symbol>> {
    digraph(
      trans,
      |x| includes.get(x).cloned().unwrap_or_default(),
      |x| read_sets[x].clone(),
    )
  }

  /// Attaches each transition's follow set to the items it looks back to,
  /// keyed by `(state, item)`.
  pub(crate) fn add_lookaheads(
    &self,
    lookback: &Map<Transition, Vec<(usize, Item)>>,
    follow_sets: &Map<Transition, Vec<Symbol>>,
  ) -> FnvHashMap<(usize, Item), Vec<Symbol>> {
    let mut lookaheads: FnvHashMap<(usize, Item), Vec<Symbol>> = FnvHashMap::default();
    for (trans, lb) in lookback {
      let follow = match follow_sets.get(trans) {
        Some(f) => f,
        None => continue,
      };
      for (state, item) in lb {
        let entry = lookaheads.entry((*state, *item)).or_default();
        for sym in follow {
          if !entry.contains(sym) {
            entry.push(sym.clone());
          }
        }
      }
    }
    lookaheads
  }

  /// Fills the action and goto rows. Shift/reduce collisions resolve by
  /// precedence (equal levels: `Left` reduces, `Right` and `Nonassoc`
  /// shift); reduce/reduce by lowest production index. Defaulted and
  /// nonassociative resolutions are recorded as conflicts.
  #[allow(clippy::type_complexity)]
  pub(crate) fn parse_table(
    &self,
    lookaheads: &FnvHashMap<(usize, Item), Vec<Symbol>>,
  ) -> (Vec<Map<Symbol, Action>>, Vec<Map<Symbol, usize>>, Vec<Conflict>) {
    let mut action = Vec::with_capacity(self.states.len());
    let mut goto = Vec::with_capacity(self.states.len());
    let mut conflicts = Vec::new();
    let no_lookaheads = Vec::new();

    for (st, items) in self.states.iter().enumerate() {
      let mut row: Map<Symbol, Action> = Map::default();

      for item in items {
        let p = &self.grammar.productions[item.prod];
        if item.dot == p.body.len() {
          if item.prod == 0 {
            row.insert(Symbol::End, Action::Accept);
            continue;
          }
          let las = lookaheads.get(&(st, *item)).unwrap_or(&no_lookaheads);
          for la in las {
            match row.get(la).copied() {
              None => {
                row.insert(la.clone(), Action::Reduce(item.prod));
              }
              Some(Action::Reduce(other)) => {
                let (keep, drop) = if item.prod < other {
                  (item.prod, other)
                } else {
                  (other, item.prod)
                };
                conflicts.push(Conflict {
                  state: st,
                  lookahead: la.clone(),
                  kind: ConflictKind::ReduceReduce,
                  resolved: Action::Reduce(keep),
                  dropped: Action::Reduce(drop),
                });
                row.insert(la.clone(), Action::Reduce(keep));
              }
              Some(Action::Shift(j)) => {
                let chosen = self.resolve_shift_reduce(st, la, j, item.prod, &mut conflicts);
                row.insert(la.clone(), chosen);
              }
              Some(Action::Accept) => {}
            }
          }
        } else {
          let sym = &p.body[item.dot];
          if !self.grammar.terminals.contains_key(sym) {
            continue;
          }
          let j = self.transitions[st][sym];
          match row.get(sym).copied() {
            None => {
              row.insert(sym.clone(), Action::Shift(j));
            }
            Some(Action::Shift(_)) | Some(Action::Accept) => {}
            Some(Action::Reduce(r)) => {
              let chosen = self.resolve_shift_reduce(st, sym, j, r, &mut conflicts);
              row.insert(sym.clone(), chosen);
            }
          }
        }
      }

      let mut goto_row: Map<Symbol, usize> = Map::default();
      for (sym, &j) in &self.transitions[st] {
        if self.grammar.nonterminals.contains_key(sym) {
          goto_row.insert(sym.clone(), j);
        }
      }

      action.push(row);
      goto.push(goto_row);
    }

    (action, goto, conflicts)
  }

  fn resolve_shift_reduce(
    &self,
    state: usize,
    lookahead: &Symbol,
    shift_to: usize,
    reduce_prod: usize,
    conflicts: &mut Vec<Conflict>,
  ) -> Action {
    let (_, slevel) = self
      .grammar
      .precedence
      .get(lookahead)
      .copied()
      .unwrap_or((Assoc::Right, 0));
    let (rassoc, rlevel) = self.grammar.productions[reduce_prod].prec;

    let shift = Action::Shift(shift_to);
    let reduce = Action::Reduce(reduce_prod);
    let (resolved, dropped) = if slevel > rlevel {
      (shift, reduce)
    } else if rlevel > slevel {
      (reduce, shift)
    } else {
      match rassoc {
        Assoc::Left => (reduce, shift),
        Assoc::Right | Assoc::Nonassoc => (shift, reduce),
      }
    };

    let undeclared = slevel == 0 && rlevel == 0;
    let nonassoc_tie = slevel == rlevel && rassoc == Assoc::Nonassoc;
    if undeclared || nonassoc_tie {
      conflicts.push(Conflict {
        state,
        lookahead: lookahead.clone(),
        kind: ConflictKind::ShiftReduce,
        resolved,
        dropped,
      });
    }
    resolved
  }
}

fn sorted(items: &[Item]) -> Vec<Item> {
  let mut key = items.to_vec();
  key.sort_unstable();
  key
}

/// Index into a production body with a dot marker at `dot`: positions
/// before the dot map to the body directly, the dot itself to `None`,
/// positions after shift down by one.
fn marked<'a>(body: &'a [Symbol], dot: usize, k: usize) -> Option<&'a Symbol> {
  if k < dot {
    body.get(k)
  } else if k == dot {
    None
  } else {
    body.get(k - 1)
  }
}

/// The DeRemer-Pennello digraph propagation: unions FP over the relation
/// R, collapsing strongly connected components in one pass.
fn digraph<R, FP>(xs: &[Transition], r: R, fp: FP) -> Map<Transition, Vec<Symbol>>
where
  R: Fn(&Transition) -> Vec<Transition>,
  FP: Fn(&Transition) -> Vec<Symbol>,
{
  let mut n: Map<Transition, usize> = xs.iter().map(|x| (x.clone(), 0)).collect();
  let mut f: Map<Transition, Vec<Symbol>> = Map::default();
  let mut stack: Vec<Transition> = Vec::new();
  for x in xs {
    if n[x] == 0 {
      traverse(x, &mut n, &mut stack, &mut f, &r, &fp);
    }
  }
  f
}

fn traverse<R, FP>(
  x: &Transition,
  n: &mut Map<Transition, usize>,
  stack: &mut Vec<Transition>,
  f: &mut Map<Transition, Vec<Symbol>>,
  r: &R,
  fp: &FP,
) where
  R: Fn(&Transition) -> Vec<Transition>,
  FP: Fn(&Transition) -> Vec<Symbol>,
{
  stack.push(x.clone());
  let d = stack.len();
  n[x] = d;
  f.insert(x.clone(), fp(x));

  for y in r(x) {
    if n.get(&y).copied().unwrap_or(0) == 0 {
      traverse(&y, n, stack, f, r, fp);
    }
    let ny = n[&y];
    if ny < n[x] {
      n[x] = ny;
    }
    let add: Vec<Symbol> = f.get(&y).cloned().unwrap_or_default();
    let fx = f.get_mut(x).unwrap();
    for sym in add {
      if !fx.contains(&sym) {
        fx.push(sym);
      }
    }
  }

  if n[x] == d {
    let fx = f[x].clone();
    loop {
      let top = stack.pop().unwrap();
      n[&top] = usize::MAX;
      f.insert(top.clone(), fx.clone());
      if top == *x {
        break;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::LrItem;
  use itertools::Itertools;
  use pretty_assertions::assert_eq;

  fn sym(s: &str) -> Symbol {
    Symbol::name(s)
  }

  fn minicalc() -> Grammar<String> {
    let mut g = Grammar::new(vec!["NUMBER"]).unwrap();
    g.set_precedence('+', Assoc::Left, 1).unwrap();
    g.set_precedence('-', Assoc::Left, 1).unwrap();
    g.add_production("statement", vec![sym("expression")]).unwrap();
    g.add_production(
      "expression",
      vec![sym("expression"), '+'.into(), sym("expression")],
    )
    .unwrap();
    g.add_production(
      "expression",
      vec![sym("expression"), '-'.into(), sym("expression")],
    )
    .unwrap();
    g.add_production("expression", vec![sym("NUMBER")]).unwrap();
    g.set_start(None).unwrap();
    g.build_lritems();
    g
  }

  fn builder(g: &Grammar<String>) -> TableBuilder<'_, String> {
    let mut b = TableBuilder::new(g);
    b.lr0_items();
    b
  }

  fn item_text(g: &Grammar<String>, item: Item) -> String {
    LrItem {
      prod: item.prod,
      dot: item.dot,
      lr_after: Vec::new(),
    }
    .to_text(g)
  }

  #[test]
  fn closure_of_the_start_item() {
    let g = minicalc();
    let b = TableBuilder::new(&g);
    let closure = b.lr0_closure(&[Item { prod: 0, dot: 0 }]);

    assert_eq!(closure.len(), 5);
    for (i, item) in closure.iter().enumerate() {
      assert_eq!(*item, Item { prod: i, dot: 0 });
    }
  }

  #[test]
  fn goto_advances_the_dot_and_closes() {
    let g = minicalc();
    let b = TableBuilder::new(&g);
    let closure = b.lr0_closure(&[Item { prod: 0, dot: 0 }]);

    let goto = b.lr0_goto(&closure, &sym("statement"));
    assert_eq!(goto, vec![Item { prod: 0, dot: 1 }]);
    assert_eq!(item_text(&g, goto[0]), "S' -> statement .");

    let goto = b.lr0_goto(&closure, &sym("expression"));
    let texts: Vec<String> = goto.iter().map(|&i| item_text(&g, i)).collect();
    assert_eq!(
      texts,
      vec![
        "statement -> expression .",
        "expression -> expression . + expression",
        "expression -> expression . - expression",
      ],
    );
  }

  #[test]
  fn canonical_collection() {
    let g = minicalc();
    let b = builder(&g);

    let reflist = vec![
      "S' -> . statement|statement -> . expression|expression -> . expression + expression|expression -> . expression - expression|expression -> . NUMBER",
      "S' -> statement .",
      "statement -> expression .|expression -> expression . + expression|expression -> expression . - expression",
      "expression -> NUMBER .",
      "expression -> expression + . expression|expression -> . expression + expression|expression -> . expression - expression|expression -> . NUMBER",
      "expression -> expression - . expression|expression -> . expression + expression|expression -> . expression - expression|expression -> . NUMBER",
      "expression -> expression + expression .|expression -> expression . + expression|expression -> expression . - expression",
      "expression -> expression - expression .|expression -> expression . + expression|expression -> expression . - expression",
    ];

    let rendered: Vec<String> = b
      .states
      .iter()
      .map(|items| items.iter().map(|&i| item_text(&g, i)).join("|"))
      .collect();
    assert_eq!(rendered, reflist);
  }

  #[test]
  fn no_nullable_nonterminals_in_minicalc() {
    let g = minicalc();
    let b = builder(&g);
    assert!(b.compute_nullable_nonterminals().is_empty());
  }

  #[test]
  fn nullable_nonterminals_are_found_transitively() {
    let mut g: Grammar<String> = Grammar::new(vec!["A", "C"]).unwrap();
    g.add_production("s", vec![sym("A"), sym("opt")]).unwrap();
    g.add_production("opt", vec![]).unwrap();
    g.add_production("opt", vec![sym("C")]).unwrap();
    g.add_production("pair", vec![sym("opt"), sym("opt")]).unwrap();
    g.set_start(None).unwrap();

    let b = builder(&g);
    let nullable = b.compute_nullable_nonterminals();
    let names: Vec<&Symbol> = nullable.iter().collect();
    assert_eq!(names, vec![&sym("opt"), &sym("pair")]);
  }

  #[test]
  fn nonterminal_transitions() {
    let g = minicalc();
    let b = builder(&g);
    assert_eq!(
      b.find_nonterminal_transitions(),
      vec![
        (0, sym("statement")),
        (0, sym("expression")),
        (4, sym("expression")),
        (5, sym("expression")),
      ],
    );
  }

  #[test]
  fn dr_relation() {
    let g = minicalc();
    let b = builder(&g);
    let nullable = b.compute_nullable_nonterminals();
    let trans = b.find_nonterminal_transitions();

    assert_eq!(b.dr_relation(&trans[0], &nullable), vec![Symbol::End]);
    assert_eq!(
      b.dr_relation(&trans[1], &nullable),
      vec![Symbol::Char('+'), Symbol::Char('-')],
    );
  }

  #[test]
  fn reads_relation_is_empty_without_nullables() {
    let g = minicalc();
    let b = builder(&g);
    let nullable = b.compute_nullable_nonterminals();
    let trans = b.find_nonterminal_transitions();

    assert_eq!(b.reads_relation(&trans[0], &nullable), vec![]);
    assert_eq!(b.reads_relation(&trans[1], &nullable), vec![]);
  }

  #[test]
  fn read_sets() {
    let g = minicalc();
    let b = builder(&g);
    let nullable = b.compute_nullable_nonterminals();
    let trans = b.find_nonterminal_transitions();

    let read_sets = b.compute_read_sets(&trans, &nullable);
    assert_eq!(read_sets[&(0, sym("statement"))], vec![Symbol::End]);
    assert_eq!(
      read_sets[&(0, sym("expression"))],
      vec![Symbol::Char('+'), Symbol::Char('-')],
    );
    assert_eq!(
      read_sets[&(4, sym("expression"))],
      vec![Symbol::Char('+'), Symbol::Char('-')],
    );
    assert_eq!(
      read_sets[&(5, sym("expression"))],
      vec![Symbol::Char('+'), Symbol::Char('-')],
    );
  }

  #[test]
  fn lookback_and_includes() {
    let g = minicalc();
    let b = builder(&g);
    let nullable = b.compute_nullable_nonterminals();
    let trans = b.find_nonterminal_transitions();

    let (lookback, includes) = b.compute_lookback_includes(&trans, &nullable);

    assert_eq!(
      includes[&(5, sym("expression"))],
      vec![
        (0, sym("expression")),
        (4, sym("expression")),
        (5, sym("expression")),
        (5, sym("expression")),
      ],
    );
    assert_eq!(
      includes[&(4, sym("expression"))],
      vec![
        (0, sym("expression")),
        (4, sym("expression")),
        (4, sym("expression")),
        (5, sym("expression")),
      ],
    );
    assert_eq!(
      includes[&(0, sym("expression"))],
      vec![(0, sym("statement"))],
    );

    let rendered: Map<(usize, Symbol), Vec<(usize, String)>> = lookback
      .iter()
      .map(|(k, v)| {
        let v = v.iter().map(|&(j, item)| (j, item_text(&g, item))).collect();
        (k.clone(), v)
      })
      .collect();

    assert_eq!(
      rendered[&(0, sym("statement"))],
      vec![(2, "statement -> expression .".to_owned())],
    );
    let expr_lookback = vec![
      (6, "expression -> expression + expression .".to_owned()),
      (6, "expression -> expression . + expression".to_owned()),
      (6, "expression -> expression . - expression".to_owned()),
      (7, "expression -> expression - expression .".to_owned()),
      (7, "expression -> expression . + expression".to_owned()),
      (7, "expression -> expression . - expression".to_owned()),
      (3, "expression -> NUMBER .".to_owned()),
    ];
    assert_eq!(rendered[&(0, sym("expression"))], expr_lookback);
    assert_eq!(rendered[&(4, sym("expression"))], expr_lookback);
    assert_eq!(rendered[&(5, sym("expression"))], expr_lookback);
  }

  #[test]
  fn follow_sets() {
    let g = minicalc();
    let b = builder(&g);
    let nullable = b.compute_nullable_nonterminals();
    let trans = b.find_nonterminal_transitions();
    let read_sets = b.compute_read_sets(&trans, &nullable);
    let (_, includes) = b.compute_lookback_includes(&trans, &nullable);

    let follow = b.compute_follow_sets(&trans, &read_sets, &includes);
    assert_eq!(follow[&(0, sym("statement"))], vec![Symbol::End]);
    let expr = vec![Symbol::Char('+'), Symbol::Char('-'), Symbol::End];
    assert_eq!(follow[&(0, sym("expression"))], expr);
    assert_eq!(follow[&(4, sym("expression"))], expr);
    assert_eq!(follow[&(5, sym("expression"))], expr);
  }

  #[test]
  fn minicalc_table() {
    let g = minicalc();
    let table = LrTable::build(&g);

    assert_eq!(table.states.len(), 8);
    assert_eq!(table.conflicts, vec![]);

    assert_eq!(table.action[0][&sym("NUMBER")], Action::Shift(3));
    assert_eq!(table.action[1][&Symbol::End], Action::Accept);
    assert_eq!(table.action[2][&Symbol::Char('+')], Action::Shift(4));
    assert_eq!(table.action[2][&Symbol::End], Action::Reduce(1));
    assert_eq!(table.action[3][&Symbol::End], Action::Reduce(4));

    // left associativity reduces on the ambiguous lookahead
    assert_eq!(table.action[6][&Symbol::Char('+')], Action::Reduce(2));
    assert_eq!(table.action[6][&Symbol::Char('-')], Action::Reduce(2));
    assert_eq!(table.action[6][&Symbol::End], Action::Reduce(2));

    assert_eq!(table.goto[0][&sym("statement")], 1);
    assert_eq!(table.goto[0][&sym("expression")], 2);
    assert_eq!(table.goto[4][&sym("expression")], 6);
  }

  #[test]
  fn undeclared_precedence_shifts_and_records_a_conflict() {
    let mut g: Grammar<String> = Grammar::new(vec!["NUMBER"]).unwrap();
    g.add_production(
      "expression",
      vec![sym("expression"), '+'.into(), sym("expression")],
    )
    .unwrap();
    g.add_production("expression", vec![sym("NUMBER")]).unwrap();
    g.set_start(None).unwrap();

    let table = LrTable::build(&g);
    assert_eq!(table.conflicts.len(), 1);
    let c = &table.conflicts[0];
    assert_eq!(c.kind, ConflictKind::ShiftReduce);
    assert_eq!(c.lookahead, Symbol::Char('+'));
    assert!(matches!(c.resolved, Action::Shift(_)));
    assert!(matches!(c.dropped, Action::Reduce(1)));
  }

  #[test]
  fn nonassoc_tie_shifts_and_records_a_conflict() {
    let mut g: Grammar<String> = Grammar::new(vec!["NUMBER", "CMP"]).unwrap();
    g.set_precedence("CMP", Assoc::Nonassoc, 1).unwrap();
    g.add_production(
      "expression",
      vec![sym("expression"), sym("CMP"), sym("expression")],
    )
    .unwrap();
    g.add_production("expression", vec![sym("NUMBER")]).unwrap();
    g.set_start(None).unwrap();

    let table = LrTable::build(&g);
    assert_eq!(table.conflicts.len(), 1);
    let c = &table.conflicts[0];
    assert_eq!(c.kind, ConflictKind::ShiftReduce);
    assert_eq!(c.lookahead, sym("CMP"));
    assert!(matches!(c.resolved, Action::Shift(_)));
  }

  #[test]
  fn reduce_reduce_picks_the_earlier_production() {
    let mut g: Grammar<String> = Grammar::new(vec!["X"]).unwrap();
    g.add_production("s", vec![sym("a")]).unwrap();
    g.add_production("s", vec![sym("b")]).unwrap();
    g.add_production("a", vec![sym("X")]).unwrap();
    g.add_production("b", vec![sym("X")]).unwrap();
    g.set_start(None).unwrap();

    let table = LrTable::build(&g);
    assert_eq!(table.conflicts.len(), 1);
    let c = &table.conflicts[0];
    assert_eq!(c.kind, ConflictKind::ReduceReduce);
    assert_eq!(c.lookahead, Symbol::End);
    assert_eq!(c.resolved, Action::Reduce(3));
    assert_eq!(c.dropped, Action::Reduce(4));
  }
}
