//! Human-readable report of a grammar and its parse table: productions,
//! per-state items with their shift, reduce and goto entries, and the
//! conflict summary. Pure formatting, nothing here feeds back into the
//! build.

use std::fmt;

use crate::grammar::{Grammar, LrItem};
use crate::lalr::{Action, ConflictKind, LrTable};

pub struct Dump<'a, V> {
  grammar: &'a Grammar<V>,
  table: &'a LrTable,
}

impl<'a, V> Dump<'a, V> {
  pub fn new(grammar: &'a Grammar<V>, table: &'a LrTable) -> Dump<'a, V> {
    Dump { grammar, table }
  }
}

impl<V> fmt::Display for Dump<'_, V> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "Grammar")?;
    writeln!(f)?;
    for p in &self.grammar.productions {
      writeln!(f, "  {}. {}", p.index, p)?;
    }

    for (st, items) in self.table.states.iter().enumerate() {
      writeln!(f)?;
      writeln!(f, "State {}", st)?;
      writeln!(f)?;
      for item in items {
        let li = LrItem {
          prod: item.prod,
          dot: item.dot,
          lr_after: Vec::new(),
        };
        writeln!(f, "  {}", li.to_text(self.grammar))?;
      }

      let actions = &self.table.action[st];
      let gotos = &self.table.goto[st];
      if !actions.is_empty() || !gotos.is_empty() {
        writeln!(f)?;
      }
      for (sym, act) in actions {
        match act {
          Action::Shift(j) => writeln!(f, "  {}  shift {}", sym, j)?,
          Action::Reduce(p) => {
            writeln!(f, "  {}  reduce {} ({})", sym, p, self.grammar.productions[*p])?
          }
          Action::Accept => writeln!(f, "  {}  accept", sym)?,
        }
      }
      for (sym, j) in gotos {
        writeln!(f, "  {}  goto {}", sym, j)?;
      }
    }

    writeln!(f)?;
    if self.table.conflicts.is_empty() {
      writeln!(f, "no conflicts")?;
    } else {
      writeln!(f, "{} conflict(s)", self.table.conflicts.len())?;
      writeln!(f)?;
      for c in &self.table.conflicts {
        let kind = match c.kind {
          ConflictKind::ShiftReduce => "shift/reduce",
          ConflictKind::ReduceReduce => "reduce/reduce",
        };
        writeln!(
          f,
          "  state {}, lookahead {}: {} resolved as {}, dropped {}",
          c.state,
          c.lookahead,
          kind,
          action_text(c.resolved),
          action_text(c.dropped),
        )?;
      }
    }
    Ok(())
  }
}

fn action_text(action: Action) -> String {
  match action {
    Action::Shift(j) => format!("shift {}", j),
    Action::Reduce(p) => format!("reduce {}", p),
    Action::Accept => "accept".to_owned(),
  }
}
