//! Thompson construction: folds a [`RegexAst`] into an ε-NFA table, one
//! fragment per sub-expression with a single initial and a single accepting
//! state.

use crate::machine::StateId;
use crate::recognizer::RecognizerTable;
use crate::regex::RegexAst;

/// Allocates fragment states `"q0", "q1", …` from a counter scoped to one
/// compilation and assembles the fragments bottom-up.
#[derive(Debug, Default)]
pub(crate) struct ThompsonBuilder {
    counter: usize,
}

/// Copies every state and transition of `fragment` into `table`.
fn absorb(table: &mut RecognizerTable, fragment: RecognizerTable) {
    table.states.extend(fragment.states);
    for (key, targets) in fragment.transitions {
        table.transitions.entry(key).or_default().extend(targets);
    }
}

impl ThompsonBuilder {
    /// Builds the ε-NFA for `ast`. The resulting table is marked
    /// nondeterministic and positioned in its initial state.
    pub(crate) fn build(&mut self, ast: &RegexAst) -> RecognizerTable {
        let mut table = self.fragment(ast);
        table.current = table.initial.clone();
        table
    }

    fn fresh(&mut self) -> StateId {
        let name = format!("q{}", self.counter);
        self.counter += 1;
        name
    }

    fn fragment(&mut self, ast: &RegexAst) -> RecognizerTable {
        match ast {
            RegexAst::Symbol(term) => self.symbol(*term),
            RegexAst::Alt(lhs, rhs) => {
                let lhs = self.fragment(lhs);
                let rhs = self.fragment(rhs);
                self.alternate(lhs, rhs)
            }
            RegexAst::Concat(lhs, rhs) => {
                let lhs = self.fragment(lhs);
                let rhs = self.fragment(rhs);
                concatenate(lhs, rhs)
            }
            RegexAst::Star(child) => {
                let child = self.fragment(child);
                self.kleene_star(child)
            }
            RegexAst::Plus(child) => {
                let child = self.fragment(child);
                self.kleene_plus(child)
            }
        }
    }

    /// `start —term→ final`, where a `None` term is an ε-edge.
    fn symbol(&mut self, term: Option<char>) -> RecognizerTable {
        let start = self.fresh();
        let accept = self.fresh();

        let mut nfa = RecognizerTable::new(start.clone()).with_final(accept.clone());
        nfa.insert_transition(start, term.map(|ch| ch.to_string()), accept);
        nfa
    }

    fn alternate(&mut self, a: RecognizerTable, b: RecognizerTable) -> RecognizerTable {
        let start = self.fresh();
        let accept = self.fresh();

        let mut nfa = RecognizerTable::new(start.clone()).with_final(accept.clone());
        nfa.insert_transition(start.clone(), None, a.initial.clone());
        nfa.insert_transition(start, None, b.initial.clone());
        for halfway_accept in a.finals.iter().chain(b.finals.iter()) {
            nfa.insert_transition(halfway_accept.clone(), None, accept.clone());
        }

        absorb(&mut nfa, a);
        absorb(&mut nfa, b);
        nfa
    }

    fn kleene_star(&mut self, a: RecognizerTable) -> RecognizerTable {
        let start = self.fresh();
        let accept = self.fresh();

        let mut nfa = RecognizerTable::new(start.clone()).with_final(accept.clone());
        nfa.insert_transition(start.clone(), None, a.initial.clone());
        nfa.insert_transition(start, None, accept.clone());
        for child_accept in &a.finals {
            nfa.insert_transition(child_accept.clone(), None, a.initial.clone());
            nfa.insert_transition(child_accept.clone(), None, accept.clone());
        }

        absorb(&mut nfa, a);
        nfa
    }

    fn kleene_plus(&mut self, a: RecognizerTable) -> RecognizerTable {
        let start = self.fresh();
        let accept = self.fresh();

        // identical to star except that the start state has no shortcut edge
        // to the accepting state, forcing at least one pass
        let mut nfa = RecognizerTable::new(start.clone()).with_final(accept.clone());
        nfa.insert_transition(start, None, a.initial.clone());
        for child_accept in &a.finals {
            nfa.insert_transition(child_accept.clone(), None, a.initial.clone());
            nfa.insert_transition(child_accept.clone(), None, accept.clone());
        }

        absorb(&mut nfa, a);
        nfa
    }
}

/// Concatenation allocates no fresh states: the left fragment's accepting
/// state is ε-wired into the right fragment's initial one.
fn concatenate(a: RecognizerTable, b: RecognizerTable) -> RecognizerTable {
    let mut nfa = RecognizerTable {
        initial: a.initial.clone(),
        current: a.initial.clone(),
        finals: b.finals.clone(),
        ..RecognizerTable::default()
    };
    for left_accept in &a.finals {
        nfa.insert_transition(left_accept.clone(), None, b.initial.clone());
    }

    absorb(&mut nfa, a);
    absorb(&mut nfa, b);
    nfa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::parser;

    fn build(pattern: &str) -> RecognizerTable {
        ThompsonBuilder::default().build(&parser::parse(pattern).unwrap())
    }

    #[test]
    fn fragments_have_one_initial_and_one_accepting_state() {
        for pattern in ["a", "ab", "a|b", "a*", "a+", "(a|b)*c"] {
            let table = build(pattern);
            assert_eq!(table.finals.len(), 1, "pattern {pattern}");
            assert_eq!(table.current, table.initial, "pattern {pattern}");
            assert!(!table.deterministic);
        }
    }

    #[test]
    fn state_names_restart_per_compilation() {
        let first = build("ab");
        let second = build("ab");
        assert_eq!(first, second);
        assert!(first.states.contains("q0"));
    }

    #[test]
    fn single_symbol_is_two_states_and_one_edge() {
        let table = build("a");
        assert_eq!(table.states.len(), 2);
        assert_eq!(table.transitions.len(), 1);
        let ((from, on), targets) = table.transitions.iter().next().unwrap();
        assert_eq!(from, &table.initial);
        assert_eq!(on.as_deref(), Some("a"));
        assert!(targets.iter().all(|target| table.finals.contains(target)));
    }
}
