//! Subset construction: determinizing a recognizer by tracking sets of NFA
//! states through ε-closure and move.

use std::collections::VecDeque;

use itertools::Itertools;
use tracing::debug;

use crate::machine::{StateId, Symbol};
use crate::math::{self, OrderedSet};
use crate::recognizer::{Recognizer, RecognizerTable};

/// All states reachable from `states` through any number of ε-transitions,
/// including `states` itself. Computed as a least fixed point over a
/// worklist, so ε-cycles terminate.
pub fn epsilon_closure(states: &OrderedSet<StateId>, table: &RecognizerTable) -> OrderedSet<StateId> {
    let mut closure = states.clone();
    let mut pending: Vec<StateId> = states.iter().cloned().collect();

    while let Some(id) = pending.pop() {
        if let Some(targets) = table.transitions.get(&(id, None)) {
            for target in targets {
                if closure.insert(target.clone()) {
                    pending.push(target.clone());
                }
            }
        }
    }
    closure
}

/// The union of all successors of `states` on the non-ε symbol `input`.
pub fn move_set(
    states: &OrderedSet<StateId>,
    input: &Symbol,
    table: &RecognizerTable,
) -> OrderedSet<StateId> {
    let mut result = OrderedSet::new();
    for id in states {
        if let Some(targets) = table.transitions.get(&(id.clone(), Some(input.clone()))) {
            result.extend(targets.iter().cloned());
        }
    }
    result
}

/// Canonical name of a DFA state: `"s_"` followed by the member NFA ids in
/// sorted order.
fn set_name(states: &OrderedSet<StateId>) -> StateId {
    format!("s_{}", states.iter().join(""))
}

/// Returns a deterministic recognizer accepting the same language as
/// `recognizer`. An input that is already marked deterministic is returned
/// as an unchanged copy.
pub fn determinize(recognizer: &Recognizer) -> Recognizer {
    if recognizer.is_deterministic() {
        return recognizer.clone();
    }

    let nfa = recognizer.table();
    let alphabet = nfa.alphabet();

    let mut result = RecognizerTable {
        deterministic: true,
        ..RecognizerTable::default()
    };

    // Keyed by NFA state set; insertion order is discovery order.
    let mut names: math::Map<OrderedSet<StateId>, StateId> = math::Map::new();
    let mut worklist = VecDeque::new();

    let start = epsilon_closure(&OrderedSet::from([nfa.initial.clone()]), nfa);
    result.initial = set_name(&start);
    result.current = result.initial.clone();
    result.states.insert(result.initial.clone());
    names.insert(start.clone(), result.initial.clone());
    worklist.push_back(start);

    while let Some(current_set) = worklist.pop_front() {
        let current_name = names[&current_set].clone();

        if current_set.iter().any(|id| nfa.finals.contains(id)) {
            result.finals.insert(current_name.clone());
        }

        for input in &alphabet {
            let next_set = epsilon_closure(&move_set(&current_set, input, nfa), nfa);
            if next_set.is_empty() {
                continue;
            }

            let next_name = match names.get(&next_set) {
                Some(name) => name.clone(),
                None => {
                    let name = set_name(&next_set);
                    names.insert(next_set.clone(), name.clone());
                    result.states.insert(name.clone());
                    worklist.push_back(next_set);
                    name
                }
            };

            result.insert_transition(current_name.clone(), Some(input.clone()), next_name);
        }
    }

    debug!(
        nfa_states = nfa.states.len(),
        dfa_states = result.states.len(),
        "subset construction finished"
    );
    Recognizer::new(result)
}
