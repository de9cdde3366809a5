//! Minimization by partition refinement, shared across all machine flavors.
//!
//! The engine is generic over a [`MinimizationOracle`], which answers the few
//! structural questions the refinement loop needs: which states and inputs
//! exist, where a transition leads, whether two states are indistinguishable
//! by their immediate outputs, and how to rebuild a machine from the final
//! partition. Each flavor implements the oracle next to its table type.

use tracing::{debug, trace};

use crate::machine::StateId;
use crate::math::{OrderedMap, OrderedSet, Partition};

/// The structural queries the partition-refinement engine poses to a machine.
pub trait MinimizationOracle: Sized {
    /// The input symbols the refinement iterates over.
    type Input: Clone + Ord;

    /// All state ids, in a total order (the refinement's block layout, and
    /// therefore the canonical naming, depends on it).
    fn state_ids(&self) -> Vec<StateId>;

    /// All input symbols, in a total order.
    fn inputs(&self) -> Vec<Self::Input>;

    /// Where the transition from `id` on `input` leads, or `None` if the
    /// machine has no such transition. Missing transitions are treated as
    /// leading into a distinguished sink.
    fn successor(&self, id: &StateId, input: &Self::Input) -> Option<StateId>;

    /// The initial-partition predicate: whether two states are
    /// indistinguishable without taking any transition. For a Moore machine
    /// this compares state outputs, for a Mealy machine the outputs of every
    /// input, for a recognizer the accepting bits.
    fn zero_equivalent(&self, left: &StateId, right: &StateId) -> bool;

    /// Rebuilds a machine from the final partition. Block `i` becomes state
    /// `"si"`; each block's transitions are read off its minimum id.
    fn from_partition(&self, partition: &Partition<StateId>) -> Self;
}

/// Returns a new machine with the minimum number of states that is
/// behaviorally equivalent to `machine`. The input is never mutated.
///
/// States are first bucketed by
/// [`zero_equivalent`](MinimizationOracle::zero_equivalent), then blocks are
/// split by the signature of their members (the vector of block indices the
/// members' transitions lead into, one entry per input) until no block grows.
/// Undefined transitions map to a sink index past all real blocks, so states
/// with different transition domains end up separated.
pub fn minimize<M: MinimizationOracle>(machine: &M) -> M {
    let state_ids = machine.state_ids();
    let inputs = machine.inputs();

    let mut partition: Vec<OrderedSet<StateId>> = Vec::new();
    for id in &state_ids {
        let placed = partition.iter_mut().find(|block| {
            machine.zero_equivalent(id, block.first().expect("blocks are never empty"))
        });
        match placed {
            Some(block) => {
                block.insert(id.clone());
            }
            None => partition.push(OrderedSet::from([id.clone()])),
        }
    }
    debug!(
        blocks = partition.len(),
        states = state_ids.len(),
        "computed initial partition"
    );

    loop {
        let mut block_index = OrderedMap::new();
        for (index, block) in partition.iter().enumerate() {
            for id in block {
                block_index.insert(id.clone(), index);
            }
        }

        // Signature entry for a state whose transition on some input is
        // undefined; one index past all real blocks.
        let sink_index = partition.len();

        let mut refined: Vec<OrderedSet<StateId>> = Vec::new();
        for block in &partition {
            let mut groups: OrderedMap<Vec<usize>, OrderedSet<StateId>> = OrderedMap::new();

            for id in block {
                let signature = inputs
                    .iter()
                    .map(|input| match machine.successor(id, input) {
                        Some(next) => block_index[&next],
                        None => sink_index,
                    })
                    .collect::<Vec<_>>();
                groups.entry(signature).or_default().insert(id.clone());
            }

            refined.extend(groups.into_values());
        }

        if refined.len() > partition.len() {
            trace!(from = partition.len(), to = refined.len(), "split blocks");
            partition = refined;
        } else {
            break;
        }
    }

    debug!(blocks = partition.len(), "partition refinement reached fixpoint");
    machine.from_partition(&Partition::from(partition))
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    /// The six-state DFA from the Wikipedia article on DFA minimization; its
    /// minimal quotient has three states (accepting, non-accepting live,
    /// sink).
    fn wiki_dfa() -> Recognizer {
        Recognizer::new(
            RecognizerTable::new("a")
                .with_transition("a", "0", "b")
                .with_transition("a", "1", "c")
                .with_transition("b", "0", "a")
                .with_transition("b", "1", "d")
                .with_transition("c", "0", "e")
                .with_transition("c", "1", "f")
                .with_transition("d", "0", "e")
                .with_transition("d", "1", "f")
                .with_transition("e", "0", "e")
                .with_transition("e", "1", "f")
                .with_transition("f", "0", "f")
                .with_transition("f", "1", "f")
                .with_finals(["c", "d", "e"])
                .deterministic(),
        )
    }

    #[test_log::test]
    fn quotient_has_three_blocks() {
        let minimal = minimize(&wiki_dfa());
        assert_eq!(minimal.table().states.len(), 3);
        assert_eq!(minimal.table().initial, "s1");
    }

    #[test]
    fn minimization_preserves_the_language() {
        let mut dfa = wiki_dfa();
        let mut minimal = minimize(&dfa);

        for word in [
            vec![],
            vec!["0"],
            vec!["1"],
            vec!["0", "1"],
            vec!["1", "0"],
            vec!["1", "1"],
            vec!["0", "1", "0"],
            vec!["1", "0", "0"],
            vec!["1", "1", "1"],
        ] {
            assert_eq!(
                dfa.recognize(word.clone()),
                minimal.recognize(word.clone()),
                "word {word:?}"
            );
        }
    }

    #[test]
    fn minimization_is_idempotent() {
        let once = minimize(&wiki_dfa());
        let twice = minimize(&once);
        assert_eq!(once.table(), twice.table());
    }
}
