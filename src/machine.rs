//! The uniform execution model shared by all machine flavors.
//!
//! A machine processes one input at a time: it *translates* the input by
//! looking up the appropriate transition, derives an output from the
//! translation result, and only then advances its `current` state. The three
//! steps are split so that each flavor only supplies the lookups while the
//! driving loop lives in one place.

pub mod mealy;
pub mod moore;

pub use mealy::{MealyMachine, MealyTable};
pub use moore::{MooreMachine, MooreTable};

use crate::error::Result;

/// Identifier of a single state. States are referenced by name everywhere;
/// transition graphs are cyclic, so owning flat tables keyed by id avoids any
/// need for interior pointers.
pub type StateId = String;
/// An input symbol.
pub type Symbol = String;
/// An output value.
pub type Output = String;

/// The capability a machine flavor must provide to be executable.
///
/// Implementors supply [`translate`](StateMachine::translate) (find the
/// transition for an input in the current state),
/// [`output_from`](StateMachine::output_from) (derive the emitted output from
/// a translation result) and [`advance`](StateMachine::advance) (commit the
/// translation result to `current`). The trait then drives the actual
/// execution through [`handle_input`](StateMachine::handle_input) and
/// [`handle_word`](StateMachine::handle_word).
///
/// Executing a machine mutates nothing but its `current` field.
pub trait StateMachine {
    /// What a single processed input produces.
    type Output;
    /// The result of looking up a transition, before it is committed.
    type Translation;

    /// Looks up the transition for `input` in the current state. Fails with
    /// [`FsmError::UndefinedTransition`](crate::FsmError::UndefinedTransition)
    /// if the machine has no transition for the pair.
    fn translate(&self, input: &str) -> Result<Self::Translation>;

    /// Derives the output from a translation result, without committing it.
    fn output_from(&self, translation: &Self::Translation) -> Result<Self::Output>;

    /// Commits a translation result, updating the machine's `current` state.
    fn advance(&mut self, translation: Self::Translation);

    /// Processes a single input: translate, derive the output, advance.
    /// The state is only advanced if both lookups succeed.
    fn handle_input(&mut self, input: &str) -> Result<Self::Output> {
        let translation = self.translate(input)?;
        let output = self.output_from(&translation)?;
        self.advance(translation);
        Ok(output)
    }

    /// Feeds every element of `inputs` in order and collects the outputs.
    /// Processing stops at the first failing input.
    fn handle_word<I>(&mut self, inputs: I) -> Result<Vec<Self::Output>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        inputs
            .into_iter()
            .map(|input| self.handle_input(input.as_ref()))
            .collect()
    }
}
