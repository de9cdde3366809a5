#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this crate easier. Importing
/// everything, i.e. `use fsmkit::prelude::*;`, should be enough for most
/// purposes.
pub mod prelude {
    pub use super::convert::{mealy_to_moore, moore_to_mealy, INITIAL_OUTPUT};
    pub use super::dot::{
        mealy_from_dot, mealy_from_path, mealy_to_dot, moore_from_dot, moore_from_path,
        moore_to_dot, recognizer_from_dot, recognizer_from_path, recognizer_to_dot,
        write_dot_to_path,
    };
    pub use super::grammar::{GrammarKind, ProductionRule, RegularGrammar};
    pub use super::lexer::{Lexer, Rule, Token};
    pub use super::machine::{
        MealyMachine, MealyTable, MooreMachine, MooreTable, Output, StateId, StateMachine, Symbol,
    };
    pub use super::math;
    pub use super::minimization::{minimize, MinimizationOracle};
    pub use super::recognizer::{determinize, Recognizer, RecognizerTable};
    pub use super::regex::{Regex, RegexAst};
    pub use super::FsmError;
}

/// Small mathematical helpers (ordered container aliases, partitions).
pub mod math;

/// The crate-wide error taxonomy.
pub mod error;
pub use error::{FsmError, Result};

/// The execution core and the Mealy/Moore machine flavors.
pub mod machine;

/// Partition-refinement minimization, generic over an equivalence oracle.
pub mod minimization;

/// Recognizers (acceptors) and the subset construction.
pub mod recognizer;

/// Mealy↔Moore conversions.
pub mod convert;

/// Regular grammars and their compilation to recognizers.
pub mod grammar;

/// The regular-expression compiler.
pub mod regex;

/// The recognizer-driven longest-match lexer.
pub mod lexer;

/// GraphViz import/export.
pub mod dot;
