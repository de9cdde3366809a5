//! The regex compiler: a purely regular dialect (literals, escapes,
//! grouping, `|`, `*`, `+`) compiled to ε-NFA recognizers via Thompson
//! construction.
//!
//! The pipeline is tokenize → implicit-concatenation insertion →
//! shunting-yard → AST → Thompson fragments. Parsing and building happen
//! once, in [`Regex::new`]; [`Regex::compile`] hands out owned recognizers
//! copied from the cached table.

mod parser;
mod thompson;

use tracing::trace;

use crate::error::Result;
use crate::recognizer::{Recognizer, RecognizerTable};

use thompson::ThompsonBuilder;

/// The abstract syntax of the dialect. `Symbol(None)` denotes ε, which has
/// no concrete syntax of its own; it only arises from the empty pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexAst {
    /// A single symbol, or ε when `None`.
    Symbol(Option<char>),
    /// Alternation `l|r`.
    Alt(Box<RegexAst>, Box<RegexAst>),
    /// Juxtaposition `lr`.
    Concat(Box<RegexAst>, Box<RegexAst>),
    /// Kleene star `c*`.
    Star(Box<RegexAst>),
    /// Kleene plus `c+`.
    Plus(Box<RegexAst>),
}

/// A compiled regular expression, holding its AST and the ε-NFA table built
/// from it.
#[derive(Debug, Clone)]
pub struct Regex {
    pattern: String,
    ast: RegexAst,
    table: RecognizerTable,
}

impl Regex {
    /// Parses `pattern` and builds its ε-NFA. Fails with
    /// [`FsmError::MalformedRegex`](crate::FsmError::MalformedRegex) on a
    /// trailing backslash, unmatched parentheses or a missing operand.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let ast = parser::parse(&pattern)?;
        let table = ThompsonBuilder::default().build(&ast);
        trace!(
            pattern = %pattern,
            states = table.states.len(),
            "compiled regex to epsilon-nfa"
        );
        Ok(Self {
            pattern,
            ast,
            table,
        })
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The parsed syntax tree.
    pub fn ast(&self) -> &RegexAst {
        &self.ast
    }

    /// Returns an owned recognizer copied from the cached ε-NFA table. The
    /// result is nondeterministic; pass it through
    /// [`determinize`](crate::recognizer::determinize) before executing it
    /// directly.
    pub fn compile(&self) -> Recognizer {
        Recognizer::new(self.table.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minimization::minimize;
    use crate::recognizer::subset::{epsilon_closure, move_set};
    use crate::recognizer::determinize;
    use crate::math::OrderedSet;

    use proptest::prelude::*;

    /// NFA-level acceptance through closure and move, independent of the
    /// deterministic execution path.
    fn nfa_accepts(nfa: &Recognizer, word: &str) -> bool {
        let table = nfa.table();
        let mut current = epsilon_closure(
            &OrderedSet::from([table.initial.clone()]),
            table,
        );
        for ch in word.chars() {
            current = epsilon_closure(&move_set(&current, &ch.to_string(), table), table);
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|id| table.finals.contains(id))
    }

    fn symbols(word: &str) -> Vec<String> {
        word.chars().map(|ch| ch.to_string()).collect()
    }

    #[test_log::test]
    fn all_compilation_stages_agree() {
        let regex = Regex::new("(a*b)*|(b*a)*").unwrap();
        let nfa = regex.compile();
        let mut dfa = determinize(&nfa);
        let mut minimal = minimize(&dfa);

        for word in ["", "a", "b", "ab", "ba", "aab", "bba", "abab", "baba"] {
            assert!(nfa_accepts(&nfa, word), "nfa rejects {word:?}");
            assert!(dfa.recognize(symbols(word)), "dfa rejects {word:?}");
            assert!(minimal.recognize(symbols(word)), "min dfa rejects {word:?}");
        }
        for word in ["c", "abc"] {
            assert!(!nfa_accepts(&nfa, word), "nfa accepts {word:?}");
            assert!(!dfa.recognize(symbols(word)), "dfa accepts {word:?}");
            assert!(!minimal.recognize(symbols(word)), "min dfa accepts {word:?}");
        }
    }

    #[test]
    fn plus_requires_at_least_one_repetition() {
        let regex = Regex::new("a+").unwrap();
        let mut dfa = determinize(&regex.compile());

        assert!(!dfa.recognize(Vec::<&str>::new()));
        assert!(dfa.recognize(["a"]));
        assert!(dfa.recognize(["a", "a", "a", "a"]));
        assert!(!dfa.recognize(["b"]));
    }

    #[test]
    fn empty_pattern_accepts_exactly_the_empty_word() {
        let regex = Regex::new("").unwrap();
        let mut dfa = determinize(&regex.compile());

        assert!(dfa.recognize(Vec::<&str>::new()));
        assert!(!dfa.recognize(["a"]));
    }

    #[test]
    fn escaped_metacharacters_match_literally() {
        let regex = Regex::new(r"\(a\|b\)\*").unwrap();
        let mut dfa = determinize(&regex.compile());

        assert!(dfa.recognize(symbols("(a|b)*")));
        assert!(!dfa.recognize(symbols("ab")));
    }

    #[test]
    fn compile_returns_independent_copies() {
        let regex = Regex::new("ab").unwrap();
        let first = regex.compile();
        let second = regex.compile();
        assert_eq!(first.table(), second.table());
    }

    proptest! {
        /// Every stage of the pipeline accepts the same language.
        #[test]
        fn pipeline_stages_agree_on_fuzzed_words(word in "[abc]{0,8}") {
            let regex = Regex::new("(a*b)*|(b*a)*").unwrap();
            let nfa = regex.compile();
            let mut dfa = determinize(&nfa);
            let mut minimal = minimize(&dfa);

            let via_nfa = nfa_accepts(&nfa, &word);
            prop_assert_eq!(via_nfa, dfa.recognize(symbols(&word)));
            prop_assert_eq!(via_nfa, minimal.recognize(symbols(&word)));
        }
    }
}
