//! Regular grammars and their conversion into recognizers.
//!
//! A grammar is either right-linear (`A → aB | a | B | ε`) or left-linear
//! (`A → Ba | a | B | ε`). Grammars are read and written in a line-oriented
//! text format:
//!
//! ```text
//! TYPE: RIGHT
//! NON-TERMINALS: S A
//! TERMINALS: a b
//! START: S
//! RULES:
//! S -> aA
//! S -> b
//! A -> aS
//! A ->
//! ```

use std::path::Path;

use itertools::Itertools;
use tracing::debug;

use crate::error::{FsmError, Result};
use crate::math::OrderedSet;
use crate::recognizer::{Recognizer, RecognizerTable};

/// Synthetic accepting state added when converting a right-linear grammar.
const FINAL_STATE: &str = "q_F";
/// Synthetic initial state added when converting a left-linear grammar.
const START_STATE: &str = "q_S";

/// Which side of a production the non-terminal may appear on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrammarKind {
    /// Rules of shape `A → aB`, `A → a`, `A → B`, `A → ε`.
    #[default]
    RightLinear,
    /// Rules of shape `A → Ba`, `A → a`, `A → B`, `A → ε`.
    LeftLinear,
}

/// A single production `A → [a][B]` (right-linear) or `A → [B][a]`
/// (left-linear). Both optional parts absent encodes `A → ε`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRule {
    /// The left-hand side non-terminal.
    pub lhs: String,
    /// The terminal of the right-hand side, if any.
    pub terminal: Option<String>,
    /// The non-terminal of the right-hand side, if any.
    pub non_terminal: Option<String>,
}

/// A regular grammar: rule shapes per [`GrammarKind`], plus the symbol sets
/// and the start symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegularGrammar {
    /// Linearity of the rules.
    pub kind: GrammarKind,
    /// The non-terminal symbols.
    pub non_terminals: OrderedSet<String>,
    /// The terminal symbols.
    pub terminals: OrderedSet<String>,
    /// The start symbol, a member of `non_terminals`.
    pub start: String,
    /// The production rules, in declaration order.
    pub rules: Vec<ProductionRule>,
}

impl RegularGrammar {
    /// Parses a grammar from its text format. Rule lines that match none of
    /// the expected shapes fail with [`FsmError::MalformedGrammarLine`].
    pub fn from_str(text: &str) -> Result<Self> {
        let mut grammar = Self::default();
        let mut lines = text.lines().enumerate();

        while let Some((index, line)) = lines.next() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(value) = line.strip_prefix("TYPE:") {
                grammar.kind = match value.trim() {
                    "LEFT" => GrammarKind::LeftLinear,
                    "RIGHT" => GrammarKind::RightLinear,
                    _ => {
                        return Err(FsmError::MalformedGrammarLine {
                            line_no: index + 1,
                            raw: line.to_string(),
                        })
                    }
                };
            } else if let Some(value) = line.strip_prefix("NON-TERMINALS:") {
                grammar
                    .non_terminals
                    .extend(value.split_whitespace().map(str::to_string));
            } else if let Some(value) = line.strip_prefix("TERMINALS:") {
                grammar
                    .terminals
                    .extend(value.split_whitespace().map(str::to_string));
            } else if let Some(value) = line.strip_prefix("START:") {
                grammar.start = value.trim().to_string();
            } else if line == "RULES:" {
                for (rule_index, rule_line) in lines.by_ref() {
                    let rule_line = rule_line.trim();
                    if rule_line.is_empty() {
                        continue;
                    }
                    grammar
                        .rules
                        .push(parse_rule(rule_line, grammar.kind, rule_index + 1)?);
                }
            } else {
                return Err(FsmError::MalformedGrammarLine {
                    line_no: index + 1,
                    raw: line.to_string(),
                });
            }
        }

        Ok(grammar)
    }

    /// Reads a grammar from a file in the text format.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| FsmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&text)
    }

    /// Renders the grammar in its text format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(match self.kind {
            GrammarKind::LeftLinear => "TYPE: LEFT\n",
            GrammarKind::RightLinear => "TYPE: RIGHT\n",
        });
        out.push_str(&format!(
            "NON-TERMINALS: {}\n",
            self.non_terminals.iter().join(" ")
        ));
        out.push_str(&format!("TERMINALS: {}\n", self.terminals.iter().join(" ")));
        out.push_str(&format!("START: {}\n", self.start));
        out.push_str("RULES:\n");

        for rule in &self.rules {
            let rhs = match self.kind {
                GrammarKind::RightLinear => [rule.terminal.as_deref(), rule.non_terminal.as_deref()],
                GrammarKind::LeftLinear => [rule.non_terminal.as_deref(), rule.terminal.as_deref()],
            }
            .into_iter()
            .flatten()
            .collect::<String>();

            if rhs.is_empty() {
                out.push_str(&format!("{} ->\n", rule.lhs));
            } else {
                out.push_str(&format!("{} -> {}\n", rule.lhs, rhs));
            }
        }
        out
    }

    /// Writes the grammar to a file in the text format.
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render()).map_err(|source| FsmError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds a (nondeterministic) recognizer accepting exactly the language
    /// the grammar generates.
    pub fn to_recognizer(&self) -> Recognizer {
        let machine = match self.kind {
            GrammarKind::RightLinear => self.convert_right_linear(),
            GrammarKind::LeftLinear => self.convert_left_linear(),
        };
        debug!(
            rules = self.rules.len(),
            states = machine.table().states.len(),
            "converted grammar to recognizer"
        );
        machine
    }

    /// Right-linear conversion: non-terminals become states, a synthetic
    /// accepting state collects rules without a successor non-terminal.
    fn convert_right_linear(&self) -> Recognizer {
        let mut nfa = RecognizerTable {
            states: self.non_terminals.iter().cloned().collect(),
            initial: self.start.clone(),
            current: self.start.clone(),
            finals: OrderedSet::from([FINAL_STATE.to_string()]),
            ..RecognizerTable::default()
        };
        nfa.states.insert(FINAL_STATE.to_string());

        for rule in &self.rules {
            let lhs = rule.lhs.clone();
            match (&rule.terminal, &rule.non_terminal) {
                // A → aB
                (Some(a), Some(b)) => {
                    nfa.insert_transition(lhs, Some(a.clone()), b.clone());
                }
                // A → a
                (Some(a), None) => {
                    nfa.insert_transition(lhs, Some(a.clone()), FINAL_STATE.to_string());
                }
                // A → B
                (None, Some(b)) => {
                    nfa.insert_transition(lhs, None, b.clone());
                }
                // A → ε
                (None, None) => {
                    if lhs == self.start {
                        nfa.finals.insert(lhs);
                    } else {
                        nfa.insert_transition(lhs, None, FINAL_STATE.to_string());
                    }
                }
            }
        }

        Recognizer::new(nfa)
    }

    /// Left-linear conversion: the reverse mapping, with a synthetic initial
    /// state and the grammar's start symbol as the sole accepting state.
    fn convert_left_linear(&self) -> Recognizer {
        let mut nfa = RecognizerTable {
            states: self.non_terminals.iter().cloned().collect(),
            initial: START_STATE.to_string(),
            current: START_STATE.to_string(),
            finals: OrderedSet::from([self.start.clone()]),
            ..RecognizerTable::default()
        };
        nfa.states.insert(START_STATE.to_string());

        for rule in &self.rules {
            let lhs = rule.lhs.clone();
            match (&rule.terminal, &rule.non_terminal) {
                // A → Ba
                (Some(a), Some(b)) => {
                    nfa.insert_transition(b.clone(), Some(a.clone()), lhs);
                }
                // A → a
                (Some(a), None) => {
                    nfa.insert_transition(START_STATE.to_string(), Some(a.clone()), lhs);
                }
                // A → B
                (None, Some(b)) => {
                    nfa.insert_transition(b.clone(), None, lhs);
                }
                // A → ε
                (None, None) => {
                    if lhs == self.start {
                        nfa.finals.insert(START_STATE.to_string());
                    } else {
                        nfa.insert_transition(START_STATE.to_string(), None, lhs);
                    }
                }
            }
        }

        Recognizer::new(nfa)
    }
}

/// Parses one `A -> rhs` line. The rhs is empty (ε), a single lowercase
/// terminal, a single uppercase non-terminal, or a terminal/non-terminal
/// pair in the order dictated by the grammar kind.
fn parse_rule(line: &str, kind: GrammarKind, line_no: usize) -> Result<ProductionRule> {
    let malformed = || FsmError::MalformedGrammarLine {
        line_no,
        raw: line.to_string(),
    };

    let (lhs, rhs) = line.split_once("->").ok_or_else(malformed)?;
    let (lhs, rhs) = (lhs.trim(), rhs.trim());
    if lhs.is_empty() || lhs.split_whitespace().count() != 1 {
        return Err(malformed());
    }

    let mut rule = ProductionRule {
        lhs: lhs.to_string(),
        terminal: None,
        non_terminal: None,
    };

    let mut chars = rhs.chars();
    match (chars.next(), chars.next(), chars.next()) {
        // A → ε
        (None, ..) => {}
        (Some(single), None, _) => {
            if single.is_uppercase() {
                rule.non_terminal = Some(single.to_string());
            } else {
                rule.terminal = Some(single.to_string());
            }
        }
        (Some(first), Some(second), None) => match kind {
            GrammarKind::RightLinear => {
                if !second.is_uppercase() {
                    return Err(malformed());
                }
                rule.terminal = Some(first.to_string());
                rule.non_terminal = Some(second.to_string());
            }
            GrammarKind::LeftLinear => {
                if !first.is_uppercase() {
                    return Err(malformed());
                }
                rule.non_terminal = Some(first.to_string());
                rule.terminal = Some(second.to_string());
            }
        },
        _ => return Err(malformed()),
    }

    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minimization::minimize;
    use crate::recognizer::determinize;

    const SAMPLE: &str = "TYPE: RIGHT\n\
                          NON-TERMINALS: S A\n\
                          TERMINALS: a b\n\
                          START: S\n\
                          RULES:\n\
                          S -> aA\n\
                          S -> b\n\
                          A -> aS\n\
                          A ->\n";

    #[test]
    fn parses_the_text_format() {
        let grammar = RegularGrammar::from_str(SAMPLE).unwrap();
        assert_eq!(grammar.kind, GrammarKind::RightLinear);
        assert_eq!(grammar.start, "S");
        assert_eq!(grammar.rules.len(), 4);
        assert_eq!(grammar.rules[0].terminal.as_deref(), Some("a"));
        assert_eq!(grammar.rules[0].non_terminal.as_deref(), Some("A"));
        assert_eq!(grammar.rules[3].terminal, None);
        assert_eq!(grammar.rules[3].non_terminal, None);
    }

    #[test]
    fn render_round_trips() {
        let grammar = RegularGrammar::from_str(SAMPLE).unwrap();
        let again = RegularGrammar::from_str(&grammar.render()).unwrap();
        assert_eq!(grammar, again);
    }

    #[test]
    fn bad_rule_lines_are_rejected() {
        let text = format!("{SAMPLE}S = aA\n");
        let error = RegularGrammar::from_str(&text).unwrap_err();
        assert!(matches!(
            error,
            FsmError::MalformedGrammarLine { line_no: 10, .. }
        ));
    }

    #[test]
    fn right_linear_grammar_recognizes_its_language() {
        // S → aA | b, A → aS | ε generates (aa)*(a | b)
        let grammar = RegularGrammar::from_str(SAMPLE).unwrap();
        let nfa = grammar.to_recognizer();
        assert!(!nfa.is_deterministic());

        let mut dfa = minimize(&determinize(&nfa));
        for (word, expected) in [
            (vec!["b"], true),
            (vec!["a"], true),
            (vec!["a", "a", "b"], true),
            (vec!["a", "a", "a"], true),
            (vec!["a", "a"], false),
            (vec!["a", "b"], false),
            (vec![], false),
        ] {
            assert_eq!(dfa.recognize(word.clone()), expected, "word {word:?}");
        }
    }

    #[test]
    fn epsilon_rule_on_the_start_symbol_accepts_the_empty_word() {
        let text = "TYPE: RIGHT\n\
                    NON-TERMINALS: S\n\
                    TERMINALS: a\n\
                    START: S\n\
                    RULES:\n\
                    S -> aS\n\
                    S ->\n";
        let grammar = RegularGrammar::from_str(text).unwrap();
        let mut dfa = determinize(&grammar.to_recognizer());

        assert!(dfa.recognize(Vec::<&str>::new()));
        assert!(dfa.recognize(["a", "a", "a"]));
    }

    #[test]
    fn left_linear_grammar_reverses_the_mapping() {
        // A → Sa, S → b: language is exactly `ba`
        let text = "TYPE: LEFT\n\
                    NON-TERMINALS: A S\n\
                    TERMINALS: a b\n\
                    START: A\n\
                    RULES:\n\
                    A -> Sa\n\
                    S -> b\n";
        let grammar = RegularGrammar::from_str(text).unwrap();
        let mut dfa = determinize(&grammar.to_recognizer());

        assert!(dfa.recognize(["b", "a"]));
        assert!(!dfa.recognize(["a", "b"]));
        assert!(!dfa.recognize(["b"]));
    }
}
