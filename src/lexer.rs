//! A longest-match lexer driven by compiled recognizers.
//!
//! Rules are declared in order; each one compiles its regex down to a
//! minimized DFA. Scanning simulates every rule's machine over the remaining
//! source through the side-effect-free [`Recognizer::step`], remembers the
//! longest prefix that ended in an accepting state, and emits the rule with
//! the longest match, breaking ties in favor of the earliest declaration.

use std::path::Path;

use tracing::{debug, trace};

use crate::error::{FsmError, Result};
use crate::minimization::minimize;
use crate::recognizer::{determinize, Recognizer};
use crate::regex::Regex;

/// One scanned token. The lexeme borrows from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src, K> {
    /// The kind tag of the rule that produced the token.
    pub kind: K,
    /// The matched slice of the source. Never empty.
    pub lexeme: &'src str,
    /// 1-based line of the first lexeme character.
    pub line: usize,
    /// 1-based column of the first lexeme character.
    pub column: usize,
    /// Byte offset of the lexeme within the source.
    pub offset: usize,
}

/// A single lexer rule: a token kind, the minimized DFA of its regex, the
/// skip flag and the declaration index used for tie-breaking.
#[derive(Debug, Clone)]
pub struct Rule<K> {
    /// Kind tag stamped onto produced tokens.
    pub kind: K,
    /// The minimized DFA recognizing the rule's language.
    pub machine: Recognizer,
    /// Whether matches are dropped instead of emitted.
    pub skip: bool,
    /// Declaration index; smaller wins ties.
    pub priority: usize,
}

#[derive(Debug, Clone, Copy)]
struct MatchResult {
    rule: usize,
    length: usize,
}

/// Tokenizes a borrowed source text against an ordered list of rules.
#[derive(Debug, Clone)]
pub struct Lexer<'src, K> {
    source: &'src str,
    rules: Vec<Rule<K>>,
    offset: usize,
    line: usize,
    column: usize,
    peeked: Option<Token<'src, K>>,
}

impl<'src, K: Clone> Lexer<'src, K> {
    /// Creates a lexer over `source` with no rules.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rules: Vec::new(),
            offset: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    /// The rules declared so far, in declaration order.
    pub fn rules(&self) -> &[Rule<K>] {
        &self.rules
    }

    /// Compiles `pattern` down to a minimized DFA and appends it as a rule.
    /// Invalidates any token held in the pushback buffer.
    pub fn add_rule(&mut self, pattern: &str, kind: K, skip: bool) -> Result<&mut Self> {
        let regex = Regex::new(pattern)?;
        let machine = minimize(&determinize(&regex.compile()));
        debug!(
            pattern = %pattern,
            dfa_states = machine.table().states.len(),
            skip,
            "added lexer rule"
        );

        self.rules.push(Rule {
            kind,
            machine,
            skip,
            priority: self.rules.len(),
        });
        self.peeked = None;
        Ok(self)
    }

    /// Chainable variant of [`Self::add_rule`].
    pub fn with_rule(mut self, pattern: &str, kind: K, skip: bool) -> Result<Self> {
        self.add_rule(pattern, kind, skip)?;
        Ok(self)
    }

    /// Parses rule declarations of the shape `[%skip] <NAME> <regex>`, one
    /// per line; `#`-comments and blank lines are ignored. `mapper`
    /// translates rule names into kind tags, `None` marking an unknown name.
    pub fn add_rules_from_str<F>(&mut self, text: &str, mut mapper: F) -> Result<&mut Self>
    where
        F: FnMut(&str) -> Option<K>,
    {
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut rest = line;
            let skip = match rest
                .strip_prefix("%skip")
                .filter(|stripped| stripped.starts_with(char::is_whitespace))
            {
                Some(stripped) => {
                    rest = stripped.trim_start();
                    true
                }
                None => false,
            };

            let Some((name, pattern)) = rest.split_once(char::is_whitespace) else {
                return Err(FsmError::MalformedRule {
                    line_no,
                    reason: "expected `<NAME> <regex>`".to_string(),
                });
            };
            let pattern = pattern.trim();

            let Some(kind) = mapper(name) else {
                return Err(FsmError::MalformedRule {
                    line_no,
                    reason: format!("unknown rule name `{name}`"),
                });
            };
            self.add_rule(pattern, kind, skip)?;
        }
        Ok(self)
    }

    /// Reads rule declarations from a file, see [`Self::add_rules_from_str`].
    pub fn add_rules_from_path<F>(&mut self, path: impl AsRef<Path>, mapper: F) -> Result<&mut Self>
    where
        F: FnMut(&str) -> Option<K>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| FsmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_rules_from_str(&text, mapper)
    }

    /// Swaps in a new source text, resetting cursor and pushback buffer.
    /// With `clear_rules` the rule list is dropped as well.
    pub fn change_source(&mut self, source: &'src str, clear_rules: bool) -> &mut Self {
        self.source = source;
        self.offset = 0;
        self.line = 1;
        self.column = 1;
        self.peeked = None;
        if clear_rules {
            self.rules.clear();
        }
        self
    }

    /// Scans one token ahead without consuming it. Two successive calls
    /// return the same token.
    pub fn peek(&mut self) -> Result<Option<Token<'src, K>>> {
        if self.peeked.is_none() {
            self.peeked = self.scan_token()?;
        }
        Ok(self.peeked.clone())
    }

    /// Returns the next token, taking it from the pushback buffer if
    /// [`Self::peek`] filled it. `None` signals the end of the source.
    pub fn next_token(&mut self) -> Result<Option<Token<'src, K>>> {
        if let Some(token) = self.peeked.take() {
            return Ok(Some(token));
        }
        self.scan_token()
    }

    /// Drains the remaining source into a token list.
    pub fn tokenize(&mut self) -> Result<Vec<Token<'src, K>>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn scan_token(&mut self) -> Result<Option<Token<'src, K>>> {
        while self.offset < self.source.len() {
            let Some(matched) = self.find_longest_match() else {
                return Err(FsmError::UnexpectedCharacter {
                    line: self.line,
                    column: self.column,
                });
            };

            let (line, column, offset) = (self.line, self.column, self.offset);
            let lexeme = &self.source[offset..offset + matched.length];
            self.advance(matched.length);

            let rule = &self.rules[matched.rule];
            if rule.skip {
                trace!(lexeme, "skipped");
                continue;
            }

            return Ok(Some(Token {
                kind: rule.kind.clone(),
                lexeme,
                line,
                column,
                offset,
            }));
        }
        Ok(None)
    }

    /// Simulates every rule over the remaining source and picks the rule
    /// with the longest accepted prefix, earliest declaration first. A rule
    /// whose machine admits the empty word still never matches zero
    /// characters, as that could not make progress.
    fn find_longest_match(&self) -> Option<MatchResult> {
        let remaining = &self.source[self.offset..];
        let mut best: Option<MatchResult> = None;

        for rule in &self.rules {
            let mut state = &rule.machine.table().initial;
            let mut length = 0;
            let mut accepted = 0;

            for ch in remaining.chars() {
                // a dead end freezes the rule's accepted length
                let Some(next) = rule.machine.step(state, &ch.to_string()) else {
                    break;
                };
                state = next;
                length += ch.len_utf8();
                if rule.machine.is_final(state) {
                    accepted = length;
                }
            }

            if accepted > best.map_or(0, |b| b.length) {
                best = Some(MatchResult {
                    rule: rule.priority,
                    length: accepted,
                });
            }
        }
        best
    }

    fn advance(&mut self, length: usize) {
        for ch in self.source[self.offset..self.offset + length].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn one_of(chars: impl Iterator<Item = char>) -> String {
        format!("({})", chars.map(|ch| ch.to_string()).join("|"))
    }

    fn word_lexer(source: &str) -> Lexer<'_, &'static str> {
        let digit = one_of('0'..='9');
        let letter = one_of(('a'..='z').chain('A'..='Z'));
        let alnum = one_of(('a'..='z').chain('A'..='Z').chain('0'..='9'));

        let mut lexer = Lexer::new(source);
        lexer
            .add_rule(&format!("{digit}+"), "NUM", false)
            .unwrap()
            .add_rule(&format!("{letter}{alnum}*"), "ID", false)
            .unwrap()
            .add_rule(" +", "SPACE", true)
            .unwrap();
        lexer
    }

    #[test_log::test]
    fn longest_match_with_positions() {
        let mut lexer = word_lexer(" foo 12 foo12");
        let tokens = lexer.tokenize().unwrap();

        let summary = tokens
            .iter()
            .map(|t| (t.kind, t.lexeme, t.line, t.column, t.offset))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("ID", "foo", 1, 2, 1),
                ("NUM", "12", 1, 6, 5),
                ("ID", "foo12", 1, 9, 8),
            ]
        );
    }

    #[test]
    fn empty_source_yields_no_tokens() {
        let mut lexer = word_lexer("");
        assert!(lexer.tokenize().unwrap().is_empty());
    }

    #[test]
    fn peek_is_idempotent_and_next_consumes() {
        let mut lexer = word_lexer("foo 12");

        let first = lexer.peek().unwrap().unwrap();
        let second = lexer.peek().unwrap().unwrap();
        assert_eq!(first, second);

        let consumed = lexer.next_token().unwrap().unwrap();
        assert_eq!(consumed, first);
        assert_eq!(lexer.next_token().unwrap().unwrap().lexeme, "12");
        assert!(lexer.next_token().unwrap().is_none());
    }

    #[test]
    fn declaration_order_breaks_ties() {
        let letter = one_of('a'..='z');
        let mut lexer = Lexer::new("if iffy");
        lexer
            .add_rule("if", "KW_IF", false)
            .unwrap()
            .add_rule(&format!("{letter}+"), "ID", false)
            .unwrap()
            .add_rule(" +", "SPACE", true)
            .unwrap();

        let kinds = lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.lexeme))
            .collect::<Vec<_>>();
        // equal length on "if" goes to the keyword; "iffy" is longer, so the
        // identifier rule wins there
        assert_eq!(kinds, vec![("KW_IF", "if"), ("ID", "iffy")]);
    }

    #[test]
    fn unexpected_characters_carry_coordinates() {
        let mut lexer = word_lexer("foo\nbar ?");
        let error = lexer.tokenize().unwrap_err();
        assert!(matches!(
            error,
            FsmError::UnexpectedCharacter { line: 2, column: 5 }
        ));
    }

    #[test]
    fn newlines_advance_the_line_counter() {
        let mut lexer = word_lexer("foo\nbar");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!((tokens[1].line, tokens[1].column), (2, 1));
    }

    #[test]
    fn change_source_resets_the_cursor() {
        let mut lexer = word_lexer("foo");
        let _ = lexer.tokenize().unwrap();

        lexer.change_source("bar", false);
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].lexeme, "bar");
    }

    #[test]
    fn rules_files_support_skip_and_comments() {
        let digit = one_of('0'..='9');
        let rules = format!(
            "# numbers and whitespace\n\
             NUM {digit}+\n\
             \n\
             %skip SPACE \\ +\n"
        );

        let mut lexer = Lexer::new("1 22 333");
        lexer
            .add_rules_from_str(&rules, |name| match name {
                "NUM" => Some("NUM"),
                "SPACE" => Some("SPACE"),
                _ => None,
            })
            .unwrap();

        let lexemes = lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.lexeme)
            .collect::<Vec<_>>();
        assert_eq!(lexemes, vec!["1", "22", "333"]);
    }

    #[test]
    fn unknown_rule_names_are_rejected() {
        let mut lexer: Lexer<'_, &str> = Lexer::new("");
        let error = lexer
            .add_rules_from_str("NUM (0|1)+\n", |_| None::<&str>)
            .unwrap_err();
        assert!(matches!(error, FsmError::MalformedRule { line_no: 1, .. }));
    }
}
