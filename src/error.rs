use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, FsmError>;

/// Abstracts the kinds of failures that can occur when constructing,
/// transforming or executing a machine. All operations surface errors to the
/// caller; there is no local recovery and no partial result on failure.
#[derive(Debug, Error)]
pub enum FsmError {
    /// Execution reached a state/input pair for which no transition exists.
    #[error("no transition from state `{state}` on input `{input}`")]
    UndefinedTransition {
        /// State the machine was in when the lookup failed.
        state: String,
        /// The offending input symbol.
        input: String,
    },
    /// A Moore machine has no output recorded for an involved state.
    #[error("no output defined for state `{state}`")]
    UndefinedOutput {
        /// The state missing from the output map.
        state: String,
    },
    /// A conversion precondition was violated.
    #[error("inconsistent machine: {reason}")]
    InconsistentMachine {
        /// Human-readable description of the violated precondition.
        reason: String,
    },
    /// The regex tokenizer or parser rejected the pattern.
    #[error("malformed regex at position {position}: {reason}")]
    MalformedRegex {
        /// Byte position in the pattern the failure is attributed to.
        position: usize,
        /// What went wrong there.
        reason: String,
    },
    /// A grammar file line matched none of the expected shapes.
    #[error("malformed grammar line {line_no}: `{raw}`")]
    MalformedGrammarLine {
        /// 1-based line number within the grammar text.
        line_no: usize,
        /// The offending line, verbatim.
        raw: String,
    },
    /// The lexer found no rule matching the upcoming character.
    #[error("unexpected character at line {line}, column {column}")]
    UnexpectedCharacter {
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        column: usize,
    },
    /// A dot line matched a recognized shape but carried an ill-formed label.
    #[error("malformed dot input at line {line_no}: {reason}")]
    MalformedDot {
        /// 1-based line number within the dot text.
        line_no: usize,
        /// What was wrong with the line.
        reason: String,
    },
    /// A lexer rules-file line could not be turned into a rule.
    #[error("malformed lexer rule at line {line_no}: {reason}")]
    MalformedRule {
        /// 1-based line number within the rules text.
        line_no: usize,
        /// What was wrong with the line.
        reason: String,
    },
    /// Reading or writing a file failed.
    #[error("could not access `{}`: {source}", .path.display())]
    Io {
        /// The path that was being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
