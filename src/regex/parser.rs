//! Regex parsing: tokenize, insert implicit concatenation, shunting-yard to
//! postfix, fold the postfix stream into a [`RegexAst`].

use crate::error::{FsmError, Result};
use crate::regex::RegexAst;

/// One token of the concrete syntax. `Concat` never appears in the input;
/// it is synthesized between adjacent tokens that juxtapose operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegexToken {
    Literal(char),
    LParen,
    RParen,
    Star,
    Plus,
    Pipe,
    Concat,
}

impl RegexToken {
    fn precedence(self) -> u8 {
        match self {
            RegexToken::Pipe => 1,
            RegexToken::Concat => 2,
            RegexToken::Star | RegexToken::Plus => 3,
            RegexToken::Literal(_) | RegexToken::LParen | RegexToken::RParen => 0,
        }
    }

    /// Whether a token of this kind can begin an operand.
    fn starts_operand(self) -> bool {
        matches!(self, RegexToken::Literal(_) | RegexToken::LParen)
    }

    /// Whether a token of this kind can end an operand.
    fn ends_operand(self) -> bool {
        matches!(
            self,
            RegexToken::Literal(_) | RegexToken::RParen | RegexToken::Star | RegexToken::Plus
        )
    }

    fn display(self) -> &'static str {
        match self {
            RegexToken::Literal(_) => "literal",
            RegexToken::LParen => "(",
            RegexToken::RParen => ")",
            RegexToken::Star => "*",
            RegexToken::Plus => "+",
            RegexToken::Pipe => "|",
            RegexToken::Concat => "concatenation",
        }
    }
}

/// Parses `pattern` into an AST. The empty pattern denotes ε.
pub(crate) fn parse(pattern: &str) -> Result<RegexAst> {
    let tokens = tokenize(pattern)?;
    let tokens = insert_concatenation(tokens);
    let postfix = to_postfix(tokens)?;
    ast_from_postfix(postfix, pattern.len())
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        '0' => '\0',
        other => other,
    }
}

fn tokenize(pattern: &str) -> Result<Vec<(RegexToken, usize)>> {
    let mut tokens = Vec::new();
    let mut chars = pattern.char_indices();

    while let Some((at, ch)) = chars.next() {
        let token = match ch {
            '\\' => match chars.next() {
                Some((_, escaped)) => RegexToken::Literal(unescape(escaped)),
                None => {
                    return Err(FsmError::MalformedRegex {
                        position: at,
                        reason: "trailing backslash".to_string(),
                    })
                }
            },
            '(' => RegexToken::LParen,
            ')' => RegexToken::RParen,
            '*' => RegexToken::Star,
            '+' => RegexToken::Plus,
            '|' => RegexToken::Pipe,
            literal => RegexToken::Literal(literal),
        };
        tokens.push((token, at));
    }
    Ok(tokens)
}

/// Inserts a synthetic `Concat` between adjacent tokens `X Y` where `X` can
/// end an operand and `Y` can begin one.
fn insert_concatenation(tokens: Vec<(RegexToken, usize)>) -> Vec<(RegexToken, usize)> {
    let mut result: Vec<(RegexToken, usize)> = Vec::with_capacity(tokens.len() * 2);
    for (token, at) in tokens {
        match result.last() {
            Some(&(previous, _)) if previous.ends_operand() && token.starts_operand() => {
                result.push((RegexToken::Concat, at));
            }
            _ => {}
        }
        result.push((token, at));
    }
    result
}

/// Shunting-yard. All operators are left-associative; `*`/`+` only use their
/// precedence to pop other postfix operators off the stack.
fn to_postfix(tokens: Vec<(RegexToken, usize)>) -> Result<Vec<(RegexToken, usize)>> {
    let mut postfix = Vec::with_capacity(tokens.len());
    let mut operators: Vec<(RegexToken, usize)> = Vec::new();

    for (token, at) in tokens {
        match token {
            RegexToken::Literal(_) => postfix.push((token, at)),
            RegexToken::LParen => operators.push((token, at)),
            RegexToken::RParen => loop {
                match operators.pop() {
                    Some((RegexToken::LParen, _)) => break,
                    Some(operator) => postfix.push(operator),
                    None => {
                        return Err(FsmError::MalformedRegex {
                            position: at,
                            reason: "unmatched `)`".to_string(),
                        })
                    }
                }
            },
            operator => {
                while let Some(&(top, _)) = operators.last() {
                    if top == RegexToken::LParen || top.precedence() < operator.precedence() {
                        break;
                    }
                    postfix.push(operators.pop().expect("stack top was just peeked"));
                }
                operators.push((operator, at));
            }
        }
    }

    while let Some((operator, at)) = operators.pop() {
        if operator == RegexToken::LParen {
            return Err(FsmError::MalformedRegex {
                position: at,
                reason: "unmatched `(`".to_string(),
            });
        }
        postfix.push((operator, at));
    }
    Ok(postfix)
}

fn pop_operand(stack: &mut Vec<RegexAst>, token: RegexToken, at: usize) -> Result<RegexAst> {
    stack.pop().ok_or_else(|| FsmError::MalformedRegex {
        position: at,
        reason: format!("`{}` is missing an operand", token.display()),
    })
}

fn ast_from_postfix(postfix: Vec<(RegexToken, usize)>, pattern_len: usize) -> Result<RegexAst> {
    if postfix.is_empty() {
        // the empty pattern accepts exactly the empty word
        return Ok(RegexAst::Symbol(None));
    }

    let mut operands: Vec<RegexAst> = Vec::new();
    for (token, at) in postfix {
        let node = match token {
            RegexToken::Literal(ch) => RegexAst::Symbol(Some(ch)),
            RegexToken::Star => RegexAst::Star(Box::new(pop_operand(&mut operands, token, at)?)),
            RegexToken::Plus => RegexAst::Plus(Box::new(pop_operand(&mut operands, token, at)?)),
            RegexToken::Concat => {
                let rhs = pop_operand(&mut operands, token, at)?;
                let lhs = pop_operand(&mut operands, token, at)?;
                RegexAst::Concat(Box::new(lhs), Box::new(rhs))
            }
            RegexToken::Pipe => {
                let rhs = pop_operand(&mut operands, token, at)?;
                let lhs = pop_operand(&mut operands, token, at)?;
                RegexAst::Alt(Box::new(lhs), Box::new(rhs))
            }
            RegexToken::LParen | RegexToken::RParen => {
                unreachable!("parentheses never reach the postfix stream")
            }
        };
        operands.push(node);
    }

    let ast = operands.pop().expect("postfix stream was non-empty");
    if !operands.is_empty() {
        return Err(FsmError::MalformedRegex {
            position: pattern_len,
            reason: "leftover operands".to_string(),
        });
    }
    Ok(ast)
}
