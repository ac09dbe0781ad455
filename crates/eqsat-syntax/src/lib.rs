//! S-expression front end for [`eqsat_core::term`]: a hand-rolled lexer, a
//! recursive-descent parser, and the `Display` impls in `eqsat-core` serve
//! as the inverse pretty-printer.
//!
//! Grammar: an atom is a leaf; `(op t1 .. tn)` is an internal node. Patterns
//! share the grammar, with an atom beginning with `?` denoting a variable.

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

use eqsat_core::term::{Pattern, Term};

/// Failures the lexer or parser can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A `)` with no matching open `(`.
    #[error("unexpected ')'")]
    UnexpectedCloseParen,
    /// End of input reached with an open `(` still unmatched.
    #[error("unterminated list")]
    UnterminatedList,
    /// Input remained after a complete term/pattern was parsed.
    #[error("trailing tokens after a complete expression")]
    TrailingTokens,
    /// The input was empty or contained only whitespace.
    #[error("empty input")]
    EmptyInput,
    /// `()` with no operator.
    #[error("empty list")]
    EmptyList,
    /// A pattern variable (`?x`) used where an operator was expected.
    #[error("variable `?{0}` cannot be used as an operator")]
    VariableAsOperator(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    LParen,
    RParen,
    Atom(&'a str),
}

fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, '(')) => {
                tokens.push(Token::LParen);
                rest = &rest[1..];
            },
            Some((_, ')')) => {
                tokens.push(Token::RParen);
                rest = &rest[1..];
            },
            Some(_) => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
                    .unwrap_or(rest.len());
                let (atom, remainder) = rest.split_at(end);
                tokens.push(Token::Atom(atom));
                rest = remainder;
            },
            None => unreachable!("checked non-empty above"),
        }
    }

    tokens
}

struct Parser<'a> {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token<'a>>>,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    fn parse_term(&mut self) -> Result<Term, ParseError> {
        match self.tokens.next().ok_or(ParseError::UnterminatedList)? {
            Token::RParen => Err(ParseError::UnexpectedCloseParen),
            Token::Atom(a) => Ok(Term::leaf(a)),
            Token::LParen => {
                let op = match self.tokens.next().ok_or(ParseError::UnterminatedList)? {
                    Token::Atom(a) => a,
                    Token::LParen => return Err(ParseError::EmptyList), // a nested list as operator position
                    Token::RParen => return Err(ParseError::EmptyList),
                };

                let mut children = Vec::new();
                loop {
                    match self.tokens.peek() {
                        Some(Token::RParen) => {
                            self.tokens.next();
                            break;
                        },
                        Some(_) => children.push(self.parse_term()?),
                        None => return Err(ParseError::UnterminatedList),
                    }
                }

                Ok(Term::node(op, children))
            },
        }
    }

    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        match self.tokens.next().ok_or(ParseError::UnterminatedList)? {
            Token::RParen => Err(ParseError::UnexpectedCloseParen),
            Token::Atom(a) => Ok(match a.strip_prefix('?') {
                Some(var) => Pattern::var(var),
                None => Pattern::node(a, vec![]),
            }),
            Token::LParen => {
                let op = match self.tokens.next().ok_or(ParseError::UnterminatedList)? {
                    Token::Atom(a) => a,
                    Token::LParen | Token::RParen => return Err(ParseError::EmptyList),
                };

                if let Some(var) = op.strip_prefix('?') {
                    return Err(ParseError::VariableAsOperator(var.to_owned()));
                }

                let mut children = Vec::new();
                loop {
                    match self.tokens.peek() {
                        Some(Token::RParen) => {
                            self.tokens.next();
                            break;
                        },
                        Some(_) => children.push(self.parse_pattern()?),
                        None => return Err(ParseError::UnterminatedList),
                    }
                }

                Ok(Pattern::node(op, children))
            },
        }
    }
}

/// Parse a single [`Term`] from its S-expression form.
///
/// # Errors
/// See [`ParseError`].
pub fn parse_term(input: &str) -> Result<Term, ParseError> {
    let tokens = lex(input);
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut parser = Parser::new(tokens);
    let term = parser.parse_term()?;
    if parser.tokens.next().is_some() {
        return Err(ParseError::TrailingTokens);
    }

    Ok(term)
}

/// Parse a single [`Pattern`] from its S-expression form.
///
/// # Errors
/// See [`ParseError`].
pub fn parse_pattern(input: &str) -> Result<Pattern, ParseError> {
    let tokens = lex(input);
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut parser = Parser::new(tokens);
    let pattern = parser.parse_pattern()?;
    if parser.tokens.next().is_some() {
        return Err(ParseError::TrailingTokens);
    }

    Ok(pattern)
}

/// Pretty-print `term` in canonical S-expression form (same as its `Display`
/// impl); exposed here so callers need not import `eqsat_core` directly just
/// to stringify.
#[must_use]
pub fn print_term(term: &Term) -> String { term.to_string() }

/// Pretty-print `pattern` in canonical S-expression form.
#[must_use]
pub fn print_pattern(pattern: &Pattern) -> String { pattern.to_string() }

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_bare_atom() {
        assert_eq!(parse_term("a").unwrap(), Term::leaf("a"));
    }

    #[test]
    fn parses_nested_list() {
        let t = parse_term("(+ a (* b c))").unwrap();
        assert_eq!(t, Term::node("+", vec![Term::leaf("a"), Term::node("*", vec![Term::leaf("b"), Term::leaf("c")])]));
    }

    #[test]
    fn round_trips_through_print() {
        for src in ["a", "(+ a b)", "(f (g x) y)"] {
            let t = parse_term(src).unwrap();
            assert_eq!(parse_term(&print_term(&t)).unwrap(), t);
        }
    }

    #[test]
    fn pattern_variable_leading_question_mark() {
        let p = parse_pattern("(+ ?x ?y)").unwrap();
        assert_eq!(p, Pattern::node("+", vec![Pattern::var("x"), Pattern::var("y")]));
    }

    #[test]
    fn rejects_variable_as_operator() {
        assert_eq!(parse_pattern("(?f x)").unwrap_err(), ParseError::VariableAsOperator("f".to_owned()));
    }

    #[test]
    fn rejects_empty_list() {
        assert_eq!(parse_term("()").unwrap_err(), ParseError::EmptyList);
    }

    #[test]
    fn rejects_unexpected_close_paren() {
        assert_eq!(parse_term(")").unwrap_err(), ParseError::UnexpectedCloseParen);
    }

    #[test]
    fn rejects_unterminated_list() {
        assert_eq!(parse_term("(+ a b").unwrap_err(), ParseError::UnterminatedList);
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert_eq!(parse_term("a b").unwrap_err(), ParseError::TrailingTokens);
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(parse_term("").unwrap_err(), ParseError::EmptyInput);
        assert_eq!(parse_term("   ").unwrap_err(), ParseError::EmptyInput);
    }
}
