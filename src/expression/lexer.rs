//! Lexer turning a marker expression string into a flat token stream

use winnow::{
	combinator::{alt, delimited},
	prelude::*,
	token::{literal, one_of, take_while},
};

use crate::expression::ast::{ComparisonOperator, Token};
use crate::expression::parsing::ParseError;

/// --- Helper aliases ---
type Input<'a> = &'a str;
type LexResult<T> = winnow::Result<T>;

/// Lexes a string literal delimited by single or double quotes
fn lex_string<'a>(input: &mut Input<'a>) -> LexResult<&'a str> {
	alt((
		delimited('\'', take_while(0.., |c| c != '\''), '\''),
		delimited('"', take_while(0.., |c| c != '"'), '"'),
	))
	.parse_next(input)
}

/// Lexes a bare identifier: `[A-Za-z_][A-Za-z0-9_]*`, maximal munch
fn lex_identifier<'a>(input: &mut Input<'a>) -> LexResult<&'a str> {
	let start_input = *input;
	let first_char = one_of(|c: char| c.is_ascii_alphabetic() || c == '_').parse_next(input)?;
	let rest_chars: &str =
		take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)?;
	let consumed_len = first_char.len_utf8() + rest_chars.len();
	Ok(&start_input[..consumed_len])
}

/// Lexes a comparator symbol. Two-character lexemes are tried before their
/// one-character prefixes so `<=` never lexes as `<` followed by `=`.
fn lex_comparator(input: &mut Input<'_>) -> LexResult<ComparisonOperator> {
	alt((
		literal("==").value(ComparisonOperator::Eq),
		literal("!=").value(ComparisonOperator::Ne),
		literal("<=").value(ComparisonOperator::Le),
		literal(">=").value(ComparisonOperator::Ge),
		literal("<").value(ComparisonOperator::Lt),
		literal(">").value(ComparisonOperator::Gt),
	))
	.parse_next(input)
}

/// Converts a marker expression into a token sequence ending in [`Token::End`].
/// Positions reported in errors are byte offsets into the input.
pub fn tokenize(expression: &str) -> Result<Vec<Token<'_>>, ParseError> {
	let mut tokens = Vec::new();
	let mut rest = expression;

	loop {
		rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
		let position = expression.len() - rest.len();
		let Some(first) = rest.chars().next() else {
			break;
		};

		match first {
			'(' => {
				tokens.push(Token::LParen);
				rest = &rest[1..];
			}
			')' => {
				tokens.push(Token::RParen);
				rest = &rest[1..];
			}
			'\'' | '"' => {
				let mut input = rest;
				let Ok(text) = lex_string(&mut input) else {
					return Err(ParseError::UnterminatedString { position });
				};
				tokens.push(Token::Str(text));
				rest = input;
			}
			'=' | '!' | '<' | '>' => {
				let mut input = rest;
				// A lone `=` or `!` falls through here as well
				let Ok(operator) = lex_comparator(&mut input) else {
					return Err(ParseError::UnexpectedCharacter {
						character: first,
						position,
					});
				};
				tokens.push(Token::Op(operator));
				rest = input;
			}
			c if c.is_ascii_alphabetic() || c == '_' => {
				let mut input = rest;
				let Ok(ident) = lex_identifier(&mut input) else {
					return Err(ParseError::UnexpectedCharacter {
						character: c,
						position,
					});
				};
				rest = input;
				match ident {
					"and" => tokens.push(Token::And),
					"or" => tokens.push(Token::Or),
					"in" => tokens.push(Token::Op(ComparisonOperator::In)),
					"not" => {
						// `not` only occurs as the first word of the
						// two-word operator `not in`
						rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
						let not_position = expression.len() - rest.len();
						let mut input = rest;
						match lex_identifier(&mut input) {
							Ok("in") => {
								tokens.push(Token::Op(ComparisonOperator::NotIn));
								rest = input;
							}
							_ => {
								return Err(ParseError::DanglingNot {
									position: not_position,
								})
							}
						}
					}
					name => tokens.push(Token::Ident(name)),
				}
			}
			other => {
				return Err(ParseError::UnexpectedCharacter {
					character: other,
					position,
				});
			}
		}
	}

	tokens.push(Token::End);
	Ok(tokens)
}
