//! Recursive descent parser over the token stream
//!
//! Precedence, lowest to highest: `or` < `and` < comparison < grouping.
//! Both boolean operators are left-associative. Comparison categories are
//! checked here, at parse time, so a category-invalid marker never reaches
//! evaluation.

use thiserror::Error;

use crate::expression::ast::{
	ComparisonOperator, LogicalOperator, MarkerExpr, MarkerVariable, Operand, Token, ValueCategory,
};
use crate::expression::lexer::tokenize;

/// --- Error definitions ---
///
/// Lexer errors carry byte offsets into the input; parser errors carry the
/// index of the offending token.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ParseError {
	#[error("empty marker expression")]
	EmptyExpression,
	#[error("unterminated string literal starting at byte {position}")]
	UnterminatedString { position: usize },
	#[error("unexpected character `{character}` at byte {position}")]
	UnexpectedCharacter { character: char, position: usize },
	#[error("expected `in` after `not` at byte {position}")]
	DanglingNot { position: usize },
	#[error("expected {expected}, found {found} at token {position}")]
	UnexpectedToken {
		expected: &'static str,
		found: String,
		position: usize,
	},
	#[error("unbalanced parenthesis at token {position}")]
	UnbalancedParenthesis { position: usize },
	#[error("chained comparison at token {position}: each comparison takes exactly one operator")]
	ChainedComparison { position: usize },
	#[error("unknown marker variable: {0}")]
	UnknownVariable(String),
	#[error("invalid comparison: {0}")]
	InvalidComparison(String),
}

/// Parses a marker expression string into an AST
pub fn parse(expression: &str) -> Result<MarkerExpr<'_>, ParseError> {
	let tokens = tokenize(expression)?;
	let mut parser = Parser {
		tokens: &tokens,
		pos: 0,
	};

	if matches!(parser.peek(), Token::End) {
		return Err(ParseError::EmptyExpression);
	}

	let expr = parser.parse_or()?;

	match parser.peek() {
		Token::End => Ok(expr),
		Token::RParen => Err(ParseError::UnbalancedParenthesis {
			position: parser.pos,
		}),
		Token::Op(_) => Err(ParseError::ChainedComparison {
			position: parser.pos,
		}),
		found => Err(ParseError::UnexpectedToken {
			expected: "`and`, `or` or end of expression",
			found: describe(found),
			position: parser.pos,
		}),
	}
}

/// An operand before its comparison category is known
enum RawOperand<'a> {
	Variable(MarkerVariable),
	Literal(&'a str),
}

impl<'a> RawOperand<'a> {
	fn into_operand(self, category: ValueCategory) -> Operand<'a> {
		match self {
			RawOperand::Variable(variable) => Operand::Variable(variable),
			RawOperand::Literal(text) => match category {
				ValueCategory::String => Operand::StrLiteral(text),
				ValueCategory::Version => Operand::VersionLiteral(text),
			},
		}
	}
}

/// Resolves the comparison category from the operand pair and rejects
/// operators that are illegal for it. Literals adopt the category of the
/// variable they face; two literals have no variable to anchor a category
/// and compare as plain strings.
fn categorize<'a>(
	left: RawOperand<'a>,
	operator: ComparisonOperator,
	right: RawOperand<'a>,
) -> Result<(Operand<'a>, Operand<'a>), ParseError> {
	let category = match (&left, &right) {
		(RawOperand::Variable(l), RawOperand::Variable(r)) => {
			if l.category() != r.category() {
				return Err(ParseError::InvalidComparison(format!(
					"cannot compare {} variable `{}` with {} variable `{}`",
					l.category(),
					l.name(),
					r.category(),
					r.name(),
				)));
			}
			l.category()
		}
		(RawOperand::Variable(variable), RawOperand::Literal(_))
		| (RawOperand::Literal(_), RawOperand::Variable(variable)) => variable.category(),
		(RawOperand::Literal(_), RawOperand::Literal(_)) => ValueCategory::String,
	};

	if !operator.supported_for(category) {
		return Err(ParseError::InvalidComparison(format!(
			"operator `{}` is not defined for {} operands",
			operator, category,
		)));
	}

	Ok((
		left.into_operand(category),
		right.into_operand(category),
	))
}

fn describe(token: Token<'_>) -> String {
	match token {
		Token::Ident(name) => format!("identifier `{}`", name),
		Token::Str(text) => format!("string literal '{}'", text),
		Token::Op(operator) => format!("operator `{}`", operator),
		Token::And => "`and`".to_string(),
		Token::Or => "`or`".to_string(),
		Token::LParen => "`(`".to_string(),
		Token::RParen => "`)`".to_string(),
		Token::End => "end of expression".to_string(),
	}
}

struct Parser<'t, 'a> {
	tokens: &'t [Token<'a>],
	pos: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
	fn peek(&self) -> Token<'a> {
		self.tokens.get(self.pos).copied().unwrap_or(Token::End)
	}

	fn bump(&mut self) -> Token<'a> {
		let token = self.peek();
		self.pos += 1;
		token
	}

	fn parse_or(&mut self) -> Result<MarkerExpr<'a>, ParseError> {
		let mut left = self.parse_and()?;

		while matches!(self.peek(), Token::Or) {
			self.pos += 1;
			let right = self.parse_and()?;
			left = MarkerExpr::Logical {
				left: Box::new(left),
				operator: LogicalOperator::Or,
				right: Box::new(right),
			};
		}

		Ok(left)
	}

	fn parse_and(&mut self) -> Result<MarkerExpr<'a>, ParseError> {
		let mut left = self.parse_term()?;

		while matches!(self.peek(), Token::And) {
			self.pos += 1;
			let right = self.parse_term()?;
			left = MarkerExpr::Logical {
				left: Box::new(left),
				operator: LogicalOperator::And,
				right: Box::new(right),
			};
		}

		Ok(left)
	}

	/// Highest precedence: a parenthesized sub-expression or a single comparison
	fn parse_term(&mut self) -> Result<MarkerExpr<'a>, ParseError> {
		if matches!(self.peek(), Token::LParen) {
			let open = self.pos;
			self.pos += 1;
			let inner = self.parse_or()?;
			return match self.peek() {
				Token::RParen => {
					self.pos += 1;
					Ok(MarkerExpr::Group(Box::new(inner)))
				}
				Token::Op(_) => Err(ParseError::ChainedComparison {
					position: self.pos,
				}),
				Token::End => Err(ParseError::UnbalancedParenthesis { position: open }),
				found => Err(ParseError::UnexpectedToken {
					expected: "`)`",
					found: describe(found),
					position: self.pos,
				}),
			};
		}

		self.parse_comparison()
	}

	fn parse_comparison(&mut self) -> Result<MarkerExpr<'a>, ParseError> {
		let left = self.parse_operand("an operand")?;

		let operator = match self.bump() {
			Token::Op(operator) => operator,
			found => {
				return Err(ParseError::UnexpectedToken {
					expected: "a comparison operator",
					found: describe(found),
					position: self.pos - 1,
				});
			}
		};

		let right = self.parse_operand("a right operand")?;

		// The published grammar admits `a == b == c`; this implementation
		// deliberately narrows each comparison to one operator/operand pair.
		if matches!(self.peek(), Token::Op(_)) {
			return Err(ParseError::ChainedComparison {
				position: self.pos,
			});
		}

		let (left, right) = categorize(left, operator, right)?;

		Ok(MarkerExpr::Comparison {
			left,
			operator,
			right,
		})
	}

	fn parse_operand(&mut self, expected: &'static str) -> Result<RawOperand<'a>, ParseError> {
		match self.bump() {
			Token::Ident(name) => MarkerVariable::from_name(name)
				.map(RawOperand::Variable)
				.ok_or_else(|| ParseError::UnknownVariable(name.to_string())),
			Token::Str(text) => Ok(RawOperand::Literal(text)),
			found => Err(ParseError::UnexpectedToken {
				expected,
				found: describe(found),
				position: self.pos - 1,
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_simple_comparison() {
		let expr = parse("sys_platform == 'win32'").unwrap();
		assert_eq!(
			expr,
			MarkerExpr::Comparison {
				left: Operand::Variable(MarkerVariable::SysPlatform),
				operator: ComparisonOperator::Eq,
				right: Operand::StrLiteral("win32"),
			}
		);
	}

	#[test]
	fn test_parse_version_literal_category_from_variable() {
		// The literal faces a version-category variable, so it is tagged
		// as a version literal despite being plain quoted text
		let expr = parse("python_version >= '3.8'").unwrap();
		assert_eq!(
			expr,
			MarkerExpr::Comparison {
				left: Operand::Variable(MarkerVariable::PythonVersion),
				operator: ComparisonOperator::Ge,
				right: Operand::VersionLiteral("3.8"),
			}
		);

		// Same rule with the variable on the right
		let expr = parse("'3.8' <= python_version").unwrap();
		assert_eq!(
			expr,
			MarkerExpr::Comparison {
				left: Operand::VersionLiteral("3.8"),
				operator: ComparisonOperator::Le,
				right: Operand::Variable(MarkerVariable::PythonVersion),
			}
		);
	}

	#[test]
	fn test_parse_and_or_precedence() {
		// `and` binds tighter: a or (b and c)
		let expr = parse(
			"os_name == 'nt' or os_name == 'posix' and sys_platform == 'linux'",
		)
		.unwrap();
		match expr {
			MarkerExpr::Logical {
				operator: LogicalOperator::Or,
				right,
				..
			} => {
				assert!(matches!(
					*right,
					MarkerExpr::Logical {
						operator: LogicalOperator::And,
						..
					}
				));
			}
			other => panic!("expected top-level `or`, got {:?}", other),
		}
	}

	#[test]
	fn test_parse_left_associativity() {
		// a and b and c => (a and b) and c
		let expr = parse(
			"os_name == 'nt' and os_name == 'posix' and os_name == 'java'",
		)
		.unwrap();
		match expr {
			MarkerExpr::Logical {
				left,
				operator: LogicalOperator::And,
				right,
			} => {
				assert!(matches!(
					*left,
					MarkerExpr::Logical {
						operator: LogicalOperator::And,
						..
					}
				));
				assert!(matches!(*right, MarkerExpr::Comparison { .. }));
			}
			other => panic!("expected nested `and`, got {:?}", other),
		}
	}

	#[test]
	fn test_parse_group_overrides_precedence() {
		let expr = parse(
			"(os_name == 'nt' or os_name == 'posix') and sys_platform == 'linux'",
		)
		.unwrap();
		match expr {
			MarkerExpr::Logical {
				left,
				operator: LogicalOperator::And,
				..
			} => {
				assert!(matches!(*left, MarkerExpr::Group(_)));
			}
			other => panic!("expected top-level `and`, got {:?}", other),
		}
	}

	#[test]
	fn test_parse_in_operators() {
		let expr = parse("'linux' in sys_platform").unwrap();
		assert!(matches!(
			expr,
			MarkerExpr::Comparison {
				operator: ComparisonOperator::In,
				..
			}
		));

		let expr = parse("'bsd' not in sys_platform").unwrap();
		assert!(matches!(
			expr,
			MarkerExpr::Comparison {
				operator: ComparisonOperator::NotIn,
				..
			}
		));
	}

	#[test]
	fn test_parse_missing_right_operand() {
		assert!(matches!(
			parse("sys_platform =="),
			Err(ParseError::UnexpectedToken {
				expected: "a right operand",
				..
			})
		));
	}

	#[test]
	fn test_parse_missing_operator() {
		assert!(matches!(
			parse("sys_platform 'win32'"),
			Err(ParseError::UnexpectedToken {
				expected: "a comparison operator",
				..
			})
		));
	}

	#[test]
	fn test_parse_empty_expression() {
		assert_eq!(parse(""), Err(ParseError::EmptyExpression));
		assert_eq!(parse("  \t "), Err(ParseError::EmptyExpression));
	}

	#[test]
	fn test_parse_dangling_boolean_operator() {
		assert!(matches!(
			parse("os_name == 'nt' and"),
			Err(ParseError::UnexpectedToken { .. })
		));
		assert!(matches!(
			parse("or os_name == 'nt'"),
			Err(ParseError::UnexpectedToken { .. })
		));
	}

	#[test]
	fn test_parse_unbalanced_parentheses() {
		assert!(matches!(
			parse("(os_name == 'nt'"),
			Err(ParseError::UnbalancedParenthesis { .. })
		));
		assert!(matches!(
			parse("os_name == 'nt')"),
			Err(ParseError::UnbalancedParenthesis { .. })
		));
		assert!(matches!(
			parse("((os_name == 'nt')"),
			Err(ParseError::UnbalancedParenthesis { .. })
		));
	}

	#[test]
	fn test_parse_chained_comparison_is_rejected() {
		assert!(matches!(
			parse("python_version == '2.4' == '2.5'"),
			Err(ParseError::ChainedComparison { .. })
		));
		assert!(matches!(
			parse("(python_version == '2.4' == '2.5')"),
			Err(ParseError::ChainedComparison { .. })
		));
		assert!(matches!(
			parse("(os_name == 'nt') == 'posix'"),
			Err(ParseError::ChainedComparison { .. })
		));
	}

	#[test]
	fn test_parse_unknown_variable() {
		assert_eq!(
			parse("nonsense == 'x'"),
			Err(ParseError::UnknownVariable("nonsense".to_string()))
		);
		// Unknown names are rejected on either side
		assert_eq!(
			parse("'x' == nonsense"),
			Err(ParseError::UnknownVariable("nonsense".to_string()))
		);
	}

	#[test]
	fn test_parse_invalid_comparison_operator_for_category() {
		// Ordering on a string-category variable
		assert!(matches!(
			parse("os_name < 'posix'"),
			Err(ParseError::InvalidComparison(_))
		));
		// Membership on a version-category variable
		assert!(matches!(
			parse("python_version in '3.8 3.9'"),
			Err(ParseError::InvalidComparison(_))
		));
		// Ordering between two bare literals
		assert!(matches!(
			parse("'1.0' < '2.0'"),
			Err(ParseError::InvalidComparison(_))
		));
	}

	#[test]
	fn test_parse_invalid_comparison_mixed_variable_categories() {
		assert!(matches!(
			parse("os_name == python_version"),
			Err(ParseError::InvalidComparison(_))
		));
	}

	#[test]
	fn test_parse_same_category_variables_allowed() {
		let expr = parse("python_version == python_full_version").unwrap();
		assert!(matches!(
			expr,
			MarkerExpr::Comparison {
				left: Operand::Variable(MarkerVariable::PythonVersion),
				operator: ComparisonOperator::Eq,
				right: Operand::Variable(MarkerVariable::PythonFullVersion),
			}
		));
	}

	#[test]
	fn test_display_parse_round_trip() {
		let corpus = [
			"os_name == 'posix'",
			"python_version >= '3.8' and sys_platform == 'linux'",
			"(os_name == 'nt' or os_name == 'posix') and python_version < '4.0'",
			"'linux' in sys_platform",
			"platform_machine not in 'x86_64 amd64'",
			"python_version == '2.4' or python_version == '2.5'",
			"((sys_platform == 'darwin'))",
			"python_version >= '3.8' and (sys_platform == 'linux' or sys_platform == 'darwin')",
		];
		for marker in corpus {
			let first = parse(marker).unwrap();
			let rendered = first.to_string();
			let second = parse(&rendered).unwrap();
			assert_eq!(first, second, "round trip failed for {}", marker);
		}
	}
}
