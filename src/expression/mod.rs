//! Shared logic for lexing, parsing and evaluating marker expressions

mod ast;
mod evaluation;
mod lexer;
mod parsing;

pub use ast::{
	ComparisonOperator, LogicalOperator, MarkerExpr, MarkerVariable, Operand, Token, ValueCategory,
};
pub use evaluation::{evaluate, EvaluationError};
pub use lexer::tokenize;
pub use parsing::{parse, ParseError};
