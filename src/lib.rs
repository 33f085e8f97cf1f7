pub mod lexer;
pub mod parser;
pub mod ast;
pub mod eval;
pub mod error;
pub mod interpreter;

pub use lexer::{tokenize, Token, TokenKind, TokenStream};
pub use parser::{parse, parse_expression, Parser};
pub use ast::{Ast, NodeId, NodeKind, NodeType};
pub use eval::{evaluate, evaluate_node, Environment};
pub use error::{EvalError, ParseError, ScriptError};
pub use interpreter::{Interpreter, Outcome};
