use tracing::debug;

use crate::ast::{AdditiveOp, Ast, MultiplicativeOp, NodeId, NodeKind};
use crate::error::ParseError;
use crate::lexer::{tokenize, TokenKind, TokenStream};

/// How many parentheses may be open at once.
pub const MAX_NESTING: usize = 100;

/// Parses a whole script into a tree whose root is a `Program` node.
///
/// The grammar:
///
/// ```text
/// program             := statement*
/// statement           := intDeclaration | assignmentStatement | expressionStatement
/// intDeclaration      := 'int' IDENT ('=' additive)? ';'
/// assignmentStatement := IDENT '=' additive ';'
/// expressionStatement := additive ';'
/// additive            := multiplicative (('+' | '-') multiplicative)*
/// multiplicative      := primary (('*' | '/') primary)*
/// primary             := INT_LITERAL | IDENT | '(' additive ')'
/// ```
///
/// Binary operators are left associative:
///
/// ```
/// # use simple_script::{parse, ast::NodeType};
/// let ast = parse("10-3-2;").unwrap();
/// let dump = ast.dump();
/// // ((10 - 3) - 2)
/// assert_eq!(dump[1].node_type, NodeType::Additive);
/// assert_eq!(dump[2].node_type, NodeType::Additive);
/// assert_eq!(dump[5].text, "2");
/// assert_eq!(dump[5].depth, 2);
/// ```
///
/// Unnecessary parentheses are ignored:
///
/// ```
/// # use simple_script::parse;
/// assert_eq!(parse("((((a))));"), parse("a;"));
/// ```
///
/// The first error aborts parsing:
///
/// ```
/// # use simple_script::{parse, error::ParseError};
/// assert!(matches!(parse("2+;"), Err(ParseError::MissingRightOperand { .. })));
/// ```
///
pub fn parse(source: &str) -> Result<Ast, ParseError> {
    Parser::new(tokenize(source)).parse_program()
}

/// Parses a single expression with no trailing semicolon, the way a desk
/// calculator reads its input. The expression becomes the only child of the
/// `Program` root.
///
/// ```
/// # use simple_script::parse_expression;
/// assert!(parse_expression("2+3*5").is_ok());
/// assert!(parse_expression("2+3;").is_err());
/// ```
///
pub fn parse_expression(source: &str) -> Result<Ast, ParseError> {
    Parser::new(tokenize(source)).parse_calculation()
}

/// Recursive descent parser over a token stream.
///
/// Each rule returns `Ok(Some(node))` when it matched, `Ok(None)` when the
/// input does not start with that rule (nothing is consumed in that case),
/// and `Err` when the input started matching but turned out to be malformed.
///
pub struct Parser {
    tokens: TokenStream,
    ast: Ast,
    // parentheses currently open
    nesting: usize,
}

impl Parser {
    pub fn new(tokens: TokenStream) -> Parser {
        Parser {
            tokens,
            ast: Ast::new(),
            nesting: 0,
        }
    }

    pub fn parse_program(mut self) -> Result<Ast, ParseError> {
        let mut statements = Vec::new();
        while self.tokens.peek().is_some() {
            match self.statement()? {
                Some(statement) => statements.push(statement),
                None => {
                    let (position, found) = self.here();
                    return Err(ParseError::UnknownStatement { position, found });
                },
            }
        }
        self.ast.push(NodeKind::Program(statements));
        Ok(self.ast)
    }

    pub fn parse_calculation(mut self) -> Result<Ast, ParseError> {
        let expr = match self.additive()? {
            Some(expr) => expr,
            None => {
                let (position, found) = self.here();
                return Err(ParseError::MissingExpression { position, found });
            },
        };
        if self.tokens.peek().is_some() {
            let (position, found) = self.here();
            return Err(ParseError::TrailingTokens { position, found });
        }
        self.ast.push(NodeKind::Program(vec![expr]));
        Ok(self.ast)
    }

    // Position and description of the token under the cursor, for errors.
    fn here(&self) -> (usize, String) {
        let found = match self.tokens.peek() {
            Some(token) => format!("'{}'", token.text()),
            None => "end of input".to_string(),
        };
        (self.tokens.position(), found)
    }

    fn statement(&mut self) -> Result<Option<NodeId>, ParseError> {
        if let Some(node) = self.int_declaration()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.assignment_statement()? {
            return Ok(Some(node));
        }
        self.expression_statement()
    }

    fn int_declaration(&mut self) -> Result<Option<NodeId>, ParseError> {
        if self.tokens.peek_kind() != Some(TokenKind::KeywordInt) {
            return Ok(None);
        }
        self.tokens.read();

        let name = match self.tokens.peek() {
            Some(token) if token.kind() == TokenKind::Identifier => token.text().to_string(),
            _ => {
                let (position, found) = self.here();
                return Err(ParseError::MissingVariableName { position, found });
            },
        };
        self.tokens.read();

        let mut init = None;
        if self.tokens.peek_kind() == Some(TokenKind::Assignment) {
            self.tokens.read();
            match self.additive()? {
                Some(expr) => init = Some(expr),
                None => {
                    let (position, found) = self.here();
                    return Err(ParseError::MissingInitializer { name, position, found });
                },
            }
        }
        self.expect_semicolon()?;

        Ok(Some(self.ast.push(NodeKind::IntDeclaration { name, init })))
    }

    fn assignment_statement(&mut self) -> Result<Option<NodeId>, ParseError> {
        let name = match self.tokens.peek() {
            Some(token) if token.kind() == TokenKind::Identifier => token.text().to_string(),
            _ => return Ok(None),
        };
        self.tokens.read();

        if self.tokens.peek_kind() != Some(TokenKind::Assignment) {
            // give the identifier back; it may start an expression.
            self.tokens.unread();
            debug!(position = self.tokens.position(), "not an assignment, backtracking");
            return Ok(None);
        }
        self.tokens.read();

        let value = match self.additive()? {
            Some(expr) => expr,
            None => {
                let (position, found) = self.here();
                return Err(ParseError::MissingAssignedValue { name, position, found });
            },
        };
        self.expect_semicolon()?;

        Ok(Some(self.ast.push(NodeKind::AssignmentStmt { name, value })))
    }

    fn expression_statement(&mut self) -> Result<Option<NodeId>, ParseError> {
        let checkpoint = self.tokens.position();
        let arena_len = self.ast.len();

        let node = match self.additive()? {
            Some(node) => node,
            None => return Ok(None),
        };
        if self.tokens.peek_kind() == Some(TokenKind::SemiColon) {
            self.tokens.read();
            Ok(Some(node))
        } else {
            debug!(checkpoint, "expression without semicolon, backtracking");
            self.tokens.set_position(checkpoint);
            self.ast.truncate(arena_len);
            Ok(None)
        }
    }

    fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        if self.tokens.peek_kind() == Some(TokenKind::SemiColon) {
            self.tokens.read();
            Ok(())
        } else {
            let (position, found) = self.here();
            Err(ParseError::MissingSemicolon { position, found })
        }
    }

    fn missing_right_operand(&self, operator: &str) -> ParseError {
        let (position, found) = self.here();
        ParseError::MissingRightOperand {
            operator: operator.to_string(),
            position,
            found,
        }
    }

    // Each new operator node takes everything parsed so far as its left
    // child, which makes the tree left-deep.
    fn additive(&mut self) -> Result<Option<NodeId>, ParseError> {
        let mut node = match self.multiplicative()? {
            Some(node) => node,
            None => return Ok(None),
        };
        loop {
            let op = match self.tokens.peek_kind() {
                Some(TokenKind::Plus) => AdditiveOp::Plus,
                Some(TokenKind::Minus) => AdditiveOp::Minus,
                _ => break,
            };
            self.tokens.read();
            let rhs = match self.multiplicative()? {
                Some(rhs) => rhs,
                None => return Err(self.missing_right_operand(op.symbol())),
            };
            node = self.ast.push(NodeKind::Additive { op, lhs: node, rhs });
        }
        Ok(Some(node))
    }

    fn multiplicative(&mut self) -> Result<Option<NodeId>, ParseError> {
        let mut node = match self.primary()? {
            Some(node) => node,
            None => return Ok(None),
        };
        loop {
            let op = match self.tokens.peek_kind() {
                Some(TokenKind::Star) => MultiplicativeOp::Star,
                Some(TokenKind::Slash) => MultiplicativeOp::Slash,
                _ => break,
            };
            self.tokens.read();
            let rhs = match self.primary()? {
                Some(rhs) => rhs,
                None => return Err(self.missing_right_operand(op.symbol())),
            };
            node = self.ast.push(NodeKind::Multiplicative { op, lhs: node, rhs });
        }
        Ok(Some(node))
    }

    // No node of its own: a primary is its literal, identifier or
    // parenthesized expression.
    fn primary(&mut self) -> Result<Option<NodeId>, ParseError> {
        let token = match self.tokens.peek() {
            Some(token) => token.clone(),
            None => return Ok(None),
        };
        match token.kind() {
            TokenKind::IntLiteral => {
                self.tokens.read();
                Ok(Some(self.ast.push(NodeKind::IntLiteral(token.text().to_string()))))
            },
            TokenKind::Identifier => {
                self.tokens.read();
                Ok(Some(self.ast.push(NodeKind::Identifier(token.text().to_string()))))
            },
            TokenKind::LeftParen => {
                if self.nesting == MAX_NESTING {
                    let (position, found) = self.here();
                    return Err(ParseError::NestingTooDeep { limit: MAX_NESTING, position, found });
                }
                self.tokens.read();
                self.nesting += 1;
                let inner = self.additive();
                self.nesting -= 1;
                let inner = match inner? {
                    Some(inner) => inner,
                    None => {
                        let (position, found) = self.here();
                        return Err(ParseError::EmptyParens { position, found });
                    },
                };
                if self.tokens.peek_kind() == Some(TokenKind::RightParen) {
                    self.tokens.read();
                    Ok(Some(inner))
                } else {
                    let (position, found) = self.here();
                    Err(ParseError::MissingClosingParen { position, found })
                }
            },
            _ => Ok(None),
        }
    }
}
