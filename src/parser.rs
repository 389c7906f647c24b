use crate::ast::{BinaryOperator, Node, Program, UnaryOperator};
use crate::lexer::{LexResult, Lexer};
use crate::token::{Span, Token, TokenKind};

mod error;

pub use error::{ParseError, ParseResult};

/// Recursive-descent parser with one token of lookahead.
///
/// Tokens are pulled from the source one at a time, so a lexical error
/// anywhere in the input surfaces as soon as the parser reaches it.
pub struct Parser<'a, I> {
    tokens: I,
    current: Token<'a>,
}

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = LexResult<Token<'a>>>,
{
    pub fn new(mut tokens: I) -> ParseResult<Self> {
        let current = match tokens.next() {
            Some(token) => token?,
            None => Token::new(TokenKind::EOF, Span::default()),
        };
        Ok(Self { tokens, current })
    }

    pub fn parse_program(mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        while self.current.kind != TokenKind::EOF {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> ParseResult<Node> {
        if self.current.kind == TokenKind::If {
            return self.parse_conditional();
        }
        self.parse_assignment_or_expr()
    }

    fn parse_conditional(&mut self) -> ParseResult<Node> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_logical()?;
        self.expect(TokenKind::Colon)?;
        let then_block = self.parse_block()?;

        let mut elif_blocks = Vec::new();
        while self.current.kind == TokenKind::Elif {
            self.advance()?;
            let elif_condition = self.parse_logical()?;
            self.expect(TokenKind::Colon)?;
            elif_blocks.push((elif_condition, self.parse_block()?));
        }

        let else_block = if self.current.kind == TokenKind::Else {
            self.advance()?;
            self.expect(TokenKind::Colon)?;
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Node::Conditional {
            condition: Box::new(condition),
            then_block,
            elif_blocks,
            else_block,
        })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Node>> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !matches!(self.current.kind, TokenKind::RBrace | TokenKind::EOF) {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(statements)
    }

    /// Right-associative: `x = y = 5` assigns `y` first.
    fn parse_assignment_or_expr(&mut self) -> ParseResult<Node> {
        let node = self.parse_logical()?;
        if self.current.kind != TokenKind::Assign {
            return Ok(node);
        }
        let Node::Variable(target) = node else {
            return Err(ParseError::InvalidAssignmentTarget {
                line: self.current.span.line,
                column: self.current.span.column,
            });
        };
        self.advance()?;
        let value = self.parse_assignment_or_expr()?;
        Ok(Node::Assignment {
            target,
            value: Box::new(value),
        })
    }

    fn parse_logical(&mut self) -> ParseResult<Node> {
        let mut node = self.parse_equality()?;
        while let Some(op) = logical_operator(&self.current.kind) {
            self.advance()?;
            let right = self.parse_equality()?;
            node = binary(node, op, right);
        }
        Ok(node)
    }

    fn parse_equality(&mut self) -> ParseResult<Node> {
        let mut node = self.parse_additive()?;
        while let Some(op) = comparison_operator(&self.current.kind) {
            self.advance()?;
            let right = self.parse_additive()?;
            node = binary(node, op, right);
        }
        Ok(node)
    }

    fn parse_additive(&mut self) -> ParseResult<Node> {
        let mut node = self.parse_term()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_term()?;
            node = binary(node, op, right);
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> ParseResult<Node> {
        let mut node = self.parse_factor()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_factor()?;
            node = binary(node, op, right);
        }
        Ok(node)
    }

    fn parse_factor(&mut self) -> ParseResult<Node> {
        let mut node = self.parse_primary()?;
        while self.current.kind == TokenKind::LBracket {
            self.advance()?;
            let index = self.parse_logical()?;
            self.expect(TokenKind::RBracket)?;
            node = Node::IndexAccess {
                container: Box::new(node),
                index: Box::new(index),
            };
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> ParseResult<Node> {
        let unary = match self.current.kind {
            TokenKind::Not => Some(UnaryOperator::Not),
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Minus => Some(UnaryOperator::Minus),
            _ => None,
        };
        if let Some(op) = unary {
            self.advance()?;
            let operand = self.parse_factor()?;
            return Ok(Node::UnaryOp {
                op,
                operand: Box::new(operand),
            });
        }

        let Token { kind, span } = self.advance()?;
        match kind {
            TokenKind::Integer(value) => Ok(Node::IntLiteral(value)),
            TokenKind::True => Ok(Node::BoolLiteral(true)),
            TokenKind::False => Ok(Node::BoolLiteral(false)),
            TokenKind::String(value) => Ok(Node::StringLiteral(value.into_owned())),
            TokenKind::LBrace => self.parse_dict(),
            TokenKind::LParen => {
                let expr = self.parse_logical()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Identifier(name) => self.parse_identifier(name),
            other => Err(unexpected("expression", &other, span)),
        }
    }

    /// The token after an identifier decides between call, assignment and variable.
    fn parse_identifier(&mut self, name: &str) -> ParseResult<Node> {
        match self.current.kind {
            TokenKind::Assign => {
                self.advance()?;
                let value = self.parse_logical()?;
                Ok(Node::Assignment {
                    target: name.to_string(),
                    value: Box::new(value),
                })
            }
            TokenKind::LParen => {
                self.advance()?;
                let args = self.parse_args()?;
                Ok(Node::Call {
                    name: name.to_string(),
                    args,
                })
            }
            _ => Ok(Node::Variable(name.to_string())),
        }
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Node>> {
        let mut args = Vec::new();
        if self.current.kind != TokenKind::RParen {
            args.push(self.parse_logical()?);
            while self.current.kind == TokenKind::Comma {
                self.advance()?;
                args.push(self.parse_logical()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    /// Entries after the opening brace. Stops at the first entry not followed by a comma.
    fn parse_dict(&mut self) -> ParseResult<Node> {
        let mut pairs = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            let key = self.parse_additive()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_additive()?;
            pairs.push((key, value));
            if self.current.kind == TokenKind::Comma {
                self.advance()?;
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Node::DictLiteral(pairs))
    }

    fn expect(&mut self, expected: TokenKind<'static>) -> ParseResult<Token<'a>> {
        if self.current.kind == expected {
            self.advance()
        } else {
            Err(unexpected(
                &expected.to_string(),
                &self.current.kind,
                self.current.span,
            ))
        }
    }

    /// Moves to the next token and returns the one that was current.
    fn advance(&mut self) -> ParseResult<Token<'a>> {
        let next = match self.tokens.next() {
            Some(token) => token?,
            None => Token::new(TokenKind::EOF, self.current.span),
        };
        Ok(std::mem::replace(&mut self.current, next))
    }
}

fn logical_operator(kind: &TokenKind<'_>) -> Option<BinaryOperator> {
    match kind {
        TokenKind::And => Some(BinaryOperator::And),
        TokenKind::Or => Some(BinaryOperator::Or),
        _ => None,
    }
}

fn comparison_operator(kind: &TokenKind<'_>) -> Option<BinaryOperator> {
    match kind {
        TokenKind::EqualEqual => Some(BinaryOperator::Equal),
        TokenKind::NotEqual => Some(BinaryOperator::NotEqual),
        TokenKind::Less => Some(BinaryOperator::Less),
        TokenKind::Greater => Some(BinaryOperator::Greater),
        TokenKind::LessEqual => Some(BinaryOperator::LessEqual),
        TokenKind::GreaterEqual => Some(BinaryOperator::GreaterEqual),
        _ => None,
    }
}

fn binary(left: Node, op: BinaryOperator, right: Node) -> Node {
    Node::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn unexpected(expected: &str, found: &TokenKind<'_>, span: Span) -> ParseError {
    ParseError::UnexpectedToken {
        expected: expected.to_string(),
        found: found.to_string(),
        line: span.line,
        column: span.column,
    }
}

/// Tokenizes and parses `input` in a single pass.
pub fn parse(input: &str) -> ParseResult<Program> {
    let program = Parser::new(Lexer::new(input))?.parse_program()?;
    log::debug!("parsed {} top-level statements", program.statements.len());
    Ok(program)
}

/// Parses an already collected token stream.
pub fn parse_tokens(tokens: Vec<Token<'_>>) -> ParseResult<Program> {
    Parser::new(tokens.into_iter().map(Ok))?.parse_program()
}
