//! Syntax tree shared by the parser and the interpreter.
//!
//! The parser builds these nodes once; the interpreter only reads them.

use num_bigint::BigInt;

#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    IntLiteral(BigInt),
    /// Raw string contents. Evaluation tries to read them as JSON first.
    StringLiteral(String),
    BoolLiteral(bool),
    DictLiteral(Vec<(Node, Node)>),
    BinaryOp {
        left: Box<Node>,
        op: BinaryOperator,
        right: Box<Node>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    Variable(String),
    Assignment {
        target: String,
        value: Box<Node>,
    },
    Call {
        name: String,
        args: Vec<Node>,
    },
    Conditional {
        condition: Box<Node>,
        then_block: Vec<Node>,
        elif_blocks: Vec<(Node, Vec<Node>)>,
        else_block: Option<Vec<Node>>,
    },
    IndexAccess {
        container: Box<Node>,
        index: Box<Node>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "not",
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Node>,
}
