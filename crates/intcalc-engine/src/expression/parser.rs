//! Precedence-climbing parser from tokens to an expression tree.
//!
//! Precedence, loosest first: `+ -`, then `* / %`, then `^` (left to right),
//! then prefix signs. Prefix signs bind tighter than `^`, so `-2^2` is `4`.
//! One-argument functions take a signed operand with or without parentheses
//! (`sin x`, `sin(x)`); two-argument functions always need parentheses.

use super::Node;
use super::functions::{BinaryFunction, BinaryOp, UnaryFunction, constant};
use super::lexer::{Token, TokenKind};
use crate::VARIABLE_NAME;
use crate::errors::ExpressionError;

/// Deepest expression tree, and deepest bracket or call nesting, accepted.
///
/// Evaluation, folding and dropping all recurse over the tree, so the bound
/// keeps them within a worker thread's stack.
pub(crate) const MAX_DEPTH: usize = 256;

/// A parsed subtree and its height.
struct Branch {
    node: Node,
    height: usize,
}

impl Branch {
    const fn leaf(node: Node) -> Self {
        Self { node, height: 1 }
    }

    /// Wraps `node`, whose tallest child is `child_height`, failing at
    /// `position` once the tree grows past [`MAX_DEPTH`].
    fn nest(node: Node, child_height: usize, position: usize) -> Result<Self, ExpressionError> {
        let height = child_height + 1;
        if height > MAX_DEPTH {
            return Err(ExpressionError::TooDeep { position });
        }
        Ok(Self { node, height })
    }

    fn binary(op: BinaryOp, lhs: Self, rhs: Self, position: usize) -> Result<Self, ExpressionError> {
        let child_height = lhs.height.max(rhs.height);
        Self::nest(Node::binary(op, lhs.node, rhs.node), child_height, position)
    }
}

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    cursor: usize,
    end: usize,
    nesting: usize,
}

impl<'t> Parser<'t> {
    /// `end` is the byte length of the source, reported for truncated input.
    pub(crate) const fn new(tokens: &'t [Token], end: usize) -> Self {
        Self {
            tokens,
            cursor: 0,
            end,
            nesting: 0,
        }
    }

    /// Parses the whole token stream as a single expression.
    pub(crate) fn parse(mut self) -> Result<Node, ExpressionError> {
        if self.tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let branch = self.parse_sum()?;
        match self.peek() {
            None => Ok(branch.node),
            Some(token) => Err(unexpected(token)),
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.cursor);
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn next_or_end(&mut self) -> Result<&'t Token, ExpressionError> {
        self.advance()
            .ok_or(ExpressionError::UnexpectedEnd { position: self.end })
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ExpressionError> {
        let token = self.next_or_end()?;
        if &token.kind == kind {
            Ok(())
        } else {
            Err(unexpected(token))
        }
    }

    /// Runs `parse` one bracket or call level deeper.
    fn nested<T>(
        &mut self,
        position: usize,
        parse: impl FnOnce(&mut Self) -> Result<T, ExpressionError>,
    ) -> Result<T, ExpressionError> {
        if self.nesting >= MAX_DEPTH {
            return Err(ExpressionError::TooDeep { position });
        }
        self.nesting += 1;
        let parsed = parse(self);
        self.nesting -= 1;
        parsed
    }

    fn parse_sum(&mut self) -> Result<Branch, ExpressionError> {
        let mut branch = self.parse_product()?;
        while let Some((op, position)) = self.take_operator(|kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Subtract),
            _ => None,
        }) {
            let rhs = self.parse_product()?;
            branch = Branch::binary(op, branch, rhs, position)?;
        }
        Ok(branch)
    }

    fn parse_product(&mut self) -> Result<Branch, ExpressionError> {
        let mut branch = self.parse_power()?;
        while let Some((op, position)) = self.take_operator(|kind| match kind {
            TokenKind::Star => Some(BinaryOp::Multiply),
            TokenKind::Slash => Some(BinaryOp::Divide),
            TokenKind::Percent => Some(BinaryOp::Remainder),
            _ => None,
        }) {
            let rhs = self.parse_power()?;
            branch = Branch::binary(op, branch, rhs, position)?;
        }
        Ok(branch)
    }

    fn parse_power(&mut self) -> Result<Branch, ExpressionError> {
        let mut branch = self.parse_signed()?;
        while let Some((op, position)) = self.take_operator(|kind| match kind {
            TokenKind::Caret => Some(BinaryOp::Power),
            _ => None,
        }) {
            let rhs = self.parse_signed()?;
            branch = Branch::binary(op, branch, rhs, position)?;
        }
        Ok(branch)
    }

    fn parse_signed(&mut self) -> Result<Branch, ExpressionError> {
        let mut negate = None::<usize>;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Minus => {
                    negate = if negate.is_some() {
                        None
                    } else {
                        Some(token.position)
                    };
                }
                TokenKind::Plus => {}
                _ => break,
            }
            self.cursor += 1;
        }
        let branch = self.parse_base()?;
        let Some(position) = negate else {
            return Ok(branch);
        };
        Branch::nest(Node::Negate(Box::new(branch.node)), branch.height, position)
    }

    fn parse_base(&mut self) -> Result<Branch, ExpressionError> {
        let token = self.next_or_end()?;
        match &token.kind {
            TokenKind::Number(value) => Ok(Branch::leaf(Node::Constant(*value))),
            TokenKind::LeftParen => {
                let inner = self.nested(token.position, Self::parse_sum)?;
                self.expect(&TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::Identifier(name) => self.parse_identifier(name, token.position),
            _ => Err(unexpected(token)),
        }
    }

    fn parse_identifier(&mut self, name: &str, position: usize) -> Result<Branch, ExpressionError> {
        if name == VARIABLE_NAME {
            return Ok(Branch::leaf(Node::Variable));
        }
        if let Some(value) = constant(name) {
            return Ok(Branch::leaf(Node::Constant(value)));
        }
        if let Some(function) = UnaryFunction::lookup(name) {
            let argument = self.nested(position, Self::parse_signed)?;
            let call = Node::Call {
                function,
                argument: Box::new(argument.node),
            };
            return Branch::nest(call, argument.height, position);
        }
        if let Some(function) = BinaryFunction::lookup(name) {
            let (first, second) = self.nested(position, |parser| {
                parser.expect(&TokenKind::LeftParen)?;
                let first = parser.parse_sum()?;
                parser.expect(&TokenKind::Comma)?;
                let second = parser.parse_sum()?;
                parser.expect(&TokenKind::RightParen)?;
                Ok((first, second))
            })?;
            let child_height = first.height.max(second.height);
            let call = Node::CallPair {
                function,
                first: Box::new(first.node),
                second: Box::new(second.node),
            };
            return Branch::nest(call, child_height, position);
        }
        Err(ExpressionError::UnknownIdentifier {
            name: name.to_owned(),
            position,
        })
    }

    /// Consumes the next token when `classify` maps it to an operator.
    fn take_operator(
        &mut self,
        classify: impl Fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Option<(BinaryOp, usize)> {
        let token = self.peek()?;
        let op = classify(&token.kind)?;
        self.cursor += 1;
        Some((op, token.position))
    }
}

fn unexpected(token: &Token) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        found: token.describe(),
        position: token.position,
    }
}
