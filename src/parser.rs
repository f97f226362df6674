//! Tokenizer and recursive-descent parser for the restricted expression grammar.
//!
//! ```text
//! expression := term (("+" | "-") term)*
//! term       := unary (("*" | "/") unary)*
//! unary      := ("+" | "-") unary | power
//! power      := primary (("**" | "^") unary)?
//! primary    := number | name | name "(" expression ")" | "(" expression ")"
//! ```
//!
//! Names are resolved while parsing, so a reference to anything outside the
//! allow-list is rejected before the tokenizer looks past it.

use crate::error::{FixedPointError, Result};
use crate::expression::{BinaryOp, Builtin, Node};

/// Longest expression text accepted by [`parse`].
pub const MAX_EXPRESSION_LEN: usize = 1_000;

/// Deepest nesting of parentheses, calls, signs and exponents accepted by [`parse`].
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Token<'a> {
    Number(f64),
    Ident(&'a str),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LeftParen,
    RightParen,
    Comma,
    End,
}

impl Token<'_> {
    fn describe(&self) -> String {
        match self {
            Token::Number(value) => format!("number {value}"),
            Token::Ident(name) => format!("name `{name}`"),
            Token::Plus => "`+`".to_string(),
            Token::Minus => "`-`".to_string(),
            Token::Star => "`*`".to_string(),
            Token::Slash => "`/`".to_string(),
            Token::Power => "`**`".to_string(),
            Token::LeftParen => "`(`".to_string(),
            Token::RightParen => "`)`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::End => "end of input".to_string(),
        }
    }
}

/// Lazy tokenizer over the expression text. Tokens are produced one at a time
/// so that the parser can reject an unknown name before lexing what follows it.
pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.position + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(byte) = self.peek_byte(0) {
            if byte.is_ascii_whitespace() {
                self.position += 1;
            } else {
                break;
            }
        }
    }

    /// Returns the next token together with its starting byte offset.
    pub(crate) fn next_token(&mut self) -> Result<(Token<'a>, usize)> {
        self.skip_whitespace();
        let start = self.position;
        let Some(byte) = self.peek_byte(0) else {
            return Ok((Token::End, start));
        };

        let token = match byte {
            b'+' => self.single(Token::Plus),
            b'-' => self.single(Token::Minus),
            b'/' => self.single(Token::Slash),
            b'^' => self.single(Token::Power),
            b'(' => self.single(Token::LeftParen),
            b')' => self.single(Token::RightParen),
            b',' => self.single(Token::Comma),
            b'*' => {
                if self.peek_byte(1) == Some(b'*') {
                    self.position += 2;
                    Token::Power
                } else {
                    self.single(Token::Star)
                }
            }
            b'0'..=b'9' | b'.' => self.number()?,
            other if other.is_ascii_alphabetic() || other == b'_' => self.identifier(),
            _ => {
                let found = self.input[start..].chars().next().unwrap_or('?');
                return Err(FixedPointError::syntax(
                    start,
                    format!("unexpected character `{found}`"),
                ));
            }
        };

        Ok((token, start))
    }

    fn single(&mut self, token: Token<'a>) -> Token<'a> {
        self.position += 1;
        token
    }

    fn consume_digits(&mut self) -> usize {
        let mut count = 0;
        while matches!(self.peek_byte(0), Some(b'0'..=b'9')) {
            self.position += 1;
            count += 1;
        }
        count
    }

    fn number(&mut self) -> Result<Token<'a>> {
        let start = self.position;
        let mut digits = self.consume_digits();
        if self.peek_byte(0) == Some(b'.') {
            self.position += 1;
            digits += self.consume_digits();
        }
        if digits == 0 {
            return Err(FixedPointError::syntax(start, "unexpected character `.`"));
        }

        // Only consume an exponent when digits follow; `2e` is left for the
        // parser to reject as a number followed by a name.
        if matches!(self.peek_byte(0), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_byte(1), Some(b'+' | b'-')));
            if matches!(self.peek_byte(1 + sign), Some(b'0'..=b'9')) {
                self.position += 1 + sign;
                self.consume_digits();
            }
        }

        let text = &self.input[start..self.position];
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| FixedPointError::syntax(start, format!("invalid number `{text}`")))
    }

    fn identifier(&mut self) -> Token<'a> {
        let start = self.position;
        while matches!(self.peek_byte(0), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.position += 1;
        }
        Token::Ident(&self.input[start..self.position])
    }
}

/// A resolved name.
enum Symbol {
    Variable,
    Constant(f64),
    Function(Builtin),
}

fn resolve(name: &str) -> Result<Symbol> {
    match name {
        "x" => Ok(Symbol::Variable),
        "pi" => Ok(Symbol::Constant(std::f64::consts::PI)),
        "e" => Ok(Symbol::Constant(std::f64::consts::E)),
        _ => Builtin::from_name(name)
            .map(Symbol::Function)
            .ok_or_else(|| FixedPointError::UndefinedSymbol {
                name: name.to_string(),
            }),
    }
}

struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    current: Token<'a>,
    position: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        let mut tokenizer = Tokenizer::new(input);
        let (current, position) = tokenizer.next_token()?;
        Ok(Self {
            tokenizer,
            current,
            position,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<()> {
        let (token, position) = self.tokenizer.next_token()?;
        self.current = token;
        self.position = position;
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> FixedPointError {
        FixedPointError::syntax(
            self.position,
            format!("expected {expected}, found {}", self.current.describe()),
        )
    }

    fn expect(&mut self, token: Token<'a>, expected: &str) -> Result<()> {
        if self.current == token {
            self.advance()
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expression(&mut self) -> Result<Node> {
        let mut node = self.term()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(node),
            };
            self.advance()?;
            let rhs = self.term()?;
            node = Node::binary(op, node, rhs);
        }
    }

    fn term(&mut self) -> Result<Node> {
        let mut node = self.unary()?;
        loop {
            let op = match self.current {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Ok(node),
            };
            self.advance()?;
            let rhs = self.unary()?;
            node = Node::binary(op, node, rhs);
        }
    }

    // Every nested construct re-enters the grammar here, so this is where
    // recursion depth is bounded.
    fn unary(&mut self) -> Result<Node> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(FixedPointError::syntax(
                self.position,
                "expression nested too deeply",
            ));
        }
        self.depth += 1;
        let node = self.signed();
        self.depth -= 1;
        node
    }

    fn signed(&mut self) -> Result<Node> {
        match self.current {
            Token::Minus => {
                self.advance()?;
                Ok(Node::Negate(Box::new(self.unary()?)))
            }
            Token::Plus => {
                self.advance()?;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Node> {
        let base = self.primary()?;
        if self.current == Token::Power {
            self.advance()?;
            // Right-associative, and the exponent may carry its own sign: 2**-x**2.
            let exponent = self.unary()?;
            return Ok(Node::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Node> {
        match self.current {
            Token::Number(value) => {
                self.advance()?;
                Ok(Node::Number(value))
            }
            Token::LeftParen => {
                self.advance()?;
                let inner = self.expression()?;
                self.expect(Token::RightParen, "`)`")?;
                Ok(inner)
            }
            Token::Ident(name) => {
                let symbol = resolve(name)?;
                let name_position = self.position;
                self.advance()?;
                match symbol {
                    Symbol::Function(function) => self.call(function),
                    _ if self.current == Token::LeftParen => Err(FixedPointError::syntax(
                        name_position,
                        format!("`{name}` is not callable"),
                    )),
                    Symbol::Variable => Ok(Node::Variable),
                    Symbol::Constant(value) => Ok(Node::Number(value)),
                }
            }
            _ => Err(self.unexpected("a number, name or `(`")),
        }
    }

    fn call(&mut self, function: Builtin) -> Result<Node> {
        if self.current != Token::LeftParen {
            return Err(self.unexpected(&format!("`(` after `{}`", function.name())));
        }
        self.advance()?;
        let argument = self.expression()?;
        if self.current == Token::Comma {
            return Err(FixedPointError::syntax(
                self.position,
                format!("`{}` takes exactly one argument", function.name()),
            ));
        }
        self.expect(Token::RightParen, "`)`")?;
        Ok(Node::Call {
            function,
            argument: Box::new(argument),
        })
    }
}

/// Parses expression text into a syntax tree.
pub(crate) fn parse(input: &str) -> Result<Node> {
    if input.len() > MAX_EXPRESSION_LEN {
        return Err(FixedPointError::syntax(
            MAX_EXPRESSION_LEN,
            format!("expression is longer than {MAX_EXPRESSION_LEN} bytes"),
        ));
    }
    if input.trim().is_empty() {
        return Err(FixedPointError::syntax(0, "empty expression"));
    }

    let mut parser = Parser::new(input)?;
    let node = parser.expression()?;
    if parser.current != Token::End {
        return Err(parser.unexpected("an operator or end of input"));
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        let mut tokenizer = Tokenizer::new(input);
        let mut out = Vec::new();
        loop {
            let (token, _) = tokenizer.next_token().unwrap();
            if token == Token::End {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn tokenizes_scientific_literals_and_power() {
        assert_eq!(
            tokens("1.5e-3*x**2 ^ .5"),
            vec![
                Token::Number(1.5e-3),
                Token::Star,
                Token::Ident("x"),
                Token::Power,
                Token::Number(2.0),
                Token::Power,
                Token::Number(0.5),
            ]
        );
    }

    #[test]
    fn exponent_without_digits_is_not_consumed() {
        assert_eq!(tokens("2e"), vec![Token::Number(2.0), Token::Ident("e")]);
        assert!(matches!(parse("2e"), Err(FixedPointError::Syntax { .. })));
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let parens = format!("{}x{}", "(".repeat(499), ")".repeat(499));
        assert!(parens.len() < MAX_EXPRESSION_LEN);
        assert!(matches!(parse(&parens), Err(FixedPointError::Syntax { .. })));

        let signs = format!("{}x", "-".repeat(200));
        assert!(matches!(parse(&signs), Err(FixedPointError::Syntax { .. })));

        let calls = format!("{}x{}", "sin(".repeat(100), ")".repeat(100));
        assert!(matches!(parse(&calls), Err(FixedPointError::Syntax { .. })));

        let towers = format!("x{}", "**x".repeat(100));
        assert!(matches!(parse(&towers), Err(FixedPointError::Syntax { .. })));
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let depth = MAX_NESTING_DEPTH - 1;
        let text = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse(&text).unwrap(), Node::Variable);
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        let node = parse("-x**2").unwrap();
        assert!(matches!(node, Node::Negate(_)));
    }

    #[test]
    fn power_is_right_associative() {
        match parse("2**3**2").unwrap() {
            Node::Binary { op, rhs, .. } => {
                assert_eq!(op, BinaryOp::Pow);
                assert!(matches!(*rhs, Node::Binary { op: BinaryOp::Pow, .. }));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn reports_offset_of_unbalanced_paren() {
        let err = parse("cos(x").unwrap_err();
        assert_eq!(
            err,
            FixedPointError::syntax(5, "expected `)`, found end of input")
        );
    }

    #[test]
    fn unknown_name_is_rejected_before_the_rest_is_lexed() {
        let err = parse("np.cos(x)").unwrap_err();
        assert_eq!(
            err,
            FixedPointError::UndefinedSymbol {
                name: "np".to_string()
            }
        );
    }

    #[test]
    fn rejects_calls_on_non_functions_and_extra_arguments() {
        assert!(matches!(parse("x(2)"), Err(FixedPointError::Syntax { .. })));
        assert!(matches!(parse("pi(2)"), Err(FixedPointError::Syntax { .. })));
        assert!(matches!(parse("sin"), Err(FixedPointError::Syntax { .. })));
        assert!(matches!(parse("sin(x, 2)"), Err(FixedPointError::Syntax { .. })));
    }

    #[test]
    fn rejects_empty_and_oversized_input() {
        assert!(matches!(parse("   "), Err(FixedPointError::Syntax { .. })));
        let long = "x+".repeat(MAX_EXPRESSION_LEN) + "x";
        assert!(matches!(parse(&long), Err(FixedPointError::Syntax { .. })));
    }
}
