//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Turns a column formula template into an `Expression` tree.
//! CONTEXT: Columns compile their template once at definition time; the tree
//! is then evaluated on every `count cols` against the live table.
//!
//! GRAMMAR:
//!   expression     --> comparison
//!   comparison     --> concatenation ( ("=" | "<>" | "<" | ">" | "<=" | ">=") concatenation )*
//!   concatenation  --> additive ( "&" additive )*
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/" | "%") unary )*
//!   unary          --> "-" unary | power
//!   power          --> primary ( "^" unary )?
//!   primary        --> NUMBER | STRING | BOOLEAN | PLACEHOLDER | function_call | "(" expression ")"
//!   function_call  --> IDENTIFIER "(" arguments? ")"
//!   arguments      --> expression ("," expression)*
//!
//! PLACEHOLDER BODIES:
//!   stat                      --> "avg" | "max" | "min" | "sum"
//!   body                      --> stat | "rows" | COL "." stat | COL ".rows"
//!                               | "cell" "." ROW "." COL ".val"

use crate::ast::{BinaryOperator, Expression, Placeholder, Statistic, UnaryOperator, Value};
use crate::lexer::Lexer;
use crate::token::Token;

/// Why a template failed to compile. The column reports `#PARSE!`.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive descent over one formula template.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    /// Parses the whole template. Blank templates and leftover tokens are errors.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty expression"));
        }

        let expr = self.parse_comparison()?;

        if self.current_token != Token::EOF {
            return Err(ParseError::new(format!(
                "Unexpected {} after expression",
                self.current_token
            )));
        }

        Ok(expr)
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Consumes `expected` or fails naming what was found instead.
    fn consume(&mut self, expected: Token) -> ParseResult<()> {
        if self.current_token != expected {
            return Err(ParseError::new(format!(
                "Expected {}, found {}",
                expected, self.current_token
            )));
        }
        self.advance();
        Ok(())
    }

    /// One left-associative precedence level: operands come from `operand`,
    /// and `operator` says which tokens bind at this level.
    fn binary_level(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expression>,
        operator: fn(&Token) -> Option<BinaryOperator>,
    ) -> ParseResult<Expression> {
        let mut left = operand(self)?;

        while let Some(op) = operator(&self.current_token) {
            self.advance();
            let right = operand(self)?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// `{{ max }} >= 10`: comparisons bind loosest, so IF conditions need no parentheses.
    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        self.binary_level(Self::parse_concatenation, comparison_operator)
    }

    /// `'Total: ' & {{ sum }}`
    fn parse_concatenation(&mut self) -> ParseResult<Expression> {
        self.binary_level(Self::parse_additive, |t| {
            (*t == Token::Ampersand).then_some(BinaryOperator::Concat)
        })
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        self.binary_level(Self::parse_multiplicative, |t| match t {
            Token::Plus => Some(BinaryOperator::Add),
            Token::Minus => Some(BinaryOperator::Subtract),
            _ => None,
        })
    }

    /// `{{ sum }} / {{ rows }}`, `{{ 2.max }} % 7`
    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        self.binary_level(Self::parse_unary, |t| match t {
            Token::Asterisk => Some(BinaryOperator::Multiply),
            Token::Slash => Some(BinaryOperator::Divide),
            Token::Percent => Some(BinaryOperator::Modulo),
            _ => None,
        })
    }

    /// A leading minus negates a whole power term: `-{{ min }} ^ 2` is `-({{ min }} ^ 2)`.
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        if self.current_token != Token::Minus {
            return self.parse_power();
        }
        self.advance();
        Ok(Expression::UnaryOp {
            op: UnaryOperator::Negate,
            operand: Box::new(self.parse_unary()?),
        })
    }

    /// The exponent may itself be negated (`{{ avg }} ^ -1`).
    fn parse_power(&mut self) -> ParseResult<Expression> {
        let base = self.parse_primary()?;
        if self.current_token != Token::Caret {
            return Ok(base);
        }
        self.advance();
        Ok(Expression::BinaryOp {
            left: Box::new(base),
            op: BinaryOperator::Power,
            right: Box::new(self.parse_unary()?),
        })
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let token = self.current_token.clone();
        match token {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Literal(Value::Number(n)))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::Literal(Value::String(s)))
            }
            Token::Boolean(b) => {
                self.advance();
                Ok(Expression::Literal(Value::Boolean(b)))
            }
            Token::Placeholder(body) => {
                self.advance();
                parse_placeholder(&body).map(Expression::Placeholder)
            }
            // A bare word is only meaningful as a function name: `sum` must be written `{{ sum }}`.
            Token::Identifier(name) => {
                self.advance();
                if self.current_token != Token::LParen {
                    return Err(ParseError::new(format!("Unknown identifier: {}", name)));
                }
                self.advance();
                let args = self.parse_arguments()?;
                Ok(Expression::FunctionCall { name, args })
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_comparison()?;
                self.consume(Token::RParen)?;
                Ok(inner)
            }
            Token::EOF => Err(ParseError::new("Unexpected end of expression")),
            Token::Illegal('{') => Err(ParseError::new("Unterminated placeholder")),
            Token::Illegal(ch) => Err(ParseError::new(format!("Illegal character: {}", ch))),
            other => Err(ParseError::new(format!("Unexpected {}", other))),
        }
    }

    /// Comma-separated arguments after the opening parenthesis, through the closing one.
    fn parse_arguments(&mut self) -> ParseResult<Vec<Expression>> {
        let mut args = Vec::new();
        if self.current_token == Token::RParen {
            self.advance();
            return Ok(args);
        }

        loop {
            args.push(self.parse_comparison()?);
            if self.current_token != Token::Comma {
                break;
            }
            self.advance();
        }

        self.consume(Token::RParen)?;
        Ok(args)
    }
}

fn comparison_operator(token: &Token) -> Option<BinaryOperator> {
    match token {
        Token::Equals => Some(BinaryOperator::Equal),
        Token::NotEqual => Some(BinaryOperator::NotEqual),
        Token::LessThan => Some(BinaryOperator::LessThan),
        Token::GreaterThan => Some(BinaryOperator::GreaterThan),
        Token::LessEqual => Some(BinaryOperator::LessEqual),
        Token::GreaterEqual => Some(BinaryOperator::GreaterEqual),
        _ => None,
    }
}

/// Parses the body of a `{{ ... }}` placeholder (without the braces).
pub fn parse_placeholder(body: &str) -> ParseResult<Placeholder> {
    let segments: Vec<&str> = body.trim().split('.').map(str::trim).collect();

    if segments.iter().any(|s| s.is_empty()) {
        return Err(ParseError::new(format!("Malformed placeholder: {{{{ {} }}}}", body)));
    }

    match segments.as_slice() {
        [word] if word.eq_ignore_ascii_case("rows") => Ok(Placeholder::Rows { column: None }),
        [word] => match Statistic::from_keyword(word) {
            Some(stat) => Ok(Placeholder::Aggregate { column: None, stat }),
            None => Err(ParseError::new(format!("Unknown placeholder: {}", word))),
        },
        [col, word] if word.eq_ignore_ascii_case("rows") => Ok(Placeholder::Rows {
            column: Some(col.to_string()),
        }),
        [col, word] => match Statistic::from_keyword(word) {
            Some(stat) => Ok(Placeholder::Aggregate {
                column: Some(col.to_string()),
                stat,
            }),
            None => Err(ParseError::new(format!("Unknown column statistic: {}", word))),
        },
        [head, row, col, tail]
            if head.eq_ignore_ascii_case("cell") && tail.eq_ignore_ascii_case("val") =>
        {
            Ok(Placeholder::Cell {
                row: row.to_string(),
                column: col.to_string(),
            })
        }
        _ => Err(ParseError::new(format!("Unknown placeholder: {}", body.trim()))),
    }
}

/// Parses a column formula template.
pub fn parse(input: &str) -> ParseResult<Expression> {
    Parser::new(input).parse()
}
