//! FILENAME: core/parser/src/token.rs
//! PURPOSE: Lexical units of a column formula template.
//! CONTEXT: A template such as `ROUND({{ sum }} / {{ rows }}, 2)` is split
//! into placeholders, literals, function names and operator symbols. The
//! placeholder body is kept as raw text; `parse_placeholder` decodes it.

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Number(f64),
    /// Quoted text, quotes removed and doubled quotes collapsed.
    String(String),
    /// `TRUE` / `FALSE`, any case.
    Boolean(bool),
    /// Function name, uppercased.
    Identifier(String),
    /// Body of a `{{ ... }}` placeholder, trimmed of surrounding whitespace.
    Placeholder(String),

    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Caret,
    Ampersand,
    /// `=` or `==`
    Equals,
    /// `<>` or `!=`
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    LParen,
    RParen,
    Comma,

    EOF,
    /// A character no token starts with, or an unterminated `{{`.
    Illegal(char),
}

impl Token {
    /// Fixed spelling of symbol tokens; `None` for tokens carrying data.
    pub fn symbol(&self) -> Option<&'static str> {
        let s = match self {
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Asterisk => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Caret => "^",
            Token::Ampersand => "&",
            Token::Equals => "=",
            Token::NotEqual => "<>",
            Token::LessThan => "<",
            Token::GreaterThan => ">",
            Token::LessEqual => "<=",
            Token::GreaterEqual => ">=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::EOF => "end of formula",
            _ => return None,
        };
        Some(s)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(symbol) = self.symbol() {
            return f.write_str(symbol);
        }
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Placeholder(body) => write!(f, "{{{{ {} }}}}", body),
            Token::Illegal(c) => write!(f, "'{}'", c),
            _ => Ok(()),
        }
    }
}
