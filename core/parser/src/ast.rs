//! FILENAME: core/parser/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for column formulas.
//! CONTEXT: After the Lexer tokenizes a formula template, the Parser converts
//! those tokens into this tree structure. The engine's evaluator then
//! traverses this tree against the live table state.
//!
//! SUPPORTED EXPRESSIONS:
//! - Literals: Numbers, Strings, Booleans
//! - Placeholders: column aggregates, visible row count, single cell values
//! - Binary operations: +, -, *, /, %, ^, &, =, <>, <, >, <=, >=
//! - Unary operations: - (negation)
//! - Function calls: ROUND({{ avg }}, 2), IF({{ rows }} > 0, "yes", "no")

/// Represents a parsed formula expression.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// A literal value: number, string, or boolean.
    Literal(Value),

    /// A `{{ ... }}` reference resolved against the table at evaluation time.
    Placeholder(Placeholder),

    /// A binary operation: left op right (e.g., {{ sum }} / 2).
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    /// A unary operation: op operand (e.g., -5).
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// A function call like ROUND({{ avg }}, 2). Names are uppercase.
    FunctionCall { name: String, args: Vec<Expression> },
}

/// The table values a placeholder can stand for.
/// Column and row ids are kept as written; the engine resolves them.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Placeholder {
    /// `{{ sum }}` (own column) or `{{ 3.sum }}` (column "3").
    Aggregate {
        column: Option<String>,
        stat: Statistic,
    },
    /// `{{ rows }}` or `{{ 3.rows }}`: number of rows in the current view.
    Rows { column: Option<String> },
    /// `{{ cell.<row>.<col>.val }}`: typed value of a single cell.
    Cell { row: String, column: String },
}

/// Running aggregates maintained for numeric columns.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Statistic {
    Avg,
    Max,
    Min,
    Sum,
}

impl Statistic {
    /// Parses a statistic keyword (case-insensitive).
    pub fn from_keyword(keyword: &str) -> Option<Statistic> {
        match keyword.to_ascii_lowercase().as_str() {
            "avg" => Some(Statistic::Avg),
            "max" => Some(Statistic::Max),
            "min" => Some(Statistic::Min),
            "sum" => Some(Statistic::Sum),
            _ => None,
        }
    }
}

/// Literal values that can appear in formulas.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
}

/// Binary operators for expressions.
/// Listed in order of precedence groups (comparison is lowest).
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    // Comparison operators (lowest precedence)
    Equal,        // = or ==
    NotEqual,     // <> or !=
    LessThan,     // <
    GreaterThan,  // >
    LessEqual,    // <=
    GreaterEqual, // >=

    // String concatenation
    Concat, // &

    // Arithmetic operators
    Add,      // + (concatenates when either side is text)
    Subtract, // -
    Multiply, // *
    Divide,   // /
    Modulo,   // %
    Power,    // ^ (highest precedence among binary ops)
}

/// Unary operators.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Negate, // -
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Subtract => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
            BinaryOperator::Modulo => write!(f, "%"),
            BinaryOperator::Power => write!(f, "^"),
            BinaryOperator::Concat => write!(f, "&"),
            BinaryOperator::Equal => write!(f, "="),
            BinaryOperator::NotEqual => write!(f, "<>"),
            BinaryOperator::LessThan => write!(f, "<"),
            BinaryOperator::GreaterThan => write!(f, ">"),
            BinaryOperator::LessEqual => write!(f, "<="),
            BinaryOperator::GreaterEqual => write!(f, ">="),
        }
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statistic::Avg => write!(f, "avg"),
            Statistic::Max => write!(f, "max"),
            Statistic::Min => write!(f, "min"),
            Statistic::Sum => write!(f, "sum"),
        }
    }
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Placeholder::Aggregate { column: None, stat } => write!(f, "{{{{ {} }}}}", stat),
            Placeholder::Aggregate {
                column: Some(col),
                stat,
            } => write!(f, "{{{{ {}.{} }}}}", col, stat),
            Placeholder::Rows { column: None } => write!(f, "{{{{ rows }}}}"),
            Placeholder::Rows { column: Some(col) } => write!(f, "{{{{ {}.rows }}}}", col),
            Placeholder::Cell { row, column } => {
                write!(f, "{{{{ cell.{}.{}.val }}}}", row, column)
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}
