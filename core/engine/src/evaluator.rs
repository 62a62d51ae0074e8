//! FILENAME: core/engine/src/evaluator.rs
//! PURPOSE: Evaluates column formulas against the live table.
//! CONTEXT: Formulas are parsed once when columns are defined; this module
//! walks the AST on every `count cols` request. Placeholders read running
//! totals, the length of the current view, or single cells.
//!
//! SUPPORTED FEATURES:
//! - Literal evaluation: Numbers, Strings, Booleans
//! - Placeholders: {{ sum }}, {{ 3.avg }}, {{ rows }}, {{ cell.2.3.val }}
//! - Binary operations: +, -, *, /, %, ^, &, =, <>, <, >, <=, >=
//! - Unary operations: - (negation)
//! - Functions: ABS, ROUND, FLOOR, CEILING, MIN, MAX, IF, CONCATENATE,
//!              UPPER, LOWER, LEN

use crate::aggregate::Totals;
use crate::cell::{format_number, CellValue};
use crate::column::{Column, ColumnRegistry};
use crate::id::{ColumnId, RowId};
use crate::store::RowStore;
use parser::{BinaryOperator, Expression, Placeholder, UnaryOperator, Value};
use serde::{Serialize, Serializer};

/// Error values a formula can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaError {
    Div0,  // Division by zero
    Value, // Wrong type of argument
    Ref,   // Unknown column, or a column without totals
    Name,  // Unknown function name
    Parse, // Formula parsing error
}

impl FormulaError {
    pub fn code(self) -> &'static str {
        match self {
            FormulaError::Div0 => "#DIV/0!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Ref => "#REF!",
            FormulaError::Name => "#NAME?",
            FormulaError::Parse => "#PARSE!",
        }
    }
}

/// The result of evaluating an expression.
/// Serializes as a plain JSON number, string or boolean; errors as their code.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(FormulaError),
}

impl EvalResult {
    /// Attempts to coerce the result to a number.
    /// Returns None if coercion is not possible.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            EvalResult::Number(n) => Some(*n),
            EvalResult::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            EvalResult::Text(s) => s.trim().parse::<f64>().ok(),
            EvalResult::Error(_) => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            EvalResult::Boolean(b) => Some(*b),
            EvalResult::Number(n) => Some(*n != 0.0),
            EvalResult::Text(s) => match s.to_uppercase().as_str() {
                "TRUE" => Some(true),
                "FALSE" => Some(false),
                _ => None,
            },
            EvalResult::Error(_) => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            EvalResult::Number(n) => format_number(*n),
            EvalResult::Text(s) => s.clone(),
            EvalResult::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            EvalResult::Error(e) => e.code().to_string(),
        }
    }

    fn from_cell(value: &CellValue) -> EvalResult {
        match value {
            CellValue::Empty => EvalResult::Number(0.0),
            CellValue::Number(n) => EvalResult::Number(*n),
            CellValue::Text(s) => EvalResult::Text(s.clone()),
        }
    }
}

impl Serialize for EvalResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EvalResult::Number(n) => serializer.serialize_f64(*n),
            EvalResult::Text(s) => serializer.serialize_str(s),
            EvalResult::Boolean(b) => serializer.serialize_bool(*b),
            EvalResult::Error(e) => serializer.serialize_str(e.code()),
        }
    }
}

/// Read-only view of the table state formulas can reach.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub columns: &'a ColumnRegistry,
    pub rows: &'a RowStore,
    pub totals: &'a Totals,
}

/// The formula evaluator for a single column.
pub struct Evaluator<'a> {
    ctx: EvalContext<'a>,
    /// Column the formula belongs to; bare `{{ sum }}` refers to it.
    current: ColumnId,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: EvalContext<'a>, current: ColumnId) -> Self {
        Evaluator { ctx, current }
    }

    /// Evaluates the compiled formula of `column`.
    /// A column without formula evaluates to an empty string.
    pub fn evaluate_column(ctx: EvalContext<'a>, column: &Column) -> EvalResult {
        match column.compiled_formula() {
            None => EvalResult::Text(String::new()),
            Some(Err(_)) => EvalResult::Error(FormulaError::Parse),
            Some(Ok(expr)) => Evaluator::new(ctx, column.id).evaluate(expr),
        }
    }

    /// Evaluates an expression and returns the result.
    pub fn evaluate(&self, expr: &Expression) -> EvalResult {
        match expr {
            Expression::Literal(value) => self.eval_literal(value),
            Expression::Placeholder(placeholder) => self.eval_placeholder(placeholder),
            Expression::BinaryOp { left, op, right } => self.eval_binary_op(left, op, right),
            Expression::UnaryOp { op, operand } => self.eval_unary_op(op, operand),
            Expression::FunctionCall { name, args } => self.eval_function(name, args),
        }
    }

    fn eval_literal(&self, value: &Value) -> EvalResult {
        match value {
            Value::Number(n) => EvalResult::Number(*n),
            Value::String(s) => EvalResult::Text(s.clone()),
            Value::Boolean(b) => EvalResult::Boolean(*b),
        }
    }

    // ==================== Placeholders ====================

    fn eval_placeholder(&self, placeholder: &Placeholder) -> EvalResult {
        match placeholder {
            Placeholder::Aggregate { column, stat } => {
                let id = match column {
                    None => Some(self.current),
                    Some(key) => self.ctx.columns.lookup(key).map(|c| c.id),
                };
                match id.and_then(|id| self.ctx.totals.get(id)) {
                    Some(acc) => EvalResult::Number(acc.compute(*stat)),
                    None => EvalResult::Error(FormulaError::Ref),
                }
            }
            // Every column sees the same view, so the column prefix is informational.
            Placeholder::Rows { .. } => EvalResult::Number(self.ctx.rows.order().len() as f64),
            Placeholder::Cell { row, column } => {
                let (Some(row), Some(column)) = (RowId::parse(row), ColumnId::parse(column)) else {
                    return EvalResult::Error(FormulaError::Ref);
                };
                self.ctx
                    .rows
                    .cell(row, column)
                    .map_or(EvalResult::Number(0.0), |cell| EvalResult::from_cell(&cell.value))
            }
        }
    }

    // ==================== Operators ====================

    fn eval_binary_op(&self, left: &Expression, op: &BinaryOperator, right: &Expression) -> EvalResult {
        let left_val = self.evaluate(left);
        let right_val = self.evaluate(right);

        // Propagate errors
        if let EvalResult::Error(e) = left_val {
            return EvalResult::Error(e);
        }
        if let EvalResult::Error(e) = right_val {
            return EvalResult::Error(e);
        }

        match op {
            BinaryOperator::Add => self.eval_add(&left_val, &right_val),
            BinaryOperator::Subtract => numeric(&left_val, &right_val, |l, r| l - r),
            BinaryOperator::Multiply => numeric(&left_val, &right_val, |l, r| l * r),
            BinaryOperator::Divide => self.eval_divide(&left_val, &right_val),
            BinaryOperator::Modulo => self.eval_modulo(&left_val, &right_val),
            BinaryOperator::Power => self.eval_power(&left_val, &right_val),
            BinaryOperator::Concat => {
                EvalResult::Text(format!("{}{}", left_val.as_text(), right_val.as_text()))
            }
            BinaryOperator::Equal => EvalResult::Boolean(values_equal(&left_val, &right_val)),
            BinaryOperator::NotEqual => EvalResult::Boolean(!values_equal(&left_val, &right_val)),
            BinaryOperator::LessThan => compare(&left_val, &right_val, |o| o.is_lt()),
            BinaryOperator::GreaterThan => compare(&left_val, &right_val, |o| o.is_gt()),
            BinaryOperator::LessEqual => compare(&left_val, &right_val, |o| o.is_le()),
            BinaryOperator::GreaterEqual => compare(&left_val, &right_val, |o| o.is_ge()),
        }
    }

    /// `+` joins text when either side is text, otherwise adds.
    fn eval_add(&self, left: &EvalResult, right: &EvalResult) -> EvalResult {
        if matches!(left, EvalResult::Text(_)) || matches!(right, EvalResult::Text(_)) {
            return EvalResult::Text(format!("{}{}", left.as_text(), right.as_text()));
        }
        numeric(left, right, |l, r| l + r)
    }

    fn eval_divide(&self, left: &EvalResult, right: &EvalResult) -> EvalResult {
        match (left.as_number(), right.as_number()) {
            (Some(_), Some(r)) if r == 0.0 => EvalResult::Error(FormulaError::Div0),
            (Some(l), Some(r)) => EvalResult::Number(l / r),
            _ => EvalResult::Error(FormulaError::Value),
        }
    }

    fn eval_modulo(&self, left: &EvalResult, right: &EvalResult) -> EvalResult {
        match (left.as_number(), right.as_number()) {
            (Some(_), Some(r)) if r == 0.0 => EvalResult::Error(FormulaError::Div0),
            (Some(l), Some(r)) => EvalResult::Number(l % r),
            _ => EvalResult::Error(FormulaError::Value),
        }
    }

    fn eval_power(&self, left: &EvalResult, right: &EvalResult) -> EvalResult {
        match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => {
                let result = l.powf(r);
                if result.is_nan() || result.is_infinite() {
                    EvalResult::Error(FormulaError::Value)
                } else {
                    EvalResult::Number(result)
                }
            }
            _ => EvalResult::Error(FormulaError::Value),
        }
    }

    fn eval_unary_op(&self, op: &UnaryOperator, operand: &Expression) -> EvalResult {
        let val = self.evaluate(operand);

        if let EvalResult::Error(e) = val {
            return EvalResult::Error(e);
        }

        match op {
            UnaryOperator::Negate => match val.as_number() {
                Some(n) => EvalResult::Number(-n),
                None => EvalResult::Error(FormulaError::Value),
            },
        }
    }

    // ==================== Functions ====================

    fn eval_function(&self, name: &str, args: &[Expression]) -> EvalResult {
        match name.to_uppercase().as_str() {
            "ABS" => self.fn_unary_math(args, f64::abs),
            "ROUND" => self.fn_round(args),
            "FLOOR" => self.fn_unary_math(args, f64::floor),
            "CEILING" => self.fn_unary_math(args, f64::ceil),
            "MIN" => self.fn_fold(args, f64::min),
            "MAX" => self.fn_fold(args, f64::max),
            "IF" => self.fn_if(args),
            "CONCATENATE" => self.fn_concatenate(args),
            "UPPER" => self.fn_text(args, |s| EvalResult::Text(s.to_uppercase())),
            "LOWER" => self.fn_text(args, |s| EvalResult::Text(s.to_lowercase())),
            "LEN" => self.fn_text(args, |s| EvalResult::Number(s.chars().count() as f64)),
            _ => EvalResult::Error(FormulaError::Name),
        }
    }

    /// Evaluates a single numeric argument.
    fn single_number(&self, args: &[Expression]) -> Result<f64, FormulaError> {
        let [arg] = args else {
            return Err(FormulaError::Value);
        };
        match self.evaluate(arg) {
            EvalResult::Error(e) => Err(e),
            other => other.as_number().ok_or(FormulaError::Value),
        }
    }

    fn fn_unary_math(&self, args: &[Expression], f: fn(f64) -> f64) -> EvalResult {
        match self.single_number(args) {
            Ok(n) => EvalResult::Number(f(n)),
            Err(e) => EvalResult::Error(e),
        }
    }

    fn fn_round(&self, args: &[Expression]) -> EvalResult {
        if args.is_empty() || args.len() > 2 {
            return EvalResult::Error(FormulaError::Value);
        }

        let num = match self.single_number(&args[..1]) {
            Ok(n) => n,
            Err(e) => return EvalResult::Error(e),
        };

        let digits = if args.len() == 2 {
            match self.single_number(&args[1..]) {
                Ok(d) => d as i32,
                Err(e) => return EvalResult::Error(e),
            }
        } else {
            0
        };

        let multiplier = 10_f64.powi(digits);
        EvalResult::Number((num * multiplier).round() / multiplier)
    }

    fn fn_fold(&self, args: &[Expression], f: fn(f64, f64) -> f64) -> EvalResult {
        let mut acc: Option<f64> = None;
        for arg in args {
            match self.evaluate(arg) {
                EvalResult::Error(e) => return EvalResult::Error(e),
                val => match val.as_number() {
                    Some(n) => acc = Some(acc.map_or(n, |a| f(a, n))),
                    None => return EvalResult::Error(FormulaError::Value),
                },
            }
        }
        EvalResult::Number(acc.unwrap_or(0.0))
    }

    fn fn_if(&self, args: &[Expression]) -> EvalResult {
        if args.len() < 2 || args.len() > 3 {
            return EvalResult::Error(FormulaError::Value);
        }

        let condition = self.evaluate(&args[0]);
        if let EvalResult::Error(e) = condition {
            return EvalResult::Error(e);
        }

        if condition.as_boolean().unwrap_or(false) {
            self.evaluate(&args[1])
        } else if args.len() == 3 {
            self.evaluate(&args[2])
        } else {
            EvalResult::Boolean(false)
        }
    }

    fn fn_concatenate(&self, args: &[Expression]) -> EvalResult {
        let mut result = String::new();

        for arg in args {
            let val = self.evaluate(arg);
            if let EvalResult::Error(e) = val {
                return EvalResult::Error(e);
            }
            result.push_str(&val.as_text());
        }

        EvalResult::Text(result)
    }

    fn fn_text(&self, args: &[Expression], f: impl Fn(&str) -> EvalResult) -> EvalResult {
        let [arg] = args else {
            return EvalResult::Error(FormulaError::Value);
        };
        match self.evaluate(arg) {
            EvalResult::Error(e) => EvalResult::Error(e),
            val => f(&val.as_text()),
        }
    }
}

fn numeric(left: &EvalResult, right: &EvalResult, f: impl Fn(f64, f64) -> f64) -> EvalResult {
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => EvalResult::Number(f(l, r)),
        _ => EvalResult::Error(FormulaError::Value),
    }
}

fn values_equal(left: &EvalResult, right: &EvalResult) -> bool {
    match (left, right) {
        (EvalResult::Number(l), EvalResult::Number(r)) => (l - r).abs() < f64::EPSILON,
        (EvalResult::Text(l), EvalResult::Text(r)) => l.to_uppercase() == r.to_uppercase(),
        (EvalResult::Boolean(l), EvalResult::Boolean(r)) => l == r,
        // Cross-type comparisons
        (EvalResult::Number(n), EvalResult::Text(s)) | (EvalResult::Text(s), EvalResult::Number(n)) => {
            s.trim().parse::<f64>().map_or(false, |parsed| (parsed - n).abs() < f64::EPSILON)
        }
        _ => false,
    }
}

/// Numbers compare numerically, text case-insensitively; anything else is #VALUE!.
fn compare(left: &EvalResult, right: &EvalResult, test: fn(std::cmp::Ordering) -> bool) -> EvalResult {
    match (left, right) {
        (EvalResult::Text(l), EvalResult::Text(r)) => {
            EvalResult::Boolean(test(l.to_uppercase().cmp(&r.to_uppercase())))
        }
        _ => match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => match l.partial_cmp(&r) {
                Some(ordering) => EvalResult::Boolean(test(ordering)),
                None => EvalResult::Error(FormulaError::Value),
            },
            _ => EvalResult::Error(FormulaError::Value),
        },
    }
}
