// policyguard-core/src/domain/rules/expr.rs
//
// Scoped boolean expression language for rule conditions. LLM-produced
// conditions are pandas-eval flavored ("Amount_Received > 10000 and
// Payment_Format == 'Cash'"), so the grammar accepts exactly that dialect:
// column references, literals, arithmetic, comparisons, and/or/not plus the
// `&`/`|`/`~` spellings. Nothing else — no function calls, no indexing, no
// dynamic code execution.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::domain::table::{TransactionTable, Value};

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("empty condition")]
    Empty,

    #[error("syntax error at offset {pos}: {msg}")]
    Syntax { pos: usize, msg: String },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone)]
enum Expr {
    Literal(Value),
    Column(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

// --- LEXER ---

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    let syntax = |pos: usize, msg: &str| ExprError::Syntax {
        pos,
        msg: msg.to_string(),
    };

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            '+' => {
                tokens.push((i, Token::Plus));
                i += 1;
            }
            '-' => {
                tokens.push((i, Token::Minus));
                i += 1;
            }
            '*' => {
                tokens.push((i, Token::Star));
                i += 1;
            }
            '/' => {
                tokens.push((i, Token::Slash));
                i += 1;
            }
            '&' => {
                tokens.push((i, Token::And));
                i += 1;
            }
            '|' => {
                tokens.push((i, Token::Or));
                i += 1;
            }
            '~' => {
                tokens.push((i, Token::Not));
                i += 1;
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push((i, Token::Eq));
                    i += 2;
                } else {
                    return Err(syntax(i, "expected '==' (single '=' is not supported)"));
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push((i, Token::Ne));
                    i += 2;
                } else {
                    return Err(syntax(i, "expected '!='"));
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push((i, Token::Le));
                    i += 2;
                } else {
                    tokens.push((i, Token::Lt));
                    i += 1;
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push((i, Token::Ge));
                    i += 2;
                } else {
                    tokens.push((i, Token::Gt));
                    i += 1;
                }
            }
            '\'' | '"' => {
                let quote = c;
                let start = i;
                i += 1;
                let content_start = i;
                while i < bytes.len() && bytes[i] as char != quote {
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(syntax(start, "unterminated string literal"));
                }
                tokens.push((start, Token::Str(input[content_start..i].to_string())));
                i += 1;
            }
            '0'..='9' => {
                let start = i;
                let mut is_float = false;
                while i < bytes.len() {
                    match bytes[i] as char {
                        '0'..='9' => i += 1,
                        '.' if !is_float => {
                            is_float = true;
                            i += 1;
                        }
                        _ => break,
                    }
                }
                let text = &input[start..i];
                if is_float {
                    let f = text
                        .parse::<f64>()
                        .map_err(|_| syntax(start, "invalid number"))?;
                    tokens.push((start, Token::Float(f)));
                } else if let Ok(n) = text.parse::<i64>() {
                    tokens.push((start, Token::Int(n)));
                } else {
                    // Too large for i64; keep the value as a float.
                    let f = text
                        .parse::<f64>()
                        .map_err(|_| syntax(start, "invalid number"))?;
                    tokens.push((start, Token::Float(f)));
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    // Dots are allowed so columns like `Account.1` resolve.
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let word = &input[start..i];
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::True,
                    "false" => Token::False,
                    _ => Token::Ident(word.to_string()),
                };
                tokens.push((start, token));
            }
            _ => {
                return Err(syntax(i, &format!("unexpected character '{}'", c)));
            }
        }
    }

    Ok(tokens)
}

// --- PARSER (Pratt) ---

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn err_here(&self, msg: &str) -> ExprError {
        let pos = self
            .tokens
            .get(self.pos)
            .map(|(p, _)| *p)
            .unwrap_or(self.input_len);
        ExprError::Syntax {
            pos,
            msg: msg.to_string(),
        }
    }

    fn infix_binding(token: &Token) -> Option<(u8, u8, BinOp)> {
        match token {
            Token::Or => Some((1, 2, BinOp::Or)),
            Token::And => Some((3, 4, BinOp::And)),
            Token::Eq => Some((5, 6, BinOp::Eq)),
            Token::Ne => Some((5, 6, BinOp::Ne)),
            Token::Lt => Some((5, 6, BinOp::Lt)),
            Token::Le => Some((5, 6, BinOp::Le)),
            Token::Gt => Some((5, 6, BinOp::Gt)),
            Token::Ge => Some((5, 6, BinOp::Ge)),
            Token::Plus => Some((7, 8, BinOp::Add)),
            Token::Minus => Some((7, 8, BinOp::Sub)),
            Token::Star => Some((9, 10, BinOp::Mul)),
            Token::Slash => Some((9, 10, BinOp::Div)),
            _ => None,
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ExprError> {
        let (pos, token) = self
            .next()
            .ok_or_else(|| self.err_here("unexpected end of condition"))?;

        let mut lhs = match token {
            Token::Int(n) => Expr::Literal(Value::Int(n)),
            Token::Float(f) => Expr::Literal(Value::Float(f)),
            Token::Str(s) => Expr::Literal(Value::Str(s)),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::Ident(name) => Expr::Column(name),
            Token::LParen => {
                let inner = self.parse_expr(0)?;
                match self.next() {
                    Some((_, Token::RParen)) => inner,
                    _ => {
                        return Err(ExprError::Syntax {
                            pos,
                            msg: "unclosed parenthesis".to_string(),
                        })
                    }
                }
            }
            // `not` binds looser than comparisons: `not A > 5` is `not (A > 5)`.
            Token::Not => Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.parse_expr(4)?),
            },
            Token::Minus => Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.parse_expr(11)?),
            },
            other => {
                return Err(ExprError::Syntax {
                    pos,
                    msg: format!("unexpected token {:?}", other),
                })
            }
        };

        while let Some(token) = self.peek() {
            let Some((lbp, rbp, op)) = Self::infix_binding(token) else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_expr(rbp)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }
}

// --- EVALUATION ---

fn to_bool(value: &Value) -> Result<bool, ExprError> {
    match value {
        Value::Bool(b) => Ok(*b),
        // Missing values never satisfy a predicate.
        Value::Null => Ok(false),
        other => Err(ExprError::TypeMismatch(format!(
            "expected a boolean, got {:?}",
            other
        ))),
    }
}

/// Numeric view for comparisons. Booleans take part as 1/0, the way a
/// dataset that encodes `Is_Laundering` as integers still satisfies
/// `Is_Laundering == True`.
fn comparable_number(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}

fn eval_compare(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, ExprError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Bool(false));
    }
    if let (Some(a), Some(b)) = (comparable_number(lhs), comparable_number(rhs)) {
        let res = match op {
            BinOp::Eq => a == b,
            BinOp::Ne => a != b,
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            BinOp::Ge => a >= b,
            _ => unreachable!("not a comparison"),
        };
        return Ok(Value::Bool(res));
    }
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => {
            let res = match op {
                BinOp::Eq => a == b,
                BinOp::Ne => a != b,
                BinOp::Lt => a < b,
                BinOp::Le => a <= b,
                BinOp::Gt => a > b,
                BinOp::Ge => a >= b,
                _ => unreachable!("not a comparison"),
            };
            Ok(Value::Bool(res))
        }
        _ => Err(ExprError::TypeMismatch(format!(
            "cannot compare {:?} with {:?}",
            lhs, rhs
        ))),
    }
}

fn eval_arith(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, ExprError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }
    // Keep integers integral where possible; division always yields a float.
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        let exact = match op {
            BinOp::Add => a.checked_add(*b),
            BinOp::Sub => a.checked_sub(*b),
            BinOp::Mul => a.checked_mul(*b),
            _ => None,
        };
        if let Some(n) = exact {
            return Ok(Value::Int(n));
        }
    }
    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Err(ExprError::TypeMismatch(format!(
            "arithmetic needs numbers, got {:?} and {:?}",
            lhs, rhs
        )));
    };
    let res = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        _ => unreachable!("not arithmetic"),
    };
    Ok(Value::Float(res))
}

fn eval_expr(expr: &Expr, table: &TransactionTable, row: usize) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Column(name) => match table.column_index(name) {
            Some(col) => Ok(table.cell(row, col).clone()),
            None => Err(ExprError::UnknownColumn(name.clone())),
        },
        Expr::Unary { op, operand } => {
            let v = eval_expr(operand, table, row)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!to_bool(&v)?)),
                UnaryOp::Neg => match v {
                    Value::Null => Ok(Value::Null),
                    Value::Int(n) => Ok(Value::Int(-n)),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    other => Err(ExprError::TypeMismatch(format!(
                        "cannot negate {:?}",
                        other
                    ))),
                },
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = eval_expr(lhs, table, row)?;
            let r = eval_expr(rhs, table, row)?;
            match op {
                BinOp::And => Ok(Value::Bool(to_bool(&l)? && to_bool(&r)?)),
                BinOp::Or => Ok(Value::Bool(to_bool(&l)? || to_bool(&r)?)),
                BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                    eval_compare(*op, &l, &r)
                }
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => eval_arith(*op, &l, &r),
            }
        }
    }
}

fn collect_columns<'a>(expr: &'a Expr, out: &mut BTreeSet<&'a str>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Column(name) => {
            out.insert(name.as_str());
        }
        Expr::Unary { operand, .. } => collect_columns(operand, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect_columns(lhs, out);
            collect_columns(rhs, out);
        }
    }
}

/// A compiled condition, ready to evaluate against table rows.
#[derive(Debug, Clone)]
pub struct Predicate {
    ast: Expr,
}

impl Predicate {
    pub fn compile(condition: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(condition)?;
        if tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            input_len: condition.len(),
        };
        let ast = parser.parse_expr(0)?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.err_here("trailing input after expression"));
        }
        Ok(Self { ast })
    }

    /// Every column name the condition references.
    pub fn columns(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        collect_columns(&self.ast, &mut out);
        out
    }

    /// Fail early if the condition references a column the table lacks, so a
    /// bad rule is skipped for the whole table before any row is touched.
    pub fn check_columns(&self, table: &TransactionTable) -> Result<(), ExprError> {
        for name in self.columns() {
            if table.column_index(name).is_none() {
                return Err(ExprError::UnknownColumn(name.to_string()));
            }
        }
        Ok(())
    }

    /// Evaluate the condition for one row.
    pub fn matches(&self, table: &TransactionTable, row: usize) -> Result<bool, ExprError> {
        to_bool(&eval_expr(&self.ast, table, row)?)
    }
}
