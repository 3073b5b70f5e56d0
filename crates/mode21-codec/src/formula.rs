//! Constrained Formula Evaluator
//!
//! Vehicle profiles carry per-PID decode formulas as text, e.g. `A*256+B`
//! or `A-40`. The alphabet is deliberately tiny: numeric literals, the four
//! response byte variables `A B C D`, `+ - * /`, and parentheses. Anything
//! else is rejected at parse time, so untrusted-looking config text never
//! reaches a general evaluator.
//!
//! Formulas are compiled once (at profile load) and evaluated per frame.

use crate::error::FormulaError;
use crate::frame::RawBytes;

/// Response byte variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Var {
    A,
    B,
    C,
    D,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Variable(Var),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Compiled arithmetic expression tree
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Variable(Var),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

/// A compiled PID decode formula.
///
/// Parse once with [`Formula::parse`], then evaluate against raw response
/// bytes with [`Formula::eval`]. Evaluation itself cannot fail; division by
/// zero yields a non-finite value the caller maps to a sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse an expression string into a compiled formula
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(FormulaError::Empty);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expression()?;
        if let Some((position, _)) = parser.peek_raw() {
            return Err(FormulaError::TrailingInput { position });
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Evaluate against a raw byte tuple
    pub fn eval(&self, bytes: RawBytes) -> f64 {
        eval_expr(&self.expr, bytes)
    }

    /// The original expression text
    pub fn source(&self) -> &str {
        &self.source
    }
}

fn eval_expr(expr: &Expr, bytes: RawBytes) -> f64 {
    match expr {
        Expr::Number(n) => *n,
        Expr::Variable(Var::A) => bytes.a as f64,
        Expr::Variable(Var::B) => bytes.b as f64,
        Expr::Variable(Var::C) => bytes.c as f64,
        Expr::Variable(Var::D) => bytes.d as f64,
        Expr::Add(l, r) => eval_expr(l, bytes) + eval_expr(r, bytes),
        Expr::Sub(l, r) => eval_expr(l, bytes) - eval_expr(r, bytes),
        Expr::Mul(l, r) => eval_expr(l, bytes) * eval_expr(r, bytes),
        Expr::Div(l, r) => eval_expr(l, bytes) / eval_expr(r, bytes),
        Expr::Neg(e) => -eval_expr(e, bytes),
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, FormulaError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
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
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            'A' => {
                tokens.push((i, Token::Variable(Var::A)));
                i += 1;
            }
            'B' => {
                tokens.push((i, Token::Variable(Var::B)));
                i += 1;
            }
            'C' => {
                tokens.push((i, Token::Variable(Var::C)));
                i += 1;
            }
            'D' => {
                tokens.push((i, Token::Variable(Var::D)));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal.parse::<f64>().map_err(|_| FormulaError::InvalidNumber {
                    position: start,
                    literal: literal.clone(),
                })?;
                tokens.push((start, Token::Number(value)));
            }
            other => {
                return Err(FormulaError::UnexpectedChar {
                    position: i,
                    character: other,
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(_, t)| *t)
    }

    fn peek_raw(&self) -> Option<(usize, Token)> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let t = self.tokens.get(self.pos).copied();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    lhs = Expr::Add(Box::new(lhs), Box::new(self.term()?));
                }
                Token::Minus => {
                    self.advance();
                    lhs = Expr::Sub(Box::new(lhs), Box::new(self.term()?));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    /// term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.advance();
                    lhs = Expr::Mul(Box::new(lhs), Box::new(self.factor()?));
                }
                Token::Slash => {
                    self.advance();
                    lhs = Expr::Div(Box::new(lhs), Box::new(self.factor()?));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    /// factor := '-' factor | number | variable | '(' expression ')'
    fn factor(&mut self) -> Result<Expr, FormulaError> {
        match self.advance() {
            Some((_, Token::Number(n))) => Ok(Expr::Number(n)),
            Some((_, Token::Variable(v))) => Ok(Expr::Variable(v)),
            Some((_, Token::Minus)) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some((_, Token::LParen)) => {
                let inner = self.expression()?;
                match self.advance() {
                    Some((_, Token::RParen)) => Ok(inner),
                    Some((position, token)) => Err(FormulaError::UnexpectedToken {
                        position,
                        token: describe(token),
                    }),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some((position, token)) => Err(FormulaError::UnexpectedToken {
                position,
                token: describe(token),
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

fn describe(token: Token) -> String {
    match token {
        Token::Number(n) => n.to_string(),
        Token::Variable(Var::A) => "A".to_string(),
        Token::Variable(Var::B) => "B".to_string(),
        Token::Variable(Var::C) => "C".to_string(),
        Token::Variable(Var::D) => "D".to_string(),
        Token::Plus => "+".to_string(),
        Token::Minus => "-".to_string(),
        Token::Star => "*".to_string(),
        Token::Slash => "/".to_string(),
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str, bytes: RawBytes) -> f64 {
        Formula::parse(expr).unwrap().eval(bytes)
    }

    #[test]
    fn test_rail_pressure_formula() {
        let bytes = RawBytes::from_ab(0x88, 0xB8);
        assert_eq!(eval("A*256+B", bytes), 35000.0);
    }

    #[test]
    fn test_offset_temperature_formula() {
        assert_eq!(eval("A-40", RawBytes::from_a(125)), 85.0);
        assert_eq!(eval("B-40", RawBytes::from_ab(0, 130)), 90.0);
    }

    #[test]
    fn test_injector_trim_formula() {
        assert_eq!(eval("(A-128)/2", RawBytes::from_a(132)), 2.0);
    }

    #[test]
    fn test_precedence_and_parens() {
        let bytes = RawBytes::from_ab(2, 3);
        assert_eq!(eval("A+B*4", bytes), 14.0);
        assert_eq!(eval("(A+B)*4", bytes), 20.0);
        assert_eq!(eval("-A+10", bytes), 8.0);
    }

    #[test]
    fn test_all_four_variables() {
        let bytes = RawBytes {
            a: 1,
            b: 2,
            c: 3,
            d: 4,
        };
        assert_eq!(eval("A+B+C+D", bytes), 10.0);
        assert_eq!(eval("D*256+C", bytes), 1027.0);
    }

    #[test]
    fn test_division_by_zero_is_non_finite() {
        assert!(!eval("A/B", RawBytes::from_ab(1, 0)).is_finite());
    }

    #[test]
    fn test_rejects_unknown_characters() {
        assert!(matches!(
            Formula::parse("system(A)"),
            Err(FormulaError::UnexpectedChar { .. })
        ));
        assert!(matches!(
            Formula::parse("A^2"),
            Err(FormulaError::UnexpectedChar { .. })
        ));
        // Lowercase variables are not part of the alphabet
        assert!(Formula::parse("a+1").is_err());
    }

    #[test]
    fn test_rejects_malformed_expressions() {
        assert!(matches!(Formula::parse(""), Err(FormulaError::Empty)));
        assert!(matches!(Formula::parse("   "), Err(FormulaError::Empty)));
        assert!(matches!(Formula::parse("A+"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(Formula::parse("(A"), Err(FormulaError::UnexpectedEnd)));
        assert!(matches!(
            Formula::parse("A B"),
            Err(FormulaError::TrailingInput { .. })
        ));
        assert!(matches!(
            Formula::parse("A*"),
            Err(FormulaError::UnexpectedEnd)
        ));
        // '**' parses the second star as a dangling operator
        assert!(Formula::parse("A**B").is_err());
    }

    #[test]
    fn test_source_preserved() {
        let formula = Formula::parse("A*256+B").unwrap();
        assert_eq!(formula.source(), "A*256+B");
    }
}
