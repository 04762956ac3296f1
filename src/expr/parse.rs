use crate::error::{Result, SumforgeError};

use super::{BinaryOp, Expr, UnaryOp};

/// Parses an expression in the compact canonical form produced by the
/// [`Display`](std::fmt::Display) renderer.
///
/// The grammar is exactly what the renderer emits, so
/// `parse_expr(&tree.to_string())` evaluates identically to `tree`. The one
/// deliberate collapse: `(-1)^(x)` always parses as the alternating-sign
/// operator, even if it was printed from a literal power of -1.
pub fn parse_expr(input: &str) -> Result<Expr> {
    let mut parser = Parser::new(input);
    let expr = parser.expr()?;
    parser.finish()?;
    Ok(expr)
}

/// Parses a full candidate rendering `Sum_{n=<start>}^{inf} (<num>) / (<den>)`
/// into (start, numerator, denominator).
pub fn parse_summation(input: &str) -> Result<(i64, Expr, Expr)> {
    let mut parser = Parser::new(input);
    parser.expect("Sum_{n=")?;
    let start = parser.integer()?;
    if start < 0 {
        return Err(parser.error("start index must be non-negative"));
    }
    parser.expect("}^{inf} (")?;
    let numerator = parser.expr()?;
    parser.expect(") / (")?;
    let denominator = parser.expr()?;
    parser.expect(")")?;
    parser.finish()?;
    Ok((start, numerator, denominator))
}

const NAMED_UNARY: [(&str, UnaryOp); 8] = [
    ("fib(", UnaryOp::Fibonacci),
    ("sin(", UnaryOp::Sin),
    ("cos(", UnaryOp::Cos),
    ("ln(", UnaryOp::Ln),
    ("floor(", UnaryOp::Floor),
    ("ceil(", UnaryOp::Ceil),
    ("abs(", UnaryOp::Abs),
    ("sqrt(", UnaryOp::Sqrt),
];

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, lit: &str) -> bool {
        if self.rest().starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, lit: &str) -> Result<()> {
        if self.eat(lit) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {lit:?}")))
        }
    }

    fn finish(&self) -> Result<()> {
        if self.pos == self.src.len() {
            Ok(())
        } else {
            Err(self.error("trailing input"))
        }
    }

    fn error(&self, msg: &str) -> SumforgeError {
        SumforgeError::ParseFormula(format!("{msg} at byte {} in {:?}", self.pos, self.src))
    }

    fn digit_at(&self, pos: usize) -> bool {
        self.src.as_bytes().get(pos).is_some_and(|b| b.is_ascii_digit())
    }

    fn integer(&mut self) -> Result<i64> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text = &self.src[start..self.pos];
        match text.parse() {
            Ok(v) => Ok(v),
            Err(_) => Err(self.error("expected integer")),
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        if self.eat("(-1)^(") {
            let child = self.expr()?;
            self.expect(")")?;
            return Ok(Expr::unary(UnaryOp::AltSign, child));
        }
        if self.eat("C(") {
            let left = self.expr()?;
            self.expect(", ")?;
            let right = self.expr()?;
            self.expect(")")?;
            return Ok(Expr::binary(BinaryOp::Binomial, left, right));
        }
        for (lit, op) in NAMED_UNARY {
            if self.eat(lit) {
                let child = self.expr()?;
                self.expect(")")?;
                return Ok(Expr::unary(op, child));
            }
        }
        if self.peek() == Some('n') {
            self.pos += 1;
            return Ok(Expr::Var);
        }
        if matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '-') {
            return Ok(Expr::Const(self.integer()?));
        }
        if self.eat("(") {
            let node = if self.peek() == Some('-') && !self.digit_at(self.pos + 1) {
                // "(-x)" is negation; "(-5" is a negative constant handled below.
                self.pos += 1;
                let child = self.expr()?;
                self.expect(")")?;
                Expr::unary(UnaryOp::Neg, child)
            } else {
                let left = self.expr()?;
                if self.eat(")") {
                    left
                } else {
                    let op = self.binary_op()?;
                    let right = self.expr()?;
                    self.expect(")")?;
                    Expr::binary(op, left, right)
                }
            };
            return self.suffixed(node);
        }
        Err(self.error("expected expression"))
    }

    fn binary_op(&mut self) -> Result<BinaryOp> {
        const OPS: [(&str, BinaryOp); 4] = [
            (" + ", BinaryOp::Add),
            (" - ", BinaryOp::Sub),
            (" * ", BinaryOp::Mul),
            (" / ", BinaryOp::Div),
        ];
        for (lit, op) in OPS {
            if self.eat(lit) {
                return Ok(op);
            }
        }
        Err(self.error("expected binary operator"))
    }

    /// Handles the postfix forms that follow a closed paren group:
    /// `(x)!`, `(x)!!` and `(l)^(r)`.
    fn suffixed(&mut self, node: Expr) -> Result<Expr> {
        if self.eat("!!") {
            return self.suffixed(Expr::unary(UnaryOp::DoubleFactorial, node));
        }
        if self.eat("!") {
            return self.suffixed(Expr::unary(UnaryOp::Factorial, node));
        }
        if self.eat("^(") {
            let right = self.expr()?;
            self.expect(")")?;
            return Ok(Expr::binary(BinaryOp::Pow, node, right));
        }
        Ok(node)
    }
}
