//! Expression (AST) module: the parsed representation of Liquid expressions
//! and the recursive-descent parser that produces it.
//!
//! An expression source is a chain of value producers separated by `|`: a
//! head expression followed by zero or more filter applications. The parser
//! carries only its position in the source; errors report line and column.

use serde::Serialize;

use crate::value::Value;
use crate::Error;

/// One step of a variable path: a dotted name or a bracketed index
/// expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Segment {
    Name(String),
    Index(Expr),
}

/// A single filter application inside a chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Contains,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum Expr {
    Literal(Value),
    /// The `empty` keyword. Meaningful on either side of `==`/`!=`; as a
    /// plain value it evaluates to `Nil`.
    Empty,
    /// The `blank` keyword, compared exactly like `empty`.
    Blank,
    Var(Vec<Segment>),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Inclusive integer range `(lo..hi)`.
    Range {
        lo: Box<Expr>,
        hi: Box<Expr>,
    },
    /// A head value threaded through one or more filters.
    FilterChain {
        head: Box<Expr>,
        filters: Vec<FilterCall>,
    },
}

/// Parse an expression (or filter chain) source into an AST.
pub fn parse(source: &str) -> Result<Expr, Error> {
    let mut parser = Parser::new(source);
    let expr = parser.parse_chain()?;
    parser.skip_whitespace();
    if parser.pos < parser.input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

// Hand-written recursive descent parser over the raw source. Only the
// position is state; line/column are derived on error.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let consumed = &self.input[..self.pos];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map_or(0, |i| i + 1);
        let column = consumed[line_start..].chars().count() + 1;
        Error::Parse {
            message: message.into(),
            line,
            column,
        }
    }

    fn parse_chain(&mut self) -> Result<Expr, Error> {
        let head = self.parse_expr()?;
        let mut filters = Vec::new();
        loop {
            self.skip_whitespace();
            if !self.consume("|") {
                break;
            }
            self.skip_whitespace();
            let name = self
                .parse_identifier()
                .ok_or_else(|| self.error("expected filter name after '|'"))?;
            let mut args = Vec::new();
            self.skip_whitespace();
            if self.consume(":") {
                loop {
                    self.skip_whitespace();
                    args.push(self.parse_expr()?);
                    self.skip_whitespace();
                    if !self.consume(",") {
                        break;
                    }
                }
            }
            filters.push(FilterCall { name, args });
        }
        if filters.is_empty() {
            Ok(head)
        } else {
            Ok(Expr::FilterChain {
                head: Box::new(head),
                filters,
            })
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_whitespace();
            if !self.consume_keyword("or") {
                break;
            }
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_comparison()?;
        loop {
            self.skip_whitespace();
            if !self.consume_keyword("and") {
                break;
            }
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    // Non-associative: at most one comparison operator per level.
    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let left = self.parse_unary()?;
        self.skip_whitespace();
        let Some(op) = self.parse_comparison_op() else {
            return Ok(left);
        };
        let right = self.parse_unary()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(left),
            rhs: Box::new(right),
        })
    }

    fn parse_comparison_op(&mut self) -> Option<BinaryOp> {
        let symbolic = [
            ("==", BinaryOp::Eq),
            ("!=", BinaryOp::Ne),
            ("<=", BinaryOp::Le),
            (">=", BinaryOp::Ge),
            ("<", BinaryOp::Lt),
            (">", BinaryOp::Gt),
        ];
        for (s, op) in symbolic {
            if self.consume(s) {
                return Some(op);
            }
        }
        self.consume_keyword("contains").then_some(BinaryOp::Contains)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        self.skip_whitespace();
        if self.consume_keyword("not") {
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }
        if self.consume("-") {
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        self.skip_whitespace();
        match self.peek() {
            Some('\'') | Some('"') => self.parse_string_literal(),
            Some(c) if c.is_ascii_digit() => self.parse_number_literal(),
            Some('(') => self.parse_group_or_range(),
            Some(c) if is_ident_start(c) => self.parse_keyword_or_varref(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    // `( expr )` or `( lo .. hi )`.
    fn parse_group_or_range(&mut self) -> Result<Expr, Error> {
        self.consume("(");
        let first = self.parse_expr()?;
        self.skip_whitespace();
        if self.consume("..") {
            let hi = self.parse_expr()?;
            self.skip_whitespace();
            if !self.consume(")") {
                return Err(self.error("expected ')' to close range"));
            }
            return Ok(Expr::Range {
                lo: Box::new(first),
                hi: Box::new(hi),
            });
        }
        if !self.consume(")") {
            return Err(self.error("expected ')'"));
        }
        Ok(first)
    }

    fn parse_keyword_or_varref(&mut self) -> Result<Expr, Error> {
        let ident = self
            .parse_identifier()
            .ok_or_else(|| self.error("expected identifier"))?;
        match ident.as_str() {
            "true" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" => return Ok(Expr::Literal(Value::Bool(false))),
            "nil" | "null" => return Ok(Expr::Literal(Value::Nil)),
            "empty" => return Ok(Expr::Empty),
            "blank" => return Ok(Expr::Blank),
            "not" | "and" | "or" | "contains" => {
                return Err(self.error(format!("unexpected keyword '{ident}'")))
            }
            _ => {}
        }
        let mut segments = vec![Segment::Name(ident)];
        loop {
            // A single dot continues the path; a double dot belongs to an
            // enclosing range like `(a..b)`.
            if self.peek() == Some('.') && !self.input[self.pos + 1..].starts_with('.') {
                self.bump();
                let name = self
                    .parse_identifier()
                    .ok_or_else(|| self.error("expected property name after '.'"))?;
                segments.push(Segment::Name(name));
            } else if self.consume("[") {
                let index = self.parse_expr()?;
                self.skip_whitespace();
                if !self.consume("]") {
                    return Err(self.error("expected ']'"));
                }
                segments.push(Segment::Index(index));
            } else {
                break;
            }
        }
        Ok(Expr::Var(segments))
    }

    // Strings use single or double quotes; contents are opaque (no escapes,
    // no interpolation).
    fn parse_string_literal(&mut self) -> Result<Expr, Error> {
        let quote = self.peek().unwrap();
        self.bump();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let s = self.input[start..self.pos].to_string();
                self.bump();
                return Ok(Expr::Literal(Value::String(s)));
            }
            self.bump();
        }
        Err(self.error("unterminated string literal"))
    }

    // Digits with an optional fractional part. No exponent. The sign is
    // handled by unary minus.
    fn parse_number_literal(&mut self) -> Result<Expr, Error> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let mut is_float = false;
        // A '.' only belongs to the number if digits follow; `(1..3)` must
        // leave the dots for the range.
        if self.peek() == Some('.')
            && self
                .input[self.pos + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = &self.input[start..self.pos];
        if is_float {
            let f = text
                .parse::<f64>()
                .map_err(|_| self.error(format!("invalid number literal '{text}'")))?;
            Ok(Expr::Literal(Value::Float(f)))
        } else {
            let i = text
                .parse::<i64>()
                .map_err(|_| self.error(format!("invalid number literal '{text}'")))?;
            Ok(Expr::Literal(Value::Int(i)))
        }
    }

    fn parse_identifier(&mut self) -> Option<String> {
        let start = self.pos;
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        Some(self.input[start..self.pos].to_string())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn consume(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    // Word operators only match on an identifier boundary, so a binding
    // named `order` is not eaten by `or`.
    fn consume_keyword(&mut self, kw: &str) -> bool {
        let rest = &self.input[self.pos..];
        if rest.starts_with(kw)
            && !rest[kw.len()..].chars().next().is_some_and(is_ident_continue)
        {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse("42").unwrap(), Expr::Literal(Value::Int(42)));
        assert_eq!(parse("10.5").unwrap(), Expr::Literal(Value::Float(10.5)));
        assert_eq!(parse("true").unwrap(), Expr::Literal(Value::Bool(true)));
        assert_eq!(parse("nil").unwrap(), Expr::Literal(Value::Nil));
        assert_eq!(parse("null").unwrap(), Expr::Literal(Value::Nil));
        assert_eq!(
            parse("'a b'").unwrap(),
            Expr::Literal(Value::String("a b".into()))
        );
        assert_eq!(
            parse("\"a'b\"").unwrap(),
            Expr::Literal(Value::String("a'b".into()))
        );
        assert_eq!(parse("empty").unwrap(), Expr::Empty);
        assert_eq!(parse("blank").unwrap(), Expr::Blank);
    }

    #[test]
    fn test_parse_negative_number() {
        match parse("-3").unwrap() {
            Expr::Unary {
                op: UnaryOp::Neg,
                expr,
            } => assert_eq!(*expr, Expr::Literal(Value::Int(3))),
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_parse_varref_path() {
        let expr = parse("a.b[0].c").unwrap();
        match expr {
            Expr::Var(segs) => {
                assert_eq!(segs.len(), 4);
                assert_eq!(segs[0], Segment::Name("a".into()));
                assert_eq!(segs[1], Segment::Name("b".into()));
                assert_eq!(segs[2], Segment::Index(Expr::Literal(Value::Int(0))));
                assert_eq!(segs[3], Segment::Name("c".into()));
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_parse_bracket_key_expression() {
        let expr = parse("a[b.c]").unwrap();
        match expr {
            Expr::Var(segs) => match &segs[1] {
                Segment::Index(Expr::Var(inner)) => assert_eq!(inner.len(), 2),
                s => panic!("unexpected {s:?}"),
            },
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_parse_comparison_ops() {
        for (src, op) in [
            ("a == b", BinaryOp::Eq),
            ("a != b", BinaryOp::Ne),
            ("a < b", BinaryOp::Lt),
            ("a <= b", BinaryOp::Le),
            ("a > b", BinaryOp::Gt),
            ("a >= b", BinaryOp::Ge),
            ("a contains b", BinaryOp::Contains),
        ] {
            match parse(src).unwrap() {
                Expr::Binary { op: got, .. } => assert_eq!(got, op, "{src}"),
                e => panic!("unexpected {e:?} for {src}"),
            }
        }
    }

    #[test]
    fn test_logical_ops_are_left_associative() {
        let expr = parse("a or b or c").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Or,
                lhs,
                ..
            } => match *lhs {
                Expr::Binary {
                    op: BinaryOp::Or, ..
                } => {}
                e => panic!("unexpected {e:?}"),
            },
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_keyword_requires_word_boundary() {
        // `order` and `android` are bindings, not operators.
        match parse("order").unwrap() {
            Expr::Var(segs) => assert_eq!(segs[0], Segment::Name("order".into())),
            e => panic!("unexpected {e:?}"),
        }
        assert!(parse("a or android").is_ok());
    }

    #[test]
    fn test_parse_filter_chain() {
        let expr = parse("fruits | reverse | join: ', '").unwrap();
        match expr {
            Expr::FilterChain { head, filters } => {
                assert!(matches!(*head, Expr::Var(_)));
                assert_eq!(filters.len(), 2);
                assert_eq!(filters[0].name, "reverse");
                assert!(filters[0].args.is_empty());
                assert_eq!(filters[1].name, "join");
                assert_eq!(filters[1].args.len(), 1);
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_parse_filter_with_multiple_args() {
        let expr = parse("s | slice: -3, 2").unwrap();
        match expr {
            Expr::FilterChain { filters, .. } => {
                assert_eq!(filters[0].args.len(), 2);
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_parse_range() {
        let expr = parse("(1..5)").unwrap();
        match expr {
            Expr::Range { lo, hi } => {
                assert_eq!(*lo, Expr::Literal(Value::Int(1)));
                assert_eq!(*hi, Expr::Literal(Value::Int(5)));
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_parse_range_with_var_ends() {
        assert!(matches!(parse("(1..n)").unwrap(), Expr::Range { .. }));
        match parse("(a..b)").unwrap() {
            Expr::Range { lo, hi } => {
                assert!(matches!(*lo, Expr::Var(_)));
                assert!(matches!(*hi, Expr::Var(_)));
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_parse_parenthesized_expression() {
        let expr = parse("(a or b) and c").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::And, ..
            } => {}
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_parse_errors_carry_location() {
        match parse("a ==").unwrap_err() {
            Error::Parse { line, column, .. } => {
                assert_eq!(line, 1);
                assert!(column >= 4);
            }
            e => panic!("unexpected {e:?}"),
        }
        match parse("a\n| join: 'x' |").unwrap_err() {
            Error::Parse { line, .. } => assert_eq!(line, 2),
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(parse("'abc").is_err());
        assert!(parse("a[1").is_err());
        assert!(parse("(1..2").is_err());
    }

    #[test]
    fn test_trailing_garbage_is_an_error() {
        assert!(parse("a b").is_err());
        assert!(parse("1 2").is_err());
    }
}
