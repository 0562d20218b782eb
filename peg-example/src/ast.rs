use std::fmt::Write;
use std::ops::Range;

/// Expression AST node. Spans are byte ranges in the source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number { value: f64, span: Range<usize> },
    /// Binary operation: left operand, operator, right operand.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Range<usize>,
    },
    /// Unary operation (negation).
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Range<usize>,
    },
    /// Parenthesized expression.
    Group { expr: Box<Expr>, span: Range<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
}

impl Expr {
    pub fn span(&self) -> Range<usize> {
        match self {
            Expr::Number { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Group { span, .. } => span.clone(),
        }
    }

    /// Evaluates the expression with IEEE semantics (division by zero gives
    /// an infinity).
    pub fn eval(&self) -> f64 {
        match self {
            Expr::Number { value, .. } => *value,
            Expr::Binary {
                op, left, right, ..
            } => {
                let (left, right) = (left.eval(), right.eval());
                match op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Subtract => left - right,
                    BinaryOp::Multiply => left * right,
                    BinaryOp::Divide => left / right,
                    BinaryOp::Power => left.powf(right),
                }
            }
            Expr::Unary {
                op: UnaryOp::Negate,
                operand,
                ..
            } => -operand.eval(),
            Expr::Group { expr, .. } => expr.eval(),
        }
    }

    /// Renders the tree one node per line, children indented.
    pub fn tree(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, indent: usize) {
        let prefix = "  ".repeat(indent);
        let _ = match self {
            Expr::Number { value, .. } => writeln!(out, "{prefix}Number({value})"),
            Expr::Binary { op, .. } => writeln!(out, "{prefix}Binary({})", op.symbol()),
            Expr::Unary { .. } => writeln!(out, "{prefix}Unary(-)"),
            Expr::Group { .. } => writeln!(out, "{prefix}Group"),
        };
        match self {
            Expr::Number { .. } => {}
            Expr::Binary { left, right, .. } => {
                left.write_tree(out, indent + 1);
                right.write_tree(out, indent + 1);
            }
            Expr::Unary { operand, .. } => operand.write_tree(out, indent + 1),
            Expr::Group { expr, .. } => expr.write_tree(out, indent + 1),
        }
    }
}

/// Renders the expression fully parenthesized, e.g. `(1 + (2 * 3))`.
impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number { value, .. } => write!(f, "{value}"),
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Unary { operand, .. } => write!(f, "-{operand}"),
            Expr::Group { expr, .. } => write!(f, "{expr}"),
        }
    }
}
