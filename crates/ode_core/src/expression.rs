use crate::traits::Scalar;
use std::fmt;

/// Arithmetic operators allowed on the right-hand side of an equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn apply<T: Scalar>(self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// Expression tree for the right-hand side of a derivative equation.
///
/// The node set is closed: constants, the independent variable `t`,
/// indexed references into the state vector `[y, y', y'', ...]`, and binary
/// arithmetic. Trees are built once by the parser and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Time,
    /// `StateRef(k)` reads `y[k]`, i.e. the k-th derivative of the unknown.
    StateRef(usize),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary(Box::new(left), op, Box::new(right))
    }

    /// Evaluates the tree at time `t` against the state vector `y`.
    ///
    /// A reference past the end of `y` yields NaN, which the integrator
    /// reports as a divergence rather than reading garbage.
    pub fn eval<T: Scalar>(&self, t: T, y: &[T]) -> T {
        match self {
            Expr::Constant(value) => T::from_f64(*value).unwrap_or_else(T::nan),
            Expr::Time => t,
            Expr::StateRef(idx) => y.get(*idx).copied().unwrap_or_else(T::nan),
            Expr::Binary(left, op, right) => op.apply(left.eval(t, y), right.eval(t, y)),
        }
    }

    /// Sorted, de-duplicated state indices read by this expression.
    pub fn state_refs(&self) -> Vec<usize> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs.sort_unstable();
        refs.dedup();
        refs
    }

    fn collect_refs(&self, refs: &mut Vec<usize>) {
        match self {
            Expr::StateRef(idx) => refs.push(*idx),
            Expr::Binary(left, _, right) => {
                left.collect_refs(refs);
                right.collect_refs(refs);
            }
            Expr::Constant(_) | Expr::Time => {}
        }
    }
}

/// Renders the tree in derivative notation, fully parenthesised.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => write!(f, "{}", value),
            Expr::Time => write!(f, "t"),
            Expr::StateRef(idx) => write!(f, "y{}", "'".repeat(*idx)),
            Expr::Binary(left, op, right) => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}
