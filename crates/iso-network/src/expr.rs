//! Symbolic expression tree.
//!
//! Flux and isotope formulas are held as an explicit, inspectable tree rather
//! than as opaque closures. Symbols stay unresolved strings here; the network
//! compiler classifies them into parameters, pool sizes and pool δ values.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
            BinOp::Pow => 4,
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Pow => a.powf(b),
        }
    }
}

/// Built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    Exp,
    Ln,
    Sqrt,
    Abs,
    Min,
    Max,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Sqrt => "sqrt",
            Func::Abs => "abs",
            Func::Min => "min",
            Func::Max => "max",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exp" => Some(Func::Exp),
            "ln" | "log" => Some(Func::Ln),
            "sqrt" => Some(Func::Sqrt),
            "abs" => Some(Func::Abs),
            "min" => Some(Func::Min),
            "max" => Some(Func::Max),
            _ => None,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Func::Min | Func::Max => 2,
            _ => 1,
        }
    }

    /// Apply to already-evaluated arguments. Callers guarantee the arity.
    pub fn apply(self, args: &[f64]) -> f64 {
        match self {
            Func::Exp => args[0].exp(),
            Func::Ln => args[0].ln(),
            Func::Sqrt => args[0].sqrt(),
            Func::Abs => args[0].abs(),
            Func::Min => args[0].min(args[1]),
            Func::Max => args[0].max(args[1]),
        }
    }
}

/// A symbolic formula over parameters and component states.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    /// Unresolved name: a parameter, a component (pool size) or `component.isotope` (δ).
    Symbol(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Func,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn c(value: f64) -> Self {
        Expr::Const(value)
    }

    pub fn sym(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// δ reference `component.isotope`.
    pub fn delta(component: &str, isotope: &str) -> Self {
        Expr::Symbol(format!("{component}.{isotope}"))
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(func: Func, args: Vec<Expr>) -> Self {
        Expr::Call { func, args }
    }

    pub fn pow(self, exponent: impl Into<Expr>) -> Self {
        Expr::binary(BinOp::Pow, self, exponent.into())
    }

    /// Parse a formula string.
    pub fn parse(input: &str) -> Result<Self, ConfigurationError> {
        crate::parse::parse(input)
    }

    /// Sum of terms; `0` for an empty list.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Self {
        terms
            .into_iter()
            .reduce(|acc, t| acc + t)
            .unwrap_or(Expr::Const(0.0))
    }

    pub fn is_const(&self, value: f64) -> bool {
        matches!(self, Expr::Const(v) if *v == value)
    }

    /// Every symbol name referenced by this expression, sorted.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Const(_) => {}
            Expr::Symbol(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(inner) => inner.collect_symbols(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
            Expr::Call { args, .. } => {
                for a in args {
                    a.collect_symbols(out);
                }
            }
        }
    }

    /// Constant folding plus the identities `x+0`, `x-0`, `x*1`, `x*0`, `x/1`, `--x`.
    pub fn simplified(&self) -> Expr {
        match self {
            Expr::Const(_) | Expr::Symbol(_) => self.clone(),
            Expr::Neg(inner) => match inner.simplified() {
                Expr::Const(v) => Expr::Const(-v),
                Expr::Neg(x) => *x,
                other => Expr::Neg(Box::new(other)),
            },
            Expr::Binary { op, lhs, rhs } => {
                let l = lhs.simplified();
                let r = rhs.simplified();
                if let (Expr::Const(a), Expr::Const(b)) = (&l, &r) {
                    return Expr::Const(op.apply(*a, *b));
                }
                match op {
                    BinOp::Add if l.is_const(0.0) => r,
                    BinOp::Add | BinOp::Sub if r.is_const(0.0) => l,
                    BinOp::Sub if l.is_const(0.0) => Expr::Neg(Box::new(r)),
                    BinOp::Mul if l.is_const(0.0) || r.is_const(0.0) => Expr::Const(0.0),
                    BinOp::Mul if l.is_const(1.0) => r,
                    BinOp::Mul | BinOp::Div if r.is_const(1.0) => l,
                    BinOp::Pow if r.is_const(1.0) => l,
                    _ => Expr::binary(*op, l, r),
                }
            }
            Expr::Call { func, args } => {
                let args: Vec<Expr> = args.iter().map(Expr::simplified).collect();
                let values: Option<Vec<f64>> = args
                    .iter()
                    .map(|a| match a {
                        Expr::Const(v) => Some(*v),
                        _ => None,
                    })
                    .collect();
                match values {
                    Some(v) if v.len() == func.arity() => Expr::Const(func.apply(&v)),
                    _ => Expr::call(*func, args),
                }
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Neg(_) => 3,
            Expr::Const(v) if v.is_sign_negative() => 3,
            _ => 5,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(v) => write!(f, "{v}"),
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Neg(inner) => {
                write!(f, "-")?;
                inner.fmt_child(f, inner.precedence() < 4)
            }
            Expr::Binary { op, lhs, rhs } => {
                let p = op.precedence();
                // `^` is right-associative, everything else left-associative
                let (wrap_l, wrap_r) = if *op == BinOp::Pow {
                    (lhs.precedence() <= p, rhs.precedence() < p)
                } else {
                    let strict_right = matches!(op, BinOp::Sub | BinOp::Div);
                    (
                        lhs.precedence() < p,
                        rhs.precedence() < p
                            || (strict_right && rhs.precedence() == p)
                            || rhs.precedence() == 3,
                    )
                };
                lhs.fmt_child(f, wrap_l)?;
                write!(f, " {} ", op.symbol())?;
                rhs.fmt_child(f, wrap_r)
            }
            Expr::Call { func, args } => {
                write!(f, "{}(", func.name())?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl FromStr for Expr {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expr::parse(s)
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Const(v)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::Symbol(name.to_string())
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::binary($op, self, Expr::Const(rhs))
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, Expr::Const(self), rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinOp::Add);
impl_binary_op!(Sub, sub, BinOp::Sub);
impl_binary_op!(Mul, mul, BinOp::Mul);
impl_binary_op!(Div, div, BinOp::Div);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_build_tree() {
        let e = Expr::sym("net") * Expr::sym("f_CH4");
        assert_eq!(
            e,
            Expr::binary(BinOp::Mul, Expr::sym("net"), Expr::sym("f_CH4"))
        );
        assert_eq!(e.to_string(), "net * f_CH4");
    }

    #[test]
    fn display_parenthesizes_by_precedence() {
        let e = (Expr::sym("a") + Expr::sym("b")) * Expr::sym("c");
        assert_eq!(e.to_string(), "(a + b) * c");

        let e = Expr::sym("a") - (Expr::sym("b") - Expr::sym("c"));
        assert_eq!(e.to_string(), "a - (b - c)");

        let e = Expr::sym("a") - Expr::sym("b") - Expr::sym("c");
        assert_eq!(e.to_string(), "a - b - c");

        let e = Expr::c(-2.0).pow(2.0);
        assert_eq!(e.to_string(), "(-2) ^ 2");

        let e = Expr::sym("x") * -Expr::sym("y");
        assert_eq!(e.to_string(), "x * (-y)");
    }

    #[test]
    fn symbols_are_collected_sorted() {
        let e = 0.5 * (Expr::delta("CH3X", "C") + Expr::sym("eps"))
            + Expr::call(Func::Max, vec![Expr::sym("a"), Expr::sym("eps")]);
        let syms: Vec<String> = e.symbols().into_iter().collect();
        assert_eq!(syms, vec!["CH3X.C", "a", "eps"]);
    }

    #[test]
    fn simplification_identities() {
        let e = Expr::c(1.0) * Expr::sym("net") + Expr::c(0.0);
        assert_eq!(e.simplified(), Expr::sym("net"));

        let e = Expr::sym("x") * Expr::c(0.0) + Expr::sym("y") / 1.0;
        assert_eq!(e.simplified(), Expr::sym("y"));

        let e = Expr::c(2.0) * Expr::c(3.0) - Expr::c(1.0);
        assert_eq!(e.simplified(), Expr::c(5.0));

        let e = -(-Expr::sym("z"));
        assert_eq!(e.simplified(), Expr::sym("z"));

        let e = Expr::call(Func::Min, vec![Expr::c(3.0), Expr::c(-1.0)]);
        assert_eq!(e.simplified(), Expr::c(-1.0));
    }

    #[test]
    fn sum_of_nothing_is_zero() {
        assert_eq!(Expr::sum(Vec::new()), Expr::c(0.0));
        assert_eq!(
            Expr::sum(vec![Expr::sym("a"), Expr::sym("b")]).to_string(),
            "a + b"
        );
    }
}
