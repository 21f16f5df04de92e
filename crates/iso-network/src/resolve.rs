//! Index-resolved expressions and their interpreter.

use crate::error::ConfigurationError;
use crate::expr::{BinOp, Expr, Func};

/// What a symbol refers to once the network is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRef {
    /// Parameter slot in the network's sorted parameter list.
    Param(usize),
    /// Pool size of the component at this slot.
    Mass(usize),
    /// δ of the component at this slot.
    Delta(usize),
}

/// An expression whose symbols have been replaced by slot indices.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Const(f64),
    Sym(SymbolRef),
    Neg(Box<Resolved>),
    Binary(BinOp, Box<Resolved>, Box<Resolved>),
    Call(Func, Vec<Resolved>),
}

/// Numeric environment for evaluating resolved expressions.
///
/// `mass` and `delta` are indexed by component slot and cover fixed and
/// variable components alike.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub params: &'a [f64],
    pub mass: &'a [f64],
    pub delta: &'a [f64],
}

impl Resolved {
    pub fn from_expr(
        expr: &Expr,
        lookup: &dyn Fn(&str) -> Result<SymbolRef, ConfigurationError>,
    ) -> Result<Resolved, ConfigurationError> {
        Ok(match expr {
            Expr::Const(v) => Resolved::Const(*v),
            Expr::Symbol(name) => Resolved::Sym(lookup(name)?),
            Expr::Neg(inner) => Resolved::Neg(Box::new(Resolved::from_expr(inner, lookup)?)),
            Expr::Binary { op, lhs, rhs } => Resolved::Binary(
                *op,
                Box::new(Resolved::from_expr(lhs, lookup)?),
                Box::new(Resolved::from_expr(rhs, lookup)?),
            ),
            Expr::Call { func, args } => Resolved::Call(
                *func,
                args.iter()
                    .map(|a| Resolved::from_expr(a, lookup))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    pub fn eval(&self, ctx: &EvalContext<'_>) -> f64 {
        match self {
            Resolved::Const(v) => *v,
            Resolved::Sym(SymbolRef::Param(i)) => ctx.params[*i],
            Resolved::Sym(SymbolRef::Mass(i)) => ctx.mass[*i],
            Resolved::Sym(SymbolRef::Delta(i)) => ctx.delta[*i],
            Resolved::Neg(inner) => -inner.eval(ctx),
            Resolved::Binary(op, l, r) => op.apply(l.eval(ctx), r.eval(ctx)),
            Resolved::Call(func, args) => {
                let values: Vec<f64> = args.iter().map(|a| a.eval(ctx)).collect();
                func.apply(&values)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_and_eval() {
        let expr: Expr = "net * f + A.C - B".parse().unwrap();
        let lookup = |name: &str| -> Result<SymbolRef, ConfigurationError> {
            match name {
                "net" => Ok(SymbolRef::Param(0)),
                "f" => Ok(SymbolRef::Param(1)),
                "A.C" => Ok(SymbolRef::Delta(0)),
                "B" => Ok(SymbolRef::Mass(1)),
                other => Err(ConfigurationError::InvalidSymbol {
                    reaction: "test".into(),
                    symbol: other.into(),
                }),
            }
        };
        let resolved = Resolved::from_expr(&expr, &lookup).unwrap();
        let ctx = EvalContext {
            params: &[0.1, 0.5],
            mass: &[10.0, 4.0],
            delta: &[-46.2, 0.0],
        };
        let v = resolved.eval(&ctx);
        assert!((v - (0.05 - 46.2 - 4.0)).abs() < 1e-12);
    }

    #[test]
    fn unknown_symbol_propagates() {
        let expr: Expr = "x + 1".parse().unwrap();
        let lookup = |name: &str| -> Result<SymbolRef, ConfigurationError> {
            Err(ConfigurationError::InvalidSymbol {
                reaction: "r".into(),
                symbol: name.into(),
            })
        };
        assert!(Resolved::from_expr(&expr, &lookup).is_err());
    }
}
