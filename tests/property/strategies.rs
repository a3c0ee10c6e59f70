//! Proptest strategies for generating small elle-ioc programs together
//! with their expected results.

#![allow(dead_code)]

use proptest::prelude::*;

/// Integer expression tree with a reference evaluator.
#[derive(Debug, Clone)]
pub enum Expr {
    Num(i64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    /// `(if (< a b) then else)`
    IfLess(Box<Expr>, Box<Expr>, Box<Expr>, Box<Expr>),
    /// `(yield e)`: the driver resumes with the yielded value
    Yield(Box<Expr>),
    /// `(let [v e] (+ v v))`
    LetDouble(Box<Expr>),
}

impl Expr {
    pub fn to_source(&self) -> String {
        match self {
            Expr::Num(n) => n.to_string(),
            Expr::Add(a, b) => format!("(+ {} {})", a.to_source(), b.to_source()),
            Expr::Sub(a, b) => format!("(- {} {})", a.to_source(), b.to_source()),
            Expr::Mul(a, b) => format!("(* {} {})", a.to_source(), b.to_source()),
            Expr::IfLess(a, b, t, e) => format!(
                "(if (< {} {}) {} {})",
                a.to_source(),
                b.to_source(),
                t.to_source(),
                e.to_source()
            ),
            Expr::Yield(e) => format!("(yield {})", e.to_source()),
            Expr::LetDouble(e) => format!("(let [v {}] (+ v v))", e.to_source()),
        }
    }

    /// Source with every yield removed
    pub fn to_plain_source(&self) -> String {
        match self {
            Expr::Yield(e) => e.to_plain_source(),
            Expr::Num(n) => n.to_string(),
            Expr::Add(a, b) => format!("(+ {} {})", a.to_plain_source(), b.to_plain_source()),
            Expr::Sub(a, b) => format!("(- {} {})", a.to_plain_source(), b.to_plain_source()),
            Expr::Mul(a, b) => format!("(* {} {})", a.to_plain_source(), b.to_plain_source()),
            Expr::IfLess(a, b, t, e) => format!(
                "(if (< {} {}) {} {})",
                a.to_plain_source(),
                b.to_plain_source(),
                t.to_plain_source(),
                e.to_plain_source()
            ),
            Expr::LetDouble(e) => format!("(let [v {}] (+ v v))", e.to_plain_source()),
        }
    }

    /// Reference result plus the values yielded, in evaluation order
    pub fn eval(&self, yielded: &mut Vec<i64>) -> i64 {
        match self {
            Expr::Num(n) => *n,
            Expr::Add(a, b) => {
                let a = a.eval(yielded);
                a + b.eval(yielded)
            }
            Expr::Sub(a, b) => {
                let a = a.eval(yielded);
                a - b.eval(yielded)
            }
            Expr::Mul(a, b) => {
                let a = a.eval(yielded);
                a * b.eval(yielded)
            }
            Expr::IfLess(a, b, t, e) => {
                let a = a.eval(yielded);
                if a < b.eval(yielded) {
                    t.eval(yielded)
                } else {
                    e.eval(yielded)
                }
            }
            Expr::Yield(e) => {
                let v = e.eval(yielded);
                yielded.push(v);
                v
            }
            Expr::LetDouble(e) => {
                let v = e.eval(yielded);
                v + v
            }
        }
    }
}

/// Expression trees of bounded depth over small integers
pub fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = (-20i64..20).prop_map(Expr::Num);
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::Add(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::Sub(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::Mul(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone(), inner.clone(), inner.clone()).prop_map(|(a, b, t, e)| {
                Expr::IfLess(Box::new(a), Box::new(b), Box::new(t), Box::new(e))
            }),
            inner.clone().prop_map(|e| Expr::Yield(Box::new(e))),
            inner.prop_map(|e| Expr::LetDouble(Box::new(e))),
        ]
    })
}
