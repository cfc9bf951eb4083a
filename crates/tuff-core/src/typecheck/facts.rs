//! Flow facts derived from branch conditions
//!
//! A guard such as `if (i < 3 && d != 0)` tells the checker something about
//! `i` and `d` inside the then-branch, and the negation of the guard holds in
//! the else-branch. Only comparisons between an identifier and an integer
//! literal produce facts; everything else is ignored, which keeps the
//! analysis sound without a solver.

use super::resolve::is_usize_zero_literal;
use super::type_info::{Bound, BoundPatch};
use crate::ast::{BinaryOp, Expr};
use indexmap::IndexMap;
use std::rc::Rc;

/// Identifier to bound patch. Cloning is O(1); the map is copied on the
/// first write after a branch point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facts {
    patches: Rc<IndexMap<String, BoundPatch>>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&BoundPatch> {
        self.patches.get(name)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BoundPatch)> {
        self.patches.iter()
    }

    /// Layer `patch` over whatever is already known about `name`.
    pub fn add(&mut self, name: &str, patch: BoundPatch) {
        Rc::make_mut(&mut self.patches)
            .entry(name.to_string())
            .or_default()
            .overlay(&patch);
    }

    /// Drop everything known about `name`, e.g. after it is reassigned.
    pub fn forget(&mut self, name: &str) {
        if self.patches.contains_key(name) {
            Rc::make_mut(&mut self.patches).shift_remove(name);
        }
    }

    /// `self` overlaid with `extra`; `extra` wins field by field.
    pub fn merged(&self, extra: &Facts) -> Facts {
        if extra.is_empty() {
            return self.clone();
        }
        let mut out = self.clone();
        for (name, patch) in extra.iter() {
            out.add(name, *patch);
        }
        out
    }
}

/// Facts that hold when `cond` evaluates to `assume_true`.
///
/// `a && b` contributes both sides only when assumed true, `a || b` only when
/// assumed false (De Morgan). A comparison assumed false contributes its
/// negation.
pub fn derive_facts(cond: &Expr, assume_true: bool) -> Facts {
    let mut facts = Facts::new();
    visit(cond, assume_true, &mut facts);
    facts
}

/// Per-field override of `base` by `extra`.
pub fn merge_facts(base: &Facts, extra: &Facts) -> Facts {
    base.merged(extra)
}

fn visit(expr: &Expr, truthy: bool, facts: &mut Facts) {
    let Expr::BinaryExpr(bin) = expr else {
        return;
    };
    match bin.op {
        BinaryOp::And => {
            if truthy {
                visit(&bin.left, true, facts);
                visit(&bin.right, true, facts);
            }
        }
        BinaryOp::Or => {
            if !truthy {
                visit(&bin.left, false, facts);
                visit(&bin.right, false, facts);
            }
        }
        op => {
            let effective = if truthy { Some(op) } else { op.negated() };
            if let Some(op) = effective {
                from_comparison(&bin.left, op, &bin.right, facts);
            }
        }
    }
}

fn from_comparison(left: &Expr, op: BinaryOp, right: &Expr, facts: &mut Facts) {
    match (left, right) {
        (Expr::Identifier(id), literal) => {
            let Some(value) = literal.as_int_literal().map(Bound::from) else {
                return;
            };
            let patch = match op {
                BinaryOp::Lt => BoundPatch::at_most(value - 1),
                BinaryOp::LtEq => BoundPatch::at_most(value),
                BinaryOp::Gt => BoundPatch::at_least(value + 1),
                BinaryOp::GtEq => BoundPatch::at_least(value),
                BinaryOp::Eq => BoundPatch::exactly(value),
                BinaryOp::NotEq if value == 0 => BoundPatch::nonzero(),
                _ => return,
            };
            facts.add(&id.name, patch);
            if op == BinaryOp::NotEq && is_usize_zero_literal(literal) {
                facts.add(&id.name, BoundPatch::nonnull());
            }
        }
        (literal, Expr::Identifier(id)) if op == BinaryOp::NotEq && is_usize_zero_literal(literal) => {
            facts.add(&id.name, BoundPatch::nonnull());
        }
        _ => {}
    }
}
