//! Type expression to [`TypeInfo`] resolution
//!
//! Turns a syntactic type (named, refined, union, array, pointer) into the
//! abstract value the inferencers track. Alias chains are followed with a
//! visited set so that self-referential aliases terminate.

use super::registry::Registry;
use super::type_info::{intersect_bounds, BoundPatch, TypeInfo, UNKNOWN};
use crate::ast::{BinaryOp, Expr, NamedType, RefinementType, TypeExpr, UnionType};
use smallvec::SmallVec;

impl<'p> Registry<'p> {
    /// Resolve an optional annotation; a missing one is `Unknown`.
    pub fn resolve_type_info(&self, ty: Option<&TypeExpr>) -> TypeInfo {
        match ty {
            Some(ty) => self.resolve_with(ty, &mut SmallVec::new()),
            None => TypeInfo::unknown(),
        }
    }

    /// Resolve a bare type name as if it were written as a `NamedType`.
    pub fn resolve_name(&self, name: &str) -> TypeInfo {
        self.resolve_with(&TypeExpr::named(name), &mut SmallVec::new())
    }

    fn resolve_with(&self, ty: &TypeExpr, visited: &mut SmallVec<[String; 4]>) -> TypeInfo {
        match ty {
            TypeExpr::NamedType(named) => self.resolve_named(named, visited),
            TypeExpr::RefinementType(refined) => self.resolve_refinement(refined, visited),
            TypeExpr::UnionType(union) => self.resolve_union(union, visited),
            TypeExpr::ArrayType(array) => TypeInfo {
                array_init: array.init.as_deref().and_then(Expr::as_int_literal).map(i128::from),
                array_total: array.total.as_deref().and_then(Expr::as_int_literal).map(i128::from),
                ..TypeInfo::bare("Array")
            },
            TypeExpr::PointerType(pointer) => {
                let inner = self.resolve_with(&pointer.to, visited);
                let name = if pointer.mutable {
                    format!("*mut {}", inner.name)
                } else {
                    format!("*{}", inner.name)
                };
                TypeInfo { name, ..inner }
            }
            TypeExpr::TupleType(_) => TypeInfo::unknown(),
        }
    }

    fn resolve_named(&self, named: &NamedType, visited: &mut SmallVec<[String; 4]>) -> TypeInfo {
        let mut info = TypeInfo::named(&named.name);
        let Some(target) = self.alias_target(&named.name) else {
            return info;
        };
        if visited.iter().any(|seen| seen == &named.name) {
            return info;
        }
        // Opaque extern types stay nominal.
        let Some(target) = target else {
            return info;
        };
        visited.push(named.name.clone());
        let resolved = self.resolve_with(target, visited);
        visited.pop();
        if !resolved.union_tags.is_empty() {
            // Union aliases keep their own name so matches can refer to it.
            info.union_tags = resolved.union_tags;
            info.nullable_pointer = resolved.nullable_pointer;
            info
        } else if resolved.is_unknown() {
            info
        } else {
            resolved
        }
    }

    fn resolve_refinement(&self, refined: &RefinementType, visited: &mut SmallVec<[String; 4]>) -> TypeInfo {
        let base = self.resolve_with(&refined.base, visited);
        let Some(value) = refined.value_expr.as_int_literal().map(i128::from) else {
            return base;
        };
        let patch = match refined.op {
            BinaryOp::Lt => BoundPatch::at_most(value - 1),
            BinaryOp::LtEq => BoundPatch::at_most(value),
            BinaryOp::Gt => BoundPatch::at_least(value + 1),
            BinaryOp::GtEq => BoundPatch::at_least(value),
            BinaryOp::Eq => BoundPatch::exactly(value),
            BinaryOp::NotEq if value == 0 => BoundPatch::nonzero(),
            _ => return base,
        };
        intersect_bounds(&base, &patch)
    }

    fn resolve_union(&self, union: &UnionType, visited: &mut SmallVec<[String; 4]>) -> TypeInfo {
        let left = self.resolve_with(&union.left, visited);
        let right = self.resolve_with(&union.right, visited);

        let mut tags: SmallVec<[String; 4]> = SmallVec::new();
        for side in [&left, &right] {
            let members: Vec<&String> = if side.union_tags.is_empty() {
                vec![&side.name]
            } else {
                side.union_tags.iter().collect()
            };
            for member in members {
                if member != UNKNOWN && !tags.contains(member) {
                    tags.push(member.clone());
                }
            }
        }

        TypeInfo {
            name: format!("{}|{}", left.name, right.name),
            union_tags: tags,
            nullable_pointer: nullable_pointer_branch(union).map(|pointer| {
                self.resolve_with(pointer, visited).name
            }),
            ..TypeInfo::default()
        }
    }
}

/// The pointer half of a `*T | USize == 0USize` union, in either order.
fn nullable_pointer_branch(union: &UnionType) -> Option<&TypeExpr> {
    match (union.left.as_ref(), union.right.as_ref()) {
        (pointer @ TypeExpr::PointerType(_), other) | (other, pointer @ TypeExpr::PointerType(_))
            if is_usize_zero(other) =>
        {
            Some(pointer)
        }
        _ => None,
    }
}

fn is_usize_zero(ty: &TypeExpr) -> bool {
    let TypeExpr::RefinementType(refined) = ty else {
        return false;
    };
    refined.op == BinaryOp::Eq
        && matches!(refined.base.as_ref(), TypeExpr::NamedType(base) if base.name == "USize")
        && is_usize_zero_literal(&refined.value_expr)
}

pub(crate) fn is_usize_zero_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::NumberLiteral(lit) if lit.value == 0 && lit.number_type.as_deref() == Some("USize"))
}
