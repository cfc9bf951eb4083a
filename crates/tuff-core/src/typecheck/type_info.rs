//! Interval-annotated type facts
//!
//! A [`TypeInfo`] is the abstract value the verifier tracks for every
//! expression: a type name plus optional integer bounds, a non-zero flag,
//! array lengths and union members. Bounds are `i128` so that any pair of
//! 64-bit literals can be added or multiplied without wrapping; anything
//! larger falls back to "unbounded".

use crate::ast::BinaryOp;
use smallvec::SmallVec;
use std::fmt;

/// Integer bound of an interval.
pub type Bound = i128;

pub const I32_MIN: Bound = i32::MIN as Bound;
pub const I32_MAX: Bound = i32::MAX as Bound;

pub const NUMERIC_TYPES: &[&str] = &[
    "I8", "I16", "I32", "I64", "I128", "U8", "U16", "U32", "U64", "U128", "USize", "ISize", "F32", "F64",
];

pub const UNSIGNED_TYPES: &[&str] = &["U8", "U16", "U32", "U64", "U128", "USize"];

pub const UNKNOWN: &str = "Unknown";
pub const VOID: &str = "Void";
pub const BOOL: &str = "Bool";

pub fn is_numeric(name: &str) -> bool {
    NUMERIC_TYPES.contains(&name)
}

pub fn is_unsigned(name: &str) -> bool {
    UNSIGNED_TYPES.contains(&name)
}

/// Single uppercase letters (`T`, `U`) stand for generic parameters.
pub fn is_type_variable(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(ch), None) if ch.is_ascii_uppercase())
}

/// Name-level compatibility: identical names, membership in an expected
/// union, or a `*mut T` flowing into a `*T` slot.
pub fn named_compatible(expected: &str, actual: &str) -> bool {
    if expected == actual {
        return true;
    }
    if expected.contains('|') && expected.split('|').map(str::trim).any(|part| part == actual) {
        return true;
    }
    match (expected.strip_prefix('*'), actual.strip_prefix("*mut ")) {
        (Some(expected_inner), Some(actual_inner)) if !expected.starts_with("*mut ") => {
            expected_inner == actual_inner
        }
        _ => false,
    }
}

/// Numeric widening between primitive numeric types. An unsigned target
/// only accepts values whose lower bound is proven non-negative.
pub fn numeric_compatible(expected: &str, actual: &TypeInfo) -> bool {
    if expected == actual.name {
        return true;
    }
    if !is_numeric(expected) || !is_numeric(&actual.name) {
        return false;
    }
    if is_unsigned(expected) {
        return actual.min.is_some_and(|min| min >= 0);
    }
    true
}

/// The abstract value of an expression or binding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeInfo {
    pub name: String,
    pub min: Option<Bound>,
    pub max: Option<Bound>,
    pub non_zero: bool,
    /// Statically known initialized length of an array.
    pub array_init: Option<Bound>,
    /// Statically known capacity of an array.
    pub array_total: Option<Bound>,
    /// Concrete member names when the type is a union.
    pub union_tags: SmallVec<[String; 4]>,
    /// Pointer type this value narrows to once proven non-null. Set only for
    /// `*T | USize == 0USize` unions.
    pub nullable_pointer: Option<String>,
}

impl TypeInfo {
    /// A bare named type with the implicit range of its name: the full
    /// 32-bit range for `I32`, a zero lower bound for unsigned types.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let (min, max) = base_range(&name);
        Self {
            name,
            min,
            max,
            ..Self::default()
        }
    }

    pub fn unknown() -> Self {
        Self::bare(UNKNOWN)
    }

    pub fn void() -> Self {
        Self::bare(VOID)
    }

    pub fn bool() -> Self {
        Self::bare(BOOL)
    }

    /// A named type with no bounds at all, whatever its name.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An integer literal: the singleton interval `[value, value]`.
    pub fn literal(name: impl Into<String>, value: Bound) -> Self {
        Self {
            name: name.into(),
            min: Some(value),
            max: Some(value),
            non_zero: value != 0,
            ..Self::default()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN
    }

    pub fn is_void(&self) -> bool {
        self.name == VOID
    }

    pub fn is_bool(&self) -> bool {
        self.name == BOOL
    }

    pub fn is_numeric(&self) -> bool {
        is_numeric(&self.name)
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable_pointer.is_some()
    }

    /// Both bounds, when known.
    pub fn interval(&self) -> Option<(Bound, Bound)> {
        Some((self.min?, self.max?))
    }

    pub fn with_bounds(mut self, min: Option<Bound>, max: Option<Bound>) -> Self {
        self.min = min;
        self.max = max;
        self.normalize()
    }

    /// Forget contradictory bounds and derive `non_zero` from bounds that
    /// exclude zero.
    pub fn normalize(mut self) -> Self {
        if let Some((min, max)) = self.interval() {
            if min > max {
                self.min = None;
                self.max = None;
            } else if min > 0 || max < 0 {
                self.non_zero = true;
            }
        }
        self
    }

    /// Least upper bound of two facts about the same type: the interval hull,
    /// non-zero only if both are. Different names join to `Unknown`.
    pub fn join(&self, other: &TypeInfo) -> TypeInfo {
        if self.name != other.name {
            return TypeInfo::unknown();
        }
        let lower = |a: Option<Bound>, b: Option<Bound>| Some(a?.min(b?));
        let upper = |a: Option<Bound>, b: Option<Bound>| Some(a?.max(b?));
        TypeInfo {
            name: self.name.clone(),
            min: lower(self.min, other.min),
            max: upper(self.max, other.max),
            non_zero: self.non_zero && other.non_zero,
            array_init: lower(self.array_init, other.array_init),
            array_total: lower(self.array_total, other.array_total),
            union_tags: self.union_tags.clone(),
            nullable_pointer: self.nullable_pointer.clone().or_else(|| other.nullable_pointer.clone()),
        }
    }

    /// The same type with every flow-derived refinement dropped: bounds
    /// reset to the implicit range of the name, non-zero forgotten.
    pub fn widened(&self) -> TypeInfo {
        let (min, max) = base_range(&self.name);
        TypeInfo {
            min,
            max,
            non_zero: false,
            ..self.clone()
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if f.alternate() && (self.min.is_some() || self.max.is_some()) {
            let show = |bound: Option<Bound>| bound.map_or_else(|| "?".to_string(), |b| b.to_string());
            write!(f, "[{}, {}]", show(self.min), show(self.max))?;
        }
        Ok(())
    }
}

fn base_range(name: &str) -> (Option<Bound>, Option<Bound>) {
    if name == "I32" {
        (Some(I32_MIN), Some(I32_MAX))
    } else if is_unsigned(name) {
        (Some(0), None)
    } else {
        (None, None)
    }
}

/// A partial [`TypeInfo`] learned from a guard or a declared type.
///
/// Layering patches is a per-field override: fields set in the newer patch
/// replace the older ones, unset fields are inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundPatch {
    pub min: Option<Bound>,
    pub max: Option<Bound>,
    pub non_zero: Option<bool>,
    /// The value is a pointer proven different from `0USize`.
    pub non_null: bool,
}

impl BoundPatch {
    pub fn at_least(min: Bound) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    pub fn at_most(max: Bound) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn exactly(value: Bound) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
            non_zero: Some(value != 0),
            non_null: false,
        }
    }

    pub fn nonzero() -> Self {
        Self {
            non_zero: Some(true),
            ..Self::default()
        }
    }

    pub fn nonnull() -> Self {
        Self {
            non_null: true,
            ..Self::default()
        }
    }

    pub fn overlay(&mut self, newer: &BoundPatch) {
        if newer.min.is_some() {
            self.min = newer.min;
        }
        if newer.max.is_some() {
            self.max = newer.max;
        }
        if newer.non_zero.is_some() {
            self.non_zero = newer.non_zero;
        }
        self.non_null |= newer.non_null;
    }
}

impl From<&TypeInfo> for BoundPatch {
    fn from(info: &TypeInfo) -> Self {
        Self {
            min: info.min,
            max: info.max,
            non_zero: info.non_zero.then_some(true),
            non_null: false,
        }
    }
}

/// Narrow `info` by `patch`: the larger lower bound and the smaller upper
/// bound win, a non-null fact collapses a nullable pointer to its pointer
/// branch. Contradictory bounds are reset to unknown.
pub fn intersect_bounds(info: &TypeInfo, patch: &BoundPatch) -> TypeInfo {
    let mut out = info.clone();
    if patch.non_null {
        if let Some(pointer) = out.nullable_pointer.take() {
            out.name = pointer;
            out.union_tags.clear();
            out.non_zero = true;
        }
    }
    if let Some(min) = patch.min {
        out.min = Some(out.min.map_or(min, |current| current.max(min)));
    }
    if let Some(max) = patch.max {
        out.max = Some(out.max.map_or(max, |current| current.min(max)));
    }
    if patch.non_zero == Some(true) {
        out.non_zero = true;
    }
    out.normalize()
}

/// Interval arithmetic for `+`, `-` and `*`. `None` when the operator has no
/// interval rule or a bound leaves the representable range.
pub fn propagate_interval(op: BinaryOp, left: (Bound, Bound), right: (Bound, Bound)) -> Option<(Bound, Bound)> {
    let ((lmin, lmax), (rmin, rmax)) = (left, right);
    match op {
        BinaryOp::Add => Some((lmin.checked_add(rmin)?, lmax.checked_add(rmax)?)),
        BinaryOp::Sub => Some((lmin.checked_sub(rmax)?, lmax.checked_sub(rmin)?)),
        BinaryOp::Mul => {
            let corners = [
                lmin.checked_mul(rmin)?,
                lmin.checked_mul(rmax)?,
                lmax.checked_mul(rmin)?,
                lmax.checked_mul(rmax)?,
            ];
            let low = corners.iter().copied().min()?;
            let high = corners.iter().copied().max()?;
            Some((low, high))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_applies_implicit_ranges() {
        let i32_info = TypeInfo::named("I32");
        assert_eq!(i32_info.interval(), Some((I32_MIN, I32_MAX)));
        assert!(!i32_info.non_zero);

        let usize_info = TypeInfo::named("USize");
        assert_eq!((usize_info.min, usize_info.max), (Some(0), None));

        let bool_info = TypeInfo::named("Bool");
        assert_eq!((bool_info.min, bool_info.max), (None, None));
    }

    #[test]
    fn test_intersect_narrows_and_derives_non_zero() {
        let info = TypeInfo::named("I32");
        let narrowed = intersect_bounds(&info, &BoundPatch::at_least(1));
        assert_eq!(narrowed.interval(), Some((1, I32_MAX)));
        assert!(narrowed.non_zero);
    }

    #[test]
    fn test_intersect_resets_contradiction() {
        let info = TypeInfo::literal("I32", 5);
        let narrowed = intersect_bounds(&info, &BoundPatch::at_most(2));
        assert_eq!((narrowed.min, narrowed.max), (None, None));
    }

    #[test]
    fn test_non_null_collapses_nullable_pointer() {
        let info = TypeInfo {
            name: "*I32|USize".to_string(),
            nullable_pointer: Some("*I32".to_string()),
            union_tags: SmallVec::from_vec(vec!["*I32".to_string(), "USize".to_string()]),
            ..TypeInfo::default()
        };
        let narrowed = intersect_bounds(&info, &BoundPatch::nonnull());
        assert_eq!(narrowed.name, "*I32");
        assert!(narrowed.non_zero);
        assert!(!narrowed.is_nullable());
        assert!(narrowed.union_tags.is_empty());
    }

    #[test]
    fn test_overlay_overrides_per_field() {
        let mut base = BoundPatch {
            min: Some(0),
            non_zero: Some(true),
            ..BoundPatch::default()
        };
        base.overlay(&BoundPatch::exactly(0));
        assert_eq!(base.min, Some(0));
        assert_eq!(base.max, Some(0));
        assert_eq!(base.non_zero, Some(false));
    }

    #[test]
    fn test_interval_arithmetic() {
        assert_eq!(propagate_interval(BinaryOp::Add, (1, 2), (10, 20)), Some((11, 22)));
        assert_eq!(propagate_interval(BinaryOp::Sub, (1, 2), (10, 20)), Some((-19, -8)));
        assert_eq!(propagate_interval(BinaryOp::Mul, (-2, 3), (-5, 4)), Some((-15, 12)));
        assert_eq!(propagate_interval(BinaryOp::Div, (1, 2), (1, 2)), None);
        assert_eq!(propagate_interval(BinaryOp::Mul, (Bound::MAX, Bound::MAX), (2, 2)), None);
    }

    #[test]
    fn test_join_is_hull() {
        let a = TypeInfo::literal("I32", 1);
        let b = TypeInfo::literal("I32", 0);
        let joined = a.join(&b);
        assert_eq!(joined.interval(), Some((0, 1)));
        assert!(!joined.non_zero);
        assert!(a.join(&TypeInfo::bool()).is_unknown());
    }

    #[test]
    fn test_compatibility_rules() {
        assert!(named_compatible("Circle|Square", "Square"));
        assert!(named_compatible("*I32", "*mut I32"));
        assert!(!named_compatible("*mut I32", "*I32"));
        assert!(!named_compatible("I32", "Bool"));

        assert!(numeric_compatible("USize", &TypeInfo::literal("I32", 2)));
        assert!(!numeric_compatible("USize", &TypeInfo::named("I32")));
        assert!(numeric_compatible("I64", &TypeInfo::named("I32")));
        assert!(!numeric_compatible("Bool", &TypeInfo::named("I32")));

        assert!(is_type_variable("T"));
        assert!(!is_type_variable("TT"));
        assert!(!is_type_variable("t"));
    }

    #[test]
    fn test_display_alternate_shows_bounds() {
        let info = TypeInfo::named("USize");
        assert_eq!(format!("{info}"), "USize");
        assert_eq!(format!("{info:#}"), "USize[0, ?]");
    }
}
