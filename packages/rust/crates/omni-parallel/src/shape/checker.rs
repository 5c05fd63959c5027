use crate::error::{MemberKind, ParallelError, Result};

use super::{MethodShape, ObjectShape};

/// Validates that a candidate exposes every member of an expected shape.
pub trait ShapeChecker: Send + Sync {
    /// Succeeds when `candidate` satisfies `expected`.
    ///
    /// # Errors
    /// Returns [`ParallelError::ShapeMismatch`] naming the first missing member.
    fn check(&self, candidate: &ObjectShape, expected: &ObjectShape) -> Result<()>;
}

/// Member-by-member structural check: names compare case-insensitively, property types
/// exactly, and a method matches when any overload parameter list is shared.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralShapeChecker;

impl ShapeChecker for StructuralShapeChecker {
    fn check(&self, candidate: &ObjectShape, expected: &ObjectShape) -> Result<()> {
        for property in &expected.properties {
            let found = candidate.properties.iter().any(|have| {
                have.name.eq_ignore_ascii_case(&property.name) && have.type_name == property.type_name
            });
            if !found {
                return Err(mismatch(expected, &property.name, MemberKind::Property));
            }
        }

        for method in &expected.methods {
            let found = candidate
                .methods
                .iter()
                .filter(|have| have.name.eq_ignore_ascii_case(&method.name))
                .any(|have| overloads_intersect(have, method));
            if !found {
                return Err(mismatch(expected, &method.name, MemberKind::Method));
            }
        }
        Ok(())
    }
}

fn overloads_intersect(a: &MethodShape, b: &MethodShape) -> bool {
    a.overloads
        .iter()
        .any(|left| b.overloads.iter().any(|right| left == right))
}

fn mismatch(expected: &ObjectShape, member: &str, kind: MemberKind) -> ParallelError {
    ParallelError::ShapeMismatch {
        shape: expected.name.clone(),
        member: member.to_string(),
        kind,
    }
}
