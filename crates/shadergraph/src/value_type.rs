// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot value types and the conversion rules between them.
//!
//! A slot declares a [`ValueType`], which may be [`ValueType::Dynamic`]. The
//! validator resolves every slot to a [`ConcreteValueType`]. The declaration
//! order of [`ConcreteValueType`] is significant: dynamic resolution picks the
//! greatest variant by ordinal, not by channel count.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type declared by a slot's author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Scalar
    Vector1,
    /// 2 component vector
    Vector2,
    /// 3 component vector
    Vector3,
    /// 4 component vector
    Vector4,
    /// 2D texture object
    Texture2D,
    /// 2x2 matrix
    Matrix2,
    /// 3x3 matrix
    Matrix3,
    /// 4x4 matrix
    Matrix4,
    /// Sampler state
    SamplerState,
    /// Resolved from whatever is connected
    Dynamic,
}

impl ValueType {
    /// Direct mapping to a concrete type.
    ///
    /// `Dynamic` has no direct mapping and yields [`ConcreteValueType::Error`].
    pub fn to_concrete(self) -> ConcreteValueType {
        match self {
            Self::Vector1 => ConcreteValueType::Vector1,
            Self::Vector2 => ConcreteValueType::Vector2,
            Self::Vector3 => ConcreteValueType::Vector3,
            Self::Vector4 => ConcreteValueType::Vector4,
            Self::Texture2D => ConcreteValueType::Texture2D,
            Self::Matrix2 => ConcreteValueType::Matrix2,
            Self::Matrix3 => ConcreteValueType::Matrix3,
            Self::Matrix4 => ConcreteValueType::Matrix4,
            Self::SamplerState => ConcreteValueType::SamplerState,
            Self::Dynamic => ConcreteValueType::Error,
        }
    }

    /// Whether this is the dynamic placeholder
    pub fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }
}

/// Type of a slot after validation.
///
/// The variant order is part of the resolution contract (see
/// [`resolve_dynamic_type`]). Do not reorder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum ConcreteValueType {
    /// Scalar
    #[default]
    Vector1,
    /// 2 component vector
    Vector2,
    /// 3 component vector
    Vector3,
    /// 4 component vector
    Vector4,
    /// 2D texture object
    Texture2D,
    /// 2x2 matrix
    Matrix2,
    /// 3x3 matrix
    Matrix3,
    /// 4x4 matrix
    Matrix4,
    /// Sampler state
    SamplerState,
    /// Resolution failed
    Error,
}

impl ConcreteValueType {
    /// Number of scalar channels, 0 for non-vector categories
    pub fn channel_count(self) -> usize {
        match self {
            Self::Vector1 => 1,
            Self::Vector2 => 2,
            Self::Vector3 => 3,
            Self::Vector4 => 4,
            _ => 0,
        }
    }

    /// Whether this is one of the vector types
    pub fn is_vector(self) -> bool {
        self.channel_count() > 0
    }

    /// Whether resolution failed
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for ConcreteValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Check whether a value of type `from` can feed a slot of type `to`
pub fn implicit_conversion_exists(from: ConcreteValueType, to: ConcreteValueType) -> bool {
    if from == to {
        return true;
    }

    let to_count = to.channel_count();

    // Scalars promote to any vector width
    if from == ConcreteValueType::Vector1 && to_count > 0 {
        return true;
    }

    if to_count == 0 {
        return false;
    }

    // Narrowing or equal width only
    to_count <= from.channel_count()
}

/// Resolve the type of a connection into a non-dynamic slot.
///
/// Returns `to` when `from` converts implicitly, otherwise `Error`.
pub fn common_channel_type(from: ConcreteValueType, to: ConcreteValueType) -> ConcreteValueType {
    if implicit_conversion_exists(from, to) {
        to
    } else {
        ConcreteValueType::Error
    }
}

/// Compute the single type shared by all dynamic inputs of a node.
///
/// Any `Error` wins. With no inputs the result is `Vector1`. With several
/// distinct inputs `Vector1` is dropped (it promotes) and the greatest
/// remaining type by declaration order is chosen.
pub fn resolve_dynamic_type<I>(input_types: I) -> ConcreteValueType
where
    I: IntoIterator<Item = ConcreteValueType>,
{
    let mut distinct: Vec<ConcreteValueType> = Vec::new();
    for ty in input_types {
        if ty.is_error() {
            return ConcreteValueType::Error;
        }
        if !distinct.contains(&ty) {
            distinct.push(ty);
        }
    }

    match distinct.len() {
        0 => ConcreteValueType::Vector1,
        1 => distinct[0],
        _ => distinct
            .into_iter()
            .filter(|ty| *ty != ConcreteValueType::Vector1)
            .max()
            .unwrap_or(ConcreteValueType::Error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConcreteValueType as C;

    #[test]
    fn test_declared_to_concrete() {
        assert_eq!(ValueType::Vector3.to_concrete(), C::Vector3);
        assert_eq!(ValueType::SamplerState.to_concrete(), C::SamplerState);
        assert_eq!(ValueType::Dynamic.to_concrete(), C::Error);
    }

    #[test]
    fn test_conversion_rules() {
        assert!(implicit_conversion_exists(C::Vector1, C::Vector4));
        assert!(implicit_conversion_exists(C::Vector4, C::Vector2));
        assert!(!implicit_conversion_exists(C::Vector2, C::Vector4));
        assert!(implicit_conversion_exists(C::Texture2D, C::Texture2D));
        assert!(!implicit_conversion_exists(C::Vector1, C::Texture2D));
        assert!(!implicit_conversion_exists(C::Matrix4, C::Vector4));
        assert!(!implicit_conversion_exists(C::Matrix3, C::Matrix4));
    }

    #[test]
    fn test_common_channel_type() {
        assert_eq!(common_channel_type(C::Vector1, C::Vector3), C::Vector3);
        assert_eq!(common_channel_type(C::Vector2, C::Vector4), C::Error);
        assert_eq!(common_channel_type(C::Error, C::Vector1), C::Error);
    }

    #[test]
    fn test_dynamic_resolution() {
        assert_eq!(resolve_dynamic_type([]), C::Vector1);
        assert_eq!(resolve_dynamic_type([C::Vector3, C::Vector3]), C::Vector3);
        assert_eq!(resolve_dynamic_type([C::Vector1, C::Vector4]), C::Vector4);
        assert_eq!(resolve_dynamic_type([C::Vector2, C::Error]), C::Error);
    }

    #[test]
    fn test_dynamic_resolution_uses_declaration_order() {
        // Ordinal, not channel count: a texture outranks every vector
        assert_eq!(resolve_dynamic_type([C::Vector4, C::Texture2D]), C::Texture2D);
        assert_eq!(resolve_dynamic_type([C::Vector2, C::Vector3]), C::Vector3);
        assert_eq!(resolve_dynamic_type([C::Matrix2, C::SamplerState]), C::SamplerState);
    }
}
