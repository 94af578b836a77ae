//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Merge imports use the entity id as the collision key, so two records with
/// the same id are the same record regardless of their other fields.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
