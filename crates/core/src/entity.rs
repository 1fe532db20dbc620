//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Collections in the entity store are plain ordered `Vec`s; lookups go
/// through [`find_by_id`] / [`find_by_id_mut`] so every read-modify-write is
/// keyed by identity rather than by position.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

pub fn find_by_id<E: Entity>(entities: &[E], id: E::Id) -> Option<&E> {
    entities.iter().find(|e| e.id() == id)
}

pub fn find_by_id_mut<E: Entity>(entities: &mut [E], id: E::Id) -> Option<&mut E> {
    entities.iter_mut().find(|e| e.id() == id)
}
