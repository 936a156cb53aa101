//! Entity trait: identity + tenant ownership.

use crate::id::TenantId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity that can be resolved to the tenant owning it.
///
/// Jobs only know their customer, so the tenant is resolved by the store
/// through the customer chain; entities that carry the tenant directly
/// implement this trait.
pub trait TenantOwned {
    fn tenant_id(&self) -> TenantId;

    fn is_owned_by(&self, tenant_id: TenantId) -> bool {
        self.tenant_id() == tenant_id
    }
}
