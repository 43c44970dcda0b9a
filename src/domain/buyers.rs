//! Buyers

use crate::uuids::TypedUuid;

/// Marker for identities issued by the authentication collaborator.
#[derive(Debug)]
pub struct Buyer;

/// Buyer UUID
pub type BuyerUuid = TypedUuid<Buyer>;
