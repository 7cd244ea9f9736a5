//! # Roles and Actors
//!
//! The platform has three roles. An [`Actor`] pairs a role with the
//! identity of the caller, which is everything the lifecycle state machine
//! needs to decide whether an operation is permitted.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{AdminId, DriverId, RiderId};

/// Platform roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Requests rides.
    Rider,
    /// Fulfils rides.
    Driver,
    /// Oversees the platform; may force-cancel rides before pickup.
    Admin,
}

impl Role {
    /// Return the wire representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rider => "RIDER",
            Self::Driver => "DRIVER",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    /// Case-insensitive parse of `rider`, `driver` or `admin`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rider" => Ok(Self::Rider),
            "driver" => Ok(Self::Driver),
            "admin" => Ok(Self::Admin),
            _ => Err(ValidationError::InvalidRole(s.to_string())),
        }
    }
}

/// The party attempting an operation: a role plus an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    /// A rider.
    Rider(RiderId),
    /// A driver.
    Driver(DriverId),
    /// An administrator.
    Admin(AdminId),
}

impl Actor {
    /// The actor's role.
    pub fn role(&self) -> Role {
        match self {
            Self::Rider(_) => Role::Rider,
            Self::Driver(_) => Role::Driver,
            Self::Admin(_) => Role::Admin,
        }
    }

    /// The rider identity, if this actor is a rider.
    pub fn rider_id(&self) -> Option<RiderId> {
        match self {
            Self::Rider(id) => Some(*id),
            _ => None,
        }
    }

    /// The driver identity, if this actor is a driver.
    pub fn driver_id(&self) -> Option<DriverId> {
        match self {
            Self::Driver(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether this actor is an administrator.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// Build an actor from a role and a raw UUID.
    pub fn from_parts(role: Role, id: uuid::Uuid) -> Self {
        match role {
            Role::Rider => Self::Rider(RiderId::from_uuid(id)),
            Role::Driver => Self::Driver(DriverId::from_uuid(id)),
            Role::Admin => Self::Admin(AdminId::from_uuid(id)),
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rider(id) => write!(f, "RIDER:{id}"),
            Self::Driver(id) => write!(f, "DRIVER:{id}"),
            Self::Admin(id) => write!(f, "ADMIN:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("Rider".parse::<Role>().unwrap(), Role::Rider);
        assert_eq!("DRIVER".parse::<Role>().unwrap(), Role::Driver);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("passenger".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_screaming_case() {
        assert_eq!(serde_json::to_string(&Role::Driver).unwrap(), "\"DRIVER\"");
    }

    #[test]
    fn actor_accessors_match_variant() {
        let d = DriverId::new();
        let actor = Actor::Driver(d);
        assert_eq!(actor.role(), Role::Driver);
        assert_eq!(actor.driver_id(), Some(d));
        assert_eq!(actor.rider_id(), None);
        assert!(!actor.is_admin());
    }

    #[test]
    fn actor_serializes_with_role_tag() {
        let id = RiderId::new();
        let json = serde_json::to_value(Actor::Rider(id)).unwrap();
        assert_eq!(json["role"], "RIDER");
        assert_eq!(json["id"], id.to_string());
    }

    #[test]
    fn from_parts_builds_matching_variant() {
        let uuid = uuid::Uuid::new_v4();
        assert_eq!(
            Actor::from_parts(Role::Admin, uuid),
            Actor::Admin(AdminId::from_uuid(uuid))
        );
    }
}
