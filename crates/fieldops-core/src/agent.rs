//! # Field Agent Record
//!
//! The agent record as the dispatcher sees it: identity, an optional
//! location, an availability flag, and read-only contact details.
//!
//! An agent without a coordinate is never selectable for dispatch. The
//! availability flag is shared, externally mutated state — the engine
//! reads it optimistically and flips it as reservation bookkeeping when
//! a request is assigned to or rejected by the agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::ValidationError;
use crate::identity::AgentId;

/// A field agent capable of being dispatched to a service request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Contact name shown to the requesting user on acceptance.
    pub name: String,
    /// Shop or depot the agent operates from.
    pub shop: String,
    /// Contact phone number, free-form.
    pub phone: String,
    pub city: String,
    /// Last known location. `None` means the agent has never reported a
    /// position and cannot be selected.
    pub coordinate: Option<Coordinate>,
    /// Whether the agent can take a new assignment right now.
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// Create a new agent record, available by default.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] when a contact field is
    /// empty or whitespace-only.
    pub fn new(
        name: impl Into<String>,
        shop: impl Into<String>,
        phone: impl Into<String>,
        city: impl Into<String>,
        coordinate: Option<Coordinate>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let shop = shop.into();
        let phone = phone.into();
        let city = city.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if shop.trim().is_empty() {
            return Err(ValidationError::EmptyField("shop"));
        }
        if phone.trim().is_empty() {
            return Err(ValidationError::EmptyField("phone"));
        }
        Ok(Self {
            id: AgentId::new(),
            name,
            shop,
            phone,
            city,
            coordinate,
            available: true,
            created_at: Utc::now(),
        })
    }

    /// Whether this agent can currently be offered a request: available
    /// and with a known location.
    pub fn is_selectable(&self) -> bool {
        self.available && self.coordinate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_agent_is_available() {
        let agent = Agent::new("Ali", "Clifton Motors", "0300-1234567", "Karachi", None).unwrap();
        assert!(agent.available);
        assert!(!agent.is_selectable()); // no coordinate yet
    }

    #[test]
    fn located_available_agent_is_selectable() {
        let coord = Coordinate::new(24.86, 67.0).unwrap();
        let agent =
            Agent::new("Sara", "DHA Autoworks", "0321-7654321", "Karachi", Some(coord)).unwrap();
        assert!(agent.is_selectable());
    }

    #[test]
    fn empty_contact_fields_are_rejected() {
        assert_eq!(
            Agent::new("", "Shop", "123", "Lahore", None).unwrap_err(),
            ValidationError::EmptyField("name")
        );
        assert_eq!(
            Agent::new("Ayesha", "Shop", "  ", "Lahore", None).unwrap_err(),
            ValidationError::EmptyField("phone")
        );
    }
}
