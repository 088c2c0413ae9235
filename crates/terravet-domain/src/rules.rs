use std::collections::BTreeMap;

use crate::error::DomainError;
use crate::types::VarValue;

/// Azure rejects rule priorities outside this range.
pub const MIN_RULE_PRIORITY: u16 = 100;
pub const MAX_RULE_PRIORITY: u16 = 4096;

// ── Enumerations ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "Inbound",
            Direction::Outbound => "Outbound",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Allow => "Allow",
            Access::Deny => "Deny",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    /// Matches any protocol; serializes to `*`.
    Any,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "Tcp",
            Protocol::Udp => "Udp",
            Protocol::Icmp => "Icmp",
            Protocol::Any => "*",
        }
    }
}

// ── Security rules ────────────────────────────────────────────────────────────

/// One network security rule, syntactically valid by construction.
///
/// The closed enums and the priority bound are the extent of validation
/// here — semantic checks (duplicate priorities, CIDR sanity) are the
/// provisioning tool's plan phase's job.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityRule {
    pub name: String,
    pub priority: u16,
    pub direction: Direction,
    pub access: Access,
    pub protocol: Protocol,
    pub source_port_range: String,
    pub destination_port_range: String,
    pub source_address_prefix: String,
    pub destination_address_prefix: String,
}

impl SecurityRule {
    pub fn new(
        name: impl Into<String>,
        priority: u16,
        direction: Direction,
        access: Access,
        protocol: Protocol,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::EmptyRuleName);
        }
        if !(MIN_RULE_PRIORITY..=MAX_RULE_PRIORITY).contains(&priority) {
            return Err(DomainError::RulePriorityOutOfRange {
                name,
                priority,
                min: MIN_RULE_PRIORITY,
                max: MAX_RULE_PRIORITY,
            });
        }
        Ok(Self {
            name,
            priority,
            direction,
            access,
            protocol,
            source_port_range: "*".into(),
            destination_port_range: "*".into(),
            source_address_prefix: "*".into(),
            destination_address_prefix: "*".into(),
        })
    }

    pub fn ports(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source_port_range = source.into();
        self.destination_port_range = destination.into();
        self
    }

    pub fn prefixes(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source_address_prefix = source.into();
        self.destination_address_prefix = destination.into();
        self
    }

    /// Flatten into the mapping shape the module's variable schema expects.
    pub fn to_var(&self) -> VarValue {
        let mut m = BTreeMap::new();
        m.insert("name".into(), VarValue::from(self.name.as_str()));
        m.insert("priority".into(), VarValue::from(self.priority));
        m.insert("direction".into(), VarValue::from(self.direction.as_str()));
        m.insert("access".into(), VarValue::from(self.access.as_str()));
        m.insert("protocol".into(), VarValue::from(self.protocol.as_str()));
        m.insert(
            "source_port_range".into(),
            VarValue::from(self.source_port_range.as_str()),
        );
        m.insert(
            "destination_port_range".into(),
            VarValue::from(self.destination_port_range.as_str()),
        );
        m.insert(
            "source_address_prefix".into(),
            VarValue::from(self.source_address_prefix.as_str()),
        );
        m.insert(
            "destination_address_prefix".into(),
            VarValue::from(self.destination_address_prefix.as_str()),
        );
        VarValue::Map(m)
    }
}
