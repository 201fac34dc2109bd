//! Hostname synthesis
//!
//! Turns one instance into the names other processes can resolve it by.
//! Given an instance with an address and a role tag, in this order:
//!
//! 1. `<id>.<role>.<suffix>`: one instance within its role
//! 2. `<id>.<suffix>`: one instance regardless of role
//! 3. `<role>.<suffix>`: every instance with this role (round robin)
//! 4. `<prefix>.<suffix>`: only for numbered roles like `director-0`; every
//!    replica of the role family (`director`) as one round-robin name
//!
//! Instances without an address or without a role tag produce nothing.
//! Neither does an instance whose id or role is not a valid DNS label:
//! those values end up verbatim in the hosts file, one line per entry.

use crate::config::{NamingConfig, validate_label};
use crate::traits::InstanceRecord;
use std::fmt;
use std::net::IpAddr;

/// One resolvable name → address mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostEntry {
    pub address: IpAddr,
    pub hostname: String,
}

impl HostEntry {
    pub fn new(address: IpAddr, hostname: impl Into<String>) -> Self {
        Self {
            address,
            hostname: hostname.into(),
        }
    }
}

/// Renders the hosts-file line (without the newline)
impl fmt::Display for HostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.address, self.hostname)
    }
}

/// Naming rules for one deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingRules {
    domain_suffix: String,
    role_tag: String,
}

impl NamingRules {
    pub fn new(domain_suffix: impl Into<String>, role_tag: impl Into<String>) -> Self {
        Self {
            domain_suffix: domain_suffix.into(),
            role_tag: role_tag.into(),
        }
    }

    pub fn from_config(config: &NamingConfig) -> Self {
        Self::new(&config.domain_suffix, &config.role_tag)
    }

    pub fn domain_suffix(&self) -> &str {
        &self.domain_suffix
    }

    /// Address and role of an instance that is eligible for naming
    fn target<'a>(&self, instance: &'a InstanceRecord) -> Option<(IpAddr, &'a str)> {
        instance.private_address.zip(instance.tag(&self.role_tag))
    }

    /// Check that an addressed, role-tagged instance yields well-formed names
    ///
    /// Instances that are not eligible for naming at all pass trivially.
    pub fn validate(&self, instance: &InstanceRecord) -> crate::Result<()> {
        if let Some((_, role)) = self.target(instance) {
            validate_label(&instance.id)
                .and_then(|()| validate_label(role))
                .map_err(|problem| {
                    crate::Error::invalid_input(format!(
                        "Instance {:?} cannot be named: {}",
                        instance.id, problem
                    ))
                })?;
        }
        Ok(())
    }

    /// Lazily yield the entries for one instance, in rule order
    pub fn entries<'a>(
        &'a self,
        instance: &'a InstanceRecord,
    ) -> impl Iterator<Item = HostEntry> + 'a {
        let target = self
            .target(instance)
            .filter(|_| self.validate(instance).is_ok());

        target.into_iter().flat_map(move |(address, role)| {
            let labels = [
                Some(format!("{}.{}", instance.id, role)),
                Some(instance.id.clone()),
                Some(role.to_string()),
                role_family(role).map(str::to_string),
            ];

            labels.into_iter().flatten().map(move |label| {
                HostEntry::new(address, format!("{}.{}", label, self.domain_suffix))
            })
        })
    }
}

/// Strip a trailing `-<digits>` from a numbered role
///
/// `director-0` → `director`, `web-1-2` → `web-1`. Roles without a numeric
/// suffix, or whose prefix would not be a valid label, have no family.
pub fn role_family(role: &str) -> Option<&str> {
    let (prefix, number) = role.rsplit_once('-')?;
    if prefix.is_empty()
        || prefix.ends_with('-')
        || number.is_empty()
        || !number.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some(prefix)
}
