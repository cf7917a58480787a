//! Well-known varbind OIDs and their textual aliases
//!
//! snmptrapd renders OIDs differently depending on loaded MIBs and output
//! options (`-On`, `-Of`, ...), so each semantic OID is matched against every
//! spelling it is known to appear in.

use crate::notification::Varbind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OidAliasSet {
    name: &'static str,
    aliases: &'static [&'static str],
}

/// sysUpTime.0, required in every SNMPv2 trap.
pub const SYS_UPTIME: OidAliasSet = OidAliasSet::new(
    "sysUpTime.0",
    &[
        "1.3.6.1.2.1.1.3.0",
        "1.3.6.1.4.1.3.6.1.2.1.1.3.0",
        "iso.3.6.1.2.1.1.3.0",
        "SNMPv2-MIB::sysUpTime.0",
    ],
);

/// snmpTrapOID.0, required in every SNMPv2 trap. Its value names the trap.
pub const SNMP_TRAP_OID: OidAliasSet = OidAliasSet::new(
    "snmpTrapOID.0",
    &[
        "1.3.6.1.6.3.1.1.4.1.0",
        "1.3.6.1.4.1.3.6.1.6.3.1.1.4.1.0",
        "iso.3.6.1.6.3.1.1.4.1.0",
        "SNMPv2-MIB::snmpTrapOID.0",
    ],
);

impl OidAliasSet {
    pub const fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    /// Exact, case-sensitive membership test.
    pub fn contains(&self, oid: &str) -> bool {
        self.aliases.iter().any(|alias| *alias == oid)
    }

    /// Return the first binding, in input order, whose OID is one of the
    /// aliases.
    pub fn resolve<'a>(&self, bindings: &'a [Varbind]) -> Option<&'a Varbind> {
        bindings.iter().find(|varbind| self.contains(&varbind.oid))
    }
}

impl fmt::Display for OidAliasSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.name, self.aliases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_every_alias() {
        for alias in SNMP_TRAP_OID.aliases() {
            assert!(SNMP_TRAP_OID.contains(alias));
            assert!(!SYS_UPTIME.contains(alias));
        }
        for alias in SYS_UPTIME.aliases() {
            assert!(SYS_UPTIME.contains(alias));
        }
    }

    #[test]
    fn test_contains_is_exact() {
        assert!(!SNMP_TRAP_OID.contains("snmpv2-mib::snmptrapoid.0"));
        assert!(!SNMP_TRAP_OID.contains(".1.3.6.1.6.3.1.1.4.1.0"));
        assert!(!SNMP_TRAP_OID.contains("1.3.6.1.6.3.1.1.4.1"));
        assert!(!SNMP_TRAP_OID.contains(""));
    }

    #[test]
    fn test_resolve_by_binding_position() {
        let bindings = vec![
            Varbind::new("1.3.6.1.2.1.1.5.0", "router1"),
            Varbind::new("SNMPv2-MIB::snmpTrapOID.0", "IF-MIB::linkDown"),
            Varbind::new("1.3.6.1.6.3.1.1.4.1.0", "1.3.6.1.6.3.1.1.5.3"),
        ];
        let found = SNMP_TRAP_OID.resolve(&bindings).unwrap();
        assert_eq!(found.value, "IF-MIB::linkDown");
    }

    #[test]
    fn test_resolve_not_found() {
        let bindings = vec![Varbind::new("1.3.6.1.2.1.1.3.0", "12345")];
        assert!(SNMP_TRAP_OID.resolve(&bindings).is_none());
        assert!(SNMP_TRAP_OID.resolve(&[]).is_none());
        assert_eq!(SYS_UPTIME.resolve(&bindings).map(|v| v.value.as_str()), Some("12345"));
    }

    #[test]
    fn test_custom_alias_set() {
        const SYS_NAME: OidAliasSet =
            OidAliasSet::new("sysName.0", &["1.3.6.1.2.1.1.5.0", "SNMPv2-MIB::sysName.0"]);
        let bindings = vec![Varbind::new("SNMPv2-MIB::sysName.0", "core-sw")];
        assert_eq!(SYS_NAME.resolve(&bindings).unwrap().value, "core-sw");
        assert_eq!(SYS_NAME.name(), "sysName.0");
    }
}
