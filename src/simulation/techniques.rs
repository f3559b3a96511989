//! MITRE ATT&CK Technique Catalog
//!
//! Fixed mapping from service signatures to adversary techniques, plus the
//! canonical mitigation for each technique. Everything here is static data;
//! the chain builder decides which key applies.

/// A technique entry: display name, ATT&CK id, canonical mitigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Technique {
    pub name: &'static str,
    pub mitre_id: &'static str,
    pub mitigation: &'static str,
}

/// Closed set of techniques the simulator can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TechniqueKey {
    // Initial access
    WebExploit,
    RemoteServices,
    AdminPanel,
    // Privilege escalation
    SshBruteForce,
    RdpExploit,
    TelnetAccess,
    FtpExploit,
    MysqlExploit,
    PostgresExploit,
    MongoExploit,
    RedisExploit,
    MssqlExploit,
    // Lateral movement
    SharedInfraPivot,
    AdminInterfacePivot,
    EnvironmentPivot,
    // Data exfiltration
    DbExfiltration,
    AdminDbExfiltration,
}

impl TechniqueKey {
    /// Resolve the static catalog entry for this key.
    pub fn technique(self) -> Technique {
        match self {
            TechniqueKey::WebExploit => Technique {
                name: "Exploit Public-Facing Application",
                mitre_id: "T1190",
                mitigation: "Patch and harden public-facing applications; deploy a web application firewall",
            },
            TechniqueKey::RemoteServices => Technique {
                name: "External Remote Services",
                mitre_id: "T1133",
                mitigation: "Gate remote access services behind a VPN with multi-factor authentication",
            },
            TechniqueKey::AdminPanel => Technique {
                name: "Valid Accounts — Admin Panel Exposure",
                mitre_id: "T1078",
                mitigation: "Restrict administrative interfaces to trusted networks and enforce MFA",
            },
            TechniqueKey::SshBruteForce => Technique {
                name: "Brute Force — SSH Credential Access",
                mitre_id: "T1110.001",
                mitigation: "Enforce key-based SSH authentication and rate-limit failed logins",
            },
            TechniqueKey::RdpExploit => Technique {
                name: "Remote Desktop Protocol Exploitation",
                mitre_id: "T1021.001",
                mitigation: "Remove RDP from the public internet; require a gateway with network-level authentication",
            },
            TechniqueKey::TelnetAccess => Technique {
                name: "Exploitation of Legacy Telnet Service",
                mitre_id: "T1021",
                mitigation: "Decommission Telnet and migrate remote administration to SSH",
            },
            TechniqueKey::FtpExploit => Technique {
                name: "Exploitation via FTP Service",
                mitre_id: "T1071.002",
                mitigation: "Replace FTP with SFTP and disable anonymous access",
            },
            TechniqueKey::MysqlExploit => Technique {
                name: "Exploitation of Database Service (MySQL)",
                mitre_id: "T1068",
                mitigation: "Bind MySQL to private interfaces and require authenticated, encrypted transport",
            },
            TechniqueKey::PostgresExploit => Technique {
                name: "Exploitation of Database Service (PostgreSQL)",
                mitre_id: "T1068",
                mitigation: "Bind PostgreSQL to private interfaces and require authenticated, encrypted transport",
            },
            TechniqueKey::MongoExploit => Technique {
                name: "Exploitation of Database Service (MongoDB)",
                mitre_id: "T1068",
                mitigation: "Bind MongoDB to private interfaces and enable access control",
            },
            TechniqueKey::RedisExploit => Technique {
                name: "Exploitation of In-Memory Data Store (Redis)",
                mitre_id: "T1068",
                mitigation: "Bind Redis to localhost or a private network and require AUTH",
            },
            TechniqueKey::MssqlExploit => Technique {
                name: "Exploitation of Database Service (MSSQL)",
                mitre_id: "T1068",
                mitigation: "Bind MSSQL to private interfaces and require authenticated, encrypted transport",
            },
            TechniqueKey::SharedInfraPivot => Technique {
                name: "Lateral Movement via Shared Infrastructure",
                mitre_id: "T1021",
                mitigation: "Segment services sharing infrastructure to contain single-host compromise",
            },
            TechniqueKey::AdminInterfacePivot => Technique {
                name: "Internal Administrative Interface Discovery",
                mitre_id: "T1087.002",
                mitigation: "Move administrative consoles off the public attack surface",
            },
            TechniqueKey::EnvironmentPivot => Technique {
                name: "Exploitation of Non-Production Environment",
                mitre_id: "T1199",
                mitigation: "Isolate non-production environments behind VPN or IP allowlists",
            },
            TechniqueKey::DbExfiltration => Technique {
                name: "Data from Information Repositories",
                mitre_id: "T1213",
                mitigation: "Remove direct database exposure and monitor bulk read patterns",
            },
            TechniqueKey::AdminDbExfiltration => Technique {
                name: "Exfiltration via Administrative Channel",
                mitre_id: "T1041",
                mitigation: "Separate administrative access paths from data stores and audit privileged queries",
            },
        }
    }

    /// Privilege-escalation technique for a sensitive port, if mapped.
    pub fn for_privesc_port(port: u16) -> Option<TechniqueKey> {
        match port {
            21 => Some(TechniqueKey::FtpExploit),
            22 => Some(TechniqueKey::SshBruteForce),
            23 => Some(TechniqueKey::TelnetAccess),
            1433 => Some(TechniqueKey::MssqlExploit),
            3306 => Some(TechniqueKey::MysqlExploit),
            3389 => Some(TechniqueKey::RdpExploit),
            5432 => Some(TechniqueKey::PostgresExploit),
            6379 => Some(TechniqueKey::RedisExploit),
            27017 => Some(TechniqueKey::MongoExploit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privesc_port_mapping_covers_sensitive_ports() {
        for port in [21, 22, 23, 1433, 3306, 3389, 5432, 6379, 27017] {
            assert!(
                TechniqueKey::for_privesc_port(port).is_some(),
                "port {} should map to a privesc technique",
                port
            );
        }
        assert!(TechniqueKey::for_privesc_port(80).is_none());
        assert!(TechniqueKey::for_privesc_port(443).is_none());
    }

    #[test]
    fn test_every_technique_has_id_and_mitigation() {
        let keys = [
            TechniqueKey::WebExploit,
            TechniqueKey::RemoteServices,
            TechniqueKey::AdminPanel,
            TechniqueKey::SshBruteForce,
            TechniqueKey::RdpExploit,
            TechniqueKey::TelnetAccess,
            TechniqueKey::FtpExploit,
            TechniqueKey::MysqlExploit,
            TechniqueKey::PostgresExploit,
            TechniqueKey::MongoExploit,
            TechniqueKey::RedisExploit,
            TechniqueKey::MssqlExploit,
            TechniqueKey::SharedInfraPivot,
            TechniqueKey::AdminInterfacePivot,
            TechniqueKey::EnvironmentPivot,
            TechniqueKey::DbExfiltration,
            TechniqueKey::AdminDbExfiltration,
        ];
        for key in keys {
            let tech = key.technique();
            assert!(tech.mitre_id.starts_with('T'));
            assert!(!tech.name.is_empty());
            assert!(!tech.mitigation.is_empty());
        }
    }
}
