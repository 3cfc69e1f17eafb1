//! # Pairing configuration DTO
//!
//! Pure data: what the local side announces during the IO capability
//! exchange and how the pairing trigger service is registered.
//! Loading from disk lives in `cp-infra`.

use serde::{Deserialize, Serialize};

use crate::hci::{AuthenticationRequirements, IoCapability, OobDataPresent};
use crate::ports::{SecurityPolicy, ServiceId};

/// Pairing configuration (TOML root)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// `[local]` IO capability exchange parameters
    pub local: LocalSettings,
    /// `[service]` fixed channel registration
    pub service: ServiceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSettings {
    pub io_capability: IoCapability,
    pub authentication_requirements: AuthenticationRequirements,
    pub oob_present: OobDataPresent,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            io_capability: IoCapability::DisplayYesNo,
            authentication_requirements: AuthenticationRequirements::GeneralBondingMitmProtection,
            oob_present: OobDataPresent::NotPresent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub service_id: ServiceId,
    pub security_policy: SecurityPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: PairingConfig = toml::from_str("").unwrap();
        assert_eq!(config, PairingConfig::default());
        assert_eq!(config.local.io_capability, IoCapability::DisplayYesNo);
        assert_eq!(config.service.service_id, ServiceId::CLASSIC_PAIRING_TRIGGER);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config: PairingConfig = toml::from_str(
            r#"
            [local]
            io_capability = "keyboard_only"

            [service]
            security_policy = "encrypted_transport"
            "#,
        )
        .unwrap();

        assert_eq!(config.local.io_capability, IoCapability::KeyboardOnly);
        assert_eq!(
            config.local.authentication_requirements,
            AuthenticationRequirements::GeneralBondingMitmProtection
        );
        assert_eq!(config.service.security_policy, SecurityPolicy::EncryptedTransport);
    }
}
