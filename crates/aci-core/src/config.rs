//! Session configuration.

use aci_proto::{
    cis::HEADER_LEN,
    codes::{API_VERSION_DEFAULT, API_VERSION_MAX, API_VERSION_MIN},
};
use serde::{Deserialize, Serialize};

use crate::error::{AciError, Result};

/// Settings for one broker session (one control block).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Broker address, e.g. `localhost` or `host:3930`
    pub broker_id: String,
    /// User id presented to the kernel
    pub user_id: String,
    /// Optional token distinguishing sessions of the same user
    pub token: Option<String>,
    /// Send buffer size in bytes
    pub send_length: usize,
    /// Receive buffer size in bytes
    pub receive_length: usize,
    /// Highest interface version to use; the stub may negotiate it down
    pub api_version: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            broker_id: "localhost".to_owned(),
            user_id: "monty".to_owned(),
            token: None,
            send_length: 2048,
            receive_length: 2048,
            api_version: API_VERSION_DEFAULT,
        }
    }
}

impl SessionConfig {
    /// Check ranges before any buffer is allocated.
    pub fn validate(&self) -> Result<()> {
        if !(API_VERSION_MIN..=API_VERSION_MAX).contains(&self.api_version) {
            return Err(AciError::Config(format!(
                "api_version {} outside {API_VERSION_MIN}..={API_VERSION_MAX}",
                self.api_version
            )));
        }
        for (name, len) in [("send_length", self.send_length), ("receive_length", self.receive_length)] {
            if u32::try_from(len).is_err() {
                return Err(AciError::Config(format!("{name} {len} does not fit the control block")));
            }
        }
        Ok(())
    }
}

/// CIS service a session logs on to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum CisService {
    /// Full information on all clients, servers and conversations
    #[default]
    Info,
    /// Administrative commands
    Cmd,
    /// Information limited to the user's own resources
    UserInfo,
    /// Participant shutdown
    ParticipantShutdown,
    /// Security commands
    SecurityCmd,
}

impl CisService {
    /// Server class of every CIS service.
    pub const SERVER_CLASS: &'static str = "SAG";
    /// Server name of every CIS service.
    pub const SERVER_NAME: &'static str = "ETBCIS";

    /// Service name as registered in the kernel.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Cmd => "CMD",
            Self::UserInfo => "USER-INFO",
            Self::ParticipantShutdown => "PARTICIPANT-SHUTDOWN",
            Self::SecurityCmd => "SECURITY-CMD",
        }
    }

    /// True for services that answer information requests.
    pub const fn is_information(self) -> bool {
        matches!(self, Self::Info | Self::UserInfo)
    }
}

/// Settings for a CIS session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CisConfig {
    /// Broker address
    pub broker_id: String,
    /// User id presented to the kernel
    pub user_id: String,
    /// Password for LOGON, if the kernel requires one
    pub password: Option<String>,
    /// CIS service to log on to
    pub service: CisService,
    /// Receive buffer size; one page of records plus the header must fit
    pub receive_length: usize,
    /// Highest ACI interface version to use
    pub api_version: u8,
}

impl Default for CisConfig {
    fn default() -> Self {
        Self {
            broker_id: "localhost".to_owned(),
            user_id: "monty".to_owned(),
            password: None,
            service: CisService::Info,
            receive_length: 32_768,
            api_version: API_VERSION_DEFAULT,
        }
    }
}

impl CisConfig {
    /// Session settings for a control block talking to this CIS service.
    pub fn session(&self, send_length: usize) -> SessionConfig {
        SessionConfig {
            broker_id: self.broker_id.clone(),
            user_id: self.user_id.clone(),
            token: None,
            send_length,
            receive_length: self.receive_length,
            api_version: self.api_version,
        }
    }

    /// Check ranges before any buffer is allocated.
    pub fn validate(&self) -> Result<()> {
        if self.receive_length <= HEADER_LEN {
            return Err(AciError::Config(format!(
                "receive_length {} leaves no room after the {HEADER_LEN}-byte CIS header",
                self.receive_length
            )));
        }
        self.session(0).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = SessionConfig::default();
        assert_eq!(s.broker_id, "localhost");
        assert_eq!(s.user_id, "monty");
        assert_eq!((s.send_length, s.receive_length, s.api_version), (2048, 2048, 7));
        assert!(s.validate().is_ok());

        let c = CisConfig::default();
        assert_eq!(c.service.name(), "INFO");
        assert_eq!(c.receive_length, 32_768);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn invalid_settings_rejected() {
        let s = SessionConfig { api_version: 11, ..SessionConfig::default() };
        assert!(matches!(s.validate(), Err(AciError::Config(_))));

        let c = CisConfig { receive_length: 100, ..CisConfig::default() };
        assert!(matches!(c.validate(), Err(AciError::Config(_))));
    }

    #[test]
    fn service_names() {
        assert_eq!(CisService::UserInfo.name(), "USER-INFO");
        assert_eq!(CisService::ParticipantShutdown.name(), "PARTICIPANT-SHUTDOWN");
        assert!(CisService::UserInfo.is_information());
        assert!(!CisService::Cmd.is_information());
    }
}
