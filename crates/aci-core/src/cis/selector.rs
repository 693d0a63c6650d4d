//! Request selectors.
//!
//! Empty text selectors mean "no filter". Every field is written on each
//! request, so a selector never inherits values from an earlier request.

use aci_proto::{Record, cis::InfoRecord};

use crate::error::Result;

/// Selection for an information request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoSelector {
    /// User id
    pub uid: String,
    /// Physical user id
    pub puid: Vec<u8>,
    /// Token
    pub token: String,
    /// Server class
    pub server_class: String,
    /// Server name
    pub server: String,
    /// Service
    pub service: String,
    /// Conversation id
    pub conv_id: String,
    /// UOW id
    pub uowid: String,
    /// UOW user status
    pub userstatus: String,
    /// Receiver user id
    pub recvuid: String,
    /// Receiver token
    pub recvtoken: String,
    /// Receiver server name
    pub recvserver: String,
    /// Receiver service
    pub recvservice: String,
    /// Receiver server class
    pub recvclass: String,
    /// Topic
    pub topic: String,
    /// Publication id
    pub publicationid: String,
    /// Subscription type
    pub subscriptiontype: u16,
    /// Conversation type
    pub conv_type: u16,
}

impl InfoSelector {
    /// Select one service by `class/server/service`.
    pub fn service(server_class: &str, server: &str, service: &str) -> Self {
        Self {
            server_class: server_class.to_owned(),
            server: server.to_owned(),
            service: service.to_owned(),
            ..Self::default()
        }
    }

    /// Select the service a conversation, server or service record belongs to.
    pub fn service_of(record: &InfoRecord) -> Self {
        Self::service(&record.text("server_class"), &record.text("server"), &record.text("service"))
    }

    /// Narrow to one conversation.
    #[must_use]
    pub fn with_conv_id(mut self, conv_id: &str) -> Self {
        conv_id.clone_into(&mut self.conv_id);
        self
    }

    /// Write every selector into an information request.
    pub(crate) fn apply(&self, request: &mut Record) -> Result<()> {
        for (name, value) in [
            ("uid", &self.uid),
            ("token", &self.token),
            ("server_class", &self.server_class),
            ("server", &self.server),
            ("service", &self.service),
            ("conv_id", &self.conv_id),
            ("uowid", &self.uowid),
            ("userstatus", &self.userstatus),
            ("recvuid", &self.recvuid),
            ("recvtoken", &self.recvtoken),
            ("recvserver", &self.recvserver),
            ("recvservice", &self.recvservice),
            ("recvclass", &self.recvclass),
            ("topic", &self.topic),
            ("publicationid", &self.publicationid),
        ] {
            request.set(name, value.as_str())?;
        }
        request.set("puid", self.puid.as_slice())?;
        request.set("subscriptiontype", self.subscriptiontype)?;
        request.set("conv_type", self.conv_type)?;
        Ok(())
    }
}

/// Selection for a command request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSelector {
    /// User id
    pub uid: String,
    /// Physical user id
    pub puid: Vec<u8>,
    /// Token
    pub token: String,
    /// Server class
    pub server_class: String,
    /// Server name
    pub server: String,
    /// Service
    pub service: String,
    /// Conversation id
    pub conv_id: String,
    /// UOW id
    pub uowid: String,
    /// Topic
    pub topic: String,
    /// Transport id
    pub transportid: String,
    /// Server sequence number
    pub seqno: u32,
}

impl CommandSelector {
    pub(crate) fn apply(&self, request: &mut Record) -> Result<()> {
        for (name, value) in [
            ("uid", &self.uid),
            ("token", &self.token),
            ("server_class", &self.server_class),
            ("server", &self.server),
            ("service", &self.service),
            ("conv_id", &self.conv_id),
            ("uowid", &self.uowid),
            ("topic", &self.topic),
            ("transportid", &self.transportid),
        ] {
            request.set(name, value.as_str())?;
        }
        request.set("puid", self.puid.as_slice())?;
        request.set("seqno", self.seqno)?;
        Ok(())
    }
}
