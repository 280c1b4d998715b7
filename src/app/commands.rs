//! Inbound deliveries and the commands they map to.
//!
//! Adapters (pub/sub subscription, serial console, keypad) hand the
//! controller raw [`Inbound`] payloads tagged with the channel they arrived
//! on. [`AppCommand::from_inbound`] turns them into commands the
//! [`AppService`](super::service::AppService) acts upon.

use crate::error::ProtocolError;

/// Longest payload accepted from any channel.
pub const MAX_PAYLOAD_LEN: usize = 32;

/// Logical channel a payload arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundChannel {
    /// Operator codes; the controller echoes `0` here after each one.
    AlarmManagement,
    /// Status requests.
    Output,
}

/// One raw delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub channel: InboundChannel,
    pub payload: heapless::String<MAX_PAYLOAD_LEN>,
}

impl Inbound {
    pub fn new(channel: InboundChannel, payload: &str) -> Result<Self, ProtocolError> {
        let mut buf = heapless::String::new();
        buf.push_str(payload)
            .map_err(|_| ProtocolError::CodeTooLong)?;
        Ok(Self {
            channel,
            payload: buf,
        })
    }
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Evaluate an operator code (arm, disarm, exclude).
    SubmitCode(heapless::String<MAX_PAYLOAD_LEN>),
    /// Report the current arm state.
    QueryArmState,
    /// Report the exclusion set.
    QueryExclusions,
    /// Report every zone's contact state.
    QueryZones,
}

impl AppCommand {
    /// Interpret a delivery.
    ///
    /// `Ok(None)` is the `0` acknowledgement echo on the alarm-management
    /// channel, which the controller itself publishes and must ignore.
    pub fn from_inbound(inbound: &Inbound) -> Result<Option<Self>, ProtocolError> {
        let payload = inbound.payload.trim();
        match inbound.channel {
            InboundChannel::AlarmManagement if payload == "0" => Ok(None),
            InboundChannel::AlarmManagement => Ok(Some(Self::SubmitCode(inbound.payload.clone()))),
            InboundChannel::Output => {
                let request = payload.to_ascii_lowercase();
                if request.contains("alarm") {
                    Ok(Some(Self::QueryArmState))
                } else if request.contains("exclu") {
                    Ok(Some(Self::QueryExclusions))
                } else if request.contains("zones") {
                    Ok(Some(Self::QueryZones))
                } else {
                    Err(ProtocolError::UnknownRequest)
                }
            }
        }
    }
}
