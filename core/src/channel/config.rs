/// Channel configuration for the BTS01 link
///
/// Describes the two logical channels exposed by the peer: the queued,
/// notification-gated data channel and the request/response side channel
/// (GPIO on BTS01). Identifiers are fixed at construction time and are never
/// negotiated at runtime.

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::ChannelError;

/// BTS01 primary GATT service
pub const BTS01_SERVICE_UUID: Uuid = Uuid::from_u128(0x55df0001_a9b0_11e3_a5e2_000190f08f1e);

/// BTS01 data channel, host -> device
pub const BTS01_DATA_TX_UUID: Uuid = Uuid::from_u128(0x55df0002_a9b0_11e3_a5e2_000190f08f1e);

/// BTS01 data channel, device -> host (notify)
pub const BTS01_DATA_RX_UUID: Uuid = Uuid::from_u128(0x55df0003_a9b0_11e3_a5e2_000190f08f1e);

/// BTS01 GPIO characteristic (read and write share one attribute)
pub const BTS01_GPIO_UUID: Uuid = Uuid::from_u128(0x55df8001_a9b0_11e3_a5e2_000190f08f1e);

/// Maximum GATT attribute value size
pub const MAX_ATTRIBUTE_SIZE: usize = 512;

/// Default bound on queued data-channel writes
pub const DEFAULT_MAX_PENDING_WRITES: usize = 64;

/// Outbound/inbound identifier pair addressing one logical channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPair {
    /// Name of the owning channel (used in logs)
    pub channel: String,
    /// GATT service the characteristics belong to
    pub service: Uuid,
    /// Characteristic written by the host
    pub outbound: Uuid,
    /// Characteristic read or subscribed by the host
    pub inbound: Uuid,
}

impl EndpointPair {
    pub fn new(channel: impl Into<String>, service: Uuid, outbound: Uuid, inbound: Uuid) -> Self {
        Self {
            channel: channel.into(),
            service,
            outbound,
            inbound,
        }
    }

    fn validate(&self) -> Result<(), ChannelError> {
        if self.channel.trim().is_empty() {
            return Err(ChannelError::InvalidConfig(
                "endpoint pair has an empty channel name".to_string(),
            ));
        }
        for (role, id) in [
            ("service", self.service),
            ("outbound", self.outbound),
            ("inbound", self.inbound),
        ] {
            if id.is_nil() {
                return Err(ChannelError::InvalidConfig(format!(
                    "{} {} identifier is empty",
                    self.channel, role
                )));
            }
        }
        Ok(())
    }

    fn characteristics(&self) -> [Uuid; 2] {
        [self.outbound, self.inbound]
    }
}

/// Static description of both channels plus queue limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Queued write / notify channel
    pub data: EndpointPair,
    /// Immediate request/response channel
    pub side: EndpointPair,
    /// Upper bound on writes waiting in the queue
    pub max_pending_writes: usize,
    /// Largest payload accepted for a single write
    pub max_payload_len: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::bts01()
    }
}

impl ChannelConfig {
    /// Device profile for BTS01 boards
    pub fn bts01() -> Self {
        Self {
            data: EndpointPair::new(
                "BTS01",
                BTS01_SERVICE_UUID,
                BTS01_DATA_TX_UUID,
                BTS01_DATA_RX_UUID,
            ),
            side: EndpointPair::new(
                "BTS01_GPIO",
                BTS01_SERVICE_UUID,
                BTS01_GPIO_UUID,
                BTS01_GPIO_UUID,
            ),
            max_pending_writes: DEFAULT_MAX_PENDING_WRITES,
            max_payload_len: MAX_ATTRIBUTE_SIZE,
        }
    }

    /// Set the queue bound
    pub fn with_max_pending_writes(mut self, max: usize) -> Self {
        self.max_pending_writes = max;
        self
    }

    /// Set the per-write payload limit
    pub fn with_max_payload_len(mut self, max: usize) -> Self {
        self.max_payload_len = max;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ChannelError> {
        self.data.validate()?;
        self.side.validate()?;

        let side_ids = self.side.characteristics();
        if self
            .data
            .characteristics()
            .iter()
            .any(|id| side_ids.contains(id))
        {
            return Err(ChannelError::InvalidConfig(
                "data and side channels share a characteristic".to_string(),
            ));
        }
        if self.max_pending_writes == 0 {
            return Err(ChannelError::InvalidConfig(
                "max_pending_writes must be greater than zero".to_string(),
            ));
        }
        if self.max_payload_len == 0 || self.max_payload_len > MAX_ATTRIBUTE_SIZE {
            return Err(ChannelError::InvalidConfig(format!(
                "max_payload_len must be within 1..={}",
                MAX_ATTRIBUTE_SIZE
            )));
        }
        Ok(())
    }

    /// Service UUIDs a scanner should filter advertisements on
    pub fn scan_service_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.data.service];
        if self.side.service != self.data.service {
            ids.push(self.side.service);
        }
        ids
    }

    /// Parse a JSON document; absent fields keep their BTS01 defaults
    pub fn from_json_str(contents: &str) -> AnyResult<Self> {
        let config: ChannelConfig =
            serde_json::from_str(contents).context("Failed to parse channel config")?;
        config
            .validate()
            .context("Channel config failed validation")?;
        Ok(config)
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read channel config {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    /// Save config as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> AnyResult<()> {
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize channel config")?;
        std::fs::write(path.as_ref(), contents).context("Failed to write channel config")?;
        Ok(())
    }
}
