use crate::client::RegistryValidator;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Display name for a validator operator address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownValidator {
    pub address: Address,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorRecord {
    pub index: u64,
    /// ed25519 key, `0x`-prefixed hex
    pub public_key: String,
    pub active: bool,
    pub validator_address: Address,
    pub inbound_address: String,
    pub outbound_address: String,
    pub name: Option<String>,
}

impl ValidatorRecord {
    fn from_registry(raw: RegistryValidator, known: &[KnownValidator]) -> Self {
        // Address equality is byte-wise, so checksum casing never matters
        let name = known
            .iter()
            .find(|k| k.address == raw.validatorAddress)
            .map(|k| k.name.clone());

        Self {
            index: raw.index,
            public_key: raw.publicKey.to_string(),
            active: raw.active,
            validator_address: raw.validatorAddress,
            inbound_address: raw.inboundAddress,
            outbound_address: raw.outboundAddress,
            name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSet {
    /// Ascending by registry index
    pub records: Vec<ValidatorRecord>,
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// Share of active validators, one decimal place
    pub active_pct: f64,
}

impl ValidatorSet {
    pub fn from_registry(raw: Vec<RegistryValidator>, known: &[KnownValidator]) -> Self {
        let mut records: Vec<ValidatorRecord> = raw
            .into_iter()
            .map(|v| ValidatorRecord::from_registry(v, known))
            .collect();
        records.sort_by_key(|r| r.index);

        let total = records.len();
        let active = records.iter().filter(|r| r.active).count();
        let active_pct = if total == 0 {
            0.0
        } else {
            (active as f64 / total as f64 * 1_000.0).round() / 10.0
        };

        Self {
            records,
            total,
            active,
            inactive: total - active,
            active_pct,
        }
    }

    /// Active validators first, each group by index.
    pub fn display_order(&self) -> Vec<&ValidatorRecord> {
        let mut ordered: Vec<&ValidatorRecord> = self.records.iter().collect();
        ordered.sort_by_key(|r| (!r.active, r.index));
        ordered
    }

    pub fn get(&self, public_key: &str) -> Option<&ValidatorRecord> {
        self.records
            .iter()
            .find(|r| r.public_key.eq_ignore_ascii_case(public_key))
    }
}
