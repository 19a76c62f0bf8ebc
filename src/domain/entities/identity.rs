//! Provider identity snapshot and its DNS verification records.

use serde::{Deserialize, Serialize};

/// One DNS record the tenant has to publish, as reported by the provider.
///
/// Records are stored verbatim in `provider_records` for display; only the
/// DKIM value and the DKIM / SPF-TXT statuses are read by the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Record kind tag: `"DKIM"` or `"SPF"`.
    pub record: String,
    /// DNS record type: `TXT`, `MX`, `CNAME`.
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl VerificationRecord {
    pub fn is_dkim(&self) -> bool {
        self.record == "DKIM"
    }

    pub fn is_spf_txt(&self) -> bool {
        self.record == "SPF" && self.record_type == "TXT"
    }
}

/// Provider-side identity for a sending domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub records: Vec<VerificationRecord>,
}

impl Identity {
    pub fn dkim_record(&self) -> Option<&VerificationRecord> {
        self.records.iter().find(|r| r.is_dkim())
    }

    pub fn spf_txt_record(&self) -> Option<&VerificationRecord> {
        self.records.iter().find(|r| r.is_spf_txt())
    }
}
