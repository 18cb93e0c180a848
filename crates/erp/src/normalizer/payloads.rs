//! Wire shapes of upstream records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use cashsync_core::canonical::PresentValueBreakdown;

use super::formats;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EntityPayload {
    #[serde(with = "formats::id")]
    pub id: String,
    #[serde(alias = "name", alias = "tradeName")]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContractPayload {
    #[serde(alias = "contractCode", with = "formats::id")]
    pub code: String,
    #[serde(with = "formats::id")]
    pub entity_id: String,
    #[serde(alias = "situation")]
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstallmentBase {
    #[serde(with = "formats::id")]
    pub id: String,
    #[serde(default, with = "formats::option_id")]
    pub entity_id: Option<String>,
    #[serde(with = "formats::id")]
    pub contract_code: String,
    /// Origin code such as `CT`, `TP` or `RN`.
    pub origin: String,
    #[serde(with = "formats::iso_date")]
    pub due_date: NaiveDate,
    #[serde(with = "formats::decimal")]
    pub amount: Decimal,
    #[serde(default, with = "formats::option_iso_date")]
    pub settlement_date: Option<NaiveDate>,
    #[serde(default, with = "formats::option_decimal")]
    pub paid_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PresentValuePayload {
    #[serde(with = "formats::decimal")]
    pub principal: Decimal,
    #[serde(default, with = "formats::option_decimal")]
    pub accrued_interest: Option<Decimal>,
    #[serde(default, with = "formats::option_decimal")]
    pub penalty: Option<Decimal>,
    #[serde(default, with = "formats::option_decimal")]
    pub monetary_correction: Option<Decimal>,
}

impl From<PresentValuePayload> for PresentValueBreakdown {
    fn from(value: PresentValuePayload) -> Self {
        Self {
            principal: value.principal,
            accrued_interest: value.accrued_interest.unwrap_or_default(),
            penalty: value.penalty.unwrap_or_default(),
            monetary_correction: value.monetary_correction.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExpandedInstallment {
    #[serde(flatten)]
    pub base: InstallmentBase,
    pub present_value: PresentValuePayload,
}

/// An installment as received. The variant is chosen from the record itself,
/// and each variant is validated in full when parsed.
#[derive(Debug)]
pub(crate) enum InstallmentPayload {
    Minimal(InstallmentBase),
    Expanded(ExpandedInstallment),
}

impl InstallmentPayload {
    pub fn parse(value: &Value) -> Result<Self, serde_json::Error> {
        let expanded = value
            .get("presentValue")
            .map(|pv| !pv.is_null())
            .unwrap_or(false);
        if expanded {
            ExpandedInstallment::deserialize(value).map(Self::Expanded)
        } else {
            InstallmentBase::deserialize(value).map(Self::Minimal)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PayablePayload {
    #[serde(with = "formats::id")]
    pub id: String,
    #[serde(default, alias = "supplierCode", with = "formats::option_id")]
    pub counterparty_code: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(with = "formats::dmy_date")]
    pub due_date: NaiveDate,
    #[serde(with = "formats::decimal")]
    pub amount: Decimal,
    #[serde(default, with = "formats::option_dmy_date")]
    pub paid_date: Option<NaiveDate>,
    #[serde(default, with = "formats::option_decimal")]
    pub paid_amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}
