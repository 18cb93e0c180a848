//! Schema normalizer: raw upstream records to canonical DTOs.
//!
//! A record that fails to parse or validate is rejected on its own with a
//! [`RecordIssue`]; the rest of the batch is still returned.

mod formats;
mod payloads;

use log::{debug, warn};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use cashsync_core::canonical::{ContractRecord, EntityRecord, Installment, InstallmentOrigin, Payable};
use cashsync_core::contracts::ContractStatus;
use cashsync_core::sources::RecordIssue;

use crate::models::{RawRecord, ResponseShape};
use payloads::{ContractPayload, EntityPayload, InstallmentPayload, PayablePayload};

/// Records that passed normalization plus the ones that did not.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RecordIssue>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Normalized<T> {
    fn push(&mut self, raw: &RawRecord, result: Result<T, String>) {
        match result {
            Ok(record) => self.records.push(record),
            Err(message) => {
                debug!("Rejected record {:?}: {}", raw.id(), message);
                self.rejected.push(RecordIssue {
                    record_id: raw.id(),
                    message,
                });
            }
        }
    }

    fn log_rejections(&self, what: &str) {
        if !self.rejected.is_empty() {
            warn!(
                "{}: {} accepted, {} rejected",
                what,
                self.records.len(),
                self.rejected.len()
            );
        }
    }
}

fn decode<T: DeserializeOwned>(raw: &RawRecord) -> Result<T, String> {
    serde_json::from_value(raw.0.clone()).map_err(|e| e.to_string())
}

fn non_negative(field: &str, value: Decimal) -> Result<Decimal, String> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(format!("{} must not be negative, got {}", field, value))
    } else {
        Ok(value)
    }
}

fn non_blank(field: &str, value: String) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{} is blank", field))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_entities(raw: &[RawRecord]) -> Normalized<EntityRecord> {
    let mut out = Normalized::default();
    for record in raw {
        let result = decode::<EntityPayload>(record).and_then(|p| {
            Ok(EntityRecord {
                id: non_blank("id", p.id)?,
                display_name: p.display_name.trim().to_string(),
            })
        });
        out.push(record, result);
    }
    out.log_rejections("entities");
    out
}

pub fn normalize_contracts(raw: &[RawRecord]) -> Normalized<ContractRecord> {
    let mut out = Normalized::default();
    for record in raw {
        let result = decode::<ContractPayload>(record).and_then(|p| {
            Ok(ContractRecord {
                code: non_blank("code", p.code)?,
                entity_id: non_blank("entityId", p.entity_id)?,
                status: ContractStatus::from(p.status),
            })
        });
        out.push(record, result);
    }
    out.log_rejections("contracts");
    out
}

/// Installments of `entity_id`. A record that names another entity is rejected.
pub fn normalize_installments(entity_id: &str, raw: &[RawRecord]) -> Normalized<Installment> {
    let shape = ResponseShape::detect(raw);
    debug!("Installments of {}: {:?} response", entity_id, shape);

    let mut out = Normalized::default();
    for record in raw {
        let result = InstallmentPayload::parse(&record.0)
            .map_err(|e| e.to_string())
            .and_then(|payload| installment_from(entity_id, payload));
        out.push(record, result);
    }
    out.log_rejections(&format!("installments of {}", entity_id));
    out
}

fn installment_from(entity_id: &str, payload: InstallmentPayload) -> Result<Installment, String> {
    let (base, present_value) = match payload {
        InstallmentPayload::Minimal(base) => (base, None),
        InstallmentPayload::Expanded(expanded) => {
            (expanded.base, Some(expanded.present_value.into()))
        }
    };

    if let Some(declared) = base.entity_id.as_deref() {
        if declared != entity_id {
            return Err(format!(
                "belongs to entity '{}', requested '{}'",
                declared, entity_id
            ));
        }
    }

    Ok(Installment {
        id: non_blank("id", base.id)?,
        entity_id: entity_id.to_string(),
        contract_code: non_blank("contractCode", base.contract_code)?,
        origin: InstallmentOrigin::from_code(&base.origin),
        due_date: base.due_date,
        amount: non_negative("amount", base.amount)?,
        settlement_date: base.settlement_date,
        paid_amount: base
            .paid_amount
            .map(|v| non_negative("paidAmount", v))
            .transpose()?,
        present_value,
    })
}

pub fn normalize_payables(raw: &[RawRecord]) -> Normalized<Payable> {
    let mut out = Normalized::default();
    for record in raw {
        let result = decode::<PayablePayload>(record).and_then(|p| {
            Ok(Payable {
                id: non_blank("id", p.id)?,
                counterparty_code: p.counterparty_code,
                document_type: p
                    .document_type
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
                due_date: p.due_date,
                amount: non_negative("amount", p.amount)?,
                paid_date: p.paid_date,
                paid_amount: p
                    .paid_amount
                    .map(|v| non_negative("paidAmount", v))
                    .transpose()?,
                description: p.description,
            })
        });
        out.push(record, result);
    }
    out.log_rejections("payables");
    out
}
