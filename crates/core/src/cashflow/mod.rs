//! Cashflow module - canonical cash-in/cash-out records, classification and balances.

mod cashflow_model;
mod classifier;

pub use cashflow_model::{Balance, CashInCategory, CashInRecord, CashOutRecord, RecordType};
pub use classifier::{
    build_cash_in_records, build_cash_out_records, classify_installment, classify_settlement,
    uncategorized_alert, CashOutCategoryMap, CategorizationAlert,
};
