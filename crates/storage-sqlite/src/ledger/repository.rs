use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel::SqliteConnection;
use log::debug;

use cashsync_core::ledger::{LedgerOutcome, PayloadLedgerTrait, RawPayloadAudit};
use cashsync_core::Result;

use super::model::{LedgerHeadDB, RawPayloadAuditDB};
use crate::db::WriteHandle;
use crate::errors::StorageError;
use crate::schema::{ledger_heads, raw_payload_audit};

/// Appends fetch audits through the writer; outcomes are judged against `ledger_heads`.
pub struct PayloadLedgerRepository {
    writer: WriteHandle,
}

impl PayloadLedgerRepository {
    pub fn new(writer: WriteHandle) -> Self {
        Self { writer }
    }
}

fn head_hash(
    conn: &mut SqliteConnection,
    source: &str,
    period: &str,
) -> std::result::Result<Option<String>, StorageError> {
    Ok(ledger_heads::table
        .filter(ledger_heads::source.eq(source))
        .filter(ledger_heads::period.eq(period))
        .select(ledger_heads::content_hash)
        .first::<String>(conn)
        .optional()?)
}

#[async_trait]
impl PayloadLedgerTrait for PayloadLedgerRepository {
    async fn record(&self, audit: RawPayloadAudit) -> Result<LedgerOutcome> {
        let row = RawPayloadAuditDB::from(audit);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<LedgerOutcome> {
                let head = head_hash(conn, &row.source, &row.period)?;
                let outcome = if head.as_deref() == Some(row.content_hash.as_str()) {
                    LedgerOutcome::Unchanged
                } else {
                    LedgerOutcome::New
                };

                let inserted = diesel::insert_or_ignore_into(raw_payload_audit::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                diesel::insert_into(ledger_heads::table)
                    .values(LedgerHeadDB::from(&row))
                    .on_conflict((ledger_heads::source, ledger_heads::period))
                    .do_update()
                    .set((
                        ledger_heads::content_hash.eq(excluded(ledger_heads::content_hash)),
                        ledger_heads::updated_at.eq(excluded(ledger_heads::updated_at)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                debug!(
                    "Ledger {} {}: {:?} (inserted {})",
                    row.source, row.period, outcome, inserted
                );
                Ok(outcome)
            })
            .await
    }
}
