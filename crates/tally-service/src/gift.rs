//! Customer gift operations.
//!
//! Eligibility is read-only and recomputed from the last two months of
//! sales on every call. [`Bookkeeper::generate_gift_records`] is the only
//! operation here that writes, and it only appends.

use tally_core::gift::{self, CustomerGiftEntry, GiftSummary};
use tally_core::{GiftRecord, TransactionFilter, TransactionType};
use tracing::{debug, info};

use crate::bookkeeper::Bookkeeper;
use crate::error::ApiResult;

impl Bookkeeper {
    /// Customers currently receiving daily gifts, most urgent first.
    pub async fn get_customer_gift_data(&self) -> ApiResult<Vec<CustomerGiftEntry>> {
        let now = self.now();
        let current = self.calendar().current_month(now);
        debug!(month = %current, "get_customer_gift_data");

        let filter = TransactionFilter::of_type(TransactionType::Sale).between(
            self.calendar().month_start(current.prev()),
            self.calendar().month_end(current),
        );
        let sales = self.store().list_transactions(&filter).await?;

        Ok(gift::customer_gift_data(&sales, now, self.calendar()))
    }

    /// Totals over [`Self::get_customer_gift_data`].
    pub async fn get_gift_summary(&self) -> ApiResult<GiftSummary> {
        let entries = self.get_customer_gift_data().await?;
        Ok(gift::gift_summary(&entries))
    }

    /// Logs one gift record per currently eligible customer.
    ///
    /// Returns the records written. With nobody eligible nothing is
    /// written and the result is empty.
    pub async fn generate_gift_records(&self) -> ApiResult<Vec<GiftRecord>> {
        let entries = self.get_customer_gift_data().await?;
        let created_at = self.now();

        let records: Vec<GiftRecord> = entries
            .iter()
            .map(|entry| entry.to_record(Self::new_id(), created_at))
            .collect();

        self.store().append_gift_records(&records).await?;
        info!(count = records.len(), "Gift records generated");

        Ok(records)
    }

    /// Every generated gift record, newest first.
    pub async fn get_gift_history(&self) -> ApiResult<Vec<GiftRecord>> {
        Ok(self.store().list_gift_records().await?)
    }
}
