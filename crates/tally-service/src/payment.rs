//! Payment reconciliation operations.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  employee:  collected (sale - return) - transferred to merchant         │
//! │  merchant:  collected + every employee transfer - withdrawn             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Whether a collector is a merchant comes from the `role` on their
//! employee record. Collectors with no record are treated as employees.

use std::collections::BTreeMap;
use tally_core::reconciliation::{self, EmployeeBalance, PaymentFilter};
use tally_core::validation::{validate_name, validate_note, validate_positive_amount};
use tally_core::{
    EmployeeFilter, Money, NewTransfer, NewWithdrawal, Session, TransactionFilter, Transfer,
    Withdrawal,
};
use tracing::{debug, info};

use crate::bookkeeper::Bookkeeper;
use crate::error::ApiResult;

impl Bookkeeper {
    /// Balances per collector, keyed by name.
    ///
    /// With `filter.employee_name` set the map holds at most that one
    /// collector. The date range narrows the transactions only; transfers
    /// and withdrawals are always counted in full.
    pub async fn get_employee_payment_stats(
        &self,
        filter: &PaymentFilter,
    ) -> ApiResult<BTreeMap<String, EmployeeBalance>> {
        debug!(employee = ?filter.employee_name, "get_employee_payment_stats");

        let tx_filter = TransactionFilter {
            collector: filter.employee_name.clone(),
            start: filter.start,
            end: filter.end,
            ..TransactionFilter::all()
        };
        let transactions = self.store().list_transactions(&tx_filter).await?;
        let employees = self.store().list_employees(&EmployeeFilter::default()).await?;
        let transfers = self.store().list_transfers().await?;
        let withdrawals = self.store().list_withdrawals().await?;

        Ok(reconciliation::employee_payment_stats(
            &transactions,
            &employees,
            &transfers,
            &withdrawals,
            filter,
        ))
    }

    /// One collector's balance, `None` if they never collected anything.
    pub async fn get_employee_balance(&self, employee_name: &str) -> ApiResult<Option<EmployeeBalance>> {
        let mut stats = self
            .get_employee_payment_stats(&PaymentFilter::for_employee(employee_name))
            .await?;
        Ok(stats.remove(employee_name))
    }

    /// Every collector's balance, largest outstanding first.
    pub async fn get_all_employees_summary(&self) -> ApiResult<Vec<EmployeeBalance>> {
        let stats = self.get_employee_payment_stats(&PaymentFilter::default()).await?;
        Ok(reconciliation::all_employees_summary(stats))
    }

    /// Records cash handed from an employee to the merchant.
    pub async fn transfer_to_merchant(&self, session: &Session, new: NewTransfer) -> ApiResult<Transfer> {
        self.authorize(session, "create transfer")?;

        let employee_name = validate_name("employee_name", &new.employee_name)?;
        validate_positive_amount("amount", new.amount)?;
        let note = validate_note(new.note.as_deref())?;

        let transfer = Transfer {
            id: Self::new_id(),
            employee_name,
            amount: new.amount,
            transfer_date: new.transfer_date.unwrap_or_else(|| self.today()),
            note,
            created_at: self.now(),
        };
        self.store().insert_transfer(&transfer).await?;

        info!(
            employee = %transfer.employee_name,
            amount = %transfer.amount,
            recorded_by = %session.name,
            "Transfer recorded"
        );
        Ok(transfer)
    }

    /// Transfers newest first, optionally for one employee.
    pub async fn get_employee_transfers(&self, employee_name: Option<&str>) -> ApiResult<Vec<Transfer>> {
        let mut transfers = self.store().list_transfers().await?;
        if let Some(name) = employee_name {
            transfers.retain(|t| t.employee_name == name);
        }
        Ok(transfers)
    }

    /// Records the calling merchant taking cash out.
    pub async fn merchant_withdraw(&self, session: &Session, new: NewWithdrawal) -> ApiResult<Withdrawal> {
        self.authorize(session, "create withdrawal")?;

        validate_positive_amount("amount", new.amount)?;
        let note = validate_note(new.note.as_deref())?;

        let withdrawal = Withdrawal {
            id: Self::new_id(),
            merchant_name: session.name.clone(),
            amount: new.amount,
            withdrawal_date: new.withdrawal_date.unwrap_or_else(|| self.today()),
            note,
            created_at: self.now(),
        };
        self.store().insert_withdrawal(&withdrawal).await?;

        info!(
            merchant = %withdrawal.merchant_name,
            amount = %withdrawal.amount,
            "Withdrawal recorded"
        );
        Ok(withdrawal)
    }

    /// Withdrawals newest first.
    pub async fn get_merchant_withdrawals(&self) -> ApiResult<Vec<Withdrawal>> {
        Ok(self.store().list_withdrawals().await?)
    }

    /// Sum of withdrawals, optionally by one merchant.
    pub async fn get_total_withdrawals(&self, merchant_name: Option<&str>) -> ApiResult<Money> {
        let withdrawals = self.store().list_withdrawals().await?;
        Ok(reconciliation::total_withdrawals(&withdrawals, merchant_name))
    }

    pub async fn delete_withdrawal(&self, session: &Session, id: &str) -> ApiResult<()> {
        self.authorize(session, "delete withdrawal")?;
        self.store().delete_withdrawal(id).await?;

        info!(id, deleted_by = %session.name, "Withdrawal deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::bookkeeper::fixtures::*;
    use crate::bookkeeper::Bookkeeper;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;
    use tally_core::reconciliation::PaymentFilter;
    use tally_core::{Money, NewTransfer, NewWithdrawal, Role, TransactionType};

    fn handover(employee: &str, yuan: i64) -> NewTransfer {
        NewTransfer {
            employee_name: employee.to_string(),
            amount: Money::from_yuan(yuan),
            transfer_date: None,
            note: None,
        }
    }

    fn cash_out(yuan: i64) -> NewWithdrawal {
        NewWithdrawal {
            amount: Money::from_yuan(yuan),
            withdrawal_date: None,
            note: Some("  rent  ".to_string()),
        }
    }

    async fn collected_2000(keeper: &Bookkeeper) {
        hire(keeper, "Zhang San", Role::Employee).await;
        record(keeper, TransactionType::Sale, "Li Si", "Zhang San", 100, 2_500, at(2024, 6, 1)).await;
        record(keeper, TransactionType::Return, "Li Si", "Zhang San", 20, 500, at(2024, 6, 2)).await;
        record(keeper, TransactionType::Purchase, "Mill", "Zhang San", 900, 9_000, at(2024, 6, 2)).await;
    }

    #[tokio::test]
    async fn test_settled_employee_is_zero_in_either_order() {
        let transfer_first = bookkeeper();
        collected_2000(&transfer_first).await;
        transfer_first.transfer_to_merchant(&merchant(), handover("Zhang San", 2_000)).await.unwrap();
        let a = transfer_first.get_employee_balance("Zhang San").await.unwrap().unwrap();

        let query_first = bookkeeper();
        collected_2000(&query_first).await;
        let before = query_first.get_employee_balance("Zhang San").await.unwrap().unwrap();
        assert_eq!(before.current_balance, Money::from_yuan(2_000));
        query_first.transfer_to_merchant(&merchant(), handover("Zhang San", 2_000)).await.unwrap();
        let b = query_first.get_employee_balance("Zhang San").await.unwrap().unwrap();

        for balance in [a, b] {
            assert_eq!(balance.total_amount, Money::from_yuan(2_000));
            assert_eq!(balance.total_transferred, Money::from_yuan(2_000));
            assert_eq!(balance.current_balance, Money::zero());
            assert_eq!(balance.transaction_count, 3);
        }
    }

    #[tokio::test]
    async fn test_merchant_balance_uses_role_field() {
        let keeper = bookkeeper();
        collected_2000(&keeper).await;
        hire(&keeper, "Boss Chen", Role::Merchant).await;
        record(&keeper, TransactionType::Sale, "Wang Wu", "Boss Chen", 10, 1_000, at(2024, 6, 3)).await;

        keeper.transfer_to_merchant(&merchant(), handover("Zhang San", 1_500)).await.unwrap();
        keeper.merchant_withdraw(&merchant(), cash_out(700)).await.unwrap();

        let summary = keeper.get_all_employees_summary().await.unwrap();
        let boss = summary.iter().find(|b| b.employee_name == "Boss Chen").unwrap();

        assert!(boss.is_merchant);
        assert_eq!(boss.total_amount, Money::from_yuan(2_500));
        assert_eq!(boss.total_withdrawn, Money::from_yuan(700));
        assert_eq!(boss.current_balance, Money::from_yuan(1_800));

        let names: Vec<&str> = summary.iter().map(|b| b.employee_name.as_str()).collect();
        assert_eq!(names, vec!["Boss Chen", "Zhang San"]);
    }

    #[tokio::test]
    async fn test_unknown_collector_is_an_employee() {
        let keeper = bookkeeper();
        record(&keeper, TransactionType::Sale, "Li Si", "Temp Worker", 10, 300, at(2024, 6, 1)).await;

        let balance = keeper.get_employee_balance("Temp Worker").await.unwrap().unwrap();
        assert!(!balance.is_merchant);
        assert_eq!(balance.current_balance, Money::from_yuan(300));

        assert!(keeper.get_employee_balance("Nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_date_range_narrows_collections() {
        let keeper = bookkeeper();
        collected_2000(&keeper).await;
        record(&keeper, TransactionType::Sale, "Li Si", "Zhang San", 10, 400, at(2024, 5, 20)).await;

        let filter = PaymentFilter {
            start: Some(at(2024, 6, 1)),
            ..PaymentFilter::for_employee("Zhang San")
        };
        let stats = keeper.get_employee_payment_stats(&filter).await.unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats["Zhang San"].total_amount, Money::from_yuan(2_000));
    }

    #[tokio::test]
    async fn test_transfer_defaults_and_validation() {
        let keeper = bookkeeper();

        let transfer = keeper
            .transfer_to_merchant(&merchant(), handover("  Zhang San ", 100))
            .await
            .unwrap();
        assert_eq!(transfer.employee_name, "Zhang San");
        assert_eq!(transfer.transfer_date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());

        let err = keeper
            .transfer_to_merchant(&merchant(), handover("Zhang San", 0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = keeper
            .transfer_to_merchant(&clerk(), handover("Zhang San", 100))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        assert_eq!(keeper.get_employee_transfers(Some("Zhang San")).await.unwrap().len(), 1);
        assert!(keeper.get_employee_transfers(Some("Li Mei")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_withdrawals() {
        let keeper = bookkeeper();

        let withdrawal = keeper.merchant_withdraw(&merchant(), cash_out(300)).await.unwrap();
        assert_eq!(withdrawal.merchant_name, "Boss Chen");
        assert_eq!(withdrawal.note.as_deref(), Some("rent"));

        let admin = tally_core::Session::new("u-admin", "Admin", Role::Admin);
        keeper.merchant_withdraw(&admin, cash_out(200)).await.unwrap();

        assert_eq!(keeper.get_total_withdrawals(None).await.unwrap(), Money::from_yuan(500));
        assert_eq!(
            keeper.get_total_withdrawals(Some("Boss Chen")).await.unwrap(),
            Money::from_yuan(300)
        );

        let err = keeper.merchant_withdraw(&clerk(), cash_out(10)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = keeper.delete_withdrawal(&clerk(), &withdrawal.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        keeper.delete_withdrawal(&merchant(), &withdrawal.id).await.unwrap();
        assert_eq!(keeper.get_merchant_withdrawals().await.unwrap().len(), 1);

        let err = keeper.delete_withdrawal(&merchant(), &withdrawal.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
