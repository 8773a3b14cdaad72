//! Customer binding operations.
//!
//! A customer is bound to at most one employee. Binding an already bound
//! customer moves them.

use std::collections::BTreeSet;
use tally_core::validation::validate_name;
use tally_core::{CustomerBinding, Session, TransactionFilter};
use tracing::info;

use crate::bookkeeper::Bookkeeper;
use crate::error::ApiResult;

impl Bookkeeper {
    /// Binds `customer_name` to `employee_name`, replacing any previous binding.
    pub async fn bind_customer(
        &self,
        session: &Session,
        customer_name: &str,
        employee_name: &str,
    ) -> ApiResult<CustomerBinding> {
        self.authorize(session, "bind customer")?;

        let binding = CustomerBinding {
            id: Self::new_id(),
            customer_name: validate_name("customer_name", customer_name)?,
            employee_name: validate_name("employee_name", employee_name)?,
            created_at: self.now(),
        };
        self.store().upsert_binding(&binding).await?;

        info!(
            customer = %binding.customer_name,
            employee = %binding.employee_name,
            "Customer bound"
        );
        Ok(binding)
    }

    /// Removes a customer's binding. Returns whether there was one.
    pub async fn unbind_customer(&self, session: &Session, customer_name: &str) -> ApiResult<bool> {
        self.authorize(session, "unbind customer")?;

        let removed = self.store().delete_binding(customer_name.trim()).await?;
        if removed {
            info!(customer = customer_name.trim(), "Customer unbound");
        }
        Ok(removed)
    }

    pub async fn get_customer_bindings(&self) -> ApiResult<Vec<CustomerBinding>> {
        Ok(self.store().list_bindings().await?)
    }

    /// The employee a customer is bound to.
    pub async fn get_customer_employee(&self, customer_name: &str) -> ApiResult<Option<String>> {
        let bindings = self.store().list_bindings().await?;
        Ok(bindings
            .into_iter()
            .find(|b| b.customer_name == customer_name.trim())
            .map(|b| b.employee_name))
    }

    /// Customers bound to an employee, most recently bound first.
    pub async fn get_employee_customers(&self, employee_name: &str) -> ApiResult<Vec<String>> {
        let bindings = self.store().list_bindings().await?;
        Ok(bindings
            .into_iter()
            .filter(|b| b.employee_name == employee_name.trim())
            .map(|b| b.customer_name)
            .collect())
    }

    /// Every customer name that appears on a transaction, sorted.
    pub async fn get_all_customer_names(&self) -> ApiResult<Vec<String>> {
        let transactions = self.store().list_transactions(&TransactionFilter::all()).await?;

        let names: BTreeSet<String> = transactions
            .into_iter()
            .map(|tx| tx.customer_name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Ok(names.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::bookkeeper::fixtures::*;
    use crate::error::ErrorCode;
    use tally_core::TransactionType;

    #[tokio::test]
    async fn test_rebinding_moves_the_customer() {
        let keeper = bookkeeper();
        keeper.bind_customer(&merchant(), "Li Si", "Zhang San").await.unwrap();
        keeper.bind_customer(&merchant(), "Wang Wu", "Zhang San").await.unwrap();
        keeper.bind_customer(&merchant(), " Li Si ", "Li Mei").await.unwrap();

        assert_eq!(keeper.get_customer_bindings().await.unwrap().len(), 2);
        assert_eq!(
            keeper.get_customer_employee("Li Si").await.unwrap().as_deref(),
            Some("Li Mei")
        );
        assert_eq!(
            keeper.get_employee_customers("Zhang San").await.unwrap(),
            vec!["Wang Wu".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unbind() {
        let keeper = bookkeeper();
        keeper.bind_customer(&merchant(), "Li Si", "Zhang San").await.unwrap();

        let err = keeper.unbind_customer(&clerk(), "Li Si").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        assert!(keeper.unbind_customer(&merchant(), "Li Si").await.unwrap());
        assert!(!keeper.unbind_customer(&merchant(), "Li Si").await.unwrap());
        assert_eq!(keeper.get_customer_employee("Li Si").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_binding_is_gated_and_validated() {
        let keeper = bookkeeper();

        let err = keeper.bind_customer(&clerk(), "Li Si", "Zhang San").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = keeper.bind_customer(&merchant(), "", "Zhang San").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_customer_names_are_distinct_and_sorted() {
        let keeper = bookkeeper();
        record(&keeper, TransactionType::Sale, "Wang Wu", "Zhang San", 1, 3, at(2024, 6, 1)).await;
        record(&keeper, TransactionType::Sale, "Li Si", "Zhang San", 1, 3, at(2024, 6, 2)).await;
        record(&keeper, TransactionType::Return, "Wang Wu", "Zhang San", 1, 3, at(2024, 6, 3)).await;

        assert_eq!(
            keeper.get_all_customer_names().await.unwrap(),
            vec!["Li Si".to_string(), "Wang Wu".to_string()]
        );
    }
}
