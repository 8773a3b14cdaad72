//! Salary operations.
//!
//! Salaries are computed from the transaction log on every call. Saving one
//! only copies the figures into the salary log; it never feeds back into
//! later calculations.

use tally_core::salary::{self, BonusTier, EmployeeSalary, BONUS_TIERS};
use tally_core::{EmployeeFilter, SalaryRecord, TransactionFilter, YearMonth};
use tracing::{debug, info};

use crate::bookkeeper::Bookkeeper;
use crate::error::ApiResult;

impl Bookkeeper {
    /// One employee's salary for one month.
    ///
    /// A name with no transactions that month gets the base salary and
    /// zero everything else.
    pub async fn calculate_monthly_salary(
        &self,
        employee_name: &str,
        month: YearMonth,
    ) -> ApiResult<EmployeeSalary> {
        debug!(employee = employee_name, %month, "calculate_monthly_salary");

        let filter = TransactionFilter {
            collector: Some(employee_name.to_string()),
            ..self.month_filter(month)
        };
        let transactions = self.store().list_transactions(&filter).await?;

        Ok(salary::calculate_monthly_salary(
            employee_name,
            month,
            &transactions,
            self.calendar(),
        ))
    }

    /// Salaries of every active `employee`-role account, highest first.
    pub async fn get_all_employees_monthly_salary(
        &self,
        month: YearMonth,
    ) -> ApiResult<Vec<EmployeeSalary>> {
        debug!(%month, "get_all_employees_monthly_salary");

        let employees = self.store().list_employees(&EmployeeFilter::salaried()).await?;
        let transactions = self.store().list_transactions(&self.month_filter(month)).await?;

        Ok(salary::calculate_salaries(
            employees.iter().map(|e| e.name.as_str()),
            month,
            &transactions,
            self.calendar(),
        ))
    }

    /// Appends a computed salary to the salary log.
    pub async fn save_salary_record(&self, salary: &EmployeeSalary) -> ApiResult<SalaryRecord> {
        let record = salary.to_record(Self::new_id(), self.now());
        self.store().append_salary_record(&record).await?;

        info!(
            employee = %record.employee_name,
            year = record.year,
            month = record.month,
            total = %record.total_salary,
            "Salary record saved"
        );
        Ok(record)
    }

    /// The salary log, latest month first.
    pub async fn get_salary_records(&self) -> ApiResult<Vec<SalaryRecord>> {
        Ok(self.store().list_salary_records().await?)
    }

    /// The bonus table shown next to the salary sheet.
    pub fn get_bonus_tiers(&self) -> &'static [BonusTier] {
        &BONUS_TIERS
    }

    /// Every transaction inside `month`, any type.
    pub(crate) fn month_filter(&self, month: YearMonth) -> TransactionFilter {
        TransactionFilter::all().between(
            self.calendar().month_start(month),
            self.calendar().month_end(month),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::bookkeeper::fixtures::*;
    use tally_core::{Money, Quantity, Role, TransactionType, YearMonth};

    fn june() -> YearMonth {
        YearMonth::new(2024, 6).unwrap()
    }

    #[tokio::test]
    async fn test_salary_counts_only_own_sales_in_month() {
        let keeper = bookkeeper();
        record(&keeper, TransactionType::Sale, "Li Si", "Zhang San", 1_200, 3_600, at(2024, 6, 3)).await;
        record(&keeper, TransactionType::Sale, "Li Si", "Zhang San", 300, 900, at(2024, 6, 20)).await;
        record(&keeper, TransactionType::Return, "Li Si", "Zhang San", 50, 150, at(2024, 6, 21)).await;
        record(&keeper, TransactionType::Sale, "Li Si", "Zhang San", 900, 2_700, at(2024, 5, 31)).await;
        record(&keeper, TransactionType::Sale, "Li Si", "Li Mei", 5_000, 15_000, at(2024, 6, 4)).await;

        let salary = keeper.calculate_monthly_salary("Zhang San", june()).await.unwrap();

        assert_eq!(salary.total_sales_quantity, Quantity::from_units(1_500));
        assert_eq!(salary.commission, Money::from_yuan(1_050));
        assert_eq!(salary.bonus, Money::from_yuan(500));
        assert_eq!(salary.total_salary, Money::from_yuan(4_550));
        assert_eq!(salary.transaction_count, 3);
    }

    #[tokio::test]
    async fn test_unknown_employee_gets_base_salary() {
        let keeper = bookkeeper();
        let salary = keeper.calculate_monthly_salary("Nobody", june()).await.unwrap();

        assert_eq!(salary.total_salary, Money::from_yuan(3_000));
        assert_eq!(salary.transaction_count, 0);
    }

    #[tokio::test]
    async fn test_all_salaries_cover_active_employees_only() {
        let keeper = bookkeeper();
        hire(&keeper, "Boss Chen", Role::Merchant).await;
        hire(&keeper, "Zhang San", Role::Employee).await;
        hire(&keeper, "Li Mei", Role::Employee).await;
        record(&keeper, TransactionType::Sale, "Li Si", "Li Mei", 3_500, 10_500, at(2024, 6, 2)).await;
        record(&keeper, TransactionType::Sale, "Li Si", "Boss Chen", 9_000, 27_000, at(2024, 6, 2)).await;

        let salaries = keeper.get_all_employees_monthly_salary(june()).await.unwrap();
        let names: Vec<&str> = salaries.iter().map(|s| s.employee_name.as_str()).collect();

        assert_eq!(names, vec!["Li Mei", "Zhang San"]);
        assert_eq!(salaries[0].bonus, Money::from_yuan(1_000));
    }

    #[tokio::test]
    async fn test_saved_salaries_are_listed_latest_month_first() {
        let keeper = bookkeeper();
        record(&keeper, TransactionType::Sale, "Li Si", "Zhang San", 100, 300, at(2024, 5, 2)).await;

        let may = keeper
            .calculate_monthly_salary("Zhang San", YearMonth::new(2024, 5).unwrap())
            .await
            .unwrap();
        let june_salary = keeper.calculate_monthly_salary("Zhang San", june()).await.unwrap();

        keeper.save_salary_record(&june_salary).await.unwrap();
        let saved = keeper.save_salary_record(&may).await.unwrap();
        assert_eq!(saved.commission, Money::from_yuan(70));

        let records = keeper.get_salary_records().await.unwrap();
        let months: Vec<u32> = records.iter().map(|r| r.month).collect();
        assert_eq!(months, vec![6, 5]);
    }

    #[test]
    fn test_bonus_tiers_are_exposed() {
        let keeper = bookkeeper();
        let tiers = keeper.get_bonus_tiers();
        assert_eq!(tiers.len(), 6);
        assert_eq!(tiers[5].max_units, None);
    }
}
