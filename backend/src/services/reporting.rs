//! Reporting service for dashboards, financial reports and data export
//!
//! Fetches per-entity sums with `COALESCE(SUM(...), 0)` queries and composes
//! them through the pure aggregation engine in `shared`, which owns the
//! ordering, tie-breaking and guarded-division semantics.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::aggregation::{
    available_lots, daily_totals, percent_of, profit_and_loss, ratio, top_n_by_due,
    top_selling_products, total_in_range, DatedTotal, LotBalance, PartyBalance, ProductSales,
};
use shared::types::DateRange;

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Headline figures for the admin dashboard
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_purchase: Decimal,
    pub total_sales: Decimal,
    pub total_expenses: Decimal,
    pub total_damages: Decimal,
    pub total_packaging_cost: Decimal,
    pub profit_loss: Decimal,
    pub highest_due_vendors: Vec<PartyBalance>,
    pub highest_due_customers: Vec<PartyBalance>,
    pub available_lots: Vec<LotBalance>,
    pub low_stock_count: i64,
}

/// Sales totals and counts over the standard dashboard windows
#[derive(Debug, Serialize)]
pub struct SalesWindowMetrics {
    pub today_total: Decimal,
    pub today_count: i64,
    pub week_total: Decimal,
    pub week_count: i64,
    pub month_total: Decimal,
    pub month_count: i64,
    /// All-time average invoice value; zero when there are no sales
    pub average_sale: Decimal,
}

/// Date-ranged financial report
#[derive(Debug, Serialize)]
pub struct FinancialReport {
    pub range: DateRange,
    pub total_sales: Decimal,
    pub sales_count: i64,
    pub total_purchases: Decimal,
    pub purchases_count: i64,
    pub total_expenses: Decimal,
    pub total_packaging: Decimal,
    pub total_damages: Decimal,
    pub net_profit: Decimal,
    /// Net profit as a percentage of sales; zero when sales are zero
    pub gross_margin_percent: Decimal,
    /// Average sales invoice value; zero when the range has no sales
    pub average_order_value: Decimal,
}

/// Product counts by stock bucket
#[derive(Debug, Serialize)]
pub struct InventoryStatus {
    pub in_stock: i64,
    pub low_stock: i64,
    pub out_of_stock: i64,
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Assemble the dashboard: overall totals, profit and loss, the top-N
    /// due parties on both sides of the ledger, open lots, and low stock
    pub async fn dashboard_metrics(&self, top_n: usize) -> AppResult<DashboardMetrics> {
        let total_purchase = self
            .sum_scalar("SELECT COALESCE(SUM(net_total), 0) FROM purchase_invoices")
            .await?;
        let total_sales = self
            .sum_scalar("SELECT COALESCE(SUM(net_total), 0) FROM sales_invoices")
            .await?;
        let total_expenses = self
            .sum_scalar("SELECT COALESCE(SUM(amount), 0) FROM expenses")
            .await?;
        let total_damages = self
            .sum_scalar("SELECT COALESCE(SUM(amount_loss), 0) FROM damages")
            .await?;
        let total_packaging_cost = self
            .sum_scalar("SELECT COALESCE(SUM(packaging_total), 0) FROM packaging_invoices")
            .await?;

        let profit_loss = profit_and_loss(
            total_sales,
            total_purchase,
            total_expenses,
            total_packaging_cost,
            total_damages,
        );

        // Dues settle against the end of each derivation chain
        let vendor_balances = self
            .party_balances(
                "SELECT v.id, v.name,
                        COALESCE(SUM(pi.net_total_after_cash_cutting), 0) AS invoiced,
                        COALESCE(SUM(pi.paid_amount), 0) AS paid
                 FROM purchase_vendors v
                 LEFT JOIN purchase_invoices pi ON pi.vendor_id = v.id
                 GROUP BY v.id, v.name",
            )
            .await?;

        let customer_balances = self
            .party_balances(
                "SELECT c.id, c.name,
                        COALESCE(SUM(si.net_total_after_packaging), 0) AS invoiced,
                        COALESCE(SUM(si.paid_amount), 0) AS paid
                 FROM customers c
                 LEFT JOIN sales_invoices si ON si.customer_id = c.id
                 GROUP BY c.id, c.name",
            )
            .await?;

        let lots = self.lot_balances().await?;

        let low_stock_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE current_stock <= threshold",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardMetrics {
            total_purchase,
            total_sales,
            total_expenses,
            total_damages,
            total_packaging_cost,
            profit_loss,
            highest_due_vendors: top_n_by_due(vendor_balances, top_n),
            highest_due_customers: top_n_by_due(customer_balances, top_n),
            available_lots: available_lots(lots),
            low_stock_count,
        })
    }

    /// Sales totals for today, the last 7 days and the last 30 days
    /// (windows inclusive of `today`), plus the all-time average sale
    pub async fn sales_windows(&self, today: NaiveDate) -> AppResult<SalesWindowMetrics> {
        let month_start = today
            .checked_sub_days(Days::new(29))
            .ok_or_else(|| AppError::Internal("date out of range".to_string()))?;
        let week_start = today
            .checked_sub_days(Days::new(6))
            .ok_or_else(|| AppError::Internal("date out of range".to_string()))?;

        let rows = self
            .dated_totals(
                "SELECT date, net_total FROM sales_invoices WHERE date >= $1 AND date <= $2",
                month_start,
                today,
            )
            .await?;

        let today_range = DateRange::new(today, today);
        let week_range = DateRange::new(week_start, today);
        let month_range = DateRange::new(month_start, today);

        let count_in = |range: DateRange| rows.iter().filter(|r| range.contains(r.date)).count();

        let (all_time_total, all_time_count) = sqlx::query_as::<_, (Decimal, i64)>(
            "SELECT COALESCE(SUM(net_total), 0), COUNT(*) FROM sales_invoices",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(SalesWindowMetrics {
            today_total: total_in_range(&rows, today_range),
            today_count: count_in(today_range) as i64,
            week_total: total_in_range(&rows, week_range),
            week_count: count_in(week_range) as i64,
            month_total: total_in_range(&rows, month_range),
            month_count: count_in(month_range) as i64,
            average_sale: ratio(all_time_total, Decimal::from(all_time_count)),
        })
    }

    /// Financial report over a date range
    pub async fn financial_report(&self, range: DateRange) -> AppResult<FinancialReport> {
        let (total_sales, sales_count) = sqlx::query_as::<_, (Decimal, i64)>(
            "SELECT COALESCE(SUM(net_total), 0), COUNT(*) FROM sales_invoices
             WHERE date >= $1 AND date <= $2",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        let (total_purchases, purchases_count) = sqlx::query_as::<_, (Decimal, i64)>(
            "SELECT COALESCE(SUM(net_total), 0), COUNT(*) FROM purchase_invoices
             WHERE date >= $1 AND date <= $2",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        let total_expenses = self
            .sum_scalar_in_range(
                "SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE date >= $1 AND date <= $2",
                range,
            )
            .await?;
        let total_packaging = self
            .sum_scalar_in_range(
                "SELECT COALESCE(SUM(packaging_total), 0) FROM packaging_invoices
                 WHERE date >= $1 AND date <= $2",
                range,
            )
            .await?;
        let total_damages = self
            .sum_scalar_in_range(
                "SELECT COALESCE(SUM(amount_loss), 0) FROM damages
                 WHERE date >= $1 AND date <= $2",
                range,
            )
            .await?;

        let net_profit = profit_and_loss(
            total_sales,
            total_purchases,
            total_expenses,
            total_packaging,
            total_damages,
        );

        Ok(FinancialReport {
            range,
            total_sales,
            sales_count,
            total_purchases,
            purchases_count,
            total_expenses,
            total_packaging,
            total_damages,
            net_profit,
            gross_margin_percent: percent_of(net_profit, total_sales),
            average_order_value: ratio(total_sales, Decimal::from(sales_count)),
        })
    }

    /// Daily sales series for the `days` days ending at `end`, zero-filled
    pub async fn sales_trend(&self, end: NaiveDate, days: u32) -> AppResult<Vec<DatedTotal>> {
        let start = end
            .checked_sub_days(Days::new(days.saturating_sub(1) as u64))
            .ok_or_else(|| AppError::Internal("date out of range".to_string()))?;

        let rows = self
            .dated_totals(
                "SELECT date, net_total FROM sales_invoices WHERE date >= $1 AND date <= $2",
                start,
                end,
            )
            .await?;

        Ok(daily_totals(&rows, end, days))
    }

    /// The `n` best-selling products by summed sold weight
    pub async fn top_products(&self, n: usize) -> AppResult<Vec<ProductSales>> {
        let rows = sqlx::query_as::<_, (Uuid, String, Decimal, Decimal)>(
            "SELECT p.id, p.name,
                    COALESCE(SUM(sp.net_weight), 0) AS quantity_sold,
                    COALESCE(SUM(sp.total), 0) AS revenue
             FROM products p
             LEFT JOIN sales_products sp ON sp.product_id = p.id
             GROUP BY p.id, p.name",
        )
        .fetch_all(&self.db)
        .await?;

        let products = rows
            .into_iter()
            .map(|(product_id, name, quantity_sold, revenue)| ProductSales {
                product_id,
                name,
                quantity_sold,
                revenue,
            })
            .collect();

        Ok(top_selling_products(products, n))
    }

    /// Product counts bucketed by stock position
    pub async fn inventory_status(&self) -> AppResult<InventoryStatus> {
        let row = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT
                 COUNT(*) FILTER (WHERE current_stock > threshold),
                 COUNT(*) FILTER (WHERE current_stock <= threshold AND current_stock > 0),
                 COUNT(*) FILTER (WHERE current_stock = 0)
             FROM products",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(InventoryStatus {
            in_stock: row.0,
            low_stock: row.1,
            out_of_stock: row.2,
        })
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Render a report slice as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }

    /// Excel export is not wired up; callers get a typed error instead of
    /// silently empty bytes
    pub fn export_to_excel<T: Serialize>(_data: &[T]) -> AppResult<Vec<u8>> {
        Err(AppError::Internal("Excel export is not implemented".to_string()))
    }

    // ========================================================================
    // Query helpers
    // ========================================================================

    async fn sum_scalar(&self, query: &str) -> AppResult<Decimal> {
        Ok(sqlx::query_scalar::<_, Decimal>(query)
            .fetch_one(&self.db)
            .await?)
    }

    async fn sum_scalar_in_range(&self, query: &str, range: DateRange) -> AppResult<Decimal> {
        Ok(sqlx::query_scalar::<_, Decimal>(query)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(&self.db)
            .await?)
    }

    async fn party_balances(&self, query: &str) -> AppResult<Vec<PartyBalance>> {
        let rows = sqlx::query_as::<_, (Uuid, String, Decimal, Decimal)>(query)
            .fetch_all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(party_id, name, invoiced, paid)| PartyBalance {
                party_id,
                name,
                invoiced,
                paid,
            })
            .collect())
    }

    async fn lot_balances(&self) -> AppResult<Vec<LotBalance>> {
        let rows = sqlx::query_as::<_, (Uuid, String, Decimal, Decimal)>(
            "SELECT pi.id, pi.lot_number,
                    COALESCE(SUM(pp.quantity), 0) AS purchased,
                    COALESCE((SELECT SUM(sl.quantity) FROM sales_lots sl
                              WHERE sl.purchase_invoice_id = pi.id), 0) AS sold
             FROM purchase_invoices pi
             LEFT JOIN purchase_products pp ON pp.invoice_id = pi.id
             GROUP BY pi.id, pi.lot_number",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(purchase_invoice_id, lot_number, purchased, sold)| LotBalance {
                purchase_invoice_id,
                lot_number,
                purchased,
                sold,
            })
            .collect())
    }

    async fn dated_totals(
        &self,
        query: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<DatedTotal>> {
        let rows = sqlx::query_as::<_, (NaiveDate, Decimal)>(query)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(date, total)| DatedTotal { date, total })
            .collect())
    }
}
