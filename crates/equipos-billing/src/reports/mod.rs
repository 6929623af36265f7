//! Aggregations over already-fetched records.
//!
//! Every ratio goes through a guarded division: a zero or negative
//! denominator yields 0 instead of failing.

pub mod dashboard;
pub mod operators;
pub mod performance;
pub mod statement;

pub use dashboard::{dashboard_kpis, recent_rentals, DashboardInput, DashboardStats, RecentRental};
pub use operators::{operator_payment_summary, OperatorPaymentSummary, OperatorTotals};
pub use performance::{
    equipment_performance, EquipmentPerformance, PerformanceReport, PerformanceSummary,
};
pub use statement::{
    account_statement, client_debt, AccountStatement, ClientDebt, PaymentsByDate, StatementFilter,
};
