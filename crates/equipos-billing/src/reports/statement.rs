use crate::domain::payments::ClientPayment;
use crate::domain::rentals::Rental;
use crate::domain::types::{Amount, ClientId, DateRange};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementFilter {
    /// `None` produces the general statement across all clients
    pub client: Option<ClientId>,
    pub range: Option<DateRange>,
}

impl StatementFilter {
    fn includes(&self, client: Option<&ClientId>, fecha: &str) -> bool {
        if self.client.is_some() && client != self.client.as_ref() {
            return false;
        }
        self.range.as_ref().map_or(true, |r| r.contains(fecha))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentsByDate {
    pub fecha: String,
    #[serde(rename = "total_abonado")]
    pub total: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStatement {
    #[serde(rename = "facturas")]
    pub invoices: Vec<Rental>,
    #[serde(rename = "abonos")]
    pub payments: Vec<PaymentsByDate>,
    #[serde(rename = "total_facturado")]
    pub total_billed: Amount,
    #[serde(rename = "total_abonado")]
    pub total_paid: Amount,
    #[serde(rename = "saldo")]
    pub balance: Amount,
}

/// Invoices and client payments for a client (or all clients), with
/// payments grouped per fecha in ascending order.
pub fn account_statement(
    rentals: &[Rental],
    client_payments: &[ClientPayment],
    filter: &StatementFilter,
) -> AccountStatement {
    let mut invoices: Vec<Rental> = rentals
        .iter()
        .filter(|r| filter.includes(r.client_id.as_ref(), &r.fecha))
        .cloned()
        .collect();
    invoices.sort_by(|a, b| a.fecha.cmp(&b.fecha));

    let mut by_date: BTreeMap<&str, Amount> = BTreeMap::new();
    for payment in client_payments
        .iter()
        .filter(|p| filter.includes(Some(&p.client_id), &p.fecha))
    {
        let total = by_date.entry(payment.fecha.as_str()).or_default();
        *total = total.add(payment.amount);
    }
    let payments: Vec<PaymentsByDate> = by_date
        .into_iter()
        .map(|(fecha, total)| PaymentsByDate {
            fecha: fecha.to_string(),
            total,
        })
        .collect();

    let total_billed: Amount = invoices.iter().map(|r| r.amount).sum();
    let total_paid: Amount = payments.iter().map(|p| p.total).sum();

    AccountStatement {
        invoices,
        payments,
        total_billed,
        total_paid,
        balance: total_billed.subtract(total_paid),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientDebt {
    #[serde(rename = "total_facturado")]
    pub total_billed: Amount,
    #[serde(rename = "total_abonado")]
    pub total_paid: Amount,
    #[serde(rename = "saldo")]
    pub balance: Amount,
}

/// Billed minus paid for one client.
pub fn client_debt(
    rentals: &[Rental],
    client_payments: &[ClientPayment],
    client: &ClientId,
    range: Option<&DateRange>,
) -> ClientDebt {
    let statement = account_statement(
        rentals,
        client_payments,
        &StatementFilter {
            client: Some(client.clone()),
            range: range.cloned(),
        },
    );
    ClientDebt {
        total_billed: statement.total_billed,
        total_paid: statement.total_paid,
        balance: statement.balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn fixtures() -> (Vec<Rental>, Vec<ClientPayment>) {
        let rentals = serde_json::from_value(json!([
            {"transaccion_id": "r1", "fecha": "2025-03-10", "cliente_id": "C1", "monto": 1000},
            {"transaccion_id": "r2", "fecha": "2025-03-02", "cliente_id": "C1", "monto": 500},
            {"transaccion_id": "r3", "fecha": "2025-03-05", "cliente_id": "C2", "monto": 300}
        ]))
        .unwrap();
        let payments = serde_json::from_value(json!([
            {"cliente_id": "C1", "fecha": "2025-03-20", "monto": 200},
            {"cliente_id": "C1", "fecha": "2025-03-15", "monto": 300},
            {"cliente_id": "C1", "fecha": "2025-03-20", "monto": 100},
            {"cliente_id": "C2", "fecha": "2025-03-15", "monto": 300}
        ]))
        .unwrap();
        (rentals, payments)
    }

    #[test]
    fn test_client_statement() {
        let (rentals, payments) = fixtures();
        let filter = StatementFilter {
            client: Some(ClientId::new("C1")),
            range: Some(DateRange::new("2025-03-01", "2025-03-31")),
        };

        let statement = account_statement(&rentals, &payments, &filter);

        assert_eq!(statement.invoices.len(), 2);
        assert_eq!(statement.invoices[0].id.as_str(), "r2");
        assert_eq!(
            statement.payments,
            vec![
                PaymentsByDate {
                    fecha: "2025-03-15".to_string(),
                    total: Amount::new(dec!(300)),
                },
                PaymentsByDate {
                    fecha: "2025-03-20".to_string(),
                    total: Amount::new(dec!(300)),
                },
            ]
        );
        assert_eq!(statement.balance.as_decimal(), dec!(900));
    }

    #[test]
    fn test_general_statement_and_debt() {
        let (rentals, payments) = fixtures();

        let general = account_statement(&rentals, &payments, &StatementFilter::default());
        assert_eq!(general.total_billed.as_decimal(), dec!(1800));
        assert_eq!(general.total_paid.as_decimal(), dec!(900));

        let debt = client_debt(&rentals, &payments, &ClientId::new("C2"), None);
        assert!(debt.balance.is_zero());

        let overpaid = client_debt(
            &rentals,
            &payments,
            &ClientId::new("C1"),
            Some(&DateRange::new("2025-03-12", "2025-03-31")),
        );
        assert_eq!(overpaid.balance.as_decimal(), dec!(-600));
    }
}
