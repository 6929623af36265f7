//! Client payments (`abonos`) and their allocation to unpaid rentals.

use crate::domain::rentals::Rental;
use crate::domain::types::{lenient, Amount, ClientId, RentalId};
use crate::error::{BillingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// A general payment made by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "cliente_id")]
    pub client_id: ClientId,
    #[serde(default)]
    pub fecha: String,
    #[serde(rename = "monto", default, deserialize_with = "lenient::amount")]
    pub amount: Amount,
    #[serde(rename = "cuenta_id", default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(rename = "comentario", default, deserialize_with = "lenient::text")]
    pub comment: Option<String>,
}

/// Part of a client payment applied to a single rental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayment {
    #[serde(rename = "transaccion_id")]
    pub rental_id: RentalId,
    #[serde(rename = "cliente_id", default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub fecha: String,
    #[serde(rename = "monto", default, deserialize_with = "lenient::amount")]
    pub amount: Amount,
    #[serde(rename = "cuenta_id", default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(rename = "comentario", default, deserialize_with = "lenient::text")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedPayment {
    pub payment: InvoicePayment,
    /// Whether the rental is fully paid once this payment is counted
    #[serde(rename = "pagado")]
    pub settles: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentAllocation {
    #[serde(rename = "abono")]
    pub client_payment: ClientPayment,
    #[serde(rename = "aplicados")]
    pub applied: Vec<AppliedPayment>,
    /// Portion of the payment left unapplied
    #[serde(rename = "restante")]
    pub remainder: Amount,
}

impl PaymentAllocation {
    pub fn settled_rentals(&self) -> impl Iterator<Item = &RentalId> {
        self.applied
            .iter()
            .filter(|a| a.settles)
            .map(|a| &a.payment.rental_id)
    }
}

/// A rental counts as paid once its payments cover a positive `monto`.
pub fn is_fully_paid(amount: Amount, total_paid: Amount) -> bool {
    total_paid >= amount && amount.is_positive()
}

/// Total already paid per rental.
pub fn paid_by_rental(payments: &[InvoicePayment]) -> HashMap<&RentalId, Amount> {
    let mut totals: HashMap<&RentalId, Amount> = HashMap::new();
    for payment in payments {
        let total = totals.entry(&payment.rental_id).or_default();
        *total = total.add(payment.amount);
    }
    totals
}

/// Spread a general client payment over the client's unpaid rentals.
///
/// Rentals are settled oldest `fecha` first and never receive more than
/// their outstanding balance. Rentals already covered by `prior_payments`
/// are skipped.
pub fn allocate_general_payment(
    pending: &[Rental],
    prior_payments: &[InvoicePayment],
    payment: &ClientPayment,
) -> Result<PaymentAllocation> {
    if !payment.amount.is_positive() {
        return Err(BillingError::InvalidPayment {
            reason: "el monto del abono debe ser mayor que cero".to_string(),
        });
    }

    let mut ordered: Vec<&Rental> = pending
        .iter()
        .filter(|r| !r.paid && r.client_id.as_ref() == Some(&payment.client_id))
        .collect();
    if ordered.is_empty() {
        return Err(BillingError::NoPendingInvoices {
            client: payment.client_id.to_string(),
        });
    }
    ordered.sort_by(|a, b| a.fecha.cmp(&b.fecha));

    let already_paid = paid_by_rental(prior_payments);
    let mut remaining = payment.amount;
    let mut applied = Vec::new();

    for rental in ordered {
        if !remaining.is_positive() {
            break;
        }

        let previous = already_paid.get(&rental.id).copied().unwrap_or_default();
        let outstanding = rental.amount.subtract(previous);
        if !outstanding.is_positive() {
            continue;
        }

        let portion = remaining.min(outstanding);
        remaining = remaining.subtract(portion);

        applied.push(AppliedPayment {
            payment: InvoicePayment {
                rental_id: rental.id.clone(),
                client_id: Some(payment.client_id.clone()),
                fecha: payment.fecha.clone(),
                amount: portion,
                account_id: payment.account_id.clone(),
                comment: payment.comment.clone(),
            },
            settles: is_fully_paid(rental.amount, previous.add(portion)),
        });
    }

    info!(
        "Allocated payment of {} for client {} over {} rentals, {} left unapplied",
        payment.amount,
        payment.client_id,
        applied.len(),
        remaining
    );

    Ok(PaymentAllocation {
        client_payment: payment.clone(),
        applied,
        remainder: remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn rental(id: &str, fecha: &str, monto: i64) -> Rental {
        serde_json::from_value(json!({
            "transaccion_id": id,
            "fecha": fecha,
            "cliente_id": "C1",
            "monto": monto,
            "pagado": false
        }))
        .unwrap()
    }

    fn abono(monto: i64) -> ClientPayment {
        ClientPayment {
            id: None,
            client_id: ClientId::new("C1"),
            fecha: "2025-06-01".to_string(),
            amount: Amount::new(monto.into()),
            account_id: Some("banco".to_string()),
            comment: None,
        }
    }

    #[test]
    fn test_oldest_rental_is_settled_first() {
        let pending = vec![rental("b", "2025-05-10", 300), rental("a", "2025-04-01", 500)];

        let allocation = allocate_general_payment(&pending, &[], &abono(600)).unwrap();

        assert_eq!(allocation.applied.len(), 2);
        assert_eq!(allocation.applied[0].payment.rental_id, RentalId::new("a"));
        assert_eq!(allocation.applied[0].payment.amount.as_decimal(), dec!(500));
        assert!(allocation.applied[0].settles);
        assert_eq!(allocation.applied[1].payment.amount.as_decimal(), dec!(100));
        assert!(!allocation.applied[1].settles);
        assert!(allocation.remainder.is_zero());
        assert_eq!(allocation.settled_rentals().count(), 1);
    }

    #[test]
    fn test_prior_payments_reduce_outstanding() {
        let pending = vec![rental("a", "2025-04-01", 500), rental("b", "2025-05-10", 300)];
        let prior = vec![InvoicePayment {
            rental_id: RentalId::new("a"),
            client_id: None,
            fecha: "2025-05-01".to_string(),
            amount: Amount::new(dec!(450)),
            account_id: None,
            comment: None,
        }];

        let allocation = allocate_general_payment(&pending, &prior, &abono(1000)).unwrap();

        assert_eq!(allocation.applied[0].payment.amount.as_decimal(), dec!(50));
        assert!(allocation.applied[0].settles);
        assert_eq!(allocation.applied[1].payment.amount.as_decimal(), dec!(300));
        assert_eq!(allocation.remainder.as_decimal(), dec!(650));
    }

    #[test]
    fn test_rejects_non_positive_payment() {
        let pending = vec![rental("a", "2025-04-01", 500)];
        assert!(matches!(
            allocate_general_payment(&pending, &[], &abono(0)),
            Err(BillingError::InvalidPayment { .. })
        ));
    }

    #[test]
    fn test_no_pending_invoices() {
        assert!(matches!(
            allocate_general_payment(&[], &[], &abono(100)),
            Err(BillingError::NoPendingInvoices { .. })
        ));
    }

    #[test]
    fn test_zero_amount_rental_is_never_paid() {
        assert!(!is_fully_paid(Amount::zero(), Amount::zero()));
        assert!(is_fully_paid(Amount::new(dec!(10)), Amount::new(dec!(10))));
        assert!(!is_fully_paid(Amount::new(dec!(10)), Amount::new(dec!(9.99))));
    }
}
