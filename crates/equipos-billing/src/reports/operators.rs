use crate::domain::records::OperatorPayment;
use crate::domain::types::{Amount, DateRange, EquipmentId, OperatorId};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorTotals {
    #[serde(rename = "operador_id")]
    pub operator_id: OperatorId,
    #[serde(rename = "horas")]
    pub hours: Decimal,
    #[serde(rename = "monto")]
    pub amount: Amount,
    #[serde(rename = "pagos")]
    pub payment_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperatorPaymentSummary {
    #[serde(rename = "operadores")]
    pub operators: Vec<OperatorTotals>,
    #[serde(rename = "total_horas")]
    pub total_hours: Decimal,
    #[serde(rename = "total_monto")]
    pub total_amount: Amount,
}

/// Operator payments in `range` summed per operator, ordered by operator id.
/// Payments with no operator are left out.
pub fn operator_payment_summary(
    payments: &[OperatorPayment],
    range: &DateRange,
    operator: Option<&OperatorId>,
    equipment: Option<&EquipmentId>,
) -> OperatorPaymentSummary {
    let mut per_operator: BTreeMap<&OperatorId, (Decimal, Amount, usize)> = BTreeMap::new();

    for payment in payments {
        let Some(operator_id) = payment.operator_id.as_ref() else {
            continue;
        };
        if !range.contains(&payment.fecha)
            || operator.is_some_and(|o| o != operator_id)
            || equipment.is_some_and(|e| payment.equipment_id.as_ref() != Some(e))
        {
            continue;
        }

        let (hours, amount, count) = per_operator.entry(operator_id).or_default();
        *hours += payment.hours;
        *amount = amount.add(payment.amount);
        *count += 1;
    }

    let mut summary = OperatorPaymentSummary::default();
    for (operator_id, (hours, amount, payment_count)) in per_operator {
        summary.total_hours += hours;
        summary.total_amount = summary.total_amount.add(amount);
        summary.operators.push(OperatorTotals {
            operator_id: operator_id.clone(),
            hours,
            amount,
            payment_count,
        });
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_totals_per_operator() {
        let payments: Vec<OperatorPayment> = serde_json::from_value(json!([
            {"fecha": "2025-01-02", "operador_id": "O2", "equipo_id": "E1", "horas": 8, "monto": 800},
            {"fecha": "2025-01-03", "operador_id": "O1", "equipo_id": "E1", "horas": 4, "monto": 350},
            {"fecha": "2025-01-04", "operador_id": "O2", "equipo_id": "E2", "horas": 2, "monto": 200},
            {"fecha": "2025-02-01", "operador_id": "O1", "equipo_id": "E1", "horas": 9, "monto": 900},
            {"fecha": "2025-01-05", "equipo_id": "E1", "horas": 1, "monto": 100}
        ]))
        .unwrap();
        let range = DateRange::new("2025-01-01", "2025-01-31");

        let summary = operator_payment_summary(&payments, &range, None, None);
        assert_eq!(summary.operators.len(), 2);
        assert_eq!(summary.operators[0].operator_id, OperatorId::new("O1"));
        assert_eq!(summary.operators[1].hours, dec!(10));
        assert_eq!(summary.operators[1].payment_count, 2);
        assert_eq!(summary.total_amount.as_decimal(), dec!(1350));

        let e1 = EquipmentId::new("E1");
        let summary = operator_payment_summary(&payments, &range, None, Some(&e1));
        assert_eq!(summary.total_hours, dec!(12));

        let o1 = OperatorId::new("O1");
        let summary = operator_payment_summary(&payments, &range, Some(&o1), None);
        assert_eq!(summary.operators.len(), 1);
        assert_eq!(summary.total_amount.as_decimal(), dec!(350));
    }
}
