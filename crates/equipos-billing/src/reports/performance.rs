use crate::domain::records::{Expense, OperatorPayment};
use crate::domain::rentals::Rental;
use crate::domain::types::{guarded_div, ratio_pct, Amount, BillingModality, DateRange, EquipmentId};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Billing and yield of one piece of equipment over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentPerformance {
    #[serde(rename = "equipo_id")]
    pub equipment_id: EquipmentId,
    #[serde(rename = "equipo")]
    pub equipment_name: String,
    #[serde(rename = "horas_facturadas")]
    pub billed_hours: Decimal,
    #[serde(rename = "volumen_facturado")]
    pub billed_volume: Decimal,
    #[serde(rename = "monto_facturado")]
    pub billed_amount: Amount,
    #[serde(rename = "horas_pagadas_operador")]
    pub operator_hours: Decimal,
    #[serde(rename = "monto_pagado_operador")]
    pub operator_pay: Amount,
    #[serde(rename = "gastos_equipo")]
    pub expenses: Amount,
    #[serde(rename = "precio_hora_facturado")]
    pub price_per_hour: Decimal,
    #[serde(rename = "precio_unidad_facturado")]
    pub price_per_unit: Decimal,
    #[serde(rename = "rendimiento_neto")]
    pub net_yield: Amount,
    #[serde(rename = "margen_porcentaje")]
    pub margin_pct: Decimal,
    #[serde(rename = "modalidades")]
    pub modalities: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    #[serde(rename = "total_horas_facturadas")]
    pub billed_hours: Decimal,
    #[serde(rename = "total_facturado")]
    pub billed_amount: Amount,
    #[serde(rename = "total_pagado_operador")]
    pub operator_pay: Amount,
    #[serde(rename = "total_gastos")]
    pub expenses: Amount,
    #[serde(rename = "rendimiento_neto")]
    pub net_yield: Amount,
    #[serde(rename = "margen_promedio")]
    pub average_margin_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub range: DateRange,
    pub equipment: Vec<EquipmentPerformance>,
    pub summary: PerformanceSummary,
}

#[derive(Default)]
struct Accumulator {
    billed_hours: Decimal,
    billed_volume: Decimal,
    billed_amount: Amount,
    operator_hours: Decimal,
    operator_pay: Amount,
}

fn in_scope(
    equipment_id: Option<&EquipmentId>,
    fecha: &str,
    range: &DateRange,
    only: Option<&EquipmentId>,
) -> Option<EquipmentId> {
    let id = equipment_id.filter(|id| !id.as_str().is_empty())?;
    if only.is_some_and(|only| only != id) || !range.contains(fecha) {
        return None;
    }
    Some(id.clone())
}

/// Comma separated modalities that contributed, `Fijo` when money was
/// billed without hours or volume, `-` when nothing was billed.
fn modalities_label(hours: Decimal, volume: Decimal, amount: Amount) -> String {
    let mut labels = Vec::new();
    if hours > Decimal::ZERO {
        labels.push(BillingModality::Hours.label());
    }
    if volume > Decimal::ZERO {
        labels.push(BillingModality::Volume.label());
    }
    if hours.is_zero() && volume.is_zero() && amount.is_positive() {
        labels.push(BillingModality::Fixed.label());
    }
    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(", ")
    }
}

/// Per-equipment yield over `range`.
///
/// Equipment appears once it has a rental or an operator payment in range;
/// expenses alone do not create a row. `names` maps equipment ids to their
/// display name, unknown ids are shown as `ID:<id>`.
pub fn equipment_performance(
    rentals: &[Rental],
    operator_payments: &[OperatorPayment],
    expenses: &[Expense],
    range: &DateRange,
    equipment: Option<&EquipmentId>,
    names: &HashMap<EquipmentId, String>,
) -> PerformanceReport {
    let mut per_equipment: BTreeMap<EquipmentId, Accumulator> = BTreeMap::new();

    for rental in rentals {
        let Some(id) = in_scope(rental.equipment_id.as_ref(), &rental.fecha, range, equipment)
        else {
            continue;
        };
        let entry = per_equipment.entry(id).or_default();
        match BillingModality::parse_lenient(rental.pricing.modality.as_deref().unwrap_or("horas")) {
            Some(BillingModality::Hours) => entry.billed_hours += rental.pricing.hours_value(),
            Some(BillingModality::Volume) => entry.billed_volume += rental.pricing.volume_value(),
            Some(BillingModality::Fixed) | None => {}
        }
        entry.billed_amount = entry.billed_amount.add(rental.amount);
    }

    for payment in operator_payments {
        let Some(id) = in_scope(payment.equipment_id.as_ref(), &payment.fecha, range, equipment)
        else {
            continue;
        };
        let entry = per_equipment.entry(id).or_default();
        entry.operator_hours += payment.hours;
        entry.operator_pay = entry.operator_pay.add(payment.amount);
    }

    let mut expenses_by_equipment: HashMap<EquipmentId, Amount> = HashMap::new();
    for expense in expenses {
        if let Some(id) = in_scope(expense.equipment_id.as_ref(), &expense.fecha, range, equipment) {
            let total = expenses_by_equipment.entry(id).or_default();
            *total = total.add(expense.amount);
        }
    }

    let mut summary = PerformanceSummary::default();
    let rows: Vec<EquipmentPerformance> = per_equipment
        .into_iter()
        .map(|(id, acc)| {
            let expenses = expenses_by_equipment.get(&id).copied().unwrap_or_default();
            let billed = acc.billed_amount.as_decimal();
            let net_yield = acc.billed_amount.subtract(acc.operator_pay).subtract(expenses);

            summary.billed_hours += acc.billed_hours;
            summary.billed_amount = summary.billed_amount.add(acc.billed_amount);
            summary.operator_pay = summary.operator_pay.add(acc.operator_pay);
            summary.expenses = summary.expenses.add(expenses);
            summary.net_yield = summary.net_yield.add(net_yield);

            EquipmentPerformance {
                equipment_name: names
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| format!("ID:{}", id)),
                billed_hours: acc.billed_hours,
                billed_volume: acc.billed_volume,
                billed_amount: acc.billed_amount,
                operator_hours: acc.operator_hours,
                operator_pay: acc.operator_pay,
                expenses,
                price_per_hour: guarded_div(billed, acc.billed_hours),
                price_per_unit: guarded_div(billed, acc.billed_volume),
                net_yield,
                margin_pct: ratio_pct(net_yield.as_decimal(), billed),
                modalities: modalities_label(acc.billed_hours, acc.billed_volume, acc.billed_amount),
                equipment_id: id,
            }
        })
        .collect();

    summary.average_margin_pct = ratio_pct(
        summary.net_yield.as_decimal(),
        summary.billed_amount.as_decimal(),
    );

    PerformanceReport {
        range: range.clone(),
        equipment: rows,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    fn parse<T: serde::de::DeserializeOwned>(value: Value) -> Vec<T> {
        serde_json::from_value(value).unwrap()
    }

    fn january() -> DateRange {
        DateRange::new("2025-01-01", "2025-01-31")
    }

    #[test]
    fn test_yield_and_margin_per_equipment() {
        let rentals: Vec<Rental> = parse(json!([
            {"transaccion_id": "r1", "fecha": "2025-01-05", "equipo_id": "E1", "modalidad_facturacion": "horas",
             "horas": 10, "precio_por_hora": 100, "monto": 1000},
            {"transaccion_id": "r2", "fecha": "2025-01-06", "equipo_id": "E1", "modalidad_facturacion": "volumen",
             "volumen_generado": 20, "precio_por_unidad": 50, "monto": 1000},
            {"transaccion_id": "r3", "fecha": "2025-01-07", "equipo_id": "E2", "modalidad_facturacion": "fijo",
             "monto_fijo": 500, "monto": 500},
            {"transaccion_id": "r4", "fecha": "2025-02-01", "equipo_id": "E1", "horas": 99, "monto": 9900},
            {"transaccion_id": "r5", "fecha": "2025-01-08", "monto": 700}
        ]));
        let payments: Vec<OperatorPayment> = parse(json!([
            {"fecha": "2025-01-05", "equipo_id": "E1", "horas": 10, "monto": 400}
        ]));
        let expenses: Vec<Expense> = parse(json!([
            {"fecha": "2025-01-10", "equipo_id": "E1", "monto": 100},
            {"fecha": "2025-01-10", "equipo_id": "E3", "monto": 999}
        ]));
        let names = HashMap::from([(EquipmentId::new("E1"), "Retroexcavadora".to_string())]);

        let report = equipment_performance(&rentals, &payments, &expenses, &january(), None, &names);

        assert_eq!(report.equipment.len(), 2);
        let e1 = &report.equipment[0];
        assert_eq!(e1.equipment_name, "Retroexcavadora");
        assert_eq!(e1.billed_hours, dec!(10));
        assert_eq!(e1.billed_volume, dec!(20));
        assert_eq!(e1.billed_amount.as_decimal(), dec!(2000));
        assert_eq!(e1.price_per_hour, dec!(200));
        assert_eq!(e1.price_per_unit, dec!(100));
        assert_eq!(e1.net_yield.as_decimal(), dec!(1500));
        assert_eq!(e1.margin_pct, dec!(75));
        assert_eq!(e1.modalities, "Horas, Volumen");

        let e2 = &report.equipment[1];
        assert_eq!(e2.equipment_name, "ID:E2");
        assert_eq!(e2.modalities, "Fijo");
        assert_eq!(e2.price_per_hour, Decimal::ZERO);

        assert_eq!(report.summary.billed_amount.as_decimal(), dec!(2500));
        assert_eq!(report.summary.net_yield.as_decimal(), dec!(2000));
        assert_eq!(report.summary.average_margin_pct, dec!(80));
    }

    #[test]
    fn test_equipment_filter_and_empty_row_label() {
        let rentals: Vec<Rental> = parse(json!([
            {"transaccion_id": "r6", "fecha": "2025-01-05", "equipo_id": "E1", "monto": 0},
            {"transaccion_id": "r7", "fecha": "2025-01-05", "equipo_id": "E2", "monto": 300}
        ]));

        let only = EquipmentId::new("E1");
        let report =
            equipment_performance(&rentals, &[], &[], &january(), Some(&only), &HashMap::new());

        assert_eq!(report.equipment.len(), 1);
        assert_eq!(report.equipment[0].modalities, "-");
        assert_eq!(report.equipment[0].margin_pct, Decimal::ZERO);
        assert_eq!(report.summary.average_margin_pct, Decimal::ZERO);
    }
}
