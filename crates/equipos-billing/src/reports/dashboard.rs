use crate::domain::payments::ClientPayment;
use crate::domain::records::{Expense, OperatorPayment};
use crate::domain::rentals::Rental;
use crate::domain::types::{ratio_pct, Amount, ClientId, EquipmentId};
use equipos_common::dates;
use rust_decimal::Decimal;
use serde::Serialize;

/// Records and settings a month's dashboard is computed from.
pub struct DashboardInput<'a> {
    pub rentals: &'a [Rental],
    pub expenses: &'a [Expense],
    pub operator_payments: &'a [OperatorPayment],
    pub client_payments: &'a [ClientPayment],
    pub year: i32,
    pub month: u32,
    pub equipment: Option<&'a EquipmentId>,
    /// Equipment counted as available when no equipment filter is set
    pub active_equipment: usize,
    pub workday_hours: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    #[serde(rename = "ingresos_totales")]
    pub revenue: Amount,
    #[serde(rename = "gastos_totales")]
    pub expenses: Amount,
    #[serde(rename = "pendiente_cobro")]
    pub pending_collection: Amount,
    #[serde(rename = "utilidad_neta")]
    pub net_profit: Amount,
    #[serde(rename = "horas_facturadas")]
    pub billed_hours: Decimal,
    #[serde(rename = "ocupacion_pct")]
    pub occupancy_pct: Decimal,
}

fn in_month(fecha: &str, year: i32, month: u32) -> bool {
    dates::year_month(fecha) == Some((year, month))
}

fn same_equipment(record: Option<&EquipmentId>, filter: Option<&EquipmentId>) -> bool {
    filter.map_or(true, |f| record == Some(f))
}

/// Month KPIs. Client payments are never filtered by equipment.
pub fn dashboard_kpis(input: &DashboardInput<'_>) -> DashboardStats {
    let month_rentals = input.rentals.iter().filter(|r| {
        in_month(&r.fecha, input.year, input.month)
            && same_equipment(r.equipment_id.as_ref(), input.equipment)
    });

    let mut revenue = Amount::zero();
    let mut billed_hours = Decimal::ZERO;
    for rental in month_rentals {
        revenue = revenue.add(rental.amount);
        billed_hours += rental.pricing.hours_value();
    }

    let equipment_expenses: Amount = input
        .expenses
        .iter()
        .filter(|e| {
            in_month(&e.fecha, input.year, input.month)
                && same_equipment(e.equipment_id.as_ref(), input.equipment)
        })
        .map(|e| e.amount)
        .sum();
    let operator_pay: Amount = input
        .operator_payments
        .iter()
        .filter(|p| {
            in_month(&p.fecha, input.year, input.month)
                && same_equipment(p.equipment_id.as_ref(), input.equipment)
        })
        .map(|p| p.amount)
        .sum();
    let collected: Amount = input
        .client_payments
        .iter()
        .filter(|p| in_month(&p.fecha, input.year, input.month))
        .map(|p| p.amount)
        .sum();

    let expenses = equipment_expenses.add(operator_pay);

    let active_equipment = if input.equipment.is_some() {
        1
    } else {
        input.active_equipment
    };
    let days = dates::days_in_month(input.year, input.month).unwrap_or(0);
    let available_hours = Decimal::from(active_equipment as u64)
        * Decimal::from(days)
        * input.workday_hours;

    DashboardStats {
        revenue,
        expenses,
        pending_collection: revenue.subtract(collected),
        net_profit: revenue.subtract(expenses),
        billed_hours,
        occupancy_pct: ratio_pct(billed_hours, available_hours),
    }
}

/// One line of the recent rentals list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentRental {
    pub id: String,
    #[serde(rename = "equipo_id")]
    pub equipment_id: Option<EquipmentId>,
    #[serde(rename = "cliente_id")]
    pub client_id: Option<ClientId>,
    pub fecha: String,
    #[serde(rename = "monto")]
    pub amount: Amount,
    /// `pagado` or `pendiente`
    #[serde(rename = "estado")]
    pub status: &'static str,
}

/// Latest rentals of a month, newest first.
pub fn recent_rentals(
    rentals: &[Rental],
    year: i32,
    month: u32,
    equipment: Option<&EquipmentId>,
    limit: usize,
) -> Vec<RecentRental> {
    let mut matching: Vec<&Rental> = rentals
        .iter()
        .filter(|r| in_month(&r.fecha, year, month))
        .filter(|r| same_equipment(r.equipment_id.as_ref(), equipment))
        .collect();
    matching.sort_by(|a, b| b.fecha.cmp(&a.fecha));

    matching
        .into_iter()
        .take(limit)
        .map(|r| RecentRental {
            id: r.id.to_string(),
            equipment_id: r.equipment_id.clone(),
            client_id: r.client_id.clone(),
            fecha: r.fecha.clone(),
            amount: r.amount,
            status: r.status_label(),
        })
        .collect()
}
