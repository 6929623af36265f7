//! Output formatting for the CLI

use crate::domain::payments::PaymentAllocation;
use crate::domain::pricing::{AmountCalculation, PricingWarning};
use crate::domain::rentals::Rental;
use crate::domain::types::{Amount, BillingModality};
use crate::error::Result;
use crate::reports::{
    AccountStatement, ClientDebt, DashboardStats, OperatorPaymentSummary, PerformanceReport,
    RecentRental,
};
use console::style;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output data as JSON
pub fn json_output<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{json}");
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

pub fn print_warnings(warnings: &[PricingWarning]) {
    for warning in warnings {
        eprintln!("{} {}", style("!").yellow().bold(), warning);
    }
}

/// `RD$ 1,234.50` style amount.
pub fn money(symbol: &str, amount: Amount) -> String {
    format!("{} {}", symbol, group_thousands(amount.rounded()))
}

fn group_thousands(value: Decimal) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

fn number(value: Decimal) -> String {
    value.round_dp(2).normalize().to_string()
}

fn pct(value: Decimal) -> String {
    format!("{:.2}%", value)
}

fn opt<T: std::fmt::Display>(value: Option<&T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

pub fn display_amount(calculation: &AmountCalculation, symbol: &str) {
    println!(
        "{} ({})",
        money(symbol, calculation.amount),
        calculation.modality.label()
    );
    print_warnings(&calculation.warnings);
}

pub fn display_rentals(rentals: &[Rental], symbol: &str) {
    #[derive(Tabled)]
    struct RentalRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Fecha")]
        fecha: String,
        #[tabled(rename = "Equipo")]
        equipment: String,
        #[tabled(rename = "Cliente")]
        client: String,
        #[tabled(rename = "Operador")]
        operator: String,
        #[tabled(rename = "Modalidad")]
        modality: String,
        #[tabled(rename = "Monto")]
        amount: String,
        #[tabled(rename = "Estado")]
        status: String,
    }

    if rentals.is_empty() {
        println!("No hay alquileres.");
        return;
    }

    let rows = rentals
        .iter()
        .map(|r| RentalRow {
            id: r.id.to_string(),
            fecha: r.fecha.clone(),
            equipment: opt(r.equipment_id.as_ref()),
            client: opt(r.client_id.as_ref()),
            operator: opt(r.operator_id.as_ref()),
            modality: r.modality().label().to_string(),
            amount: money(symbol, r.amount),
            status: r.status_label().to_string(),
        })
        .collect();
    print_table::<RentalRow>(rows);

    let total: Amount = rentals.iter().map(|r| r.amount).sum();
    println!("{} alquileres, total {}", rentals.len(), money(symbol, total));
}

pub fn display_rental(rental: &Rental, symbol: &str) {
    let pricing = &rental.pricing;
    println!("{}", style(format!("Alquiler {}", rental.id)).bold());
    println!("  Fecha:      {}", rental.fecha);
    println!("  Equipo:     {}", opt(rental.equipment_id.as_ref()));
    println!("  Cliente:    {}", opt(rental.client_id.as_ref()));
    println!("  Operador:   {}", opt(rental.operator_id.as_ref()));
    println!("  Conduce:    {}", opt(rental.conduce.as_ref()));
    println!("  Ubicación:  {}", opt(rental.location.as_ref()));
    println!("  Modalidad:  {}", rental.modality().label());
    match rental.modality() {
        BillingModality::Hours => {
            println!("  Horas:      {}", number(pricing.hours_value()));
        }
        BillingModality::Volume => {
            println!(
                "  Volumen:    {} {}",
                number(pricing.volume_value()),
                pricing.volume_unit.as_deref().unwrap_or_default()
            );
        }
        BillingModality::Fixed => {}
    }
    println!("  Monto:      {}", money(symbol, rental.amount));
    println!("  Estado:     {}", rental.status_label());
}

pub fn display_performance(report: &PerformanceReport, symbol: &str) {
    #[derive(Tabled)]
    struct BillingRow {
        #[tabled(rename = "Equipo")]
        equipment: String,
        #[tabled(rename = "Horas Fact.")]
        hours: String,
        #[tabled(rename = "Volumen Fact.")]
        volume: String,
        #[tabled(rename = "Monto Fact.")]
        amount: String,
        #[tabled(rename = "Precio/Hora")]
        price_per_hour: String,
        #[tabled(rename = "Precio/Unidad")]
        price_per_unit: String,
        #[tabled(rename = "Modalidades")]
        modalities: String,
    }

    #[derive(Tabled)]
    struct YieldRow {
        #[tabled(rename = "Equipo")]
        equipment: String,
        #[tabled(rename = "Horas Pagadas")]
        hours: String,
        #[tabled(rename = "Pago Operador")]
        operator_pay: String,
        #[tabled(rename = "Gastos")]
        expenses: String,
        #[tabled(rename = "Rendimiento Neto")]
        net: String,
        #[tabled(rename = "Margen")]
        margin: String,
    }

    println!(
        "{}",
        style(format!(
            "Rendimiento {} a {}",
            report.range.start, report.range.end
        ))
        .bold()
    );

    print_table::<BillingRow>(
        report
            .equipment
            .iter()
            .map(|e| BillingRow {
                equipment: e.equipment_name.clone(),
                hours: number(e.billed_hours),
                volume: number(e.billed_volume),
                amount: money(symbol, e.billed_amount),
                price_per_hour: money(symbol, Amount::new(e.price_per_hour)),
                price_per_unit: money(symbol, Amount::new(e.price_per_unit)),
                modalities: e.modalities.clone(),
            })
            .collect(),
    );
    print_table::<YieldRow>(
        report
            .equipment
            .iter()
            .map(|e| YieldRow {
                equipment: e.equipment_name.clone(),
                hours: number(e.operator_hours),
                operator_pay: money(symbol, e.operator_pay),
                expenses: money(symbol, e.expenses),
                net: money(symbol, e.net_yield),
                margin: pct(e.margin_pct),
            })
            .collect(),
    );

    let s = &report.summary;
    println!("Horas facturadas:  {}", number(s.billed_hours));
    println!("Total facturado:   {}", money(symbol, s.billed_amount));
    println!("Pagado operadores: {}", money(symbol, s.operator_pay));
    println!("Gastos:            {}", money(symbol, s.expenses));
    println!("Rendimiento neto:  {}", money(symbol, s.net_yield));
    println!("Margen promedio:   {}", pct(s.average_margin_pct));
}

pub fn display_dashboard(stats: &DashboardStats, recent: &[RecentRental], symbol: &str) {
    #[derive(Tabled)]
    struct RecentRow {
        #[tabled(rename = "Fecha")]
        fecha: String,
        #[tabled(rename = "Equipo")]
        equipment: String,
        #[tabled(rename = "Cliente")]
        client: String,
        #[tabled(rename = "Monto")]
        amount: String,
        #[tabled(rename = "Estado")]
        status: String,
    }

    println!("Ingresos:          {}", money(symbol, stats.revenue));
    println!("Gastos:            {}", money(symbol, stats.expenses));
    println!("Pendiente cobro:   {}", money(symbol, stats.pending_collection));
    println!("Utilidad neta:     {}", money(symbol, stats.net_profit));
    println!("Ocupación:         {}", pct(stats.occupancy_pct));

    if recent.is_empty() {
        return;
    }
    println!();
    print_table::<RecentRow>(
        recent
            .iter()
            .map(|r| RecentRow {
                fecha: r.fecha.clone(),
                equipment: opt(r.equipment_id.as_ref()),
                client: opt(r.client_id.as_ref()),
                amount: money(symbol, r.amount),
                status: r.status.to_string(),
            })
            .collect(),
    );
}

pub fn display_operators(summary: &OperatorPaymentSummary, symbol: &str) {
    #[derive(Tabled)]
    struct OperatorRow {
        #[tabled(rename = "Operador")]
        operator: String,
        #[tabled(rename = "Horas")]
        hours: String,
        #[tabled(rename = "Monto")]
        amount: String,
        #[tabled(rename = "Pagos")]
        count: usize,
    }

    print_table::<OperatorRow>(
        summary
            .operators
            .iter()
            .map(|o| OperatorRow {
                operator: o.operator_id.to_string(),
                hours: number(o.hours),
                amount: money(symbol, o.amount),
                count: o.payment_count,
            })
            .collect(),
    );
    println!(
        "Total: {} horas, {}",
        number(summary.total_hours),
        money(symbol, summary.total_amount)
    );
}

pub fn display_statement(statement: &AccountStatement, symbol: &str) {
    #[derive(Tabled)]
    struct PaymentRow {
        #[tabled(rename = "Fecha")]
        fecha: String,
        #[tabled(rename = "Total Abonado")]
        total: String,
    }

    display_rentals(&statement.invoices, symbol);
    if !statement.payments.is_empty() {
        print_table::<PaymentRow>(
            statement
                .payments
                .iter()
                .map(|p| PaymentRow {
                    fecha: p.fecha.clone(),
                    total: money(symbol, p.total),
                })
                .collect(),
        );
    }
    println!("Total Facturas: {}", money(symbol, statement.total_billed));
    println!("Total Abonos:   {}", money(symbol, statement.total_paid));
    println!("Saldo:          {}", money(symbol, statement.balance));
}

pub fn display_debt(debt: &ClientDebt, symbol: &str) {
    println!("Total facturado: {}", money(symbol, debt.total_billed));
    println!("Total abonado:   {}", money(symbol, debt.total_paid));
    println!("Saldo:           {}", money(symbol, debt.balance));
}

pub fn display_allocation(allocation: &PaymentAllocation, symbol: &str) {
    #[derive(Tabled)]
    struct AppliedRow {
        #[tabled(rename = "Alquiler")]
        rental: String,
        #[tabled(rename = "Aplicado")]
        amount: String,
        #[tabled(rename = "Saldada")]
        settles: String,
    }

    print_table::<AppliedRow>(
        allocation
            .applied
            .iter()
            .map(|a| AppliedRow {
                rental: a.payment.rental_id.to_string(),
                amount: money(symbol, a.payment.amount),
                settles: if a.settles { "sí" } else { "no" }.to_string(),
            })
            .collect(),
    );
    println!(
        "Abono de {} aplicado, restante sin aplicar {}",
        money(symbol, allocation.client_payment.amount),
        money(symbol, allocation.remainder)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money("RD$", Amount::new(dec!(1234567.5))), "RD$ 1,234,567.50");
        assert_eq!(money("RD$", Amount::new(dec!(-950))), "RD$ -950.00");
        assert_eq!(money("RD$", Amount::zero()), "RD$ 0.00");
        assert_eq!(money("US$", Amount::new(dec!(100.005))), "US$ 100.01");
    }
}
