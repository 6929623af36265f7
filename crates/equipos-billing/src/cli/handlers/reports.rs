use super::{optional_range, Context};
use crate::cli::commands::{DatasetArg, OptionalRange, RequiredRange};
use crate::cli::output;
use crate::domain::types::{ClientId, DateRange, EquipmentId, OperatorId};
use crate::error::Result;
use crate::reports::{self, DashboardInput, StatementFilter};
use crate::storage::Dataset;

pub fn handle_performance(
    ctx: &Context,
    dataset: DatasetArg,
    range: RequiredRange,
    equipment: Option<String>,
) -> Result<()> {
    let data = Dataset::load(&dataset.dataset)?;
    let names = data.equipment_names();
    let equipment = equipment.map(EquipmentId::new);

    let report = reports::equipment_performance(
        &data.rentals,
        &data.operator_payments,
        &data.expenses,
        &DateRange::new(range.from, range.to),
        equipment.as_ref(),
        &names,
    );

    if ctx.json {
        return output::json_output(&report);
    }
    output::display_performance(&report, &ctx.config.app.currency_symbol);
    Ok(())
}

pub fn handle_dashboard(
    ctx: &Context,
    dataset: DatasetArg,
    year: i32,
    month: u32,
    equipment: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let data = Dataset::load(&dataset.dataset)?;
    let equipment = equipment.map(EquipmentId::new);

    let stats = reports::dashboard_kpis(&DashboardInput {
        rentals: &data.rentals,
        expenses: &data.expenses,
        operator_payments: &data.operator_payments,
        client_payments: &data.client_payments,
        year,
        month,
        equipment: equipment.as_ref(),
        active_equipment: data.active_equipment_count(),
        workday_hours: ctx.config.app.workday_hours,
    });
    let recent = reports::recent_rentals(
        &data.rentals,
        year,
        month,
        equipment.as_ref(),
        limit.unwrap_or(ctx.config.app.recent_limit),
    );

    if ctx.json {
        return output::json_output(&serde_json::json!({
            "estadisticas": stats,
            "recientes": recent,
        }));
    }
    output::display_dashboard(&stats, &recent, &ctx.config.app.currency_symbol);
    Ok(())
}

pub fn handle_operators(
    ctx: &Context,
    dataset: DatasetArg,
    range: RequiredRange,
    operator: Option<String>,
    equipment: Option<String>,
) -> Result<()> {
    let data = Dataset::load(&dataset.dataset)?;
    let operator = operator.map(OperatorId::new);
    let equipment = equipment.map(EquipmentId::new);

    let summary = reports::operator_payment_summary(
        &data.operator_payments,
        &DateRange::new(range.from, range.to),
        operator.as_ref(),
        equipment.as_ref(),
    );

    if ctx.json {
        return output::json_output(&summary);
    }
    output::display_operators(&summary, &ctx.config.app.currency_symbol);
    Ok(())
}

pub fn handle_statement(
    ctx: &Context,
    dataset: DatasetArg,
    client: Option<String>,
    range: OptionalRange,
) -> Result<()> {
    let data = Dataset::load(&dataset.dataset)?;
    let filter = StatementFilter {
        client: client.map(ClientId::new),
        range: optional_range(range),
    };

    let statement = reports::account_statement(&data.rentals, &data.client_payments, &filter);

    if ctx.json {
        return output::json_output(&statement);
    }
    output::display_statement(&statement, &ctx.config.app.currency_symbol);
    Ok(())
}

pub fn handle_debt(
    ctx: &Context,
    dataset: DatasetArg,
    client: &str,
    range: OptionalRange,
) -> Result<()> {
    let data = Dataset::load(&dataset.dataset)?;
    let debt = reports::client_debt(
        &data.rentals,
        &data.client_payments,
        &ClientId::new(client),
        optional_range(range).as_ref(),
    );

    if ctx.json {
        return output::json_output(&debt);
    }
    output::display_debt(&debt, &ctx.config.app.currency_symbol);
    Ok(())
}
