use super::{optional_range, read_payload, Context};
use crate::cli::commands::ListFilters;
use crate::cli::output;
use crate::domain::pricing::{calculate_amount, RentalFields};
use crate::domain::rentals::{
    NewRental, RentalFilter, RentalManager, RentalOperations, RentalUpdate, SavedRental,
};
use crate::domain::types::{ClientId, EquipmentId, OperatorId, RentalId};
use crate::error::Result;
use crate::storage::{self, SqlRentalRepository};
use std::sync::Arc;
use tracing::debug;

async fn rental_manager(ctx: &Context) -> Result<RentalManager> {
    let pool = storage::connect(&ctx.config.database).await?;
    debug!("Connected to {}", ctx.config.database.url);
    Ok(RentalManager::with_retry(
        Arc::new(SqlRentalRepository::new(pool)),
        ctx.config.retry.to_retry_config(),
    ))
}

fn report_saved(ctx: &Context, saved: &SavedRental, verb: &str) -> Result<()> {
    if ctx.json {
        return output::json_output(&saved.rental);
    }
    output::print_success(&format!(
        "Alquiler {} {} ({})",
        saved.rental.id,
        verb,
        output::money(&ctx.config.app.currency_symbol, saved.rental.amount)
    ));
    output::print_warnings(&saved.warnings);
    Ok(())
}

pub fn handle_amount(ctx: &Context, payload: &str, original: Option<&str>) -> Result<()> {
    let mut proposed: RentalFields = serde_json::from_value(read_payload(payload)?)?;
    let original: Option<RentalFields> = original
        .map(|raw| -> Result<RentalFields> { Ok(serde_json::from_value(read_payload(raw)?)?) })
        .transpose()?;

    let calculation = calculate_amount(&mut proposed, original.as_ref());
    if ctx.json {
        return output::json_output(&calculation);
    }
    output::display_amount(&calculation, &ctx.config.app.currency_symbol);
    Ok(())
}

pub async fn handle_register(ctx: &Context, payload: &str) -> Result<()> {
    let new_rental: NewRental = serde_json::from_value(read_payload(payload)?)?;
    let saved = rental_manager(ctx).await?.register_rental(new_rental).await?;
    report_saved(ctx, &saved, "registrado")
}

pub async fn handle_edit(ctx: &Context, id: &str, payload: &str) -> Result<()> {
    let update: RentalUpdate = serde_json::from_value(read_payload(payload)?)?;
    let saved = rental_manager(ctx)
        .await?
        .edit_rental(&RentalId::new(id), update)
        .await?;
    report_saved(ctx, &saved, "actualizado")
}

pub async fn handle_delete(ctx: &Context, id: &str) -> Result<()> {
    let id = RentalId::new(id);
    rental_manager(ctx).await?.delete_rental(&id).await?;
    if ctx.json {
        return output::json_output(&serde_json::json!({ "eliminado": id }));
    }
    output::print_success(&format!("Alquiler {} eliminado", id));
    Ok(())
}

pub async fn handle_show(ctx: &Context, id: &str) -> Result<()> {
    let rental = rental_manager(ctx)
        .await?
        .get_rental(&RentalId::new(id))
        .await?;
    if ctx.json {
        return output::json_output(&rental);
    }
    output::display_rental(&rental, &ctx.config.app.currency_symbol);
    Ok(())
}

pub async fn handle_list(ctx: &Context, filters: ListFilters) -> Result<()> {
    let paid = match (filters.paid, filters.pending) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let filter = RentalFilter {
        range: optional_range(filters.range),
        equipment_id: filters.equipment.map(EquipmentId::new),
        client_id: filters.client.map(ClientId::new),
        operator_id: filters.operator.map(OperatorId::new),
        paid,
    };

    let rentals = rental_manager(ctx).await?.list_rentals(&filter).await?;
    if ctx.json {
        return output::json_output(&rentals);
    }
    output::display_rentals(&rentals, &ctx.config.app.currency_symbol);
    Ok(())
}

pub async fn handle_pending(ctx: &Context, client: &str) -> Result<()> {
    let rentals = rental_manager(ctx)
        .await?
        .pending_rentals(&ClientId::new(client))
        .await?;
    if ctx.json {
        return output::json_output(&rentals);
    }
    output::display_rentals(&rentals, &ctx.config.app.currency_symbol);
    Ok(())
}
