use super::Context;
use crate::cli::commands::DatasetArg;
use crate::cli::output;
use crate::domain::payments::{allocate_general_payment, ClientPayment};
use crate::domain::pricing::NumericField;
use crate::domain::types::{Amount, ClientId};
use crate::error::{BillingError, Result};
use crate::storage::Dataset;
use tracing::info;

pub struct AllocateRequest {
    pub client: String,
    pub amount: String,
    pub fecha: Option<String>,
    pub account: Option<String>,
    pub comment: Option<String>,
    pub write: bool,
}

fn parse_amount(raw: &str) -> Result<Amount> {
    match NumericField::from_value(&serde_json::Value::String(raw.to_string())) {
        NumericField::Number(value) => Ok(Amount::new(value)),
        _ => Err(BillingError::InvalidPayment {
            reason: format!("{:?} no es un monto válido", raw),
        }),
    }
}

pub fn handle_allocate(ctx: &Context, dataset: DatasetArg, request: AllocateRequest) -> Result<()> {
    let mut data = Dataset::load(&dataset.dataset)?;
    let client_id = ClientId::new(request.client);

    let payment = ClientPayment {
        id: Some(uuid::Uuid::new_v4().to_string()),
        client_id: client_id.clone(),
        fecha: request.fecha.unwrap_or_else(equipos_common::dates::today),
        amount: parse_amount(&request.amount)?,
        account_id: request.account,
        comment: request.comment,
    };

    let pending = data.pending_rentals(&client_id);
    let allocation = allocate_general_payment(&pending, &data.invoice_payments, &payment)?;

    if request.write {
        data.apply_allocation(&allocation);
        data.save(&dataset.dataset)?;
        info!(
            "Recorded payment {} for client {} in {}",
            payment.amount,
            client_id,
            dataset.dataset.display()
        );
    }

    if ctx.json {
        return output::json_output(&allocation);
    }
    output::display_allocation(&allocation, &ctx.config.app.currency_symbol);
    Ok(())
}
