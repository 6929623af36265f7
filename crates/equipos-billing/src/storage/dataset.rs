//! JSON export of the application's collections, read by the report commands.

use crate::domain::payments::{ClientPayment, InvoicePayment, PaymentAllocation};
use crate::domain::records::{Equipment, Expense, OperatorPayment};
use crate::domain::rentals::Rental;
use crate::domain::types::{ClientId, EquipmentId};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(rename = "alquileres", default)]
    pub rentals: Vec<Rental>,
    #[serde(rename = "gastos", default)]
    pub expenses: Vec<Expense>,
    #[serde(rename = "pagos_operadores", default)]
    pub operator_payments: Vec<OperatorPayment>,
    #[serde(rename = "abonos", default)]
    pub client_payments: Vec<ClientPayment>,
    /// Payments already applied to individual rentals
    #[serde(rename = "pagos_alquiler", default)]
    pub invoice_payments: Vec<InvoicePayment>,
    #[serde(rename = "equipos", default)]
    pub equipment: Vec<Equipment>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let dataset: Dataset = serde_json::from_str(&raw)?;
        info!(
            "Loaded dataset {} ({} alquileres, {} gastos, {} pagos_operadores, {} abonos)",
            path.display(),
            dataset.rentals.len(),
            dataset.expenses.len(),
            dataset.operator_payments.len(),
            dataset.client_payments.len()
        );
        Ok(dataset)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        debug!("Wrote dataset {}", path.display());
        Ok(())
    }

    /// Display names keyed by equipment id.
    pub fn equipment_names(&self) -> HashMap<EquipmentId, String> {
        self.equipment
            .iter()
            .map(|e| (e.id.clone(), e.name.clone()))
            .collect()
    }

    pub fn active_equipment_count(&self) -> usize {
        self.equipment.iter().filter(|e| e.active).count()
    }

    /// Unpaid rentals of a client, oldest first.
    pub fn pending_rentals(&self, client_id: &ClientId) -> Vec<Rental> {
        let mut pending: Vec<Rental> = self
            .rentals
            .iter()
            .filter(|r| !r.paid && r.client_id.as_ref() == Some(client_id))
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.fecha.cmp(&b.fecha));
        pending
    }

    /// Record an allocated client payment: the per-rental payments, the
    /// `pagado` flags they settle and the general `abono` itself.
    pub fn apply_allocation(&mut self, allocation: &PaymentAllocation) {
        let settled: HashSet<_> = allocation.settled_rentals().cloned().collect();
        for rental in self.rentals.iter_mut().filter(|r| settled.contains(&r.id)) {
            rental.paid = true;
        }

        self.invoice_payments
            .extend(allocation.applied.iter().map(|a| a.payment.clone()));
        self.client_payments
            .push(allocation.client_payment.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payments::allocate_general_payment;
    use crate::domain::types::Amount;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::io::Write;

    fn sample() -> Dataset {
        serde_json::from_value(json!({
            "alquileres": [
                {"transaccion_id": "a", "fecha": "2025-01-10", "cliente_id": "C1", "monto": 400},
                {"transaccion_id": "b", "fecha": "2025-01-02", "cliente_id": "C1", "monto": 100},
                {"transaccion_id": "c", "fecha": "2025-01-05", "cliente_id": "C2", "monto": 900}
            ],
            "equipos": [
                {"id": 1, "nombre": "Excavadora"},
                {"id": 2, "nombre": "Camion", "activo": false}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&sample()).unwrap()).unwrap();

        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.rentals.len(), 3);
        assert!(dataset.expenses.is_empty());
        assert_eq!(dataset.active_equipment_count(), 1);
        assert_eq!(
            dataset.equipment_names().get(&EquipmentId::new("1")).map(String::as_str),
            Some("Excavadora")
        );
    }

    #[test]
    fn test_apply_allocation_marks_settled_rentals() {
        let mut dataset = sample();
        let client = ClientId::new("C1");
        let pending = dataset.pending_rentals(&client);
        assert_eq!(pending[0].fecha, "2025-01-02");

        let payment = ClientPayment {
            id: None,
            client_id: client.clone(),
            fecha: "2025-02-01".to_string(),
            amount: Amount::new(dec!(250)),
            account_id: None,
            comment: None,
        };
        let allocation =
            allocate_general_payment(&pending, &dataset.invoice_payments, &payment).unwrap();
        dataset.apply_allocation(&allocation);

        assert_eq!(dataset.pending_rentals(&client).len(), 1);
        assert_eq!(dataset.invoice_payments.len(), 2);
        assert_eq!(dataset.client_payments.len(), 1);
    }
}
