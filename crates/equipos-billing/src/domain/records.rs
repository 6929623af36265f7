//! Records that feed the reports but have no lifecycle of their own here.

use crate::domain::types::{lenient, Amount, EquipmentId, OperatorId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Equipment expense (`gasto`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub fecha: String,
    #[serde(rename = "equipo_id", default)]
    pub equipment_id: Option<EquipmentId>,
    #[serde(rename = "monto", default, deserialize_with = "lenient::amount")]
    pub amount: Amount,
    #[serde(rename = "descripcion", default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
}

/// Payment made to an operator for hours worked on a piece of equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorPayment {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub fecha: String,
    #[serde(rename = "operador_id", default)]
    pub operator_id: Option<OperatorId>,
    #[serde(rename = "equipo_id", default)]
    pub equipment_id: Option<EquipmentId>,
    #[serde(rename = "horas", default, deserialize_with = "lenient::decimal")]
    pub hours: Decimal,
    #[serde(rename = "monto", default, deserialize_with = "lenient::amount")]
    pub amount: Amount,
    #[serde(rename = "descripcion", default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "placa", default, deserialize_with = "lenient::text")]
    pub plate: Option<String>,
    #[serde(rename = "activo", default = "active_by_default", deserialize_with = "lenient::flag")]
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_operator_payment_tolerates_legacy_values() {
        let payment: OperatorPayment = serde_json::from_value(json!({
            "fecha": "2025-01-03",
            "operador_id": 12,
            "equipo_id": "7",
            "horas": "9.5",
            "monto": null
        }))
        .unwrap();

        assert_eq!(payment.hours, dec!(9.5));
        assert!(payment.amount.is_zero());
        assert_eq!(payment.operator_id, Some(OperatorId::new("12")));
    }

    #[test]
    fn test_equipment_active_flag() {
        let listed: Equipment = serde_json::from_value(json!({"id": 1, "nombre": "Retro"})).unwrap();
        let retired: Equipment =
            serde_json::from_value(json!({"id": 2, "nombre": "Pala", "activo": 0})).unwrap();

        assert!(listed.active);
        assert!(!retired.active);
    }
}
