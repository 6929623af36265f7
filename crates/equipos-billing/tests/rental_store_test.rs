use equipos_billing::config::DatabaseConfig;
use equipos_billing::domain::pricing::NumericField;
use equipos_billing::domain::rentals::{
    NewRental, RentalFilter, RentalManager, RentalOperations, RentalUpdate,
};
use equipos_billing::domain::types::{BillingModality, ClientId, DateRange, RentalId};
use equipos_billing::storage::{self, SqlRentalRepository};
use equipos_billing::BillingError;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

async fn manager() -> RentalManager {
    let pool = storage::connect(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to open in-memory database");
    RentalManager::new(Arc::new(SqlRentalRepository::new(pool)))
}

fn new_rental(value: serde_json::Value) -> NewRental {
    serde_json::from_value(value).expect("Invalid rental payload")
}

#[tokio::test]
async fn test_rental_lifecycle_on_sqlite() {
    let manager = manager().await;

    let saved = manager
        .register_rental(new_rental(json!({
            "transaccion_id": "T-1",
            "fecha": "2025-04-07",
            "equipo_id": "E1",
            "cliente_id": "C1",
            "operador_id": "O1",
            "horas": 5,
            "precio_por_hora": 100
        })))
        .await
        .expect("Failed to register rental");
    assert_eq!(saved.rental.amount.as_decimal(), dec!(500));
    assert!(saved.warnings.is_empty());

    let stored = manager
        .get_rental(&RentalId::new("T-1"))
        .await
        .expect("Failed to get rental");
    assert_eq!(stored.year, Some(2025));
    assert_eq!(stored.month, Some(4));
    assert_eq!(stored.modality(), BillingModality::Hours);
    assert!(!stored.paid);

    // Switching to volume nulls the hourly inputs and keeps the new amount
    let update: RentalUpdate = serde_json::from_value(json!({
        "modalidad_facturacion": "volumen",
        "volumen_generado": 50,
        "precio_por_unidad": 500,
        "unidad_volumen": "m3"
    }))
    .unwrap();
    let edited = manager
        .edit_rental(&RentalId::new("T-1"), update)
        .await
        .expect("Failed to edit rental");
    assert_eq!(edited.rental.amount.as_decimal(), dec!(25000));

    let stored = manager.get_rental(&RentalId::new("T-1")).await.unwrap();
    assert_eq!(stored.modality(), BillingModality::Volume);
    assert_eq!(stored.pricing.volume_unit.as_deref(), Some("m3"));
    assert!(stored
        .pricing
        .hours
        .as_ref()
        .map_or(true, NumericField::is_null));
    assert_eq!(stored.amount.as_decimal(), dec!(25000));

    manager
        .delete_rental(&RentalId::new("T-1"))
        .await
        .expect("Failed to delete rental");
    let err = manager.get_rental(&RentalId::new("T-1")).await.unwrap_err();
    assert!(matches!(err, BillingError::RentalNotFound { .. }));
}

#[tokio::test]
async fn test_partial_edit_falls_back_to_stored_values() {
    let manager = manager().await;
    manager
        .register_rental(new_rental(json!({
            "transaccion_id": "T-2",
            "fecha": "2025-04-01",
            "horas": 5,
            "precio_por_hora": 100
        })))
        .await
        .unwrap();

    let update: RentalUpdate = serde_json::from_value(json!({"horas": 6})).unwrap();
    let edited = manager
        .edit_rental(&RentalId::new("T-2"), update)
        .await
        .unwrap();

    assert_eq!(edited.rental.amount.as_decimal(), dec!(600));
    assert_eq!(edited.rental.pricing.hours_value(), dec!(6));
}

#[tokio::test]
async fn test_unknown_modality_is_saved_as_hours_with_warning() {
    let manager = manager().await;
    let saved = manager
        .register_rental(new_rental(json!({
            "fecha": "2025-04-02",
            "modalidad_facturacion": "otro",
            "horas": 2,
            "precio_por_hora": 50
        })))
        .await
        .unwrap();

    assert_eq!(saved.rental.amount.as_decimal(), dec!(100));
    assert_eq!(saved.warnings.len(), 1);

    let stored = manager.get_rental(&saved.rental.id).await.unwrap();
    assert_eq!(stored.modality(), BillingModality::Hours);
}

#[tokio::test]
async fn test_filters_and_pending_order() {
    let manager = manager().await;
    for (id, fecha, client, paid) in [
        ("A", "2025-03-20", "C1", false),
        ("B", "2025-03-02", "C1", false),
        ("C", "2025-03-10", "C1", true),
        ("D", "2025-02-15", "C2", false),
    ] {
        manager
            .register_rental(new_rental(json!({
                "transaccion_id": id,
                "fecha": fecha,
                "cliente_id": client,
                "monto_fijo": 1000,
                "modalidad_facturacion": "fijo",
                "pagado": paid
            })))
            .await
            .unwrap();
    }

    let pending = manager
        .pending_rentals(&ClientId::new("C1"))
        .await
        .unwrap();
    let ids: Vec<_> = pending.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A"]);

    let march = manager
        .list_rentals(&RentalFilter {
            range: Some(DateRange::new("2025-03-01", "2025-03-31")),
            ..RentalFilter::default()
        })
        .await
        .unwrap();
    let ids: Vec<_> = march.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C", "B"]);
}

#[tokio::test]
async fn test_duplicate_transaccion_id_is_rejected() {
    let manager = manager().await;
    let payload = json!({
        "transaccion_id": "T-dup",
        "fecha": "2025-04-07",
        "cliente_id": "C1",
        "modalidad_facturacion": "fijo",
        "monto_fijo": 300
    });
    manager
        .register_rental(new_rental(payload.clone()))
        .await
        .expect("Failed to register rental");

    let second = manager.register_rental(new_rental(payload)).await;
    assert!(matches!(second, Err(BillingError::DuplicateRental { ref id }) if id == "T-dup"));

    let listed = manager
        .list_rentals(&RentalFilter::default())
        .await
        .expect("Failed to list rentals");
    assert_eq!(listed.len(), 1);
}
