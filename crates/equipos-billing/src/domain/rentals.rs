use crate::domain::pricing::{
    calculate_amount, normalize_modality_fields, PricingWarning, RentalFields,
};
use crate::domain::types::{
    lenient, Amount, BillingModality, ClientId, DateRange, EquipmentId, OperatorId, RentalId,
};
use crate::error::{BillingError, Result};
use crate::storage::RentalRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use equipos_common::dates;
use equipos_common::RetryConfig;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// A stored rental (`alquiler`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Rental {
    #[serde(rename = "transaccion_id")]
    pub id: RentalId,
    #[serde(default)]
    pub fecha: String,
    #[serde(rename = "ano", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "mes", default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(rename = "equipo_id", default)]
    pub equipment_id: Option<EquipmentId>,
    #[serde(rename = "cliente_id", default)]
    pub client_id: Option<ClientId>,
    #[serde(rename = "operador_id", default)]
    pub operator_id: Option<OperatorId>,
    /// Delivery note number
    #[serde(default, deserialize_with = "lenient::text")]
    pub conduce: Option<String>,
    #[serde(rename = "ubicacion", default, deserialize_with = "lenient::text")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub pricing: RentalFields,
    #[serde(rename = "monto", default, deserialize_with = "lenient::amount")]
    pub amount: Amount,
    #[serde(rename = "pagado", default, deserialize_with = "lenient::flag")]
    pub paid: bool,
    #[serde(
        rename = "fecha_creacion",
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "fecha_modificacion",
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Serialize for Rental {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Rental::serialize(self, serializer)
    }
}

/// Exported documents carry the store's document `id`, `transaccion_id`, or
/// both with the same value. `transaccion_id` wins; a record with neither is
/// rejected.
impl<'de> Deserialize<'de> for Rental {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut document = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        let document_id = document.remove("id").filter(|v| !v.is_null());

        if document.get("transaccion_id").map_or(true, Value::is_null) {
            let id = document_id.ok_or_else(|| de::Error::missing_field("transaccion_id"))?;
            document.insert("transaccion_id".to_string(), id);
        }

        Rental::deserialize(Value::Object(document)).map_err(de::Error::custom)
    }
}

impl Rental {
    pub fn modality(&self) -> BillingModality {
        self.pricing.modality()
    }

    /// `pagado` / `pendiente`, as shown in listings.
    pub fn status_label(&self) -> &'static str {
        if self.paid {
            "pagado"
        } else {
            "pendiente"
        }
    }

    fn set_fecha(&mut self, fecha: String) {
        let derived = dates::year_month(&fecha);
        self.year = derived.map(|(y, _)| y);
        self.month = derived.map(|(_, m)| m);
        self.fecha = fecha;
    }
}

/// Payload for registering a rental.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRental {
    #[serde(rename = "transaccion_id", default)]
    pub id: Option<RentalId>,
    #[serde(default)]
    pub fecha: String,
    #[serde(rename = "equipo_id", default)]
    pub equipment_id: Option<EquipmentId>,
    #[serde(rename = "cliente_id", default)]
    pub client_id: Option<ClientId>,
    #[serde(rename = "operador_id", default)]
    pub operator_id: Option<OperatorId>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub conduce: Option<String>,
    #[serde(rename = "ubicacion", default, deserialize_with = "lenient::text")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub pricing: RentalFields,
    #[serde(rename = "pagado", default)]
    pub paid: Option<bool>,
}

/// Partial edit of a stored rental; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RentalUpdate {
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(rename = "equipo_id", default)]
    pub equipment_id: Option<EquipmentId>,
    #[serde(rename = "cliente_id", default)]
    pub client_id: Option<ClientId>,
    #[serde(rename = "operador_id", default)]
    pub operator_id: Option<OperatorId>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub conduce: Option<String>,
    #[serde(rename = "ubicacion", default, deserialize_with = "lenient::text")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub pricing: RentalFields,
    #[serde(rename = "pagado", default)]
    pub paid: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RentalFilter {
    pub range: Option<DateRange>,
    pub equipment_id: Option<EquipmentId>,
    pub client_id: Option<ClientId>,
    pub operator_id: Option<OperatorId>,
    pub paid: Option<bool>,
}

impl RentalFilter {
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, rental: &Rental) -> bool {
        if let Some(range) = &self.range {
            if !range.contains(&rental.fecha) {
                return false;
            }
        }
        if self.equipment_id.is_some() && rental.equipment_id != self.equipment_id {
            return false;
        }
        if self.client_id.is_some() && rental.client_id != self.client_id {
            return false;
        }
        if self.operator_id.is_some() && rental.operator_id != self.operator_id {
            return false;
        }
        self.paid.map_or(true, |paid| rental.paid == paid)
    }
}

/// A saved rental together with any degraded pricing input noticed on save
#[derive(Debug, Clone)]
pub struct SavedRental {
    pub rental: Rental,
    pub warnings: Vec<PricingWarning>,
}

/// Rental lifecycle operations
#[async_trait]
pub trait RentalOperations: Send + Sync {
    async fn register_rental(&self, new_rental: NewRental) -> Result<SavedRental>;

    async fn edit_rental(&self, id: &RentalId, update: RentalUpdate) -> Result<SavedRental>;

    async fn delete_rental(&self, id: &RentalId) -> Result<()>;

    async fn get_rental(&self, id: &RentalId) -> Result<Rental>;

    async fn list_rentals(&self, filter: &RentalFilter) -> Result<Vec<Rental>>;

    /// Unpaid rentals of a client, oldest first.
    async fn pending_rentals(&self, client_id: &ClientId) -> Result<Vec<Rental>>;
}

pub struct RentalManager {
    repository: Arc<dyn RentalRepository>,
    retry: RetryConfig,
}

impl RentalManager {
    pub fn new(repository: Arc<dyn RentalRepository>) -> Self {
        Self::with_retry(repository, RetryConfig::default())
    }

    pub fn with_retry(repository: Arc<dyn RentalRepository>, retry: RetryConfig) -> Self {
        Self { repository, retry }
    }

    async fn load(&self, id: &RentalId) -> Result<Rental> {
        let repository = self.repository.clone();
        equipos_common::retry_with_backoff(
            &self.retry,
            "get_rental",
            BillingError::is_retryable,
            || {
                let repository = repository.clone();
                async move { repository.get_rental(id).await }
            },
        )
        .await?
        .ok_or_else(|| BillingError::RentalNotFound { id: id.to_string() })
    }
}

#[async_trait]
impl RentalOperations for RentalManager {
    async fn register_rental(&self, new_rental: NewRental) -> Result<SavedRental> {
        let mut pricing = new_rental.pricing;
        let calculation = calculate_amount(&mut pricing, None);
        normalize_modality_fields(&mut pricing, calculation.modality);

        let now = Utc::now();
        let mut rental = Rental {
            id: new_rental.id.unwrap_or_else(RentalId::generate),
            fecha: String::new(),
            year: None,
            month: None,
            equipment_id: new_rental.equipment_id,
            client_id: new_rental.client_id,
            operator_id: new_rental.operator_id,
            conduce: new_rental.conduce,
            location: new_rental.location,
            pricing,
            amount: calculation.amount,
            paid: new_rental.paid.unwrap_or(false),
            created_at: Some(now),
            updated_at: Some(now),
        };
        rental.set_fecha(new_rental.fecha);

        self.repository.create_rental(&rental).await?;
        info!(
            "Registered rental {} ({}, monto {})",
            rental.id, calculation.modality, rental.amount
        );

        Ok(SavedRental {
            rental,
            warnings: calculation.warnings,
        })
    }

    async fn edit_rental(&self, id: &RentalId, update: RentalUpdate) -> Result<SavedRental> {
        let original = self.load(id).await?;

        let mut proposed = update.pricing;
        let calculation = calculate_amount(&mut proposed, Some(&original.pricing));
        let mut pricing = original.pricing.overlay(&proposed);
        normalize_modality_fields(&mut pricing, calculation.modality);

        let mut rental = original;
        if let Some(fecha) = update.fecha {
            rental.set_fecha(fecha);
        }
        if update.equipment_id.is_some() {
            rental.equipment_id = update.equipment_id;
        }
        if update.client_id.is_some() {
            rental.client_id = update.client_id;
        }
        if update.operator_id.is_some() {
            rental.operator_id = update.operator_id;
        }
        if update.conduce.is_some() {
            rental.conduce = update.conduce;
        }
        if update.location.is_some() {
            rental.location = update.location;
        }
        if let Some(paid) = update.paid {
            rental.paid = paid;
        }
        rental.pricing = pricing;
        rental.amount = calculation.amount;
        rental.updated_at = Some(Utc::now());

        self.repository.update_rental(&rental).await?;
        info!(
            "Updated rental {} ({}, monto {})",
            rental.id, calculation.modality, rental.amount
        );

        Ok(SavedRental {
            rental,
            warnings: calculation.warnings,
        })
    }

    async fn delete_rental(&self, id: &RentalId) -> Result<()> {
        if !self.repository.delete_rental(id).await? {
            return Err(BillingError::RentalNotFound { id: id.to_string() });
        }
        info!("Deleted rental {}", id);
        Ok(())
    }

    async fn get_rental(&self, id: &RentalId) -> Result<Rental> {
        self.load(id).await
    }

    async fn list_rentals(&self, filter: &RentalFilter) -> Result<Vec<Rental>> {
        let repository = self.repository.clone();
        let rentals = equipos_common::retry_with_backoff(
            &self.retry,
            "list_rentals",
            BillingError::is_retryable,
            || {
                let repository = repository.clone();
                async move { repository.list_rentals(filter).await }
            },
        )
        .await?;
        debug!("Listed {} rentals", rentals.len());
        Ok(rentals)
    }

    async fn pending_rentals(&self, client_id: &ClientId) -> Result<Vec<Rental>> {
        let filter = RentalFilter {
            paid: Some(false),
            ..RentalFilter::for_client(client_id.clone())
        };
        let mut rentals = self.list_rentals(&filter).await?;
        rentals.sort_by(|a, b| a.fecha.cmp(&b.fecha));
        Ok(rentals)
    }
}
