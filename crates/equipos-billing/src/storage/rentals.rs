use crate::domain::pricing::{NumericField, RentalFields};
use crate::domain::rentals::{Rental, RentalFilter};
use crate::domain::types::{Amount, ClientId, EquipmentId, OperatorId, RentalId};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;

#[async_trait]
pub trait RentalRepository: Send + Sync {
    async fn create_rental(&self, rental: &Rental) -> Result<()>;
    async fn get_rental(&self, id: &RentalId) -> Result<Option<Rental>>;
    async fn update_rental(&self, rental: &Rental) -> Result<()>;
    /// Returns false when no rental had that id.
    async fn delete_rental(&self, id: &RentalId) -> Result<bool>;
    /// Matching rentals ordered by fecha, newest first.
    async fn list_rentals(&self, filter: &RentalFilter) -> Result<Vec<Rental>>;
}

fn sort_newest_first(rentals: &mut [Rental]) {
    rentals.sort_by(|a, b| b.fecha.cmp(&a.fecha).then_with(|| a.id.cmp(&b.id)));
}

/// Process-local repository, used for dry runs and tests.
#[derive(Default)]
pub struct MemoryRentalRepository {
    rentals: RwLock<HashMap<RentalId, Rental>>,
}

impl MemoryRentalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rentals(rentals: impl IntoIterator<Item = Rental>) -> Self {
        Self {
            rentals: RwLock::new(rentals.into_iter().map(|r| (r.id.clone(), r)).collect()),
        }
    }
}

#[async_trait]
impl RentalRepository for MemoryRentalRepository {
    async fn create_rental(&self, rental: &Rental) -> Result<()> {
        let mut rentals = self.rentals.write().await;
        if rentals.contains_key(&rental.id) {
            return Err(BillingError::DuplicateRental {
                id: rental.id.to_string(),
            });
        }
        rentals.insert(rental.id.clone(), rental.clone());
        Ok(())
    }

    async fn get_rental(&self, id: &RentalId) -> Result<Option<Rental>> {
        Ok(self.rentals.read().await.get(id).cloned())
    }

    async fn update_rental(&self, rental: &Rental) -> Result<()> {
        let mut rentals = self.rentals.write().await;
        let stored = rentals
            .get_mut(&rental.id)
            .ok_or_else(|| BillingError::RentalNotFound {
                id: rental.id.to_string(),
            })?;
        *stored = rental.clone();
        Ok(())
    }

    async fn delete_rental(&self, id: &RentalId) -> Result<bool> {
        Ok(self.rentals.write().await.remove(id).is_some())
    }

    async fn list_rentals(&self, filter: &RentalFilter) -> Result<Vec<Rental>> {
        let rentals = self.rentals.read().await;
        let mut matching: Vec<Rental> = rentals
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_newest_first(&mut matching);
        Ok(matching)
    }
}

pub struct SqlRentalRepository {
    pool: SqlitePool,
}

impl SqlRentalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn numeric_to_db(field: &Option<NumericField>) -> Option<String> {
        match field {
            Some(NumericField::Number(d)) => Some(d.to_string()),
            Some(NumericField::Invalid(raw)) => Some(raw.clone()),
            Some(NumericField::Null) | None => None,
        }
    }

    fn numeric_from_db(value: Option<String>) -> Option<NumericField> {
        Some(match value {
            Some(raw) => NumericField::from_value(&serde_json::Value::String(raw)),
            None => NumericField::Null,
        })
    }

    fn rental_from_row(row: &SqliteRow) -> Result<Rental> {
        let get_err = |e: sqlx::Error| BillingError::from_sqlx("decode_rental", e);

        let monto: String = row.try_get("monto").map_err(get_err)?;
        let amount = Decimal::from_str(&monto).map_err(|e| BillingError::DatabaseError {
            operation: "decode_rental".to_string(),
            source: Box::new(e),
        })?;

        Ok(Rental {
            id: RentalId::new(row.try_get::<String, _>("transaccion_id").map_err(get_err)?),
            fecha: row.try_get("fecha").map_err(get_err)?,
            year: row.try_get("ano").map_err(get_err)?,
            month: row
                .try_get::<Option<i64>, _>("mes")
                .map_err(get_err)?
                .map(|m| m as u32),
            equipment_id: row
                .try_get::<Option<String>, _>("equipo_id")
                .map_err(get_err)?
                .map(EquipmentId::new),
            client_id: row
                .try_get::<Option<String>, _>("cliente_id")
                .map_err(get_err)?
                .map(ClientId::new),
            operator_id: row
                .try_get::<Option<String>, _>("operador_id")
                .map_err(get_err)?
                .map(OperatorId::new),
            conduce: row.try_get("conduce").map_err(get_err)?,
            location: row.try_get("ubicacion").map_err(get_err)?,
            pricing: RentalFields {
                modality: row.try_get("modalidad_facturacion").map_err(get_err)?,
                hours: Self::numeric_from_db(row.try_get("horas").map_err(get_err)?),
                price_per_hour: Self::numeric_from_db(
                    row.try_get("precio_por_hora").map_err(get_err)?,
                ),
                volume: Self::numeric_from_db(row.try_get("volumen_generado").map_err(get_err)?),
                price_per_unit: Self::numeric_from_db(
                    row.try_get("precio_por_unidad").map_err(get_err)?,
                ),
                volume_unit: row.try_get("unidad_volumen").map_err(get_err)?,
                fixed_amount: Self::numeric_from_db(row.try_get("monto_fijo").map_err(get_err)?),
            },
            amount: Amount::new(amount),
            paid: row.try_get("pagado").map_err(get_err)?,
            created_at: row
                .try_get::<Option<DateTime<Utc>>, _>("fecha_creacion")
                .map_err(get_err)?,
            updated_at: row
                .try_get::<Option<DateTime<Utc>>, _>("fecha_modificacion")
                .map_err(get_err)?,
        })
    }

    fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, has_where: &mut bool) {
        builder.push(if *has_where { " AND " } else { " WHERE " });
        *has_where = true;
    }
}

#[async_trait]
impl RentalRepository for SqlRentalRepository {
    async fn create_rental(&self, rental: &Rental) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO alquileres
            (transaccion_id, fecha, ano, mes, equipo_id, cliente_id, operador_id, conduce,
             ubicacion, modalidad_facturacion, horas, precio_por_hora, volumen_generado,
             precio_por_unidad, unidad_volumen, monto_fijo, monto, pagado, fecha_creacion,
             fecha_modificacion)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(rental.id.as_str())
        .bind(&rental.fecha)
        .bind(rental.year)
        .bind(rental.month.map(i64::from))
        .bind(rental.equipment_id.as_ref().map(EquipmentId::as_str))
        .bind(rental.client_id.as_ref().map(ClientId::as_str))
        .bind(rental.operator_id.as_ref().map(OperatorId::as_str))
        .bind(&rental.conduce)
        .bind(&rental.location)
        .bind(&rental.pricing.modality)
        .bind(Self::numeric_to_db(&rental.pricing.hours))
        .bind(Self::numeric_to_db(&rental.pricing.price_per_hour))
        .bind(Self::numeric_to_db(&rental.pricing.volume))
        .bind(Self::numeric_to_db(&rental.pricing.price_per_unit))
        .bind(&rental.pricing.volume_unit)
        .bind(Self::numeric_to_db(&rental.pricing.fixed_amount))
        .bind(rental.amount.as_decimal().to_string())
        .bind(rental.paid)
        .bind(rental.created_at)
        .bind(rental.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return BillingError::DuplicateRental {
                        id: rental.id.to_string(),
                    };
                }
            }
            BillingError::from_sqlx("create_rental", e)
        })?;

        Ok(())
    }

    async fn get_rental(&self, id: &RentalId) -> Result<Option<Rental>> {
        let row = sqlx::query("SELECT * FROM alquileres WHERE transaccion_id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BillingError::from_sqlx("get_rental", e))?;

        row.as_ref().map(Self::rental_from_row).transpose()
    }

    async fn update_rental(&self, rental: &Rental) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE alquileres SET
                fecha = ?, ano = ?, mes = ?, equipo_id = ?, cliente_id = ?, operador_id = ?,
                conduce = ?, ubicacion = ?, modalidad_facturacion = ?, horas = ?,
                precio_por_hora = ?, volumen_generado = ?, precio_por_unidad = ?,
                unidad_volumen = ?, monto_fijo = ?, monto = ?, pagado = ?,
                fecha_modificacion = ?
            WHERE transaccion_id = ?
            "#,
        )
        .bind(&rental.fecha)
        .bind(rental.year)
        .bind(rental.month.map(i64::from))
        .bind(rental.equipment_id.as_ref().map(EquipmentId::as_str))
        .bind(rental.client_id.as_ref().map(ClientId::as_str))
        .bind(rental.operator_id.as_ref().map(OperatorId::as_str))
        .bind(&rental.conduce)
        .bind(&rental.location)
        .bind(&rental.pricing.modality)
        .bind(Self::numeric_to_db(&rental.pricing.hours))
        .bind(Self::numeric_to_db(&rental.pricing.price_per_hour))
        .bind(Self::numeric_to_db(&rental.pricing.volume))
        .bind(Self::numeric_to_db(&rental.pricing.price_per_unit))
        .bind(&rental.pricing.volume_unit)
        .bind(Self::numeric_to_db(&rental.pricing.fixed_amount))
        .bind(rental.amount.as_decimal().to_string())
        .bind(rental.paid)
        .bind(rental.updated_at)
        .bind(rental.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::from_sqlx("update_rental", e))?;

        if result.rows_affected() == 0 {
            return Err(BillingError::RentalNotFound {
                id: rental.id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_rental(&self, id: &RentalId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM alquileres WHERE transaccion_id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| BillingError::from_sqlx("delete_rental", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_rentals(&self, filter: &RentalFilter) -> Result<Vec<Rental>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM alquileres");
        let mut has_where = false;

        if let Some(range) = &filter.range {
            Self::push_where(&mut builder, &mut has_where);
            builder.push("fecha >= ");
            builder.push_bind(range.start.clone());
            builder.push(" AND fecha <= ");
            builder.push_bind(range.end.clone());
            builder.push(" AND fecha != ''");
        }
        if let Some(equipment_id) = &filter.equipment_id {
            Self::push_where(&mut builder, &mut has_where);
            builder.push("equipo_id = ");
            builder.push_bind(equipment_id.as_str().to_string());
        }
        if let Some(client_id) = &filter.client_id {
            Self::push_where(&mut builder, &mut has_where);
            builder.push("cliente_id = ");
            builder.push_bind(client_id.as_str().to_string());
        }
        if let Some(operator_id) = &filter.operator_id {
            Self::push_where(&mut builder, &mut has_where);
            builder.push("operador_id = ");
            builder.push_bind(operator_id.as_str().to_string());
        }
        if let Some(paid) = filter.paid {
            Self::push_where(&mut builder, &mut has_where);
            builder.push("pagado = ");
            builder.push_bind(paid);
        }
        builder.push(" ORDER BY fecha DESC, transaccion_id ASC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BillingError::from_sqlx("list_rentals", e))?;

        rows.iter().map(Self::rental_from_row).collect()
    }
}
