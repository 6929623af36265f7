use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Rental not found: {id}")]
    RentalNotFound { id: String },

    #[error("Rental already exists: {id}")]
    DuplicateRental { id: String },

    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    #[error("No pending invoices for client {client}")]
    NoPendingInvoices { client: String },

    #[error("Resource exhausted during {operation}")]
    ResourceExhausted { operation: String },

    #[error("Database error during {operation}: {source}")]
    DatabaseError {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl BillingError {
    /// Maps a storage failure, treating lock contention and pool exhaustion
    /// as quota-style errors that may be retried.
    pub fn from_sqlx(operation: &str, error: sqlx::Error) -> Self {
        let exhausted = match &error {
            sqlx::Error::PoolTimedOut => true,
            sqlx::Error::Database(db) => {
                let message = db.message().to_lowercase();
                // SQLITE_BUSY (5) and SQLITE_LOCKED (6)
                matches!(db.code().as_deref(), Some("5") | Some("6"))
                    || message.contains("database is locked")
                    || message.contains("database is busy")
            }
            _ => false,
        };

        if exhausted {
            BillingError::ResourceExhausted {
                operation: operation.to_string(),
            }
        } else {
            BillingError::DatabaseError {
                operation: operation.to_string(),
                source: Box::new(error),
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::ResourceExhausted { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            BillingError::RentalNotFound { .. } => "RENTAL_NOT_FOUND",
            BillingError::DuplicateRental { .. } => "DUPLICATE_RENTAL",
            BillingError::InvalidPayment { .. } => "INVALID_PAYMENT",
            BillingError::NoPendingInvoices { .. } => "NO_PENDING_INVOICES",
            BillingError::ResourceExhausted { .. } => "RESOURCE_EXHAUSTED",
            BillingError::DatabaseError { .. } => "DATABASE_ERROR",
            BillingError::Configuration { .. } => "CONFIGURATION_ERROR",
            BillingError::Serialization(_) => "SERIALIZATION_ERROR",
            BillingError::Io(_) => "IO_ERROR",
            BillingError::Migration(_) => "MIGRATION_ERROR",
        }
    }

    /// Message shown to the person operating the application.
    pub fn user_message(&self) -> String {
        match self {
            BillingError::RentalNotFound { id } => {
                format!("No se encontró el alquiler {}.", id)
            }
            BillingError::DuplicateRental { id } => {
                format!("Ya existe un alquiler con el ID {}.", id)
            }
            BillingError::InvalidPayment { reason } => {
                format!("El abono no es válido: {}.", reason)
            }
            BillingError::NoPendingInvoices { client } => {
                format!("El cliente {} no tiene facturas pendientes.", client)
            }
            BillingError::ResourceExhausted { .. } => {
                "Se alcanzó el límite de uso de la base de datos. Intente de nuevo en unos minutos."
                    .to_string()
            }
            BillingError::DatabaseError { operation, .. } => {
                format!("Error de base de datos al ejecutar '{}'.", operation)
            }
            BillingError::Configuration { message } => {
                format!("Configuración inválida: {}", message)
            }
            BillingError::Serialization(e) => format!("Datos con formato inválido: {}", e),
            BillingError::Io(e) => format!("Error de lectura/escritura: {}", e),
            BillingError::Migration(_) => {
                "No se pudo preparar el esquema de la base de datos.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exhaustion_is_retryable() {
        let exhausted = BillingError::ResourceExhausted {
            operation: "list_rentals".to_string(),
        };
        let missing = BillingError::RentalNotFound {
            id: "abc".to_string(),
        };

        assert!(exhausted.is_retryable());
        assert!(!missing.is_retryable());
        assert_eq!(exhausted.error_code(), "RESOURCE_EXHAUSTED");
    }

    #[test]
    fn test_pool_timeout_maps_to_exhaustion() {
        let err = BillingError::from_sqlx("get_rental", sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());

        let err = BillingError::from_sqlx("get_rental", sqlx::Error::RowNotFound);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_user_messages_are_localised() {
        let err = BillingError::NoPendingInvoices {
            client: "C-7".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "El cliente C-7 no tiene facturas pendientes."
        );
    }
}
