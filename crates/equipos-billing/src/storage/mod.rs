pub mod connection;
pub mod dataset;
pub mod rentals;

pub use connection::{connect, run_migrations};
pub use dataset::Dataset;
pub use rentals::{MemoryRentalRepository, RentalRepository, SqlRentalRepository};
