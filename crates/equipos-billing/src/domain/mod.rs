pub mod payments;
pub mod pricing;
pub mod records;
pub mod rentals;
pub mod types;

pub use payments::{
    allocate_general_payment, is_fully_paid, ClientPayment, InvoicePayment, PaymentAllocation,
};
pub use pricing::{
    calculate_amount, normalize_modality_fields, AmountCalculation, NumericField,
    PricingWarning, RentalFields,
};
pub use records::{Equipment, Expense, OperatorPayment};
pub use rentals::{
    NewRental, Rental, RentalFilter, RentalManager, RentalOperations, RentalUpdate, SavedRental,
};
pub use types::{Amount, BillingModality, ClientId, DateRange, EquipmentId, OperatorId, RentalId};
