pub mod admins;
pub mod catalog;
pub mod dashboard;
pub mod licenses;
pub mod provisioning;
pub mod settings;

pub use provisioning::{IgnoreReason, PaymentEvent, ProvisionOutcome, Provisioner};
