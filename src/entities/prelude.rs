pub use super::administration::Entity as Administration;
pub use super::alert::Entity as Alert;
pub use super::medication::Entity as Medication;
pub use super::patient::Entity as Patient;
pub use super::prescription::Entity as Prescription;
pub use super::user::Entity as User;
