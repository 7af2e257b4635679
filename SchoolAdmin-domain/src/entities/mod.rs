// Resource entities of the SchoolAdmin back office
// Each entity names its backend collection through `ResourceItem`

pub mod resource;

pub mod academics;
pub mod accounts;
pub mod address;
pub mod operations;

// Conversions between wire models and domain types
pub mod conversions;

pub use academics::{AcademicLevel, Faculty, Grade, GradeGroup, Subject, SubjectType};
pub use accounts::{FiscalYear, TaxCategory, Voucher};
pub use address::{AddressNode, Country, District, Municipality, Province};
pub use operations::{EmailConfig, Student, Vehicle};
pub use resource::{ResourceDescriptor, ResourceItem};
