use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::resource::resource_item;

fn default_active() -> bool {
    true
}

/// School transport vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Vehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 30, message = "Vehicle number is required and cannot exceed 30 characters"))]
    pub vehicle_number: String,

    #[validate(length(max = 100, message = "Model cannot exceed 100 characters"))]
    #[serde(default)]
    pub model: Option<String>,

    #[validate(range(min = 1, max = 200, message = "Capacity must be between 1 and 200"))]
    pub capacity: u32,

    #[serde(default)]
    pub driver_name: Option<String>,

    #[serde(default = "default_active")]
    pub status: bool,
}

/// Outgoing mail server configuration
///
/// `is_default` marks the configuration used for notifications and is the
/// status toggled by the change-status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmailConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(email(message = "Sender address must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "Host is required"))]
    pub host: String,

    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u32,

    #[serde(default)]
    pub username: Option<String>,

    /// `tls`, `ssl` or none
    #[serde(default)]
    pub encryption: Option<String>,

    #[serde(default)]
    pub is_default: bool,
}

/// Enrolled student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Student {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Email must be valid"))]
    #[serde(default)]
    pub email: Option<String>,

    #[validate(length(max = 20, message = "Phone cannot exceed 20 characters"))]
    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub grade_id: Option<u64>,

    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default = "default_active")]
    pub status: bool,
}

resource_item!(Vehicle, "vehicles", "/transportation/vehicles");
resource_item!(EmailConfig, "emails", "/settings/emails");
resource_item!(Student, "students", "/students");
