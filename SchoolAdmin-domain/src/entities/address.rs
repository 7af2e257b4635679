use serde::{Deserialize, Serialize};
use validator::Validate;

use super::resource::{resource_item, ResourceItem};

fn default_active() -> bool {
    true
}

/// A node of the country → province → district → municipality hierarchy
pub trait AddressNode: ResourceItem {
    /// Query parameter the backend filters this level's children by
    const CHILD_FILTER: &'static str;

    /// ID of the enclosing node, `None` for countries
    fn parent_id(&self) -> Option<u64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Country {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(max = 3, message = "Code cannot exceed 3 characters"))]
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default = "default_active")]
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Province {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub country_id: u64,

    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[serde(default = "default_active")]
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct District {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub province_id: u64,

    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[serde(default = "default_active")]
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Municipality {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub district_id: u64,

    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    /// Number of wards in the municipality
    #[validate(range(min = 1, max = 50, message = "Wards must be between 1 and 50"))]
    #[serde(default)]
    pub wards: Option<u32>,

    #[serde(default = "default_active")]
    pub status: bool,
}

resource_item!(Country, "countries", "/addresses/countries");
resource_item!(Province, "provinces", "/addresses/provinces");
resource_item!(District, "districts", "/addresses/districts");
resource_item!(Municipality, "municipalities", "/addresses/municipalities");

impl AddressNode for Country {
    const CHILD_FILTER: &'static str = "country_id";

    fn parent_id(&self) -> Option<u64> {
        None
    }
}

impl AddressNode for Province {
    const CHILD_FILTER: &'static str = "province_id";

    fn parent_id(&self) -> Option<u64> {
        Some(self.country_id)
    }
}

impl AddressNode for District {
    const CHILD_FILTER: &'static str = "district_id";

    fn parent_id(&self) -> Option<u64> {
        Some(self.province_id)
    }
}

impl AddressNode for Municipality {
    // Municipalities have no children; the filter is never sent
    const CHILD_FILTER: &'static str = "municipality_id";

    fn parent_id(&self) -> Option<u64> {
        Some(self.district_id)
    }
}
