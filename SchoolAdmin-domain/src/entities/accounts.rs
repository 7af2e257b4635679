use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::resource::resource_item;

fn default_active() -> bool {
    true
}

/// Accounting fiscal year
///
/// Exactly one fiscal year is the default at a time; its `is_default` flag is
/// the status toggled by the change-status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_fiscal_year_dates"))]
pub struct FiscalYear {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 50, message = "Name is required and cannot exceed 50 characters"))]
    pub name: String,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    #[serde(default)]
    pub is_default: bool,
}

fn validate_fiscal_year_dates(year: &FiscalYear) -> Result<(), ValidationError> {
    if year.start_date >= year.end_date {
        let mut error = ValidationError::new("date_range");
        error.message = Some("Start date must be before end date".into());
        return Err(error);
    }
    Ok(())
}

/// Tax category applied to fee and voucher lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TaxCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 100, message = "Name is required and cannot exceed 100 characters"))]
    pub name: String,

    /// Percentage rate
    #[validate(range(min = 0.0, max = 100.0, message = "Rate must be between 0 and 100"))]
    pub rate: f64,

    #[serde(default = "default_active")]
    pub status: bool,
}

/// Accounting voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Voucher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Assigned by the backend when the voucher is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_number: Option<String>,

    pub fiscal_year_id: u64,

    pub voucher_date: NaiveDate,

    #[validate(range(min = 0.0, message = "Amount cannot be negative"))]
    pub amount: f64,

    #[validate(length(max = 500, message = "Narration cannot exceed 500 characters"))]
    #[serde(default)]
    pub narration: Option<String>,

    #[serde(default = "default_active")]
    pub status: bool,
}

resource_item!(FiscalYear, "fiscal years", "/accounts/masters/fiscal-years");
resource_item!(TaxCategory, "tax categories", "/accounts/masters/tax-categories");
resource_item!(Voucher, "vouchers", "/accounts/vouchers");

#[cfg(test)]
mod tests {
    use super::*;

    fn fiscal_year(start: (i32, u32, u32), end: (i32, u32, u32)) -> FiscalYear {
        FiscalYear {
            id: None,
            name: "2024/25".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            is_default: false,
        }
    }

    #[test]
    fn test_fiscal_year_date_order() {
        assert!(fiscal_year((2024, 7, 16), (2025, 7, 15)).validate().is_ok());

        let errors = fiscal_year((2025, 7, 15), (2024, 7, 16)).validate().unwrap_err();
        assert!(errors.to_string().contains("date_range") || errors.to_string().contains("Start date"));
    }

    #[test]
    fn test_fiscal_year_dates_round_trip_as_iso() {
        let body = serde_json::to_value(fiscal_year((2024, 7, 16), (2025, 7, 15))).unwrap();
        assert_eq!(body["start_date"], "2024-07-16");
        assert_eq!(body["is_default"], false);
    }

    #[test]
    fn test_tax_rate_bounds() {
        let category = TaxCategory {
            id: None,
            name: "VAT".to_string(),
            rate: 130.0,
            status: true,
        };
        assert!(category.validate().is_err());
    }
}
