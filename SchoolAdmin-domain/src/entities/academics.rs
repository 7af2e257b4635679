use serde::{Deserialize, Serialize};
use validator::Validate;

use super::resource::resource_item;

fn default_active() -> bool {
    true
}

/// Academic level such as "Primary" or "Secondary"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AcademicLevel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 100, message = "Name is required and cannot exceed 100 characters"))]
    pub name: String,

    #[validate(length(max = 20, message = "Code cannot exceed 20 characters"))]
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default = "default_active")]
    pub status: bool,
}

/// Grade (class) taught within an academic level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Grade {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 100, message = "Name is required and cannot exceed 100 characters"))]
    pub name: String,

    pub academic_level_id: u64,

    /// Optional grouping used by timetables and fee structures
    #[serde(default)]
    pub grade_group_id: Option<u64>,

    #[serde(default = "default_active")]
    pub status: bool,
}

/// Group of grades sharing a configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GradeGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 100, message = "Name is required and cannot exceed 100 characters"))]
    pub name: String,

    #[serde(default = "default_active")]
    pub status: bool,
}

/// Faculty (department) of the school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Faculty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 255, message = "Name is required and cannot exceed 255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 20, message = "Code is required and cannot exceed 20 characters"))]
    pub code: String,

    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_active")]
    pub status: bool,
}

/// Subject taught in one or more grades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Subject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 255, message = "Name is required and cannot exceed 255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 20, message = "Code is required and cannot exceed 20 characters"))]
    pub code: String,

    #[serde(default)]
    pub subject_type_id: Option<u64>,

    #[validate(range(min = 0.0, max = 20.0, message = "Credit hours must be between 0 and 20"))]
    #[serde(default)]
    pub credit_hour: Option<f32>,

    #[serde(default = "default_active")]
    pub status: bool,
}

/// Subject classification such as "Compulsory" or "Optional"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SubjectType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(length(min = 1, max = 100, message = "Name is required and cannot exceed 100 characters"))]
    pub name: String,

    #[serde(default = "default_active")]
    pub status: bool,
}

resource_item!(AcademicLevel, "academic levels", "/academics/levels");
resource_item!(Grade, "grades", "/academics/grades");
resource_item!(GradeGroup, "grade groups", "/academics/grade-groups");
resource_item!(Faculty, "faculties", "/academics/faculties");
resource_item!(Subject, "subjects", "/academics/subjects");
resource_item!(SubjectType, "subject types", "/academics/subject-types");
