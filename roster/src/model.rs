//! Employee records: the persisted document, the API shape, and request bodies.
//!
//! [`EmployeeDocument`] is what the store holds: a store-assigned `id` plus the
//! joining date as a BSON datetime at midnight UTC. [`Employee`] is what callers
//! see: no internal id, and the joining date as a plain `YYYY-MM-DD` date. The
//! conversion between the two is the only place dates change representation.

use bson::{Document as BsonDocument, Uuid};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use roster_core::{
    document::Document,
    query::{Expr, Filter},
};

use crate::error::{EmployeeError, EmployeeResult};

/// Name of the collection holding employee documents.
pub const EMPLOYEES: &str = "employees";

/// Field carrying the externally supplied, unique employee number.
pub const EMPLOYEE_ID: &str = "employee_id";

/// An employee as stored in the document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeDocument {
    pub id: Uuid,
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub salary: f64,
    pub joining_date: bson::DateTime,
    pub skills: Vec<String>,
}

impl Document for EmployeeDocument {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        EMPLOYEES
    }
}

impl EmployeeDocument {
    /// Builds the document for a new employee under a fresh internal id.
    pub fn from_new(employee: NewEmployee) -> Self {
        Self {
            id: Uuid::new(),
            employee_id: employee.employee_id,
            name: employee.name,
            department: employee.department,
            salary: employee.salary,
            joining_date: date_to_bson(employee.joining_date),
            skills: employee.skills,
        }
    }
}

/// An employee as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub salary: f64,
    pub joining_date: NaiveDate,
    pub skills: Vec<String>,
}

impl TryFrom<EmployeeDocument> for Employee {
    type Error = EmployeeError;

    fn try_from(document: EmployeeDocument) -> EmployeeResult<Self> {
        Ok(Self {
            joining_date: bson_to_date(document.joining_date)?,
            employee_id: document.employee_id,
            name: document.name,
            department: document.department,
            salary: document.salary,
            skills: document.skills,
        })
    }
}

/// Body of a create request: a complete record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEmployee {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub salary: f64,
    pub joining_date: NaiveDate,
    pub skills: Vec<String>,
}

impl NewEmployee {
    pub fn validate(&self) -> EmployeeResult<()> {
        require_text("employee_id", &self.employee_id)?;
        require_text("name", &self.name)?;
        require_text("department", &self.department)?;
        require_positive_salary(self.salary)
    }
}

/// Body of an update request.
///
/// Every field is optional and an explicit `null` reads the same as an absent
/// field, so a field can be overwritten but never cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub department: Option<String>,
    pub salary: Option<f64>,
    pub joining_date: Option<NaiveDate>,
    pub skills: Option<Vec<String>>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.department.is_none()
            && self.salary.is_none()
            && self.joining_date.is_none()
            && self.skills.is_none()
    }

    pub fn validate(&self) -> EmployeeResult<()> {
        if self.is_empty() {
            return Err(EmployeeError::Validation("No valid fields provided for update".into()));
        }
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(department) = &self.department {
            require_text("department", department)?;
        }
        if let Some(salary) = self.salary {
            require_positive_salary(salary)?;
        }

        Ok(())
    }

    /// The stored fields this patch overwrites, in their persisted representation.
    pub fn to_set_document(&self) -> BsonDocument {
        let mut fields = BsonDocument::new();

        if let Some(name) = &self.name {
            fields.insert("name", name.as_str());
        }
        if let Some(department) = &self.department {
            fields.insert("department", department.as_str());
        }
        if let Some(salary) = self.salary {
            fields.insert("salary", salary);
        }
        if let Some(joining_date) = self.joining_date {
            fields.insert("joining_date", date_to_bson(joining_date));
        }
        if let Some(skills) = &self.skills {
            fields.insert("skills", skills.clone());
        }

        fields
    }
}

/// One row of the per-department salary report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepartmentAverage {
    pub department: String,
    pub avg_salary: f64,
}

/// Filter selecting the record with the given employee number.
pub fn by_employee_id(employee_id: &str) -> Expr {
    Filter::eq(EMPLOYEE_ID, employee_id)
}

/// Midnight UTC on `date`.
pub fn date_to_bson(date: NaiveDate) -> bson::DateTime {
    bson::DateTime::from_millis(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

/// The UTC calendar date of a stored datetime.
pub fn bson_to_date(datetime: bson::DateTime) -> EmployeeResult<NaiveDate> {
    chrono::DateTime::from_timestamp_millis(datetime.timestamp_millis())
        .map(|utc| utc.date_naive())
        .ok_or_else(|| EmployeeError::Internal(format!("stored joining_date out of range: {datetime}")))
}

fn require_text(field: &str, value: &str) -> EmployeeResult<()> {
    if value.trim().is_empty() {
        return Err(EmployeeError::Validation(format!("{field} cannot be empty")));
    }

    Ok(())
}

fn require_positive_salary(salary: f64) -> EmployeeResult<()> {
    if !(salary.is_finite() && salary > 0.0) {
        return Err(EmployeeError::Validation("salary must be greater than 0".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use crate::seed::sample_employees;

    fn new_employee() -> NewEmployee {
        sample_employees().remove(0)
    }

    #[test]
    fn joining_date_round_trips_through_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        let stored = date_to_bson(date);

        assert_eq!(stored.timestamp_millis(), 1_673_740_800_000);
        assert_eq!(bson_to_date(stored).unwrap(), date);
    }

    #[test]
    fn employee_serializes_date_as_plain_string() {
        let document = EmployeeDocument::from_new(new_employee());
        let employee = Employee::try_from(document).unwrap();
        let json = serde_json::to_value(&employee).unwrap();

        assert_eq!(json["joining_date"], "2023-01-15");
        assert_eq!(json["employee_id"], "E001");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn new_employee_validation() {
        assert!(new_employee().validate().is_ok());

        let mut employee = new_employee();
        employee.salary = 0.0;
        assert!(matches!(employee.validate(), Err(EmployeeError::Validation(_))));

        let mut employee = new_employee();
        employee.salary = -5.0;
        assert!(matches!(employee.validate(), Err(EmployeeError::Validation(_))));

        let mut employee = new_employee();
        employee.name = "   ".into();
        assert!(matches!(employee.validate(), Err(EmployeeError::Validation(msg)) if msg == "name cannot be empty"));
    }

    #[test]
    fn patch_treats_null_as_absent() {
        let patch: EmployeePatch = serde_json::from_str(r#"{"name": null, "salary": null}"#).unwrap();
        assert!(patch.is_empty());
        assert!(matches!(
            patch.validate(),
            Err(EmployeeError::Validation(msg)) if msg == "No valid fields provided for update"
        ));
    }

    #[test]
    fn patch_set_document_holds_only_supplied_fields() {
        let patch = EmployeePatch {
            salary: Some(80000.0),
            joining_date: NaiveDate::from_ymd_opt(2024, 2, 29),
            skills: Some(vec!["Rust".into(), "Rust".into()]),
            ..EmployeePatch::default()
        };

        assert!(patch.validate().is_ok());
        assert_eq!(patch.to_set_document(), doc! {
            "salary": 80000.0,
            "joining_date": date_to_bson(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            "skills": ["Rust", "Rust"],
        });
    }

    #[test]
    fn patch_rejects_non_positive_salary() {
        let patch = EmployeePatch { salary: Some(0.0), ..EmployeePatch::default() };
        assert!(matches!(patch.validate(), Err(EmployeeError::Validation(_))));
    }
}
