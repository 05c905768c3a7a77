//! Sample data for `roster seed`.

use chrono::NaiveDate;
use tracing::info;

use crate::{error::EmployeeResult, model::NewEmployee, service::EmployeeService};

/// Sample records loaded by `roster seed`.
pub fn sample_employees() -> Vec<NewEmployee> {
    let employee = |employee_id: &str, name: &str, department: &str, salary: f64, (y, m, d): (i32, u32, u32), skills: &[&str]| {
        NewEmployee {
            employee_id: employee_id.into(),
            name: name.into(),
            department: department.into(),
            salary,
            joining_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
            skills: skills.iter().map(|skill| skill.to_string()).collect(),
        }
    };

    vec![
        employee("E001", "John Doe", "Engineering", 75000.0, (2023, 1, 15), &["Python", "MongoDB", "APIs"]),
        employee("E002", "Jane Smith", "Engineering", 85000.0, (2022, 8, 20), &["Python", "React", "Node.js", "MongoDB"]),
        employee("E003", "Mike Johnson", "HR", 60000.0, (2023, 3, 10), &["Communication", "Recruiting", "Excel"]),
        employee("E004", "Sarah Wilson", "Engineering", 90000.0, (2021, 11, 5), &["Python", "Machine Learning", "TensorFlow", "MongoDB"]),
        employee("E005", "David Brown", "HR", 55000.0, (2023, 6, 1), &["HR Management", "Employee Relations", "Excel"]),
        employee("E006", "Emily Davis", "Marketing", 65000.0, (2022, 12, 15), &["Digital Marketing", "Analytics", "Python", "SQL"]),
    ]
}

/// Replaces the employee collection with [`sample_employees`].
pub async fn run(service: &EmployeeService) -> EmployeeResult<()> {
    let count = service.reseed(sample_employees()).await?;
    info!(count, "seeded database with sample data");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn samples_are_valid_and_unique() {
        let samples = sample_employees();
        let ids = samples
            .iter()
            .map(|employee| employee.employee_id.as_str())
            .collect::<HashSet<_>>();

        assert_eq!(samples.len(), 6);
        assert_eq!(ids.len(), 6);
        assert!(samples.iter().all(|employee| employee.validate().is_ok()));
        assert_eq!(samples[3].joining_date, NaiveDate::from_ymd_opt(2021, 11, 5).unwrap());
    }
}
