//! Employee operations over the document store.
//!
//! Every operation checks its input before it touches the store, so a
//! [`EmployeeError::Validation`] guarantees nothing was read or written.

use roster_core::{
    collection::TypedCollection,
    error::DocumentStoreError,
    page::PaginationParams,
    query::{Aggregation, Filter, Query, SortDirection},
    store::DocumentStore,
};
use tracing::{debug, info};

use crate::{
    error::{EmployeeError, EmployeeResult},
    model::{
        DepartmentAverage, EMPLOYEE_ID, EMPLOYEES, Employee, EmployeeDocument, EmployeePatch,
        NewEmployee, by_employee_id,
    },
};

/// Rounds to two decimal places, ties to even (as MongoDB's `$round` does).
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn into_employees(documents: Vec<EmployeeDocument>) -> EmployeeResult<Vec<Employee>> {
    documents
        .into_iter()
        .map(Employee::try_from)
        .collect()
}

#[derive(Debug)]
pub struct EmployeeService {
    store: DocumentStore,
}

impl EmployeeService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    fn employees(&self) -> TypedCollection<'_, EmployeeDocument> {
        self.store.typed_collection::<EmployeeDocument>()
    }

    /// Declares the unique index on `employee_id`. Idempotent.
    pub async fn ensure_indexes(&self) -> EmployeeResult<()> {
        self.store.add_index(EMPLOYEES, EMPLOYEE_ID, true).await?;
        info!(collection = EMPLOYEES, field = EMPLOYEE_ID, "unique index ensured");

        Ok(())
    }

    pub async fn create(&self, employee: NewEmployee) -> EmployeeResult<Employee> {
        employee.validate()?;

        let employee_id = employee.employee_id.clone();
        debug!(%employee_id, department = %employee.department, "creating employee");

        let employees = self.employees();

        if employees.find_one(by_employee_id(&employee_id)).await?.is_some() {
            debug!(%employee_id, "employee already exists");
            return Err(EmployeeError::already_exists(&employee_id));
        }

        let document = EmployeeDocument::from_new(employee);
        let id = document.id;

        // A concurrent create can still win the race; the unique index settles it.
        employees
            .insert(vec![document])
            .await
            .map_err(|err| match err {
                DocumentStoreError::DuplicateKey(..) => EmployeeError::already_exists(&employee_id),
                other => other.into(),
            })?;

        employees
            .get(vec![id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmployeeError::Internal("Failed to create employee".into()))?
            .try_into()
    }

    pub async fn get(&self, employee_id: &str) -> EmployeeResult<Employee> {
        self.employees()
            .find_one(by_employee_id(employee_id))
            .await?
            .ok_or_else(|| {
                debug!(%employee_id, "employee not found");
                EmployeeError::not_found(employee_id)
            })?
            .try_into()
    }

    /// Overwrites the fields present in `patch` and returns the resulting record.
    ///
    /// A patch that changes nothing (every value already stored) still succeeds.
    pub async fn update(&self, employee_id: &str, patch: EmployeePatch) -> EmployeeResult<Employee> {
        patch.validate()?;
        debug!(%employee_id, ?patch, "updating employee");

        let outcome = self
            .employees()
            .update_fields(by_employee_id(employee_id), patch.to_set_document())
            .await?;

        if outcome.matched == 0 {
            return Err(EmployeeError::not_found(employee_id));
        }

        debug!(%employee_id, modified = outcome.modified, "employee updated");

        self.get(employee_id).await
    }

    /// Deletes the record and returns the confirmation message.
    pub async fn delete(&self, employee_id: &str) -> EmployeeResult<String> {
        let deleted = self.employees().delete(by_employee_id(employee_id)).await?;

        if deleted == 0 {
            return Err(EmployeeError::not_found(employee_id));
        }

        debug!(%employee_id, "employee deleted");

        Ok(format!("Employee with ID {employee_id} deleted successfully"))
    }

    /// Lists employees newest first, optionally restricted to one department.
    ///
    /// An empty department string means no filter.
    pub async fn list(&self, department: Option<&str>, page: PaginationParams) -> EmployeeResult<Vec<Employee>> {
        page.validate()?;

        let department = department.filter(|department| !department.is_empty());
        debug!(?department, page = page.page, size = page.size, "listing employees");

        let query = page
            .apply(Query::builder())
            .maybe_filter(department.map(|department| Filter::eq("department", department)))
            .sort("joining_date", SortDirection::Desc)
            .build();

        into_employees(self.employees().query(query).await?)
    }

    /// Mean salary per department, rounded to cents, ordered by department name.
    pub async fn average_salary_by_department(&self) -> EmployeeResult<Vec<DepartmentAverage>> {
        let aggregation = Aggregation::builder("department")
            .avg("avg_salary", "salary")
            .sort("department", SortDirection::Asc)
            .build();

        let rows = self
            .employees()
            .aggregate::<DepartmentAverage>(aggregation)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| DepartmentAverage {
                avg_salary: round_cents(row.avg_salary),
                ..row
            })
            .collect())
    }

    /// Employees whose skills contain exactly `skill` (case-sensitive).
    pub async fn search_by_skill(&self, skill: &str, page: PaginationParams) -> EmployeeResult<Vec<Employee>> {
        if skill.is_empty() {
            return Err(EmployeeError::Validation("skill cannot be empty".into()));
        }
        page.validate()?;
        debug!(%skill, page = page.page, size = page.size, "searching employees by skill");

        let query = page
            .apply(Query::builder())
            .filter(Filter::any_of("skills", [skill]))
            .build();

        into_employees(self.employees().query(query).await?)
    }

    /// Checks that the store answers.
    pub async fn ping(&self) -> EmployeeResult<()> {
        Ok(self.store.ping().await?)
    }

    /// Replaces the whole collection with `employees` and re-declares the index.
    pub async fn reseed(&self, employees: Vec<NewEmployee>) -> EmployeeResult<usize> {
        for employee in &employees {
            employee.validate()?;
        }

        let count = employees.len();
        let documents = employees
            .into_iter()
            .map(EmployeeDocument::from_new)
            .collect::<Vec<_>>();

        self.store.drop_collection(EMPLOYEES).await?;
        self.employees().insert(documents).await?;
        self.ensure_indexes().await?;

        Ok(count)
    }

    pub async fn shutdown(&self) -> EmployeeResult<()> {
        self.store.shutdown().await?;
        info!("document store closed");

        Ok(())
    }
}
