//! Organizations, departments and positions repositories

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::{apply_update, delete_by_id},
    scan::{named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::organization::{
        CreateDepartment, CreateOrganization, CreatePosition, Department, DepartmentQuery, Organization,
        OrganizationQuery, Position, UpdateDepartment, UpdateOrganization, UpdatePosition,
    },
};

const ORGANIZATION_SELECT: &str = r#"
    SELECT o.id, o.name, o.created_at, o.updated_at,
           p.id AS parent_id, p.name AS parent_name
    FROM organizations o
    LEFT JOIN organizations p ON p.id = o.parent_organization_id
"#;

const DEPARTMENT_SELECT: &str = r#"
    SELECT d.id, d.name, d.description, d.created_at, d.updated_at,
           o.id AS organization_id, o.name AS organization_name,
           p.id AS parent_id, p.name AS parent_name
    FROM departments d
    LEFT JOIN organizations o ON o.id = d.organization_id
    LEFT JOIN departments p ON p.id = d.parent_id
"#;

fn scan_organization(row: &PgRow) -> Result<Organization, sqlx::Error> {
    Ok(Organization {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        parent: named_ref(row, "parent_id", "parent_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn scan_department(row: &PgRow) -> Result<Department, sqlx::Error> {
    Ok(Department {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        parent: named_ref(row, "parent_id", "parent_name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[derive(Clone)]
pub struct OrganizationsRepository {
    pool: Pool<Postgres>,
}

impl OrganizationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreateOrganization) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO organizations (name, parent_organization_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(&data.name)
        .bind(data.parent_organization_id)
        .fetch_one(&self.pool)
        .await
        .op("create organization")
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Organization> {
        let query = format!("{} WHERE o.id = $1", ORGANIZATION_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get organization")?
            .ok_or_else(|| AppError::NotFound(format!("Organization {} not found", id)))?;
        scan_organization(&row).op("scan organization")
    }

    pub async fn list(&self, query: &OrganizationQuery) -> AppResult<Vec<Organization>> {
        let mut filter = FilterBuilder::new(ORGANIZATION_SELECT);
        filter
            .eq("o.parent_organization_id", query.parent_organization_id)
            .search(&["o.name"], query.search.as_deref())
            .order_by("o.name");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list organizations")?;
        scan_all(&rows, scan_organization).op("scan organization")
    }

    pub async fn update(&self, id: i64, data: &UpdateOrganization) -> AppResult<()> {
        let mut update = UpdateBuilder::new("organizations");
        update
            .set("name", data.name.as_deref())
            .set("parent_organization_id", data.parent_organization_id)
            .touch("updated_at");
        apply_update(&self.pool, update, "Organization", "update organization", id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "organizations", "Organization", "delete organization", id).await
    }
}

#[derive(Clone)]
pub struct DepartmentsRepository {
    pool: Pool<Postgres>,
}

impl DepartmentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreateDepartment) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO departments (name, organization_id, parent_id, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&data.name)
        .bind(data.organization_id)
        .bind(data.parent_id)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await
        .op("create department")
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Department> {
        let query = format!("{} WHERE d.id = $1", DEPARTMENT_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get department")?
            .ok_or_else(|| AppError::NotFound(format!("Department {} not found", id)))?;
        scan_department(&row).op("scan department")
    }

    pub async fn list(&self, query: &DepartmentQuery) -> AppResult<Vec<Department>> {
        let mut filter = FilterBuilder::new(DEPARTMENT_SELECT);
        filter
            .eq("d.organization_id", query.organization_id)
            .eq("d.parent_id", query.parent_id)
            .search(&["d.name"], query.search.as_deref())
            .order_by("d.name");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list departments")?;
        scan_all(&rows, scan_department).op("scan department")
    }

    pub async fn update(&self, id: i64, data: &UpdateDepartment) -> AppResult<()> {
        let mut update = UpdateBuilder::new("departments");
        update
            .set("name", data.name.as_deref())
            .set("organization_id", data.organization_id)
            .set("parent_id", data.parent_id)
            .set("description", data.description.as_deref())
            .touch("updated_at");
        apply_update(&self.pool, update, "Department", "update department", id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "departments", "Department", "delete department", id).await
    }
}

#[derive(Clone)]
pub struct PositionsRepository {
    pool: Pool<Postgres>,
}

impl PositionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreatePosition) -> AppResult<Position> {
        sqlx::query_as::<_, Position>(
            "INSERT INTO positions (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await
        .op("create position")
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Position> {
        sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get position")?
            .ok_or_else(|| AppError::NotFound(format!("Position {} not found", id)))
    }

    pub async fn list(&self) -> AppResult<Vec<Position>> {
        sqlx::query_as::<_, Position>("SELECT * FROM positions ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .op("list positions")
    }

    pub async fn update(&self, id: i64, data: &UpdatePosition) -> AppResult<()> {
        let mut update = UpdateBuilder::new("positions");
        update
            .set("name", data.name.as_deref())
            .set("description", data.description.as_deref())
            .touch("updated_at");
        apply_update(&self.pool, update, "Position", "update position", id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "positions", "Position", "delete position", id).await
    }
}
