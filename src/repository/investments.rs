//! Investments and active projects repositories

use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use super::{
    crud::{apply_update, delete_by_id},
    files::INVESTMENT_FILES,
    scan::{contact_ref, named_ref, scan_all},
    sql::{FilterBuilder, UpdateBuilder},
};
use crate::{
    error::{AppError, AppResult, DbResultExt},
    models::investment::{
        ActiveProject, CreateActiveProject, CreateInvestment, InvestmentDetails, InvestmentDictionaryEntry,
        InvestmentQuery, UpdateActiveProject, UpdateInvestment,
    },
};

const INVESTMENT_SELECT: &str = r#"
    SELECT i.id, i.name, i.amount, i.start_date, i.end_date, i.description,
           i.created_by, i.created_at, i.updated_at,
           t.id AS type_id, t.name AS type_name,
           s.id AS status_id, s.name AS status_name,
           o.id AS organization_id, o.name AS organization_name
    FROM investments i
    LEFT JOIN investment_types t ON t.id = i.type_id
    LEFT JOIN investment_statuses s ON s.id = i.status_id
    LEFT JOIN organizations o ON o.id = i.organization_id
"#;

const PROJECT_SELECT: &str = r#"
    SELECT p.id, p.name, p.budget, p.progress_percent, p.start_date, p.planned_end_date,
           p.description, p.created_at, p.updated_at,
           o.id AS organization_id, o.name AS organization_name,
           i.id AS investment_id, i.name AS investment_name,
           c.id AS responsible_id, c.fio AS responsible_fio
    FROM invest_active_projects p
    LEFT JOIN organizations o ON o.id = p.organization_id
    LEFT JOIN investments i ON i.id = p.investment_id
    LEFT JOIN contacts c ON c.id = p.responsible_contact_id
"#;

fn scan_investment(row: &PgRow) -> Result<InvestmentDetails, sqlx::Error> {
    Ok(InvestmentDetails {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        investment_type: named_ref(row, "type_id", "type_name")?,
        status: named_ref(row, "status_id", "status_name")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        amount: row.try_get("amount")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        description: row.try_get("description")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        files: Vec::new(),
    })
}

fn scan_project(row: &PgRow) -> Result<ActiveProject, sqlx::Error> {
    Ok(ActiveProject {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        organization: named_ref(row, "organization_id", "organization_name")?,
        investment: named_ref(row, "investment_id", "investment_name")?,
        responsible: contact_ref(row, "responsible_id", "responsible_fio")?,
        budget: row.try_get("budget")?,
        progress_percent: row.try_get("progress_percent")?,
        start_date: row.try_get("start_date")?,
        planned_end_date: row.try_get("planned_end_date")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[derive(Clone)]
pub struct InvestmentsRepository {
    pool: Pool<Postgres>,
}

impl InvestmentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreateInvestment, created_by: i64) -> AppResult<i64> {
        let mut tx = self.pool.begin().await.op("begin create investment")?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO investments (name, type_id, status_id, organization_id, amount,
                                     start_date, end_date, description, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&data.name)
        .bind(data.type_id)
        .bind(data.status_id)
        .bind(data.organization_id)
        .bind(data.amount)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(&data.description)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .op("create investment")?;

        INVESTMENT_FILES.link(&mut *tx, id, &data.file_ids).await?;

        tx.commit().await.op("commit create investment")?;
        tracing::debug!(investment_id = id, "Investment created");
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<InvestmentDetails> {
        let query = format!("{} WHERE i.id = $1", INVESTMENT_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get investment")?
            .ok_or_else(|| AppError::NotFound(format!("Investment {} not found", id)))?;

        let mut investment = scan_investment(&row).op("scan investment")?;
        investment.files = INVESTMENT_FILES.load(&self.pool, id).await?;
        Ok(investment)
    }

    pub async fn list(&self, query: &InvestmentQuery) -> AppResult<Vec<InvestmentDetails>> {
        let mut filter = FilterBuilder::new(INVESTMENT_SELECT);
        filter
            .eq("i.type_id", query.type_id)
            .eq("i.status_id", query.status_id)
            .eq("i.organization_id", query.organization_id)
            .search(&["i.name", "i.description"], query.search.as_deref())
            .order_by("i.created_at DESC, i.id DESC")
            .paginate(query.page, query.per_page);

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list investments")?;
        let mut investments = scan_all(&rows, scan_investment).op("scan investment")?;

        let ids: Vec<i64> = investments.iter().map(|i| i.id).collect();
        let mut files = INVESTMENT_FILES.load_many(&self.pool, &ids).await?;
        for investment in &mut investments {
            investment.files = files.remove(&investment.id).unwrap_or_default();
        }
        Ok(investments)
    }

    pub async fn update(&self, id: i64, data: &UpdateInvestment) -> AppResult<()> {
        let mut update = UpdateBuilder::new("investments");
        update
            .set("name", data.name.as_deref())
            .set("type_id", data.type_id)
            .set("status_id", data.status_id)
            .set("organization_id", data.organization_id)
            .set("amount", data.amount)
            .set("start_date", data.start_date)
            .set("end_date", data.end_date)
            .set("description", data.description.as_deref())
            .touch("updated_at");

        let file_ids = match &data.file_ids {
            Some(file_ids) => file_ids,
            None => return apply_update(&self.pool, update, "Investment", "update investment", id).await,
        };

        let mut tx = self.pool.begin().await.op("begin update investment")?;
        let mut query = update.where_key("id", id);
        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .op("update investment")?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Investment {} not found", id)));
        }
        INVESTMENT_FILES.replace(&mut *tx, id, file_ids).await?;
        tx.commit().await.op("commit update investment")?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "investments", "Investment", "delete investment", id).await
    }

    pub async fn list_types(&self) -> AppResult<Vec<InvestmentDictionaryEntry>> {
        sqlx::query_as::<_, InvestmentDictionaryEntry>("SELECT id, name FROM investment_types ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .op("list investment types")
    }

    pub async fn list_statuses(&self) -> AppResult<Vec<InvestmentDictionaryEntry>> {
        sqlx::query_as::<_, InvestmentDictionaryEntry>("SELECT id, name FROM investment_statuses ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .op("list investment statuses")
    }
}

#[derive(Clone)]
pub struct ActiveProjectsRepository {
    pool: Pool<Postgres>,
}

impl ActiveProjectsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &CreateActiveProject) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO invest_active_projects (name, organization_id, investment_id, responsible_contact_id,
                                                budget, progress_percent, start_date, planned_end_date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&data.name)
        .bind(data.organization_id)
        .bind(data.investment_id)
        .bind(data.responsible_contact_id)
        .bind(data.budget)
        .bind(data.progress_percent)
        .bind(data.start_date)
        .bind(data.planned_end_date)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await
        .op("create active project")
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<ActiveProject> {
        let query = format!("{} WHERE p.id = $1", PROJECT_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get active project")?
            .ok_or_else(|| AppError::NotFound(format!("Active project {} not found", id)))?;
        scan_project(&row).op("scan active project")
    }

    pub async fn list(&self, organization_id: Option<i64>) -> AppResult<Vec<ActiveProject>> {
        let mut filter = FilterBuilder::new(PROJECT_SELECT);
        filter.eq("p.organization_id", organization_id).order_by("p.name, p.id");

        let rows = filter
            .into_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .op("list active projects")?;
        scan_all(&rows, scan_project).op("scan active project")
    }

    pub async fn update(&self, id: i64, data: &UpdateActiveProject) -> AppResult<()> {
        let mut update = UpdateBuilder::new("invest_active_projects");
        update
            .set("name", data.name.as_deref())
            .set("organization_id", data.organization_id)
            .set("investment_id", data.investment_id)
            .set("responsible_contact_id", data.responsible_contact_id)
            .set("budget", data.budget)
            .set("progress_percent", data.progress_percent)
            .set("start_date", data.start_date)
            .set("planned_end_date", data.planned_end_date)
            .set("description", data.description.as_deref())
            .touch("updated_at");
        apply_update(&self.pool, update, "Active project", "update active project", id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        delete_by_id(&self.pool, "invest_active_projects", "Active project", "delete active project", id).await
    }
}
