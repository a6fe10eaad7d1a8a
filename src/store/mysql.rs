//! MySQL backend. Queries are built at runtime so the crate compiles without a
//! reachable database; rows are decoded through the loose `*Record` types.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::info;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::{Executor, MySql, QueryBuilder};
use uuid::Uuid;

use super::{CalendarStore, RemovalRequestStore, ServerFilter, TaskStore, UserStore};
use crate::error::StoreError;
use crate::models::absence::{Absence, NewAbsence};
use crate::models::holiday::{Holiday, NewHoliday};
use crate::models::removal_request::{
    NewRemovalRequest, RemovalRequest, RemovalRequestRecord, RemovalStatus,
};
use crate::models::task::{
    decode_tasks, format_weekdays, normalize_weekdays, AuditStatus, NewTask, Recurrence, Task,
    TaskRecord, TaskStatus, TaskUpdate,
};
use crate::models::user::{normalize_email, NewUser, User, UserRecord, UserUpdate};

const TASK_COLUMNS: &str = "id, title, description, start_date, due_date, priority, status, \
    recurring, recurring_days, attachment_required, attachment_type, attachment_description, \
    attachment_url, attachment_text, assigned_to_id, assigned_to_name, assigned_to_city, \
    assigned_by_id, assigned_by_name, parent_task_id, is_holiday, audit_status, audited_at, \
    audited_by, created_at, updated_at, completed_at";

const USER_COLUMNS: &str = "id, name, email, role, phone, city, password_hash, approved, created_at";

const REMOVAL_COLUMNS: &str = "id, task_id, task_title, requested_by_id, requested_by_name, \
    reason, status, created_at, resolved_at, resolved_by";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(MySqlStore { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("migration failed: {}", e)))?;
        info!("Database schema is up to date");
        Ok(())
    }

    async fn fetch_task_records(
        &self,
        mut qb: QueryBuilder<'_, MySql>,
    ) -> Result<Vec<Task>, StoreError> {
        let records = qb
            .build_query_as::<TaskRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(decode_tasks(records))
    }
}

fn select_tasks<'a>() -> QueryBuilder<'a, MySql> {
    QueryBuilder::new(format!("SELECT {} FROM Tasks_", TASK_COLUMNS))
}

async fn insert_task<'e, E>(executor: E, task: &Task) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query(&format!(
        "INSERT INTO Tasks_ ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        TASK_COLUMNS
    ))
    .bind(&task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.start_date)
    .bind(task.due_date)
    .bind(task.priority.as_str())
    .bind(task.status.as_str())
    .bind(task.recurring.as_str())
    .bind(format_weekdays(&task.recurring_days))
    .bind(task.attachment_required)
    .bind(task.attachment_type.map(|t| t.as_str()))
    .bind(&task.attachment_description)
    .bind(&task.attachment_url)
    .bind(&task.attachment_text)
    .bind(&task.assigned_to_id)
    .bind(&task.assigned_to_name)
    .bind(&task.assigned_to_city)
    .bind(&task.assigned_by_id)
    .bind(&task.assigned_by_name)
    .bind(&task.parent_task_id)
    .bind(task.is_holiday)
    .bind(task.audit_status.map(|s| s.as_str()))
    .bind(task.audited_at)
    .bind(&task.audited_by)
    .bind(task.created_at)
    .bind(task.updated_at)
    .bind(task.completed_at)
    .execute(executor)
    .await?;
    Ok(())
}

fn not_found_unless_affected(
    result: sqlx::mysql::MySqlQueryResult,
    what: String,
) -> Result<(), StoreError> {
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(what));
    }
    Ok(())
}

#[async_trait]
impl TaskStore for MySqlStore {
    async fn fetch_tasks(&self, filter: &ServerFilter) -> Result<Vec<Task>, StoreError> {
        let mut qb = select_tasks();
        match filter {
            ServerFilter::All => {}
            ServerFilter::AssignedTo(id) => {
                qb.push(" WHERE assigned_to_id = ").push_bind(id.clone());
            }
            ServerFilter::AssignedBy(id) => {
                qb.push(" WHERE assigned_by_id = ").push_bind(id.clone());
            }
            ServerFilter::Status(status) => {
                qb.push(" WHERE status = ").push_bind(status.as_str());
            }
        }
        qb.push(" ORDER BY updated_at DESC");
        self.fetch_task_records(qb).await
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let mut qb = select_tasks();
        qb.push(" WHERE id = ").push_bind(id.to_string());
        Ok(self.fetch_task_records(qb).await?.into_iter().next())
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let task = Task::from_new(Uuid::new_v4().to_string(), new, Utc::now());
        insert_task(&self.pool, &task).await?;
        Ok(task)
    }

    async fn create_tasks(&self, batch: Vec<NewTask>) -> Result<Vec<Task>, StoreError> {
        let now = Utc::now();
        let created: Vec<Task> = batch
            .into_iter()
            .map(|new| Task::from_new(Uuid::new_v4().to_string(), new, now))
            .collect();
        let mut tx = self.pool.begin().await?;
        for task in &created {
            // Dropping `tx` on error rolls back everything inserted so far.
            insert_task(&mut *tx, task).await?;
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task, StoreError> {
        // Only touched columns are written so concurrent edits of other fields survive.
        let mut qb = QueryBuilder::<MySql>::new("UPDATE Tasks_ SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(v) = update.title {
            qb.push(", title = ").push_bind(v);
        }
        if let Some(v) = update.description {
            qb.push(", description = ").push_bind(v);
        }
        if let Some(v) = update.start_date {
            qb.push(", start_date = ").push_bind(v);
        }
        if let Some(v) = update.due_date {
            qb.push(", due_date = ").push_bind(v);
        }
        if let Some(v) = update.priority {
            qb.push(", priority = ").push_bind(v.as_str());
        }
        if let Some(v) = update.recurring {
            qb.push(", recurring = ").push_bind(v.as_str());
        }
        if let Some(v) = update.recurring_days {
            qb.push(", recurring_days = ")
                .push_bind(format_weekdays(&normalize_weekdays(v)));
        }
        if let Some(v) = update.attachment_required {
            qb.push(", attachment_required = ").push_bind(v);
        }
        if let Some(v) = update.attachment_type {
            qb.push(", attachment_type = ").push_bind(v.as_str());
        }
        if let Some(v) = update.attachment_description {
            qb.push(", attachment_description = ").push_bind(v);
        }
        if let Some(v) = update.attachment_url {
            qb.push(", attachment_url = ").push_bind(v);
        }
        if let Some(v) = update.attachment_text {
            qb.push(", attachment_text = ").push_bind(v);
        }
        if let Some(v) = update.assigned_to_id {
            qb.push(", assigned_to_id = ").push_bind(v);
        }
        if let Some(v) = update.assigned_to_name {
            qb.push(", assigned_to_name = ").push_bind(v);
        }
        if let Some(v) = update.assigned_to_city {
            qb.push(", assigned_to_city = ").push_bind(v);
        }
        match (update.completed_at, update.status) {
            (Some(at), _) => {
                qb.push(", completed_at = ").push_bind(at);
                qb.push(", status = ").push_bind(TaskStatus::Completed.as_str());
            }
            (None, Some(status)) => {
                qb.push(", status = ").push_bind(status.as_str());
            }
            (None, None) => {}
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());
        qb.build().execute(&self.pool).await?;

        self.get_task(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("task {}", id)))
    }

    async fn set_audit_status(
        &self,
        id: &str,
        status: AuditStatus,
        audited_by: &str,
    ) -> Result<Task, StoreError> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE Tasks_ SET audit_status = ?, audited_at = ?, audited_by = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(now)
        .bind(audited_by)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_task(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("task {}", id)))
    }

    async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM Tasks_ WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        not_found_unless_affected(result, format!("task {}", id))
    }

    async fn recent_completed(&self, limit: usize) -> Result<Vec<Task>, StoreError> {
        let mut qb = select_tasks();
        qb.push(" WHERE status = ")
            .push_bind(TaskStatus::Completed.as_str())
            .push(" ORDER BY completed_at DESC LIMIT ")
            .push_bind(limit as u64);
        self.fetch_task_records(qb).await
    }

    async fn attachment_audit_candidates(&self, limit: usize) -> Result<Vec<Task>, StoreError> {
        let mut qb = select_tasks();
        qb.push(" WHERE status = ")
            .push_bind(TaskStatus::Completed.as_str())
            .push(" AND attachment_required = TRUE ORDER BY updated_at DESC LIMIT ")
            .push_bind(limit as u64);
        self.fetch_task_records(qb).await
    }

    async fn incomplete_tasks_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Task>, StoreError> {
        let mut qb = select_tasks();
        qb.push(" WHERE assigned_to_id = ")
            .push_bind(user_id.to_string())
            .push(" AND status IN (")
            .push_bind(TaskStatus::Pending.as_str())
            .push(", ")
            .push_bind(TaskStatus::Overdue.as_str())
            .push(") ORDER BY updated_at DESC LIMIT ")
            .push_bind(limit as u64);
        self.fetch_task_records(qb).await
    }

    async fn overdue_candidates(&self, today: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let mut qb = select_tasks();
        qb.push(" WHERE status IN (")
            .push_bind(TaskStatus::Pending.as_str())
            .push(", ")
            .push_bind(TaskStatus::Overdue.as_str())
            .push(") AND due_date < ")
            .push_bind(today)
            .push(" ORDER BY due_date ASC");
        self.fetch_task_records(qb).await
    }

    async fn tasks_due_on(
        &self,
        date: NaiveDate,
        statuses: &[TaskStatus],
    ) -> Result<Vec<Task>, StoreError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = select_tasks();
        qb.push(" WHERE due_date = ").push_bind(date).push(" AND status IN (");
        let mut list = qb.separated(", ");
        for status in statuses {
            list.push_bind(status.as_str());
        }
        list.push_unseparated(")");
        self.fetch_task_records(qb).await
    }

    async fn recurring_templates(&self, recurrence: Recurrence) -> Result<Vec<Task>, StoreError> {
        let mut qb = select_tasks();
        qb.push(" WHERE recurring = ")
            .push_bind(recurrence.as_str())
            .push(" AND (parent_task_id IS NULL OR parent_task_id = '')");
        self.fetch_task_records(qb).await
    }

    async fn instance_exists(
        &self,
        parent_task_id: &str,
        due_date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM Tasks_ WHERE parent_task_id = ? AND due_date = ?",
        )
        .bind(parent_task_id)
        .bind(due_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let records: Vec<UserRecord> =
            sqlx::query_as(&format!("SELECT {} FROM Users_", USER_COLUMNS))
                .fetch_all(&self.pool)
                .await?;
        Ok(records.into_iter().map(User::from).collect())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let record: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {} FROM Users_ WHERE id = ?", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let record: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {} FROM Users_ WHERE email = ?", USER_COLUMNS))
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;
        Ok(record.map(User::from))
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            email: normalize_email(&new.email),
            role: new.role,
            phone: new.phone,
            city: new.city,
            password_hash: new.password_hash,
            approved: true,
            created_at: Some(Utc::now()),
        };
        sqlx::query(&format!(
            "INSERT INTO Users_ ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            USER_COLUMNS
        ))
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.phone)
        .bind(&user.city)
        .bind(&user.password_hash)
        .bind(user.approved)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, StoreError> {
        let mut qb = QueryBuilder::<MySql>::new("UPDATE Users_ SET ");
        let mut touched = false;
        {
            let mut set = qb.separated(", ");
            if let Some(v) = update.name {
                set.push("name = ").push_bind_unseparated(v);
                touched = true;
            }
            if let Some(v) = update.email {
                set.push("email = ").push_bind_unseparated(normalize_email(&v));
                touched = true;
            }
            if let Some(v) = update.role {
                set.push("role = ").push_bind_unseparated(v.as_str());
                touched = true;
            }
            if let Some(v) = update.phone {
                let phone = Some(v).filter(|p| !p.trim().is_empty());
                set.push("phone = ").push_bind_unseparated(phone);
                touched = true;
            }
            if let Some(v) = update.city {
                set.push("city = ").push_bind_unseparated(v);
                touched = true;
            }
            if let Some(v) = update.approved {
                set.push("approved = ").push_bind_unseparated(v);
                touched = true;
            }
        }
        if touched {
            qb.push(" WHERE id = ").push_bind(id.to_string());
            qb.build().execute(&self.pool).await?;
        }
        self.get_user(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM Users_ WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        not_found_unless_affected(result, format!("user {}", id))
    }
}

#[async_trait]
impl CalendarStore for MySqlStore {
    async fn list_holidays(&self) -> Result<Vec<Holiday>, StoreError> {
        let rows = sqlx::query_as::<_, Holiday>(
            "SELECT id, date, name, created_at FROM Holidays_ ORDER BY date ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_holiday(&self, new: NewHoliday) -> Result<Holiday, StoreError> {
        let holiday = Holiday {
            id: Uuid::new_v4().to_string(),
            date: new.date,
            name: new.name,
            created_at: Utc::now(),
        };
        sqlx::query("INSERT INTO Holidays_ (id, date, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(&holiday.id)
            .bind(holiday.date)
            .bind(&holiday.name)
            .bind(holiday.created_at)
            .execute(&self.pool)
            .await?;
        Ok(holiday)
    }

    async fn delete_holiday(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM Holidays_ WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        not_found_unless_affected(result, format!("holiday {}", id))
    }

    async fn list_absences(&self) -> Result<Vec<Absence>, StoreError> {
        let rows = sqlx::query_as::<_, Absence>(
            "SELECT id, user_id, user_name, from_date, to_date, reason, created_at \
             FROM Absences_ ORDER BY from_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_absence(&self, new: NewAbsence) -> Result<Absence, StoreError> {
        let absence = Absence {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            user_name: new.user_name,
            from_date: new.from_date,
            to_date: new.to_date,
            reason: new.reason,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO Absences_ (id, user_id, user_name, from_date, to_date, reason, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&absence.id)
        .bind(&absence.user_id)
        .bind(&absence.user_name)
        .bind(absence.from_date)
        .bind(absence.to_date)
        .bind(&absence.reason)
        .bind(absence.created_at)
        .execute(&self.pool)
        .await?;
        Ok(absence)
    }
}

#[async_trait]
impl RemovalRequestStore for MySqlStore {
    async fn list_removal_requests(&self) -> Result<Vec<RemovalRequest>, StoreError> {
        let records: Vec<RemovalRequestRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM RemovalRequests_ ORDER BY created_at DESC",
            REMOVAL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(RemovalRequest::from).collect())
    }

    async fn get_removal_request(&self, id: &str) -> Result<Option<RemovalRequest>, StoreError> {
        let record: Option<RemovalRequestRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM RemovalRequests_ WHERE id = ?",
            REMOVAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(RemovalRequest::from))
    }

    async fn create_removal_request(
        &self,
        new: NewRemovalRequest,
    ) -> Result<RemovalRequest, StoreError> {
        let request = RemovalRequest {
            id: Uuid::new_v4().to_string(),
            task_id: new.task_id,
            task_title: new.task_title,
            requested_by_id: new.requested_by_id,
            requested_by_name: new.requested_by_name,
            reason: new.reason,
            status: RemovalStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        };
        sqlx::query(&format!(
            "INSERT INTO RemovalRequests_ ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            REMOVAL_COLUMNS
        ))
        .bind(&request.id)
        .bind(&request.task_id)
        .bind(&request.task_title)
        .bind(&request.requested_by_id)
        .bind(&request.requested_by_name)
        .bind(&request.reason)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.resolved_at)
        .bind(&request.resolved_by)
        .execute(&self.pool)
        .await?;
        Ok(request)
    }

    async fn resolve_removal_request(
        &self,
        id: &str,
        status: RemovalStatus,
        resolved_by: &str,
    ) -> Result<RemovalRequest, StoreError> {
        sqlx::query(
            "UPDATE RemovalRequests_ SET status = ?, resolved_at = ?, resolved_by = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(resolved_by)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_removal_request(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("removal request {}", id)))
    }
}
