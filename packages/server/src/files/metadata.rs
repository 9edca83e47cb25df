use common::AccessLevel;
use common::storage::Locator;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use thiserror::Error;

use super::caller::{Caller, ROOT_IDENTITY};
use crate::entity::file;

#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The file does not exist or the caller may not see it.
    #[error("file not found")]
    NotFound,
    /// Another record already holds this name.
    #[error("file name '{0}' is already taken")]
    Conflict(String),
    #[error("{0}")]
    InvalidArgument(&'static str),
    /// A stored row violates an invariant the store relies on.
    #[error("record '{name}' is corrupt: {reason}")]
    CorruptRecord { name: String, reason: String },
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// A record about to be inserted.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub locator: Locator,
    pub owner: String,
    pub access_level: AccessLevel,
    pub mime: Option<String>,
}

/// A requested change to an existing record.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct FileUpdate {
    pub new_name: Option<String>,
    pub new_access_level: Option<AccessLevel>,
}

/// Everything the content path needs about a file the caller may read.
#[derive(Debug, Clone)]
pub struct ResolvedContent {
    pub locator: Locator,
    pub mime: Option<String>,
}

/// Authorization-aware access to file records.
///
/// Every statement is a single query; uniqueness of names is left to the
/// primary key rather than checked beforehand.
pub struct FileStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> FileStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Records visible to `caller`, ordered by name. Anonymous callers get none.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<file::Model>, FileStoreError> {
        if caller.is_anonymous() {
            return Ok(Vec::new());
        }

        Ok(file::Entity::find()
            .filter(visible_to(caller))
            .order_by_asc(file::Column::Name)
            .all(self.conn)
            .await?)
    }

    /// Fetch a record by name if `caller` may see it.
    pub async fn get_by_name(
        &self,
        caller: &Caller,
        name: &str,
    ) -> Result<file::Model, FileStoreError> {
        file::Entity::find_by_id(name.to_string())
            .filter(visible_to(caller))
            .one(self.conn)
            .await?
            .ok_or(FileStoreError::NotFound)
    }

    /// Insert a new record. Fails with `Conflict` when the name is taken.
    pub async fn insert(&self, new: NewFile) -> Result<file::Model, FileStoreError> {
        let model = file::ActiveModel {
            name: Set(new.name.clone()),
            locator: Set(new.locator.into_string()),
            owner: Set(new.owner),
            access_level: Set(new.access_level),
            mime: Set(new.mime),
        };

        model
            .insert(self.conn)
            .await
            .map_err(|e| unique_violation_as_conflict(e, &new.name))
    }

    /// Delete `name` on behalf of `caller`.
    ///
    /// Root deletes any record; everyone else only their own. Returns the
    /// number of rows removed, which is zero when nothing matched.
    pub async fn delete(&self, caller: &Caller, name: &str) -> Result<u64, FileStoreError> {
        let Some(target) = mutation_target(caller, Mutation::Delete) else {
            return Ok(0);
        };

        let result = file::Entity::delete_many()
            .filter(file::Column::Name.eq(name))
            .filter(target)
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Rename and/or re-classify `name` on behalf of `caller`.
    ///
    /// Root may change any record except private records owned by someone
    /// else; everyone else only their own. A target that does not match is
    /// a successful no-op. Returns the number of rows changed.
    pub async fn rename(
        &self,
        caller: &Caller,
        name: &str,
        update: FileUpdate,
    ) -> Result<u64, FileStoreError> {
        let new_name = update.new_name.filter(|n| !n.is_empty());
        if new_name.is_none() && update.new_access_level.is_none() {
            return Err(FileStoreError::InvalidArgument(
                "At least one of newName or newAccessLevel is required",
            ));
        }

        let Some(target) = mutation_target(caller, Mutation::Rename) else {
            return Ok(0);
        };

        let mut query = file::Entity::update_many();
        if let Some(new_name) = &new_name {
            query = query.col_expr(file::Column::Name, Expr::value(new_name.clone()));
        }
        if let Some(level) = update.new_access_level {
            query = query.col_expr(file::Column::AccessLevel, Expr::value(level));
        }

        let result = query
            .filter(file::Column::Name.eq(name))
            .filter(target)
            .exec(self.conn)
            .await
            .map_err(|e| unique_violation_as_conflict(e, new_name.as_deref().unwrap_or(name)))?;

        Ok(result.rows_affected)
    }

    /// Locator and MIME type of `name`, under the same rule as [`Self::get_by_name`].
    pub async fn resolve_content_locator(
        &self,
        caller: &Caller,
        name: &str,
    ) -> Result<ResolvedContent, FileStoreError> {
        self.resolve(name, visible_to(caller)).await
    }

    /// Locator and MIME type of `name` if, and only if, it is public.
    pub async fn resolve_public_content_locator(
        &self,
        name: &str,
    ) -> Result<ResolvedContent, FileStoreError> {
        self.resolve(name, visible_to(&Caller::Anonymous)).await
    }

    async fn resolve(
        &self,
        name: &str,
        condition: Condition,
    ) -> Result<ResolvedContent, FileStoreError> {
        let (locator, mime) = file::Entity::find()
            .select_only()
            .column(file::Column::Locator)
            .column(file::Column::Mime)
            .filter(file::Column::Name.eq(name))
            .filter(condition)
            .into_tuple::<(String, Option<String>)>()
            .one(self.conn)
            .await?
            .ok_or(FileStoreError::NotFound)?;

        let locator = Locator::parse(&locator).map_err(|e| FileStoreError::CorruptRecord {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(ResolvedContent { locator, mime })
    }

    /// `(name, locator)` of every record, for maintenance passes.
    pub async fn all_locators(&self) -> Result<Vec<(String, String)>, FileStoreError> {
        Ok(file::Entity::find()
            .select_only()
            .column(file::Column::Name)
            .column(file::Column::Locator)
            .order_by_asc(file::Column::Name)
            .into_tuple::<(String, String)>()
            .all(self.conn)
            .await?)
    }

    /// Persist a re-detected MIME type, keyed by the immutable locator.
    pub async fn set_mime(&self, locator: &Locator, mime: &str) -> Result<u64, FileStoreError> {
        let result = file::Entity::update_many()
            .col_expr(file::Column::Mime, Expr::value(mime.to_string()))
            .filter(file::Column::Locator.eq(locator.as_str()))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}

/// SQL form of [`super::is_visible`].
fn visible_to(caller: &Caller) -> Condition {
    match caller {
        Caller::Anonymous => Condition::all().add(file::Column::AccessLevel.eq(AccessLevel::Public)),
        caller if caller.is_root() => Condition::all(),
        Caller::Identified(id) => Condition::any()
            .add(file::Column::AccessLevel.ne(AccessLevel::Private))
            .add(file::Column::Owner.eq(id.as_str())),
    }
}

#[derive(Clone, Copy)]
enum Mutation {
    Delete,
    Rename,
}

/// Which rows `caller` may mutate, or `None` when it may mutate nothing.
fn mutation_target(caller: &Caller, mutation: Mutation) -> Option<Condition> {
    let id = caller.id()?;

    if caller.is_root() {
        return Some(match mutation {
            Mutation::Delete => Condition::all(),
            Mutation::Rename => Condition::any()
                .add(file::Column::AccessLevel.ne(AccessLevel::Private))
                .add(file::Column::Owner.eq(ROOT_IDENTITY)),
        });
    }

    Some(Condition::all().add(file::Column::Owner.eq(id)))
}

fn unique_violation_as_conflict(err: DbErr, name: &str) -> FileStoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!(name, "unique constraint violated");
            FileStoreError::Conflict(name.to_string())
        }
        _ => FileStoreError::Db(err),
    }
}
