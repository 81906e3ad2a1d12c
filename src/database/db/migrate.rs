use sqlx::{Pool, Sqlite};

use crate::error::StoreError;

pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
