use crate::error::SsisResult;
use sqlx::{PgConnection, Pool, Postgres};

pub mod college;
pub mod course;
pub mod student;

pub trait DataType: Sized {
    type Id;

    async fn get_from_db_by_id(id: &Self::Id, conn: &mut PgConnection)
    -> SsisResult<Option<Self>>;
    async fn get_all(pool: &Pool<Postgres>) -> SsisResult<Vec<Self>>;
}
