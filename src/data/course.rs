use crate::{
    data::DataType,
    error::{MakeQuerySnafu, SsisResult},
};
use snafu::ResultExt;
use sqlx::{FromRow, PgConnection, Pool, Postgres};

#[derive(Clone, Debug, FromRow)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub college_code: String,
}

impl DataType for Course {
    type Id = String;

    async fn get_from_db_by_id(
        code: &Self::Id,
        conn: &mut PgConnection,
    ) -> SsisResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT code, name, college_code FROM courses WHERE code = $1")
            .bind(code)
            .fetch_optional(&mut *conn)
            .await
            .context(MakeQuerySnafu)
    }

    async fn get_all(pool: &Pool<Postgres>) -> SsisResult<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT code, name, college_code FROM courses ORDER BY code")
            .fetch_all(pool)
            .await
            .context(MakeQuerySnafu)
    }
}
