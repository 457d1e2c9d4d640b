use crate::{
    data::DataType,
    error::{MakeQuerySnafu, SsisResult},
    pagination::Pager,
    search::SearchFilter,
};
use snafu::ResultExt;
use sqlx::{FromRow, PgConnection, Pool, Postgres};

pub const INVALID_ID_FORMAT: &str = "Invalid Student ID format. Use xxxx-xxxx with only numbers.";

///Checks the `NNNN-NNNN` student id format: four digits, a hyphen, four digits.
pub fn valid_student_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 9
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

///The duplicate-id gate, decided from the `exists` lookup before any row is
///written. `Some` is the rejection to hand back.
pub fn duplicate_id_error(candidate: &str, already_taken: bool) -> Option<String> {
    already_taken.then(|| format!("Student ID: {candidate} is already taken"))
}

///The id gate for edits. Keeping the same id is never gated against itself;
///a rename must be well formed and free, and rejection happens before the
///update runs so the original row stays untouched.
pub fn rename_rejection(past_id: &str, candidate: &str, candidate_taken: bool) -> Option<String> {
    if candidate == past_id {
        return None;
    }
    if !valid_student_id(candidate) {
        return Some(INVALID_ID_FORMAT.to_string());
    }
    duplicate_id_error(candidate, candidate_taken)
}

#[derive(Clone, Debug, FromRow)]
pub struct Student {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub course_code: String,
    pub year: i32,
    pub gender: String,
    pub picture: Option<String>,
}

///The fields a student is written with. `id` must already have passed
///`valid_student_id` and the duplicate check.
pub struct StudentForm {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub course_code: String,
    pub year: i32,
    pub gender: String,
    pub picture: Option<String>,
}

const STUDENT_COLUMNS: &str = "id, firstname, lastname, course_code, year, gender, picture";

impl DataType for Student {
    type Id = String;

    async fn get_from_db_by_id(
        id: &Self::Id,
        conn: &mut PgConnection,
    ) -> SsisResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, firstname, lastname, course_code, year, gender, picture \
             FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context(MakeQuerySnafu)
    }

    async fn get_all(pool: &Pool<Postgres>) -> SsisResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, firstname, lastname, course_code, year, gender, picture \
             FROM students ORDER BY id",
        )
        .fetch_all(pool)
        .await
        .context(MakeQuerySnafu)
    }
}

impl Student {
    pub async fn exists(id: &str, conn: &mut PgConnection) -> SsisResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .context(MakeQuerySnafu)
    }

    pub async fn insert_into_database(
        form: StudentForm,
        conn: &mut PgConnection,
    ) -> SsisResult<()> {
        sqlx::query(
            "INSERT INTO students (id, firstname, lastname, course_code, year, gender, picture) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&form.id)
        .bind(&form.firstname)
        .bind(&form.lastname)
        .bind(&form.course_code)
        .bind(form.year)
        .bind(&form.gender)
        .bind(&form.picture)
        .execute(&mut *conn)
        .await
        .context(MakeQuerySnafu)?;
        Ok(())
    }

    ///Writes every field, including an identity rename when `form.id`
    ///differs from `past_id`. Callers gate renames on `exists` first.
    pub async fn update_in_database(
        past_id: &str,
        form: StudentForm,
        conn: &mut PgConnection,
    ) -> SsisResult<()> {
        sqlx::query(
            "UPDATE students SET id = $1, firstname = $2, lastname = $3, course_code = $4, \
             year = $5, gender = $6, picture = $7 WHERE id = $8",
        )
        .bind(&form.id)
        .bind(&form.firstname)
        .bind(&form.lastname)
        .bind(&form.course_code)
        .bind(form.year)
        .bind(&form.gender)
        .bind(&form.picture)
        .bind(past_id)
        .execute(&mut *conn)
        .await
        .context(MakeQuerySnafu)?;
        Ok(())
    }

    pub async fn remove_from_database(id: &str, conn: &mut PgConnection) -> SsisResult<()> {
        sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .context(MakeQuerySnafu)?;
        Ok(())
    }

    pub async fn get_page(pager: Pager, conn: &mut PgConnection) -> SsisResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, firstname, lastname, course_code, year, gender, picture \
             FROM students ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(pager.per_page())
        .bind(pager.offset())
        .fetch_all(&mut *conn)
        .await
        .context(MakeQuerySnafu)
    }

    pub async fn total_count(conn: &mut PgConnection) -> SsisResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(&mut *conn)
            .await
            .context(MakeQuerySnafu)
    }

    ///Substring search over whichever field the filter selects.
    pub async fn search(
        input: &str,
        filter: SearchFilter,
        conn: &mut PgConnection,
    ) -> SsisResult<Vec<Self>> {
        let sql = format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE {} ORDER BY id",
            filter.where_clause()
        );
        let pattern = format!("%{input}%");

        sqlx::query_as::<_, Self>(&sql)
            .bind(pattern)
            .fetch_all(&mut *conn)
            .await
            .context(MakeQuerySnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_ids_pass() {
        assert!(valid_student_id("2021-0042"));
        assert!(valid_student_id("0000-0000"));
        assert!(valid_student_id("9999-9999"));
    }

    #[test]
    fn malformed_ids_fail() {
        assert!(!valid_student_id(""));
        assert!(!valid_student_id("20210042"));
        assert!(!valid_student_id("2021-042"));
        assert!(!valid_student_id("2021-00422"));
        assert!(!valid_student_id("abcd-efgh"));
        assert!(!valid_student_id("2021_0042"));
        assert!(!valid_student_id("2021-00４2")); //fullwidth digit
        assert!(!valid_student_id(" 2021-0042"));
    }

    #[test]
    fn duplicate_ids_get_the_taken_message() {
        assert_eq!(
            duplicate_id_error("2021-0042", true).as_deref(),
            Some("Student ID: 2021-0042 is already taken")
        );
        assert_eq!(duplicate_id_error("2021-0042", false), None);
    }

    #[test]
    fn renames_to_a_taken_id_are_rejected() {
        assert_eq!(
            rename_rejection("2021-0001", "2021-0002", true).as_deref(),
            Some("Student ID: 2021-0002 is already taken")
        );
        assert_eq!(rename_rejection("2021-0001", "2021-0002", false), None);
    }

    #[test]
    fn keeping_the_same_id_is_never_gated() {
        assert_eq!(rename_rejection("2021-0001", "2021-0001", false), None);
        //even a stale lookup claiming the id is taken cannot block a no-op rename
        assert_eq!(rename_rejection("2021-0001", "2021-0001", true), None);
    }

    #[test]
    fn malformed_renames_fail_the_format_check_first() {
        assert_eq!(
            rename_rejection("2021-0001", "garbage", false).as_deref(),
            Some(INVALID_ID_FORMAT)
        );
    }
}
