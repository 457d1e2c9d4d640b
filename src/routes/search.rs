use crate::{
    data::{DataType, college::College, course::Course, student::Student},
    error::SsisResult,
    routes::students::{SearchDisplay, student_home},
    search::SearchFilter,
    state::SsisState,
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub querystudent: Option<String>,
    pub filter_student: Option<String>,
}

///Search results reuse the home page, with the add form hidden and an
///empty-state message naming the searched field when nothing matched.
pub async fn search_students(
    State(state): State<SsisState>,
    Query(SearchQuery {
        querystudent,
        filter_student,
    }): Query<SearchQuery>,
) -> SsisResult<Response> {
    let Some(input) = querystudent.filter(|input| !input.trim().is_empty()) else {
        return Ok(Redirect::to("/student").into_response());
    };

    let filter = SearchFilter::from_code(filter_student.as_deref().unwrap_or("0"));

    let colleges = College::get_all(&state).await?;
    let courses = Course::get_all(&state).await?;

    let mut conn = state.get_connection().await?;
    let students = Student::search(&input, filter, &mut conn).await?;

    debug!(%input, ?filter, hits = students.len(), "Student search");

    let display = SearchDisplay {
        input: &input,
        empty_label: students.is_empty().then(|| filter.label()),
    };

    Ok(student_home(&state, &students, &courses, &colleges, None, Some(&display)).into_response())
}
