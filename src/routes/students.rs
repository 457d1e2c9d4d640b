use crate::{
    data::{
        DataType,
        college::College,
        course::Course,
        student::{
            INVALID_ID_FORMAT, Student, StudentForm, duplicate_id_error, rename_rejection,
            valid_student_id,
        },
    },
    error::{MultipartSnafu, SsisResult},
    images::{MAX_PICTURE_BYTES, allowed_extension},
    maud_conveniences::{
        form_element, form_submit_button, script_alert_redirect, simple_form_element, subtitle,
        title,
    },
    pagination::Pager,
    state::SsisState,
};
use axum::{
    Form, Json,
    extract::{Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::collections::HashMap;

#[derive(Serialize)]
pub struct ErrorPayload {
    pub error: String,
}

#[derive(Serialize)]
pub struct RedirectPayload {
    pub redirect: &'static str,
}

fn json_error(error: impl Into<String>) -> Response {
    Json(ErrorPayload {
        error: error.into(),
    })
    .into_response()
}

///What came in over a student add/edit multipart form: the text fields by
///name, plus at most one picture.
pub struct StudentMultipart {
    text: HashMap<String, String>,
    picture: Option<PictureUpload>,
}

pub struct PictureUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl StudentMultipart {
    pub async fn read(mut multipart: Multipart) -> SsisResult<Self> {
        let mut text = HashMap::new();
        let mut picture = None;

        while let Some(field) = multipart.next_field().await.context(MultipartSnafu)? {
            let name = field.name().unwrap_or_default().to_string();
            if matches!(name.as_str(), "formFile" | "editFormFile") {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.context(MultipartSnafu)?;
                if !filename.trim().is_empty() {
                    picture = Some(PictureUpload {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                text.insert(name, field.text().await.context(MultipartSnafu)?);
            }
        }

        Ok(Self { text, picture })
    }

    pub fn take_text(&mut self, name: &str) -> String {
        self.text.remove(name).unwrap_or_default()
    }
}

///Gates a candidate picture, then ships it to the image host. `Err` is the
///JSON rejection to hand straight back; nothing local has been written yet.
async fn gate_and_upload(
    state: &SsisState,
    picture: &PictureUpload,
) -> Result<String, Response> {
    let Some(extension) = allowed_extension(&picture.filename) else {
        return Err(json_error("Image must be PNG, JPG, or JPEG"));
    };
    if picture.bytes.len() > MAX_PICTURE_BYTES {
        return Err(json_error("Max file size is 1MB"));
    }

    match state.images().upload(&picture.bytes, &extension).await {
        Ok(url) => Ok(url),
        Err(e) => Err(json_error(format!("Image upload failed: {e}"))),
    }
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

//the query string arrives as text so that `?page=abc` renders page 1
//instead of bouncing off the extractor
fn page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|page| page.trim().parse().ok()).unwrap_or(1)
}

#[axum::debug_handler]
pub async fn get_students(
    State(state): State<SsisState>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> SsisResult<Markup> {
    let colleges = College::get_all(&state).await?;
    let courses = Course::get_all(&state).await?;

    let pager = Pager::new(page_number(page.as_deref()));
    let mut conn = state.get_connection().await?;
    let students = Student::get_page(pager, &mut conn).await?;
    let total_pages = pager.total_pages(Student::total_count(&mut conn).await?);

    Ok(student_home(
        &state,
        &students,
        &courses,
        &colleges,
        Some((pager.page(), total_pages)),
        None,
    ))
}

pub async fn post_add_student(
    State(state): State<SsisState>,
    multipart: Multipart,
) -> SsisResult<Response> {
    let mut form = StudentMultipart::read(multipart).await?;

    let id = form.take_text("student_id").trim().to_string();
    if !valid_student_id(&id) {
        return Ok(json_error(INVALID_ID_FORMAT));
    }

    let mut conn = state.get_connection().await?;
    if let Some(error) = duplicate_id_error(&id, Student::exists(&id, &mut conn).await?) {
        return Ok(json_error(error));
    }

    let Ok(year) = form.take_text("student_year").trim().parse::<i32>() else {
        return Ok(json_error("Year must be a number"));
    };

    let picture = match &form.picture {
        Some(picture) => match gate_and_upload(&state, picture).await {
            Ok(url) => Some(url),
            Err(rejection) => return Ok(rejection),
        },
        None => None,
    };

    Student::insert_into_database(
        StudentForm {
            id: id.clone(),
            firstname: form.take_text("student_first_name"),
            lastname: form.take_text("student_last_name"),
            course_code: form.take_text("student_course_code"),
            year,
            gender: form.take_text("student_gender"),
            picture,
        },
        &mut conn,
    )
    .await?;

    info!(%id, "Added student");
    Ok(Json(RedirectPayload {
        redirect: "/student",
    })
    .into_response())
}

pub async fn post_edit_student(
    State(state): State<SsisState>,
    multipart: Multipart,
) -> SsisResult<Response> {
    let mut form = StudentMultipart::read(multipart).await?;

    let past_id = form.take_text("pastid");
    let id = form.take_text("edit_student_id").trim().to_string();

    let mut conn = state.get_connection().await?;
    let Some(student) = Student::get_from_db_by_id(&past_id, &mut conn).await? else {
        return Ok(json_error("Student not found"));
    };

    let candidate_taken = id != past_id && Student::exists(&id, &mut conn).await?;
    if let Some(error) = rename_rejection(&past_id, &id, candidate_taken) {
        return Ok(json_error(error));
    }

    let Ok(year) = form.take_text("edit_student_year").trim().parse::<i32>() else {
        return Ok(json_error("Year must be a number"));
    };

    //only replace the picture when a new one arrived - and only drop the old
    //hosted image once the replacement has passed the gate and gone up
    let picture = match &form.picture {
        Some(new_picture) => {
            let url = match gate_and_upload(&state, new_picture).await {
                Ok(url) => url,
                Err(rejection) => return Ok(rejection),
            };
            if let Some(old_url) = &student.picture {
                if let Err(e) = state.images().destroy(old_url).await {
                    warn!(?e, %past_id, "Unable to destroy replaced picture");
                }
            }
            Some(url)
        }
        None => student.picture.clone(),
    };

    Student::update_in_database(
        &past_id,
        StudentForm {
            id: id.clone(),
            firstname: form.take_text("edit_student_first_name"),
            lastname: form.take_text("edit_student_last_name"),
            course_code: form.take_text("edit_student_course_code"),
            year,
            gender: form.take_text("edit_student_gender"),
            picture,
        },
        &mut conn,
    )
    .await?;

    info!(%past_id, %id, "Edited student");
    Ok(Redirect::to("/student").into_response())
}

#[derive(Deserialize)]
pub struct DeleteForm {
    pub student_id: Option<String>,
}

///Everything here answers with a script-alert fragment, errors included -
///the browser alerts and bounces back to the list.
pub async fn post_delete_student(
    State(state): State<SsisState>,
    Form(DeleteForm { student_id }): Form<DeleteForm>,
) -> Markup {
    let Some(student_id) = student_id.filter(|id| !id.trim().is_empty()) else {
        return script_alert_redirect("Missing student ID", "/student");
    };

    match delete_student_inner(&state, &student_id).await {
        Ok(markup) => markup,
        Err(e) => script_alert_redirect(&format!("Error deleting student: {e}"), "/student"),
    }
}

async fn delete_student_inner(state: &SsisState, student_id: &str) -> SsisResult<Markup> {
    let mut conn = state.get_connection().await?;

    let Some(student) = Student::get_from_db_by_id(&student_id.to_string(), &mut conn).await?
    else {
        return Ok(script_alert_redirect("Student not found", "/student"));
    };

    if let Some(picture) = &student.picture {
        state.images().destroy(picture).await?;
    }

    Student::remove_from_database(&student.id, &mut conn).await?;

    info!(id = %student.id, "Deleted student");
    Ok(script_alert_redirect(
        "Successfully deleted student",
        "/student",
    ))
}

///Context for rendering the home page in search mode.
pub struct SearchDisplay<'a> {
    pub input: &'a str,
    pub empty_label: Option<&'static str>,
}

//the add/edit forms get JSON back, so a small shim follows the redirect or
//alerts the error the way the endpoints expect
const FORM_SHIM: &str = r"
async function submitStudentForm(event) {
    event.preventDefault();
    const form = event.target;
    const response = await fetch(form.action, { method: 'POST', body: new FormData(form) });
    if (response.redirected) { window.location.href = response.url; return; }
    const payload = await response.json().catch(() => null);
    if (payload && payload.error) { alert(payload.error); }
    else if (payload && payload.redirect) { window.location.href = payload.redirect; }
}";

pub fn student_home(
    state: &SsisState,
    students: &[Student],
    courses: &[Course],
    colleges: &[College],
    pagination: Option<(i64, i64)>,
    search: Option<&SearchDisplay<'_>>,
) -> Markup {
    let searching = search.is_some();
    let empty_label = search.and_then(|display| display.empty_label);

    state.render(html! {
        script {(PreEscaped(FORM_SHIM))}
        div class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-6xl w-full flex flex-col space-y-8" {
            (title("Students"))

            (search_bar(search.map(|display| display.input)))

            @if let Some(label) = empty_label {
                div class="bg-yellow-100 border border-yellow-400 text-yellow-800 px-4 py-3 rounded" {
                    "No students found. Searched by: " strong {(label)}
                }
            } @else {
                (students_table(students, courses, colleges))
            }

            @if let Some((page, total_pages)) = pagination {
                (pagination_nav(page, total_pages))
            }

            @if !searching {
                (add_student_form(courses))
            }
        }
    })
}

fn search_bar(current_input: Option<&str>) -> Markup {
    html! {
        form action="/student/search" method="get" class="flex flex-row items-end space-x-4" {
            div class="flex-grow" {
                label for="querystudent" class="block text-sm font-medium text-gray-400 mb-2" {"Search"}
                input type="text" name="querystudent" id="querystudent" value=[current_input] class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight bg-gray-700 border-gray-600";
            }
            div {
                label for="filter_student" class="block text-sm font-medium text-gray-400 mb-2" {"Search by"}
                select name="filter_student" id="filter_student" class="shadow border rounded py-2 px-3 bg-gray-700 border-gray-600" {
                    option value="0" {"All fields"}
                    option value="1" {"ID"}
                    option value="2" {"First Name"}
                    option value="3" {"Last Name"}
                    option value="4" {"Course"}
                    option value="5" {"Year"}
                    option value="6" {"Gender"}
                    option value="7" {"College"}
                }
            }
            button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded" {"Search"}
        }
    }
}

fn course_label(courses: &[Course], code: &str) -> String {
    courses
        .iter()
        .find(|course| course.code == code)
        .map_or_else(|| code.to_string(), |course| course.name.clone())
}

fn college_label(courses: &[Course], colleges: &[College], course_code: &str) -> String {
    let Some(course) = courses.iter().find(|course| course.code == course_code) else {
        return String::new();
    };
    colleges
        .iter()
        .find(|college| college.code == course.college_code)
        .map_or_else(|| course.college_code.clone(), |college| college.name.clone())
}

fn students_table(students: &[Student], courses: &[Course], colleges: &[College]) -> Markup {
    html! {
        div class="overflow-x-auto" {
            table class="min-w-full bg-gray-800 rounded shadow-md" {
                thead class="bg-gray-700" {
                    tr {
                        @for heading in ["Picture", "ID", "First Name", "Last Name", "Course", "College", "Year", "Gender", ""] {
                            th class="py-2 px-4 text-left font-semibold text-gray-300" {(heading)}
                        }
                    }
                }
                tbody {
                    @for student in students {
                        tr {
                            td class="py-2 px-4 border-b border-gray-600" {
                                @if let Some(picture) = &student.picture {
                                    img src=(picture) alt="profile picture" class="h-10 w-10 rounded-full object-cover";
                                } @else {
                                    span class="text-gray-500" {"none"}
                                }
                            }
                            td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(student.id)}
                            td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(student.firstname)}
                            td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(student.lastname)}
                            td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(course_label(courses, &student.course_code))}
                            td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(college_label(courses, colleges, &student.course_code))}
                            td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(student.year)}
                            td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(student.gender)}
                            td class="py-2 px-4 border-b border-gray-600" {
                                div class="flex flex-row space-x-2" {
                                    details {
                                        summary class="cursor-pointer text-blue-400 hover:text-blue-300" {"Edit"}
                                        (edit_student_form(student, courses))
                                    }
                                    form action="/student/delete" method="post" {
                                        input type="hidden" name="student_id" value=(student.id);
                                        button type="submit" class="text-red-400 hover:text-red-300" {"Delete"}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn pagination_nav(page: i64, total_pages: i64) -> Markup {
    html! {
        div class="flex flex-row items-center justify-center space-x-4" {
            @if page > 1 {
                a href={"/student?page=" ((page - 1))} class="bg-gray-700 hover:bg-gray-600 py-2 px-4 rounded" {"Previous"}
            }
            span class="text-gray-300" {"Page " (page) " of " (total_pages.max(1))}
            @if page < total_pages {
                a href={"/student?page=" ((page + 1))} class="bg-gray-700 hover:bg-gray-600 py-2 px-4 rounded" {"Next"}
            }
        }
    }
}

fn course_select(name: &str, courses: &[Course], selected: Option<&str>) -> Markup {
    form_element(name, "Course", html! {
        select id=(name) name=(name) class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight bg-gray-700 border-gray-600" {
            @for course in courses {
                option value=(course.code) selected[selected == Some(course.code.as_str())] {(course.code) " - " (course.name)}
            }
        }
    })
}

fn gender_select(name: &str, selected: Option<&str>) -> Markup {
    form_element(name, "Gender", html! {
        select id=(name) name=(name) class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight bg-gray-700 border-gray-600" {
            @for gender in ["Male", "Female", "Other"] {
                option value=(gender) selected[selected == Some(gender)] {(gender)}
            }
        }
    })
}

fn add_student_form(courses: &[Course]) -> Markup {
    html! {
        div {
            (subtitle("Add New Student"))
            form action="/student/add" method="post" enctype="multipart/form-data" onsubmit="submitStudentForm(event)" class="p-4 bg-gray-700 rounded" {
                (simple_form_element("student_id", "Student ID (xxxx-xxxx)", true, None, None))
                (simple_form_element("student_first_name", "First Name", true, None, None))
                (simple_form_element("student_last_name", "Last Name", true, None, None))
                (course_select("student_course_code", courses, None))
                (simple_form_element("student_year", "Year", true, Some("number"), None))
                (gender_select("student_gender", None))
                (form_element("formFile", "Profile Picture (optional, max 1MB)", html! {
                    input type="file" name="formFile" id="formFile" accept=".png,.jpg,.jpeg" class="block w-full text-sm text-gray-300 mb-4";
                }))
                (form_submit_button("Add Student"))
            }
        }
    }
}

fn edit_student_form(student: &Student, courses: &[Course]) -> Markup {
    let year = student.year.to_string();
    html! {
        form action="/student/edit" method="post" enctype="multipart/form-data" onsubmit="submitStudentForm(event)" class="p-4 bg-gray-700 rounded w-64" {
            input type="hidden" name="pastid" value=(student.id);
            (simple_form_element("edit_student_id", "Student ID", true, None, Some(&student.id)))
            (simple_form_element("edit_student_first_name", "First Name", true, None, Some(&student.firstname)))
            (simple_form_element("edit_student_last_name", "Last Name", true, None, Some(&student.lastname)))
            (course_select("edit_student_course_code", courses, Some(&student.course_code)))
            (simple_form_element("edit_student_year", "Year", true, Some("number"), Some(&year)))
            (gender_select("edit_student_gender", Some(&student.gender)))
            (form_element("editFormFile", "Replace Picture", html! {
                input type="file" name="editFormFile" id="editFormFile" accept=".png,.jpg,.jpeg" class="block w-full text-sm text-gray-300 mb-4";
            }))
            (form_submit_button("Save"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_numbers_parse_leniently() {
        assert_eq!(page_number(None), 1);
        assert_eq!(page_number(Some("3")), 3);
        assert_eq!(page_number(Some(" 2 ")), 2);
        assert_eq!(page_number(Some("abc")), 1);
        assert_eq!(page_number(Some("")), 1);
        assert_eq!(page_number(Some("2.5")), 1);
    }
}
