use maud::{Markup, PreEscaped, Render, html};

pub fn render_nav() -> Markup {
    html! {
        nav class="w-full bg-gray-800 shadow-md mb-8" {
            div class="container mx-auto flex flex-row items-center justify-between py-3 px-4" {
                a href="/student" class="text-xl font-bold text-pink-400" {"SSIS"}
                div class="flex flex-row space-x-4" {
                    a href="/student" class="text-gray-300 hover:text-white px-3 py-2 rounded-md text-sm font-medium" {"Students"}
                }
            }
        }
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-2xl font-semibold mb-4" {(s)}
    }
}

pub fn subtitle(s: impl Render) -> Markup {
    html! {
        h2 class="text-xl font-semibold mb-4" {(s)}
    }
}

pub fn form_element(id: &str, label: &str, interior: Markup) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class="block text-sm font-medium text-gray-400 mb-2" {(label)}
            (interior)
        }
    }
}

pub fn simple_form_element(
    id: &str,
    label: &str,
    required: bool,
    ty: Option<&str>,
    value: Option<&str>,
) -> Markup {
    form_element(
        id,
        label,
        html! {
            input type=(ty.unwrap_or("text")) name=(id) id=(id) required[required] value=[value] class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600";
        },
    )
}

pub fn form_submit_button(text: &str) -> Markup {
    html! {
        div class="flex items-center justify-between" {
            button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                (text)
            }
        }
    }
}

///The delete path answers with these presentation-coupled fragments rather
///than proper status codes, so the browser alerts and bounces back to the
///list whatever happened.
pub fn script_alert_redirect(message: &str, location: &str) -> Markup {
    PreEscaped(format!(
        "<script>alert('{}'); window.location.href = '{location}';</script>",
        escape_js(message)
    ))
}

//quotes, newlines and `</script>` would all break out of the alert literal
fn escape_js(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '<' => out.push_str("\\x3c"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_escaping_keeps_alerts_intact() {
        assert_eq!(escape_js("plain"), "plain");
        assert_eq!(escape_js("it's"), "it\\'s");
        assert_eq!(escape_js("a\\b"), "a\\\\b");
        assert_eq!(escape_js("two\nlines"), "two\\nlines");
        assert_eq!(escape_js("</script>"), "\\x3c/script>");
    }

    #[test]
    fn alert_fragment_contains_the_redirect() {
        let markup = script_alert_redirect("Successfully deleted student", "/student");
        let rendered = markup.into_string();
        assert!(rendered.contains("alert('Successfully deleted student')"));
        assert!(rendered.contains("window.location.href = '/student'"));
    }
}
