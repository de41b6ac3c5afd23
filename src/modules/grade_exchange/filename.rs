//! Download filename for exported templates.

/// `Template_Nilai_<Subject>_<Class>_<Term>_<Year>.xlsx`
///
/// Every part is reduced to ASCII letters, digits, `_` and `-`, with runs of
/// spaces and underscores turned into a single underscore. Tabs and other
/// whitespace are stripped. A `/` in the academic year
/// (`2024/2025`) becomes `-`.
pub fn compose_filename(subject: &str, class: &str, term_label: &str, academic_year: &str) -> String {
    format!(
        "Template_Nilai_{}_{}_{}_{}.xlsx",
        sanitize(subject),
        sanitize(class),
        sanitize(term_label),
        sanitize(&academic_year.replace('/', "-")),
    )
}

fn sanitize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut pending_sep = false;

    for ch in part.trim().chars() {
        if ch == ' ' || ch == '_' {
            pending_sep = !out.is_empty();
            continue;
        }
        if !(ch.is_ascii_alphanumeric() || ch == '-') {
            continue;
        }
        if pending_sep {
            out.push('_');
            pending_sep = false;
        }
        out.push(ch);
    }

    if out.is_empty() {
        "-".to_string()
    } else {
        out
    }
}
