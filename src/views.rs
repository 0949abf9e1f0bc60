use crate::models::{Expense, Group, User};
use crate::session::Session;

// --- Group Table Rows ---

/// GroupRow
///
/// View-local wrapper pairing a Group with a display-visibility flag. Filtering
/// toggles `hidden` rather than removing rows, so clearing the filter term
/// restores the full table with no row lost or reordered. Recomputed on every
/// request; never persisted.
#[derive(Debug, Clone)]
pub struct GroupRow {
    pub group: Group,
    pub hidden: bool,
}

/// build_rows
///
/// Wraps a fetched group list into table rows, all visible initially.
pub fn build_rows(groups: Vec<Group>) -> Vec<GroupRow> {
    groups
        .into_iter()
        .map(|group| GroupRow {
            group,
            hidden: false,
        })
        .collect()
}

/// sort_by_owner
///
/// Orders rows by the owning user's full name. Case-insensitive, like the
/// name sort, since owner names are display strings.
pub fn sort_by_owner(rows: &mut [GroupRow]) {
    // Vec::sort_by is stable: rows with equal keys keep their relative order.
    rows.sort_by(|a, b| {
        a.group
            .author
            .full_name()
            .to_lowercase()
            .cmp(&b.group.author.full_name().to_lowercase())
    });
}

/// sort_by_name
///
/// Orders rows by group name, case-insensitively. Stable for equal keys and
/// idempotent under re-application.
pub fn sort_by_name(rows: &mut [GroupRow]) {
    rows.sort_by(|a, b| {
        a.group
            .name
            .to_lowercase()
            .cmp(&b.group.name.to_lowercase())
    });
}

/// sort_by_date
///
/// Orders rows strictly by the parsed creation timestamp, ascending or
/// descending.
pub fn sort_by_date(rows: &mut [GroupRow], ascending: bool) {
    rows.sort_by(|a, b| {
        let ordering = a.group.created_date.cmp(&b.group.created_date);
        if ascending { ordering } else { ordering.reverse() }
    });
}

/// apply_sort
///
/// Dispatches the sort-key query parameter to the matching sort operation.
/// Unknown or absent keys leave the upstream order untouched.
pub fn apply_sort(rows: &mut [GroupRow], key: Option<&str>) {
    match key {
        Some("owner") => sort_by_owner(rows),
        Some("name") => sort_by_name(rows),
        Some("date_asc") => sort_by_date(rows, true),
        Some("date_desc") => sort_by_date(rows, false),
        _ => {}
    }
}

/// apply_filter
///
/// Case-insensitive substring match on the group name. Non-matching rows are
/// flagged hidden; matching rows (and every row, when the term is empty) are
/// flagged visible. Row order is never changed by filtering.
pub fn apply_filter(rows: &mut [GroupRow], term: &str) {
    let needle = term.to_lowercase();
    for row in rows.iter_mut() {
        row.hidden = !needle.is_empty() && !row.group.name.to_lowercase().contains(&needle);
    }
}

// --- Group Metrics ---

/// GroupMetrics
///
/// The spending aggregation shown on the group detail page, computed from the
/// group's expense and member lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupMetrics {
    pub total_spending: f64,
    pub average_per_member: f64,
    /// Full name of the member who paid the most; None when the group has no
    /// expenses yet.
    pub top_spender: Option<String>,
}

/// compute_metrics
///
/// Aggregates a group's expenses: total spending is the sum of all prices,
/// the average divides the total across the member list (zero when the member
/// list is empty), and the top spender is the author with the largest summed
/// spend. A top spender not present in the member list is labelled by ID.
pub fn compute_metrics(expenses: &[Expense], members: &[User]) -> GroupMetrics {
    let total_spending: f64 = expenses.iter().map(|expense| expense.price).sum();

    let average_per_member = if members.is_empty() {
        0.0
    } else {
        total_spending / members.len() as f64
    };

    let mut spend_by_author: Vec<(i64, f64)> = Vec::new();
    for expense in expenses {
        match spend_by_author
            .iter_mut()
            .find(|(author_id, _)| *author_id == expense.author_id)
        {
            Some((_, spent)) => *spent += expense.price,
            None => spend_by_author.push((expense.author_id, expense.price)),
        }
    }

    let top_spender = spend_by_author
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(author_id, _)| {
            members
                .iter()
                .find(|member| member.id == *author_id)
                .map(|member| member.full_name())
                .unwrap_or_else(|| format!("User #{}", author_id))
        });

    GroupMetrics {
        total_spending,
        average_per_member,
        top_spender,
    }
}

// --- Page Rendering ---

/// escape_html
///
/// Utility function to neutralize markup in user-provided strings (group
/// names, user names) before they are interpolated into a page body.
pub fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// layout
///
/// The shared document shell. Styling is deliberately minimal: this portal is
/// a data view, not a design system.
fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>",
        escape_html(title),
        body
    )
}

/// navigation_bar
///
/// Pure display of the current user's first name from the session; no
/// independent state. Rendered on every page behind the login screen.
fn navigation_bar(session: &Session) -> String {
    let first_name = session
        .user
        .as_ref()
        .map(|user| escape_html(&user.first_name))
        .unwrap_or_default();
    format!(
        "<div id=\"nav\"><a href=\"/home\" id=\"logo\">Split</a><h3 class=\"nav-text\">Hi, {}</h3></div>",
        first_name
    )
}

/// login_page
///
/// The credential form. Submission posts back to the portal, which forwards
/// the credentials to the remote token endpoint.
pub fn login_page() -> String {
    let body = "<h1 class=\"auth-title\">Login</h1>\n\
        <form method=\"post\" action=\"/login\" class=\"input-wrapper\">\n\
        <label class=\"auth-label\">Username</label>\n\
        <input class=\"auth-text-input\" type=\"text\" name=\"username\">\n\
        <label class=\"auth-label\">Password</label>\n\
        <input class=\"auth-text-input\" type=\"password\" name=\"password\">\n\
        <input type=\"submit\" class=\"submit\" value=\"Log In\">\n\
        </form>";
    layout("Login", body)
}

/// home_page
///
/// The groups table. Sort links and the filter form reload the page with the
/// corresponding query parameters; hidden rows stay in the document with the
/// `hidden` attribute set, mirroring the flag on GroupRow.
pub fn home_page(session: &Session, rows: &[GroupRow], filter_term: &str) -> String {
    let mut table = String::from(
        "<table id=\"groups\">\n<tr>\
         <th><a href=\"/home?sort=owner\">Owner</a></th>\
         <th><a href=\"/home?sort=name\">Name</a></th>\
         <th><a href=\"/home?sort=date_asc\">Created &#9650;</a> \
         <a href=\"/home?sort=date_desc\">&#9660;</a></th>\
         </tr>\n",
    );
    for row in rows {
        let hidden_attr = if row.hidden { " hidden" } else { "" };
        table.push_str(&format!(
            "<tr class=\"group-row\"{} data-group-id=\"{}\">\
             <td>{}</td>\
             <td><a href=\"/groups/{}\">{}</a></td>\
             <td>{}</td>\
             </tr>\n",
            hidden_attr,
            row.group.id,
            escape_html(&row.group.author.full_name()),
            row.group.id,
            escape_html(&row.group.name),
            row.group.created_date.format("%Y-%m-%d"),
        ));
    }
    table.push_str("</table>");

    let body = format!(
        "{}\n<h1 class=\"header\">Groups</h1>\n\
         <form method=\"get\" action=\"/home\">\
         <input type=\"text\" name=\"filter\" value=\"{}\" placeholder=\"Filter by name\">\
         <input type=\"submit\" value=\"Filter\">\
         </form>\n{}\n\
         <a class=\"btn\" href=\"/groups/create\">Create Group</a>",
        navigation_bar(session),
        escape_html(filter_term),
        table
    );
    layout("Groups", &body)
}

/// create_group_page
///
/// The group creation form with the member multi-select. The fixed error
/// message is rendered only when the display flag is set by the handler.
pub fn create_group_page(session: &Session, users: &[User], display_error: bool) -> String {
    let mut options = String::new();
    for user in users {
        options.push_str(&format!(
            "<option value=\"{}\">{}</option>\n",
            user.id,
            escape_html(&user.full_name())
        ));
    }

    let error = if display_error {
        "<p class=\"msg-error\">Error creating group. Please try again.</p>"
    } else {
        ""
    };

    let body = format!(
        "{}\n<h1 class=\"header\">Create Group</h1>\n\
         <form method=\"post\" action=\"/groups/create\">\n\
         <label class=\"form-label\">Name</label>\n\
         <input type=\"text\" class=\"form-input-text\" name=\"name\">\n\
         <label class=\"form-label\">Add Members</label>\n\
         <select name=\"members\" multiple>\n{}</select>\n\
         <input type=\"submit\" class=\"btn btn-create\" value=\"Create\">\n\
         </form>\n{}",
        navigation_bar(session),
        options,
        error
    );
    layout("Create Group", &body)
}

/// metric_container
///
/// One titled metric box on the group detail page.
fn metric_container(title: &str, value: &str) -> String {
    format!(
        "<div class=\"metrics-container\"><h3>{}</h3><h4>{}</h4></div>",
        title,
        escape_html(value)
    )
}

/// group_page
///
/// The group detail view: the group's name plus its three spending metrics.
/// When the expense or member fetch failed, `metrics` is None and the values
/// render blanked rather than failing the page.
pub fn group_page(session: &Session, group: &Group, metrics: Option<&GroupMetrics>) -> String {
    let (total, average, top) = match metrics {
        Some(m) => (
            format!("${:.2}", m.total_spending),
            format!("${:.2}", m.average_per_member),
            m.top_spender.clone().unwrap_or_else(|| "—".to_string()),
        ),
        None => ("—".to_string(), "—".to_string(), "—".to_string()),
    };

    let body = format!(
        "{}\n<h1 class=\"header\">{}</h1>\n<div class=\"metrics-wrapper\">\n{}\n{}\n{}\n</div>",
        navigation_bar(session),
        escape_html(&group.name),
        metric_container("Total Spending", &total),
        metric_container("Average Spend Per Person", &average),
        metric_container("Top Spender", &top),
    );
    layout(&group.name, &body)
}

/// not_found_page
///
/// Static page for unknown routes and unparseable group IDs.
pub fn not_found_page() -> String {
    layout("Page Not Found", "<h1>Page Not Found</h1>")
}
