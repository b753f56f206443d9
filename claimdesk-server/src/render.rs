//! Server-side HTML for the login form and the protected page
//!
//! Both tables sit in one form: one text input per cell, named
//! `cell.{table}.{row}.{column}`. Each table's save button posts the whole form
//! to `/protected/{table}`, so edits in the other table reach the draft too.

use std::fmt::Write as _;

use claimdesk_core::cell::display_text;
use claimdesk_core::{Table, TableName, TableSet, User};

/// Static message shown when the tables cannot be fetched
pub const FETCH_ERROR_MESSAGE: &str = "Could not load data. Please try again later.";

const BANNER: &str = "This is a protected page that you can only see as an authenticated user";

const STYLE: &str = r#"
  body { font-family: system-ui, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
  .banner { padding: 1.5rem; font-weight: 700; background: #3b0764; color: #fff; text-align: center; }
  nav { display: flex; justify-content: flex-end; gap: 1rem; align-items: center; max-width: 56rem; margin: 0 auto; padding: .75rem; font-size: .875rem; }
  main { max-width: 56rem; margin: 0 auto; padding: 0 .75rem 3rem; }
  h2 { font-size: 2.25rem; margin: 2.5rem 0 1rem; }
  .grid { overflow-x: auto; }
  table { min-width: 100%; border-collapse: collapse; background: #fff; }
  th { padding: .75rem 1.5rem; background: #f9fafb; text-align: left; font-size: .75rem; color: #6b7280; text-transform: uppercase; letter-spacing: .05em; }
  td { padding: 1rem 1.5rem; white-space: nowrap; font-size: .875rem; color: #6b7280; border-top: 1px solid #e5e7eb; }
  td input { width: 100%; padding: .25rem .5rem; border: 1px solid #d1d5db; border-radius: .25rem; }
  button { margin-top: 1rem; padding: .5rem; background: #3b82f6; color: #fff; border: 0; cursor: pointer; }
  .error { color: #b91c1c; }
"#;

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Form field name of one cell
pub fn cell_field_name(table: TableName, index: usize, column: &str) -> String {
    format!("cell.{}.{}.{}", table, index, column)
}

/// Inverse of [`cell_field_name`]. Column names may themselves contain dots.
pub fn parse_cell_field(name: &str) -> Option<(TableName, usize, &str)> {
    let rest = name.strip_prefix("cell.")?;
    let (table, rest) = rest.split_once('.')?;
    let (index, column) = rest.split_once('.')?;
    if column.is_empty() {
        return None;
    }
    Some((table.parse().ok()?, index.parse().ok()?, column))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        body = body,
    )
}

pub fn login_page(error: Option<&str>) -> String {
    let message = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();
    let body = format!(
        r#"<main>
<h2>Sign in</h2>
{message}
<form method="post" action="/login">
<p><label>Email <input type="email" name="email" required></label></p>
<p><label>Password <input type="password" name="password" required></label></p>
<button type="submit">Sign In</button>
</form>
</main>"#
    );
    layout("Sign in", &body)
}

fn header(user: &User) -> String {
    let who = user.email.as_deref().unwrap_or(&user.id);
    format!(
        r#"<div class="banner">{banner}</div>
<nav>
<span>Hey, {who}!</span>
<form method="post" action="/logout"><button type="submit">Logout</button></form>
</nav>"#,
        banner = BANNER,
        who = escape_html(who),
    )
}

/// One table as an editable grid with its save button (no `<form>` of its own).
pub fn editable_table(table: &Table) -> String {
    let mut html = String::new();
    let name = table.name.as_str();

    let _ = writeln!(html, r#"<h2>{}</h2>"#, table.name.heading());
    let _ = writeln!(html, r#"<div class="grid" data-table="{name}">"#);
    html.push_str("<table>\n<thead>\n<tr>");
    for column in table.columns() {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for (index, row) in table.rows.iter().enumerate() {
        let _ = write!(
            html,
            r#"<tr data-row-key="{}">"#,
            escape_html(&table.row_key(index))
        );
        // Each row renders its own keys, not the header's
        for (column, value) in row.cells() {
            let _ = write!(
                html,
                r#"<td><input type="text" name="{}" value="{}"></td>"#,
                escape_html(&cell_field_name(table.name, index, column)),
                escape_html(&display_text(value)),
            );
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</div>\n");
    let _ = writeln!(
        html,
        r#"<button type="submit" formaction="/protected/{name}">{}</button>"#,
        table.name.save_label()
    );
    html
}

/// The protected page with both tables.
pub fn protected_page(user: &User, tables: &TableSet) -> String {
    let mut body = header(user);
    body.push_str("\n<main>\n");
    // Enter in a field submits with the first button
    let _ = writeln!(
        body,
        r#"<form method="post" action="/protected/{}">"#,
        TableName::ALL[0]
    );
    for table in tables.iter() {
        body.push_str(&editable_table(table));
    }
    body.push_str("</form>\n</main>");
    layout("Protected", &body)
}

/// Static page shown when fetching fails.
pub fn fetch_error_page(user: &User) -> String {
    let body = format!(
        "{}\n<main>\n<p class=\"error\">{}</p>\n</main>",
        header(user),
        FETCH_ERROR_MESSAGE
    );
    layout("Protected", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimdesk_core::TableName;
    use serde_json::json;

    fn user() -> User {
        User {
            id: "u1".into(),
            email: Some("ada@example.com".into()),
        }
    }

    fn claims() -> Table {
        Table::new(
            TableName::Claims,
            serde_json::from_value(json!([
                {"id": 1, "title": "Roof", "amount": 1200},
                {"id": 2, "title": "Car", "amount": null}
            ]))
            .unwrap(),
        )
    }

    #[test]
    fn one_input_per_column_per_row() {
        let html = editable_table(&claims());
        assert_eq!(html.matches("<input").count(), 6);
        assert_eq!(html.matches("<th>").count(), 3);
        assert!(html.contains(r#"name="cell.claims.1.amount" value="""#));
        assert!(html.contains(r#"<tr data-row-key="2">"#));
        assert!(html.contains(r#"formaction="/protected/claims">Save Claims</button>"#));
        assert!(!html.contains("<form"));
    }

    #[test]
    fn empty_table_has_no_columns() {
        let html = editable_table(&Table::empty(TableName::UserProfiles));
        assert!(!html.contains("<th>"));
        assert!(!html.contains("<input"));
        assert!(html.contains("User Profiles Data"));
    }

    #[test]
    fn values_are_escaped() {
        let table = Table::new(
            TableName::Claims,
            serde_json::from_value(json!([{"id": 1, "note": "<b>\"hi\"</b> & bye"}])).unwrap(),
        );
        let html = editable_table(&table);
        assert!(html.contains("&lt;b&gt;&quot;hi&quot;&lt;/b&gt; &amp; bye"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn field_names_round_trip_with_dotted_columns() {
        let name = cell_field_name(TableName::UserProfiles, 3, "address.city");
        assert_eq!(name, "cell.user_profiles.3.address.city");
        assert_eq!(
            parse_cell_field(&name),
            Some((TableName::UserProfiles, 3, "address.city"))
        );
        assert_eq!(parse_cell_field("email"), None);
        assert_eq!(parse_cell_field("cell.claims.x.title"), None);
        assert_eq!(parse_cell_field("cell.claims.1."), None);
        assert_eq!(parse_cell_field("cell.invoices.1.title"), None);
    }

    #[test]
    fn protected_page_has_both_tables_and_logout() {
        let tables = TableSet {
            claims: claims(),
            user_profiles: Table::empty(TableName::UserProfiles),
        };
        let html = protected_page(&user(), &tables);
        assert!(html.contains(BANNER));
        assert!(html.contains("Hey, ada@example.com!"));
        // one form for both tables, plus the logout form
        assert_eq!(html.matches("<form").count(), 2);
        assert!(html.contains(r#"formaction="/protected/claims""#));
        assert!(html.contains(r#"formaction="/protected/user_profiles""#));
        assert!(html.contains(r#"action="/logout""#));
    }

    #[test]
    fn login_page_shows_error() {
        assert!(login_page(Some("Invalid <login>")).contains("Invalid &lt;login&gt;"));
        assert!(!login_page(None).contains("class=\"error\""));
    }
}
