//! Notification report rendering
//!
//! Renders a run's audit rows into an HTML table and substitutes it into a
//! per-tenant handlebars template. Templates reference `{{run_date}}`,
//! `{{run_id}}` and `{{{table}}}` (triple-stash, the table is already HTML).

use handlebars::Handlebars;
use offboard_domain::{AuditEntry, OffboardError, Result};
use serde_json::json;
use uuid::Uuid;

pub(crate) const DEFAULT_SUBJECT_TEMPLATE: &str =
    "[EC Termination] Run report - {{run_date}}";

pub(crate) const DEFAULT_BODY_TEMPLATE: &str = r#"<html><body>
<p>Employee Central separation run <b>{{run_id}}</b> - {{run_date}}</p>
{{{table}}}
</body></html>"#;

/// Render the subject line for one notification.
pub(crate) fn render_subject(template: &str, run_date: &str) -> Result<String> {
    render(template, &json!({ "run_date": run_date }))
}

/// Render the HTML body for one notification.
pub(crate) fn render_body(
    template: &str,
    run_date: &str,
    run_id: Uuid,
    table: &str,
) -> Result<String> {
    render(
        template,
        &json!({
            "run_date": run_date,
            "run_id": run_id.to_string(),
            "table": table,
        }),
    )
}

fn render(template: &str, data: &serde_json::Value) -> Result<String> {
    Handlebars::new()
        .render_template(template, data)
        .map_err(|err| OffboardError::Notify(format!("template rendering failed: {err}")))
}

/// Render audit rows as an HTML table; failure rows are highlighted.
pub(crate) fn render_table(entries: &[AuditEntry]) -> String {
    let mut html = String::from("<table border='1' cellpadding='5' cellspacing='0'>");
    html.push_str(
        "<tr><th>DAS ID</th><th>Status</th><th>Message</th><th>Details</th>\
         <th>Started</th><th>Ended</th></tr>",
    );

    for entry in entries {
        if entry.success {
            html.push_str("<tr>");
        } else {
            html.push_str("<tr style='color:red;'>");
        }

        let status = if entry.success { "Success" } else { "Failure" };
        let cells = [
            entry.subject_id.as_str(),
            status,
            entry.error_message.as_deref().unwrap_or(""),
            entry.error_details.as_deref().unwrap_or(""),
        ];
        for cell in cells {
            html.push_str("<td>");
            html.push_str(&handlebars::html_escape(cell));
            html.push_str("</td>");
        }
        for timestamp in [entry.started_at, entry.ended_at] {
            html.push_str("<td>");
            html.push_str(&timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
            html.push_str("</td>");
        }

        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use offboard_domain::Escalation;

    use super::*;

    fn entries() -> Vec<AuditEntry> {
        let run_id = Uuid::new_v4();
        vec![
            AuditEntry::success("acme", run_id, "jdoe", Utc::now()),
            AuditEntry::failure(
                "acme",
                run_id,
                "ghost",
                Utc::now(),
                Escalation::Hr,
                "userId element not found",
            ),
        ]
    }

    #[test]
    fn table_highlights_failures() {
        let table = render_table(&entries());

        assert!(table.contains("<td>jdoe</td>"));
        assert!(table.contains("<td>Success</td>"));
        assert!(table.contains("<tr style='color:red;'>"));
        assert!(table.contains("userId element not found"));
    }

    #[test]
    fn table_escapes_cell_content() {
        let run_id = Uuid::new_v4();
        let entry = AuditEntry::failure(
            "acme",
            run_id,
            "jdoe",
            Utc::now(),
            Escalation::Hr,
            "<script>alert(1)</script>",
        );

        let table = render_table(&[entry]);
        assert!(!table.contains("<script>"));
        assert!(table.contains("&lt;script&gt;"));
    }

    #[test]
    fn body_template_substitutes_placeholders() {
        let run_id = Uuid::new_v4();
        let body = render_body(DEFAULT_BODY_TEMPLATE, "06-Aug-2026 10:00:00", run_id, "<table/>")
            .expect("rendered body");

        assert!(body.contains(&run_id.to_string()));
        assert!(body.contains("06-Aug-2026 10:00:00"));
        // triple-stash keeps the table unescaped
        assert!(body.contains("<table/>"));
    }

    #[test]
    fn subject_template_substitutes_run_date() {
        let subject = render_subject(DEFAULT_SUBJECT_TEMPLATE, "06-Aug-2026 10:00:00")
            .expect("rendered subject");
        assert_eq!(subject, "[EC Termination] Run report - 06-Aug-2026 10:00:00");
    }

    #[test]
    fn broken_template_is_a_notify_error() {
        let result = render_subject("{{#if}}", "now");
        assert!(matches!(result, Err(OffboardError::Notify(_))));
    }
}
