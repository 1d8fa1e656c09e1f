use std::fmt::Write as _;

use crate::dispatch::PageSnapshot;

const DEFAULT_PLACEHOLDER: &str = "Enter a box name";

pub fn render(snapshot: &PageSnapshot) -> String {
    let placeholder = if snapshot.input.placeholder.is_empty() {
        DEFAULT_PLACEHOLDER
    } else {
        snapshot.input.placeholder.as_str()
    };

    let mut html = String::with_capacity(4096);
    html.push_str(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Dashboard</title>\
         <style>body{font-family:sans-serif;background:#1e1e1e;color:#eee;margin:2em}\
         .tab{margin-right:4px}.tab.active{font-weight:bold}\
         th{text-align:left;padding-right:1em}</style></head><body>\n",
    );

    html.push_str("<h2>Create a session</h2>\n<form method=\"post\" action=\"/sessions\">");
    let _ = write!(
        html,
        "<input type=\"text\" name=\"name\" value=\"{}\" placeholder=\"{}\">",
        escape(&snapshot.input.value),
        escape(placeholder)
    );
    html.push_str(
        "<button type=\"submit\" name=\"kind\" value=\"local\">New local session</button>\
         <button type=\"submit\" name=\"kind\" value=\"network\">New network session</button>\
         </form>\n<nav>",
    );

    for tab in &snapshot.tabs.tabs {
        let class = if tab.focused { "tab active" } else { "tab" };
        let _ = write!(
            html,
            "<form method=\"post\" action=\"/tabs/{}/focus\" style=\"display:inline\">\
             <button class=\"{class}\">{}</button></form>",
            tab.index,
            escape(&tab.label)
        );
    }
    html.push_str("</nav>\n<section>");

    let _ = write!(html, "<h1>{}</h1>", escape(&snapshot.layout.title));
    for panel in &snapshot.layout.panels {
        let _ = write!(html, "<h3>{}</h3><table>", escape(&panel.heading));
        for (key, value) in &panel.rows {
            let _ = write!(
                html,
                "<tr><th>{}</th><td>{}</td></tr>",
                escape(key),
                escape(value)
            );
        }
        html.push_str("</table>");
    }
    html.push_str("</section>\n</body></html>\n");
    html
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessions::{SessionInput, SessionRegistry};
    use shared::domain::SessionKind;

    fn snapshot_of(registry: &SessionRegistry, input: SessionInput) -> PageSnapshot {
        PageSnapshot {
            input,
            tabs: registry.summaries(),
            layout: registry.focused_layout(),
        }
    }

    #[test]
    fn escapes_user_supplied_names() {
        let mut registry = SessionRegistry::default();
        registry
            .create_session(
                &mut SessionInput::with_value("<script>"),
                SessionKind::Local,
            )
            .expect("created");
        let html = render(&snapshot_of(&registry, SessionInput::default()));
        assert!(html.contains("LOCAL - &lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn shows_prompt_as_placeholder() {
        let registry = SessionRegistry::default();
        let input = SessionInput {
            value: String::new(),
            placeholder: sessions::EMPTY_NAME_PROMPT.to_string(),
        };
        let html = render(&snapshot_of(&registry, input));
        assert!(html.contains("placeholder=\"Please enter a name and try again.\""));

        let html = render(&snapshot_of(&registry, SessionInput::default()));
        assert!(html.contains("placeholder=\"Enter a box name\""));
    }

    #[test]
    fn marks_focused_tab_active() {
        let mut registry = SessionRegistry::default();
        registry
            .create_session(&mut SessionInput::with_value("A"), SessionKind::Local)
            .expect("created");
        let html = render(&snapshot_of(&registry, SessionInput::default()));
        assert!(html.contains("<button class=\"tab active\">LOCAL - A</button>"));
        assert!(html.contains("<button class=\"tab\">Welcome</button>"));
        assert!(html.contains("<h1>LOCAL - A</h1>"));
    }
}
