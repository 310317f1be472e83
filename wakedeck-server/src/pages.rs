//! HTML pages: dashboard, forms, about and readme.

use pulldown_cmark::{html, Event, Options, Parser};
use std::fmt::Write;

use crate::models::{HostView, Reachability};
use crate::notices::Notice;

const STYLE: &str = r#"
        * { box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Ubuntu, sans-serif;
            background: #16213e;
            color: #e5e7eb;
            margin: 0;
        }
        nav { background: #1a1a2e; padding: 0.75rem 1.5rem; }
        nav a { color: #60a5fa; margin-right: 1.25rem; text-decoration: none; }
        main { max-width: 960px; margin: 1.5rem auto; padding: 0 1rem; }
        .notice { padding: 0.6rem 1rem; border-radius: 6px; margin-bottom: 0.5rem; }
        .notice.success { background: #14532d; }
        .notice.warning { background: #713f12; }
        .notice.danger { background: #7f1d1d; }
        .host { background: #1f2937; border-radius: 8px; padding: 1rem 1.25rem; margin-bottom: 1rem; }
        .status { font-weight: 600; }
        .status.reachable { color: #4ade80; }
        .status.unreachable { color: #f87171; }
        .status.indeterminate { color: #facc15; }
        .muted { color: #9ca3af; font-size: 0.9rem; }
        a.button { display: inline-block; background: #3b82f6; color: #fff; padding: 0.3rem 0.8rem;
                   border-radius: 4px; text-decoration: none; margin: 0.2rem 0.4rem 0.2rem 0; }
        form label { display: block; margin-top: 0.75rem; }
        form input, form select { width: 100%; padding: 0.4rem; margin-top: 0.25rem; }
        form button { margin-top: 1rem; padding: 0.5rem 1.2rem; }
        pre { white-space: pre-wrap; background: #1f2937; padding: 1rem; border-radius: 8px; }
        .readme table { border-collapse: collapse; }
        .readme th, .readme td { border: 1px solid #374151; padding: 0.3rem 0.6rem; }
"#;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, notices: &[Notice], body: &str) -> String {
    let mut flashes = String::new();
    for n in notices {
        let _ = writeln!(
            flashes,
            r#"<div class="notice {}">{}</div>"#,
            n.level.as_str(),
            escape(&n.text)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>WakeDeck: {title}</title>
    <style>{STYLE}</style>
</head>
<body>
<nav>
    <a href="/">Dashboard</a>
    <a href="/hosts-config">Add host</a>
    <a href="/clients-config">Add client</a>
    <a href="/about">About</a>
    <a href="/README">README</a>
</nav>
<main>
{flashes}{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn status_label(status: Reachability) -> &'static str {
    match status {
        Reachability::Reachable => "online",
        Reachability::Unreachable => "offline",
        Reachability::Indeterminate => "unknown (no ping rights)",
    }
}

pub fn dashboard(views: &[HostView], notices: &[Notice]) -> String {
    let mut body = String::from("<h1>Hosts</h1>\n");
    if views.is_empty() {
        body.push_str(r#"<p class="muted">No host configured yet.</p>"#);
    }

    for view in views {
        let host = &view.host;
        let label = urlencoding::encode(&host.name);
        let _ = write!(
            body,
            r#"<section class="host">
    <h2>{name} <span class="status {class}">{status}</span></h2>
    <p class="muted">{user}@{ip} · {mac} · checked {checked}</p>
    <a class="button" href="/wakeup?host-label={label}">Wake up</a>
"#,
            name = escape(&host.name),
            class = view.status.as_str(),
            status = status_label(view.status),
            user = escape(&host.ssh_username),
            ip = escape(&host.ip_address),
            mac = escape(&host.mac_address),
            checked = escape(&view.checked_at),
        );
        for client in &host.clients {
            let resolution = client
                .resolution
                .as_deref()
                .map(|r| format!(" ({})", escape(r)))
                .unwrap_or_default();
            let _ = writeln!(
                body,
                r#"    <a class="button" href="/command?host-label={label}&amp;client={client_q}" title="{cmd}">{name}{resolution}</a>"#,
                client_q = urlencoding::encode(&client.name),
                cmd = escape(&client.ssh_command),
                name = escape(&client.name),
            );
        }
        body.push_str("</section>\n");
    }

    layout("Dashboard", notices, &body)
}

pub fn hosts_form(notices: &[Notice]) -> String {
    let body = r#"<h1>Add a host</h1>
<form method="post" action="/hosts-config">
    <label>Name <input name="host_name" required></label>
    <label>SSH username <input name="ssh_username" required></label>
    <label>IP address <input name="ip_address" placeholder="192.168.1.20" required></label>
    <label>MAC address <input name="mac_address" placeholder="AA:BB:CC:DD:EE:FF" required></label>
    <button type="submit">Add host</button>
</form>
"#;
    layout("Add host", notices, body)
}

pub fn clients_form(host_names: &[String], notices: &[Notice]) -> String {
    let mut options = String::new();
    for name in host_names {
        let _ = writeln!(options, r#"        <option value="{0}">{0}</option>"#, escape(name));
    }
    let body = format!(
        r#"<h1>Add a client</h1>
<form method="post" action="/clients-config">
    <label>Host
    <select name="host_name" required>
{options}    </select></label>
    <label>Client name <input name="client_name" required></label>
    <label>Resolution (optional) <input name="resolution" placeholder="1920x1080"></label>
    <label>SSH command <input name="ssh_command" required></label>
    <button type="submit">Add client</button>
</form>
"#
    );
    layout("Add client", notices, &body)
}

pub fn about(notices: &[Notice]) -> String {
    let body = r#"<h1>About</h1>
<p>WakeDeck wakes machines on the local network with Wake-on-LAN magic packets
and runs preconfigured SSH commands on them.</p>
<p>Register a host with its SSH username, IP and MAC address, then attach
clients: named commands launched over SSH with the server's own keys.</p>
"#;
    layout("About", notices, body)
}

pub fn readme(text: &str, notices: &[Notice]) -> String {
    // HTML brut du fichier affiché comme texte
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut body = String::from("<article class=\"readme\">\n");
    html::push_html(&mut body, parser);
    body.push_str("</article>\n");
    layout("README", notices, &body)
}
