//! Audit report model, HTML rendering and artifact writing.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use eolwatch_catalog::CatalogMeta;
use eolwatch_core::fsio;
use eolwatch_core::types::{ClassifiedComponent, HostProbe, StatusCounts, SupportStatus};

use crate::error::Result;
use crate::escape::{escape_html, escape_html_opt};

/// Everything the report is built from.
pub struct ReportInput {
    pub generated_at: DateTime<Utc>,
    pub soon_days: u32,
    pub sources: BTreeMap<String, CatalogMeta>,
    pub failed_products: BTreeMap<String, String>,
    pub inventory: Option<Vec<HostProbe>>,
    pub components: Vec<ClassifiedComponent>,
}

/// Structured audit report; serialized as the JSON twin of the HTML page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub soon_days: u32,
    pub sources: BTreeMap<String, CatalogMeta>,
    #[serde(default)]
    pub failed_products: BTreeMap<String, String>,
    pub counts: StatusCounts,
    pub inventory: Option<Vec<HostProbe>>,
    pub components: Vec<ClassifiedComponent>,
}

pub fn build_report(input: ReportInput) -> AuditReport {
    let counts = input.components.iter().map(|c| &c.support_status).collect();
    AuditReport {
        generated_at: input.generated_at,
        soon_days: input.soon_days,
        sources: input.sources,
        failed_products: input.failed_products,
        counts,
        inventory: input.inventory,
        components: input.components,
    }
}

fn row_class(status: SupportStatus) -> &'static str {
    match status {
        SupportStatus::Ok => "ok",
        SupportStatus::Soon => "soon",
        SupportStatus::Eol => "eol",
        SupportStatus::Unknown => "unk",
    }
}

const STYLES: &str = "<style>\
body{font-family:Arial,Helvetica,sans-serif;margin:24px;color:#222}\
table{border-collapse:collapse;width:100%;margin-bottom:24px}\
td,th{border:1px solid #ddd;padding:8px;text-align:left}\
th{background:#f3f3f3}\
.ok{background:#e9ffe9}\
.soon{background:#fff7d6}\
.eol{background:#ffe2e2}\
.unk{background:#f0f0f0}\
.failed{color:#a40000}\
</style>";

/// Render a self-contained HTML page.
pub fn render_html(report: &AuditReport) -> Result<String> {
    let mut html = String::with_capacity(4096 + report.components.len() * 160);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"UTF-8\">")?;
    writeln!(html, "<title>Obsolescence audit</title>")?;
    writeln!(html, "{STYLES}")?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;
    writeln!(html, "<h1>Obsolescence audit</h1>")?;
    writeln!(
        html,
        "<p>Generated <b>{}</b> | SOON threshold: {} days</p>",
        escape_html(&report.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        report.soon_days
    )?;

    // ── Sources ──
    writeln!(html, "<h2>EOL sources</h2>")?;
    writeln!(html, "<ul>")?;
    for (product, meta) in &report.sources {
        let mode = match meta.cached_from {
            Some(origin) => format!("{} ({})", meta.api_mode, origin),
            None => meta.api_mode.to_string(),
        };
        writeln!(
            html,
            "<li>{}: source {}, fetched {}, mode {}</li>",
            escape_html(product),
            escape_html(&meta.source),
            escape_html(&meta.fetched_at_iso),
            escape_html(&mode)
        )?;
    }
    writeln!(html, "</ul>")?;

    if !report.failed_products.is_empty() {
        writeln!(html, "<h2>Catalog failures</h2>")?;
        writeln!(html, "<ul class=\"failed\">")?;
        for (product, error) in &report.failed_products {
            writeln!(html, "<li>{}: {}</li>", escape_html(product), escape_html(error))?;
        }
        writeln!(html, "</ul>")?;
    }

    // ── Summary ──
    writeln!(html, "<h2>Summary</h2>")?;
    writeln!(html, "<ul>")?;
    writeln!(html, "<li>OK: {}</li>", report.counts.ok)?;
    writeln!(html, "<li>SOON: {}</li>", report.counts.soon)?;
    writeln!(html, "<li>EOL: {}</li>", report.counts.eol)?;
    writeln!(html, "<li>UNKNOWN: {}</li>", report.counts.unknown)?;
    writeln!(html, "</ul>")?;

    // ── Inventory ──
    if let Some(inventory) = &report.inventory {
        writeln!(html, "<h2>Network inventory</h2>")?;
        writeln!(
            html,
            "<table><thead><tr><th>IP</th><th>Open ports</th><th>Probable OS</th></tr></thead><tbody>"
        )?;
        for host in inventory {
            writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&host.ip.to_string()),
                escape_html(&host.ports_display()),
                escape_html(host.os_guess.label())
            )?;
        }
        writeln!(html, "</tbody></table>")?;
    }

    // ── Components ──
    writeln!(html, "<h2>Components and support status</h2>")?;
    writeln!(
        html,
        "<table><thead><tr><th>Component</th><th>Product</th><th>Version</th><th>EOL</th><th>Status</th></tr></thead><tbody>"
    )?;
    for item in &report.components {
        writeln!(
            html,
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><b>{}</b></td></tr>",
            row_class(item.support_status),
            escape_html(&item.component.name),
            escape_html(&item.component.product),
            escape_html(&item.component.version),
            escape_html_opt(item.eol_date.as_deref()),
            item.support_status
        )?;
    }
    writeln!(html, "</tbody></table>")?;

    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;
    Ok(html)
}

/// Write `audit_report_<ts>_<run_tag>.html` and its `.json` twin under `dir`.
/// Returns `(html_path, json_path)`.
pub fn write_report(dir: &Path, run_tag: &str, report: &AuditReport) -> Result<(PathBuf, PathBuf)> {
    let stem = format!(
        "audit_report_{}_{run_tag}",
        report.generated_at.format("%Y%m%d_%H%M%S")
    );
    let html_path = dir.join(format!("{stem}.html"));
    let json_path = dir.join(format!("{stem}.json"));

    let html = render_html(report)?;
    fsio::write_atomic(&html_path, html.as_bytes())?;
    fsio::write_json_atomic(&json_path, report)?;

    tracing::info!(
        html = %html_path.display(),
        json = %json_path.display(),
        components = report.components.len(),
        "Audit report written"
    );
    Ok((html_path, json_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eolwatch_catalog::ApiMode;
    use eolwatch_core::types::{Component, OsGuess};
    use std::collections::BTreeSet;
    use std::net::Ipv4Addr;

    fn classified(name: &str, product: &str, version: &str, status: SupportStatus) -> ClassifiedComponent {
        ClassifiedComponent {
            component: Component {
                name: name.into(),
                product: product.into(),
                version: version.into(),
            },
            support_status: status,
            eol_date: Some("2023-10-21".into()),
        }
    }

    fn sample(components: Vec<ClassifiedComponent>, inventory: Option<Vec<HostProbe>>) -> AuditReport {
        let mut sources = BTreeMap::new();
        sources.insert(
            "mysql".to_string(),
            CatalogMeta {
                source: "endoflife.date".into(),
                fetched_at_iso: "2026-02-12T12:00:00Z".into(),
                api_mode: ApiMode::Cache,
                cached_from: Some(ApiMode::V0),
            },
        );
        build_report(ReportInput {
            generated_at: Utc.with_ymd_and_hms(2026, 2, 12, 9, 30, 0).unwrap(),
            soon_days: 180,
            sources,
            failed_products: BTreeMap::new(),
            inventory,
            components,
        })
    }

    #[test]
    fn counts_follow_components() {
        let report = sample(
            vec![
                classified("a", "mysql", "5.7", SupportStatus::Eol),
                classified("b", "mysql", "8.0", SupportStatus::Soon),
                classified("c", "mysql", "9.9", SupportStatus::Unknown),
                classified("d", "mysql", "8.4", SupportStatus::Ok),
                classified("e", "mysql", "5.6", SupportStatus::Eol),
            ],
            None,
        );
        assert_eq!(report.counts.eol, 2);
        assert_eq!(report.counts.soon, 1);
        assert_eq!(report.counts.unknown, 1);
        assert_eq!(report.counts.ok, 1);
        assert_eq!(report.counts.total(), report.components.len());
    }

    #[test]
    fn html_escapes_user_strings() {
        let report = sample(
            vec![classified("<script>alert('x')</script>", "mysql", "5.7\" onmouseover=\"x", SupportStatus::Eol)],
            None,
        );
        let html = render_html(&report).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
        assert!(html.contains("5.7&quot; onmouseover=&quot;x"));
    }

    #[test]
    fn rows_carry_status_class() {
        let report = sample(
            vec![
                classified("a", "mysql", "5.7", SupportStatus::Eol),
                classified("b", "mysql", "8.0", SupportStatus::Soon),
                classified("c", "mysql", "8.4", SupportStatus::Ok),
                classified("d", "mysql", "x", SupportStatus::Unknown),
            ],
            None,
        );
        let html = render_html(&report).unwrap();
        for class in ["eol", "soon", "ok", "unk"] {
            assert!(html.contains(&format!("<tr class=\"{class}\">")), "missing {class}");
        }
        assert!(html.contains("mode cache (v0)"));
        assert!(!html.contains("Network inventory"));
    }

    #[test]
    fn inventory_section_when_scanned() {
        let host = HostProbe {
            ip: Ipv4Addr::new(192, 168, 10, 5),
            open_ports: BTreeSet::from([22, 80]),
            os_guess: OsGuess::Linux,
        };
        let html = render_html(&sample(vec![], Some(vec![host]))).unwrap();
        assert!(html.contains("Network inventory"));
        assert!(html.contains("<td>192.168.10.5</td><td>22,80</td><td>linux</td>"));
    }

    #[test]
    fn writes_html_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample(vec![classified("a", "mysql", "5.7", SupportStatus::Eol)], None);

        let (html_path, json_path) = write_report(dir.path(), "0c1d2e3f", &report).unwrap();
        assert!(html_path.ends_with("audit_report_20260212_093000_0c1d2e3f.html"));
        assert!(json_path.ends_with("audit_report_20260212_093000_0c1d2e3f.json"));

        let back: AuditReport =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, report);
        assert!(std::fs::read_to_string(&html_path).unwrap().contains("class=\"eol\""));
    }

    #[test]
    fn same_second_reports_are_kept_apart() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample(vec![], None);

        let (first, _) = write_report(dir.path(), "aaaaaaaa", &report).unwrap();
        let (second, _) = write_report(dir.path(), "bbbbbbbb", &report).unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }
}
