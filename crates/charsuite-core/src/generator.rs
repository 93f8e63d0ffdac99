//! `.http` reproduction file for failed scenarios

use crate::verdict::Failure;

/// Render failing requests in `.http` format (VS Code REST Client, JetBrains).
///
/// URLs are rewritten onto `{{base_url_var}}` when they start with `base_url`.
pub fn to_http_file(failures: &[Failure], base_url: &str, base_url_var: &str) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "# Reproduction requests ({} failures)",
        failures.len()
    ));
    lines.push(format!("@{base_url_var} = {base_url}"));
    lines.push(String::new());

    let base = base_url.trim_end_matches('/');
    for failure in failures {
        lines.push(format!(
            "### {} [{}] {}",
            failure.id, failure.severity, failure.failure_type
        ));
        match failure.expected_status {
            Some(expected) => lines.push(format!(
                "# status {} (expected {expected})",
                failure.status_code
            )),
            None => lines.push(format!("# status {}", failure.status_code)),
        }
        if let Some(msg) = failure.message() {
            for line in msg.lines() {
                lines.push(format!("# {line}"));
            }
        }

        let url = match failure.request.url.strip_prefix(base) {
            Some(rest) if !base.is_empty() => format!("{{{{{base_url_var}}}}}{rest}"),
            _ => failure.request.url.clone(),
        };
        lines.push(format!("{} {url}", failure.method));

        for (key, value) in &failure.request.headers {
            if !matches!(key.to_lowercase().as_str(), "host" | "content-length") {
                lines.push(format!("{key}: {value}"));
            }
        }

        if let Some(body) = &failure.request.body {
            if !failure
                .request
                .headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case("content-type"))
            {
                lines.push("Content-Type: application/json".to_string());
            }
            lines.push(String::new());
            lines.push(body.clone());
        }

        lines.push(String::new());
    }

    lines.join("\n")
}
