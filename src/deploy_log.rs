//! Deployment log parsing
//!
//! Turns the human-oriented output of `spin deploy` into structured metadata.
//! The log format is not a stable contract, so parsing never fails: anything
//! that does not match simply leaves the corresponding field empty.
//!
//! ```text
//! Uploading hello version 0.1.0-r234fe5a4...
//! Deploying...
//! Waiting for application to become ready.......... ready
//! Available Routes:
//!   hello: https://hello-xyz.fermyon.app (wildcard)
//!   static: https://hello-xyz.fermyon.app/static
//! ```

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const ROUTES_HEADER: &str = "Available Routes:";

/// A URL exposed by one component of the deployed app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub name: String,
    pub url: String,
    /// Set when the route line is annotated with `(wildcard)`
    pub wildcard: bool,
}

/// What a deploy reported about the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentMetadata {
    pub app_name: String,
    /// URL of the first route, empty when no routes were reported
    pub base_url: String,
    pub version: String,
    pub routes: Vec<Route>,
    #[serde(skip)]
    pub raw_log: String,
}

impl DeploymentMetadata {
    /// Whether the log contained any route information
    pub fn has_routes(&self) -> bool {
        !self.routes.is_empty()
    }
}

/// Route scanner state. The header arms the scanner exactly once; there is
/// no transition back to `Seeking`, so a repeated header is just an
/// unmatched line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Seeking,
    Armed,
}

/// Parses the captured stdout of a deploy for `app_name`
pub fn parse_deployment_log(app_name: &str, raw_log: &str) -> DeploymentMetadata {
    let routes = parse_routes(raw_log);
    let base_url = routes
        .first()
        .map(|route| route.url.clone())
        .unwrap_or_default();

    DeploymentMetadata {
        app_name: app_name.to_string(),
        base_url,
        version: parse_version(app_name, raw_log),
        routes,
        raw_log: raw_log.to_string(),
    }
}

fn parse_version(app_name: &str, raw_log: &str) -> String {
    let pattern = format!(r"Uploading {} version (.*)\.\.\.", regex::escape(app_name));
    let Ok(re) = Regex::new(&pattern) else {
        return String::new();
    };

    re.captures(raw_log)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn route_regex() -> &'static Regex {
    static ROUTE_RE: OnceLock<Regex> = OnceLock::new();
    ROUTE_RE.get_or_init(|| {
        Regex::new(r"^(.*): (https?://[^\s^(]+)(.*)").expect("valid regex")
    })
}

fn parse_routes(raw_log: &str) -> Vec<Route> {
    let mut state = ScanState::Seeking;
    let mut routes = Vec::new();

    for line in raw_log.split('\n') {
        let line = line.trim();

        match state {
            ScanState::Seeking => {
                if line == ROUTES_HEADER {
                    state = ScanState::Armed;
                }
            }
            ScanState::Armed => {
                if let Some(route) = parse_route_line(line) {
                    routes.push(route);
                }
            }
        }
    }

    routes
}

fn parse_route_line(line: &str) -> Option<Route> {
    let caps = route_regex().captures(line)?;
    let suffix = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    Some(Route {
        name: caps[1].to_string(),
        url: caps[2].to_string(),
        wildcard: suffix.trim() == "(wildcard)",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_log() {
        let meta = parse_deployment_log("app", "");
        assert_eq!(meta.version, "");
        assert!(meta.routes.is_empty());
        assert_eq!(meta.base_url, "");
        assert_eq!(meta.app_name, "app");
        assert!(!meta.has_routes());
    }

    #[test]
    fn test_version() {
        let meta = parse_deployment_log("app", "Uploading app version 1.2.3...");
        assert_eq!(meta.version, "1.2.3");
    }

    #[test]
    fn test_version_requires_matching_app_name() {
        let meta = parse_deployment_log("other", "Uploading app version 1.2.3...");
        assert_eq!(meta.version, "");
    }

    #[test]
    fn test_version_app_name_is_literal() {
        let meta = parse_deployment_log("a.p", "Uploading app version 1.0.0...");
        assert_eq!(meta.version, "");

        let meta = parse_deployment_log("a.p", "Uploading a.p version 1.0.0...");
        assert_eq!(meta.version, "1.0.0");
    }

    #[test]
    fn test_routes_and_base_url() {
        let log = "Available Routes:\n  app: https://app.example.com (wildcard)\n  other: https://other.example.com\n";
        let meta = parse_deployment_log("app", log);

        assert_eq!(
            meta.routes,
            vec![
                Route {
                    name: "app".to_string(),
                    url: "https://app.example.com".to_string(),
                    wildcard: true,
                },
                Route {
                    name: "other".to_string(),
                    url: "https://other.example.com".to_string(),
                    wildcard: false,
                },
            ]
        );
        assert_eq!(meta.base_url, "https://app.example.com");
    }

    #[test]
    fn test_routes_before_header_are_ignored() {
        let log = "early: https://early.example.com\nAvailable Routes:\n  late: https://late.example.com\n";
        let meta = parse_deployment_log("app", log);
        assert_eq!(meta.routes.len(), 1);
        assert_eq!(meta.routes[0].name, "late");
    }

    #[test]
    fn test_header_line_is_not_a_route() {
        let meta = parse_deployment_log("app", "Available Routes:\n");
        assert!(meta.routes.is_empty());
    }

    #[test]
    fn test_url_stops_at_paren() {
        let route = parse_route_line("api: https://app.example.com/api(wildcard)").unwrap();
        assert_eq!(route.url, "https://app.example.com/api");
        assert!(route.wildcard);
    }

    #[test]
    fn test_non_wildcard_suffix() {
        let route = parse_route_line("api: http://localhost:3000/api (private)").unwrap();
        assert_eq!(route.url, "http://localhost:3000/api");
        assert!(!route.wildcard);
    }

    #[test]
    fn test_raw_log_preserved() {
        let log = "Uploading app version 1...\r\nsomething else";
        assert_eq!(parse_deployment_log("app", log).raw_log, log);
    }

    #[test]
    fn test_crlf_lines() {
        let log = "Available Routes:\r\n  app: https://app.example.com\r\n";
        let meta = parse_deployment_log("app", log);
        assert_eq!(meta.base_url, "https://app.example.com");
    }
}
