//! `clinic doctor` — check the configuration and the assets the page needs.

use std::path::Path;

use crate::types::ServerConfig;
use crate::{is_known_key, load_config, suggest_key, CONFIG_FILE};

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Pass,
    Warn,
    Fail,
}

impl Check {
    fn tag(self) -> &'static str {
        match self {
            Check::Pass => "[PASS]",
            Check::Warn => "[WARN]",
            Check::Fail => "[FAIL]",
        }
    }
}

/// Every check with its message, in report order.
pub fn run_checks(config_path: &Path) -> Vec<(Check, String)> {
    let mut report = vec![(Check::Pass, format!("clinic-server v{}", env!("CARGO_PKG_VERSION")))];

    let config = if config_path.exists() {
        match load_config(config_path) {
            Ok(config) => {
                report.push((Check::Pass, format!("{} is valid", config_path.display())));
                report.extend(unknown_key_warnings(config_path));
                config
            }
            Err(e) => {
                report.push((Check::Fail, e.to_string()));
                ServerConfig::default()
            }
        }
    } else {
        report.push((Check::Warn, format!("{CONFIG_FILE} not found (will use defaults)")));
        ServerConfig::default()
    };

    let utils = config.static_dir.join("js").join("utils.js");
    if utils.exists() {
        report.push((Check::Pass, format!("phone widget utils script at {}", utils.display())));
    } else {
        report.push((
            Check::Fail,
            format!("phone widget utils script missing: {} (served as /static/js/utils.js)", utils.display()),
        ));
    }

    if config.geoip_url.trim().is_empty() {
        report.push((
            Check::Warn,
            format!("geo-IP lookup disabled, widget defaults to '{}'", config.fallback_country),
        ));
    } else {
        report.push((Check::Pass, format!("geo-IP lookup via {}", config.geoip_url)));
    }

    report
}

fn unknown_key_warnings(config_path: &Path) -> Vec<(Check, String)> {
    let Some(table) = std::fs::read_to_string(config_path)
        .ok()
        .and_then(|c| c.parse::<toml::Table>().ok())
    else {
        return Vec::new();
    };
    table
        .keys()
        .filter(|k| !is_known_key(k))
        .map(|k| match suggest_key(k) {
            Some(s) => (Check::Warn, format!("unknown key '{k}' — did you mean '{s}'?")),
            None => (Check::Warn, format!("unknown key '{k}'")),
        })
        .collect()
}

/// Print the report to stderr and return the process exit code.
pub fn run_doctor(config_path: &Path) -> i32 {
    eprintln!("clinic doctor");
    eprintln!();

    let report = run_checks(config_path);
    for (check, message) in &report {
        eprintln!("  {} {message}", check.tag());
    }

    let fails = report.iter().filter(|(c, _)| *c == Check::Fail).count();
    let warns = report.iter().filter(|(c, _)| *c == Check::Warn).count();
    eprintln!();
    if fails > 0 {
        eprintln!("  {fails} check(s) failed, {warns} warning(s)");
        1
    } else {
        eprintln!("  All checks passed ({warns} warning(s))");
        0
    }
}
