//! Log filter construction.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Add every comma-separated directive in `directives` on top of `base`.
/// Parts that do not parse are returned so they can be reported once the
/// subscriber is installed.
pub fn build_filter(base: EnvFilter, directives: &str) -> (EnvFilter, Vec<String>) {
    let mut filter = base;
    let mut rejected = Vec::new();
    for part in directives.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<Directive>() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(_) => rejected.push(part.to_string()),
        }
    }
    (filter, rejected)
}
