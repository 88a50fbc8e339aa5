//! Environment variable expansion for configured paths and addresses.
//!
//! Three syntaxes are recognised: `$VAR`, `${VAR}` and `%VAR%`. Variables
//! that are not set are left in place verbatim.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static DOLLAR_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\w+)").expect("valid regex"));
static BRACED_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(\w+)\}").expect("valid regex"));
static PERCENT_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"%(\w+)%").expect("valid regex"));

/// Expands environment variables in `pattern`.
pub fn expand(pattern: &str) -> String {
    expand_with(pattern, |name| std::env::var(name).ok())
}

/// Expands variables using `lookup` instead of the process environment.
pub fn expand_with<F>(pattern: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let step = DOLLAR_VAR.replace_all(pattern, |caps: &Captures<'_>| substitute(&lookup, caps));
    let step = BRACED_VAR.replace_all(&step, |caps: &Captures<'_>| substitute(&lookup, caps));
    PERCENT_VAR
        .replace_all(&step, |caps: &Captures<'_>| substitute(&lookup, caps))
        .into_owned()
}

fn substitute<F>(lookup: &F, caps: &Captures<'_>) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
}

/// Normalises a configured listen address. A bare `:PORT` binds all interfaces.
pub fn listen_addr(addr: &str) -> String {
    let addr = expand(addr);
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr
    }
}

/// Normalises a configured backend address into a dialable URI.
pub fn backend_uri(addr: &str) -> String {
    let addr = expand(addr);
    let addr = if addr.starts_with(':') {
        format!("localhost{addr}")
    } else {
        addr
    };
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr
    } else {
        format!("http://{addr}")
    }
}
