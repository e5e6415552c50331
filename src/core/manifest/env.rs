//! `${VAR}` substitution over the raw manifest text.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::domains::tools::auth::EnvSource;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder regex"));

/// Replace every `${NAME}` with the value of `NAME`.
///
/// Unset or empty variables keep their placeholder and log a warning.
pub fn substitute(text: &str, env: &dyn EnvSource) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            match env.var(name) {
                Some(value) => {
                    debug!(var_name = name, "Substituted environment variable");
                    value
                }
                None => {
                    warn!(var_name = name, "Environment variable not found, keeping placeholder");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}
