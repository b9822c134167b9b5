//! Template rendering for action parameters.
//!
//! Rendering substitutes context values into `${token}` markers inside
//! rewrite filter values. Only a fixed token set is supported; general path
//! resolution is intentionally not available here, and unknown tokens are
//! left unsubstituted.

use serde_json::Value;

use super::path::{resolve, text_form};

/// The enumerated tokens the renderer substitutes.
pub const TEMPLATE_TOKENS: [&str; 3] = ["user.department", "user.role", "request.query"];

/// Render a template value against a context.
///
/// String templates containing `${` have each supported `${token}`
/// occurrence replaced by the textual form of the resolved value (empty
/// string when absent). Non-string templates and strings without the marker
/// pass through unchanged.
pub fn render(template: &Value, context: &Value) -> Value {
    match template {
        Value::String(s) if s.contains("${") => {
            let mut out = s.clone();
            for token in TEMPLATE_TOKENS {
                let marker = format!("${{{token}}}");
                if out.contains(&marker) {
                    let replacement = match resolve(context, token) {
                        None | Some(Value::Null) => String::new(),
                        Some(value) => text_form(value),
                    };
                    out = out.replace(&marker, &replacement);
                }
            }
            Value::String(out)
        }
        other => other.clone(),
    }
}
