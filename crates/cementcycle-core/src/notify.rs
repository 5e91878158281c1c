//! Match notifications

use async_trait::async_trait;
use anyhow::Result;
use std::collections::HashMap;

pub const MATCH_CREATED_TEMPLATE: &str =
    "A new match has been found for your {material_type}. Match score: {match_score}%";

#[derive(Debug, Clone, PartialEq)]
pub struct MatchNotification {
    pub match_id: String,
    pub material_type: String,
    pub match_score: u8,
    pub recipient: Option<String>,
    pub contact_preference: Option<String>,
}

impl MatchNotification {
    pub fn render(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert("material_type", self.material_type.clone());
        vars.insert("match_score", self.match_score.to_string());
        render_template(MATCH_CREATED_TEMPLATE, &vars)
    }
}

/// Replace `{name}` placeholders in a single pass over the template.
/// Substituted values are never rescanned; unknown placeholders are left as-is.
pub fn render_template(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match tail[1..].find(|c| c == '{' || c == '}') {
            Some(end) if tail.as_bytes()[end + 1] == b'}' => {
                let name = &tail[1..end + 1];
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&tail[..end + 2]),
                }
                rest = &tail[end + 2..];
            }
            _ => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn match_created(&self, notification: &MatchNotification) -> Result<()>;
}

/// Writes notifications to the trace log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn match_created(&self, notification: &MatchNotification) -> Result<()> {
        tracing::info!(
            match_id = %notification.match_id,
            recipient = notification.recipient.as_deref().unwrap_or("-"),
            channel = notification.contact_preference.as_deref().unwrap_or("email"),
            "{}",
            notification.render()
        );
        Ok(())
    }
}
