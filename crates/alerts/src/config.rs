//! Notification channel settings.

use serde::{Deserialize, Serialize};

/// Email channel. Messages are rendered and logged; there is no SMTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub enabled: bool,
    /// Recipient address
    pub address: Option<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            address: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub enabled: bool,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_token: None,
            chat_id: None,
        }
    }
}

/// Discord-compatible webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub enabled: bool,
    pub url: Option<String>,
    /// Footer text of the embed
    pub footer: String,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            footer: "Crypto Listing Monitor".to_string(),
        }
    }
}

/// Settings for every notification channel.
///
/// A channel is active when it is enabled and its target is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email: EmailSettings,
    pub telegram: TelegramSettings,
    pub webhook: WebhookSettings,
}

impl NotificationSettings {
    /// Fill unset targets from the process environment.
    pub fn fill_from_env(&mut self) {
        self.fill_from(|key| std::env::var(key).ok());
    }

    /// Fill unset targets from `lookup`. Values already set are kept.
    pub fn fill_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        fill(&mut self.telegram.bot_token, || get(&["TELEGRAM_BOT_TOKEN"]));
        fill(&mut self.telegram.chat_id, || get(&["TELEGRAM_CHAT_ID"]));
        fill(&mut self.webhook.url, || get(&["WEBHOOK_URL", "DISCORD_WEBHOOK_URL"]));
        fill(&mut self.email.address, || get(&["NOTIFY_EMAIL"]));
    }

    pub fn email_active(&self) -> bool {
        self.email.enabled && is_set(&self.email.address)
    }

    pub fn telegram_active(&self) -> bool {
        self.telegram.enabled && is_set(&self.telegram.bot_token) && is_set(&self.telegram.chat_id)
    }

    pub fn webhook_active(&self) -> bool {
        self.webhook.enabled && is_set(&self.webhook.url)
    }

    /// Names of the active channels.
    pub fn active_channels(&self) -> Vec<&'static str> {
        let mut channels = Vec::new();
        if self.email_active() {
            channels.push("email");
        }
        if self.telegram_active() {
            channels.push("telegram");
        }
        if self.webhook_active() {
            channels.push("webhook");
        }
        channels
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn fill(slot: &mut Option<String>, value: impl FnOnce() -> Option<String>) {
    if !is_set(slot) {
        if let Some(value) = value() {
            *slot = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_have_no_active_channel() {
        let settings = NotificationSettings::default();
        assert!(settings.active_channels().is_empty());
        assert_eq!(settings.webhook.footer, "Crypto Listing Monitor");
    }

    #[test]
    fn test_fill_from_env_keeps_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-1001"),
            ("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/x"),
            ("NOTIFY_EMAIL", " "),
        ]);

        let mut settings = NotificationSettings::default();
        settings.telegram.chat_id = Some("42".to_string());
        settings.fill_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.telegram.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(settings.telegram.chat_id.as_deref(), Some("42"));
        assert_eq!(
            settings.webhook.url.as_deref(),
            Some("https://discord.com/api/webhooks/1/x")
        );
        assert_eq!(settings.email.address, None);
        assert_eq!(settings.active_channels(), vec!["telegram", "webhook"]);
    }

    #[test]
    fn test_disabled_channel_is_inactive() {
        let mut settings = NotificationSettings::default();
        settings.email.address = Some("ops@example.com".to_string());
        assert!(settings.email_active());

        settings.email.enabled = false;
        assert!(!settings.email_active());
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: NotificationSettings =
            serde_json::from_str(r#"{"telegram": {"chat_id": "7"}}"#).unwrap();
        assert!(settings.telegram.enabled);
        assert_eq!(settings.telegram.chat_id.as_deref(), Some("7"));
        assert!(!settings.telegram_active());
    }
}
