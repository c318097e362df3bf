use std::fmt;

use herald_core::{ConfigMap, Language};
use herald_provider::ProviderError;
use herald_provider::config::{get_bool, get_str, get_u16, setting_or_config};
use serde_json::json;

/// Registry key of the SMTP provider.
pub const KIND: &str = "smtp";

pub const DEFAULT_PORT: u16 = 587;

pub const REQUIRED_KEYS: &[&str] = &["host", "port", "from_email", "to_email"];

/// Example configuration shown to administrators.
pub fn config_schema() -> ConfigMap {
    let mut schema = ConfigMap::new();
    schema.insert("host".into(), json!("smtp.example.com"));
    schema.insert("port".into(), json!(DEFAULT_PORT));
    schema.insert("username".into(), json!(""));
    schema.insert("password".into(), json!(""));
    schema.insert("use_tls".into(), json!(true));
    schema.insert("from_email".into(), json!("noreply@example.com"));
    schema.insert("to_email".into(), json!("admin@example.com"));
    schema.insert("language".into(), json!("en"));
    schema
}

/// Connection and addressing parameters resolved for one delivery.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from_email: String,
    pub to_email: String,
    pub language: Language,
}

impl SmtpSettings {
    /// Resolve settings from the stored config and audience overrides.
    ///
    /// Only `to_email` and `language` may be overridden per audience.
    pub fn resolve(config: &ConfigMap, overrides: Option<&ConfigMap>) -> Result<Self, ProviderError> {
        let required = |key: &str| {
            get_str(config, key)
                .map(str::to_owned)
                .ok_or_else(|| ProviderError::Configuration(format!("smtp '{key}' is empty")))
        };

        let to_email = setting_or_config(overrides, config, "to_email")
            .map(str::to_owned)
            .ok_or_else(|| ProviderError::Configuration("smtp 'to_email' is empty".into()))?;

        Ok(Self {
            host: required("host")?,
            port: get_u16(config, "port")?.unwrap_or(DEFAULT_PORT),
            username: get_str(config, "username").map(str::to_owned),
            password: get_str(config, "password").map(str::to_owned),
            use_tls: get_bool(config, "use_tls").unwrap_or(true),
            from_email: required("from_email")?,
            to_email,
            language: Language::resolve(setting_or_config(overrides, config, "language")),
        })
    }

    /// Credentials, only when both username and password are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("use_tls", &self.use_tls)
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .field("language", &self.language)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn map(value: Value) -> ConfigMap {
        value.as_object().cloned().unwrap()
    }

    fn base() -> ConfigMap {
        map(json!({
            "host": "mail.example.com",
            "port": "2525",
            "from_email": "from@example.com",
            "to_email": "ops@example.com",
        }))
    }

    #[test]
    fn defaults() {
        let mut config = base();
        config.remove("port");
        let settings = SmtpSettings::resolve(&config, None).unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert!(settings.use_tls);
        assert!(settings.credentials().is_none());
        assert_eq!(settings.language, Language::En);
    }

    #[test]
    fn string_port_and_tls_flag() {
        let mut config = base();
        config.insert("use_tls".into(), json!("false"));
        let settings = SmtpSettings::resolve(&config, None).unwrap();
        assert_eq!(settings.port, 2525);
        assert!(!settings.use_tls);
    }

    #[test]
    fn credentials_need_both_parts() {
        let mut config = base();
        config.insert("username".into(), json!("user"));
        config.insert("password".into(), json!(""));
        assert!(SmtpSettings::resolve(&config, None).unwrap().credentials().is_none());

        config.insert("password".into(), json!("pw"));
        assert_eq!(
            SmtpSettings::resolve(&config, None).unwrap().credentials(),
            Some(("user", "pw"))
        );
    }

    #[test]
    fn overrides_apply_to_recipient_and_language_only() {
        let overrides = map(json!({
            "to_email": "sales@example.com",
            "language": "es",
            "host": "evil.example.com",
        }));
        let settings = SmtpSettings::resolve(&base(), Some(&overrides)).unwrap();
        assert_eq!(settings.to_email, "sales@example.com");
        assert_eq!(settings.language, Language::Es);
        assert_eq!(settings.host, "mail.example.com");
    }

    #[test]
    fn invalid_port_is_configuration_error() {
        let mut config = base();
        config.insert("port".into(), json!("smtp"));
        let err = SmtpSettings::resolve(&config, None).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn debug_redacts_password() {
        let mut config = base();
        config.insert("username".into(), json!("user"));
        config.insert("password".into(), json!("hunter2"));
        let debug = format!("{:?}", SmtpSettings::resolve(&config, None).unwrap());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
