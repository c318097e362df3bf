use serde::{Deserialize, Serialize};
use tracing::warn;

/// Languages supported for subscriber notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

/// Localized strings for a subscriber summary.
#[derive(Debug)]
pub struct Labels {
    pub email: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub phone: &'static str,
    pub message: &'static str,
    pub audience: &'static str,
    pub source: &'static str,
    pub title_prefix: &'static str,
    pub heading: &'static str,
    pub unknown_audience: &'static str,
    pub no_source: &'static str,
}

const EN: Labels = Labels {
    email: "Email",
    first_name: "First Name",
    last_name: "Last Name",
    phone: "Phone",
    message: "Message",
    audience: "Audience",
    source: "Source",
    title_prefix: "New Subscriber",
    heading: "New subscriber notification",
    unknown_audience: "Unknown",
    no_source: "N/A",
};

const ES: Labels = Labels {
    email: "Correo",
    first_name: "Nombre",
    last_name: "Apellido",
    phone: "Teléfono",
    message: "Mensaje",
    audience: "Audiencia",
    source: "Origen",
    title_prefix: "Nuevo suscriptor",
    heading: "Notificación de nuevo suscriptor",
    unknown_audience: "Desconocida",
    no_source: "N/D",
};

impl Language {
    /// Resolve a language code such as `"es"` or `"es-MX"`.
    ///
    /// A missing code selects English silently; an unsupported one selects
    /// English and logs a warning.
    pub fn resolve(code: Option<&str>) -> Self {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Self::En;
        };
        let primary = code
            .split(['-', '_'])
            .next()
            .unwrap_or(code)
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Self::En,
            "es" => Self::Es,
            _ => {
                warn!(language = %code, "unsupported language, falling back to English");
                Self::En
            }
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Self::En => &EN,
            Self::Es => &ES,
        }
    }
}
