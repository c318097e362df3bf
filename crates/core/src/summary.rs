//! Human-readable renderings of a new subscriber.
//!
//! Push and e-mail providers both describe a subscriber the same way: a
//! localized title plus one labelled row per field. Plain text is built
//! directly; HTML goes through `MiniJinja` with auto-escaping so submitted
//! values cannot inject markup.

use minijinja::{AutoEscape, Environment, ErrorKind, context};
use serde::Serialize;

use crate::error::RenderError;
use crate::locale::Language;
use crate::subscriber::{SubscriberContext, non_empty};

/// Placeholder shown for empty subscriber fields.
pub const EMPTY_FIELD: &str = "—";

/// Fuel limit for `MiniJinja` template evaluation.
const FUEL_LIMIT: u64 = 50_000;

/// Maximum rendered size of a custom title template.
const MAX_TITLE_BYTES: usize = 1_024;

const HTML_TEMPLATE: &str = "<h2>{{ heading }}</h2>\n\
<table>\n\
{% for row in rows %}<tr><th align=\"left\">{{ row.label }}</th><td>{{ row.value }}</td></tr>\n{% endfor %}\
</table>\n";

/// One labelled line of a subscriber summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

/// A localized description of a subscriber.
#[derive(Debug, Clone)]
pub struct SubscriberSummary {
    language: Language,
    title: String,
    rows: Vec<SummaryRow>,
}

impl SubscriberSummary {
    pub fn new(ctx: &SubscriberContext, language: Language) -> Self {
        let labels = language.labels();
        let sub = &ctx.subscriber;
        let field = |v: Option<&String>| {
            non_empty(v.map(String::as_str))
                .unwrap_or(EMPTY_FIELD)
                .to_owned()
        };

        let rows = vec![
            SummaryRow {
                label: labels.email,
                value: sub.email.clone(),
            },
            SummaryRow {
                label: labels.first_name,
                value: field(sub.first_name.as_ref()),
            },
            SummaryRow {
                label: labels.last_name,
                value: field(sub.last_name.as_ref()),
            },
            SummaryRow {
                label: labels.phone,
                value: field(sub.phone.as_ref()),
            },
            SummaryRow {
                label: labels.message,
                value: field(sub.message.as_ref()),
            },
            SummaryRow {
                label: labels.audience,
                value: ctx
                    .audience_name()
                    .unwrap_or(labels.unknown_audience)
                    .to_owned(),
            },
            SummaryRow {
                label: labels.source,
                value: ctx.source_domain().unwrap_or(labels.no_source).to_owned(),
            },
        ];

        Self {
            language,
            title: format!("{}: {}", labels.title_prefix, sub.email),
            rows,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// The default notification title, e.g. `New Subscriber: a@b.com`.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Aligned `Label: value` lines, one per row.
    pub fn to_plain_text(&self) -> String {
        let width = self
            .rows
            .iter()
            .map(|r| r.label.chars().count() + 1)
            .max()
            .unwrap_or(0);
        self.rows
            .iter()
            .map(|r| format!("{:<width$} {}", format!("{}:", r.label), r.value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Plain text preceded by an underlined heading, for e-mail bodies.
    pub fn to_plain_text_with_heading(&self) -> String {
        let heading = self.language.labels().heading;
        let underline = "-".repeat(heading.chars().count());
        format!("{heading}\n{underline}\n{}", self.to_plain_text())
    }

    /// HTML table rendering with all values escaped.
    pub fn to_html(&self) -> Result<String, RenderError> {
        let mut env = Environment::new();
        env.set_fuel(Some(FUEL_LIMIT));
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.render_str(
            HTML_TEMPLATE,
            context! {
                heading => self.language.labels().heading,
                rows => &self.rows,
            },
        )
        .map_err(map_template_error)
    }
}

/// Render a custom title template against the subscriber.
///
/// Available variables: `email`, `first_name`, `last_name`, `phone`,
/// `audience`, `source`. Missing values render as empty strings.
pub fn render_title_template(template: &str, ctx: &SubscriberContext) -> Result<String, RenderError> {
    let mut env = Environment::new();
    env.set_fuel(Some(FUEL_LIMIT));

    let sub = &ctx.subscriber;
    let rendered = env
        .render_str(
            template,
            context! {
                email => &sub.email,
                first_name => sub.first_name.as_deref().unwrap_or_default(),
                last_name => sub.last_name.as_deref().unwrap_or_default(),
                phone => sub.phone.as_deref().unwrap_or_default(),
                audience => ctx.audience_name().unwrap_or_default(),
                source => ctx.source_domain().unwrap_or_default(),
            },
        )
        .map_err(map_template_error)?;

    if rendered.len() > MAX_TITLE_BYTES {
        return Err(RenderError::TooLarge(MAX_TITLE_BYTES));
    }
    Ok(rendered.trim().to_owned())
}

fn map_template_error(e: minijinja::Error) -> RenderError {
    if e.kind() == ErrorKind::SyntaxError {
        RenderError::Syntax(e.to_string())
    } else {
        RenderError::Render(e.to_string())
    }
}
