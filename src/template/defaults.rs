//! Built-in templates and per-kind placeholder sets

use crate::variable::{PlaceholderDefinition, PlaceholderType};

use super::entity::{Template, TemplateKind};

/// Placeholders shared by every screen-like kind: the simulated status bar
fn status_bar_placeholders() -> Vec<PlaceholderDefinition> {
    vec![
        PlaceholderDefinition::text("status_time")
            .with_pattern(r"^\d{1,2}:\d{2}$")
            .with_default("9:41")
            .with_description("Clock shown in the status bar"),
        PlaceholderDefinition::new("battery", PlaceholderType::Number)
            .with_bounds(Some(0.0), Some(100.0))
            .with_default(100)
            .with_description("Battery level in percent"),
        PlaceholderDefinition::new("network", PlaceholderType::Enum)
            .with_options(["4G", "5G", "WiFi"])
            .with_default("5G"),
    ]
}

pub(crate) fn placeholders_for(kind: TemplateKind) -> Vec<PlaceholderDefinition> {
    let mut defs = match kind {
        TemplateKind::Moment => vec![
            PlaceholderDefinition::text("nickname").required(),
            PlaceholderDefinition::new("avatar", PlaceholderType::ImagePath).required(),
            PlaceholderDefinition::new("content", PlaceholderType::RichText),
            PlaceholderDefinition::new("photo", PlaceholderType::ImagePath),
            PlaceholderDefinition::new("posted_at", PlaceholderType::DateTime).with_format("%H:%M"),
            PlaceholderDefinition::new("likes", PlaceholderType::List)
                .with_description("Names shown under the heart icon"),
            PlaceholderDefinition::text("location"),
        ],
        TemplateKind::Chat => vec![
            PlaceholderDefinition::text("contact_name").required(),
            PlaceholderDefinition::new("contact_avatar", PlaceholderType::ImagePath).required(),
            PlaceholderDefinition::new("self_avatar", PlaceholderType::ImagePath),
            PlaceholderDefinition::new("message", PlaceholderType::RichText).required(),
            PlaceholderDefinition::new("reply", PlaceholderType::RichText),
            PlaceholderDefinition::new("sent_at", PlaceholderType::DateTime).with_format("%H:%M"),
        ],
        TemplateKind::Profile => vec![
            PlaceholderDefinition::text("nickname").required(),
            PlaceholderDefinition::new("avatar", PlaceholderType::ImagePath).required(),
            PlaceholderDefinition::text("account_id"),
            PlaceholderDefinition::text("region"),
            PlaceholderDefinition::new("signature", PlaceholderType::RichText),
            PlaceholderDefinition::new("cover", PlaceholderType::ImagePath),
        ],
        TemplateKind::Other => return Vec::new(),
    };
    defs.extend(status_bar_placeholders());
    defs
}

const STATUS_BAR: &str = r##"  <g id="status-bar" font-family="-apple-system, sans-serif" font-size="15" fill="#000000">
    <text x="24" y="32" font-weight="600">{{status_time}}</text>
    <text x="300" y="32">{{network}}</text>
    <text x="340" y="32">{{battery}}%</text>
  </g>"##;

const MOMENT_BODY: &str = r##"  <image x="16" y="64" width="44" height="44" href="{{avatar}}"/>
  <text x="72" y="80" font-size="16" fill="#576b95" font-weight="600">{{nickname}}</text>
  <text x="72" y="104" font-size="15" fill="#000000">{{content}}</text>
  <image x="72" y="120" width="200" height="200" href="{{photo}}"/>
  <text x="72" y="340" font-size="12" fill="#576b95">{{location}}</text>
  <text x="72" y="360" font-size="12" fill="#b2b2b2">{{posted_at}}</text>
  <rect x="72" y="372" width="302" height="28" rx="4" fill="#f7f7f7"/>
  <text x="80" y="391" font-size="13" fill="#576b95">&#9825; {{likes}}</text>"##;

const CHAT_BODY: &str = r##"  <rect x="0" y="44" width="390" height="44" fill="#ededed"/>
  <text x="195" y="72" font-size="17" text-anchor="middle" font-weight="600">{{contact_name}}</text>
  <text x="195" y="112" font-size="12" text-anchor="middle" fill="#b2b2b2">{{sent_at}}</text>
  <image x="12" y="128" width="40" height="40" href="{{contact_avatar}}"/>
  <rect x="60" y="128" width="240" height="40" rx="4" fill="#ffffff"/>
  <text x="72" y="153" font-size="15">{{message}}</text>
  <image x="338" y="184" width="40" height="40" href="{{self_avatar}}"/>
  <rect x="90" y="184" width="240" height="40" rx="4" fill="#95ec69"/>
  <text x="102" y="209" font-size="15">{{reply}}</text>"##;

const PROFILE_BODY: &str = r##"  <image x="0" y="0" width="390" height="240" href="{{cover}}"/>
  <image x="24" y="208" width="64" height="64" href="{{avatar}}"/>
  <text x="104" y="236" font-size="20" font-weight="600">{{nickname}}</text>
  <text x="104" y="260" font-size="13" fill="#7f7f7f">ID: {{account_id}}</text>
  <text x="104" y="280" font-size="13" fill="#7f7f7f">{{region}}</text>
  <text x="24" y="316" font-size="14">{{signature}}</text>"##;

fn page(background: &str, body: &str) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 390 844" width="390" height="844">"#,
            "\n",
            r#"  <rect width="100%" height="100%" fill="{}"/>"#,
            "\n{}\n{}\n</svg>\n"
        ),
        background, STATUS_BAR, body
    )
}

/// Default markup for a kind; `None` for [`TemplateKind::Other`]
pub fn default_markup(kind: TemplateKind) -> Option<String> {
    match kind {
        TemplateKind::Moment => Some(page("#ffffff", MOMENT_BODY)),
        TemplateKind::Chat => Some(page("#ededed", CHAT_BODY)),
        TemplateKind::Profile => Some(page("#ffffff", PROFILE_BODY)),
        TemplateKind::Other => None,
    }
}

/// Built-in template for a kind, declaring the kind's default placeholders
pub fn default_template(kind: TemplateKind) -> Option<Template> {
    let markup = default_markup(kind)?;
    let name = format!("Default {}", kind);
    let template = Template::new(kind, name, markup)
        .with_placeholders(kind.default_placeholders())
        .ok()?;
    Some(template.with_metadata("builtin", "true"))
}

/// Built-in templates for every kind that has one
pub fn default_templates() -> Vec<Template> {
    TemplateKind::ALL
        .into_iter()
        .filter_map(default_template)
        .collect()
}
