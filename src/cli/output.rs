use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// CLI flags win; otherwise the config's `default_format`.
    pub fn resolve(json_flag: bool, format_flag: Option<&str>, configured: &str) -> Self {
        if json_flag {
            return Self::Json;
        }
        match format_flag.unwrap_or(configured) {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub use_color: bool,
}

/// `color_setting` is the config value: "auto", "always" or "never".
pub fn detect_color(color_flag: bool, color_setting: &str) -> bool {
    if !color_flag {
        return false;
    }
    match color_setting {
        "always" => true,
        "never" => false,
        _ => std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal(),
    }
}

pub fn to_json<T: serde::Serialize>(value: &T, opts: &OutputOptions) -> serde_json::Result<String> {
    if opts.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
