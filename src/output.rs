//! Terminal rendering for the `faultline` binary.

use owo_colors::{OwoColorize, Rgb};

use crate::classify::{Classification, RuleCatalog};

/// 24-bit RGB palette for classification output.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Rule names - cyan (34, 211, 238)
    pub rule: Rgb,
    /// Reportable failures - red (239, 68, 68)
    pub reported: Rgb,
    /// Failures kept out of telemetry - green (34, 197, 94)
    pub quiet: Rgb,
    /// Silent rules - yellow (234, 179, 8)
    pub silent: Rgb,
    /// Labels and positions - gray (107, 114, 128)
    pub muted: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            rule: Rgb(34, 211, 238),
            reported: Rgb(239, 68, 68),
            quiet: Rgb(34, 197, 94),
            silent: Rgb(234, 179, 8),
            muted: Rgb(107, 114, 128),
        }
    }
}

/// Renders classifications and catalogs as plain or colored text.
#[derive(Debug, Clone)]
pub struct Renderer {
    theme: Theme,
    use_color: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Renderer {
    pub fn new(use_color: bool) -> Self {
        Self {
            theme: Theme::default(),
            use_color,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    fn paint(&self, text: &str, color: Rgb) -> String {
        if self.use_color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn label(&self, text: &str) -> String {
        self.paint(text, self.theme.muted)
    }

    fn report_flag(&self, report: bool) -> String {
        if report {
            self.paint("reported", self.theme.reported)
        } else {
            self.paint("not reported", self.theme.quiet)
        }
    }

    /// Multi-line summary of one classification.
    pub fn render_classification(&self, classification: &Classification) -> String {
        let rule = if self.use_color {
            classification
                .rule
                .color(self.theme.rule)
                .bold()
                .to_string()
        } else {
            classification.rule.clone()
        };

        let mut lines = vec![
            format!(
                "{} {} {}",
                self.label("rule:"),
                rule,
                self.label(&format!("(#{})", classification.position))
            ),
            format!("{} {}", self.label("message:"), classification.message),
            format!(
                "{} {}",
                self.label("telemetry:"),
                self.report_flag(classification.report)
            ),
        ];
        if classification.silent {
            lines.push(format!(
                "{} {}",
                self.label("display:"),
                self.paint("suppressed", self.theme.silent)
            ));
        }
        lines.join("\n")
    }

    /// One line per rule, in precedence order.
    pub fn render_catalog(&self, catalog: &RuleCatalog) -> String {
        let width = catalog
            .iter()
            .map(|rule| rule.name().len())
            .max()
            .unwrap_or_default();

        catalog
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let position = self.label(&format!("{:>2}.", index + 1));
                let name = self.paint(&format!("{:<width$}", rule.name()), self.theme.rule);
                let mut line = format!("{} {}  {}", position, name, self.report_flag(rule.should_report()));
                if rule.is_silent() {
                    line.push_str(&format!(" {}", self.paint("silent", self.theme.silent)));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
