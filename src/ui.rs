use console::{strip_ansi_codes, Term};
use owo_colors::OwoColorize;

/// Terminal output utilities
pub struct UI {
    term: Term,
}

impl UI {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Helper method to conditionally apply color based on terminal support
    fn colorize<F>(&self, text: &str, color_fn: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        if self.supports_color() {
            color_fn(text)
        } else {
            text.to_string()
        }
    }

    /// Print a success message (color only if supported)
    pub fn success(&self, message: &str) {
        let output = self.colorize(message, |m| m.green().bold().to_string());
        println!("{}", output);
    }

    /// Print an error message (color only if supported)
    pub fn error(&self, message: &str) {
        let output = self.colorize(message, |m| m.red().bold().to_string());
        eprintln!("{}", output);
    }

    /// Print an info message (color only if supported)
    pub fn info(&self, message: &str) {
        let output = self.colorize(message, |m| m.blue().bold().to_string());
        println!("{}", output);
    }

    /// Format authentication status with appropriate color (if supported)
    pub fn format_auth_status(&self, authenticated: bool) -> String {
        let text = if authenticated {
            "Authenticated"
        } else {
            "Not authenticated"
        };

        if self.supports_color() {
            if authenticated {
                text.green().to_string()
            } else {
                text.red().to_string()
            }
        } else {
            text.to_string()
        }
    }

    /// Format server connection status with appropriate color (if supported)
    pub fn format_server_status(&self, connected: bool) -> String {
        let text = if connected {
            "Connected"
        } else {
            "Unreachable"
        };
        if self.supports_color() {
            if connected {
                text.green().to_string()
            } else {
                text.red().to_string()
            }
        } else {
            text.to_string()
        }
    }

    /// Format user field with fallback for missing data
    pub fn format_user_field(&self, value: Option<String>) -> String {
        value.unwrap_or_else(|| "-".to_string())
    }

    /// Create a card-style display for information
    pub fn card(&self, title: &str, content: Vec<(&str, String)>) {
        let term_width = self.width();
        let card_width = term_width.saturating_sub(4).clamp(50, 80);

        let supports_color = self.supports_color();

        println!("╭{}╮", "─".repeat(card_width - 2));
        let title_spaces = card_width.saturating_sub(title.len() + 4);
        if supports_color {
            println!("│ {} {}│", title.cyan().bold(), " ".repeat(title_spaces));
        } else {
            println!("│ {} {}│", title, " ".repeat(title_spaces));
        }
        println!("├{}┤", "─".repeat(card_width - 2));

        for (label, value) in content {
            let label_plain = strip_ansi_codes(label);
            let value_plain = strip_ansi_codes(&value);

            let content_width = label_plain.len() + value_plain.chars().count() + 4;
            let spaces = if content_width < card_width - 1 {
                card_width - content_width - 1
            } else {
                1
            };

            if supports_color {
                println!("│ {}: {}{}│", label.dimmed(), value, " ".repeat(spaces));
            } else {
                println!("│ {}: {}{}│", label, value, " ".repeat(spaces));
            }
        }

        println!("╰{}╯", "─".repeat(card_width - 2));
        println!();
    }

    /// Get terminal width for responsive layout
    pub fn width(&self) -> usize {
        self.term.size().1 as usize
    }

    /// Check if terminal supports color
    pub fn supports_color(&self) -> bool {
        self.term.features().colors_supported()
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a monetary amount, colored by sign when supported
pub fn format_amount_colored(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let supports_color = Term::stdout().features().colors_supported();

    if supports_color {
        if value < 0.0 {
            formatted.red().to_string()
        } else {
            formatted.green().to_string()
        }
    } else {
        formatted
    }
}
