//! Custom theme for cliclack output

use cliclack::ThemeState;
use console::Style;

/// sdb's theme: blue while working, green when done
#[derive(Debug, Clone, Default)]
pub struct SdbTheme;

impl cliclack::Theme for SdbTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().blue(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().blue().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().blue(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

/// Initialize the global theme
pub fn init_theme() {
    cliclack::set_theme(SdbTheme);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliclack::Theme;

    #[test]
    fn error_state_is_red() {
        let theme = SdbTheme;
        let error = ThemeState::Error("boom".to_string());
        assert_eq!(
            theme.bar_color(&error).apply_to("x").to_string(),
            Style::new().red().apply_to("x").to_string()
        );
        let _ = theme.state_symbol_color(&ThemeState::Submit);
    }
}
