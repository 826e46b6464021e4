//! Error reporting sink shared by every pipeline stage.
//!
//! A [`Diagnostics`] handle is cheap to clone; all clones feed the same log
//! and the same two sticky flags, which the driver reads to pick an exit code.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::error::LoxError;

#[derive(Debug, Default)]
struct State {
    had_error: bool,
    had_runtime_error: bool,
    rendered: Vec<String>,
    messages: Vec<String>,
    echo: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    state: Rc<RefCell<State>>,
}

impl Diagnostics {
    /// Records reports and echoes each one to stderr as it arrives.
    pub fn stderr() -> Self {
        let diagnostics = Self::default();
        diagnostics.state.borrow_mut().echo = true;
        diagnostics
    }

    /// Records reports without printing them.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn report(&self, error: LoxError) {
        debug!("Reporting: {}", error);

        let mut state = self.state.borrow_mut();

        if error.is_runtime() {
            state.had_runtime_error = true;
        } else {
            state.had_error = true;
        }

        let rendered: String = error.to_string();
        if state.echo {
            eprintln!("{}", rendered);
        }

        state.rendered.push(rendered);
        state.messages.push(error.message());
    }

    pub fn report_all<I: IntoIterator<Item = LoxError>>(&self, errors: I) {
        for error in errors {
            self.report(error);
        }
    }

    /// A syntax or static error occurred since the last reset.
    pub fn had_error(&self) -> bool {
        self.state.borrow().had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.state.borrow().had_runtime_error
    }

    /// Clear both flags.  The report log is kept.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.had_error = false;
        state.had_runtime_error = false;
    }

    /// Every report so far, rendered exactly as shown to the user.
    pub fn reports(&self) -> Vec<String> {
        self.state.borrow().rendered.clone()
    }

    /// Every report so far, message only.
    pub fn messages(&self) -> Vec<String> {
        self.state.borrow().messages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    #[test]
    fn flags_are_sticky_until_reset() {
        let diagnostics = Diagnostics::silent();
        let clone = diagnostics.clone();

        clone.report(LoxError::lex(3, "Unexpected character: $"));
        assert!(diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());

        clone.report(LoxError::runtime(&Token::synthetic("x", 4), "boom"));
        assert!(diagnostics.had_runtime_error());

        diagnostics.reset();
        assert!(!clone.had_error());
        assert!(!clone.had_runtime_error());
        assert_eq!(clone.reports().len(), 2);
    }

    #[test]
    fn reports_use_the_driver_format() {
        let diagnostics = Diagnostics::silent();

        diagnostics.report(LoxError::parse(&Token::synthetic("x", 2), "Expect ';'."));
        diagnostics.report(LoxError::runtime(&Token::synthetic("y", 5), "Bad."));

        assert_eq!(
            diagnostics.reports(),
            vec![
                "At line 2.\n\tError at 'x': Expect ';'.".to_string(),
                "At line 5.\n\tRuntime Error: Bad.".to_string(),
            ]
        );
        assert_eq!(diagnostics.messages(), vec!["Expect ';'.", "Bad."]);
    }
}
