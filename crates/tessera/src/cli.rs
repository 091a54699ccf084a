use std::io::{BufRead, IsTerminal, Write};

use tessera_core::ui_bridge::{ConfirmRequest, HostUi, MessageSeverity, Notice, UiBridgeError};

/// Terminal front end for the plugin core.
///
/// Questions are asked on stderr and answered on stdin. With `assume_yes`
/// every question is answered with yes; without a terminal nothing is
/// answered and the core takes the non-destructive path.
#[derive(Debug)]
pub struct CliUi {
    assume_yes: bool,
    interactive: bool,
}

impl CliUi {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes, interactive: std::io::stdin().is_terminal() }
    }

    fn ask(&self, question: &str) -> Result<bool, UiBridgeError> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{} [y/N] ", question)?;
        stderr.flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        parse_answer(&line)
    }
}

/// Interprets a typed answer; an empty line means no
pub fn parse_answer(line: &str) -> Result<bool, UiBridgeError> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "" | "n" | "no" => Ok(false),
        other => Err(UiBridgeError::InvalidAnswer(other.to_string())),
    }
}

impl HostUi for CliUi {
    fn confirm(&self, request: &ConfirmRequest) -> Option<bool> {
        if self.assume_yes {
            log::info!("{} yes", request);
            return Some(true);
        }
        if !self.interactive {
            log::warn!("{} (no terminal, not answered)", request);
            return None;
        }
        match self.ask(&request.to_string()) {
            Ok(answer) => Some(answer),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    fn notify(&self, notice: &Notice) {
        let label = match notice.severity() {
            MessageSeverity::Error => "error",
            MessageSeverity::Warning => "warning",
            MessageSeverity::Info | MessageSeverity::Debug => "note",
        };
        eprintln!("{}: {}", label, notice.title());
        for line in notice.to_string().lines() {
            eprintln!("  {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y\n").unwrap());
        assert!(parse_answer(" YES ").unwrap());
        assert!(!parse_answer("\n").unwrap());
        assert!(!parse_answer("no").unwrap());
        assert!(matches!(parse_answer("maybe"), Err(UiBridgeError::InvalidAnswer(a)) if a == "maybe"));
    }

    #[test]
    fn test_assume_yes_confirms_everything() {
        let ui = CliUi::new(true);
        let request = ConfirmRequest::RunUpdate { reason: "Plugins were last updated 40 days ago".to_string() };
        assert_eq!(ui.confirm(&request), Some(true));
    }
}
