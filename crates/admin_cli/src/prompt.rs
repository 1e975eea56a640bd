//! Masked password entry on the controlling terminal.

use std::{error::Error, io::Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};

type PromptResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const MIN_PASSWORD_LEN: usize = 8;
const ATTEMPTS: usize = 3;

/// Ask for a new password twice, masking input, until both entries match
/// and pass [`check_password`].
pub fn new_password() -> PromptResult<String> {
    for _ in 0..ATTEMPTS {
        let first = read_masked("Password: ")?;
        if let Err(problem) = check_password(&first) {
            notice(&problem)?;
            continue;
        }

        if read_masked("Confirm password: ")? == first {
            return Ok(first);
        }
        notice("Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

fn check_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    if password.trim().is_empty() {
        return Err("Password must not be blank.".to_string());
    }
    Ok(())
}

struct RawMode;

impl RawMode {
    fn enable() -> PromptResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Print `line` on a cleared line of stderr.
fn notice(line: &str) -> PromptResult<()> {
    let mut err = std::io::stderr();
    execute!(
        err,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line),
        Print("\r\n")
    )?;
    Ok(())
}

fn read_masked(label: &str) -> PromptResult<String> {
    let _raw = RawMode::enable()?;
    let mut err = std::io::stderr();
    execute!(
        err,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(label)
    )?;

    let mut typed = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };
        let control = modifiers.contains(KeyModifiers::CONTROL);

        match code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if control => {
                execute!(err, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Backspace => {
                if typed.pop().is_some() {
                    execute!(err, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                }
            }
            KeyCode::Char(ch) if !control => {
                typed.push(ch);
                execute!(err, Print("*"))?;
            }
            _ => {}
        }
        err.flush()?;
    }

    execute!(err, Print("\r\n"))?;
    err.flush()?;
    Ok(typed)
}
