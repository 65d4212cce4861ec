//! Line commands typed by the visitor at the survey prompt.

use shared::domain::Persona;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Set { field: String, value: String },
    Toggle { field: String, option: String },
    Persona(Persona),
    Next,
    Previous,
    Submit,
    Dismiss,
    Help,
    Quit,
}

pub const HELP: &str = "commands: show | set <field> <value> | toggle <field> <option> | \
persona <creator|business|enthusiast> | next | prev | submit | dismiss | help | quit";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "" | "show" => Ok(Command::Show),
        "next" => Ok(Command::Next),
        "prev" | "previous" | "back" => Ok(Command::Previous),
        "submit" => Ok(Command::Submit),
        "dismiss" => Ok(Command::Dismiss),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "persona" => rest
            .parse::<Persona>()
            .map(Command::Persona)
            .map_err(|err| err.to_string()),
        "set" => {
            let (field, value) = field_and_argument(rest, "set <field> <value>")?;
            Ok(Command::Set { field, value })
        }
        "toggle" => {
            let (field, option) = field_and_argument(rest, "toggle <field> <option>")?;
            if option.is_empty() {
                return Err("usage: toggle <field> <option>".to_string());
            }
            Ok(Command::Toggle { field, option })
        }
        other => Err(format!("unknown command '{other}'; type 'help'")),
    }
}

/// Splits `<field> <rest of line>`; the value may be empty or contain spaces.
fn field_and_argument(rest: &str, usage: &str) -> Result<(String, String), String> {
    if rest.is_empty() {
        return Err(format!("usage: {usage}"));
    }
    let (field, value) = match rest.split_once(char::is_whitespace) {
        Some((field, value)) => (field, value.trim()),
        None => (rest, ""),
    };
    Ok((field.to_string(), value.to_string()))
}
