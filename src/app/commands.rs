//! Inbound remote-control commands.
//!
//! Text protocol, discriminated by the first byte:
//!
//! | Message       | Meaning                              |
//! |---------------|--------------------------------------|
//! | `M<int>:<int>`| motor-left / motor-right duty, %     |
//! | `L<int>`      | indicator duty, %                    |
//!
//! Parsing only checks the grammar.  Range validation happens when the
//! values are applied to the actuator record.

/// A parsed command.  Ephemeral: built per message, consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetMotorDuties { left: i64, right: i64 },
    SetIndicatorDuty(i64),
    Unrecognized,
}

impl Command {
    pub fn parse(msg: &[u8]) -> Self {
        let Ok(text) = core::str::from_utf8(msg) else {
            return Self::Unrecognized;
        };
        let mut chars = text.chars();
        let parsed = match chars.next() {
            Some('M') => parse_motor(chars.as_str()),
            Some('L') => parse_int(chars.as_str()).map(Self::SetIndicatorDuty),
            _ => None,
        };
        parsed.unwrap_or(Self::Unrecognized)
    }
}

fn parse_motor(body: &str) -> Option<Command> {
    let (left, right) = body.split_once(':')?;
    Some(Command::SetMotorDuties {
        left: parse_int(left)?,
        right: parse_int(right)?,
    })
}

/// Optional sign followed by decimal digits, nothing else.
fn parse_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
