/// `:` palette commands and their autocomplete ranking

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "masuk",
    aliases: &["m", "in", "incoming"],
    description: "Incoming correspondence",
  },
  Command {
    name: "keluar",
    aliases: &["k", "out", "outgoing"],
    description: "Outgoing correspondence",
  },
  Command {
    name: "notulen",
    aliases: &["n", "minutes"],
    description: "Meeting minutes",
  },
  Command {
    name: "sertifikat",
    aliases: &["pdf", "certificate"],
    description: "Research certificate PDF",
  },
  Command {
    name: "logout",
    aliases: &["signout"],
    description: "Sign out and forget the token",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit efiling",
  },
];

/// Palette suggestions for `input`, best match first.
///
/// Exact name beats exact alias, then prefixes, then substrings. Ties keep
/// declaration order.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let needle = input.trim().to_lowercase();
  let mut ranked: Vec<(u8, &'static Command)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &needle).map(|r| (r, cmd)))
    .collect();
  ranked.sort_by_key(|(r, _)| *r);
  ranked.into_iter().map(|(_, cmd)| cmd).collect()
}

fn rank(cmd: &Command, needle: &str) -> Option<u8> {
  if needle.is_empty() {
    return Some(0);
  }
  let aliases = || cmd.aliases.iter();
  if cmd.name == needle {
    Some(0)
  } else if aliases().any(|a| *a == needle) {
    Some(1)
  } else if cmd.name.starts_with(needle) {
    Some(2)
  } else if aliases().any(|a| a.starts_with(needle)) {
    Some(3)
  } else if cmd.name.contains(needle) {
    Some(4)
  } else if aliases().any(|a| a.contains(needle)) {
    Some(5)
  } else {
    None
  }
}

/// Canonical command name for an exact name or alias
pub fn resolve(input: &str) -> Option<&'static str> {
  let needle = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == needle || cmd.aliases.contains(&needle.as_str()))
    .map(|cmd| cmd.name)
}
