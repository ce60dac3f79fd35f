// Command abbreviation matching for the procflow CLI

/// Find all commands that start with the given prefix (case-insensitive)
pub fn find_matching_commands<'a>(prefix: &str, commands: &'a [&str]) -> Vec<&'a str> {
    let prefix_lower = prefix.to_lowercase();
    commands.iter()
        .filter(|cmd| cmd.to_lowercase().starts_with(&prefix_lower))
        .copied()
        .collect()
}

/// Find a unique command match for the given prefix.
/// Exact matches take precedence over prefix matches.
/// `Err(empty)` means no match, `Err(matches)` means ambiguous.
pub fn find_unique_command<'a>(prefix: &str, commands: &'a [&str]) -> Result<&'a str, Vec<&'a str>> {
    let prefix_lower = prefix.to_lowercase();
    if let Some(cmd) = commands.iter().find(|cmd| cmd.to_lowercase() == prefix_lower) {
        return Ok(*cmd);
    }

    let matches = find_matching_commands(prefix, commands);
    match matches.len() {
        1 => Ok(matches[0]),
        _ => Err(matches),
    }
}

/// Top-level commands
pub const TOP_LEVEL_COMMANDS: &[&str] = &[
    "stages", "submit", "advance", "decide", "reset", "show", "screen",
    "resume", "requirements", "snapshot", "dashboard",
];

/// Requirements subcommands
pub const REQUIREMENT_COMMANDS: &[&str] = &["list", "show"];

/// Snapshot subcommands
pub const SNAPSHOT_COMMANDS: &[&str] = &["progress", "nav", "clear-nav"];

/// Decisions accepted by `decide`
pub const DECISIONS: &[&str] = &["approve", "reject"];

/// Get subcommands for a given top-level command
pub fn get_subcommands(command: &str) -> Option<&'static [&'static str]> {
    match command {
        "requirements" => Some(REQUIREMENT_COMMANDS),
        "snapshot" => Some(SNAPSHOT_COMMANDS),
        "decide" => Some(DECISIONS),
        _ => None,
    }
}

fn expand_one<'a>(arg: &str, candidates: &'a [&str], what: &str) -> Result<Option<&'a str>, String> {
    match find_unique_command(arg, candidates) {
        Ok(full) => Ok(Some(full)),
        Err(matches) if matches.is_empty() => Ok(None),
        Err(matches) => Err(format!(
            "Ambiguous {} '{}'. Did you mean one of: {}?",
            what, arg, matches.join(", ")
        )),
    }
}

/// Expand command abbreviations in the argument list.
/// Only the command word and its subcommand word are expanded; everything
/// after them (project ids, key=value fields) passes through untouched.
pub fn expand_command_abbreviations(args: Vec<String>) -> Result<Vec<String>, String> {
    let mut iter = args.into_iter();
    let Some(first) = iter.next() else {
        return Ok(Vec::new());
    };

    let mut expanded = Vec::new();
    if first.starts_with('-') {
        expanded.push(first);
        expanded.extend(iter);
        return Ok(expanded);
    }

    let Some(command) = expand_one(&first, TOP_LEVEL_COMMANDS, "command")? else {
        // Unknown command: let clap report it
        expanded.push(first);
        expanded.extend(iter);
        return Ok(expanded);
    };
    expanded.push(command.to_string());

    if let Some(subcommands) = get_subcommands(command) {
        if let Some(next) = iter.next() {
            if next.starts_with('-') {
                expanded.push(next);
            } else {
                match expand_one(&next, subcommands, "subcommand")? {
                    Some(full) => expanded.push(full.to_string()),
                    None => expanded.push(next),
                }
            }
        }
    }

    expanded.extend(iter);
    Ok(expanded)
}
