fn initials_of(name: &str) -> Option<String> {
    let mut tokens = name.split_whitespace();
    let first = tokens.next()?.chars().next()?;
    let last = tokens.last().and_then(|t| t.chars().next()).unwrap_or(first);
    Some(format!("{first}{last}"))
}

/// Swap approver initials for the full name from the reference list.
///
/// Initials are built from the first letter of the first and last word of
/// each name. The first match in list order wins, so two people sharing
/// initials both resolve to whoever is listed first.
pub fn resolve(initials: &str, reference: &[String]) -> String {
    reference
        .iter()
        .find(|name| initials_of(name).as_deref() == Some(initials))
        .cloned()
        .unwrap_or_else(|| initials.to_string())
}
