/// Name given to an entrant whose name is blank, missing, or padded in.
pub fn placeholder_name(index: usize) -> String {
    format!("Player {}", index + 1)
}

/// Fit the submitted names to the tournament capacity.
///
/// Names are trimmed; a blank or missing name at position `i` becomes `Player {i+1}`. Extra
/// names are dropped and short rosters are padded with generated names up to `capacity`.
pub fn normalize_roster(names: Vec<Option<String>>, capacity: usize) -> Vec<String> {
    let mut roster = names
        .into_iter()
        .take(capacity)
        .enumerate()
        .map(|(index, name)| {
            name.map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| placeholder_name(index))
        })
        .collect::<Vec<_>>();

    let supplied = roster.len();
    roster.extend((supplied..capacity).map(placeholder_name));
    roster
}
