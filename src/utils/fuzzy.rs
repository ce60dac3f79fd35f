// Fuzzy matching for "did you mean" project id suggestions

/// Levenshtein distance: the minimum number of single-character edits
/// (insertions, deletions, substitutions) turning one string into another
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    // Two rolling rows are enough
    let mut prev: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut curr = vec![0; s2_chars.len() + 1];

    for (i, c1) in s1_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, c2) in s2_chars.iter().enumerate() {
            let cost = usize::from(c1 != c2);
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[s2_chars.len()]
}

/// Find known project ids close to `search`.
///
/// Matching is case-insensitive. Ids within `max_distance` edits match, and so
/// do ids ending with the search text (typing just the serial tail of
/// `PSB/PROC/2025/1/12/4` is common). Returns up to 5, closest first.
pub fn find_near_project_ids(search: &str, ids: &[String], max_distance: usize) -> Vec<(String, usize)> {
    let search_lower = search.trim().to_lowercase();
    if search_lower.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<(String, usize)> = Vec::new();
    for id in ids {
        let id_lower = id.to_lowercase();
        let distance = levenshtein_distance(&search_lower, &id_lower);
        if distance <= max_distance {
            matches.push((id.clone(), distance));
        } else if id_lower.ends_with(&search_lower) || id_lower.contains(&search_lower) {
            matches.push((id.clone(), max_distance + 1));
        }
    }

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.truncate(5);
    matches
}

/// One-line hint for an unknown id, if anything is close
pub fn suggestion_hint(search: &str, ids: &[String]) -> Option<String> {
    let matches = find_near_project_ids(search, ids, 3);
    if matches.is_empty() {
        return None;
    }
    let names: Vec<&str> = matches.iter().map(|(id, _)| id.as_str()).collect();
    Some(format!("Did you mean: {}?", names.join(", ")))
}
