//! Nearest-name suggestions for unresolved symbols.

use kel_ast::Scope;

/// Largest edit distance still offered as a suggestion.
const MAX_DISTANCE: usize = 3;

/// Closest reference name visible from `scope`, nearest scope first on ties.
pub(super) fn suggest_reference(scope: &Scope, name: &str) -> Option<String> {
    let registry = scope.all_types();
    let candidates = scope.reference_chain().flat_map(|scope| {
        registry
            .references_of(scope.ty())
            .into_iter()
            .map(|reference| reference.name.as_str())
    });
    closest(name, candidates).map(str::to_string)
}

/// Closest function name visible from `scope`.
pub(super) fn suggest_function(scope: &Scope, name: &str) -> Option<String> {
    let registry = scope.all_types();
    let candidates = scope.chain().flat_map(|scope| {
        registry
            .functions_of(scope.ty())
            .into_iter()
            .map(|function| function.name.as_str())
    });
    closest(name, candidates).map(str::to_string)
}

fn closest<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        if candidate == name {
            continue;
        }
        let dist = edit_distance(name, candidate);
        if best.is_none_or(|(_, current)| dist < current) {
            best = Some((candidate, dist));
        }
    }
    match best {
        Some((candidate, dist)) if dist <= MAX_DISTANCE => Some(candidate),
        _ => None,
    }
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("Policu", "Policy"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_closest_respects_threshold() {
        let names = ["Policy", "riskItems", "Vehicle"];
        assert_eq!(closest("Policu", names.into_iter()), Some("Policy"));
        assert_eq!(closest("completelyDifferent", names.into_iter()), None);
        assert_eq!(closest("Policy", ["Policy"].into_iter()), None);
    }
}
