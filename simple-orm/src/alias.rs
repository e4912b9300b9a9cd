//! Table alias derivation.
//!
//! Aliases keep generated SQL short: `userRoles` is joined as `UR`.

use std::collections::HashSet;

/// Derives the default alias for a model name.
///
/// The first character is upper-cased and every later upper-case character is
/// kept, so the alias spells out the camel-case humps of the name.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(alias("userRoles"), "UR");
/// ```
pub fn alias(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut out: String = first.to_uppercase().collect();
    out.extend(chars.filter(|c| c.is_uppercase()));
    out
}

/// Makes a sequence of aliases unique, in order.
///
/// The first occurrence keeps its alias, later ones get the smallest numeric
/// suffix starting at 2 that is not taken yet.
pub fn disambiguate<'a, I>(aliases: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken = HashSet::new();
    let mut out = Vec::new();

    for base in aliases {
        let mut candidate = base.to_string();
        let mut suffix = 2;
        while taken.contains(&candidate) {
            candidate = format!("{}{}", base, suffix);
            suffix += 1;
        }
        taken.insert(candidate.clone());
        out.push(candidate);
    }

    out
}
