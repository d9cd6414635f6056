//! Quotes shown in the page's rotating-quote slot.

use crate::random::RandomSource;

pub const QUOTES: [&str; 4] = [
    "Code is poetry, but software is a symphony.",
    "Debugging is like practicing scales: tedious but necessary.",
    "Refactoring: The remixing of code.",
    "Algorithm: A composer's score for the CPU.",
];

pub fn pick_quote(rng: &mut dyn RandomSource) -> &'static str {
    QUOTES[rng.pick(QUOTES.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;

    #[test]
    fn picks_by_index() {
        let mut rng = ScriptedSource::new(vec![2]);
        assert_eq!(pick_quote(&mut rng), "Refactoring: The remixing of code.");
    }
}
