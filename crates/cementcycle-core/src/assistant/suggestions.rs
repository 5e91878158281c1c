//! Follow-up prompts offered after a chat reply

const MAX_SUGGESTIONS: usize = 4;

const PRICE: &[&str] = &[
    "Get a price estimate for my material",
    "How do quality grades change the price?",
];
const CARBON: &[&str] = &[
    "Calculate CO2 savings for my waste",
    "How are carbon credits valued?",
];
const MATCHING: &[&str] = &[
    "Find cement plants that need my material",
    "What makes a strong match score?",
];
const SELLING: &[&str] = &[
    "List my waste material",
    "Which materials are in highest demand?",
];
const DEFAULTS: &[&str] = &[
    "Find buyers for fly ash",
    "Estimate CO2 savings",
    "Check current market prices",
];

fn mentions(message: &str, words: &[&str]) -> bool {
    words.iter().any(|w| message.contains(w))
}

/// Keyword-driven suggestions. Falls back to a general set when nothing matches.
pub fn suggest(message: &str) -> Vec<String> {
    let message = message.to_lowercase();
    let mut picked: Vec<&str> = Vec::new();

    if mentions(&message, &["price", "cost", "rate", "worth"]) {
        picked.extend(PRICE);
    }
    if mentions(&message, &["co2", "carbon", "emission"]) {
        picked.extend(CARBON);
    }
    if mentions(&message, &["match", "buyer", "plant"]) {
        picked.extend(MATCHING);
    }
    if mentions(&message, &["sell", "listing", "list "]) {
        picked.extend(SELLING);
    }

    if picked.is_empty() {
        picked.extend(DEFAULTS);
    }
    picked.truncate(MAX_SUGGESTIONS);
    picked.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_keywords() {
        let s = suggest("What's the PRICE of slag?");
        assert_eq!(s[0], "Get a price estimate for my material");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_multiple_topics_are_capped() {
        let s = suggest("price and carbon for a buyer if I sell");
        assert_eq!(s.len(), MAX_SUGGESTIONS);
        assert!(s.contains(&"Calculate CO2 savings for my waste".to_string()));
    }

    #[test]
    fn test_default_set() {
        assert_eq!(suggest("hello there"), vec![
            "Find buyers for fly ash",
            "Estimate CO2 savings",
            "Check current market prices",
        ]);
    }
}
