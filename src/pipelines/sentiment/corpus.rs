//! Built-in labeled review corpora used to train the shipped model.

/// A single labeled training text.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    /// Raw input text.
    pub text: String,
    /// `1` for positive, `0` for negative.
    pub label: u8,
}

impl TrainingExample {
    /// Creates a labeled example. `label` must be `0` or `1`.
    pub fn new(text: impl Into<String>, label: u8) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

const POSITIVE_TEXTS: &[&str] = &[
    "I love this product it is amazing",
    "This is the best thing ever",
    "Absolutely wonderful experience",
    "Great quality and fast shipping",
    "Exceeded my expectations completely",
    "Perfect works exactly as described",
    "Highly recommend this to everyone",
    "Fantastic product great value",
    "So happy with my purchase",
    "Amazing customer service",
    "Best purchase I have ever made",
    "Incredible quality and design",
    "Love it works perfectly",
    "Excellent product will buy again",
    "Super fast delivery great product",
    "Very satisfied with this purchase",
    "Outstanding quality highly recommend",
    "This made my day so happy",
    "Wonderful product great price",
    "Impressed with the quality",
    "Five stars not enough",
    "Better than expected",
    "Beautiful product love it",
    "Great experience overall",
    "Very pleased with this",
    "Awesome product works great",
    "Perfect gift idea",
    "Really happy with this",
    "Good quality great value",
    "Amazing just amazing",
    "The best product ever",
    "I am very happy",
    "This is great",
    "Love this so much",
    "Fantastic experience",
    "Really good product",
    "Very nice quality",
    "Happy customer here",
    "Will definitely buy again",
    "Pleasantly surprised",
    "Such a great product",
    "Worth every penny",
    "Exactly what I needed",
    "Made me smile",
    "Brilliant product",
    "So good I bought two",
    "Top quality item",
    "Really impressed",
    "Loving this product",
    "Great find",
];

const NEGATIVE_TEXTS: &[&str] = &[
    "This is terrible do not buy",
    "Worst purchase ever made",
    "Very disappointed with quality",
    "Broke after one day of use",
    "Complete waste of money",
    "Horrible customer service",
    "Never buying from here again",
    "Does not work as advertised",
    "Very poor quality product",
    "Absolutely awful experience",
    "Returned immediately",
    "Such a disappointment",
    "Not worth the money",
    "Terrible quality avoid",
    "Hate this product",
    "Worst thing I ever bought",
    "Really bad quality",
    "Do not recommend at all",
    "Very unhappy with this",
    "Total garbage",
    "Broken on arrival",
    "Scam do not buy",
    "Extremely disappointed",
    "Awful just awful",
    "Waste of time and money",
    "Very frustrated",
    "Bad experience overall",
    "Not as described",
    "Poor quality avoid",
    "Regret this purchase",
    "This is bad",
    "Very angry",
    "Hate it",
    "Terrible product",
    "Worst ever",
    "Not good at all",
    "Disappointed",
    "Bad quality",
    "Do not buy this",
    "Horrible product",
    "Very upset",
    "Cheap junk",
    "Does not work",
    "Useless product",
    "Angry customer",
    "Feels like a scam",
    "Not satisfied",
    "Unhappy with purchase",
    "Low quality",
    "Avoid this",
];

/// The built-in review corpus: all positive examples first, then all
/// negative ones. Vocabulary construction depends on this order.
pub fn builtin_corpus() -> Vec<TrainingExample> {
    POSITIVE_TEXTS
        .iter()
        .map(|text| TrainingExample::new(*text, 1))
        .chain(
            NEGATIVE_TEXTS
                .iter()
                .map(|text| TrainingExample::new(*text, 0)),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_is_balanced_and_labeled() {
        let corpus = builtin_corpus();
        assert_eq!(corpus.len(), 100);
        assert_eq!(corpus.iter().filter(|e| e.label == 1).count(), 50);
        assert_eq!(corpus.iter().filter(|e| e.label == 0).count(), 50);
        assert!(corpus.iter().all(|e| !e.text.trim().is_empty()));
    }
}
