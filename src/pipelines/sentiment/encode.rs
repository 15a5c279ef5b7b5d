use super::vocab::{normalize, Vocabulary, PAD, UNK};

/// Encodes `text` into exactly `max_len` vocabulary indices.
///
/// Tokens missing from the vocabulary map to [`UNK`]. Shorter token lists are
/// left-padded with [`PAD`] so the text itself sits at the tail; longer lists
/// keep only the last `max_len` tokens, favoring recency. Pure function.
pub fn encode(text: &str, vocabulary: &Vocabulary, max_len: usize) -> Vec<u32> {
    let ids: Vec<u32> = normalize(text)
        .into_iter()
        .map(|token| vocabulary.lookup(&token).unwrap_or(UNK))
        .collect();

    if ids.len() >= max_len {
        ids[ids.len() - max_len..].to_vec()
    } else {
        let mut sequence = vec![PAD; max_len - ids.len()];
        sequence.extend(ids);
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::build(["love this product", "hate this thing"], 50)
    }

    #[test]
    fn output_length_is_always_max_len() {
        let vocab = vocab();
        for text in ["", "love", "love this product hate this thing"] {
            for max_len in [1, 4, 100] {
                assert_eq!(encode(text, &vocab, max_len).len(), max_len);
            }
        }
    }

    #[test]
    fn empty_text_is_all_padding() {
        assert_eq!(encode("", &vocab(), 100), vec![PAD; 100]);
    }

    #[test]
    fn short_text_is_left_padded() {
        let vocab = vocab();
        let seq = encode("love this", &vocab, 5);
        assert_eq!(seq[..3], [PAD, PAD, PAD]);
        assert_eq!(seq[3], vocab.lookup("love").unwrap());
        assert_eq!(seq[4], vocab.lookup("this").unwrap());
    }

    #[test]
    fn long_text_keeps_the_suffix() {
        let vocab = vocab();
        let seq = encode("love this product hate this thing", &vocab, 3);
        assert_eq!(
            seq,
            vec![
                vocab.lookup("hate").unwrap(),
                vocab.lookup("this").unwrap(),
                vocab.lookup("thing").unwrap(),
            ]
        );
    }

    #[test]
    fn unknown_tokens_map_to_unk() {
        let seq = encode("unseen words everywhere", &vocab(), 3);
        assert_eq!(seq, vec![UNK, UNK, UNK]);
    }
}
