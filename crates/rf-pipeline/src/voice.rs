//! Voice profile selection for narration.

use rf_core::CandidateItem;

/// Derive a voice profile from the candidate's source and text.
///
/// Used when the pipeline profile does not pin a voice.
pub fn voice_for(item: &CandidateItem) -> String {
    let source = item.source.to_lowercase();
    let text = format!("{} {}", item.title, item.body).to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| text.contains(w));

    let voice = match source.as_str() {
        "tifu" | "confession" => {
            if mentions(&["embarrass", "awkward", "cringe"]) {
                "funny_male"
            } else {
                "story_male"
            }
        }
        "amitheasshole" | "relationship_advice" => "dramatic",
        "wholesome" | "mademesmile" => "funny_female",
        _ if mentions(&["story", "happened", "experience"]) => "story_female",
        _ => "casual",
    };
    voice.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: &str, title: &str) -> CandidateItem {
        CandidateItem {
            source: source.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn source_rules() {
        assert_eq!(voice_for(&item("tifu", "So awkward at dinner")), "funny_male");
        assert_eq!(voice_for(&item("TIFU", "I broke the printer")), "story_male");
        assert_eq!(voice_for(&item("AmItheAsshole", "x")), "dramatic");
        assert_eq!(voice_for(&item("wholesome", "x")), "funny_female");
    }

    #[test]
    fn text_fallbacks() {
        assert_eq!(voice_for(&item("funny", "What happened next")), "story_female");
        assert_eq!(voice_for(&item("funny", "A cat")), "casual");
    }
}
