//! The fixed instruction sent with every analysis.

/// Upper bound on user-supplied notes folded into the prompt.
pub const MAX_NOTES_CHARS: usize = 2_000;

pub const ANALYSIS_PROMPT: &str = "\
You are an environmental microscopy analyst. The attached images are microscope \
photographs of a water sample that was passed through a filter membrane. \
Examine every image together as one sample.

1. Detect plastic particles smaller than 5 mm (microplastics). Count them and \
estimate the total for the visible filter area.
2. Classify the particles by shape (fiber, fragment, film, bead, foam, or other) \
and by the most likely polymer (for example PET, PE, PP, PS, PVC, nylon). Give \
a count, an approximate size range in micrometres, the dominant colour, and the \
share of the total as a percentage for each class.
3. Estimate the particle density of the sample and describe it in plain words.
4. Assign a severity score from 1 (trace contamination) to 10 (extreme \
contamination) based on the estimated particle density, and explain the score \
in one or two sentences.
5. Attribute the likely sources of the particles (for example synthetic \
laundry, packaging breakdown, tyre wear, personal care products) with a \
likelihood of low, medium, or high and the visual evidence for each.
6. Assess the health risks of drinking or using this water, each with a level \
of low, medium, or high and a short description.
7. Give practical recommendations for treatment, further testing, or \
prevention.
8. Report your overall confidence in the analysis as a number between 0 and 1.

If the images do not show a filtered water sample, or nothing can be \
identified, still answer with the same structure: an estimated particle count \
of 0, a severity score of 1, and a summary that says so.

Answer only with a JSON object that matches the provided response schema. Do \
not add commentary outside the JSON.";

/// Compose the prompt for one request, appending sanitized sample notes.
pub fn build_prompt(notes: Option<&str>) -> String {
    match clean_notes(notes) {
        Some(notes) => format!("{ANALYSIS_PROMPT}\n\nSample notes from the submitter:\n{notes}"),
        None => ANALYSIS_PROMPT.to_string(),
    }
}

/// Trim notes, drop them if blank, and cap their length.
pub fn clean_notes(notes: Option<&str>) -> Option<String> {
    let trimmed = notes?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_NOTES_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_notes_is_the_fixed_instruction() {
        assert_eq!(build_prompt(None), ANALYSIS_PROMPT);
        assert_eq!(build_prompt(Some("   ")), ANALYSIS_PROMPT);
    }

    #[test]
    fn notes_are_appended() {
        let p = build_prompt(Some("  River Thames, 2 L filtered  "));
        assert!(p.starts_with(ANALYSIS_PROMPT));
        assert!(p.ends_with("River Thames, 2 L filtered"));
    }

    #[test]
    fn long_notes_are_capped() {
        let long = "x".repeat(MAX_NOTES_CHARS + 50);
        assert_eq!(clean_notes(Some(&long)).unwrap().len(), MAX_NOTES_CHARS);
    }

    #[test]
    fn prompt_mentions_the_severity_scale() {
        assert!(ANALYSIS_PROMPT.contains("severity score from 1"));
        assert!(ANALYSIS_PROMPT.contains("smaller than 5 mm"));
    }
}
