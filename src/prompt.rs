use crate::config::PromptConfig;
use crate::models::{ExtractedText, Prompt};

/// Marker appended to the context when document text had to be dropped.
const TRUNCATION_MARKER: &str = "[... content truncated ...]";

/// Result of prompt assembly: the prompt plus whether the document text was
/// truncated to fit the context budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub prompt: Prompt,
    pub truncated: bool,
}

/// Assembles model-ready prompts from extracted text and a question.
///
/// Deterministic: identical (text, question, budget) inputs always produce an
/// identical prompt and truncation flag. When the rendered segments exceed
/// the character budget, the first segment is kept for document framing along
/// with as many of the most recent segments as fit, up to the configured
/// count; everything dropped is replaced by an explicit omission marker.
pub struct PromptBuilder {
    config: PromptConfig,
}

impl PromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, text: &ExtractedText, question: &str) -> BuiltPrompt {
        let (context, truncated) = self.render_context(text);
        BuiltPrompt {
            prompt: Prompt {
                system: self.config.preamble.clone(),
                context,
                question: question.trim().to_string(),
            },
            truncated,
        }
    }

    /// Render segments with provenance markers, truncating to the budget.
    fn render_context(&self, text: &ExtractedText) -> (String, bool) {
        let rendered: Vec<String> = text
            .segments
            .iter()
            .map(|seg| format!("--- {} ---\n{}", seg.source, seg.text))
            .collect();

        if rendered.is_empty() {
            return (String::new(), false);
        }

        let budget = self.config.context_budget;
        let joined = rendered.join("\n\n");
        if joined.len() <= budget {
            return (joined, false);
        }

        // Over budget. Reserve room for the truncation marker and the worst
        // case omission marker up front, so the rendered context never
        // exceeds the budget even with both appended.
        let worst_omission = format!(
            "[... {} segment(s) omitted ...]",
            rendered.len().saturating_sub(1)
        );
        let reserved = TRUNCATION_MARKER.len()
            + 2
            + if rendered.len() > 1 {
                worst_omission.len() + 2
            } else {
                0
            };
        let text_budget = budget.saturating_sub(reserved);

        // Keep segment 0, then walk backwards adding the most recent
        // segments that still fit.
        let mut keep = vec![false; rendered.len()];
        let first = truncate_at_char_boundary(&rendered[0], text_budget);
        let mut used = first.len();
        keep[0] = true;

        let mut kept_recent = 0;
        for idx in (1..rendered.len()).rev() {
            if kept_recent >= self.config.keep_recent_segments {
                break;
            }
            let cost = rendered[idx].len() + 2;
            if used + cost > text_budget {
                break;
            }
            keep[idx] = true;
            used += cost;
            kept_recent += 1;
        }

        let omitted = keep.iter().filter(|k| !**k).count();
        let mut parts: Vec<String> = Vec::new();
        parts.push(first.to_string());
        if omitted > 0 {
            parts.push(format!("[... {omitted} segment(s) omitted ...]"));
        }
        for (idx, part) in rendered.iter().enumerate().skip(1) {
            if keep[idx] {
                parts.push(part.clone());
            }
        }
        parts.push(TRUNCATION_MARKER.to_string());

        (parts.join("\n\n"), true)
    }
}

/// Cut a string at the last char boundary at or below `max` bytes.
fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Segment, SegmentSource};

    fn builder(budget: usize, keep_recent: usize) -> PromptBuilder {
        PromptBuilder::new(PromptConfig {
            context_budget: budget,
            keep_recent_segments: keep_recent,
            preamble: "Answer from the document.".to_string(),
        })
    }

    fn pages(texts: &[&str]) -> ExtractedText {
        ExtractedText::new(
            texts
                .iter()
                .enumerate()
                .map(|(idx, t)| Segment::new(SegmentSource::Page(idx + 1), *t))
                .collect(),
        )
    }

    #[test]
    fn test_within_budget_no_truncation() {
        let text = pages(&["alpha", "beta"]);
        let built = builder(10_000, 8).build(&text, "what is alpha?");
        assert!(!built.truncated);
        assert!(built.prompt.context.contains("--- page 1 ---\nalpha"));
        assert!(built.prompt.context.contains("--- page 2 ---\nbeta"));
        assert_eq!(built.prompt.question, "what is alpha?");
        assert_eq!(built.prompt.system, "Answer from the document.");
    }

    #[test]
    fn test_deterministic() {
        let text = pages(&["alpha", "beta", "gamma"]);
        let builder = builder(40, 2);
        let first = builder.build(&text, "  question  ");
        let second = builder.build(&text, "  question  ");
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncation_keeps_first_and_most_recent() {
        let long: String = "x".repeat(60);
        let text = pages(&["framing intro", &long, &long, "the latest page"]);
        let built = builder(160, 2).build(&text, "q");
        assert!(built.truncated);
        // First segment survives for framing, the most recent fits, the
        // middle is omitted with an explicit marker.
        assert!(built.prompt.context.contains("framing intro"));
        assert!(built.prompt.context.contains("the latest page"));
        assert!(built.prompt.context.contains("segment(s) omitted"));
        assert!(built.prompt.context.contains(TRUNCATION_MARKER));
        assert!(!built.prompt.context.contains(&long));
    }

    #[test]
    fn test_truncated_context_stays_within_budget() {
        let long: String = "z".repeat(300);
        let text = pages(&[&long, &long, &long, "the tail page"]);
        let budget = 200;
        let built = builder(budget, 8).build(&text, "q");
        assert!(built.truncated);
        // The omission and truncation markers count against the budget too.
        assert!(built.prompt.context.len() <= budget);
    }

    #[test]
    fn test_oversized_first_segment_is_cut() {
        let huge: String = "y".repeat(500);
        let text = pages(&[&huge]);
        let built = builder(100, 8).build(&text, "q");
        assert!(built.truncated);
        assert!(built.prompt.context.len() < 200);
        assert!(built.prompt.context.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_at_char_boundary() {
        assert_eq!(truncate_at_char_boundary("héllo", 2), "h");
        assert_eq!(truncate_at_char_boundary("héllo", 3), "hé");
        assert_eq!(truncate_at_char_boundary("abc", 10), "abc");
    }
}
