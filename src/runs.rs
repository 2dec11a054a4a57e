use crate::block::{RICH_TEXT_LIMIT, StyleState, TextRun};

/// Split oversized runs and merge adjacent runs that share a style.
///
/// Every returned run is at most [`RICH_TEXT_LIMIT`] characters long and
/// empty runs are dropped. Text is never lost or reordered, and running the
/// result through again returns it unchanged.
pub fn normalize(runs: Vec<TextRun>) -> Vec<TextRun> {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    // Character length of the last merged run, kept alongside to avoid
    // recounting it on every merge.
    let mut last_len = 0;

    for run in runs.into_iter().flat_map(split_run) {
        let len = run.char_len();
        if let Some(last) = merged.last_mut() {
            if last.style == run.style && last_len + len <= RICH_TEXT_LIMIT {
                last.content.push_str(&run.content);
                last_len += len;
                continue;
            }
        }
        merged.push(run);
        last_len = len;
    }

    merged
}

/// Cut a run into chunks of exactly [`RICH_TEXT_LIMIT`] characters (the last
/// one may be shorter). An empty run yields nothing.
pub fn split_run(run: TextRun) -> Vec<TextRun> {
    if run.content.is_empty() {
        return Vec::new();
    }
    let chunks = chunk_text(&run.content);
    if chunks.len() == 1 {
        return vec![run];
    }
    chunks
        .into_iter()
        .map(|chunk| TextRun::new(chunk, run.style.clone()))
        .collect()
}

/// Runs for a piece of text in a single style, pre-split at the limit.
pub fn text_runs(text: &str, style: &StyleState) -> Vec<TextRun> {
    chunk_text(text)
        .into_iter()
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| TextRun::new(chunk, style.clone()))
        .collect()
}

fn chunk_text(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (index, _) in text.char_indices() {
        if count == RICH_TEXT_LIMIT {
            chunks.push(&text[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bold() -> StyleState {
        StyleState::default().bold()
    }

    fn concat(runs: &[TextRun]) -> String {
        runs.iter().map(|run| run.content.as_str()).collect()
    }

    #[test]
    fn splits_long_run_at_exact_boundaries() {
        let text = "a".repeat(4500);
        let runs = normalize(vec![TextRun::plain(text.clone())]);
        let lens: Vec<usize> = runs.iter().map(TextRun::char_len).collect();
        assert_eq!(lens, vec![2000, 2000, 500]);
        assert_eq!(concat(&runs), text);
    }

    #[test]
    fn splits_on_characters_not_bytes() {
        let text = "é".repeat(2001);
        let runs = normalize(vec![TextRun::plain(text.clone())]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].char_len(), 2000);
        assert_eq!(runs[1].content, "é");
    }

    #[test]
    fn merges_adjacent_runs_with_same_style() {
        let runs = normalize(vec![
            TextRun::plain("Hello "),
            TextRun::plain("world"),
            TextRun::new("!", bold()),
            TextRun::new("!", bold()),
        ]);
        assert_eq!(
            runs,
            vec![TextRun::plain("Hello world"), TextRun::new("!!", bold())]
        );
    }

    #[test]
    fn different_links_do_not_merge() {
        let a = StyleState::default().linked("https://a.example");
        let b = StyleState::default().linked("https://b.example");
        let runs = normalize(vec![
            TextRun::new("one", a),
            TextRun::new("two", b),
            TextRun::plain("three"),
        ]);
        assert_eq!(runs.len(), 3);
    }

    #[test]
    fn merge_respects_limit() {
        let runs = normalize(vec![
            TextRun::plain("a".repeat(1500)),
            TextRun::plain("b".repeat(600)),
        ]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].char_len(), 1500);
        assert_eq!(runs[1].char_len(), 600);
    }

    #[test]
    fn tail_chunk_merges_with_following_run() {
        let runs = normalize(vec![
            TextRun::plain("a".repeat(2100)),
            TextRun::plain("b".repeat(50)),
        ]);
        let lens: Vec<usize> = runs.iter().map(TextRun::char_len).collect();
        assert_eq!(lens, vec![2000, 150]);
    }

    #[test]
    fn drops_empty_runs() {
        let runs = normalize(vec![
            TextRun::plain(""),
            TextRun::new("", bold()),
            TextRun::plain("x"),
        ]);
        assert_eq!(runs, vec![TextRun::plain("x")]);
        assert!(normalize(Vec::new()).is_empty());
    }

    #[test]
    fn text_runs_presplits() {
        let runs = text_runs(&"z".repeat(2001), &bold());
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|run| run.style == bold()));
        assert!(text_runs("", &bold()).is_empty());
    }

    fn arb_style() -> impl Strategy<Value = StyleState> {
        (
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            prop::option::of(prop_oneof![Just("https://a.example"), Just("https://b.example")]),
        )
            .prop_map(|(bold, italic, strikethrough, code, link)| StyleState {
                bold,
                italic,
                strikethrough,
                code,
                link: link.map(str::to_string),
            })
    }

    fn arb_runs() -> impl Strategy<Value = Vec<TextRun>> {
        prop::collection::vec(
            (
                prop_oneof![
                    "[a-zé世 ]{0,40}",
                    (1usize..4500).prop_map(|n| "x".repeat(n)),
                ],
                arb_style(),
            )
                .prop_map(|(content, style)| TextRun::new(content, style)),
            0..12,
        )
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(runs in arb_runs()) {
            let once = normalize(runs);
            prop_assert_eq!(normalize(once.clone()), once);
        }

        #[test]
        fn prop_runs_stay_within_limit(runs in arb_runs()) {
            for run in normalize(runs) {
                prop_assert!(run.char_len() <= RICH_TEXT_LIMIT);
                prop_assert!(!run.content.is_empty());
            }
        }

        #[test]
        fn prop_text_is_preserved(runs in arb_runs()) {
            let expected = concat(&runs);
            prop_assert_eq!(concat(&normalize(runs)), expected);
        }
    }
}
