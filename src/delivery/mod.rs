//! Chunked, ordered delivery of a rendered report.
//!
//! Messaging transports cap the size of one message, so the report is cut
//! into chunks on line boundaries and sent one at a time:
//!
//! 1. Lines (newline included) are packed into a chunk while the chunk stays
//!    within the limit.
//! 2. A single line longer than the limit is cut into pieces of at most
//!    `limit` characters, never inside an HTML entity, tag or link; the last
//!    piece stays open for the lines that follow.
//! 3. With more than one chunk each one is prefixed with `(i/total)`.
//!
//! Chunks go out strictly in order with a short pause in between. The first
//! failed chunk stops delivery of the rest, so readers never get a report
//! with a silent gap in the middle.

pub mod telegram;

use crate::models::{DeliveryChunk, DeliveryOutcome, RenderedReport};
use std::error::Error;
use std::mem;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Hard message limit of the Telegram Bot API, in characters.
pub const TRANSPORT_LIMIT: usize = 4096;

/// Chunk body limit; the difference to [`TRANSPORT_LIMIT`] holds the `(i/total)` header.
pub const CHUNK_LIMIT: usize = 4000;

/// Characters kept free for the `(i/total)\n` header.
const HEADER_RESERVE: usize = 16;

/// Pause between consecutive chunks.
pub const CHUNK_DELAY: Duration = Duration::from_millis(500);

/// Destination that accepts one chunk of text at a time.
pub trait DeliverySink {
    async fn send(&self, text: &str) -> Result<(), Box<dyn Error>>;
}

/// Split `text` into chunk bodies of at most `limit` characters.
///
/// Concatenating the result gives back `text` exactly.
pub fn split_into_chunks(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if line_len > limit {
            if !current.is_empty() {
                chunks.push(mem::take(&mut current));
            }
            let mut pieces = split_long_line(line, limit);
            current = pieces.pop().unwrap_or_default();
            current_len = current.chars().count();
            chunks.extend(pieces);
            continue;
        }

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Cut one line into pieces of at most `limit` characters.
///
/// The message markup is Telegram HTML, so each cut is moved back to the
/// last point in the piece that is outside an entity (`&amp;`), a tag and
/// any element opened in the same piece. Only a piece without such a point
/// is cut at exactly `limit`.
fn split_long_line(line: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + limit).min(chars.len());
        let cut = if end == chars.len() {
            end
        } else {
            last_markup_boundary(&chars[start..end]).map_or(end, |offset| start + offset)
        };
        pieces.push(chars[start..cut].iter().collect());
        start = cut;
    }
    pieces
}

/// Offset just after the last character of `window` at which the markup is balanced.
fn last_markup_boundary(window: &[char]) -> Option<usize> {
    let mut boundary = None;
    let mut depth = 0usize;
    let mut tag_start: Option<usize> = None;
    let mut in_entity = false;

    for (i, &c) in window.iter().enumerate() {
        if let Some(open) = tag_start {
            if c != '>' {
                continue;
            }
            tag_start = None;
            if window.get(open + 1) == Some(&'/') {
                depth = depth.saturating_sub(1);
            } else if window[i - 1] != '/' {
                depth += 1;
            }
        } else if in_entity {
            // a bare '&' followed by whitespace was never an entity
            if c != ';' && !c.is_whitespace() {
                continue;
            }
            in_entity = false;
        } else if c == '<' {
            tag_start = Some(i);
            continue;
        } else if c == '&' {
            in_entity = true;
            continue;
        }

        if depth == 0 {
            boundary = Some(i + 1);
        }
    }
    boundary
}

/// Split `text` and number the chunks.
///
/// `limit` is capped so that a numbered chunk always fits [`TRANSPORT_LIMIT`].
pub fn build_chunks(text: &str, limit: usize) -> Vec<DeliveryChunk> {
    let bodies = split_into_chunks(text, limit.min(TRANSPORT_LIMIT - HEADER_RESERVE));
    let total = bodies.len();
    bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| DeliveryChunk {
            sequence_index: i,
            text: if total > 1 {
                format!("({}/{total})\n{body}", i + 1)
            } else {
                body
            },
        })
        .collect()
}

/// Deliver `report` through `sink` in order.
///
/// Returns one outcome per attempted chunk. After the first failure no
/// further chunks are attempted, so the result can be shorter than the
/// number of chunks.
#[instrument(level = "info", skip_all, fields(limit = limit))]
pub async fn deliver<S: DeliverySink>(
    sink: &S,
    report: &RenderedReport,
    limit: usize,
    delay: Duration,
) -> Vec<DeliveryOutcome> {
    let chunks = build_chunks(&report.text(), limit);
    let total = chunks.len();
    let mut outcomes = Vec::with_capacity(total);

    for chunk in chunks {
        if chunk.sequence_index > 0 {
            sleep(delay).await;
        }
        match sink.send(&chunk.text).await {
            Ok(()) => outcomes.push(DeliveryOutcome {
                chunk_index: chunk.sequence_index,
                success: true,
                error: None,
            }),
            Err(e) => {
                error!(
                    chunk = chunk.sequence_index,
                    total,
                    error = %e,
                    "Chunk delivery failed; abandoning remaining chunks"
                );
                outcomes.push(DeliveryOutcome {
                    chunk_index: chunk.sequence_index,
                    success: false,
                    error: Some(e.to_string()),
                });
                break;
            }
        }
    }

    let delivered = outcomes.iter().filter(|o| o.success).count();
    info!(delivered, total, "Report delivery finished");
    outcomes
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_long_line_scenario() {
        let text = format!("{}\n{}", "a".repeat(9_999), "b".repeat(50));
        assert_eq!(char_len(&text), 10_050);

        let chunks = split_into_chunks(&text, 4000);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 4000));
        assert_eq!(chunks.concat(), text);
        assert!(chunks[2].ends_with(&"b".repeat(50)));
    }

    #[test]
    fn test_lines_are_never_split_when_they_fit() {
        let line = format!("{}\n", "가".repeat(99));
        let text = line.repeat(95);
        let chunks = split_into_chunks(&text, 1000);

        assert_eq!(chunks.concat(), text);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 1000);
            assert!(chunk.ends_with('\n'));
            assert_eq!(char_len(chunk) % 100, 0);
        }
        assert_eq!(chunks.len(), 10);
    }

    #[test]
    fn test_chunk_closed_before_long_line() {
        let text = format!("short\n{}\nafter\n", "x".repeat(25));
        let chunks = split_into_chunks(&text, 10);
        assert_eq!(chunks[0], "short\n");
        assert_eq!(chunks[1], "x".repeat(10));
        assert_eq!(chunks[2], "x".repeat(10));
        assert_eq!(chunks[3], "xxxxx\n");
        assert_eq!(chunks[4], "after\n");
        assert_eq!(chunks.concat(), text);
    }

    /// Whether `piece` stops in the middle of an entity, a tag or a link.
    fn ends_inside_markup(piece: &str) -> bool {
        let open_entity = piece.rfind('&').is_some_and(|i| !piece[i..].contains(';'));
        let open_tag = piece.rfind('<').is_some_and(|i| !piece[i..].contains('>'));
        open_entity || open_tag || piece.matches("<a ").count() != piece.matches("</a>").count()
    }

    #[test]
    fn test_long_narrative_is_not_cut_inside_entities() {
        use crate::models::{ArticleBody, FetchedItem, SummarizedItem, TopicGroup};
        use crate::outputs::report::{Edition, assemble};

        let items = vec![SummarizedItem {
            item: FetchedItem {
                source: "동아일보".to_string(),
                url: "https://n.news.naver.com/a/1?x=1&y=2".to_string(),
                body: ArticleBody::Text("본문".to_string()),
            },
            summary: "요약".to_string(),
        }];
        let groups = vec![TopicGroup {
            label: "R&D 예산".to_string(),
            member_indices: vec![0],
            summary_bullets: vec![],
            narrative_body: format!("가{}", "정부의 R&D 예산 \"삭감\" 논란이 이어졌다. ".repeat(200)),
            critiques: vec![],
        }];
        let edition = Edition {
            date: "20250101".to_string(),
            mode_label: "standard".to_string(),
            coverage: vec![("동아일보".to_string(), 1)],
        };
        let text = assemble(&groups, &items, &edition).message.text();

        for offset in 0..8 {
            let padded = format!("{}{text}", "-".repeat(offset));
            let chunks = split_into_chunks(&padded, CHUNK_LIMIT);
            assert!(chunks.len() > 1);
            assert_eq!(chunks.concat(), padded);
            for chunk in &chunks {
                assert!(char_len(chunk) <= CHUNK_LIMIT);
                assert!(!ends_inside_markup(chunk), "offset {offset}: {chunk:?}");
                assert!(!chunk.starts_with(';'));
            }
        }
    }

    #[test]
    fn test_long_link_line_keeps_anchors_whole() {
        let anchor = "<a href=\"https://n.news.naver.com/a?x=1&amp;y=2\">7</a> ";
        let line = format!("🔗 동아일보: {}\n", anchor.repeat(200));

        let chunks = split_into_chunks(&line, 100);
        assert_eq!(chunks.concat(), line);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 100);
            assert!(!ends_inside_markup(chunk), "{chunk:?}");
        }
    }

    #[test]
    fn test_unclosed_markup_falls_back_to_plain_cut() {
        let line = format!("<{}", "x".repeat(25));
        assert_eq!(
            split_into_chunks(&line, 10),
            vec![format!("<{}", "x".repeat(9)), "x".repeat(10), "x".repeat(6)]
        );
    }

    #[test]
    fn test_oversized_limit_is_capped_to_transport() {
        let text = format!("{}\n", "가".repeat(99)).repeat(100);
        let chunks = build_chunks(&text, 10_000);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| char_len(&c.text) <= TRANSPORT_LIMIT));
    }

    #[test]
    fn test_line_exactly_at_limit_fits() {
        let text = "abcd\nef\n";
        assert_eq!(split_into_chunks(text, 5), vec!["abcd\n", "ef\n"]);
    }

    #[test]
    fn test_text_without_trailing_newline() {
        assert_eq!(split_into_chunks("a\nb", 10), vec!["a\nb"]);
        assert!(split_into_chunks("", 10).is_empty());
    }

    #[test]
    fn test_headers_only_with_multiple_chunks() {
        let single = build_chunks("hello\n", 100);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].text, "hello\n");

        let multi = build_chunks("one\ntwo\n", 4);
        assert_eq!(multi.len(), 2);
        assert_eq!(multi[0].text, "(1/2)\none\n");
        assert_eq!(multi[1].text, "(2/2)\ntwo\n");
        assert_eq!(multi[1].sequence_index, 1);
    }

    #[test]
    fn test_numbered_chunks_fit_transport() {
        let text = format!("{}\n", "가나다라".repeat(30)).repeat(400);
        let chunks = build_chunks(&text, CHUNK_LIMIT);
        assert!(chunks.len() > 9);
        assert!(chunks.iter().all(|c| char_len(&c.text) <= TRANSPORT_LIMIT));
    }

    fn report(lines: usize) -> RenderedReport {
        RenderedReport {
            header: "header\n".to_string(),
            body: "line\n".repeat(lines),
        }
    }

    #[tokio::test]
    async fn test_deliver_sends_all_chunks_in_order() {
        let sink = RecordingSink::default();
        let outcomes = deliver(&sink, &report(5), 10, Duration::ZERO).await;

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), outcomes.len());
        assert!(outcomes.iter().all(|o| o.success && o.error.is_none()));
        assert_eq!(
            outcomes.iter().map(|o| o.chunk_index).collect::<Vec<_>>(),
            (0..sent.len()).collect::<Vec<_>>()
        );
        assert!(sent[0].starts_with("(1/"));
        assert!(sent[0].contains("header\n"));
    }

    #[tokio::test]
    async fn test_deliver_stops_after_first_failure() {
        let sink = RecordingSink {
            fail_at: Some(1),
            ..Default::default()
        };
        let outcomes = deliver(&sink, &report(10), 10, Duration::ZERO).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].chunk_index, 1);
        assert!(outcomes[1].error.as_deref().unwrap().contains("too long"));
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }
}
