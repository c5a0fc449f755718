use super::*;
use std::io::Cursor;

fn consume_str(input: &str) -> (String, Vec<String>) {
    let mut chunks = Vec::new();
    let answer = consume(Cursor::new(input.to_string()), &mut |chunk: &str| {
        chunks.push(chunk.to_string());
    })
    .expect("consume should succeed");
    (answer, chunks)
}

fn delta_frame(content: &str) -> String {
    format!(
        "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n"
    )
}

#[test]
fn accumulates_deltas_in_order() {
    let input = format!(
        "{}{}{}data: [DONE]\n",
        delta_frame("Hello"),
        delta_frame(", "),
        delta_frame("world")
    );

    let (answer, chunks) = consume_str(&input);
    assert_eq!(answer, "Hello, world");
    assert_eq!(chunks, vec!["Hello", ", ", "world"]);
}

#[test]
fn done_sentinel_stops_consumption_immediately() {
    let input = format!(
        "{}data: [DONE]\n{}",
        delta_frame("kept"),
        delta_frame("ignored")
    );

    let (answer, _) = consume_str(&input);
    assert_eq!(answer, "kept");
}

#[test]
fn malformed_frames_are_skipped() {
    let input = format!(
        "{}data: not json at all\ndata: {{\"truncated\":\n{}data: [DONE]\n",
        delta_frame("a"),
        delta_frame("b")
    );

    let (answer, chunks) = consume_str(&input);
    assert_eq!(answer, "ab");
    assert_eq!(chunks.len(), 2);
}

#[test]
fn non_data_lines_are_ignored() {
    let input = format!(
        ": keep-alive\nevent: message\n\n{}data: [DONE]\n",
        delta_frame("text")
    );

    let (answer, _) = consume_str(&input);
    assert_eq!(answer, "text");
}

#[test]
fn falls_back_to_message_content() {
    let input = "data: {\"choices\":[{\"message\":{\"content\":\"whole\"}}]}\ndata: [DONE]\n";

    let (answer, _) = consume_str(input);
    assert_eq!(answer, "whole");
}

#[test]
fn empty_deltas_do_not_invoke_the_callback() {
    let input = format!(
        "data: {{\"choices\":[{{\"delta\":{{\"content\":\"\"}}}}]}}\n{}data: [DONE]\n",
        delta_frame("x")
    );

    let (answer, chunks) = consume_str(&input);
    assert_eq!(answer, "x");
    assert_eq!(chunks, vec!["x"]);
}

#[test]
fn missing_sentinel_ends_at_stream_end() {
    let (answer, _) = consume_str(&delta_frame("only"));
    assert_eq!(answer, "only");
}

#[test]
fn crlf_line_endings_are_tolerated() {
    let input = "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\r\ndata: [DONE]\r\n";

    let (answer, _) = consume_str(input);
    assert_eq!(answer, "a");
}
