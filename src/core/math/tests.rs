use std::sync::Mutex;

use super::{FnRenderer, MathRenderResult, RenderError, Segment, render_math_segments};
use crate::core::config::MathConfigInput;

fn ok_renderer() -> FnRenderer<impl Fn(String, u32) -> std::future::Ready<Result<Vec<u8>, RenderError>> + Sync>
{
    FnRenderer(|expr: String, _width: u32| std::future::ready(Ok(format!("img:{expr}").into_bytes())))
}

fn failing_renderer()
-> FnRenderer<impl Fn(String, u32) -> std::future::Ready<Result<Vec<u8>, RenderError>> + Sync> {
    FnRenderer(|_expr: String, _width: u32| {
        std::future::ready(Err(RenderError::Other("undefined control sequence".into())))
    })
}

fn kinds(result: &MathRenderResult) -> Vec<&'static str> {
    result
        .segments
        .iter()
        .map(|s| match s {
            Segment::Text { .. } => "text",
            Segment::MathImage { .. } => "math-image",
        })
        .collect()
}

fn expressions(result: &MathRenderResult) -> Vec<&str> {
    result
        .segments
        .iter()
        .filter_map(|s| match s {
            Segment::MathImage { expression, .. } => Some(expression.as_str()),
            Segment::Text { .. } => None,
        })
        .collect()
}

fn single_text(result: &MathRenderResult, expected: &str) {
    assert_eq!(
        result.segments,
        vec![Segment::Text {
            content: expected.to_string()
        }]
    );
    assert!(!result.has_math_images);
}

#[tokio::test]
async fn single_formula_renders_to_image() {
    let result = render_math_segments("$$x^2$$", &MathConfigInput::default(), &ok_renderer()).await;
    assert!(result.has_math_images);
    match result.segments.as_slice() {
        [
            Segment::MathImage {
                formula_text,
                expression,
                image,
                file_name,
            },
        ] => {
            assert_eq!(formula_text, "$$x^2$$");
            assert_eq!(expression, "x^2");
            assert_eq!(image, b"img:x^2");
            assert_eq!(file_name, "math-1.png");
        }
        other => panic!("expected one math image, got {:?}", other),
    }
}

#[tokio::test]
async fn both_delimiter_kinds_interleave_with_text() {
    let input = r"A $$x^2$$ B \[y+1\] C";
    let result = render_math_segments(input, &MathConfigInput::default(), &ok_renderer()).await;
    assert_eq!(
        kinds(&result),
        vec!["text", "math-image", "text", "math-image", "text"]
    );
    assert_eq!(expressions(&result), vec!["x^2", "y+1"]);
    assert_eq!(result.literal_text(), input);
    assert_eq!(result.image_count(), 2);
}

#[tokio::test]
async fn fenced_block_stays_verbatim() {
    let input = "```\n$$x^2$$\n```\n$$y^2$$";
    let result = render_math_segments(input, &MathConfigInput::default(), &ok_renderer()).await;
    assert_eq!(kinds(&result), vec!["text", "math-image"]);
    assert_eq!(expressions(&result), vec!["y^2"]);
    assert_eq!(result.segments[0].literal(), "```\n$$x^2$$\n```\n");
}

#[tokio::test]
async fn inline_code_is_never_rendered() {
    let input = r"use `$$a$$` or `\[b\]` literally";
    let result = render_math_segments(input, &MathConfigInput::default(), &ok_renderer()).await;
    single_text(&result, input);
}

#[tokio::test]
async fn count_limit_keeps_extra_formulas_as_text() {
    let input = MathConfigInput {
        max_expressions_per_reply: Some(1),
        ..Default::default()
    };
    let result = render_math_segments("$$a$$ $$b$$", &input, &ok_renderer()).await;
    assert_eq!(kinds(&result), vec!["math-image", "text"]);
    assert_eq!(expressions(&result), vec!["a"]);
    assert_eq!(result.segments[1].literal(), " $$b$$");
}

#[tokio::test]
async fn count_limit_yields_min_of_n_and_k() {
    let message = (0..5).map(|i| format!("$${i}$$")).collect::<Vec<_>>().join(" ");
    for k in 1..=7 {
        let input = MathConfigInput {
            max_expressions_per_reply: Some(k),
            ..Default::default()
        };
        let result = render_math_segments(&message, &input, &ok_renderer()).await;
        assert_eq!(result.image_count(), (k as usize).min(5), "k = {k}");
        assert_eq!(result.literal_text(), message);
    }
}

#[tokio::test]
async fn length_limit_skips_renderer() {
    let calls = Mutex::new(Vec::new());
    let renderer = FnRenderer(|expr: String, _width: u32| {
        calls.lock().unwrap().push(expr.clone());
        std::future::ready(Ok::<_, RenderError>(expr.into_bytes()))
    });
    let input = MathConfigInput {
        max_chars_per_expression: Some(3),
        ..Default::default()
    };
    let result = render_math_segments("$$abcd$$", &input, &renderer).await;
    single_text(&result, "$$abcd$$");
    assert!(calls.lock().unwrap().is_empty());

    let result = render_math_segments("$$abc$$", &input, &renderer).await;
    assert!(result.has_math_images);
    assert_eq!(*calls.lock().unwrap(), vec!["abc".to_string()]);
}

#[tokio::test]
async fn length_limit_counts_characters_not_bytes() {
    let input = MathConfigInput {
        max_chars_per_expression: Some(2),
        ..Default::default()
    };
    let result = render_math_segments("$$αβ$$", &input, &ok_renderer()).await;
    assert!(result.has_math_images);
}

#[tokio::test]
async fn render_failure_falls_back_to_text() {
    let result = render_math_segments(
        r"$$\badcommand$$",
        &MathConfigInput::default(),
        &failing_renderer(),
    )
    .await;
    single_text(&result, r"$$\badcommand$$");
}

#[tokio::test]
async fn failures_do_not_consume_count_or_ordinals() {
    let renderer = FnRenderer(|expr: String, _width: u32| {
        std::future::ready(if expr == "bad" {
            Err(RenderError::Other("parse error".into()))
        } else {
            Ok(expr.into_bytes())
        })
    });
    let input = MathConfigInput {
        max_expressions_per_reply: Some(2),
        ..Default::default()
    };
    let result = render_math_segments("$$bad$$ $$a$$ $$b$$ $$c$$", &input, &renderer).await;
    assert_eq!(kinds(&result), vec!["text", "math-image", "text", "math-image", "text"]);
    assert_eq!(result.segments[0].literal(), "$$bad$$ ");
    let names: Vec<&str> = result
        .segments
        .iter()
        .filter_map(|s| match s {
            Segment::MathImage { file_name, .. } => Some(file_name.as_str()),
            Segment::Text { .. } => None,
        })
        .collect();
    assert_eq!(names, vec!["math-1.png", "math-2.png"]);
    assert_eq!(result.segments[4].literal(), " $$c$$");
}

#[tokio::test]
async fn empty_render_output_is_a_failure() {
    let renderer =
        FnRenderer(|_expr: String, _width: u32| std::future::ready(Ok::<_, RenderError>(Vec::new())));
    let result = render_math_segments("$$x$$", &MathConfigInput::default(), &renderer).await;
    single_text(&result, "$$x$$");
}

#[tokio::test]
async fn renderer_receives_max_width() {
    let widths = Mutex::new(Vec::new());
    let renderer = FnRenderer(|expr: String, width: u32| {
        widths.lock().unwrap().push(width);
        std::future::ready(Ok::<_, RenderError>(expr.into_bytes()))
    });
    let input = MathConfigInput {
        max_image_width_px: Some(640),
        ..Default::default()
    };
    render_math_segments("$$x$$", &input, &renderer).await;
    assert_eq!(*widths.lock().unwrap(), vec![640]);
}

#[tokio::test]
async fn disabled_short_circuits() {
    let input = MathConfigInput {
        enabled: Some(false),
        ..Default::default()
    };
    let result = render_math_segments("$$x^2$$", &input, &ok_renderer()).await;
    single_text(&result, "$$x^2$$");
    assert!(!result.config.enabled);
}

#[tokio::test]
async fn empty_text_short_circuits() {
    let result = render_math_segments("", &MathConfigInput::default(), &ok_renderer()).await;
    single_text(&result, "");
}

#[tokio::test]
async fn text_without_formulas_is_single_segment() {
    let input = "Plain reply with a $ sign and `$$code$$`.";
    let result = render_math_segments(input, &MathConfigInput::default(), &ok_renderer()).await;
    single_text(&result, input);
}

#[tokio::test]
async fn unmatched_opener_keeps_remaining_text() {
    let input = r"$$a$$ then $$b and \[c\]";
    let result = render_math_segments(input, &MathConfigInput::default(), &ok_renderer()).await;
    assert_eq!(kinds(&result), vec!["math-image", "text"]);
    assert_eq!(result.segments[1].literal(), r" then $$b and \[c\]");
}

#[tokio::test]
async fn renders_happen_in_source_order() {
    let order = Mutex::new(Vec::new());
    let renderer = FnRenderer(|expr: String, _width: u32| {
        order.lock().unwrap().push(expr.clone());
        async move {
            // Later expressions finish faster; order must still follow the source.
            let delay = if expr == "first" { 30 } else { 1 };
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            Ok::<_, RenderError>(expr.into_bytes())
        }
    });
    let result = render_math_segments(
        r"$$first$$ \[second\] $$third$$",
        &MathConfigInput::default(),
        &renderer,
    )
    .await;
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    assert_eq!(expressions(&result), vec!["first", "second", "third"]);
}
