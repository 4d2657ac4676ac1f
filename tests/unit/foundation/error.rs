use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(StampError::fetch("x").to_string().contains("fetch error:"));
    assert!(
        StampError::missing_input("x")
            .to_string()
            .contains("missing required input:")
    );
    assert!(
        StampError::limit("x")
            .to_string()
            .contains("resource limit exceeded:")
    );
    assert!(
        StampError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        StampError::from(FormatError::MissingTrailer)
            .to_string()
            .contains("format error: missing trailer")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StampError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn out_of_bounds_message_names_both_rects() {
    let err = FormatError::FrameOutOfBounds {
        frame: 2,
        left: 5,
        top: 6,
        width: 10,
        height: 10,
        screen_width: 12,
        screen_height: 12,
    };
    let msg = err.to_string();
    assert!(msg.contains("frame 2"));
    assert!(msg.contains("10x10+5+6"));
    assert!(msg.contains("12x12"));
}

#[test]
fn only_stream_failures_are_not_retryable() {
    assert!(StampError::fetch("x").is_retryable_before_output());
    assert!(StampError::from(FormatError::BadSignature).is_retryable_before_output());
    assert!(!StampError::sink(std::io::Error::other("gone")).is_retryable_before_output());
    assert!(!StampError::Cancelled.is_retryable_before_output());
}
