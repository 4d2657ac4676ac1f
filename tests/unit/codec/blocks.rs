use super::*;

#[test]
fn long_payload_splits_at_255() {
    let payload: Vec<u8> = (0..600u32).map(|i| (i % 251) as u8).collect();
    let mut out = Vec::new();
    write_sub_blocks(&mut out, &payload).unwrap();

    assert_eq!(out[0], 255);
    assert_eq!(out[256], 255);
    assert_eq!(out[512], 90);
    assert_eq!(*out.last().unwrap(), 0);
    assert_eq!(out.len(), 600 + 3 + 1);

    let (back, end) = read_sub_blocks(&out, 0).unwrap();
    assert_eq!(back, payload);
    assert_eq!(end, out.len());
    assert_eq!(skip_sub_blocks(&out, 0).unwrap(), out.len());
}

#[test]
fn empty_payload_is_just_a_terminator() {
    let mut out = Vec::new();
    write_sub_blocks(&mut out, &[]).unwrap();
    assert_eq!(out, vec![0]);
}

#[test]
fn short_chunk_is_truncated() {
    let bytes = [4u8, 1, 2];
    assert_eq!(
        read_sub_blocks(&bytes, 0).unwrap_err(),
        FormatError::Truncated("sub-block")
    );
    assert!(skip_sub_blocks(&bytes, 0).is_err());
}

#[test]
fn missing_terminator_is_truncated() {
    let bytes = [2u8, 9, 9];
    assert!(read_sub_blocks(&bytes, 0).is_err());
}
