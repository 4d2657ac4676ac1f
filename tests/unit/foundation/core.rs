use super::*;

#[test]
fn rect_fits_within_boundaries() {
    let screen = Size::new(10, 10).unwrap();
    assert!(Rect::new(0, 0, 10, 10).fits_within(screen));
    assert!(Rect::new(5, 5, 5, 5).fits_within(screen));
    assert!(!Rect::new(5, 5, 6, 5).fits_within(screen));
    assert!(!Rect::new(u32::MAX, 0, 2, 1).fits_within(screen));
}

#[test]
fn size_rejects_zero_sides() {
    assert!(Size::new(0, 4).is_err());
    assert!(Size::new(4, 0).is_err());
    assert_eq!(Size::new(635, 215).unwrap().area(), 136_525);
}

#[test]
fn disposal_codes_map_both_ways() {
    for d in [
        DisposalMethod::None,
        DisposalMethod::DoNotDispose,
        DisposalMethod::RestoreBackground,
        DisposalMethod::RestorePrevious,
    ] {
        assert_eq!(DisposalMethod::from_gif_code(d.gif_code()), d);
    }
    assert_eq!(DisposalMethod::from_gif_code(6), DisposalMethod::None);
}

#[test]
fn loop_count_zero_means_forever() {
    assert_eq!(LoopCount::from_stored(0), LoopCount::Infinite);
    assert_eq!(LoopCount::from_stored(3), LoopCount::Finite(3));
    assert_eq!(LoopCount::Infinite.stored(), 0);
}
