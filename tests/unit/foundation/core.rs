use super::*;

#[test]
fn millis_arithmetic_saturates() {
    assert_eq!(Millis(5).saturating_sub(Millis(9)), Millis::ZERO);
    assert_eq!(Millis(u64::MAX).saturating_add(Millis(1)), Millis(u64::MAX));
    assert_eq!(Millis(40).saturating_add(Millis(2)).get(), 42);
}

#[test]
fn millis_display_and_serde() {
    assert_eq!(Millis(120).to_string(), "120ms");
    assert_eq!(serde_json::to_string(&Millis(7)).unwrap(), "7");
    let m: Millis = serde_json::from_str("250").unwrap();
    assert_eq!(m, Millis(250));
}

#[test]
fn finite_or_replaces_nan_and_inf() {
    assert_eq!(finite_or(f64::NAN, 0.0), 0.0);
    assert_eq!(finite_or(f64::INFINITY, 1.0), 1.0);
    assert_eq!(finite_or(0.5, 1.0), 0.5);
}
