use super::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

#[test]
fn test_balance_tolerance_is_one_cent() {
    assert_eq!(BALANCE_TOLERANCE, dec!(0.01));
}

#[rstest]
#[case(dec!(100.00), dec!(100.00), true)]
#[case(dec!(100.00), dec!(100.01), true)]
#[case(dec!(100.01), dec!(100.00), true)]
#[case(dec!(100.00), dec!(100.011), false)]
#[case(dec!(150), dec!(100), false)]
fn test_within_tolerance(#[case] a: Decimal, #[case] b: Decimal, #[case] expected: bool) {
    assert_eq!(within_tolerance(a, b), expected);
}

#[test]
fn test_within_tolerance_does_not_overflow() {
    assert!(!within_tolerance(Decimal::MAX, Decimal::MIN));
    assert!(within_tolerance(Decimal::MAX, Decimal::MAX));
}

#[rstest]
#[case(dec!(2.345), 2, dec!(2.34))]
#[case(dec!(2.355), 2, dec!(2.36))]
#[case(dec!(2.5), 0, dec!(2))]
#[case(dec!(3.5), 0, dec!(4))]
#[case(dec!(-1.005), 2, dec!(-1.00))]
fn test_round_currency_bankers(
    #[case] amount: Decimal,
    #[case] dp: u32,
    #[case] expected: Decimal,
) {
    assert_eq!(round_currency(amount, dp), expected);
}

#[test]
fn test_currency_display() {
    assert_eq!(format!("{}", Currency::Usd), "USD");
    assert_eq!(format!("{}", Currency::Eur), "EUR");
    assert_eq!(format!("{}", Currency::Ngn), "NGN");
    assert_eq!(format!("{}", Currency::Kes), "KES");
    assert_eq!(format!("{}", Currency::Jpy), "JPY");
}

#[test]
fn test_currency_from_str() {
    assert_eq!(Currency::from_str("USD").unwrap(), Currency::Usd);
    assert_eq!(Currency::from_str("usd").unwrap(), Currency::Usd);
    assert_eq!(Currency::from_str("NGN").unwrap(), Currency::Ngn);
    assert!(Currency::from_str("INVALID").is_err());
}

#[test]
fn test_currency_serde_uppercase() {
    let json = serde_json::to_string(&Currency::Kes).unwrap();
    assert_eq!(json, "\"KES\"");
    let parsed: Currency = serde_json::from_str("\"EUR\"").unwrap();
    assert_eq!(parsed, Currency::Eur);
}
