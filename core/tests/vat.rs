use printshop_core::vat::{
    compute_vat, validate_vat_number, Customer, CustomerType, VatNumberStatus, VatSettings,
};
use rust_decimal_macros::dec;

#[test]
fn eu_company_with_valid_number_is_reverse_charged() {
    let customer = Customer::company("FR", "FR12345678901");
    let result = compute_vat(dec!(100), &customer);

    assert!(result.reverse_charge);
    assert!(!result.customer_responsibility);
    assert_eq!(result.vat_amount, dec!(0));
    assert_eq!(result.amount_ttc, dec!(100));
    assert!(result.vat_label.contains("autoliquidation"));
    assert_eq!(result.vat_number_status, VatNumberStatus::Valid);
}

#[test]
fn luxembourg_private_pays_standard_rate() {
    let result = compute_vat(dec!(100), &Customer::private("LU"));

    assert_eq!(result.vat_amount, dec!(17));
    assert_eq!(result.amount_ttc, dec!(117));
    assert!(!result.reverse_charge);
    assert_eq!(result.vat_number_status, VatNumberStatus::Missing);
}

#[test]
fn luxembourg_company_is_never_reverse_charged() {
    let result = compute_vat(dec!(250), &Customer::company("LU", "LU12345678"));

    assert!(!result.reverse_charge);
    assert_eq!(result.vat_amount, dec!(42.50));
    assert_eq!(result.amount_ttc, dec!(292.50));
}

#[test]
fn invalid_vat_number_falls_back_to_standard_rate() {
    let customer = Customer::company("DE", "DE12");
    let result = compute_vat(dec!(100), &customer);

    assert!(!result.reverse_charge);
    assert_eq!(result.vat_amount, dec!(17));
    assert_eq!(result.vat_number_status, VatNumberStatus::InvalidFormat);
    assert_eq!(result.vat_number_status.label(), "Format invalide");
}

#[test]
fn company_without_vat_number_pays_standard_rate() {
    let customer = Customer {
        country: "BE".into(),
        vat_number: None,
        customer_type: CustomerType::Company,
        customer_handles_vat: false,
    };
    let result = compute_vat(dec!(80), &customer);
    assert_eq!(result.vat_amount, dec!(13.60));
    assert!(!result.reverse_charge);
}

#[test]
fn foreign_private_handling_vat_is_customer_responsibility() {
    let customer = Customer {
        customer_handles_vat: true,
        ..Customer::private("FR")
    };
    let result = compute_vat(dec!(100), &customer);

    assert!(result.customer_responsibility);
    assert!(!result.reverse_charge);
    assert_eq!(result.vat_amount, dec!(0));
    assert_eq!(result.amount_ttc, dec!(100));
}

#[test]
fn luxembourg_private_cannot_opt_out_of_vat() {
    let customer = Customer {
        customer_handles_vat: true,
        ..Customer::private("LU")
    };
    let result = compute_vat(dec!(100), &customer);
    assert!(!result.customer_responsibility);
    assert_eq!(result.vat_amount, dec!(17));
}

#[test]
fn foreign_private_not_handling_vat_pays_standard_rate() {
    let result = compute_vat(dec!(59.99), &Customer::private("FR"));
    // 59.99 * 0.17 = 10.1983
    assert_eq!(result.vat_amount, dec!(10.20));
    assert_eq!(result.amount_ttc, dec!(70.19));
}

#[test]
fn ttc_minus_vat_is_ht() {
    let customers = [
        Customer::private("LU"),
        Customer::private("FR"),
        Customer::company("FR", "FR12345678901"),
        Customer::company("NL", "NL12"),
    ];
    for amount in [dec!(0), dec!(0.01), dec!(19.99), dec!(1234.56), dec!(100000)] {
        for customer in &customers {
            let r = compute_vat(amount, customer);
            assert_eq!(r.amount_ttc - r.vat_amount, amount);
            assert_eq!(r.amount_ht, amount);
        }
    }
}

#[test]
fn settings_drive_rate_and_seller_country() {
    let settings = VatSettings {
        seller_country: "FR".into(),
        standard_rate: dec!(20),
    };
    let domestic = settings.compute(dec!(100), &Customer::company("FR", "FR12345678901"));
    assert_eq!(domestic.vat_amount, dec!(20));
    assert_eq!(domestic.vat_label, "TVA 20%");

    let foreign = settings.compute(dec!(100), &Customer::company("LU", "LU12345678"));
    assert!(foreign.reverse_charge);
}

#[test]
fn vat_is_pure() {
    let customer = Customer::company("IT", "IT12345678901");
    assert_eq!(compute_vat(dec!(42), &customer), compute_vat(dec!(42), &customer));
}

#[test]
fn validation_is_country_specific() {
    assert_eq!(validate_vat_number("AT", Some("ATU12345678")), VatNumberStatus::Valid);
    assert_eq!(validate_vat_number("AT", Some("AT12345678")), VatNumberStatus::InvalidFormat);
    assert_eq!(validate_vat_number("DE", Some("DE123456789")), VatNumberStatus::Valid);
    assert_eq!(validate_vat_number("ES", Some("ESX1234567Z")), VatNumberStatus::Valid);
}

#[test]
fn foreign_prefixed_number_is_not_reverse_charged() {
    let customer = Customer::company("FR", "DE123456789");
    let result = compute_vat(dec!(100), &customer);

    assert!(!result.reverse_charge);
    assert_eq!(result.vat_rate, dec!(17));
    assert_eq!(result.vat_amount, dec!(17));
    assert_eq!(result.vat_number_status, VatNumberStatus::InvalidFormat);

    let own_prefix = compute_vat(dec!(100), &Customer::company("FR", "FRDE123456789"));
    assert!(own_prefix.reverse_charge);
}
