use equipos_billing::domain::pricing::{calculate_amount, NumericField, RentalFields};
use equipos_billing::domain::types::BillingModality;
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn money() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000, 0u32..=2).prop_map(|(units, scale)| Decimal::new(units, scale))
}

fn loose_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        ".{0,12}".prop_map(Value::from),
        Just(json!([1, 2])),
        Just(json!({"a": 1})),
    ]
}

proptest! {
    #[test]
    fn hourly_amount_is_hours_times_price(hours in money(), price in money()) {
        let mut fields = RentalFields::hourly(hours, price);
        let calculation = calculate_amount(&mut fields, None);
        prop_assert_eq!(calculation.modality, BillingModality::Hours);
        prop_assert_eq!(calculation.amount.as_decimal(), hours * price);
    }

    #[test]
    fn volume_amount_is_volume_times_unit_price(volume in money(), price in money()) {
        let mut fields = RentalFields::by_volume(volume, price, "m3");
        let calculation = calculate_amount(&mut fields, None);
        prop_assert_eq!(calculation.modality, BillingModality::Volume);
        prop_assert_eq!(calculation.amount.as_decimal(), volume * price);
        prop_assert_eq!(fields.hours, Some(NumericField::Null));
    }

    #[test]
    fn fixed_amount_is_taken_verbatim(amount in money()) {
        let mut fields = RentalFields::fixed(amount);
        let calculation = calculate_amount(&mut fields, None);
        prop_assert_eq!(calculation.modality, BillingModality::Fixed);
        prop_assert_eq!(calculation.amount.as_decimal(), amount);
    }

    #[test]
    fn arbitrary_payloads_never_fail(
        modality in loose_value(),
        hours in loose_value(),
        price in loose_value(),
        volume in loose_value(),
        fixed in loose_value(),
    ) {
        let payload = json!({
            "modalidad_facturacion": modality,
            "horas": hours,
            "precio_por_hora": price,
            "volumen_generado": volume,
            "monto_fijo": fixed,
        });
        let mut fields: RentalFields = serde_json::from_value(payload).unwrap();
        let calculation = calculate_amount(&mut fields, None);
        prop_assert!(BillingModality::ALL.contains(&calculation.modality));
    }

    #[test]
    fn repeated_calculation_is_stable(
        proposed in (loose_value(), loose_value(), loose_value(), loose_value()),
        original in (loose_value(), loose_value(), loose_value(), loose_value()),
    ) {
        let fields = |(modality, hours, price, fixed): (Value, Value, Value, Value)| -> RentalFields {
            serde_json::from_value(json!({
                "modalidad_facturacion": modality,
                "horas": hours,
                "precio_por_hora": price,
                "monto_fijo": fixed,
            }))
            .unwrap()
        };
        let proposed = fields(proposed);
        let original = fields(original);

        let mut first = proposed.clone();
        let mut second = proposed.clone();
        let a = calculate_amount(&mut first, Some(&original)).into_pair();
        let b = calculate_amount(&mut second, Some(&original)).into_pair();
        prop_assert_eq!(a, b);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn missing_operands_come_from_original_then_zero(
        stored_hours in money(),
        stored_price in money(),
        edited_hours in proptest::option::of(money()),
        original_has_price in any::<bool>(),
    ) {
        let mut proposed = RentalFields {
            modality: Some("horas".to_string()),
            hours: edited_hours.map(NumericField::number),
            ..RentalFields::default()
        };
        let original = RentalFields {
            hours: Some(NumericField::number(stored_hours)),
            price_per_hour: original_has_price.then(|| NumericField::number(stored_price)),
            ..RentalFields::default()
        };

        let calculation = calculate_amount(&mut proposed, Some(&original));
        let price = if original_has_price { stored_price } else { Decimal::ZERO };
        prop_assert_eq!(calculation.modality, BillingModality::Hours);
        prop_assert_eq!(
            calculation.amount.as_decimal(),
            edited_hours.unwrap_or(stored_hours) * price
        );
    }

    #[test]
    fn fixed_amount_falls_back_to_original(stored in money()) {
        let mut proposed = RentalFields {
            modality: Some("fijo".to_string()),
            ..RentalFields::default()
        };
        let calculation = calculate_amount(&mut proposed, Some(&RentalFields::fixed(stored)));
        prop_assert_eq!(calculation.amount.as_decimal(), stored);

        let mut bare = RentalFields {
            modality: Some("fijo".to_string()),
            ..RentalFields::default()
        };
        let calculation = calculate_amount(&mut bare, None);
        prop_assert_eq!(calculation.amount.as_decimal(), Decimal::ZERO);
    }
}
