use incomfort::{decode_pair, display_code_text, setpoint_tenths, PhysicalValue};
use serde_json::{json, Map, Value};

fn pair(msb: i64, lsb: i64) -> Map<String, Value> {
    let v = json!({"p_msb": msb, "p_lsb": lsb});
    v.as_object().unwrap().clone()
}

#[test]
fn every_byte_pair_decodes_exactly() {
    for msb in 0..=127 {
        for lsb in 0..=255 {
            let decoded = decode_pair("p", &pair(msb, lsb)).unwrap();
            if msb == 127 && lsb == 255 {
                assert_eq!(decoded, PhysicalValue::Unknown);
            } else {
                assert_eq!(decoded, PhysicalValue::Value((msb * 256 + lsb) as f64 / 100.0));
            }
        }
    }
}

#[test]
fn unknown_is_not_zero() {
    let unknown = decode_pair("p", &pair(127, 255)).unwrap();
    assert_eq!(unknown.value(), None);
    assert_eq!(unknown.hundredths(), None);
    assert_eq!(format!("{unknown}"), "unknown");
    assert_eq!(format!("{}", PhysicalValue::Value(18.06)), "18.06");
}

#[test]
fn display_code_table_is_total() {
    let known = [0, 15, 24, 37, 51, 85, 102, 126, 153, 170, 204, 231, 240, 255];
    for code in -10..300 {
        let text = display_code_text(code);
        assert_eq!(text != "Unknown", known.contains(&code), "code {code}");
    }
    assert_eq!(display_code_text(102), "central heating");
    assert_eq!(display_code_text(204), "tapwater");
}

#[test]
fn setpoint_is_offset_from_minimum() {
    assert_eq!(setpoint_tenths(5.0), 0);
    assert_eq!(setpoint_tenths(18.5), 135);
    assert_eq!(setpoint_tenths(30.0), 250);
}
