use pwrgate_monitor::telemetry::{try_parse, PowerState, Reading};

#[test]
fn test_parse_reference_line() {
    let line = b"MPPT PS=13.80V Bat=13.20V, 2.50A Sol=18.00V Temp=95\r\n";
    let (reading, consumed) = try_parse(line);
    assert_eq!(consumed, line.len());
    let reading = reading.expect("well formed line");
    assert_eq!(reading.power_state, PowerState::Mppt);
    assert_eq!(reading.ps_volts, 13.80);
    assert_eq!(reading.battery_volts, 13.20);
    assert_eq!(reading.charge_amps, 2.50);
    assert_eq!(reading.solar_volts, 18.00);
    assert_eq!(reading.temp_f, 95.0);
    assert!((reading.charge_power - 33.0).abs() < 1e-9);
}

#[test]
fn test_charge_power_is_product() {
    for (volts, amps) in [("12.85", "0.00"), ("14.41", "9.87"), ("13.02", "0.25")] {
        let line = format!("Trickle PS=13.90V Bat={}V, {}A Sol=0.00V Temp=70\r\n", volts, amps);
        let (reading, _) = try_parse(line.as_bytes());
        let reading = reading.expect("well formed line");
        let expected = volts.parse::<f64>().unwrap() * amps.parse::<f64>().unwrap();
        assert!((reading.charge_power - expected).abs() < 1e-9, "{} != {}", reading.charge_power, expected);
        assert_eq!(reading.power_state, PowerState::Trickle);
    }
}

#[test]
fn test_missing_fields_stay_zero() {
    let (reading, _) = try_parse(b"Charged PS=13.60V Temp=72\r\n");
    assert_eq!(
        reading,
        Some(Reading {
            power_state: PowerState::Charged,
            ps_volts: 13.60,
            temp_f: 72.0,
            ..Reading::default()
        })
    );
}

#[test]
fn test_malformed_field_drops_line_but_advances() {
    let line = b"MPPT PS=13.80V Bat=13.20V, 2.50A Sol=oops Temp=95\r\n";
    let mut buffer = line.to_vec();
    buffer.extend_from_slice(b"MPPT PS=13.70V\r\n");

    let (reading, consumed) = try_parse(&buffer);
    assert!(reading.is_none());
    assert_eq!(consumed, line.len());

    let (reading, _) = try_parse(&buffer[consumed..]);
    assert_eq!(reading.map(|r| r.ps_volts), Some(13.70));
}

#[test]
fn test_prompt_is_left_for_dialog() {
    let (reading, consumed) = try_parse(b"Max charge voltage <14.40>: ");
    assert!(reading.is_none());
    assert_eq!(consumed, 0);
}

#[test]
fn test_leading_line_breaks_are_skipped() {
    let line = b"\r\n\r\nPS Off PS=0.00V Bat=12.90V, 0.00A Sol=0.00V Temp=60\r\n";
    let (reading, consumed) = try_parse(line);
    assert_eq!(consumed, line.len());
    assert_eq!(reading.unwrap().power_state, PowerState::PowerSupplyOff);
}

#[test]
fn test_one_line_at_a_time() {
    let buffer = b"MPPT PS=13.80V\r\nTrickle PS=13.90V\r\n";
    let (reading, consumed) = try_parse(buffer);
    assert_eq!(reading.unwrap().power_state, PowerState::Mppt);
    assert_eq!(consumed, b"MPPT PS=13.80V\r\n".len());
}
