use qrloom::*;

#[test]
fn test_qr_roundtrip_ascii() {
    // "Hello, world" at AUTO/M/AUTO lands on version 1, 21 modules a side
    let mut sym = Symbol::new(CodeType::Qr);
    let written = sym.write_string("Hello, world", DataType::Auto).unwrap();
    assert!(written > 0);
    assert_eq!(sym.version(), Version::Qr(1));
    assert_eq!(sym.version().width(), 21);
    assert_eq!(sym.read_string().unwrap(), "Hello, world");
}

#[test]
fn test_byte_mode_url_lands_on_version_3() {
    let url = "https://github.com/kikuchan/libqrean";
    let mut sym = Symbol::new(CodeType::Qr);
    sym.write_string(url, DataType::Auto).unwrap();
    assert_eq!(sym.version(), Version::Qr(3));
    assert_eq!(sym.version().width(), 29);
    assert_eq!(sym.read_string().unwrap(), url);
}

#[test]
fn test_error_correction_recovers_a_toggled_module() {
    let url = "https://github.com/kikuchan/libqrean";
    let mut sym = Symbol::new(CodeType::Qr);
    sym.write_string(url, DataType::Auto).unwrap();

    let w = sym.version().width() as i32;
    let v = sym.read_pixel(w - 1, w - 1);
    sym.write_pixel(w - 1, w - 1, !v);

    assert!(sym.fix_errors().unwrap() > 0);
    assert_eq!(sym.read_string().unwrap(), url);
}

#[test]
fn test_ean13_roundtrip_appends_check_digit() {
    let mut sym = Symbol::new(CodeType::Ean13);
    sym.write_buffer(b"123456789012", DataType::Auto).unwrap();
    // 3 + 2*7*6 + 5 + 3 modules
    assert_eq!(sym.canvas.symbol_width, 95);
    assert_eq!(sym.read_string().unwrap(), "1234567890128");
}

#[test]
fn test_kanji_roundtrip() {
    let mut sym = Symbol::new(CodeType::Qr);
    sym.set_eci(EciCode::Utf8);
    sym.write_string("日本語", DataType::Auto).unwrap();
    assert_eq!(sym.read_string().unwrap(), "日本語");
}

#[test]
fn test_roundtrip_across_versions_and_levels() {
    for &version in &[1u8, 2, 5, 7, 12] {
        for &level in &[EccLevel::L, EccLevel::M, EccLevel::Q, EccLevel::H] {
            let mut sym = Symbol::new(CodeType::Qr);
            sym.set_version(Version::Qr(version)).unwrap();
            sym.set_level(level);
            let text = format!("RT {}{:?}", version, level); // short enough for 1-H
            sym.write_string(&text, DataType::Auto).unwrap();
            assert_eq!(sym.read_string().unwrap(), text, "{}-{:?}", version, level);
        }
    }
}

#[test]
fn test_detector_end_to_end() {
    let img = create_qr_code("DETECT ME 42", None, EccLevel::M).unwrap();
    let hits = detect(&img);
    assert!(hits.iter().any(|d| d.kind == CodeType::Qr && d.text == "DETECT ME 42"));
}

#[test]
fn test_image_export_has_quiet_zone() {
    let img = create_qr_code("QUIET", None, EccLevel::L).unwrap();
    // (21 + 2 * 4) modules at the default scale of 4
    assert_eq!(img.dimensions(), (29 * 4, 29 * 4));
    assert_eq!(img.get_pixel(0, 0).0[0], 255);
}
