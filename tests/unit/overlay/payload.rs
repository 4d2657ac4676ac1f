use super::*;
use base64::Engine;

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(w, h, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([0, 0, 0, 255])
        } else {
            image::Rgba([255, 255, 255, 255])
        }
    });
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn fields() -> PayloadFields {
    PayloadFields {
        name: Some("Jane Doe".into()),
        title: Some("Engineer".into()),
        phone: Some("+55 61 5555-0000".into()),
        ..PayloadFields::default()
    }
}

#[test]
fn legacy_field_names_are_accepted() {
    let json = r#"{
        "nome": "Maria", "cargo": "Gerente", "telefone": "123",
        "departamento": "TI", "e-mail": "m@x.com", "endereco": "Rua 1",
        "gif_url": "logo.gif", "outWidth": 700
    }"#;
    let f: PayloadFields = serde_json::from_str(json).unwrap();
    assert_eq!(f.name.as_deref(), Some("Maria"));
    assert_eq!(f.title.as_deref(), Some("Gerente"));
    assert_eq!(f.phone.as_deref(), Some("123"));
    assert_eq!(f.department.as_deref(), Some("TI"));
    assert_eq!(f.email.as_deref(), Some("m@x.com"));
    assert_eq!(f.address.as_deref(), Some("Rua 1"));
    assert_eq!(f.source.as_deref(), Some("logo.gif"));
    assert_eq!(f.out_width, Some(700));
    assert_eq!(f.out_height, None);
}

#[test]
fn english_field_names_are_accepted() {
    let json = r#"{"name":"A","title":"B","phone":"C","gifUrl":"x.gif","qrCodeData":"data:,"}"#;
    let f: PayloadFields = serde_json::from_str(json).unwrap();
    assert_eq!(f.name.as_deref(), Some("A"));
    assert_eq!(f.source.as_deref(), Some("x.gif"));
    assert_eq!(f.qr_code_data.as_deref(), Some("data:,"));
}

#[test]
fn defaults_fill_output_size_and_trim_fields() {
    let mut f = fields();
    f.name = Some("  Jane Doe  ".into());
    f.email = Some("   ".into());
    f.out_width = Some(0);
    let p = f.into_payload(SignatureVariant::Standard, &DecodeLimits::default()).unwrap();
    assert_eq!(p.display_name, "Jane Doe");
    assert_eq!(p.email, None);
    assert_eq!(p.output, Size::new(DEFAULT_OUT_WIDTH, DEFAULT_OUT_HEIGHT).unwrap());
    assert!(p.qr.is_none());
}

#[test]
fn required_text_fields_are_enforced() {
    for blank in ["name", "title", "phone"] {
        let mut f = fields();
        match blank {
            "name" => f.name = None,
            "title" => f.title = Some(" ".into()),
            _ => f.phone = Some(String::new()),
        }
        let err = f.into_payload(SignatureVariant::Standard, &DecodeLimits::default()).unwrap_err();
        assert!(matches!(err, StampError::MissingRequiredInput(ref m) if m.contains(blank)));
    }
}

#[test]
fn qr_variant_requires_qr_data() {
    let err = fields().into_payload(SignatureVariant::WithQr, &DecodeLimits::default()).unwrap_err();
    assert!(matches!(err, StampError::MissingRequiredInput(_)));
    assert!(err.is_retryable_before_output());
}

#[test]
fn qr_variant_rejects_undecodable_qr() {
    let mut f = fields();
    f.qr_code_data = Some("data:image/png;base64,bm90IGFuIGltYWdl".into());
    let err = f.into_payload(SignatureVariant::WithQr, &DecodeLimits::default()).unwrap_err();
    assert!(matches!(err, StampError::MissingRequiredInput(_)));
}

#[test]
fn qr_data_url_is_decoded() {
    let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes(5, 7));
    let mut f = fields();
    f.qr_code_data = Some(format!("data:image/png;base64,{b64}"));
    let p = f.into_payload(SignatureVariant::WithQr, &DecodeLimits::default()).unwrap();
    let qr = p.qr.unwrap();
    assert_eq!(qr.dimensions(), (5, 7));
    assert_eq!(qr.get_pixel(0, 0).0, [0, 0, 0, 255]);
}

#[test]
fn qr_raw_bytes_are_decoded() {
    let qr = decode_qr(&png_bytes(3, 3), &DecodeLimits::default()).unwrap();
    assert_eq!(qr.dimensions(), (3, 3));
}

#[test]
fn non_base64_data_url_is_rejected() {
    assert!(decode_qr(b"data:image/png,abc", &DecodeLimits::default()).is_err());
    assert!(decode_qr(b"data:image/png;base64", &DecodeLimits::default()).is_err());
}

#[test]
fn standard_variant_ignores_qr_data() {
    let mut f = fields();
    f.qr_code_data = Some("garbage".into());
    let p = f.into_payload(SignatureVariant::Standard, &DecodeLimits::default()).unwrap();
    assert!(p.qr.is_none());
}

#[test]
fn oversized_qr_is_a_resource_limit() {
    let png = png_bytes(40, 30);
    let narrow = DecodeLimits {
        max_dimension: 32,
        ..DecodeLimits::default()
    };
    let err = decode_qr(&png, &narrow).unwrap_err();
    assert!(matches!(err, StampError::ResourceLimitExceeded(_)), "{err}");

    let small = DecodeLimits {
        max_pixels: 40 * 30 - 1,
        ..DecodeLimits::default()
    };
    let err = decode_qr(&png, &small).unwrap_err();
    assert!(matches!(err, StampError::ResourceLimitExceeded(_)), "{err}");

    let exact = DecodeLimits {
        max_pixels: 40 * 30,
        max_dimension: 40,
        ..DecodeLimits::default()
    };
    assert_eq!(decode_qr(&png, &exact).unwrap().dimensions(), (40, 30));
}
