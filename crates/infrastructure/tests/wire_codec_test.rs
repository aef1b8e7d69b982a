use stubres_domain::{DnsClass, RecordType, ResponseCode, WireError};
use stubres_infrastructure::dns::wire::{
    canonicalize, decode_name, encode_query, name_to_wire, skip_name, wire_to_text, Header,
    MessageBuilder, RecordHeader, HEADER_LEN, QUESTION_FIXED_LEN, RR_FIXED_LEN,
};

fn sample_response() -> Vec<u8> {
    MessageBuilder::new(Header::response_to(&Header::query(0x5151), ResponseCode::NoError))
        .question("www.example.test", RecordType::A.to_u16(), 1)
        .unwrap()
        .answer_name("www.example.test", RecordType::CNAME.to_u16(), 1, 60, "edge.example.test")
        .unwrap()
        .answer("edge.example.test", RecordType::A.to_u16(), 1, 60, &[192, 0, 2, 80])
        .unwrap()
        .finish()
}

#[test]
fn test_presentation_round_trip_of_awkward_names() {
    for name in ["a\\.b.example", "\\\"quoted\\\".test", "\\000\\255.test", "semi\\;colon", "x"] {
        let wire = name_to_wire(name).unwrap();
        assert_eq!(wire_to_text(&wire).unwrap(), name);
    }
}

#[test]
fn test_walk_full_response() {
    let msg = sample_response();
    let header = Header::decode(&msg).unwrap();
    assert_eq!(header.id, 0x5151);
    assert_eq!((header.qdcount, header.ancount), (1, 2));

    let mut pos = HEADER_LEN;
    let (question, used) = decode_name(&msg, pos).unwrap();
    assert_eq!(question, "www.example.test");
    pos += used + QUESTION_FIXED_LEN;

    let (owner, used) = decode_name(&msg, pos).unwrap();
    assert_eq!(owner, "www.example.test");
    assert_eq!(used, 2);
    pos += used;
    let cname = RecordHeader::parse(&msg, pos).unwrap();
    assert_eq!(cname.record_type(), Some(RecordType::CNAME));
    let (target, _) = decode_name(&msg, pos + RR_FIXED_LEN).unwrap();
    assert_eq!(target, "edge.example.test");
    pos = cname.rdata_end(&msg, pos).unwrap();

    // "edge.example.test" compresses entirely onto the CNAME target
    let (owner, used) = decode_name(&msg, pos).unwrap();
    assert_eq!(owner, "edge.example.test");
    assert_eq!(used, 2);
    pos += used;
    let a = RecordHeader::parse(&msg, pos).unwrap();
    assert_eq!(a.rdlength, 4);
    assert_eq!(a.rdata_end(&msg, pos).unwrap(), msg.len());
}

#[test]
fn test_every_truncation_fails_cleanly() {
    let msg = sample_response();
    let full = HEADER_LEN + 18 + QUESTION_FIXED_LEN;

    for cut in 0..msg.len() {
        let prefix = &msg[..cut];
        for pos in [HEADER_LEN, full] {
            let decoded = decode_name(prefix, pos);
            let skipped = skip_name(prefix, pos);
            assert_eq!(decoded.is_ok(), skipped.is_ok(), "cut {} pos {}", cut, pos);
        }
        if cut < HEADER_LEN {
            assert_eq!(Header::decode(prefix), Err(WireError::Truncated(cut)));
        }
    }
}

#[test]
fn test_hostile_pointer_chains() {
    // a label followed by a pointer back to itself
    let mut msg = Header::query(1).encode().to_vec();
    msg.extend_from_slice(&[0x01, b'a', 0xC0, 0x0C]);
    assert_eq!(decode_name(&msg, HEADER_LEN), Err(WireError::CompressionLoop));
    assert_eq!(skip_name(&msg, HEADER_LEN), Err(WireError::CompressionLoop));

    // two names pointing at each other: the forward pointer is refused first
    let mut msg = Header::query(1).encode().to_vec();
    msg.extend_from_slice(&[0x01, b'a', 0xC0, 0x10, 0x01, b'b', 0xC0, 0x0C]);
    assert_eq!(
        decode_name(&msg, HEADER_LEN),
        Err(WireError::PointerOutOfRange(0x10))
    );
    assert_eq!(
        decode_name(&msg, HEADER_LEN + 4),
        Err(WireError::PointerOutOfRange(0x10))
    );

    // label claiming more bytes than the message holds
    let mut msg = Header::query(1).encode().to_vec();
    msg.extend_from_slice(&[0x3F, b'a']);
    assert_eq!(
        decode_name(&msg, HEADER_LEN),
        Err(WireError::LabelOverrun(HEADER_LEN))
    );

    // a long run of backward pointers, each landing on the previous one
    let mut msg = Header::query(1).encode().to_vec();
    msg.extend_from_slice(&[0x01, b'z', 0x00]);
    let mut previous = HEADER_LEN;
    for _ in 0..200 {
        let here = msg.len();
        msg.extend_from_slice(&(0xC000u16 | previous as u16).to_be_bytes());
        previous = here;
    }
    assert_eq!(decode_name(&msg, previous), Ok(("z".to_string(), 2)));
    assert_eq!(skip_name(&msg, previous), Ok(2));
}

#[test]
fn test_bitstring_label_in_message() {
    let mut msg = Header::query(1).encode().to_vec();
    msg.extend_from_slice(&[0x41, 0x10, 0x0a, 0x0b, 0x03, b'a', b'r', b'p', 0x00]);

    let (name, used) = decode_name(&msg, HEADER_LEN).unwrap();
    assert_eq!(name, "\\[x0a0b/16].arp");
    assert_eq!(used, 9);
}

#[test]
fn test_query_encoding_uses_canonical_name() {
    let (bytes, _) =
        encode_query("MiXeD.Example.", RecordType::A, DnsClass::IN, |_| false).unwrap();
    let (name, _) = decode_name(&bytes, HEADER_LEN).unwrap();

    assert_eq!(name, canonicalize("MiXeD.Example.").unwrap());
    assert_eq!(name, "MiXeD.Example");
}
