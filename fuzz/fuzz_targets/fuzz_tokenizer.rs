#![no_main]

use libfuzzer_sys::fuzz_target;

use dsv::{ByteRecord, TokenizerBuilder, Writer};

fuzz_target!(|data: &[u8]| {
    let mut tok = TokenizerBuilder::new()
        .guess(true)
        .comment(Some(b'#'))
        .max_buffer_size(1024)
        .from_reader(data);
    let mut wtr = Writer::from_writer(vec![]);
    let mut records = vec![];
    let mut rec = ByteRecord::new();
    while let Ok(true) = tok.read_byte_record(&mut rec) {
        wtr.write_record(&rec).unwrap();
        records.push(rec.clone());
    }

    // Whatever was read must survive a round trip through the writer.
    let out = wtr.into_inner().unwrap();
    let mut tok = TokenizerBuilder::new().from_reader(&out[..]);
    for want in records {
        assert!(tok.read_byte_record(&mut rec).unwrap());
        assert_eq!(rec, want);
    }
    assert!(!tok.read_byte_record(&mut rec).unwrap());
});
