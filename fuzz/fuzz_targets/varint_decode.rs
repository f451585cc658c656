#![no_main]

use cursor::{decode_varint, encode_varint, MAX_VARINT_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut idx = 0usize;

    // Decode back-to-back varints until the input runs out.
    while idx < data.len() && idx < 4096 {
        let Ok((value, len)) = decode_varint(&data[idx..]) else {
            break;
        };
        assert!(len > 0 && idx + len <= data.len());

        let mut scratch = [0u8; MAX_VARINT_LEN];
        let written = encode_varint(value, &mut scratch);
        let (again, read) = decode_varint(&scratch[..written]).unwrap();
        assert_eq!(again, value);
        assert_eq!(read, written);

        let _ = wire::decode_tag(&data[idx..]);
        let _ = wire::decode_length(&data[idx..]);
        idx += len;
    }
});
